use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webhook_receiver::application::ServerConfig;
use webhook_receiver::infrastructure::server_impl::server::WebhookServer;
use webhook_receiver::AnyResult;

#[tokio::main(flavor = "current_thread")]
async fn main() -> AnyResult<()> {
    // stdout is reserved for the webhook reports
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webhook_receiver=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run().await
}

async fn run() -> AnyResult<()> {
    let server = WebhookServer::bind(ServerConfig::default()).await?;
    let addr = server.local_addr()?;

    println!("Webhook server listening on http://{addr}");
    println!("Waiting for webhooks...");

    let mut out = std::io::stdout();
    server.serve(&mut out, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
