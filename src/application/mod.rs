pub mod report;

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

pub const DEFAULT_PORT: u16 = 8888;

/// Listener settings. The binary always runs with the defaults.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Emit one log line per handled request (peer, method, path, status).
    pub access_log: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            access_log: false,
        }
    }
}

impl ServerConfig {
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_access_log(mut self, enabled: bool) -> Self {
        self.access_log = enabled;
        self
    }
}
