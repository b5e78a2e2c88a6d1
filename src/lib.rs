#![deny(
    missing_copy_implementations,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts
)]

//! A local HTTP listener for eyeballing webhook payloads during development.
//!
//! Every POST body is printed to stdout, as a field breakdown when it is a JSON
//! object and as raw text otherwise, and acknowledged with `200 OK`.

pub mod api;
pub mod domain;

pub mod application;
pub mod infrastructure;

pub type AnyResult<T> = eyre::Result<T>;
