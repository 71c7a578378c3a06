//! HTTP server module.
//!
//! Serves plain HTTP; TLS is terminated by the reverse proxy in front.
//! SIGTERM/SIGINT trigger a graceful shutdown with connection draining.

mod server;
mod shutdown;

pub use server::{bind_address, start_server, ServerError};
