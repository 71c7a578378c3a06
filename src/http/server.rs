//! HTTP server startup logic.

use std::net::SocketAddr;

use axum::Router;
use axum_server::Handle;

use crate::config::HttpServerConfig;

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid http.host or http.port: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Parse the configured host and port into a socket address.
pub fn bind_address(config: &HttpServerConfig) -> Result<SocketAddr, ServerError> {
    let host = config.host.trim_start_matches('[').trim_end_matches(']');
    let addr = match host.parse::<std::net::IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, config.port),
        Err(_) => format!("{}:{}", config.host, config.port).parse()?,
    };
    Ok(addr)
}

/// Start the HTTP server.
///
/// This function blocks until the server shuts down.
pub async fn start_server(app: Router, config: &HttpServerConfig) -> Result<(), ServerError> {
    let addr = bind_address(config)?;
    let handle = Handle::new();

    tracing::info!(%addr, "Starting HTTP server");

    shutdown::setup_shutdown_handler(handle.clone());

    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(host: &str, port: u16) -> HttpServerConfig {
        HttpServerConfig {
            host: host.to_string(),
            port,
        }
    }

    #[test]
    fn test_bind_address_ipv4() {
        let addr = bind_address(&http("0.0.0.0", 8000)).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn test_bind_address_ipv6() {
        let addr = bind_address(&http("::", 8080)).unwrap();
        assert_eq!(addr.to_string(), "[::]:8080");

        let bracketed = bind_address(&http("[::1]", 8080)).unwrap();
        assert_eq!(bracketed.to_string(), "[::1]:8080");
    }

    #[test]
    fn test_bind_address_rejects_hostname() {
        assert!(matches!(
            bind_address(&http("localhost", 8000)),
            Err(ServerError::Address(_))
        ));
    }
}
