//! Server configuration.

use std::net::SocketAddr;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Allow requests from any origin. The service sits behind a gateway in
    /// production, so this defaults to open, matching local development.
    pub permissive_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8020".parse().unwrap(),
            permissive_cors: true,
        }
    }
}

impl ServerConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enable or disable permissive CORS.
    pub fn with_permissive_cors(mut self, enabled: bool) -> Self {
        self.permissive_cors = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.port(), 8020);
        assert!(config.permissive_cors);
    }

    #[test]
    fn test_builder() {
        let config = ServerConfig::new()
            .with_bind_address("127.0.0.1:9000".parse().unwrap())
            .with_permissive_cors(false);
        assert_eq!(config.bind_address.port(), 9000);
        assert!(!config.permissive_cors);
    }
}
