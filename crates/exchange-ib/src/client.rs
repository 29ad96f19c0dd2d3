//! IB Gateway/TWS client connection management.

use std::time::Duration;

use ib_history_core::IbConnectionConfig;
use tracing::info;

use crate::error::IbError;

/// IB client configuration.
#[derive(Debug, Clone)]
pub struct IBConfig {
    /// Gateway/TWS host (use 127.0.0.1, not localhost; TWS may block IPv6).
    pub host: String,
    /// Gateway port (4001 = live, 4002 = paper).
    pub port: u16,
    /// Client ID (unique per connection).
    pub client_id: i32,
    /// How long to wait for the handshake.
    pub connect_timeout: Duration,
}

impl Default for IBConfig {
    fn default() -> Self {
        Self::from(&IbConnectionConfig::default())
    }
}

impl From<&IbConnectionConfig> for IBConfig {
    fn from(config: &IbConnectionConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            client_id: config.client_id,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

impl IBConfig {
    /// Gateway paper trading configuration.
    pub fn paper() -> Self {
        Self {
            port: 4002,
            ..Self::default()
        }
    }

    /// Gateway live trading configuration.
    pub fn live() -> Self {
        Self {
            port: 4001,
            ..Self::default()
        }
    }

    /// Connection URL for ibapi crate.
    pub fn connection_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Wrapper around ibapi::Client.
pub struct IBClient {
    config: IBConfig,
    client: ibapi::Client,
}

impl IBClient {
    /// Connect to IB Gateway/TWS, giving up after `config.connect_timeout`.
    pub async fn connect(config: IBConfig) -> Result<Self, IbError> {
        let url = config.connection_url();
        info!(url = %url, client_id = config.client_id, "Connecting to IB Gateway");

        let client = match tokio::time::timeout(
            config.connect_timeout,
            ibapi::Client::connect(&url, config.client_id),
        )
        .await
        {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => return Err(IbError::from_connect(&url, &e)),
            Err(_) => {
                return Err(IbError::ConnectTimeout {
                    url,
                    secs: config.connect_timeout.as_secs(),
                })
            }
        };

        info!("Connected to IB Gateway");
        Ok(Self { config, client })
    }

    /// Get a reference to the underlying ibapi client.
    pub fn inner(&self) -> &ibapi::Client {
        &self.client
    }

    /// Close the connection. The socket is released when the client drops.
    pub fn disconnect(self) {
        info!(url = %self.config.connection_url(), "Disconnecting from IB Gateway");
        drop(self.client);
        info!("Disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_gateway_live() {
        let config = IBConfig::default();
        assert_eq!(config.connection_url(), "127.0.0.1:4001");
        assert_eq!(config.client_id, 77);
        assert_eq!(config.connect_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_paper_port() {
        assert_eq!(IBConfig::paper().port, 4002);
        assert_eq!(IBConfig::live().port, 4001);
    }

    #[test]
    fn test_from_connection_config() {
        let config = IBConfig::from(&IbConnectionConfig {
            host: "10.0.0.5".to_string(),
            port: 7497,
            client_id: 5,
            connect_timeout_secs: 3,
        });
        assert_eq!(config.connection_url(), "10.0.0.5:7497");
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        // Bind then drop to obtain a port with no listener.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = IBConfig {
            port,
            connect_timeout: Duration::from_secs(2),
            ..IBConfig::default()
        };
        let result = IBClient::connect(config).await;
        assert!(matches!(
            result,
            Err(
                IbError::ConnectionRefused { .. }
                    | IbError::Connect { .. }
                    | IbError::ConnectTimeout { .. }
            )
        ));
    }
}
