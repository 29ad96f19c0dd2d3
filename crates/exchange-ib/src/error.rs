//! Error types for IB Gateway/TWS interaction.

use thiserror::Error;

/// Errors that can occur when talking to IB Gateway/TWS.
#[derive(Debug, Error)]
pub enum IbError {
    /// Nothing is listening on the configured host/port.
    #[error(
        "connection refused. Ensure IB Gateway or TWS is running on {url} and API access is enabled"
    )]
    ConnectionRefused {
        /// `host:port` that was tried.
        url: String,
    },

    /// The handshake did not complete in time.
    #[error(
        "connection to {url} timed out after {secs}s. Check network or if TWS/Gateway is responsive"
    )]
    ConnectTimeout {
        /// `host:port` that was tried.
        url: String,
        /// Timeout that elapsed.
        secs: u64,
    },

    /// Any other connection failure.
    #[error("failed to connect to {url}: {message}")]
    Connect {
        /// `host:port` that was tried.
        url: String,
        /// Underlying error text.
        message: String,
    },

    /// Contract details lookup returned no match.
    #[error(
        "contract for {contract} could not be qualified. Please check symbol, security type, exchange, and other parameters"
    )]
    ContractNotQualified {
        /// Display name of the requested contract.
        contract: String,
    },

    /// The request end time has no valid instant in the market timezone.
    #[error("invalid request end time: {0}")]
    InvalidEndTime(String),

    /// A bar from the API could not be converted.
    #[error("invalid bar data: {0}")]
    InvalidBar(String),

    /// API request failed.
    #[error("IB API error: {0}")]
    Api(String),
}

impl IbError {
    /// Classifies a connection error from the client library.
    pub(crate) fn from_connect(url: &str, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut source = Some(err);
        while let Some(e) = source {
            if let Some(io) = e.downcast_ref::<std::io::Error>() {
                if io.kind() == std::io::ErrorKind::ConnectionRefused {
                    return Self::ConnectionRefused {
                        url: url.to_string(),
                    };
                }
            }
            source = e.source();
        }

        let message = err.to_string();
        if message.to_ascii_lowercase().contains("connection refused") {
            return Self::ConnectionRefused {
                url: url.to_string(),
            };
        }
        Self::Connect {
            url: url.to_string(),
            message,
        }
    }
}
