/// Errors from the remote-service integration layer.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Service error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided message (`detail` when the body carried
        /// one), or the raw body text.
        body: String,
    },

    /// A 2xx response whose envelope reported failure or was missing
    /// the expected payload.
    #[error("Remote service error: {0}")]
    Service(String),

    /// A data URI could not be parsed or decoded.
    #[error("Invalid data URI: {0}")]
    DataUri(String),
}
