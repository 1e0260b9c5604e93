use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid webhook endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Failed to build the HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Webhook request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Webhook returned an error status: {0}")]
    Status(u16),

    #[error("Snapshot could not be encoded: {0}")]
    Encoding(#[from] snapshot::SnapshotError),
}
