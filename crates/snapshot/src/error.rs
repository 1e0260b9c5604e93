use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to serialize snapshot: {0}")]
    Serialization(#[from] serde_json::Error),
}
