use thiserror::Error;

#[derive(Error, Debug)]
pub enum BroadcasterError {
    #[error("State source error: {0}")]
    Source(#[from] source::SourceError),

    #[error("Transport error: {0}")]
    Transport(#[from] transport::error::TransportError),

    #[error("Scheduling error: {0}")]
    Coalescer(#[from] coalescer::CoalescerError),
}
