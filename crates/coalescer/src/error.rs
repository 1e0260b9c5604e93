use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoalescerError {
    #[error("No tokio runtime is available to schedule broadcast cycles on")]
    NoRuntime,
}
