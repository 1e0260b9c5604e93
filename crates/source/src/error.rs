use core_types::AccountId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Account '{0}' is not known to the state source")]
    UnknownAccount(AccountId),

    #[error("Failed to read state of account '{account}': {reason}")]
    Readout { account: AccountId, reason: String },
}
