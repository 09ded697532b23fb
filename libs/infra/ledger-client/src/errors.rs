// [libs/infra/ledger-client/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger uplink unreachable: {0}")]
    ConnectionFault(#[from] reqwest::Error),

    #[error("ledger rejected the request: {0}")]
    Rejected(String),

    #[error("ledger returned a malformed payload: {0}")]
    MalformedPayload(String),
}
