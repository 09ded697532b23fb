// [libs/infra/ledger-client/src/lib.rs]
pub mod client;
pub mod errors;

pub use client::{LedgerClient, LedgerTransaction};
pub use errors::LedgerError;
