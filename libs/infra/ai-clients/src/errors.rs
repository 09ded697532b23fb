// [libs/infra/ai-clients/src/errors.rs]
//! Catalogación de fallos de comunicación con los servicios de IA externos.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("network unreachable: {0}")]
    NetworkFault(#[from] reqwest::Error),

    #[error("failed to decode response body: {0}")]
    DecodingFault(#[from] serde_json::Error),

    #[error("server rejected request with status {0}")]
    ServerRejection(String),

    #[error("service returned a malformed payload: {0}")]
    MalformedPayload(String),
}
