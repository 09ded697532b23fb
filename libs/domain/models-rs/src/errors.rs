// [libs/domain/models-rs/src/errors.rs]
/*!
 * Catálogo de errores de dominio compartido por los componentes del
 * broker (§7). Cada crate de nivel superior define su propio error de
 * frontera y lo convierte a `BrokerError` en la frontera del facade
 * (C15), que es el único tipo que cruza la API externa.
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("TRANSIENT_DEPENDENCY_FAULT: {0}")]
    TransientDependency(String),

    #[error("CIRCUIT_OPEN: dependency '{0}' is fast-failing")]
    CircuitOpen(String),

    #[error("QUOTA_EXCEEDED: dependency '{0}' at {percent:.1}% of quota")]
    QuotaExceeded(String, f64),

    #[error("RATE_LIMITED: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("SAFETY_VIOLATION: {0}")]
    SafetyViolation(String),

    #[error("INVARIANT_VIOLATION: {0}")]
    InvariantViolation(String),

    #[error("SAGA_FAILED: {0}")]
    SagaFailed(String),

    #[error("AUTHENTICATION_REQUIRED")]
    AuthenticationRequired,

    #[error("AUTHORIZATION_DENIED: {0}")]
    AuthorizationDenied(String),

    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    #[error("CONFLICT: {0}")]
    Conflict(String),
}

impl BrokerError {
    /// Nombre de error deterministico y sin identificadores internos,
    /// apto para exponer al operador junto a un correlation id (§7).
    pub fn public_code(&self) -> &'static str {
        match self {
            BrokerError::TransientDependency(_) => "transient_dependency",
            BrokerError::CircuitOpen(_) => "circuit_open",
            BrokerError::QuotaExceeded(..) => "quota_exceeded",
            BrokerError::RateLimited { .. } => "rate_limited",
            BrokerError::SafetyViolation(_) => "safety_violation",
            BrokerError::InvariantViolation(_) => "invariant_violation",
            BrokerError::SagaFailed(_) => "saga_failed",
            BrokerError::AuthenticationRequired => "authentication_required",
            BrokerError::AuthorizationDenied(_) => "authorization_denied",
            BrokerError::NotFound(_) => "not_found",
            BrokerError::Conflict(_) => "conflict",
        }
    }
}
