// [apps/orchestrator/src/errors.rs]
/*!
 * ApiError: frontera única entre `BrokerError` (§7) y la respuesta
 * HTTP. Nunca expone el mensaje interno, sólo `public_code()` junto a
 * un correlation id para que el operador pueda correlacionarlo con los
 * logs estructurados.
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use broker_domain_models::errors::BrokerError;
use serde_json::json;
use uuid::Uuid;

pub struct ApiError {
    inner: BrokerError,
    correlation_id: Uuid,
}

impl From<BrokerError> for ApiError {
    fn from(inner: BrokerError) -> Self {
        Self { inner, correlation_id: Uuid::new_v4() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.inner {
            BrokerError::NotFound(_) => StatusCode::NOT_FOUND,
            BrokerError::Conflict(_) => StatusCode::CONFLICT,
            BrokerError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            BrokerError::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
            BrokerError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            BrokerError::CircuitOpen(_) | BrokerError::QuotaExceeded(..) | BrokerError::TransientDependency(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            BrokerError::SafetyViolation(_) | BrokerError::InvariantViolation(_) | BrokerError::SagaFailed(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };

        tracing::warn!(
            correlation_id = %self.correlation_id,
            code = self.inner.public_code(),
            error = %self.inner,
            "request rejected"
        );

        (
            status,
            Json(json!({
                "error": self.inner.public_code(),
                "correlation_id": self.correlation_id,
            })),
        )
            .into_response()
    }
}
