// [apps/orchestrator/src/middleware.rs]
/*!
 * Guardias perimetrales (§5, §4.13): `health_guard` bloquea el tráfico
 * cuando el sistema está en mantenimiento (parada de emergencia),
 * `auth_guard` valida el token de operador, y `rate_limit_guard`
 * aplica el limitador de tasa por endpoint y cliente.
 */

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use broker_domain_models::errors::BrokerError;
use broker_domain_models::identity::Role;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::state::AppState;

pub async fn health_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Err(reason) = state.is_operational() {
        warn!(%reason, "request rejected: system under maintenance");
        return ApiError::from(BrokerError::SafetyViolation(reason)).into_response();
    }
    next.run(req).await
}

pub async fn auth_guard(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let operator_token = std::env::var("OPERATOR_AUTH_TOKEN").unwrap_or_default();

    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = provided else {
        return Err(BrokerError::AuthenticationRequired.into());
    };

    if !operator_token.is_empty() && token == operator_token {
        debug!("operator authenticated via static token");
        req.extensions_mut().insert(OperatorIdentity { token: token.to_string(), username: "operator".to_string(), role: Role::Admin });
        return Ok(next.run(req).await);
    }

    if let Some(session) = Uuid::parse_str(token).ok().and_then(|session_token| state.sessions.get(session_token)) {
        debug!(username = %session.identity.username, "operator authenticated via session");
        req.extensions_mut().insert(OperatorIdentity {
            token: token.to_string(),
            username: session.identity.username,
            role: session.identity.role,
        });
        return Ok(next.run(req).await);
    }

    Err(BrokerError::AuthenticationRequired.into())
}

#[derive(Debug, Clone)]
pub struct OperatorIdentity {
    pub token: String,
    pub username: String,
    pub role: Role,
}

impl OperatorIdentity {
    pub fn require_role(&self, minimum: Role) -> Result<(), ApiError> {
        if self.role >= minimum {
            Ok(())
        } else {
            Err(BrokerError::AuthorizationDenied(format!("requires role {minimum:?} or higher")).into())
        }
    }
}

pub async fn rate_limit_guard(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, ApiError> {
    let endpoint = req.uri().path().to_string();
    let client_key = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("anonymous")
        .to_string();

    if !state.rate_limiter.check(&endpoint, &client_key) {
        return Err(BrokerError::RateLimited { retry_after_secs: 1 }.into());
    }
    Ok(next.run(req).await)
}
