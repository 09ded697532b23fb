// [apps/orchestrator/src/handlers/identity.rs]
/*!
 * Facade de identidad (C15, §4.14): `login` resuelve credenciales
 * contra las cuentas de operador declaradas por entorno y emite una
 * sesión; `refresh` la renueva; `me` devuelve la identidad ya resuelta
 * por `auth_guard`.
 */

use axum::extract::State;
use axum::{Extension, Json};
use broker_domain_models::errors::BrokerError;
use broker_domain_models::identity::{Identity, Role, Session};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::middleware::OperatorIdentity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Resuelve `(username, password)` contra las tres cuentas de operador
/// declaradas por entorno (`{ROLE}_USERNAME`/`{ROLE}_PASSWORD`). No hay
/// almacén de credenciales: el despliegue las inyecta como secretos.
fn resolve_role(username: &str, password: &str) -> Option<Role> {
    let accounts = [
        ("ADMIN_USERNAME", "ADMIN_PASSWORD", Role::Admin),
        ("OPERATOR_USERNAME", "OPERATOR_PASSWORD", Role::Operator),
        ("VIEWER_USERNAME", "VIEWER_PASSWORD", Role::Viewer),
    ];

    for (username_var, password_var, role) in accounts {
        let expected_username = std::env::var(username_var).unwrap_or_default();
        let expected_password = std::env::var(password_var).unwrap_or_default();
        if !expected_username.is_empty() && username == expected_username && password == expected_password {
            return Some(role);
        }
    }
    None
}

pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Result<Json<Session>, ApiError> {
    let role = resolve_role(&body.username, &body.password).ok_or(BrokerError::AuthenticationRequired)?;
    let session = state.sessions.issue(Identity { username: body.username, role });
    Ok(Json(session))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: Uuid,
}

pub async fn refresh(State(state): State<AppState>, Json(body): Json<RefreshRequest>) -> Result<Json<Session>, ApiError> {
    let session = state.sessions.refresh(body.token).ok_or(BrokerError::AuthenticationRequired)?;
    Ok(Json(session))
}

pub async fn me(Extension(identity): Extension<OperatorIdentity>) -> Json<Identity> {
    Json(Identity { username: identity.username, role: identity.role })
}
