// [libs/domain/models-rs/src/identity.rs]
/*!
 * Identity y Session (C15, §4.14): el facade autentica vía `login`,
 * emite un token de sesión opaco con expiración, y cada operación
 * crítica exige un rol mínimo del operador autenticado. El orden de
 * declaración de `Role` es significativo: `derive(Ord)` lo usa para la
 * comparación `role >= required` en la matriz de permisos.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Operator,
    Admin,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: Uuid,
    pub identity: Identity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering_places_admin_above_operator_above_viewer() {
        assert!(Role::Admin > Role::Operator);
        assert!(Role::Operator > Role::Viewer);
    }

    #[test]
    fn session_expires_at_its_deadline() {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4(),
            identity: Identity { username: "op".to_string(), role: Role::Operator },
            issued_at: now,
            expires_at: now + chrono::Duration::minutes(1),
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + chrono::Duration::minutes(2)));
    }
}
