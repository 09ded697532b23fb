// [apps/orchestrator/src/services/session.rs]
/*!
 * SessionStore (C15, §4.14): sesiones de operador en memoria, emitidas
 * por `login` y validadas por `auth_guard`. Se reconstruye vacía en
 * cada arranque del proceso, igual que `AgentRegistry`.
 */

use std::collections::HashMap;
use std::sync::RwLock;

use broker_domain_models::identity::{Identity, Session};
use chrono::{Duration, Utc};
use uuid::Uuid;

const SESSION_TTL_MINUTES: i64 = 60;

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self { sessions: RwLock::new(HashMap::new()) }
    }

    pub fn issue(&self, identity: Identity) -> Session {
        let now = Utc::now();
        let session = Session { token: Uuid::new_v4(), identity, issued_at: now, expires_at: now + Duration::minutes(SESSION_TTL_MINUTES) };
        self.sessions.write().expect("session store lock poisoned").insert(session.token, session.clone());
        session
    }

    /// Invalida `token` y emite uno nuevo para la misma identidad;
    /// `None` si `token` no existe o ya expiró.
    pub fn refresh(&self, token: Uuid) -> Option<Session> {
        let identity = {
            let mut guard = self.sessions.write().expect("session store lock poisoned");
            let existing = guard.remove(&token)?;
            if existing.is_expired(Utc::now()) {
                return None;
            }
            existing.identity
        };
        Some(self.issue(identity))
    }

    pub fn get(&self, token: Uuid) -> Option<Session> {
        let guard = self.sessions.read().expect("session store lock poisoned");
        let session = guard.get(&token)?;
        if session.is_expired(Utc::now()) {
            None
        } else {
            Some(session.clone())
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_domain_models::identity::Role;

    fn identity() -> Identity {
        Identity { username: "operator-1".to_string(), role: Role::Operator }
    }

    #[test]
    fn issued_session_is_retrievable_by_token() {
        let store = SessionStore::new();
        let session = store.issue(identity());
        let fetched = store.get(session.token).expect("session must be retrievable");
        assert_eq!(fetched.identity.username, "operator-1");
    }

    #[test]
    fn refresh_invalidates_the_old_token() {
        let store = SessionStore::new();
        let session = store.issue(identity());
        let renewed = store.refresh(session.token).expect("refresh must succeed");
        assert_ne!(renewed.token, session.token);
        assert!(store.get(session.token).is_none());
        assert!(store.get(renewed.token).is_some());
    }

    #[test]
    fn refresh_of_unknown_token_fails() {
        let store = SessionStore::new();
        assert!(store.refresh(Uuid::new_v4()).is_none());
    }
}
