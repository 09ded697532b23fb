// [apps/orchestrator/src/services/audit.rs]
/*!
 * AuditLogService (C14): calcula los digests SHA-256 de entrada/salida
 * de cada decisión de IA y delega la persistencia append-only en
 * `AuditLogRepository` (§4.13). Retención por defecto de 7 años, acorde
 * a los requisitos de trazabilidad de disputas comerciales.
 */

use broker_domain_models::audit::{AuditLogEntry, DecisionKind};
use broker_domain_models::errors::BrokerError;
use broker_infra_db::repositories::AuditLogRepository;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const RETENTION_YEARS: i64 = 7;

pub struct AuditLogService {
    repository: AuditLogRepository,
}

impl AuditLogService {
    pub fn new(repository: AuditLogRepository) -> Self {
        Self { repository }
    }

    pub async fn record(
        &self,
        decision_kind: DecisionKind,
        input: &str,
        output: &str,
        feature_importance_summary: impl Into<String>,
        rationale: impl Into<String>,
        human_override: bool,
    ) -> Result<Uuid, BrokerError> {
        let now = Utc::now();
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            decision_kind,
            input_digest: digest_hex(input),
            output_digest: digest_hex(output),
            feature_importance_summary: feature_importance_summary.into(),
            rationale: rationale.into(),
            human_override,
            recorded_at: now,
            retention_until: now + Duration::days(365 * RETENTION_YEARS),
        };

        let id = entry.id;
        self.repository.append(&entry).await.map_err(|e| BrokerError::TransientDependency(e.to_string()))?;
        Ok(id)
    }

    pub async fn recent(&self, limit: u32) -> Result<Vec<AuditLogEntry>, BrokerError> {
        self.repository.list_recent(limit).await.map_err(|e| BrokerError::TransientDependency(e.to_string()))
    }
}

fn digest_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic_and_content_sensitive() {
        assert_eq!(digest_hex("hello"), digest_hex("hello"));
        assert_ne!(digest_hex("hello"), digest_hex("hellp"));
        assert_eq!(digest_hex("hello").len(), 64);
    }
}
