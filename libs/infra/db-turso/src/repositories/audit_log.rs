// [libs/infra/db-turso/src/repositories/audit_log.rs]
/*!
 * Tabla append-only (§4.13): sin métodos de actualización ni borrado.
 */

use broker_domain_models::audit::{AuditLogEntry, DecisionKind};
use libsql::params;
use tracing::instrument;

use crate::client::TursoClient;
use crate::errors::DbError;

pub struct AuditLogRepository {
    client: TursoClient,
}

impl AuditLogRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, entry))]
    pub async fn append(&self, entry: &AuditLogEntry) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO audit_log (id, decision_kind, input_digest, output_digest, feature_importance_summary, rationale, human_override, recorded_at, retention_until)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    entry.id.to_string(),
                    decision_kind_to_str(entry.decision_kind).to_string(),
                    entry.input_digest.clone(),
                    entry.output_digest.clone(),
                    entry.feature_importance_summary.clone(),
                    entry.rationale.clone(),
                    entry.human_override as i64,
                    entry.recorded_at.to_rfc3339(),
                    entry.retention_until.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn list_recent(&self, limit: u32) -> Result<Vec<AuditLogEntry>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, decision_kind, input_digest, output_digest, feature_importance_summary, rationale, human_override, recorded_at, retention_until
                 FROM audit_log ORDER BY recorded_at DESC LIMIT ?1",
                params![limit],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_entry(&row)?);
        }
        Ok(entries)
    }
}

fn decision_kind_to_str(kind: DecisionKind) -> &'static str {
    match kind {
        DecisionKind::SentimentClassification => "sentiment_classification",
        DecisionKind::FailoverChoice => "failover_choice",
        DecisionKind::DisputeVerdict => "dispute_verdict",
        DecisionKind::PricingCalculation => "pricing_calculation",
    }
}

fn str_to_decision_kind(raw: &str) -> Result<DecisionKind, DbError> {
    match raw {
        "sentiment_classification" => Ok(DecisionKind::SentimentClassification),
        "failover_choice" => Ok(DecisionKind::FailoverChoice),
        "dispute_verdict" => Ok(DecisionKind::DisputeVerdict),
        "pricing_calculation" => Ok(DecisionKind::PricingCalculation),
        other => Err(DbError::MappingError(format!("unknown decision kind '{other}'"))),
    }
}

fn row_to_entry(row: &libsql::Row) -> Result<AuditLogEntry, DbError> {
    let id: String = row.get(0)?;
    let decision_kind: String = row.get(1)?;

    Ok(AuditLogEntry {
        id: uuid::Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        decision_kind: str_to_decision_kind(&decision_kind)?,
        input_digest: row.get(2)?,
        output_digest: row.get(3)?,
        feature_importance_summary: row.get(4)?,
        rationale: row.get(5)?,
        human_override: row.get::<i64>(6)? != 0,
        recorded_at: chrono::DateTime::parse_from_rfc3339(&row.get::<String>(7)?)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| DbError::MappingError(e.to_string()))?,
        retention_until: chrono::DateTime::parse_from_rfc3339(&row.get::<String>(8)?)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}
