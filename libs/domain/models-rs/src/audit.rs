// [libs/domain/models-rs/src/audit.rs]
/*!
 * AuditLogEntry (C14): registro inmutable de cada decisión de IA del
 * sistema (clasificación de sentimiento, elección de failover,
 * veredicto de disputa, cálculo de precio). La tabla que lo respalda
 * rechaza updates y deletes a nivel de almacenamiento (§4.13).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    SentimentClassification,
    FailoverChoice,
    DisputeVerdict,
    PricingCalculation,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub decision_kind: DecisionKind,
    pub input_digest: String,
    pub output_digest: String,
    pub feature_importance_summary: String,
    pub rationale: String,
    pub human_override: bool,
    pub recorded_at: DateTime<Utc>,
    pub retention_until: DateTime<Utc>,
}
