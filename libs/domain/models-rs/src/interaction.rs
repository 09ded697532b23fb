// [libs/domain/models-rs/src/interaction.rs]
/*!
 * Interaction: log append-only atado a un Lead y a un agente. Puede
 * referenciar un SentimentRecord con semántica nullable-on-delete — la
 * historia sobrevive al borrado del sentimiento (§3).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub agent: String,
    pub sentiment_id: Option<Uuid>,
    pub channel: String,
    pub summary: String,
    pub occurred_at: DateTime<Utc>,
}
