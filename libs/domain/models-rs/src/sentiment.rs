// [libs/domain/models-rs/src/sentiment.rs]
/*!
 * SentimentRecord: resultado terminal de la cascada de tres niveles
 * (C3). Cada registro referencia un Lead y un call_id único; el
 * borrado de un Lead cascada hacia sus SentimentRecords (§3).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SentimentMethod {
    Remote,
    Local,
    Keyword,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub call_id: String,
    /// Escalar de sentimiento en [-1.0, 1.0].
    pub score: f32,
    /// Mapa etiqueta -> intensidad en [0,1].
    pub emotions: HashMap<String, f32>,
    pub dominant_emotion: String,
    /// Confianza del tier que produjo el registro, en [0,1].
    pub confidence: f32,
    pub method: SentimentMethod,
    pub requires_escalation: bool,
    pub analyzed_at: DateTime<Utc>,
}

impl SentimentRecord {
    pub fn dominant_from(emotions: &HashMap<String, f32>) -> String {
        emotions
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(label, _)| label.clone())
            .unwrap_or_else(|| "neutral".to_string())
    }
}
