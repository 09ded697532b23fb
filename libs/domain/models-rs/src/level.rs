// [libs/domain/models-rs/src/level.rs]
/*!
 * EconomicLevel (configuración inmutable una vez cargada) y LevelState
 * (mutable, propiedad exclusiva de ProvisioningOrchestrator, C7/C8).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use typeshare::typeshare;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LevelId {
    L0,
    L1,
    L2,
    L3,
    L4,
}

impl LevelId {
    pub fn next(self) -> Option<LevelId> {
        use LevelId::*;
        match self {
            L0 => Some(L1),
            L1 => Some(L2),
            L2 => Some(L3),
            L3 => Some(L4),
            L4 => None,
        }
    }
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicLevel {
    pub level_id: LevelId,
    pub mrr_threshold: f64,
    pub max_burn: f64,
    pub debounce_months: u32,
    pub active_components: BTreeSet<String>,
    pub disabled_components: BTreeSet<String>,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelState {
    pub current_level: LevelId,
    pub consecutive_months_over_next_threshold: u32,
    pub last_transition_at: Option<DateTime<Utc>>,
}

impl Default for LevelState {
    fn default() -> Self {
        Self {
            current_level: LevelId::L0,
            consecutive_months_over_next_threshold: 0,
            last_transition_at: None,
        }
    }
}
