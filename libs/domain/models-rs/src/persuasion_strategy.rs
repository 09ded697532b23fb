// [libs/domain/models-rs/src/persuasion_strategy.rs]
/*!
 * PersuasionStrategy: guion persistido por `(profile_type, stage)` que
 * PersuasionEngine (C5) selecciona por tasa de éxito histórica (§4.4).
 */

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

use crate::profile::{ObjectionClass, ProfileType};

pub type ObjectionHandler = HashMap<ObjectionClass, String>;

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersuasionStrategy {
    pub id: Uuid,
    pub profile_type: ProfileType,
    pub stage: String,
    pub template: String,
    pub pattern_tags: Vec<String>,
    pub objection_handlers: ObjectionHandler,
    pub success_rate: f32,
    pub active: bool,
}
