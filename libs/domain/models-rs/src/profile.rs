// [libs/domain/models-rs/src/profile.rs]
/*!
 * PsychProfile: mapeo uno-a-uno por Lead (C4) y los objetos de apoyo
 * para la selección de guiones de persuasión (C5).
 */

use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    Velocity,
    Analyst,
    Social,
    Security,
}

impl ProfileType {
    /// Orden de desempate fijo usado por ProfileStore::assign (§4.4):
    /// velocity > analyst > social > security.
    pub const TIEBREAK_ORDER: [ProfileType; 4] = [
        ProfileType::Velocity,
        ProfileType::Analyst,
        ProfileType::Social,
        ProfileType::Security,
    ];
}

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ObjectionClass {
    Price,
    Time,
    Trust,
    Need,
    Competition,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsychProfile {
    pub lead_id: Uuid,
    pub profile_type: ProfileType,
    /// 1-10.
    pub decision_speed: u8,
    /// 1-10.
    pub risk_tolerance: u8,
    /// 1-10.
    pub price_sensitivity: u8,
    pub communication_pref: String,
    /// Vector de similitud de dimensión fija (p.ej. 1536), cuando disponible.
    pub similarity_vector: Option<Vec<f32>>,
}
