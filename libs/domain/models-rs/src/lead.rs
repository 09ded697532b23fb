// [libs/domain/models-rs/src/lead.rs]
/*!
 * Lead: la entidad de adquisición primaria. Mutada únicamente por su
 * agente propietario; destruida sólo vía borrado explícito, en cuyo caso
 * cascada hacia Sentiment, Profile e Interaction (ver §3 de la spec).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Suspended,
    Rejected,
    Converted,
}

impl LeadStatus {
    /// Transiciones permitidas desde cada estado; usada por los agentes
    /// propietarios antes de mutar un Lead.
    pub fn can_transition_to(self, target: LeadStatus) -> bool {
        use LeadStatus::*;
        matches!(
            (self, target),
            (New, Contacted)
                | (New, Rejected)
                | (Contacted, Qualified)
                | (Contacted, Suspended)
                | (Contacted, Rejected)
                | (Qualified, Converted)
                | (Qualified, Suspended)
                | (Qualified, Rejected)
                | (Suspended, Contacted)
                | (Suspended, Rejected)
        )
    }
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub contact_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub status: LeadStatus,
    pub owning_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(contact_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            contact_name: contact_name.into(),
            contact_email: None,
            contact_phone: None,
            status: LeadStatus::New,
            owning_agent: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lead_can_only_move_to_contacted_or_rejected() {
        assert!(LeadStatus::New.can_transition_to(LeadStatus::Contacted));
        assert!(LeadStatus::New.can_transition_to(LeadStatus::Rejected));
        assert!(!LeadStatus::New.can_transition_to(LeadStatus::Converted));
    }

    #[test]
    fn converted_is_terminal() {
        for target in [
            LeadStatus::New,
            LeadStatus::Contacted,
            LeadStatus::Qualified,
            LeadStatus::Suspended,
            LeadStatus::Rejected,
            LeadStatus::Converted,
        ] {
            assert!(!LeadStatus::Converted.can_transition_to(target));
        }
    }
}
