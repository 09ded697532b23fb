// [libs/domain/models-rs/src/lib.rs]
/*!
 * =================================================================
 * APARATO: BROKER DOMAIN MODELS (V1.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: DEFINICIÓN DE CONTRATOS SOBERANOS DEL BROKER
 *
 * Entidades y eventos compartidos por los componentes C1-C15 del plano
 * de orquestación: leads, sentimiento, perfiles psicológicos,
 * transportistas, envíos, escrow, disputas y el estado de control
 * (breakers, cuotas, niveles económicos, agentes).
 * =================================================================
 */

pub mod agent;
pub mod audit;
pub mod carrier;
pub mod config;
pub mod errors;
pub mod events;
pub mod identity;
pub mod interaction;
pub mod lead;
pub mod level;
pub mod profile;
pub mod persuasion_strategy;
pub mod resilience;
pub mod saga;
pub mod sentiment;
pub mod shipment;

pub use agent::{ActivityEntry, ActivityStatus, AgentKind, AgentStatus, AgentStatusLabel};
pub use audit::{AuditLogEntry, DecisionKind};
pub use carrier::Carrier;
pub use config::BrokerConfig;
pub use errors::BrokerError;
pub use events::{BrokerEvent, EventEnvelope};
pub use identity::{Identity, Role, Session};
pub use interaction::Interaction;
pub use lead::{Lead, LeadStatus};
pub use level::{EconomicLevel, LevelId, LevelState};
pub use profile::{ObjectionClass, ProfileType, PsychProfile};
pub use persuasion_strategy::{ObjectionHandler, PersuasionStrategy};
pub use resilience::{CircuitState, CircuitStateKind, QuotaCounter};
pub use saga::{SagaJournalEntry, SagaStepStatus};
pub use sentiment::{SentimentMethod, SentimentRecord};
pub use shipment::{
    CarrierChange, DisputeResolution, EscrowRecord, EscrowStatus, GeoPoint, Shipment,
    ShipmentStatus,
};
