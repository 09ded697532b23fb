// [libs/infra/db-turso/src/repositories/mod.rs]
pub mod audit_log;
pub mod carrier;
pub mod carrier_change;
pub mod dispute;
pub mod escrow;
pub mod interaction;
pub mod lead;
pub mod level_state;
pub mod persuasion_strategy;
pub mod profile;
pub mod saga_journal;
pub mod sentiment;
pub mod shipment;

pub use audit_log::AuditLogRepository;
pub use carrier::CarrierRepository;
pub use carrier_change::CarrierChangeRepository;
pub use dispute::DisputeRepository;
pub use escrow::EscrowRepository;
pub use interaction::InteractionRepository;
pub use lead::LeadRepository;
pub use level_state::LevelStateRepository;
pub use persuasion_strategy::PersuasionStrategyRepository;
pub use profile::ProfileRepository;
pub use saga_journal::DbSagaJournal;
pub use sentiment::SentimentRepository;
pub use shipment::ShipmentRepository;
