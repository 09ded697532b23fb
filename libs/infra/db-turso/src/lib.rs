// [libs/infra/db-turso/src/lib.rs]
pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::TursoClient;
pub use errors::DbError;
pub use repositories::{
    AuditLogRepository, CarrierChangeRepository, CarrierRepository, DbSagaJournal, DisputeRepository,
    EscrowRepository, InteractionRepository, LeadRepository, LevelStateRepository, PersuasionStrategyRepository,
    ProfileRepository, SentimentRepository, ShipmentRepository,
};
