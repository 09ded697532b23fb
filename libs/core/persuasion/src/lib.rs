// [libs/core/persuasion/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PERSUASION CORE (C4 / C5)
 * CLASIFICACIÓN: CORE ORCHESTRATION (ESTRATO L3)
 * RESPONSABILIDAD: ASIGNACIÓN DE PERFIL Y SELECCIÓN DE GUIONES
 * =================================================================
 */

pub mod engine;
pub mod profile_store;

pub use broker_domain_models::persuasion_strategy::{ObjectionHandler, PersuasionStrategy};
pub use engine::{PersuasionEngine, ScriptSelection};
pub use profile_store::{ProfileStore, TriggerSignals};
