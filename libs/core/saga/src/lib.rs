// [libs/core/saga/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SAGA CORE (C11)
 * CLASIFICACIÓN: CORE ORCHESTRATION (ESTRATO L3)
 * RESPONSABILIDAD: COMMITS ATÓMICOS DE DOS FASES CON COMPENSACIÓN
 * =================================================================
 */

pub mod coordinator;
pub mod journal;

pub use coordinator::{SagaCoordinator, SagaStep, SagaStepError};
pub use journal::{InMemorySagaJournal, SagaJournal};
