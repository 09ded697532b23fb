// [libs/core/revenue/src/lib.rs]
/*!
 * =================================================================
 * APARATO: REVENUE CORE (C7 / C8)
 * CLASIFICACIÓN: CORE ORCHESTRATION (ESTRATO L3)
 * RESPONSABILIDAD: ACTIVACIÓN PROGRESIVA POR INGRESO
 * =================================================================
 */

pub mod component;
pub mod monitor;
pub mod provisioning;

pub use component::{ComponentLifecycle, ComponentState};
pub use monitor::{CompletedPayment, CostAlert, LevelTrigger, RevenueMonitor};
pub use provisioning::ProvisioningOrchestrator;
