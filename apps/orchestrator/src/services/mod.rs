// [apps/orchestrator/src/services/mod.rs]
/*!
 * Servicios de aplicación: el bus de eventos (C12), el registro de
 * agentes (C6), el limitador de tasa y el log de auditoría (C14), y
 * los dos agentes de fondo que operan sobre envíos y disputas
 * (§4.8-§4.9).
 */

pub mod agent_registry;
pub mod audit;
pub mod dispute_agent;
pub mod event_bus;
pub mod failover_agent;
pub mod rate_limiter;
pub mod session;
pub mod swarm_orchestrator;

pub use agent_registry::AgentRegistry;
pub use audit::AuditLogService;
pub use dispute_agent::spawn_dispute_agent;
pub use event_bus::EventBus;
pub use failover_agent::{execute_failover_saga, spawn_failover_agent};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use session::SessionStore;
pub use swarm_orchestrator::spawn_swarm_orchestrator;
