// [libs/core/resilience/src/lib.rs]
/*!
 * =================================================================
 * APARATO: RESILIENCE CORE (C1 / C2)
 * CLASIFICACIÓN: CORE ORCHESTRATION (ESTRATO L3)
 * RESPONSABILIDAD: BREAKERS POR DEPENDENCIA Y CONTABILIDAD DE CUOTA
 *
 * Implementa el breaker de tres estados de §4.1 (cerrado/abierto/
 * semi-abierto) con un registro global por nombre de dependencia, y el
 * ledger de cuota de §4.2 con cache TTL de 5 minutos y fallback
 * conservador ante fallo remoto.
 * =================================================================
 */

pub mod breaker;
pub mod quota;

pub use breaker::{BreakerConfig, BreakerRegistry, CircuitBreaker, CircuitError};
pub use quota::{QuotaLedger, QuotaSnapshot};
