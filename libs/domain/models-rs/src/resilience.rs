// [libs/domain/models-rs/src/resilience.rs]
/*!
 * Tipos de datos puros para el control de resiliencia (C1/C2). La
 * lógica de transición vive en `broker-core-resilience`; aquí sólo se
 * define la forma del estado para que pueda circular por eventos,
 * métricas y la capa de persistencia sin acoplar esos consumidores al
 * motor de la máquina de estados.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CircuitStateKind {
    Closed,
    Open,
    HalfOpen,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitState {
    pub dependency: String,
    pub state: CircuitStateKind,
    pub consecutive_failures: u32,
    pub opened_at: Option<DateTime<Utc>>,
    pub half_open_probes: u32,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaCounter {
    pub dependency: String,
    pub used: u64,
    pub limit: u64,
    pub updated_at: DateTime<Utc>,
}

impl QuotaCounter {
    pub fn percent(&self) -> f64 {
        if self.limit == 0 {
            100.0
        } else {
            (self.used as f64 / self.limit as f64) * 100.0
        }
    }
}
