// [libs/domain/models-rs/src/config.rs]
/*!
 * BrokerConfig: el registro explícito de claves reconocidas (§6, §9
 * "Global settings become an explicit config record"). Claves
 * desconocidas son rechazadas en tiempo de carga vía
 * `deny_unknown_fields` sobre la capa TOML cruda.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteProsodyConfig {
    pub quota_limit: u64,
    #[serde(default = "default_fallback_threshold_pct")]
    pub fallback_threshold_pct: f64,
}

fn default_fallback_threshold_pct() -> f64 {
    90.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    pub recovery_timeout_s: u64,
}

fn default_failure_threshold() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FailoverConfig {
    #[serde(default = "default_check_interval")]
    pub check_interval_s: u64,
    #[serde(default = "default_kpi_min_pct")]
    pub kpi_min_pct: f64,
    #[serde(default = "default_replacement_min_pct")]
    pub replacement_min_pct: f64,
    pub auto_limit_amount: f64,
}

fn default_check_interval() -> u64 {
    300
}
fn default_kpi_min_pct() -> f64 {
    90.0
}
fn default_replacement_min_pct() -> f64 {
    95.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisputeConfig {
    #[serde(default = "default_auto_resolve_confidence")]
    pub auto_resolve_confidence: u8,
    pub auto_resolve_limit_amount: f64,
}

fn default_auto_resolve_confidence() -> u8 {
    85
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelConfig {
    /// Claves: "L1".."L4".
    pub debounce_months: HashMap<String, u32>,
    #[serde(default = "default_safety_ratio_max")]
    pub safety_ratio_max: f64,
}

fn default_safety_ratio_max() -> f64 {
    0.90
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HubConfig {
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_heartbeat_s")]
    pub heartbeat_s: u64,
    #[serde(default = "default_replay_last_n")]
    pub replay_last_n: usize,
}

fn default_buffer_size() -> usize {
    256
}
fn default_heartbeat_s() -> u64 {
    30
}
fn default_replay_last_n() -> usize {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    pub remote_prosody: RemoteProsodyConfig,
    /// Claves: nombre de dependencia (p.ej. "remote_prosody", "local_llm").
    pub breaker: HashMap<String, BreakerConfig>,
    pub failover: FailoverConfig,
    pub dispute: DisputeConfig,
    pub level: LevelConfig,
    pub hub: HubConfig,
}

#[derive(Debug, thiserror::Error)]
#[error("CONFIG_PARSE_FAULT: {0}")]
pub struct ConfigError(String);

impl BrokerConfig {
    /// Parsea el archivo de configuración del operador (§6). Usa la crate
    /// `toml` en lugar de reescribir un parser propio, acorde al resto del
    /// ecosistema.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_top_level_key() {
        let raw = r#"
            unknown_key = true

            [remote_prosody]
            quota_limit = 1000

            [breaker]

            [failover]
            auto_limit_amount = 10000.0

            [dispute]
            auto_resolve_limit_amount = 5000.0

            [level]
            [level.debounce_months]
            L1 = 1

            [hub]
        "#;
        assert!(BrokerConfig::from_toml_str(raw).is_err());
    }

    #[test]
    fn applies_documented_defaults() {
        let raw = r#"
            [remote_prosody]
            quota_limit = 1000

            [breaker]

            [failover]
            auto_limit_amount = 10000.0

            [dispute]
            auto_resolve_limit_amount = 5000.0

            [level]
            [level.debounce_months]
            L1 = 1

            [hub]
        "#;
        let config = BrokerConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.remote_prosody.fallback_threshold_pct, 90.0);
        assert_eq!(config.dispute.auto_resolve_confidence, 85);
        assert_eq!(config.hub.buffer_size, 256);
    }
}
