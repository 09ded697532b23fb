// [libs/domain/models-rs/src/carrier.rs]
/*!
 * Carrier: transportista habilitado para recibir envíos. Monitoreado
 * por FailoverAgent (C9) para decisiones de reemplazo.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carrier {
    pub id: Uuid,
    pub name: String,
    pub mode: String,
    /// Porcentaje 0-100.
    pub on_time_rate: f32,
    /// Porcentaje 0-100.
    pub reliability_score: f32,
    pub wallet_identity: String,
    pub enabled: bool,
    pub blacklisted_until: Option<DateTime<Utc>>,
    /// Rutas (origen, destino) que este transportista cubre; el predicado
    /// de cobertura geográfica de §9 Open Questions se implementa aquí
    /// como una lista total y determinista, no como una heurística.
    pub covered_routes: Vec<(String, String)>,
}

impl Carrier {
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.blacklisted_until.map(|until| now >= until).unwrap_or(true)
    }

    pub fn covers_route(&self, origin: &str, destination: &str) -> bool {
        self.covered_routes
            .iter()
            .any(|(o, d)| o == origin && d == destination)
    }

    /// §4.8 replacement predicate: habilitado, `on_time_rate >= min_pct`,
    /// cubre la ruta. La disponibilidad-en-2h se modela fuera de este
    /// struct (depende de la carga operativa actual del transportista, no
    /// de un atributo estático de Carrier).
    pub fn is_eligible_replacement(&self, origin: &str, destination: &str, min_on_time_pct: f32, now: DateTime<Utc>) -> bool {
        self.is_available(now) && self.on_time_rate >= min_on_time_pct && self.covers_route(origin, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier(on_time: f32, enabled: bool) -> Carrier {
        Carrier {
            id: Uuid::new_v4(),
            name: "Test Carrier".into(),
            mode: "road".into(),
            on_time_rate: on_time,
            reliability_score: 90.0,
            wallet_identity: "wallet-1".into(),
            enabled,
            blacklisted_until: None,
            covered_routes: vec![("MXP".into(), "FRA".into())],
        }
    }

    #[test]
    fn eligible_replacement_requires_coverage_and_kpi() {
        let c = carrier(97.0, true);
        let now = Utc::now();
        assert!(c.is_eligible_replacement("MXP", "FRA", 95.0, now));
        assert!(!c.is_eligible_replacement("MXP", "JFK", 95.0, now));
        assert!(!c.is_eligible_replacement("MXP", "FRA", 98.0, now));
    }

    #[test]
    fn disabled_carrier_is_never_eligible() {
        let c = carrier(99.0, false);
        assert!(!c.is_eligible_replacement("MXP", "FRA", 50.0, Utc::now()));
    }
}
