// [libs/domain/models-rs/src/shipment.rs]
/*!
 * Shipment y sus satélites: EscrowRecord (1:1, sin puntero de vuelta —
 * ver §9 Design Notes), CarrierChange (log append-only que reconstruye
 * Shipment.carrier por repetición) y DisputeResolution.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    Confirmed,
    InTransit,
    Delivered,
    Cancelled,
    Disputed,
}

impl ShipmentStatus {
    /// El DAG de transición de estados de §4.9 (la tabla de adyacencia es
    /// explícita para que InvariantViolation sea detectable en tiempo de
    /// compilación de reglas, no sólo en datos).
    pub fn can_transition_to(self, target: ShipmentStatus) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, InTransit)
                | (Confirmed, Cancelled)
                | (InTransit, Delivered)
                | (InTransit, Disputed)
                | (InTransit, Cancelled)
                | (Disputed, Delivered)
                | (Disputed, Cancelled)
        )
    }
}

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: Uuid,
    pub tracking_code: String,
    pub carrier_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub weight_kg: f64,
    pub declared_value: f64,
    pub status: ShipmentStatus,
    pub planned_delivery_at: DateTime<Utc>,
    pub actual_delivery_at: Option<DateTime<Utc>>,
    pub current_position: Option<(GeoPoint, DateTime<Utc>)>,
    pub cost: f64,
    pub sale_price: f64,
    /// `saga_in_progress`: §5 guard-field — un único Shipment no puede
    /// tener dos sagas concurrentes en vuelo.
    pub saga_in_progress: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("margin invariant violated: sale_price ({sale_price}) < cost ({cost})")]
pub struct MarginInvariantError {
    pub sale_price: f64,
    pub cost: f64,
}

impl Shipment {
    pub fn margin(&self) -> f64 {
        self.sale_price - self.cost
    }

    /// §3 invariant: sale_price >= cost. Callers constructing or pricing a
    /// Shipment must check this before persisting.
    pub fn check_margin_invariant(&self) -> Result<(), MarginInvariantError> {
        if self.sale_price < self.cost {
            Err(MarginInvariantError {
                sale_price: self.sale_price,
                cost: self.cost,
            })
        } else {
            Ok(())
        }
    }

    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.actual_delivery_at.is_none() && now > self.planned_delivery_at
    }
}

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    Locked,
    Released,
    Refunded,
    Transferred,
    Disputed,
    Resolved,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowRecord {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub status: EscrowStatus,
    pub amount: f64,
    pub deadline: DateTime<Utc>,
    pub failover_count: u32,
    /// Inmutable tras la creación.
    pub original_carrier: Uuid,
    /// Actualizable únicamente vía saga.
    pub current_carrier: Uuid,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierChange {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub from_carrier: Uuid,
    pub to_carrier: Uuid,
    pub reason_code: String,
    pub executed_by: String,
    pub ledger_tx_id: Option<String>,
    pub success: bool,
    pub compensating_tx_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl CarrierChange {
    /// Testable Property 4: reconstruye `current_carrier` reproduciendo la
    /// secuencia de cambios exitosos en orden.
    pub fn replay_current_carrier(original_carrier: Uuid, history: &[CarrierChange]) -> Uuid {
        let mut current = original_carrier;
        for change in history.iter().filter(|c| c.success) {
            current = change.to_carrier;
        }
        current
    }
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeResolution {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub carrier_wins: bool,
    pub refund_amount: f64,
    pub evidence_digest: String,
    pub ai_analysis_digest: String,
    /// 0-100.
    pub confidence: u8,
    pub resolved_at: DateTime<Utc>,
    pub resolver: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier_change(from: Uuid, to: Uuid, success: bool) -> CarrierChange {
        CarrierChange {
            id: Uuid::new_v4(),
            shipment_id: Uuid::new_v4(),
            from_carrier: from,
            to_carrier: to,
            reason_code: "kpi_drop".into(),
            executed_by: "failover-agent".into(),
            ledger_tx_id: Some("tx-1".into()),
            success,
            compensating_tx_id: None,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn replay_reconstructs_current_carrier_from_successful_changes_only() {
        let original = Uuid::new_v4();
        let c2 = Uuid::new_v4();
        let c3 = Uuid::new_v4();
        let failed_attempt = Uuid::new_v4();

        let history = vec![
            carrier_change(original, c2, true),
            carrier_change(c2, failed_attempt, false),
            carrier_change(c2, c3, true),
        ];

        assert_eq!(CarrierChange::replay_current_carrier(original, &history), c3);
    }

    #[test]
    fn margin_invariant_rejects_sale_below_cost() {
        let shipment = Shipment {
            id: Uuid::new_v4(),
            tracking_code: "TRK-1".into(),
            carrier_id: Uuid::new_v4(),
            origin: "MXP".into(),
            destination: "FRA".into(),
            weight_kg: 10.0,
            declared_value: 500.0,
            status: ShipmentStatus::Pending,
            planned_delivery_at: Utc::now(),
            actual_delivery_at: None,
            current_position: None,
            cost: 100.0,
            sale_price: 90.0,
            saga_in_progress: false,
        };
        assert!(shipment.check_margin_invariant().is_err());
    }

    #[test]
    fn shipment_dag_forbids_skipping_confirmed() {
        assert!(!ShipmentStatus::Pending.can_transition_to(ShipmentStatus::InTransit));
        assert!(ShipmentStatus::Pending.can_transition_to(ShipmentStatus::Confirmed));
        assert!(ShipmentStatus::Confirmed.can_transition_to(ShipmentStatus::InTransit));
    }
}
