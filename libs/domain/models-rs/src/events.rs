// [libs/domain/models-rs/src/events.rs]
/*!
 * Eventos del bus en proceso (C12). Los nombres de variantes siguen la
 * taxonomía dot-separated del §4.11 (`sentiment.*`, `carrier.*`,
 * `dispute.*`, `revenue.*`, `agent.*`, `command.*`) aunque aquí se
 * representan como variantes tipadas en lugar de strings sueltos, para
 * que los publicadores no puedan emitir un payload mal formado.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use typeshare::typeshare;
use uuid::Uuid;

use crate::agent::AgentKind;
use crate::level::LevelId;
use crate::sentiment::SentimentRecord;

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BrokerEvent {
    #[serde(rename = "sentiment.analyzed")]
    SentimentAnalyzed(SentimentRecord),
    #[serde(rename = "sentiment.escalation")]
    SentimentEscalation { sentiment_id: Uuid, lead_id: Uuid, reason: String },

    #[serde(rename = "carrier.failover_initiated")]
    CarrierFailoverInitiated { shipment_id: Uuid, from_carrier: Uuid },
    #[serde(rename = "carrier.failover_succeeded")]
    CarrierFailoverSucceeded { shipment_id: Uuid, from_carrier: Uuid, to_carrier: Uuid },
    #[serde(rename = "carrier.failover_failed")]
    CarrierFailoverFailed { shipment_id: Uuid, reason: String, compensating_tx_id: Option<String> },
    #[serde(rename = "failover.requires_override")]
    FailoverRequiresOverride { shipment_id: Uuid, escrow_amount: f64 },
    #[serde(rename = "carrier.fraud_suspect")]
    CarrierFraudSuspect { carrier_id: Uuid, occurrences: u32 },

    #[serde(rename = "dispute.opened")]
    DisputeOpened { shipment_id: Uuid },
    #[serde(rename = "dispute.escalated")]
    DisputeEscalated { shipment_id: Uuid, confidence: u8, reasons: Vec<String> },
    #[serde(rename = "dispute.need_more_evidence")]
    DisputeNeedMoreEvidence { shipment_id: Uuid, confidence: u8 },
    #[serde(rename = "dispute.resolved")]
    DisputeResolved { shipment_id: Uuid, carrier_wins: bool, refund_amount: f64 },

    #[serde(rename = "revenue.metrics")]
    RevenueMetrics { mrr: f64 },
    #[serde(rename = "revenue.trigger")]
    RevenueTrigger { level_id: LevelId, confidence: f64 },
    #[serde(rename = "cost.alert_warning")]
    CostAlertWarning { cost_ratio: f64 },
    #[serde(rename = "cost.alert_critical")]
    CostAlertCritical { cost_ratio: f64 },
    #[serde(rename = "level.transitioned")]
    LevelTransitioned { from: LevelId, to: LevelId },
    #[serde(rename = "level.safety_violation")]
    LevelSafetyViolation { level_id: LevelId, max_burn: f64, mrr: f64 },

    #[serde(rename = "agent.activity")]
    AgentActivity { agent: AgentKind, description: String },

    #[serde(rename = "saga.rolled_back")]
    SagaRolledBack { saga_id: Uuid, reason: String },

    #[serde(rename = "stream.lag_warning")]
    StreamLagWarning { subscriber_id: Uuid, dropped: u32 },

    #[serde(rename = "command.executed")]
    CommandExecuted { command: String, operator: String, detail: Option<Value> },
}

impl BrokerEvent {
    /// Nombre de tópico dot-separated, usado para el filtrado de
    /// suscripciones del CommandCenterHub (§4.12).
    pub fn topic(&self) -> &'static str {
        match self {
            BrokerEvent::SentimentAnalyzed(_) => "sentiment.analyzed",
            BrokerEvent::SentimentEscalation { .. } => "sentiment.escalation",
            BrokerEvent::CarrierFailoverInitiated { .. } => "carrier.failover_initiated",
            BrokerEvent::CarrierFailoverSucceeded { .. } => "carrier.failover_succeeded",
            BrokerEvent::CarrierFailoverFailed { .. } => "carrier.failover_failed",
            BrokerEvent::FailoverRequiresOverride { .. } => "failover.requires_override",
            BrokerEvent::CarrierFraudSuspect { .. } => "carrier.fraud_suspect",
            BrokerEvent::DisputeOpened { .. } => "dispute.opened",
            BrokerEvent::DisputeEscalated { .. } => "dispute.escalated",
            BrokerEvent::DisputeNeedMoreEvidence { .. } => "dispute.need_more_evidence",
            BrokerEvent::DisputeResolved { .. } => "dispute.resolved",
            BrokerEvent::RevenueMetrics { .. } => "revenue.metrics",
            BrokerEvent::RevenueTrigger { .. } => "revenue.trigger",
            BrokerEvent::CostAlertWarning { .. } => "cost.alert_warning",
            BrokerEvent::CostAlertCritical { .. } => "cost.alert_critical",
            BrokerEvent::LevelTransitioned { .. } => "level.transitioned",
            BrokerEvent::LevelSafetyViolation { .. } => "level.safety_violation",
            BrokerEvent::AgentActivity { .. } => "agent.activity",
            BrokerEvent::SagaRolledBack { .. } => "saga.rolled_back",
            BrokerEvent::StreamLagWarning { .. } => "stream.lag_warning",
            BrokerEvent::CommandExecuted { .. } => "command.executed",
        }
    }
}

/// Envoltorio de transporte de eventos con metadatos de trazabilidad
/// (§4.11): fuente, timestamp, correlation_id.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event: BrokerEvent,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
}

impl EventEnvelope {
    pub fn new(event: BrokerEvent, source: impl Into<String>) -> Self {
        Self {
            event,
            source: source.into(),
            timestamp: Utc::now(),
            correlation_id: Uuid::new_v4(),
        }
    }
}
