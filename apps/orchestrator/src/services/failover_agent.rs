// [apps/orchestrator/src/services/failover_agent.rs]
/*!
 * FailoverAgent (C9, §4.8): daemon periódico que vigila los envíos de
 * transportistas caídos por debajo del KPI mínimo y los reasigna a un
 * reemplazo elegible mediante una saga de transferencia de escrow.
 * Respeta la parada de emergencia (§5): si el sistema está en
 * mantenimiento, el tick se salta por completo.
 */

use std::sync::Arc;
use std::time::Duration;

use broker_core_saga::{SagaCoordinator, SagaStep, SagaStepError};
use broker_domain_models::agent::{ActivityStatus, AgentKind, AgentStatusLabel};
use broker_domain_models::audit::DecisionKind;
use broker_domain_models::events::BrokerEvent;
use broker_domain_models::shipment::CarrierChange;
use broker_infra_ledger::LedgerClient;
use chrono::{Duration as ChronoDuration, Utc};
use tokio::time::interval;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::state::AppState;

/// §4.8 paso 4: gracia fija aplicada al plazo tras un failover exitoso.
const FAILOVER_DEADLINE_GRACE_DAYS: i64 = 1;

pub fn spawn_failover_agent(state: AppState) {
    let check_interval = Duration::from_secs(state.config.failover.check_interval_s);

    tokio::spawn(async move {
        info!("failover agent started, checking every {:?}", check_interval);
        let mut ticker = interval(check_interval);

        loop {
            ticker.tick().await;

            if state.is_operational().is_err() {
                info!("system under maintenance, failover agent skipping tick");
                continue;
            }

            if let Err(error) = run_tick(&state).await {
                warn!(%error, "failover tick failed");
            }
        }
    });
}

#[instrument(skip(state))]
async fn run_tick(state: &AppState) -> Result<(), String> {
    state.agent_registry.set_status(AgentKind::Failover, AgentStatusLabel::Processing, Some("scanning carriers".into()));

    let carriers = state.carriers.list_enabled().await.map_err(|e| e.to_string())?;
    let now = Utc::now();

    for carrier in &carriers {
        if carrier.is_available(now) {
            continue;
        }

        let at_risk = state.shipments.list_at_risk_for_carrier(carrier.id, now).await.map_err(|e| e.to_string())?;
        for shipment in at_risk {
            let replacement = carriers
                .iter()
                .find(|candidate| {
                    candidate.id != carrier.id
                        && candidate.is_eligible_replacement(
                            &shipment.origin,
                            &shipment.destination,
                            state.config.failover.replacement_min_pct as f32,
                            now,
                        )
                })
                .cloned();

            let Some(replacement) = replacement else {
                state.agent_registry.record_activity(
                    "failover",
                    ActivityStatus::Warning,
                    format!("no eligible replacement for shipment {}", shipment.id),
                );
                continue;
            };

            if shipment.declared_value > state.config.failover.auto_limit_amount {
                state.event_bus.publish(
                    BrokerEvent::FailoverRequiresOverride {
                        shipment_id: shipment.id,
                        escrow_amount: shipment.declared_value,
                    },
                    "failover-agent",
                );
                continue;
            }

            if !state.shipments.try_acquire_saga_lock(shipment.id).await.map_err(|e| e.to_string())? {
                continue;
            }

            let outcome =
                execute_failover_saga(state, shipment.id, carrier.id, replacement.id, state.ledger.clone(), "kpi_drop").await;
            state.shipments.release_saga_lock(shipment.id).await.map_err(|e| e.to_string())?;

            let audit_input = format!(
                "shipment:{}:from_carrier:{}:candidate:{}:declared_value:{}",
                shipment.id, carrier.id, replacement.id, shipment.declared_value
            );

            match outcome {
                Ok(()) => {
                    state.event_bus.publish(
                        BrokerEvent::CarrierFailoverSucceeded {
                            shipment_id: shipment.id,
                            from_carrier: carrier.id,
                            to_carrier: replacement.id,
                        },
                        "failover-agent",
                    );
                    state.agent_registry.record_activity(
                        "failover",
                        ActivityStatus::Success,
                        format!("shipment {} reassigned to {}", shipment.id, replacement.id),
                    );
                    let _ = state
                        .audit_log
                        .record(
                            DecisionKind::FailoverChoice,
                            &audit_input,
                            &format!("to_carrier:{}:outcome:committed", replacement.id),
                            "on_time_rate below threshold, replacement eligible by route coverage and reliability",
                            "automatic failover saga committed",
                            false,
                        )
                        .await;
                }
                Err(reason) => {
                    state.event_bus.publish(
                        BrokerEvent::CarrierFailoverFailed {
                            shipment_id: shipment.id,
                            reason: reason.clone(),
                            compensating_tx_id: None,
                        },
                        "failover-agent",
                    );
                    state.agent_registry.record_activity("failover", ActivityStatus::Error, reason.clone());
                    let _ = state
                        .audit_log
                        .record(
                            DecisionKind::FailoverChoice,
                            &audit_input,
                            &format!("to_carrier:{}:outcome:rolled_back:{}", replacement.id, reason),
                            "on_time_rate below threshold, replacement eligible by route coverage and reliability",
                            "automatic failover saga failed and was compensated",
                            false,
                        )
                        .await;
                }
            }
        }
    }

    state.agent_registry.set_status(AgentKind::Failover, AgentStatusLabel::Standby, None);
    Ok(())
}

/// Ejecuta la saga de transferencia de escrow/transportista. La expone
/// `pub(crate)` con `reason_code` parametrizable porque el comando de
/// mando `change_carrier` (§4.14) reutiliza el mismo camino con un
/// código distinto al del tick automático.
pub(crate) async fn execute_failover_saga(
    state: &AppState,
    shipment_id: Uuid,
    from_carrier: Uuid,
    to_carrier: Uuid,
    ledger: Arc<LedgerClient>,
    reason_code: &str,
) -> Result<(), String> {
    state.event_bus.publish(
        BrokerEvent::CarrierFailoverInitiated { shipment_id, from_carrier },
        "failover-agent",
    );

    let journal = state.saga_journal.clone();
    let coordinator = SagaCoordinator::new(&*journal);
    let saga_id = Uuid::new_v4();

    let escrow_before = state.escrow.get_by_shipment(shipment_id).await.map_err(|e| e.to_string())?;
    let shipment_before = state.shipments.get(shipment_id).await.map_err(|e| e.to_string())?;
    let old_escrow_deadline = escrow_before.deadline;
    let old_shipment_deadline = shipment_before.planned_delivery_at;
    let new_escrow_deadline = old_escrow_deadline + ChronoDuration::days(FAILOVER_DEADLINE_GRACE_DAYS);
    let new_shipment_deadline = old_shipment_deadline + ChronoDuration::days(FAILOVER_DEADLINE_GRACE_DAYS);

    let escrow_ledger = ledger.clone();
    let escrow_db = state.escrow.clone();
    let escrow_ledger_compensate = ledger.clone();
    let escrow_db_compensate = state.escrow.clone();
    let transfer_step = SagaStep::new(
        "transfer_escrow",
        move || {
            let ledger = escrow_ledger.clone();
            let escrow = escrow_db.clone();
            async move {
                ledger
                    .transfer_to_new_carrier(shipment_id, to_carrier)
                    .await
                    .map_err(|e| SagaStepError(e.to_string()))?;
                escrow.transfer_to_carrier(shipment_id, to_carrier).await.map_err(|e| SagaStepError(e.to_string()))
            }
        },
        move || {
            let ledger = escrow_ledger_compensate.clone();
            let escrow = escrow_db_compensate.clone();
            async move {
                ledger
                    .transfer_to_new_carrier(shipment_id, from_carrier)
                    .await
                    .map_err(|e| SagaStepError(e.to_string()))?;
                escrow.transfer_to_carrier(shipment_id, from_carrier).await.map_err(|e| SagaStepError(e.to_string()))
            }
        },
    );

    let shipment_db = state.shipments.clone();
    let shipment_db_compensate = state.shipments.clone();
    let update_step = SagaStep::new(
        "update_shipment_carrier",
        move || {
            let shipments = shipment_db.clone();
            async move { shipments.update_carrier(shipment_id, to_carrier).await.map_err(|e| SagaStepError(e.to_string())) }
        },
        move || {
            let shipments = shipment_db_compensate.clone();
            async move { shipments.update_carrier(shipment_id, from_carrier).await.map_err(|e| SagaStepError(e.to_string())) }
        },
    );

    let escrow_deadline_db = state.escrow.clone();
    let escrow_deadline_db_compensate = state.escrow.clone();
    let shipment_deadline_db = state.shipments.clone();
    let shipment_deadline_db_compensate = state.shipments.clone();
    let extend_deadline_step = SagaStep::new(
        "extend_shipment_deadline",
        move || {
            let escrow = escrow_deadline_db.clone();
            let shipments = shipment_deadline_db.clone();
            async move {
                escrow.extend_deadline(shipment_id, new_escrow_deadline).await.map_err(|e| SagaStepError(e.to_string()))?;
                shipments.extend_deadline(shipment_id, new_shipment_deadline).await.map_err(|e| SagaStepError(e.to_string()))
            }
        },
        move || {
            let escrow = escrow_deadline_db_compensate.clone();
            let shipments = shipment_deadline_db_compensate.clone();
            async move {
                escrow.extend_deadline(shipment_id, old_escrow_deadline).await.map_err(|e| SagaStepError(e.to_string()))?;
                shipments.extend_deadline(shipment_id, old_shipment_deadline).await.map_err(|e| SagaStepError(e.to_string()))
            }
        },
    );

    let result = coordinator.run(saga_id, vec![transfer_step, update_step, extend_deadline_step]).await;

    let change = CarrierChange {
        id: Uuid::new_v4(),
        shipment_id,
        from_carrier,
        to_carrier,
        reason_code: reason_code.to_string(),
        executed_by: "failover-agent".to_string(),
        ledger_tx_id: None,
        success: result.is_ok(),
        compensating_tx_id: None,
        occurred_at: Utc::now(),
    };
    let _ = state.carrier_changes.append(&change).await;

    if let Err(ref saga_error) = result {
        state.event_bus.publish(
            BrokerEvent::SagaRolledBack { saga_id, reason: saga_error.to_string() },
            "failover-agent",
        );
    }

    result.map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use broker_domain_models::carrier::Carrier;
    use broker_domain_models::config::BrokerConfig;
    use broker_domain_models::shipment::{EscrowRecord, EscrowStatus, Shipment, ShipmentStatus};
    use broker_infra_ai_clients::{LocalLlmClient, RemoteProsodyClient};
    use chrono::Duration as ChronoDuration;

    async fn spawn_mock_ledger() -> String {
        async fn transfer_handler(Json(_body): Json<serde_json::Value>) -> Json<serde_json::Value> {
            Json(serde_json::json!({"tx_id": "tx-mock-1"}))
        }

        let router = Router::new().route("/v1/escrow/transfer", post(transfer_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{address}")
    }

    fn test_config(auto_limit_amount: f64) -> BrokerConfig {
        let raw = format!(
            r#"
            [remote_prosody]
            quota_limit = 1000

            [breaker]

            [failover]
            auto_limit_amount = {auto_limit_amount}

            [dispute]
            auto_resolve_limit_amount = 5000.0

            [level]
            [level.debounce_months]
            L1 = 1

            [hub]
            "#
        );
        BrokerConfig::from_toml_str(&raw).expect("valid test config")
    }

    fn carrier(on_time_rate: f32, blacklisted: bool) -> Carrier {
        Carrier {
            id: Uuid::new_v4(),
            name: "Test Carrier".into(),
            mode: "road".into(),
            on_time_rate,
            reliability_score: 90.0,
            wallet_identity: "wallet".into(),
            enabled: true,
            blacklisted_until: if blacklisted { Some(Utc::now() + ChronoDuration::days(30)) } else { None },
            covered_routes: vec![("MXP".to_string(), "FRA".to_string())],
        }
    }

    fn shipment(carrier_id: Uuid, declared_value: f64) -> Shipment {
        Shipment {
            id: Uuid::new_v4(),
            tracking_code: "TRK-FAILOVER".into(),
            carrier_id,
            origin: "MXP".into(),
            destination: "FRA".into(),
            weight_kg: 50.0,
            declared_value,
            status: ShipmentStatus::Confirmed,
            planned_delivery_at: Utc::now() + ChronoDuration::days(2),
            actual_delivery_at: None,
            current_position: None,
            cost: declared_value * 0.6,
            sale_price: declared_value * 0.8,
            saga_in_progress: false,
        }
    }

    async fn build_state(auto_limit_amount: f64, ledger_base_url: String) -> AppState {
        let db = broker_infra_db::TursoClient::connect(":memory:", None).await.unwrap();
        let ledger = Arc::new(LedgerClient::new(ledger_base_url, "test-key".into()));
        let prosody = Arc::new(RemoteProsodyClient::new("http://127.0.0.1:1".to_string(), "key".to_string()));
        let llm = Arc::new(LocalLlmClient::new("http://127.0.0.1:1".to_string()));
        AppState::new(db, test_config(auto_limit_amount), ledger, prosody, llm, Vec::new())
    }

    #[tokio::test]
    async fn failover_happy_path_reassigns_shipment_and_records_success() {
        let ledger_base_url = spawn_mock_ledger().await;
        let state = build_state(10_000.0, ledger_base_url).await;

        let grounded_carrier = carrier(85.0, true);
        let replacement_carrier = carrier(97.0, false);
        state.carriers.upsert(&grounded_carrier).await.unwrap();
        state.carriers.upsert(&replacement_carrier).await.unwrap();

        let at_risk_shipment = shipment(grounded_carrier.id, 2_000.0);
        state.shipments.create(&at_risk_shipment).await.unwrap();
        state
            .escrow
            .create(&EscrowRecord {
                id: Uuid::new_v4(),
                shipment_id: at_risk_shipment.id,
                status: EscrowStatus::Locked,
                amount: 2_000.0,
                deadline: at_risk_shipment.planned_delivery_at,
                failover_count: 0,
                original_carrier: grounded_carrier.id,
                current_carrier: grounded_carrier.id,
            })
            .await
            .unwrap();

        let mut events = state.event_bus.subscribe();

        run_tick(&state).await.unwrap();

        let reloaded = state.shipments.get(at_risk_shipment.id).await.unwrap();
        assert_eq!(reloaded.carrier_id, replacement_carrier.id);
        assert!(
            reloaded.planned_delivery_at > at_risk_shipment.planned_delivery_at,
            "deadline must be extended on successful failover"
        );

        let reloaded_escrow = state.escrow.get_by_shipment(at_risk_shipment.id).await.unwrap();
        assert!(reloaded_escrow.deadline > at_risk_shipment.planned_delivery_at, "escrow deadline must be extended too");

        let changes = state.carrier_changes.list_by_shipment(at_risk_shipment.id).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].success);
        assert_eq!(changes[0].from_carrier, grounded_carrier.id);
        assert_eq!(changes[0].to_carrier, replacement_carrier.id);

        let mut saw_success_event = false;
        while let Ok(envelope) = events.try_recv() {
            if matches!(envelope.event, BrokerEvent::CarrierFailoverSucceeded { shipment_id, .. } if shipment_id == at_risk_shipment.id) {
                saw_success_event = true;
            }
        }
        assert!(saw_success_event, "expected a CarrierFailoverSucceeded event");
    }

    #[tokio::test]
    async fn failover_above_auto_limit_requires_override_and_leaves_shipment_untouched() {
        let ledger_base_url = spawn_mock_ledger().await;
        let state = build_state(10_000.0, ledger_base_url).await;

        let grounded_carrier = carrier(85.0, true);
        let replacement_carrier = carrier(97.0, false);
        state.carriers.upsert(&grounded_carrier).await.unwrap();
        state.carriers.upsert(&replacement_carrier).await.unwrap();

        let high_value_shipment = shipment(grounded_carrier.id, 25_000.0);
        state.shipments.create(&high_value_shipment).await.unwrap();

        let mut events = state.event_bus.subscribe();

        run_tick(&state).await.unwrap();

        let reloaded = state.shipments.get(high_value_shipment.id).await.unwrap();
        assert_eq!(reloaded.carrier_id, grounded_carrier.id, "carrier must not change without an override");

        let changes = state.carrier_changes.list_by_shipment(high_value_shipment.id).await.unwrap();
        assert!(changes.is_empty());

        let mut saw_override_event = false;
        while let Ok(envelope) = events.try_recv() {
            if let BrokerEvent::FailoverRequiresOverride { shipment_id, escrow_amount } = envelope.event {
                if shipment_id == high_value_shipment.id {
                    assert_eq!(escrow_amount, 25_000.0);
                    saw_override_event = true;
                }
            }
        }
        assert!(saw_override_event, "expected a FailoverRequiresOverride event");
    }
}
