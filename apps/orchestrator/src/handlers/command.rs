// [apps/orchestrator/src/handlers/command.rs]
/*!
 * Comandos de centro de mando (C11, §4.14): cada handler exige un rol
 * mínimo del operador autenticado, ejecuta su efecto, y publica
 * `CommandExecuted` para que el panel lo refleje en tiempo real.
 */

use axum::extract::State;
use axum::{Extension, Json};
use broker_domain_models::agent::AgentKind;
use broker_domain_models::errors::BrokerError;
use broker_domain_models::events::BrokerEvent;
use broker_domain_models::identity::Role;
use broker_domain_models::level::LevelId;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::middleware::OperatorIdentity;
use crate::services::execute_failover_saga;
use crate::state::{AppState, SystemMode};

fn publish_command(state: &AppState, command: &str, operator: &str, detail: Option<serde_json::Value>) {
    state.event_bus.publish(
        BrokerEvent::CommandExecuted { command: command.to_string(), operator: operator.to_string(), detail },
        "command-center",
    );
}

#[derive(Debug, Deserialize)]
pub struct ChangeCarrierRequest {
    pub shipment_id: Uuid,
    pub from_carrier: Uuid,
    pub to_carrier: Uuid,
}

pub async fn change_carrier(
    State(state): State<AppState>,
    Extension(identity): Extension<OperatorIdentity>,
    Json(body): Json<ChangeCarrierRequest>,
) -> Result<Json<()>, ApiError> {
    identity.require_role(Role::Admin)?;

    if !state.shipments.try_acquire_saga_lock(body.shipment_id).await.map_err(|e| BrokerError::TransientDependency(e.to_string()))? {
        return Err(BrokerError::Conflict("shipment already has a saga in progress".to_string()).into());
    }

    let outcome = execute_failover_saga(
        &state,
        body.shipment_id,
        body.from_carrier,
        body.to_carrier,
        state.ledger.clone(),
        "manual_operator_override",
    )
    .await;

    state
        .shipments
        .release_saga_lock(body.shipment_id)
        .await
        .map_err(|e| BrokerError::TransientDependency(e.to_string()))?;

    outcome.map_err(BrokerError::SagaFailed)?;

    publish_command(
        &state,
        "change_carrier",
        &identity.username,
        Some(json!({"shipment_id": body.shipment_id, "from_carrier": body.from_carrier, "to_carrier": body.to_carrier})),
    );
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct EmergencyStopRequest {
    pub reason: String,
}

pub async fn emergency_stop(
    State(state): State<AppState>,
    Extension(identity): Extension<OperatorIdentity>,
    Json(body): Json<EmergencyStopRequest>,
) -> Result<Json<()>, ApiError> {
    identity.require_role(Role::Admin)?;
    state.set_mode(SystemMode::Maintenance(body.reason.clone()));
    publish_command(&state, "emergency_stop", &identity.username, Some(json!({"reason": body.reason})));
    Ok(Json(()))
}

pub async fn resume(State(state): State<AppState>, Extension(identity): Extension<OperatorIdentity>) -> Result<Json<()>, ApiError> {
    identity.require_role(Role::Operator)?;
    state.set_mode(SystemMode::Operational);
    publish_command(&state, "resume", &identity.username, None);
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct VetoAgentRequest {
    pub agent: AgentKind,
}

pub async fn veto_agent(
    State(state): State<AppState>,
    Extension(identity): Extension<OperatorIdentity>,
    Json(body): Json<VetoAgentRequest>,
) -> Result<Json<()>, ApiError> {
    identity.require_role(Role::Operator)?;
    state.agent_registry.veto(body.agent);
    publish_command(&state, "veto_agent", &identity.username, Some(json!({"agent": body.agent})));
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct ForceLevelRequest {
    pub level_id: LevelId,
    pub mrr: f64,
}

pub async fn force_level(
    State(state): State<AppState>,
    Extension(identity): Extension<OperatorIdentity>,
    Json(body): Json<ForceLevelRequest>,
) -> Result<Json<()>, ApiError> {
    identity.require_role(Role::Admin)?;
    state.provisioning.activate_level(body.level_id, body.mrr, false, Some(&identity.username))?;
    publish_command(&state, "force_level", &identity.username, Some(json!({"level_id": body.level_id, "mrr": body.mrr})));
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct TogglePromotionModeRequest {
    pub enabled: bool,
}

pub async fn toggle_promotion_mode(
    State(state): State<AppState>,
    Extension(identity): Extension<OperatorIdentity>,
    Json(body): Json<TogglePromotionModeRequest>,
) -> Result<Json<()>, ApiError> {
    identity.require_role(Role::Operator)?;
    state.persuasion.set_promotion_mode(body.enabled);
    publish_command(&state, "toggle_promotion_mode", &identity.username, Some(json!({"enabled": body.enabled})));
    Ok(Json(()))
}
