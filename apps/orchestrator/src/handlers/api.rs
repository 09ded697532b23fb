// [apps/orchestrator/src/handlers/api.rs]
/*!
 * Facade HTTP público (C15, §4.14): rutas REST para leads, sentimiento,
 * envíos, disputas, perfiles de persuasión y el estado agregado de
 * agentes/niveles económicos. Cada handler traduce su `BrokerError` a
 * `ApiError` mediante `?`.
 */

use axum::extract::{Path, State};
use axum::{Extension, Json};
use broker_core_persuasion::TriggerSignals;
use broker_core_sentiment::AnalyzeInput;
use broker_domain_models::agent::AgentStatus;
use broker_domain_models::audit::DecisionKind;
use broker_domain_models::errors::BrokerError;
use broker_domain_models::events::BrokerEvent;
use broker_domain_models::identity::Role;
use broker_domain_models::interaction::Interaction;
use broker_domain_models::lead::{Lead, LeadStatus};
use broker_domain_models::level::{LevelId, LevelState};
use broker_domain_models::profile::{ProfileType, PsychProfile};
use broker_domain_models::sentiment::SentimentRecord;
use broker_domain_models::shipment::{EscrowRecord, EscrowStatus, Shipment, ShipmentStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::middleware::OperatorIdentity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub contact_name: String,
}

pub async fn create_lead(State(state): State<AppState>, Json(body): Json<CreateLeadRequest>) -> Result<Json<Lead>, ApiError> {
    let lead = Lead::new(body.contact_name);
    state.leads.create(&lead).await.map_err(|e| BrokerError::TransientDependency(e.to_string()))?;
    Ok(Json(lead))
}

pub async fn get_lead(State(state): State<AppState>, Path(lead_id): Path<Uuid>) -> Result<Json<Lead>, ApiError> {
    let lead = state.leads.get(lead_id).await.map_err(|_| BrokerError::NotFound(lead_id.to_string()))?;
    Ok(Json(lead))
}

#[derive(Debug, Deserialize)]
pub struct TransitionLeadRequest {
    pub target_status: LeadStatus,
}

pub async fn transition_lead(
    State(state): State<AppState>,
    Path(lead_id): Path<Uuid>,
    Json(body): Json<TransitionLeadRequest>,
) -> Result<Json<Lead>, ApiError> {
    let lead = state.leads.get(lead_id).await.map_err(|_| BrokerError::NotFound(lead_id.to_string()))?;
    if !lead.status.can_transition_to(body.target_status) {
        return Err(BrokerError::InvariantViolation(format!("{:?} cannot move to {:?}", lead.status, body.target_status)).into());
    }
    state
        .leads
        .update_status(lead_id, body.target_status)
        .await
        .map_err(|e| BrokerError::TransientDependency(e.to_string()))?;
    Ok(Json(Lead { status: body.target_status, ..lead }))
}

/// Erradicación explícita de un Lead (§3): cascadea a Sentiment, Profile
/// e Interaction antes de destruir el Lead mismo. Restringido a Admin
/// por ser irreversible.
pub async fn erase_lead(
    State(state): State<AppState>,
    Extension(identity): Extension<OperatorIdentity>,
    Path(lead_id): Path<Uuid>,
) -> Result<Json<()>, ApiError> {
    identity.require_role(Role::Admin)?;

    state.leads.get(lead_id).await.map_err(|_| BrokerError::NotFound(lead_id.to_string()))?;

    state
        .sentiment_records
        .delete_by_lead(lead_id)
        .await
        .map_err(|e| BrokerError::TransientDependency(e.to_string()))?;
    state.profiles.erase(lead_id).await?;
    state
        .interactions
        .delete_by_lead(lead_id)
        .await
        .map_err(|e| BrokerError::TransientDependency(e.to_string()))?;
    state.leads.delete(lead_id).await.map_err(|e| BrokerError::TransientDependency(e.to_string()))?;

    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeSentimentRequest {
    pub lead_id: Uuid,
    pub call_id: String,
    pub audio_reference: Option<String>,
    pub transcript: Option<String>,
}

pub async fn analyze_sentiment(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeSentimentRequest>,
) -> Result<Json<SentimentRecord>, ApiError> {
    let record = state
        .sentiment
        .analyze(AnalyzeInput {
            lead_id: body.lead_id,
            call_id: body.call_id,
            audio_reference: body.audio_reference.as_deref(),
            transcript: body.transcript.as_deref(),
        })
        .await;

    state
        .sentiment_records
        .insert(&record)
        .await
        .map_err(|e| BrokerError::TransientDependency(e.to_string()))?;

    let interaction = Interaction {
        id: Uuid::new_v4(),
        lead_id: record.lead_id,
        agent: "sentiment_cascade".to_string(),
        sentiment_id: Some(record.id),
        channel: if body.audio_reference.is_some() { "voice".to_string() } else { "text".to_string() },
        summary: format!("call {} classified as {}", record.call_id, record.dominant_emotion),
        occurred_at: record.analyzed_at,
    };
    state
        .interactions
        .insert(&interaction)
        .await
        .map_err(|e| BrokerError::TransientDependency(e.to_string()))?;

    state
        .audit_log
        .record(
            DecisionKind::SentimentClassification,
            &format!("lead:{}:call:{}", record.lead_id, record.call_id),
            &format!("score:{}:dominant:{}", record.score, record.dominant_emotion),
            format!("method:{:?}:confidence:{}", record.method, record.confidence),
            "tiered sentiment cascade classification",
            false,
        )
        .await?;

    if record.requires_escalation {
        state.event_bus.publish(
            BrokerEvent::SentimentEscalation {
                sentiment_id: record.id,
                lead_id: record.lead_id,
                reason: "score or anger threshold crossed".to_string(),
            },
            "api-facade",
        );
    }
    state.event_bus.publish(BrokerEvent::SentimentAnalyzed(record.clone()), "api-facade");

    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct AssignProfileRequest {
    #[serde(flatten)]
    pub signals: TriggerSignalsPayload,
}

#[derive(Debug, Deserialize)]
pub struct TriggerSignalsPayload {
    pub velocity: u32,
    pub analyst: u32,
    pub social: u32,
    pub security: u32,
    pub decision_speed: u8,
    pub risk_tolerance: u8,
    pub price_sensitivity: u8,
    pub communication_pref: String,
}

pub async fn assign_profile(
    State(state): State<AppState>,
    Path(lead_id): Path<Uuid>,
    Json(body): Json<AssignProfileRequest>,
) -> Result<Json<PsychProfile>, ApiError> {
    let signals = TriggerSignals {
        velocity: body.signals.velocity,
        analyst: body.signals.analyst,
        social: body.signals.social,
        security: body.signals.security,
        decision_speed: body.signals.decision_speed,
        risk_tolerance: body.signals.risk_tolerance,
        price_sensitivity: body.signals.price_sensitivity,
        communication_pref: body.signals.communication_pref,
        similarity_vector: None,
    };
    Ok(Json(state.profiles.assign(lead_id, signals).await?))
}

pub async fn get_profile(State(state): State<AppState>, Path(lead_id): Path<Uuid>) -> Result<Json<PsychProfile>, ApiError> {
    Ok(Json(state.profiles.get(lead_id).await?))
}

#[derive(Debug, Serialize)]
pub struct ScriptSelectionResponse {
    pub template: String,
    pub pattern_tags: Vec<String>,
    pub is_default_fallback: bool,
}

pub async fn select_script(
    State(state): State<AppState>,
    Path((stage, profile_type)): Path<(String, ProfileType)>,
) -> Result<Json<ScriptSelectionResponse>, ApiError> {
    let selection = state.persuasion.select(&stage, profile_type, None).await?;
    Ok(Json(ScriptSelectionResponse {
        template: selection.template,
        pattern_tags: selection.pattern_tags,
        is_default_fallback: selection.is_default_fallback,
    }))
}

pub async fn create_shipment(State(state): State<AppState>, Json(shipment): Json<Shipment>) -> Result<Json<Shipment>, ApiError> {
    shipment.check_margin_invariant().map_err(|e| BrokerError::InvariantViolation(e.to_string()))?;
    state.shipments.create(&shipment).await.map_err(|e| BrokerError::TransientDependency(e.to_string()))?;

    state
        .audit_log
        .record(
            DecisionKind::PricingCalculation,
            &format!("cost:{}:declared_value:{}", shipment.cost, shipment.declared_value),
            &format!("sale_price:{}:margin:{}", shipment.sale_price, shipment.margin()),
            "cost vs sale_price margin check",
            "margin invariant satisfied at shipment creation",
            false,
        )
        .await?;

    state
        .ledger
        .lock_funds(shipment.id, shipment.carrier_id, shipment.declared_value)
        .await
        .map_err(|e| BrokerError::TransientDependency(e.to_string()))?;

    let escrow = EscrowRecord {
        id: Uuid::new_v4(),
        shipment_id: shipment.id,
        status: EscrowStatus::Locked,
        amount: shipment.declared_value,
        deadline: shipment.planned_delivery_at,
        failover_count: 0,
        original_carrier: shipment.carrier_id,
        current_carrier: shipment.carrier_id,
    };
    state.escrow.create(&escrow).await.map_err(|e| BrokerError::TransientDependency(e.to_string()))?;

    Ok(Json(shipment))
}

pub async fn get_shipment(State(state): State<AppState>, Path(shipment_id): Path<Uuid>) -> Result<Json<Shipment>, ApiError> {
    let shipment = state.shipments.get(shipment_id).await.map_err(|_| BrokerError::NotFound(shipment_id.to_string()))?;
    Ok(Json(shipment))
}

#[derive(Debug, Deserialize)]
pub struct UpdateShipmentStatusRequest {
    pub target_status: ShipmentStatus,
}

pub async fn update_shipment_status(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
    Json(body): Json<UpdateShipmentStatusRequest>,
) -> Result<Json<Shipment>, ApiError> {
    let shipment = state.shipments.get(shipment_id).await.map_err(|_| BrokerError::NotFound(shipment_id.to_string()))?;
    if !shipment.status.can_transition_to(body.target_status) {
        return Err(BrokerError::InvariantViolation(format!("{:?} cannot move to {:?}", shipment.status, body.target_status)).into());
    }
    state
        .shipments
        .update_status(shipment_id, body.target_status)
        .await
        .map_err(|e| BrokerError::TransientDependency(e.to_string()))?;

    if body.target_status == ShipmentStatus::Disputed {
        state.event_bus.publish(BrokerEvent::DisputeOpened { shipment_id }, "api-facade");
    }

    Ok(Json(Shipment { status: body.target_status, ..shipment }))
}

pub async fn open_dispute(State(state): State<AppState>, Path(shipment_id): Path<Uuid>) -> Result<Json<()>, ApiError> {
    let shipment = state.shipments.get(shipment_id).await.map_err(|_| BrokerError::NotFound(shipment_id.to_string()))?;
    if !shipment.status.can_transition_to(ShipmentStatus::Disputed) {
        return Err(BrokerError::InvariantViolation("shipment is not eligible for dispute".into()).into());
    }
    state
        .shipments
        .update_status(shipment_id, ShipmentStatus::Disputed)
        .await
        .map_err(|e| BrokerError::TransientDependency(e.to_string()))?;
    state.event_bus.publish(BrokerEvent::DisputeOpened { shipment_id }, "api-facade");
    Ok(Json(()))
}

pub async fn agent_registry_snapshot(State(state): State<AppState>) -> Json<Vec<AgentStatus>> {
    Json(state.agent_registry.snapshot())
}

pub async fn level_state(State(state): State<AppState>) -> Result<Json<LevelState>, ApiError> {
    let current = state.level_state.get().await.map_err(|e| BrokerError::TransientDependency(e.to_string()))?;
    Ok(Json(current))
}

#[derive(Debug, Serialize)]
pub struct ComponentStateResponse {
    pub component: String,
    pub level: LevelId,
    pub lifecycle_state: String,
}

pub async fn component_state(State(state): State<AppState>, Path(component): Path<String>) -> Json<ComponentStateResponse> {
    let lifecycle_state = format!("{:?}", state.provisioning.component_state(&component));
    let level = state.provisioning.current_level();
    Json(ComponentStateResponse { component, level, lifecycle_state })
}
