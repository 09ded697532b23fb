// [apps/orchestrator/src/routes.rs]
/*!
 * Ensamblaje del router soberano (§4.14): rutas de leads, sentimiento,
 * perfiles de persuasión, envíos, disputas y el estado agregado de
 * agentes/niveles, más el socket del CommandCenterHub, identidad y
 * comandos de centro de mando. CORS abierto para el dashboard;
 * `health_guard` y `auth_guard` protegen `/api/v1`. `/auth` y
 * `/command` viven fuera de `health_guard`: un operador debe poder
 * iniciar sesión y emitir `resume` incluso con el sistema en
 * mantenimiento (§5).
 */

use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::{get, patch, post};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{api, command, identity, stream};
use crate::middleware::{auth_guard, health_guard, rate_limit_guard};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let leads = Router::new()
        .route("/", post(api::create_lead))
        .route("/:lead_id", get(api::get_lead).delete(api::erase_lead))
        .route("/:lead_id/status", patch(api::transition_lead))
        .route("/:lead_id/profile", post(api::assign_profile).get(api::get_profile));

    let sentiment = Router::new().route("/analyze", post(api::analyze_sentiment));

    let persuasion = Router::new().route("/script/:stage/:profile_type", get(api::select_script));

    let shipments = Router::new()
        .route("/", post(api::create_shipment))
        .route("/:shipment_id", get(api::get_shipment))
        .route("/:shipment_id/status", patch(api::update_shipment_status))
        .route("/:shipment_id/dispute", post(api::open_dispute));

    let command_center = Router::new().route("/agents", get(api::agent_registry_snapshot)).route(
        "/levels/:component",
        get(api::component_state),
    );

    let api_v1 = Router::new()
        .nest("/leads", leads)
        .nest("/sentiment", sentiment)
        .nest("/persuasion", persuasion)
        .nest("/shipments", shipments)
        .nest("/command-center", command_center)
        .route("/levels", get(api::level_state))
        .route("/stream", get(stream::open_command_center_socket))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_guard))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
        .layer(middleware::from_fn_with_state(state.clone(), health_guard));

    let auth_protected = Router::new()
        .route("/refresh", post(identity::refresh))
        .route("/me", get(identity::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let auth = Router::new()
        .route("/login", post(identity::login))
        .merge(auth_protected)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_guard));

    let command_center_commands = Router::new()
        .route("/change_carrier", post(command::change_carrier))
        .route("/emergency_stop", post(command::emergency_stop))
        .route("/resume", post(command::resume))
        .route("/veto_agent", post(command::veto_agent))
        .route("/force_level", post(command::force_level))
        .route("/toggle_promotion_mode", post(command::toggle_promotion_mode))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_guard))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api/v1", api_v1)
        .nest("/auth", auth)
        .nest("/command", command_center_commands)
        .layer(cors)
        .with_state(state)
}
