// [apps/orchestrator/src/kernel.rs]
/*!
 * OrchestratorKernel: raíz de composición (§10.1). `ignite` abre la
 * conexión a Turso y construye `AppState`; `launch_sovereign_operations`
 * arranca los agentes de fondo (failover, dispute) y el servidor HTTP.
 */

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use broker_domain_models::config::BrokerConfig;
use broker_domain_models::level::{EconomicLevel, LevelId};
use broker_infra_ai_clients::{LocalLlmClient, RemoteProsodyClient};
use broker_infra_db::TursoClient;
use broker_infra_ledger::LedgerClient;
use std::collections::BTreeSet;
use tracing::{error, info, instrument};

use crate::routes::build_router;
use crate::services::{spawn_dispute_agent, spawn_failover_agent, spawn_swarm_orchestrator};
use crate::state::AppState;

pub struct OrchestratorKernel {
    pub server_port: u16,
    pub state: AppState,
}

/// Tabla de niveles económicos L0-L4 (§4.7). Los umbrales de MRR y
/// quemado máximo son los de referencia del diseño; el debounce por
/// componente se resuelve en runtime contra `LevelConfig.debounce_months`.
fn economic_levels() -> Vec<EconomicLevel> {
    vec![
        EconomicLevel {
            level_id: LevelId::L0,
            mrr_threshold: 0.0,
            max_burn: 0.0,
            debounce_months: 0,
            active_components: BTreeSet::new(),
            disabled_components: BTreeSet::new(),
        },
        EconomicLevel {
            level_id: LevelId::L1,
            mrr_threshold: 5_000.0,
            max_burn: 500.0,
            debounce_months: 1,
            active_components: BTreeSet::from(["sentiment-cascade".to_string()]),
            disabled_components: BTreeSet::new(),
        },
        EconomicLevel {
            level_id: LevelId::L2,
            mrr_threshold: 20_000.0,
            max_burn: 2_500.0,
            debounce_months: 2,
            active_components: BTreeSet::from(["sentiment-cascade".to_string(), "failover-agent".to_string()]),
            disabled_components: BTreeSet::new(),
        },
        EconomicLevel {
            level_id: LevelId::L3,
            mrr_threshold: 75_000.0,
            max_burn: 9_000.0,
            debounce_months: 2,
            active_components: BTreeSet::from([
                "sentiment-cascade".to_string(),
                "failover-agent".to_string(),
                "dispute-agent".to_string(),
            ]),
            disabled_components: BTreeSet::new(),
        },
        EconomicLevel {
            level_id: LevelId::L4,
            mrr_threshold: 250_000.0,
            max_burn: 30_000.0,
            debounce_months: 3,
            active_components: BTreeSet::from([
                "sentiment-cascade".to_string(),
                "failover-agent".to_string(),
                "dispute-agent".to_string(),
                "command-center-hub".to_string(),
            ]),
            disabled_components: BTreeSet::new(),
        },
    ]
}

impl OrchestratorKernel {
    #[instrument(skip(database_token, config))]
    pub async fn ignite(database_url: &str, database_token: Option<String>, port: u16, config: BrokerConfig) -> Self {
        let db = TursoClient::connect(database_url, database_token).await.expect("database connection failed, aborting ignition");

        let ledger = Arc::new(LedgerClient::new(
            std::env::var("LEDGER_BASE_URL").unwrap_or_else(|_| "http://localhost:4000".to_string()),
            std::env::var("LEDGER_API_KEY").unwrap_or_default(),
        ));
        let prosody_client = Arc::new(RemoteProsodyClient::new(
            std::env::var("PROSODY_BASE_URL").unwrap_or_else(|_| "http://localhost:4100".to_string()),
            std::env::var("PROSODY_API_KEY").unwrap_or_default(),
        ));
        let llm_client = Arc::new(LocalLlmClient::new(std::env::var("LOCAL_LLM_BASE_URL").unwrap_or_else(|_| "http://localhost:4200".to_string())));

        let state = AppState::new(db, config, ledger, prosody_client, llm_client, economic_levels());

        Self { server_port: port, state }
    }

    pub async fn launch_sovereign_operations(self) {
        spawn_failover_agent(self.state.clone());
        spawn_dispute_agent(self.state.clone());
        spawn_swarm_orchestrator(self.state.clone());

        let router = build_router(self.state);
        let address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().unwrap(), self.server_port);

        info!(%address, "orchestrator listening");
        let listener = tokio::net::TcpListener::bind(address).await.expect("failed to bind listening port");

        if let Err(error) = axum::serve(listener, router).await {
            error!(%error, "server terminated unexpectedly");
            std::process::exit(1);
        }
    }
}
