// [apps/orchestrator/src/state/mod.rs]
/*!
 * AppState: raíz de composición del orquestador. Une los cinco motores
 * de `broker-core-*` (C1-C8), los repositorios de `broker-infra-db`, el
 * cliente de `broker-infra-ledger`, el bus de eventos, el registro de
 * agentes, el limitador de tasa y el log de auditoría en un único
 * contenedor clonable por handler (§10.1).
 */

use std::sync::{Arc, RwLock};

use broker_core_persuasion::{PersuasionEngine, ProfileStore};
use broker_core_resilience::{BreakerConfig, BreakerRegistry, QuotaLedger};
use broker_core_revenue::{ProvisioningOrchestrator, RevenueMonitor};
use broker_core_sentiment::SentimentCascade;
use broker_domain_models::config::BrokerConfig;
use broker_domain_models::level::EconomicLevel;
use broker_infra_ai_clients::{LocalLlmClient, RemoteProsodyClient};
use broker_infra_db::repositories::{
    AuditLogRepository, CarrierChangeRepository, CarrierRepository, DbSagaJournal, DisputeRepository, EscrowRepository,
    InteractionRepository, LeadRepository, LevelStateRepository, PersuasionStrategyRepository, ProfileRepository,
    SentimentRepository, ShipmentRepository,
};
use broker_infra_db::TursoClient;
use broker_infra_ledger::LedgerClient;
use tracing::{info, instrument, warn};

use crate::services::{AgentRegistry, AuditLogService, EventBus, RateLimitConfig, RateLimiter, SessionStore};

/// Modos de salud para la interceptación de middleware perimetral (§5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemMode {
    Operational,
    Maintenance(String),
}

#[derive(Clone)]
pub struct AppState {
    pub config: BrokerConfig,
    pub db: TursoClient,
    pub ledger: Arc<LedgerClient>,
    pub event_bus: Arc<EventBus>,
    pub breakers: Arc<BreakerRegistry>,
    pub quota: Arc<QuotaLedger>,
    pub sentiment: Arc<SentimentCascade>,
    pub profiles: Arc<ProfileStore>,
    pub persuasion: Arc<PersuasionEngine>,
    pub revenue: Arc<RevenueMonitor>,
    pub provisioning: Arc<ProvisioningOrchestrator>,
    pub saga_journal: Arc<DbSagaJournal>,
    pub agent_registry: Arc<AgentRegistry>,
    pub rate_limiter: Arc<RateLimiter>,
    pub audit_log: Arc<AuditLogService>,
    pub sessions: Arc<SessionStore>,

    pub leads: Arc<LeadRepository>,
    pub sentiment_records: Arc<SentimentRepository>,
    pub carriers: Arc<CarrierRepository>,
    pub shipments: Arc<ShipmentRepository>,
    pub escrow: Arc<EscrowRepository>,
    pub carrier_changes: Arc<CarrierChangeRepository>,
    pub disputes: Arc<DisputeRepository>,
    pub level_state: Arc<LevelStateRepository>,
    pub interactions: Arc<InteractionRepository>,

    pub current_system_mode: Arc<RwLock<SystemMode>>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: TursoClient,
        config: BrokerConfig,
        ledger: Arc<LedgerClient>,
        prosody_client: Arc<RemoteProsodyClient>,
        llm_client: Arc<LocalLlmClient>,
        levels: Vec<EconomicLevel>,
    ) -> Self {
        let breakers = Arc::new(BreakerRegistry::new(BreakerConfig::default()));
        for (dependency, entry) in &config.breaker {
            breakers.register_with_config(
                dependency,
                BreakerConfig {
                    failure_threshold: entry.failure_threshold,
                    recovery_timeout: std::time::Duration::from_secs(entry.recovery_timeout_s),
                    ..BreakerConfig::default()
                },
            );
        }

        let quota = Arc::new(QuotaLedger::new());
        let sentiment = Arc::new(SentimentCascade::new(breakers.clone(), quota.clone(), prosody_client, llm_client));

        Self {
            leads: Arc::new(LeadRepository::new(db.clone())),
            sentiment_records: Arc::new(SentimentRepository::new(db.clone())),
            carriers: Arc::new(CarrierRepository::new(db.clone())),
            shipments: Arc::new(ShipmentRepository::new(db.clone())),
            escrow: Arc::new(EscrowRepository::new(db.clone())),
            carrier_changes: Arc::new(CarrierChangeRepository::new(db.clone())),
            disputes: Arc::new(DisputeRepository::new(db.clone())),
            level_state: Arc::new(LevelStateRepository::new(db.clone())),
            interactions: Arc::new(InteractionRepository::new(db.clone())),
            audit_log: Arc::new(AuditLogService::new(AuditLogRepository::new(db.clone()))),
            saga_journal: Arc::new(DbSagaJournal::new(db.clone())),
            profiles: Arc::new(ProfileStore::new(ProfileRepository::new(db.clone()))),
            persuasion: Arc::new(PersuasionEngine::new(PersuasionStrategyRepository::new(db.clone()))),

            db,
            config,
            ledger,
            event_bus: Arc::new(EventBus::new()),
            breakers,
            quota,
            sentiment,
            revenue: Arc::new(RevenueMonitor::new(levels.clone())),
            provisioning: Arc::new(ProvisioningOrchestrator::new(levels)),
            agent_registry: Arc::new(AgentRegistry::new()),
            rate_limiter: Arc::new(RateLimiter::new(RateLimitConfig::default())),
            sessions: Arc::new(SessionStore::new()),
            current_system_mode: Arc::new(RwLock::new(SystemMode::Operational)),
        }
    }

    #[instrument(skip(self, target))]
    pub fn set_mode(&self, target: SystemMode) {
        match self.current_system_mode.write() {
            Ok(mut guard) => {
                info!(?target, "system mode transition");
                *guard = target;
            }
            Err(poisoned) => warn!("system mode lock poisoned: {poisoned}"),
        }
    }

    pub fn is_operational(&self) -> Result<(), String> {
        let guard = self.current_system_mode.read().map_err(|e| format!("lock poisoned: {e}"))?;
        match &*guard {
            SystemMode::Operational => Ok(()),
            SystemMode::Maintenance(reason) => Err(reason.clone()),
        }
    }
}
