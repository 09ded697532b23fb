// [libs/core/revenue/src/provisioning.rs]
/*!
 * ProvisioningOrchestrator (C8): aplica transiciones de nivel,
 * pre-calienta el siguiente nivel, y hace cumplir la razón de
 * seguridad (§4.7).
 */

use std::sync::RwLock;

use broker_domain_models::errors::BrokerError;
use broker_domain_models::level::{EconomicLevel, LevelId, LevelState};
use tracing::{info, warn};

use crate::component::{ComponentLifecycle, ComponentState};

pub struct ProvisioningOrchestrator {
    levels: Vec<EconomicLevel>,
    lifecycle: RwLock<ComponentLifecycle>,
    state: RwLock<LevelState>,
}

impl ProvisioningOrchestrator {
    pub fn new(levels: Vec<EconomicLevel>) -> Self {
        Self {
            levels,
            lifecycle: RwLock::new(ComponentLifecycle::new()),
            state: RwLock::new(LevelState::default()),
        }
    }

    pub fn current_level(&self) -> LevelId {
        self.state.read().expect("level state lock poisoned").current_level
    }

    pub fn component_state(&self, component: &str) -> ComponentState {
        self.lifecycle.read().expect("lifecycle lock poisoned").state_of(component)
    }

    fn level_by_id(&self, level_id: LevelId) -> Option<&EconomicLevel> {
        self.levels.iter().find(|level| level.level_id == level_id)
    }

    /// Activa `level_id`. `override_token` satisface la verificación de
    /// seguridad cuando está presente; `dry_run` evalúa las
    /// precondiciones sin mutar estado (§4.7).
    pub fn activate_level(
        &self,
        level_id: LevelId,
        mrr: f64,
        dry_run: bool,
        override_token: Option<&str>,
    ) -> Result<(), BrokerError> {
        let target = self
            .level_by_id(level_id)
            .ok_or_else(|| BrokerError::NotFound(format!("level {:?}", level_id)))?
            .clone();

        if target.max_burn > 0.90 * mrr && override_token.is_none() {
            return Err(BrokerError::SafetyViolation(format!(
                "max_burn {:.2} exceeds 90% of mrr {:.2} for level {:?}",
                target.max_burn, mrr, level_id
            )));
        }

        {
            let current_state = self.state.read().expect("level state lock poisoned");
            if current_state.consecutive_months_over_next_threshold < target.debounce_months
                && override_token.is_none()
            {
                return Err(BrokerError::SafetyViolation(format!(
                    "debounce not satisfied for level {:?}: {} < {}",
                    level_id, current_state.consecutive_months_over_next_threshold, target.debounce_months
                )));
            }
        }

        if dry_run {
            info!(?level_id, "dry run: preconditions satisfied, no state mutated");
            return Ok(());
        }

        let mut lifecycle = self.lifecycle.write().expect("lifecycle lock poisoned");
        for component in &target.active_components {
            lifecycle
                .activate(component)
                .map_err(|error| BrokerError::InvariantViolation(error.to_string()))?;
        }
        for component in &target.disabled_components {
            lifecycle
                .deactivate(component)
                .map_err(|error| BrokerError::InvariantViolation(error.to_string()))?;
        }
        drop(lifecycle);

        if let Some(next_level) = self.level_by_id(level_id).and_then(|l| self.level_by_id(l.level_id.next()?)) {
            self.pre_warm_level(next_level);
        }

        let mut state = self.state.write().expect("level state lock poisoned");
        state.current_level = level_id;
        state.consecutive_months_over_next_threshold = 0;
        state.last_transition_at = Some(chrono::Utc::now());

        Ok(())
    }

    /// Mueve los componentes del siguiente nivel de cold a warm,
    /// reduciendo la latencia de activación (§4.7).
    fn pre_warm_level(&self, next_level: &EconomicLevel) {
        let mut lifecycle = self.lifecycle.write().expect("lifecycle lock poisoned");
        for component in &next_level.active_components {
            if let Err(error) = lifecycle.pre_warm(component) {
                warn!(component, %error, "pre-warm failed");
            }
        }
    }

    /// Revierte el nivel ante caída de ingreso (§4.7): recorre los
    /// componentes en orden inverso.
    pub fn deactivate_level(&self, level_id: LevelId) -> Result<(), BrokerError> {
        let target = self
            .level_by_id(level_id)
            .ok_or_else(|| BrokerError::NotFound(format!("level {:?}", level_id)))?
            .clone();

        let mut lifecycle = self.lifecycle.write().expect("lifecycle lock poisoned");
        for component in target.active_components.iter().rev() {
            lifecycle
                .deactivate(component)
                .map_err(|error| BrokerError::InvariantViolation(error.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn level(id: LevelId, max_burn: f64, debounce_months: u32, components: &[&str]) -> EconomicLevel {
        EconomicLevel {
            level_id: id,
            mrr_threshold: max_burn * 2.0,
            max_burn,
            debounce_months,
            active_components: components.iter().map(|c| c.to_string()).collect::<BTreeSet<_>>(),
            disabled_components: BTreeSet::new(),
        }
    }

    #[test]
    fn rejects_activation_exceeding_safety_ratio_without_override() {
        let orchestrator = ProvisioningOrchestrator::new(vec![level(LevelId::L1, 900.0, 0, &["sentiment-cascade"])]);
        let result = orchestrator.activate_level(LevelId::L1, 1000.0, false, None);
        assert!(matches!(result, Err(BrokerError::SafetyViolation(_))));
    }

    #[test]
    fn override_token_bypasses_safety_violation() {
        let orchestrator = ProvisioningOrchestrator::new(vec![level(LevelId::L1, 900.0, 0, &["sentiment-cascade"])]);
        let result = orchestrator.activate_level(LevelId::L1, 1000.0, false, Some("admin-override"));
        assert!(result.is_ok());
        assert_eq!(orchestrator.component_state("sentiment-cascade"), ComponentState::Hot);
    }

    #[test]
    fn safety_ratio_rejects_at_low_mrr_and_accepts_once_mrr_catches_up() {
        let orchestrator = ProvisioningOrchestrator::new(vec![level(LevelId::L2, 1_179.0, 0, &["failover-agent"])]);

        let rejected = orchestrator.activate_level(LevelId::L2, 900.0, false, None);
        assert!(matches!(rejected, Err(BrokerError::SafetyViolation(_))));
        assert_eq!(orchestrator.current_level(), LevelId::L0);

        orchestrator.activate_level(LevelId::L2, 1_500.0, false, None).unwrap();
        assert_eq!(orchestrator.current_level(), LevelId::L2);
        assert_eq!(orchestrator.component_state("failover-agent"), ComponentState::Hot);
    }

    #[test]
    fn dry_run_does_not_mutate_state() {
        let orchestrator = ProvisioningOrchestrator::new(vec![level(LevelId::L1, 100.0, 0, &["sentiment-cascade"])]);
        orchestrator.activate_level(LevelId::L1, 1000.0, true, None).unwrap();
        assert_eq!(orchestrator.current_level(), LevelId::L0);
        assert_eq!(orchestrator.component_state("sentiment-cascade"), ComponentState::Cold);
    }
}
