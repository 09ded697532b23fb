// [libs/core/revenue/src/component.rs]
/*!
 * Ciclo de vida de un componente provisionado (§4.7):
 * cold → warming → warm → activating → hot → deactivating → warm → cold.
 * Cada transición es idempotente y resumible.
 */

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentState {
    Cold,
    Warming,
    Warm,
    Activating,
    Hot,
    Deactivating,
}

#[derive(Debug, thiserror::Error)]
#[error("illegal component transition: {component} from {from:?} to {to:?}")]
pub struct IllegalTransition {
    pub component: String,
    pub from: ComponentState,
    pub to: ComponentState,
}

fn is_legal(from: ComponentState, to: ComponentState) -> bool {
    use ComponentState::*;
    matches!(
        (from, to),
        (Cold, Warming)
            | (Warming, Warm)
            | (Warm, Activating)
            | (Activating, Hot)
            | (Hot, Deactivating)
            | (Deactivating, Warm)
            | (Warm, Cold)
    )
}

pub struct ComponentLifecycle {
    states: HashMap<String, ComponentState>,
}

impl ComponentLifecycle {
    pub fn new() -> Self {
        Self { states: HashMap::new() }
    }

    pub fn state_of(&self, component: &str) -> ComponentState {
        self.states.get(component).copied().unwrap_or(ComponentState::Cold)
    }

    /// Transiciona `component` a `to`. Idempotente: transicionar a un
    /// estado ya alcanzado es un no-op exitoso.
    pub fn transition(&mut self, component: &str, to: ComponentState) -> Result<(), IllegalTransition> {
        let from = self.state_of(component);
        if from == to {
            return Ok(());
        }
        if !is_legal(from, to) {
            return Err(IllegalTransition { component: component.to_string(), from, to });
        }
        self.states.insert(component.to_string(), to);
        Ok(())
    }

    /// Avanza un componente en frío directamente a `hot`, paso a paso,
    /// saltándose estados ya alcanzados (idempotente y resumible).
    pub fn activate(&mut self, component: &str) -> Result<(), IllegalTransition> {
        for target in [
            ComponentState::Warming,
            ComponentState::Warm,
            ComponentState::Activating,
            ComponentState::Hot,
        ] {
            self.transition(component, target)?;
        }
        Ok(())
    }

    /// Revierte un componente caliente de vuelta a `warm` (no a `cold`:
    /// deactivate deja el componente pre-calentado, §4.7).
    pub fn deactivate(&mut self, component: &str) -> Result<(), IllegalTransition> {
        if self.state_of(component) != ComponentState::Hot {
            return Ok(());
        }
        self.transition(component, ComponentState::Deactivating)?;
        self.transition(component, ComponentState::Warm)
    }

    /// Pre-calienta un componente en frío a `warm` sin activarlo del
    /// todo, para reducir la latencia de activación del próximo nivel.
    pub fn pre_warm(&mut self, component: &str) -> Result<(), IllegalTransition> {
        if self.state_of(component) != ComponentState::Cold {
            return Ok(());
        }
        self.transition(component, ComponentState::Warming)?;
        self.transition(component, ComponentState::Warm)
    }
}

impl Default for ComponentLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_walks_full_lifecycle() {
        let mut lifecycle = ComponentLifecycle::new();
        lifecycle.activate("sentiment-cascade").unwrap();
        assert_eq!(lifecycle.state_of("sentiment-cascade"), ComponentState::Hot);
    }

    #[test]
    fn activate_is_resumable_from_warm() {
        let mut lifecycle = ComponentLifecycle::new();
        lifecycle.transition("x", ComponentState::Warming).unwrap();
        lifecycle.transition("x", ComponentState::Warm).unwrap();
        lifecycle.activate("x").unwrap();
        assert_eq!(lifecycle.state_of("x"), ComponentState::Hot);
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let mut lifecycle = ComponentLifecycle::new();
        assert!(lifecycle.transition("x", ComponentState::Hot).is_err());
    }

    #[test]
    fn deactivate_leaves_component_warm_not_cold() {
        let mut lifecycle = ComponentLifecycle::new();
        lifecycle.activate("x").unwrap();
        lifecycle.deactivate("x").unwrap();
        assert_eq!(lifecycle.state_of("x"), ComponentState::Warm);
    }
}
