// [libs/core/persuasion/src/engine.rs]
/*!
 * PersuasionEngine (C5): selecciona el guion de mayor tasa de éxito
 * histórico para `(profile_type, stage)`, con un guion por defecto
 * incorporado cuando ninguna estrategia está activa (§4.4). Las
 * estrategias registradas se persisten en `persuasion_strategies` vía
 * `PersuasionStrategyRepository` (§3).
 */

use std::sync::RwLock;

use broker_domain_models::errors::BrokerError;
use broker_domain_models::persuasion_strategy::{ObjectionHandler, PersuasionStrategy};
use broker_domain_models::profile::{ObjectionClass, ProfileType};
use broker_infra_db::repositories::PersuasionStrategyRepository;

#[derive(Debug, Clone)]
pub struct ScriptSelection {
    pub template: String,
    pub pattern_tags: Vec<String>,
    pub objection_handlers: ObjectionHandler,
    pub is_default_fallback: bool,
}

pub struct PersuasionEngine {
    repository: PersuasionStrategyRepository,
    promotion_mode: RwLock<bool>,
}

impl PersuasionEngine {
    pub fn new(repository: PersuasionStrategyRepository) -> Self {
        Self { repository, promotion_mode: RwLock::new(false) }
    }

    /// Activa/desactiva el modo promocional (§4.14, comando
    /// `toggle_promotion_mode`): mientras esté activo, las selecciones
    /// de guion llevan una etiqueta `promotion` adicional que las capas
    /// de renderizado usan para mostrar descuentos agresivos.
    pub fn set_promotion_mode(&self, enabled: bool) {
        *self.promotion_mode.write().expect("promotion mode lock poisoned") = enabled;
    }

    pub fn is_promotion_mode(&self) -> bool {
        *self.promotion_mode.read().expect("promotion mode lock poisoned")
    }

    pub async fn register_strategy(&self, strategy: PersuasionStrategy) -> Result<(), BrokerError> {
        self.repository.insert(&strategy).await.map_err(|e| BrokerError::TransientDependency(e.to_string()))
    }

    /// Selecciona la estrategia activa de mayor tasa de éxito para
    /// `(profile_type, stage)`; si ninguna está activa, cae al guion
    /// incorporado por defecto. `objection` no filtra la selección de
    /// guion, sólo documenta qué manejador se espera usar después.
    pub async fn select(
        &self,
        stage: &str,
        profile_type: ProfileType,
        objection: Option<ObjectionClass>,
    ) -> Result<ScriptSelection, BrokerError> {
        let _ = objection;
        let candidates = self
            .repository
            .list_active_for(profile_type, stage)
            .await
            .map_err(|e| BrokerError::TransientDependency(e.to_string()))?;

        let best = candidates.into_iter().max_by(|a, b| a.success_rate.partial_cmp(&b.success_rate).unwrap_or(std::cmp::Ordering::Equal));

        let mut selection = match best {
            Some(strategy) => ScriptSelection {
                template: strategy.template,
                pattern_tags: strategy.pattern_tags,
                objection_handlers: strategy.objection_handlers,
                is_default_fallback: false,
            },
            None => default_script(profile_type, stage),
        };

        if self.is_promotion_mode() {
            selection.pattern_tags.push("promotion".to_string());
        }

        Ok(selection)
    }
}

fn default_script(profile_type: ProfileType, stage: &str) -> ScriptSelection {
    let mut objection_handlers = ObjectionHandler::new();
    objection_handlers.insert(ObjectionClass::Price, "Let's review the value delivered relative to cost.".to_string());
    objection_handlers.insert(ObjectionClass::Time, "We can move at whatever pace works for you.".to_string());
    objection_handlers.insert(ObjectionClass::Trust, "Here are references from similar clients.".to_string());
    objection_handlers.insert(ObjectionClass::Need, "Let's revisit what triggered this conversation.".to_string());
    objection_handlers.insert(ObjectionClass::Competition, "Here is what differentiates our offering.".to_string());

    ScriptSelection {
        template: format!("Default {:?} script for stage '{}'.", profile_type, stage),
        pattern_tags: vec!["default".to_string()],
        objection_handlers,
        is_default_fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn engine() -> PersuasionEngine {
        let db = broker_infra_db::TursoClient::connect(":memory:", None).await.unwrap();
        PersuasionEngine::new(PersuasionStrategyRepository::new(db))
    }

    #[tokio::test]
    async fn falls_back_to_default_when_no_active_strategy() {
        let engine = engine().await;
        let selection = engine.select("opening", ProfileType::Analyst, None).await.unwrap();
        assert!(selection.is_default_fallback);
    }

    #[tokio::test]
    async fn selects_highest_success_rate_active_strategy() {
        let engine = engine().await;
        engine
            .register_strategy(PersuasionStrategy {
                id: Uuid::new_v4(),
                profile_type: ProfileType::Analyst,
                stage: "opening".to_string(),
                template: "low performer".to_string(),
                pattern_tags: vec![],
                objection_handlers: ObjectionHandler::new(),
                success_rate: 0.3,
                active: true,
            })
            .await
            .unwrap();
        engine
            .register_strategy(PersuasionStrategy {
                id: Uuid::new_v4(),
                profile_type: ProfileType::Analyst,
                stage: "opening".to_string(),
                template: "top performer".to_string(),
                pattern_tags: vec![],
                objection_handlers: ObjectionHandler::new(),
                success_rate: 0.8,
                active: true,
            })
            .await
            .unwrap();
        engine
            .register_strategy(PersuasionStrategy {
                id: Uuid::new_v4(),
                profile_type: ProfileType::Analyst,
                stage: "opening".to_string(),
                template: "inactive but higher".to_string(),
                pattern_tags: vec![],
                objection_handlers: ObjectionHandler::new(),
                success_rate: 0.99,
                active: false,
            })
            .await
            .unwrap();

        let selection = engine.select("opening", ProfileType::Analyst, None).await.unwrap();
        assert_eq!(selection.template, "top performer");
        assert!(!selection.is_default_fallback);
    }

    #[tokio::test]
    async fn promotion_mode_tags_subsequent_selections() {
        let engine = engine().await;
        assert!(!engine.is_promotion_mode());

        engine.set_promotion_mode(true);
        let selection = engine.select("opening", ProfileType::Analyst, None).await.unwrap();
        assert!(selection.pattern_tags.contains(&"promotion".to_string()));

        engine.set_promotion_mode(false);
        let selection = engine.select("opening", ProfileType::Analyst, None).await.unwrap();
        assert!(!selection.pattern_tags.contains(&"promotion".to_string()));
    }
}
