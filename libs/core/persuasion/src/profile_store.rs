// [libs/core/persuasion/src/profile_store.rs]
/*!
 * ProfileStore (C4): clustering determinista de señales en uno de
 * cuatro tipos psicológicos, y búsqueda de leads convertidos por
 * similitud de coseno (§4.4). Persistido en `psych_profiles` vía
 * `ProfileRepository` (§3): el perfil asignado sobrevive a un reinicio
 * del proceso, a diferencia del registro de agentes en memoria.
 */

use std::collections::HashMap;

use broker_domain_models::errors::BrokerError;
use broker_domain_models::profile::{ProfileType, PsychProfile};
use broker_infra_db::errors::DbError;
use broker_infra_db::repositories::ProfileRepository;
use uuid::Uuid;

/// Conteos de palabras disparadoras por dimensión, recolectados aguas
/// arriba (transcripciones, interacciones) antes de invocar `assign`.
#[derive(Debug, Clone, Default)]
pub struct TriggerSignals {
    pub velocity: u32,
    pub analyst: u32,
    pub social: u32,
    pub security: u32,
    pub decision_speed: u8,
    pub risk_tolerance: u8,
    pub price_sensitivity: u8,
    pub communication_pref: String,
    pub similarity_vector: Option<Vec<f32>>,
}

pub struct ProfileStore {
    repository: ProfileRepository,
}

impl ProfileStore {
    pub fn new(repository: ProfileRepository) -> Self {
        Self { repository }
    }

    /// Asigna el tipo de dimensión con mayor conteo; empates se resuelven
    /// en el orden fijo `ProfileType::TIEBREAK_ORDER`. Sobrescribe
    /// cualquier perfil previo del lead (§4.4).
    pub async fn assign(&self, lead_id: Uuid, signals: TriggerSignals) -> Result<PsychProfile, BrokerError> {
        let scores: HashMap<ProfileType, u32> = HashMap::from([
            (ProfileType::Velocity, signals.velocity),
            (ProfileType::Analyst, signals.analyst),
            (ProfileType::Social, signals.social),
            (ProfileType::Security, signals.security),
        ]);

        let profile_type = ProfileType::TIEBREAK_ORDER
            .into_iter()
            .max_by_key(|candidate| scores.get(candidate).copied().unwrap_or(0))
            .unwrap_or(ProfileType::Velocity);

        let profile = PsychProfile {
            lead_id,
            profile_type,
            decision_speed: signals.decision_speed,
            risk_tolerance: signals.risk_tolerance,
            price_sensitivity: signals.price_sensitivity,
            communication_pref: signals.communication_pref,
            similarity_vector: signals.similarity_vector,
        };

        self.repository.upsert(&profile).await.map_err(to_broker_error)?;
        Ok(profile)
    }

    pub async fn get(&self, lead_id: Uuid) -> Result<PsychProfile, BrokerError> {
        self.repository.get(lead_id).await.map_err(to_broker_error)
    }

    /// Marca el resultado de un lead como convertido, habilitándolo como
    /// candidato de similitud (§4.4).
    pub async fn mark_converted(&self, lead_id: Uuid, converted: bool) -> Result<(), BrokerError> {
        self.repository.mark_converted(lead_id, converted).await.map_err(to_broker_error)
    }

    /// Borrado en cascada disparado por la erradicación explícita de un
    /// Lead (§3).
    pub async fn erase(&self, lead_id: Uuid) -> Result<(), BrokerError> {
        self.repository.delete_by_lead(lead_id).await.map_err(to_broker_error)
    }

    /// Retorna hasta `k` leads convertidos por similitud de coseno
    /// descendente, excluyendo estrictamente `lead_id` (§4.4).
    pub async fn similar(&self, lead_id: Uuid, k: usize) -> Result<Vec<Uuid>, BrokerError> {
        let query_vector = match self.repository.get(lead_id).await {
            Ok(profile) => profile.similarity_vector,
            Err(DbError::NotFound(_)) => None,
            Err(other) => return Err(to_broker_error(other)),
        };
        let Some(query_vector) = query_vector else {
            return Ok(Vec::new());
        };

        let candidates = self.repository.list_converted_with_vector().await.map_err(to_broker_error)?;
        let mut scored: Vec<(Uuid, f32)> = candidates
            .iter()
            .filter(|candidate| candidate.lead_id != lead_id)
            .filter_map(|candidate| {
                candidate
                    .similarity_vector
                    .as_ref()
                    .map(|vector| (candidate.lead_id, cosine_similarity(&query_vector, vector)))
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(k).map(|(id, _)| id).collect())
    }
}

fn to_broker_error(error: DbError) -> BrokerError {
    match error {
        DbError::NotFound(detail) => BrokerError::NotFound(detail),
        other => BrokerError::TransientDependency(other.to_string()),
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let dot: f32 = a[..len].iter().zip(&b[..len]).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a[..len].iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b[..len].iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> ProfileStore {
        let db = broker_infra_db::TursoClient::connect(":memory:", None).await.unwrap();
        ProfileStore::new(ProfileRepository::new(db))
    }

    #[tokio::test]
    async fn assigns_highest_scoring_dimension() {
        let store = store().await;
        let lead_id = Uuid::new_v4();
        let signals = TriggerSignals { velocity: 1, analyst: 5, social: 2, security: 0, ..Default::default() };
        let profile = store.assign(lead_id, signals).await.unwrap();
        assert_eq!(profile.profile_type, ProfileType::Analyst);
    }

    #[tokio::test]
    async fn ties_break_in_fixed_order() {
        let store = store().await;
        let lead_id = Uuid::new_v4();
        let signals = TriggerSignals { velocity: 3, analyst: 3, social: 3, security: 3, ..Default::default() };
        let profile = store.assign(lead_id, signals).await.unwrap();
        assert_eq!(profile.profile_type, ProfileType::Velocity);
    }

    #[tokio::test]
    async fn assigned_profile_survives_a_fresh_store_handle_on_the_same_db() {
        let db = broker_infra_db::TursoClient::connect(":memory:", None).await.unwrap();
        let lead_id = Uuid::new_v4();
        ProfileStore::new(ProfileRepository::new(db.clone()))
            .assign(lead_id, TriggerSignals { analyst: 9, ..Default::default() })
            .await
            .unwrap();

        let reloaded = ProfileStore::new(ProfileRepository::new(db)).get(lead_id).await.unwrap();
        assert_eq!(reloaded.profile_type, ProfileType::Analyst);
    }

    #[tokio::test]
    async fn similar_excludes_query_lead_and_unconverted() {
        let store = store().await;
        let query = Uuid::new_v4();
        let converted = Uuid::new_v4();
        let unconverted = Uuid::new_v4();

        store.assign(query, TriggerSignals { similarity_vector: Some(vec![1.0, 0.0]), ..Default::default() }).await.unwrap();
        store.assign(converted, TriggerSignals { similarity_vector: Some(vec![1.0, 0.0]), ..Default::default() }).await.unwrap();
        store.assign(unconverted, TriggerSignals { similarity_vector: Some(vec![1.0, 0.0]), ..Default::default() }).await.unwrap();
        store.mark_converted(converted, true).await.unwrap();

        let results = store.similar(query, 5).await.unwrap();
        assert_eq!(results, vec![converted]);
    }
}
