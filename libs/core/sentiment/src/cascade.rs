// [libs/core/sentiment/src/cascade.rs]
/*!
 * SentimentCascade (C3): compone breakers (C1) y ledger de cuota (C2)
 * con los clientes de IA para producir un SentimentRecord sin jamás
 * fallar externamente. El nivel de palabras clave es el piso
 * garantizado (§4.3).
 */

use std::sync::Arc;

use broker_core_resilience::{BreakerRegistry, QuotaLedger};
use broker_domain_models::sentiment::{SentimentMethod, SentimentRecord};
use broker_infra_ai_clients::{LocalLlmClient, ProsodyRequest, RemoteProsodyClient};
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::lexicon::{self, LEGAL_THREAT_TOKENS, MANAGER_REQUEST_PHRASES};

const REMOTE_DEPENDENCY: &str = "remote_prosody";
const LOCAL_DEPENDENCY: &str = "local_llm";

/// Umbrales de escalamiento de §4.3 paso 5.
const ESCALATION_SCORE_THRESHOLD: f32 = -0.7;
const ESCALATION_ANGER_THRESHOLD: f32 = 0.8;

pub struct SentimentCascade {
    breakers: Arc<BreakerRegistry>,
    quota: Arc<QuotaLedger>,
    prosody_client: Arc<RemoteProsodyClient>,
    llm_client: Arc<LocalLlmClient>,
}

pub struct AnalyzeInput<'a> {
    pub lead_id: Uuid,
    pub call_id: String,
    pub audio_reference: Option<&'a str>,
    pub transcript: Option<&'a str>,
}

impl SentimentCascade {
    pub fn new(
        breakers: Arc<BreakerRegistry>,
        quota: Arc<QuotaLedger>,
        prosody_client: Arc<RemoteProsodyClient>,
        llm_client: Arc<LocalLlmClient>,
    ) -> Self {
        Self { breakers, quota, prosody_client, llm_client }
    }

    /// Ejecuta la cascada completa. Nunca retorna `Err`: el tier de
    /// palabras clave garantiza un resultado terminal (§4.3).
    #[instrument(skip(self, input), fields(call_id = %input.call_id))]
    pub async fn analyze(&self, input: AnalyzeInput<'_>) -> SentimentRecord {
        let text = input.transcript.unwrap_or("");

        if let Some(record) = self.try_remote_tier(&input).await {
            return self.finalize(input.lead_id, input.call_id, record, text);
        }

        if let Some(record) = self.try_local_tier(text).await {
            return self.finalize(input.lead_id, input.call_id, record, text);
        }

        let record = self.keyword_tier(text);
        self.finalize(input.lead_id, input.call_id, record, text)
    }

    async fn try_remote_tier(&self, input: &AnalyzeInput<'_>) -> Option<TierOutcome> {
        let quota_client = self.prosody_client.clone();
        let fallback_required = self
            .quota
            .fallback_required(REMOTE_DEPENDENCY, || async move { quota_client.quota().await })
            .await;

        if fallback_required {
            info!("remote prosody quota near exhaustion, skipping tier 1");
            return None;
        }

        let breaker = self.breakers.get_or_create(REMOTE_DEPENDENCY);
        let request = ProsodyRequest {
            call_id: &input.call_id,
            audio_reference: input.audio_reference,
            transcript: input.transcript,
        };
        let client = self.prosody_client.clone();

        match breaker.execute(|| async move { client.analyze(&request).await }).await {
            Ok(response) => {
                let dominant_emotion = SentimentRecord::dominant_from(&response.emotions);
                let score = (response.valence - response.arousal.max(0.0)).clamp(-1.0, 1.0);
                Some(TierOutcome {
                    emotions: response.emotions,
                    dominant_emotion,
                    score,
                    confidence: 0.9,
                    method: SentimentMethod::Remote,
                })
            }
            Err(error) => {
                warn!(error = %error, "remote prosody tier failed, falling back");
                None
            }
        }
    }

    async fn try_local_tier(&self, text: &str) -> Option<TierOutcome> {
        let breaker = self.breakers.get_or_create(LOCAL_DEPENDENCY);
        let client = self.llm_client.clone();
        let text = text.to_string();

        match breaker.execute(|| async move { client.analyze(&text).await }).await {
            Ok(response) => {
                let dominant_emotion = SentimentRecord::dominant_from(&response.emotions);
                Some(TierOutcome {
                    emotions: response.emotions,
                    dominant_emotion,
                    score: response.score.clamp(-1.0, 1.0),
                    confidence: 0.7,
                    method: SentimentMethod::Local,
                })
            }
            Err(error) => {
                warn!(error = %error, "local LLM tier failed, falling back to keyword tier");
                None
            }
        }
    }

    fn keyword_tier(&self, text: &str) -> TierOutcome {
        let outcome = lexicon::classify(text);
        TierOutcome {
            emotions: outcome.emotions,
            dominant_emotion: outcome.dominant_emotion,
            score: outcome.score,
            confidence: 0.5,
            method: SentimentMethod::Keyword,
        }
    }

    fn finalize(&self, lead_id: Uuid, call_id: String, outcome: TierOutcome, text: &str) -> SentimentRecord {
        let anger = outcome.emotions.get("anger").copied().unwrap_or(0.0);
        let requires_escalation = requires_escalation(outcome.score, anger, text);

        SentimentRecord {
            id: Uuid::new_v4(),
            lead_id,
            call_id,
            score: outcome.score,
            emotions: outcome.emotions,
            dominant_emotion: outcome.dominant_emotion,
            confidence: outcome.confidence,
            method: outcome.method,
            requires_escalation,
            analyzed_at: Utc::now(),
        }
    }
}

struct TierOutcome {
    emotions: std::collections::HashMap<String, f32>,
    dominant_emotion: String,
    score: f32,
    confidence: f32,
    method: SentimentMethod,
}

/// §4.3 paso 5: evalúa las cuatro condiciones de escalamiento sobre el
/// texto original, independientemente de qué tier produjo el puntaje.
fn requires_escalation(score: f32, anger: f32, text: &str) -> bool {
    let lowered = text.to_lowercase();
    score < ESCALATION_SCORE_THRESHOLD
        || anger > ESCALATION_ANGER_THRESHOLD
        || LEGAL_THREAT_TOKENS.iter().any(|token| lowered.contains(token))
        || MANAGER_REQUEST_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalates_on_low_score() {
        assert!(requires_escalation(-0.8, 0.0, "va tutto bene"));
    }

    #[test]
    fn escalates_on_high_anger() {
        assert!(requires_escalation(0.0, 0.9, "va tutto bene"));
    }

    #[test]
    fn escalates_on_legal_threat_token_regardless_of_score() {
        assert!(requires_escalation(0.2, 0.1, "Voglio parlare con un avvocato"));
    }

    #[test]
    fn escalates_on_manager_request() {
        assert!(requires_escalation(0.0, 0.0, "Voglio parlare con il responsabile"));
    }

    #[test]
    fn does_not_escalate_on_mild_negative() {
        assert!(!requires_escalation(-0.3, 0.2, "un po' di ritardo"));
    }

    const ANGRY_TRANSCRIPT: &str = "Voglio parlare con un avvocato, è inaccettabile";

    fn unreachable_prosody_client() -> RemoteProsodyClient {
        RemoteProsodyClient::new("http://127.0.0.1:1".to_string(), "test-key".to_string())
    }

    fn unreachable_llm_client() -> LocalLlmClient {
        LocalLlmClient::new("http://127.0.0.1:1".to_string())
    }

    async fn spawn_local_llm_mock(score: f32) -> String {
        use axum::routing::post;
        use axum::{Json, Router};

        async fn sentiment_handler(
            axum::extract::State(score): axum::extract::State<f32>,
            Json(_body): Json<serde_json::Value>,
        ) -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "emotions": {"anger": 0.9, "joy": 0.0},
                "score": score,
            }))
        }

        let router = Router::new().route("/v1/sentiment", post(sentiment_handler)).with_state(score);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{address}")
    }

    #[tokio::test]
    async fn falls_back_to_local_tier_when_remote_prosody_is_unreachable() {
        let local_llm_url = spawn_local_llm_mock(-0.8).await;

        let cascade = SentimentCascade::new(
            Arc::new(BreakerRegistry::new(broker_core_resilience::BreakerConfig::default())),
            Arc::new(broker_core_resilience::QuotaLedger::new()),
            Arc::new(unreachable_prosody_client()),
            Arc::new(LocalLlmClient::new(local_llm_url)),
        );

        let record = cascade
            .analyze(AnalyzeInput {
                lead_id: Uuid::new_v4(),
                call_id: "call-1".to_string(),
                audio_reference: None,
                transcript: Some(ANGRY_TRANSCRIPT),
            })
            .await;

        assert_eq!(record.method, SentimentMethod::Local);
        assert!(record.score < 0.0);
        assert!(record.requires_escalation);
    }

    #[tokio::test]
    async fn falls_back_to_keyword_tier_when_both_remote_and_local_are_unreachable() {
        let cascade = SentimentCascade::new(
            Arc::new(BreakerRegistry::new(broker_core_resilience::BreakerConfig::default())),
            Arc::new(broker_core_resilience::QuotaLedger::new()),
            Arc::new(unreachable_prosody_client()),
            Arc::new(unreachable_llm_client()),
        );

        let started = std::time::Instant::now();
        let record = cascade
            .analyze(AnalyzeInput {
                lead_id: Uuid::new_v4(),
                call_id: "call-2".to_string(),
                audio_reference: None,
                transcript: Some(ANGRY_TRANSCRIPT),
            })
            .await;

        assert_eq!(record.method, SentimentMethod::Keyword);
        assert!(record.score <= -0.5);
        assert!(record.requires_escalation);
        assert!(started.elapsed() < std::time::Duration::from_millis(100));
    }
}
