// [libs/infra/ai-clients/src/local_llm.rs]
/*!
 * Cliente del LLM local (tier 2 de la cascada de sentimiento, §4.3).
 * Envía texto más una instrucción de extracción; espera de vuelta
 * un objeto de sentimiento estructurado.
 */

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::errors::ClientError;

#[derive(Debug, Serialize)]
struct LocalLlmRequest<'a> {
    text: &'a str,
    instruction: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct LocalLlmSentiment {
    pub emotions: std::collections::HashMap<String, f32>,
    pub score: f32,
}

const EXTRACTION_INSTRUCTION: &str =
    "Extract emotion intensities (joy, anger, fear, sadness, surprise) and an overall sentiment score in [-1,1].";

pub struct LocalLlmClient {
    http: Client,
    base_url: String,
}

impl LocalLlmClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::builder()
                .user_agent("broker-orchestrator/ai-clients")
                .timeout(Duration::from_secs(5))
                .build()
                .expect("failed to build local LLM HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[instrument(skip(self, text))]
    pub async fn analyze(&self, text: &str) -> Result<LocalLlmSentiment, ClientError> {
        let url = format!("{}/v1/sentiment", self.base_url);
        let request = LocalLlmRequest { text, instruction: EXTRACTION_INSTRUCTION };
        let response = self.http.post(&url).json(&request).send().await?;

        if response.status() == StatusCode::OK {
            Ok(response.json::<LocalLlmSentiment>().await?)
        } else {
            Err(ClientError::ServerRejection(format!("HTTP_{}", response.status())))
        }
    }
}
