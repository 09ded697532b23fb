// [libs/infra/ai-clients/src/remote_prosody.rs]
/*!
 * Cliente del servicio remoto de prosodia (tier 1 de la cascada de
 * sentimiento, §4.3). Requiere una referencia de audio o una
 * transcripción; responde con intensidades de emoción y datos
 * crudos de prosodia.
 */

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::errors::ClientError;

#[derive(Debug, Serialize)]
pub struct ProsodyRequest<'a> {
    pub call_id: &'a str,
    pub audio_reference: Option<&'a str>,
    pub transcript: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct ProsodyResponse {
    pub emotions: std::collections::HashMap<String, f32>,
    pub valence: f32,
    pub arousal: f32,
}

pub struct RemoteProsodyClient {
    http: Client,
    base_url: String,
}

impl RemoteProsodyClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth_value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .expect("invalid prosody API key format");
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);

        Self {
            http: Client::builder()
                .default_headers(headers)
                .user_agent("broker-orchestrator/ai-clients")
                .timeout(Duration::from_secs(5))
                .build()
                .expect("failed to build remote prosody HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn analyze(&self, request: &ProsodyRequest<'_>) -> Result<ProsodyResponse, ClientError> {
        let url = format!("{}/v1/prosody/analyze", self.base_url);
        let response = self.http.post(&url).json(request).send().await?;

        if response.status() == StatusCode::OK {
            Ok(response.json::<ProsodyResponse>().await?)
        } else {
            Err(ClientError::ServerRejection(format!("HTTP_{}", response.status())))
        }
    }

    #[instrument(skip(self))]
    pub async fn quota(&self) -> Result<(u64, u64), ClientError> {
        let url = format!("{}/v1/prosody/quota", self.base_url);
        let response = self.http.get(&url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::ServerRejection(format!("HTTP_{}", response.status())));
        }

        #[derive(Deserialize)]
        struct QuotaPayload {
            used_minutes: u64,
            limit_minutes: u64,
        }

        let payload = response.json::<QuotaPayload>().await?;
        Ok((payload.used_minutes, payload.limit_minutes))
    }
}
