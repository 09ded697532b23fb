// [libs/infra/ledger-client/src/client.rs]
/*!
 * Adaptador hacia el ledger de escrow externo (§4.10, §9 glosario
 * "Ledger"): cada operación observada por el SagaCoordinator --
 * lock_funds, release_funds, transfer_to_new_carrier, open_dispute,
 * resolve_dispute -- retorna un identificador de transacción que el
 * coordinador persiste en el saga journal.
 */

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::LedgerError;

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerTransaction {
    pub tx_id: String,
}

pub struct LedgerClient {
    http: Client,
    base_url: String,
}

impl LedgerClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth_value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .expect("invalid ledger API key format");
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);

        Self {
            http: Client::builder()
                .default_headers(headers)
                .user_agent("broker-orchestrator/ledger-client")
                .timeout(Duration::from_secs(10))
                .build()
                .expect("failed to build ledger HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[instrument(skip(self))]
    pub async fn lock_funds(&self, shipment_id: Uuid, carrier_id: Uuid, amount: f64) -> Result<LedgerTransaction, LedgerError> {
        #[derive(Serialize)]
        struct Body {
            shipment_id: Uuid,
            carrier_id: Uuid,
            amount: f64,
        }
        self.post("/v1/escrow/lock", &Body { shipment_id, carrier_id, amount }).await
    }

    #[instrument(skip(self))]
    pub async fn release_funds(&self, shipment_id: Uuid) -> Result<LedgerTransaction, LedgerError> {
        #[derive(Serialize)]
        struct Body {
            shipment_id: Uuid,
        }
        self.post("/v1/escrow/release", &Body { shipment_id }).await
    }

    #[instrument(skip(self))]
    pub async fn transfer_to_new_carrier(&self, shipment_id: Uuid, new_carrier_id: Uuid) -> Result<LedgerTransaction, LedgerError> {
        #[derive(Serialize)]
        struct Body {
            shipment_id: Uuid,
            new_carrier_id: Uuid,
        }
        self.post("/v1/escrow/transfer", &Body { shipment_id, new_carrier_id }).await
    }

    #[instrument(skip(self))]
    pub async fn open_dispute(&self, shipment_id: Uuid, reason: &str) -> Result<LedgerTransaction, LedgerError> {
        #[derive(Serialize)]
        struct Body<'a> {
            shipment_id: Uuid,
            reason: &'a str,
        }
        self.post("/v1/escrow/dispute/open", &Body { shipment_id, reason }).await
    }

    #[instrument(skip(self))]
    pub async fn resolve_dispute(&self, shipment_id: Uuid, carrier_wins: bool, refund_amount: f64) -> Result<LedgerTransaction, LedgerError> {
        #[derive(Serialize)]
        struct Body {
            shipment_id: Uuid,
            carrier_wins: bool,
            refund_amount: f64,
        }
        self.post("/v1/escrow/dispute/resolve", &Body { shipment_id, carrier_wins, refund_amount }).await
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<LedgerTransaction, LedgerError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post(&url).json(body).send().await?;

        if response.status() == StatusCode::OK || response.status() == StatusCode::CREATED {
            response.json::<LedgerTransaction>().await.map_err(|e| LedgerError::MalformedPayload(e.to_string()))
        } else {
            Err(LedgerError::Rejected(format!("HTTP_{}", response.status())))
        }
    }
}
