// [libs/infra/db-turso/src/repositories/dispute.rs]
use broker_domain_models::shipment::DisputeResolution;
use libsql::params;
use tracing::instrument;

use crate::client::TursoClient;
use crate::errors::DbError;

pub struct DisputeRepository {
    client: TursoClient,
}

impl DisputeRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, resolution))]
    pub async fn insert(&self, resolution: &DisputeResolution) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO dispute_resolutions (id, shipment_id, carrier_wins, refund_amount, evidence_digest, ai_analysis_digest, confidence, resolved_at, resolver)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    resolution.id.to_string(),
                    resolution.shipment_id.to_string(),
                    resolution.carrier_wins as i64,
                    resolution.refund_amount,
                    resolution.evidence_digest.clone(),
                    resolution.ai_analysis_digest.clone(),
                    resolution.confidence,
                    resolution.resolved_at.to_rfc3339(),
                    resolution.resolver.clone(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Compensación de `write_dispute_resolution` (§4.10) ante un fallo
    /// posterior de la saga.
    pub async fn delete_by_shipment(&self, shipment_id: uuid::Uuid) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute("DELETE FROM dispute_resolutions WHERE shipment_id = ?1", params![shipment_id.to_string()])
            .await?;
        Ok(())
    }

    pub async fn get_by_shipment(&self, shipment_id: uuid::Uuid) -> Result<DisputeResolution, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, shipment_id, carrier_wins, refund_amount, evidence_digest, ai_analysis_digest, confidence, resolved_at, resolver
                 FROM dispute_resolutions WHERE shipment_id = ?1",
                params![shipment_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(DisputeResolution {
                id: uuid::Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| DbError::MappingError(e.to_string()))?,
                shipment_id: uuid::Uuid::parse_str(&row.get::<String>(1)?).map_err(|e| DbError::MappingError(e.to_string()))?,
                carrier_wins: row.get::<i64>(2)? != 0,
                refund_amount: row.get(3)?,
                evidence_digest: row.get(4)?,
                ai_analysis_digest: row.get(5)?,
                confidence: row.get::<i64>(6)? as u8,
                resolved_at: chrono::DateTime::parse_from_rfc3339(&row.get::<String>(7)?)
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .map_err(|e| DbError::MappingError(e.to_string()))?,
                resolver: row.get(8)?,
            }),
            None => Err(DbError::NotFound(format!("dispute resolution for shipment {shipment_id}"))),
        }
    }
}
