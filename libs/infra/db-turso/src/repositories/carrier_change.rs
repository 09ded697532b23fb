// [libs/infra/db-turso/src/repositories/carrier_change.rs]
/*!
 * Tabla append-only: ningún método de actualización o borrado se
 * expone, por diseño (§6).
 */

use broker_domain_models::shipment::CarrierChange;
use libsql::params;
use tracing::instrument;

use crate::client::TursoClient;
use crate::errors::DbError;

pub struct CarrierChangeRepository {
    client: TursoClient,
}

impl CarrierChangeRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, change))]
    pub async fn append(&self, change: &CarrierChange) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO carrier_changes (id, shipment_id, from_carrier, to_carrier, reason_code, executed_by, ledger_tx_id, success, compensating_tx_id, occurred_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    change.id.to_string(),
                    change.shipment_id.to_string(),
                    change.from_carrier.to_string(),
                    change.to_carrier.to_string(),
                    change.reason_code.clone(),
                    change.executed_by.clone(),
                    change.ledger_tx_id.clone(),
                    change.success as i64,
                    change.compensating_tx_id.clone(),
                    change.occurred_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn list_by_shipment(&self, shipment_id: uuid::Uuid) -> Result<Vec<CarrierChange>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, shipment_id, from_carrier, to_carrier, reason_code, executed_by, ledger_tx_id, success, compensating_tx_id, occurred_at
                 FROM carrier_changes WHERE shipment_id = ?1 ORDER BY occurred_at ASC",
                params![shipment_id.to_string()],
            )
            .await?;

        let mut changes = Vec::new();
        while let Some(row) = rows.next().await? {
            changes.push(row_to_change(&row)?);
        }
        Ok(changes)
    }
}

fn row_to_change(row: &libsql::Row) -> Result<CarrierChange, DbError> {
    Ok(CarrierChange {
        id: uuid::Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| DbError::MappingError(e.to_string()))?,
        shipment_id: uuid::Uuid::parse_str(&row.get::<String>(1)?).map_err(|e| DbError::MappingError(e.to_string()))?,
        from_carrier: uuid::Uuid::parse_str(&row.get::<String>(2)?).map_err(|e| DbError::MappingError(e.to_string()))?,
        to_carrier: uuid::Uuid::parse_str(&row.get::<String>(3)?).map_err(|e| DbError::MappingError(e.to_string()))?,
        reason_code: row.get(4)?,
        executed_by: row.get(5)?,
        ledger_tx_id: row.get(6)?,
        success: row.get::<i64>(7)? != 0,
        compensating_tx_id: row.get(8)?,
        occurred_at: chrono::DateTime::parse_from_rfc3339(&row.get::<String>(9)?)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}
