// [libs/infra/db-turso/src/repositories/escrow.rs]
use broker_domain_models::shipment::{EscrowRecord, EscrowStatus};
use libsql::params;
use tracing::instrument;

use crate::client::TursoClient;
use crate::errors::DbError;

pub struct EscrowRepository {
    client: TursoClient,
}

impl EscrowRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, record))]
    pub async fn create(&self, record: &EscrowRecord) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO escrow_records (id, shipment_id, status, amount, deadline, failover_count, original_carrier, current_carrier)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id.to_string(),
                    record.shipment_id.to_string(),
                    status_to_str(record.status).to_string(),
                    record.amount,
                    record.deadline.to_rfc3339(),
                    record.failover_count,
                    record.original_carrier.to_string(),
                    record.current_carrier.to_string(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Única vía de actualización del transportista actual: a través de
    /// una saga (§3 invariant).
    pub async fn transfer_to_carrier(&self, shipment_id: uuid::Uuid, new_carrier: uuid::Uuid) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "UPDATE escrow_records SET current_carrier = ?2, status = 'transferred', failover_count = failover_count + 1 WHERE shipment_id = ?1",
                params![shipment_id.to_string(), new_carrier.to_string()],
            )
            .await?;
        Ok(())
    }

    /// §4.8 paso 4: extiende el plazo del escrow tras un failover exitoso.
    pub async fn extend_deadline(&self, shipment_id: uuid::Uuid, new_deadline: chrono::DateTime<chrono::Utc>) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "UPDATE escrow_records SET deadline = ?2 WHERE shipment_id = ?1",
                params![shipment_id.to_string(), new_deadline.to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    pub async fn update_status(&self, shipment_id: uuid::Uuid, status: EscrowStatus) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "UPDATE escrow_records SET status = ?2 WHERE shipment_id = ?1",
                params![shipment_id.to_string(), status_to_str(status).to_string()],
            )
            .await?;
        Ok(())
    }

    pub async fn get_by_shipment(&self, shipment_id: uuid::Uuid) -> Result<EscrowRecord, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, shipment_id, status, amount, deadline, failover_count, original_carrier, current_carrier
                 FROM escrow_records WHERE shipment_id = ?1",
                params![shipment_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => row_to_record(&row),
            None => Err(DbError::NotFound(format!("escrow for shipment {shipment_id}"))),
        }
    }
}

fn status_to_str(status: EscrowStatus) -> &'static str {
    match status {
        EscrowStatus::Locked => "locked",
        EscrowStatus::Released => "released",
        EscrowStatus::Refunded => "refunded",
        EscrowStatus::Transferred => "transferred",
        EscrowStatus::Disputed => "disputed",
        EscrowStatus::Resolved => "resolved",
    }
}

fn str_to_status(raw: &str) -> Result<EscrowStatus, DbError> {
    match raw {
        "locked" => Ok(EscrowStatus::Locked),
        "released" => Ok(EscrowStatus::Released),
        "refunded" => Ok(EscrowStatus::Refunded),
        "transferred" => Ok(EscrowStatus::Transferred),
        "disputed" => Ok(EscrowStatus::Disputed),
        "resolved" => Ok(EscrowStatus::Resolved),
        other => Err(DbError::MappingError(format!("unknown escrow status '{other}'"))),
    }
}

fn row_to_record(row: &libsql::Row) -> Result<EscrowRecord, DbError> {
    let id: String = row.get(0)?;
    let shipment_id: String = row.get(1)?;
    let status: String = row.get(2)?;
    let original_carrier: String = row.get(6)?;
    let current_carrier: String = row.get(7)?;

    Ok(EscrowRecord {
        id: uuid::Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        shipment_id: uuid::Uuid::parse_str(&shipment_id).map_err(|e| DbError::MappingError(e.to_string()))?,
        status: str_to_status(&status)?,
        amount: row.get(3)?,
        deadline: chrono::DateTime::parse_from_rfc3339(&row.get::<String>(4)?)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| DbError::MappingError(e.to_string()))?,
        failover_count: row.get::<i64>(5)? as u32,
        original_carrier: uuid::Uuid::parse_str(&original_carrier).map_err(|e| DbError::MappingError(e.to_string()))?,
        current_carrier: uuid::Uuid::parse_str(&current_carrier).map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}
