// [libs/infra/db-turso/src/repositories/shipment.rs]
use broker_domain_models::shipment::{Shipment, ShipmentStatus};
use libsql::params;
use tracing::instrument;

use crate::client::TursoClient;
use crate::errors::DbError;

pub struct ShipmentRepository {
    client: TursoClient,
}

impl ShipmentRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, shipment))]
    pub async fn create(&self, shipment: &Shipment) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let position_json = shipment
            .current_position
            .map(|position| serde_json::to_string(&position))
            .transpose()
            .map_err(|e| DbError::MappingError(e.to_string()))?;

        connection
            .execute(
                "INSERT INTO shipments (id, tracking_code, carrier_id, origin, destination, weight_kg, declared_value, status, planned_delivery_at, actual_delivery_at, current_position_json, cost, sale_price, saga_in_progress)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    shipment.id.to_string(),
                    shipment.tracking_code.clone(),
                    shipment.carrier_id.to_string(),
                    shipment.origin.clone(),
                    shipment.destination.clone(),
                    shipment.weight_kg,
                    shipment.declared_value,
                    status_to_str(shipment.status).to_string(),
                    shipment.planned_delivery_at.to_rfc3339(),
                    shipment.actual_delivery_at.map(|t| t.to_rfc3339()),
                    position_json,
                    shipment.cost,
                    shipment.sale_price,
                    shipment.saga_in_progress as i64,
                ],
            )
            .await?;
        Ok(())
    }

    /// Fija `saga_in_progress`, respetando el guard-field de §5: un
    /// Shipment nunca tiene dos sagas concurrentes en vuelo. Retorna
    /// `false` si ya estaba tomado.
    pub async fn try_acquire_saga_lock(&self, shipment_id: uuid::Uuid) -> Result<bool, DbError> {
        let connection = self.client.get_connection()?;
        let affected = connection
            .execute(
                "UPDATE shipments SET saga_in_progress = 1 WHERE id = ?1 AND saga_in_progress = 0",
                params![shipment_id.to_string()],
            )
            .await?;
        Ok(affected > 0)
    }

    pub async fn release_saga_lock(&self, shipment_id: uuid::Uuid) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute("UPDATE shipments SET saga_in_progress = 0 WHERE id = ?1", params![shipment_id.to_string()])
            .await?;
        Ok(())
    }

    pub async fn update_carrier(&self, shipment_id: uuid::Uuid, carrier_id: uuid::Uuid) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "UPDATE shipments SET carrier_id = ?2 WHERE id = ?1",
                params![shipment_id.to_string(), carrier_id.to_string()],
            )
            .await?;
        Ok(())
    }

    /// §4.8 paso 4: extiende `planned_delivery_at` tras un failover exitoso.
    pub async fn extend_deadline(&self, shipment_id: uuid::Uuid, new_deadline: chrono::DateTime<chrono::Utc>) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "UPDATE shipments SET planned_delivery_at = ?2 WHERE id = ?1",
                params![shipment_id.to_string(), new_deadline.to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    pub async fn update_status(&self, shipment_id: uuid::Uuid, status: ShipmentStatus) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "UPDATE shipments SET status = ?2 WHERE id = ?1",
                params![shipment_id.to_string(), status_to_str(status).to_string()],
            )
            .await?;
        Ok(())
    }

    pub async fn get(&self, shipment_id: uuid::Uuid) -> Result<Shipment, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(&format!("{SELECT_COLUMNS} WHERE id = ?1"), params![shipment_id.to_string()])
            .await?;

        match rows.next().await? {
            Some(row) => row_to_shipment(&row),
            None => Err(DbError::NotFound(format!("shipment {shipment_id}"))),
        }
    }

    /// §4.8 paso 1: envíos asignados a `carrier_id` en tránsito o
    /// confirmados, cuyo plazo aún no ha vencido.
    pub async fn list_at_risk_for_carrier(&self, carrier_id: uuid::Uuid, now: chrono::DateTime<chrono::Utc>) -> Result<Vec<Shipment>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                &format!("{SELECT_COLUMNS} WHERE carrier_id = ?1 AND status IN ('confirmed', 'in_transit') AND planned_delivery_at > ?2"),
                params![carrier_id.to_string(), now.to_rfc3339()],
            )
            .await?;

        let mut shipments = Vec::new();
        while let Some(row) = rows.next().await? {
            shipments.push(row_to_shipment(&row)?);
        }
        Ok(shipments)
    }
}

const SELECT_COLUMNS: &str = "SELECT id, tracking_code, carrier_id, origin, destination, weight_kg, declared_value, status, planned_delivery_at, actual_delivery_at, current_position_json, cost, sale_price, saga_in_progress FROM shipments";

fn status_to_str(status: ShipmentStatus) -> &'static str {
    match status {
        ShipmentStatus::Pending => "pending",
        ShipmentStatus::Confirmed => "confirmed",
        ShipmentStatus::InTransit => "in_transit",
        ShipmentStatus::Delivered => "delivered",
        ShipmentStatus::Cancelled => "cancelled",
        ShipmentStatus::Disputed => "disputed",
    }
}

fn str_to_status(raw: &str) -> Result<ShipmentStatus, DbError> {
    match raw {
        "pending" => Ok(ShipmentStatus::Pending),
        "confirmed" => Ok(ShipmentStatus::Confirmed),
        "in_transit" => Ok(ShipmentStatus::InTransit),
        "delivered" => Ok(ShipmentStatus::Delivered),
        "cancelled" => Ok(ShipmentStatus::Cancelled),
        "disputed" => Ok(ShipmentStatus::Disputed),
        other => Err(DbError::MappingError(format!("unknown shipment status '{other}'"))),
    }
}

fn row_to_shipment(row: &libsql::Row) -> Result<Shipment, DbError> {
    let id: String = row.get(0)?;
    let carrier_id: String = row.get(2)?;
    let status: String = row.get(7)?;
    let actual_delivery_at: Option<String> = row.get(9)?;
    let position_json: Option<String> = row.get(10)?;

    Ok(Shipment {
        id: uuid::Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        tracking_code: row.get(1)?,
        carrier_id: uuid::Uuid::parse_str(&carrier_id).map_err(|e| DbError::MappingError(e.to_string()))?,
        origin: row.get(3)?,
        destination: row.get(4)?,
        weight_kg: row.get(5)?,
        declared_value: row.get(6)?,
        status: str_to_status(&status)?,
        planned_delivery_at: chrono::DateTime::parse_from_rfc3339(&row.get::<String>(8)?)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| DbError::MappingError(e.to_string()))?,
        actual_delivery_at: actual_delivery_at
            .map(|raw| chrono::DateTime::parse_from_rfc3339(&raw).map(|dt| dt.with_timezone(&chrono::Utc)))
            .transpose()
            .map_err(|e| DbError::MappingError(e.to_string()))?,
        current_position: position_json
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| DbError::MappingError(e.to_string()))?,
        cost: row.get(11)?,
        sale_price: row.get(12)?,
        saga_in_progress: row.get::<i64>(13)? != 0,
    })
}
