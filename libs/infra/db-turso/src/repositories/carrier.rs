// [libs/infra/db-turso/src/repositories/carrier.rs]
use broker_domain_models::carrier::Carrier;
use libsql::params;
use tracing::instrument;

use crate::client::TursoClient;
use crate::errors::DbError;

pub struct CarrierRepository {
    client: TursoClient,
}

impl CarrierRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, carrier))]
    pub async fn upsert(&self, carrier: &Carrier) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let routes_json =
            serde_json::to_string(&carrier.covered_routes).map_err(|e| DbError::MappingError(e.to_string()))?;

        connection
            .execute(
                "INSERT INTO carriers (id, name, mode, on_time_rate, reliability_score, wallet_identity, enabled, blacklisted_until, covered_routes_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name, mode = excluded.mode, on_time_rate = excluded.on_time_rate,
                    reliability_score = excluded.reliability_score, wallet_identity = excluded.wallet_identity,
                    enabled = excluded.enabled, blacklisted_until = excluded.blacklisted_until,
                    covered_routes_json = excluded.covered_routes_json",
                params![
                    carrier.id.to_string(),
                    carrier.name.clone(),
                    carrier.mode.clone(),
                    carrier.on_time_rate as f64,
                    carrier.reliability_score as f64,
                    carrier.wallet_identity.clone(),
                    carrier.enabled as i64,
                    carrier.blacklisted_until.map(|t| t.to_rfc3339()),
                    routes_json,
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn list_enabled(&self) -> Result<Vec<Carrier>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, name, mode, on_time_rate, reliability_score, wallet_identity, enabled, blacklisted_until, covered_routes_json
                 FROM carriers WHERE enabled = 1",
                (),
            )
            .await?;

        let mut carriers = Vec::new();
        while let Some(row) = rows.next().await? {
            carriers.push(row_to_carrier(&row)?);
        }
        Ok(carriers)
    }

    pub async fn get(&self, carrier_id: uuid::Uuid) -> Result<Carrier, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, name, mode, on_time_rate, reliability_score, wallet_identity, enabled, blacklisted_until, covered_routes_json
                 FROM carriers WHERE id = ?1",
                params![carrier_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => row_to_carrier(&row),
            None => Err(DbError::NotFound(format!("carrier {carrier_id}"))),
        }
    }
}

fn row_to_carrier(row: &libsql::Row) -> Result<Carrier, DbError> {
    let id: String = row.get(0)?;
    let blacklisted_until: Option<String> = row.get(7)?;
    let routes_json: String = row.get(8)?;

    Ok(Carrier {
        id: uuid::Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        name: row.get(1)?,
        mode: row.get(2)?,
        on_time_rate: row.get::<f64>(3)? as f32,
        reliability_score: row.get::<f64>(4)? as f32,
        wallet_identity: row.get(5)?,
        enabled: row.get::<i64>(6)? != 0,
        blacklisted_until: blacklisted_until
            .map(|raw| chrono::DateTime::parse_from_rfc3339(&raw).map(|dt| dt.with_timezone(&chrono::Utc)))
            .transpose()
            .map_err(|e| DbError::MappingError(e.to_string()))?,
        covered_routes: serde_json::from_str(&routes_json).map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}
