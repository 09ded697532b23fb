// [libs/infra/db-turso/src/repositories/persuasion_strategy.rs]
use broker_domain_models::persuasion_strategy::{ObjectionHandler, PersuasionStrategy};
use broker_domain_models::profile::ProfileType;
use libsql::params;
use tracing::instrument;

use crate::client::TursoClient;
use crate::errors::DbError;

pub struct PersuasionStrategyRepository {
    client: TursoClient,
}

impl PersuasionStrategyRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, strategy))]
    pub async fn insert(&self, strategy: &PersuasionStrategy) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let pattern_tags_json = serde_json::to_string(&strategy.pattern_tags).map_err(|e| DbError::MappingError(e.to_string()))?;
        let objection_handlers_json =
            serde_json::to_string(&strategy.objection_handlers).map_err(|e| DbError::MappingError(e.to_string()))?;

        connection
            .execute(
                "INSERT INTO persuasion_strategies (id, profile_type, stage, template, pattern_tags_json, objection_handlers_json, success_rate, active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    strategy.id.to_string(),
                    profile_type_to_str(strategy.profile_type).to_string(),
                    strategy.stage.clone(),
                    strategy.template.clone(),
                    pattern_tags_json,
                    objection_handlers_json,
                    strategy.success_rate as f64,
                    strategy.active as i64,
                ],
            )
            .await?;
        Ok(())
    }

    /// Estrategias activas candidatas para `select` (§4.4); el filtro
    /// final por mayor tasa de éxito se hace en memoria.
    pub async fn list_active_for(&self, profile_type: ProfileType, stage: &str) -> Result<Vec<PersuasionStrategy>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, profile_type, stage, template, pattern_tags_json, objection_handlers_json, success_rate, active
                 FROM persuasion_strategies WHERE profile_type = ?1 AND stage = ?2 AND active = 1",
                params![profile_type_to_str(profile_type).to_string(), stage.to_string()],
            )
            .await?;

        let mut strategies = Vec::new();
        while let Some(row) = rows.next().await? {
            strategies.push(row_to_strategy(&row)?);
        }
        Ok(strategies)
    }
}

fn profile_type_to_str(profile_type: ProfileType) -> &'static str {
    match profile_type {
        ProfileType::Velocity => "velocity",
        ProfileType::Analyst => "analyst",
        ProfileType::Social => "social",
        ProfileType::Security => "security",
    }
}

fn str_to_profile_type(raw: &str) -> Result<ProfileType, DbError> {
    match raw {
        "velocity" => Ok(ProfileType::Velocity),
        "analyst" => Ok(ProfileType::Analyst),
        "social" => Ok(ProfileType::Social),
        "security" => Ok(ProfileType::Security),
        other => Err(DbError::MappingError(format!("unknown profile type '{other}'"))),
    }
}

fn row_to_strategy(row: &libsql::Row) -> Result<PersuasionStrategy, DbError> {
    let id: String = row.get(0)?;
    let profile_type: String = row.get(1)?;
    let pattern_tags_json: String = row.get(4)?;
    let objection_handlers_json: String = row.get(5)?;

    Ok(PersuasionStrategy {
        id: uuid::Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        profile_type: str_to_profile_type(&profile_type)?,
        stage: row.get(2)?,
        template: row.get(3)?,
        pattern_tags: serde_json::from_str(&pattern_tags_json).map_err(|e| DbError::MappingError(e.to_string()))?,
        objection_handlers: serde_json::from_str::<ObjectionHandler>(&objection_handlers_json)
            .map_err(|e| DbError::MappingError(e.to_string()))?,
        success_rate: row.get::<f64>(6)? as f32,
        active: row.get::<i64>(7)? != 0,
    })
}
