// [libs/infra/db-turso/src/repositories/level_state.rs]
use broker_domain_models::level::{LevelId, LevelState};
use libsql::params;
use tracing::instrument;

use crate::client::TursoClient;
use crate::errors::DbError;

pub struct LevelStateRepository {
    client: TursoClient,
}

impl LevelStateRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { client }
    }

    pub async fn get(&self) -> Result<LevelState, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT current_level, consecutive_months_over_next_threshold, last_transition_at FROM level_state WHERE id = 1",
                (),
            )
            .await?;

        match rows.next().await? {
            Some(row) => row_to_state(&row),
            None => Ok(LevelState::default()),
        }
    }

    #[instrument(skip(self, state))]
    pub async fn upsert(&self, state: &LevelState) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO level_state (id, current_level, consecutive_months_over_next_threshold, last_transition_at)
                 VALUES (1, ?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                    current_level = excluded.current_level,
                    consecutive_months_over_next_threshold = excluded.consecutive_months_over_next_threshold,
                    last_transition_at = excluded.last_transition_at",
                params![
                    level_id_to_str(state.current_level).to_string(),
                    state.consecutive_months_over_next_threshold,
                    state.last_transition_at.map(|t| t.to_rfc3339()),
                ],
            )
            .await?;
        Ok(())
    }
}

fn level_id_to_str(level: LevelId) -> &'static str {
    match level {
        LevelId::L0 => "l0",
        LevelId::L1 => "l1",
        LevelId::L2 => "l2",
        LevelId::L3 => "l3",
        LevelId::L4 => "l4",
    }
}

fn str_to_level_id(raw: &str) -> Result<LevelId, DbError> {
    match raw {
        "l0" => Ok(LevelId::L0),
        "l1" => Ok(LevelId::L1),
        "l2" => Ok(LevelId::L2),
        "l3" => Ok(LevelId::L3),
        "l4" => Ok(LevelId::L4),
        other => Err(DbError::MappingError(format!("unknown level id '{other}'"))),
    }
}

fn row_to_state(row: &libsql::Row) -> Result<LevelState, DbError> {
    let current_level: String = row.get(0)?;
    let last_transition_at: Option<String> = row.get(2)?;

    Ok(LevelState {
        current_level: str_to_level_id(&current_level)?,
        consecutive_months_over_next_threshold: row.get::<i64>(1)? as u32,
        last_transition_at: last_transition_at
            .map(|raw| chrono::DateTime::parse_from_rfc3339(&raw).map(|dt| dt.with_timezone(&chrono::Utc)))
            .transpose()
            .map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}
