// [libs/infra/db-turso/src/repositories/interaction.rs]
use broker_domain_models::interaction::Interaction;
use libsql::params;
use tracing::instrument;

use crate::client::TursoClient;
use crate::errors::DbError;

pub struct InteractionRepository {
    client: TursoClient,
}

impl InteractionRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, interaction))]
    pub async fn insert(&self, interaction: &Interaction) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO interactions (id, lead_id, agent, sentiment_id, channel, summary, occurred_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    interaction.id.to_string(),
                    interaction.lead_id.to_string(),
                    interaction.agent.clone(),
                    interaction.sentiment_id.map(|id| id.to_string()),
                    interaction.channel.clone(),
                    interaction.summary.clone(),
                    interaction.occurred_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn list_by_lead(&self, lead_id: uuid::Uuid) -> Result<Vec<Interaction>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, lead_id, agent, sentiment_id, channel, summary, occurred_at
                 FROM interactions WHERE lead_id = ?1 ORDER BY occurred_at ASC",
                params![lead_id.to_string()],
            )
            .await?;

        let mut interactions = Vec::new();
        while let Some(row) = rows.next().await? {
            interactions.push(row_to_interaction(&row)?);
        }
        Ok(interactions)
    }

    /// Invariante nullable-on-delete (§3): borrar un SentimentRecord no
    /// destruye las interacciones que lo referencian, sólo limpia la
    /// referencia — la historia sobrevive al borrado del sentimiento.
    #[instrument(skip(self))]
    pub async fn clear_sentiment_reference(&self, sentiment_id: uuid::Uuid) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute("UPDATE interactions SET sentiment_id = NULL WHERE sentiment_id = ?1", params![sentiment_id.to_string()])
            .await?;
        Ok(())
    }

    /// Borrado en cascada disparado por la erradicación explícita de un
    /// Lead (§3).
    pub async fn delete_by_lead(&self, lead_id: uuid::Uuid) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection.execute("DELETE FROM interactions WHERE lead_id = ?1", params![lead_id.to_string()]).await?;
        Ok(())
    }
}

fn row_to_interaction(row: &libsql::Row) -> Result<Interaction, DbError> {
    let id: String = row.get(0)?;
    let lead_id: String = row.get(1)?;
    let sentiment_id: Option<String> = row.get(3)?;
    let occurred_at: String = row.get(6)?;

    Ok(Interaction {
        id: uuid::Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        lead_id: uuid::Uuid::parse_str(&lead_id).map_err(|e| DbError::MappingError(e.to_string()))?,
        agent: row.get(2)?,
        sentiment_id: sentiment_id
            .map(|raw| uuid::Uuid::parse_str(&raw))
            .transpose()
            .map_err(|e| DbError::MappingError(e.to_string()))?,
        channel: row.get(4)?,
        summary: row.get(5)?,
        occurred_at: chrono::DateTime::parse_from_rfc3339(&occurred_at)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}
