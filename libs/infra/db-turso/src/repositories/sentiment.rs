// [libs/infra/db-turso/src/repositories/sentiment.rs]
use broker_domain_models::sentiment::{SentimentMethod, SentimentRecord};
use libsql::params;
use tracing::instrument;

use crate::client::TursoClient;
use crate::errors::DbError;

pub struct SentimentRepository {
    client: TursoClient,
}

impl SentimentRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, record))]
    pub async fn insert(&self, record: &SentimentRecord) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let emotions_json = serde_json::to_string(&record.emotions).map_err(|e| DbError::MappingError(e.to_string()))?;

        connection
            .execute(
                "INSERT INTO sentiment_records (id, lead_id, call_id, score, emotions_json, dominant_emotion, confidence, method, requires_escalation, analyzed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id.to_string(),
                    record.lead_id.to_string(),
                    record.call_id.clone(),
                    record.score as f64,
                    emotions_json,
                    record.dominant_emotion.clone(),
                    record.confidence as f64,
                    method_to_str(record.method).to_string(),
                    record.requires_escalation as i64,
                    record.analyzed_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn list_by_lead(&self, lead_id: uuid::Uuid) -> Result<Vec<SentimentRecord>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, lead_id, call_id, score, emotions_json, dominant_emotion, confidence, method, requires_escalation, analyzed_at
                 FROM sentiment_records WHERE lead_id = ?1 ORDER BY analyzed_at ASC",
                params![lead_id.to_string()],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }

    /// Borrado en cascada disparado por la erradicación explícita de un
    /// Lead (§3).
    pub async fn delete_by_lead(&self, lead_id: uuid::Uuid) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection.execute("DELETE FROM sentiment_records WHERE lead_id = ?1", params![lead_id.to_string()]).await?;
        Ok(())
    }
}

fn method_to_str(method: SentimentMethod) -> &'static str {
    match method {
        SentimentMethod::Remote => "remote",
        SentimentMethod::Local => "local",
        SentimentMethod::Keyword => "keyword",
    }
}

fn str_to_method(raw: &str) -> Result<SentimentMethod, DbError> {
    match raw {
        "remote" => Ok(SentimentMethod::Remote),
        "local" => Ok(SentimentMethod::Local),
        "keyword" => Ok(SentimentMethod::Keyword),
        other => Err(DbError::MappingError(format!("unknown sentiment method '{other}'"))),
    }
}

fn row_to_record(row: &libsql::Row) -> Result<SentimentRecord, DbError> {
    let id: String = row.get(0)?;
    let lead_id: String = row.get(1)?;
    let emotions_json: String = row.get(4)?;
    let method: String = row.get(7)?;
    let analyzed_at: String = row.get(9)?;

    Ok(SentimentRecord {
        id: uuid::Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        lead_id: uuid::Uuid::parse_str(&lead_id).map_err(|e| DbError::MappingError(e.to_string()))?,
        call_id: row.get(2)?,
        score: row.get::<f64>(3)? as f32,
        emotions: serde_json::from_str(&emotions_json).map_err(|e| DbError::MappingError(e.to_string()))?,
        dominant_emotion: row.get(5)?,
        confidence: row.get::<f64>(6)? as f32,
        method: str_to_method(&method)?,
        requires_escalation: row.get::<i64>(8)? != 0,
        analyzed_at: chrono::DateTime::parse_from_rfc3339(&analyzed_at)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| DbError::MappingError(e.to_string()))?,
    })
}
