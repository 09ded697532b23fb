// [libs/infra/db-turso/src/repositories/lead.rs]
use broker_domain_models::lead::{Lead, LeadStatus};
use libsql::params;
use tracing::instrument;

use crate::client::TursoClient;
use crate::errors::DbError;

pub struct LeadRepository {
    client: TursoClient,
}

impl LeadRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, lead))]
    pub async fn create(&self, lead: &Lead) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO leads (id, contact_name, contact_email, contact_phone, status, owning_agent, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    lead.id.to_string(),
                    lead.contact_name.clone(),
                    lead.contact_email.clone(),
                    lead.contact_phone.clone(),
                    status_to_str(lead.status).to_string(),
                    lead.owning_agent.clone(),
                    lead.created_at.to_rfc3339(),
                    lead.updated_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn update_status(&self, lead_id: uuid::Uuid, status: LeadStatus) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "UPDATE leads SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![lead_id.to_string(), status_to_str(status).to_string(), chrono::Utc::now().to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    pub async fn get(&self, lead_id: uuid::Uuid) -> Result<Lead, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query("SELECT id, contact_name, contact_email, contact_phone, status, owning_agent, created_at, updated_at FROM leads WHERE id = ?1", params![lead_id.to_string()])
            .await?;

        match rows.next().await? {
            Some(row) => row_to_lead(&row),
            None => Err(DbError::NotFound(format!("lead {lead_id}"))),
        }
    }

    /// Erradicación explícita de un Lead (§3): el llamador debe haber
    /// cascadeado primero a Sentiment, Profile e Interaction.
    #[instrument(skip(self))]
    pub async fn delete(&self, lead_id: uuid::Uuid) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection.execute("DELETE FROM leads WHERE id = ?1", params![lead_id.to_string()]).await?;
        Ok(())
    }

    pub async fn list_by_status(&self, status: LeadStatus) -> Result<Vec<Lead>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, contact_name, contact_email, contact_phone, status, owning_agent, created_at, updated_at FROM leads WHERE status = ?1",
                params![status_to_str(status).to_string()],
            )
            .await?;

        let mut leads = Vec::new();
        while let Some(row) = rows.next().await? {
            leads.push(row_to_lead(&row)?);
        }
        Ok(leads)
    }
}

fn status_to_str(status: LeadStatus) -> &'static str {
    match status {
        LeadStatus::New => "new",
        LeadStatus::Contacted => "contacted",
        LeadStatus::Qualified => "qualified",
        LeadStatus::Suspended => "suspended",
        LeadStatus::Rejected => "rejected",
        LeadStatus::Converted => "converted",
    }
}

fn str_to_status(raw: &str) -> Result<LeadStatus, DbError> {
    match raw {
        "new" => Ok(LeadStatus::New),
        "contacted" => Ok(LeadStatus::Contacted),
        "qualified" => Ok(LeadStatus::Qualified),
        "suspended" => Ok(LeadStatus::Suspended),
        "rejected" => Ok(LeadStatus::Rejected),
        "converted" => Ok(LeadStatus::Converted),
        other => Err(DbError::MappingError(format!("unknown lead status '{other}'"))),
    }
}

fn row_to_lead(row: &libsql::Row) -> Result<Lead, DbError> {
    let id: String = row.get(0)?;
    let status: String = row.get(4)?;
    Ok(Lead {
        id: uuid::Uuid::parse_str(&id).map_err(|e| DbError::MappingError(e.to_string()))?,
        contact_name: row.get(1)?,
        contact_email: row.get(2)?,
        contact_phone: row.get(3)?,
        status: str_to_status(&status)?,
        owning_agent: row.get(5)?,
        created_at: parse_timestamp(row.get::<String>(6)?)?,
        updated_at: parse_timestamp(row.get::<String>(7)?)?,
    })
}

fn parse_timestamp(raw: String) -> Result<chrono::DateTime<chrono::Utc>, DbError> {
    chrono::DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| DbError::MappingError(e.to_string()))
}
