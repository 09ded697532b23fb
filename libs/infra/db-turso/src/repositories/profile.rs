// [libs/infra/db-turso/src/repositories/profile.rs]
use broker_domain_models::profile::{ProfileType, PsychProfile};
use libsql::params;
use tracing::instrument;

use crate::client::TursoClient;
use crate::errors::DbError;

pub struct ProfileRepository {
    client: TursoClient,
}

impl ProfileRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { client }
    }

    /// Inserta o sobrescribe el perfil del lead; `assign` (§4.4)
    /// reemplaza cualquier asignación previa sin tocar `converted`.
    #[instrument(skip(self, profile))]
    pub async fn upsert(&self, profile: &PsychProfile) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let similarity_vector_json = match &profile.similarity_vector {
            Some(vector) => Some(serde_json::to_string(vector).map_err(|e| DbError::MappingError(e.to_string()))?),
            None => None,
        };

        connection
            .execute(
                "INSERT INTO psych_profiles (lead_id, profile_type, decision_speed, risk_tolerance, price_sensitivity, communication_pref, similarity_vector_json, converted)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)
                 ON CONFLICT(lead_id) DO UPDATE SET
                    profile_type = excluded.profile_type,
                    decision_speed = excluded.decision_speed,
                    risk_tolerance = excluded.risk_tolerance,
                    price_sensitivity = excluded.price_sensitivity,
                    communication_pref = excluded.communication_pref,
                    similarity_vector_json = excluded.similarity_vector_json",
                params![
                    profile.lead_id.to_string(),
                    profile_type_to_str(profile.profile_type).to_string(),
                    profile.decision_speed as i64,
                    profile.risk_tolerance as i64,
                    profile.price_sensitivity as i64,
                    profile.communication_pref.clone(),
                    similarity_vector_json,
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get(&self, lead_id: uuid::Uuid) -> Result<PsychProfile, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT lead_id, profile_type, decision_speed, risk_tolerance, price_sensitivity, communication_pref, similarity_vector_json
                 FROM psych_profiles WHERE lead_id = ?1",
                params![lead_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => row_to_profile(&row),
            None => Err(DbError::NotFound(format!("profile for lead {lead_id}"))),
        }
    }

    #[instrument(skip(self))]
    pub async fn mark_converted(&self, lead_id: uuid::Uuid, converted: bool) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "UPDATE psych_profiles SET converted = ?2 WHERE lead_id = ?1",
                params![lead_id.to_string(), converted as i64],
            )
            .await?;
        Ok(())
    }

    /// Candidatos de similitud (§4.4): perfiles de leads convertidos con
    /// vector de similitud disponible.
    pub async fn list_converted_with_vector(&self) -> Result<Vec<PsychProfile>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT lead_id, profile_type, decision_speed, risk_tolerance, price_sensitivity, communication_pref, similarity_vector_json
                 FROM psych_profiles WHERE converted = 1 AND similarity_vector_json IS NOT NULL",
                (),
            )
            .await?;

        let mut profiles = Vec::new();
        while let Some(row) = rows.next().await? {
            profiles.push(row_to_profile(&row)?);
        }
        Ok(profiles)
    }

    /// Borrado en cascada disparado por la erradicación explícita de un
    /// Lead (§3).
    pub async fn delete_by_lead(&self, lead_id: uuid::Uuid) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection.execute("DELETE FROM psych_profiles WHERE lead_id = ?1", params![lead_id.to_string()]).await?;
        Ok(())
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

fn row_to_profile(row: &libsql::Row) -> Result<PsychProfile, DbError> {
    let lead_id: String = row.get(0)?;
    let profile_type: String = row.get(1)?;
    let similarity_vector_json: Option<String> = row.get(6)?;

    let similarity_vector = match similarity_vector_json {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| DbError::MappingError(e.to_string()))?),
        None => None,
    };

    Ok(PsychProfile {
        lead_id: uuid::Uuid::parse_str(&lead_id).map_err(|e| DbError::MappingError(e.to_string()))?,
        profile_type: str_to_profile_type(&profile_type)?,
        decision_speed: row.get::<i64>(2)? as u8,
        risk_tolerance: row.get::<i64>(3)? as u8,
        price_sensitivity: row.get::<i64>(4)? as u8,
        communication_pref: row.get(5)?,
        similarity_vector,
    })
}
