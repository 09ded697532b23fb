// [libs/infra/db-turso/src/repositories/saga_journal.rs]
/*!
 * Contraparte persistente de `InMemorySagaJournal` (§4.10, Testable
 * Property 10): sobrevive a un reinicio del proceso orquestador, de
 * modo que un `SagaCoordinator` que retoma una saga a medio camino ve
 * los pasos forward ya completados y no los repite.
 */

use broker_core_saga::journal::{BoxFuture, SagaJournal};
use broker_domain_models::saga::SagaStepStatus;
use libsql::params;
use uuid::Uuid;

use crate::client::TursoClient;

pub struct DbSagaJournal {
    client: TursoClient,
}

impl DbSagaJournal {
    pub fn new(client: TursoClient) -> Self {
        Self { client }
    }
}

impl SagaJournal for DbSagaJournal {
    fn record<'a>(
        &'a self,
        saga_id: Uuid,
        step_index: u32,
        step_name: &'a str,
        status: SagaStepStatus,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let Ok(connection) = self.client.get_connection() else {
                return;
            };
            let _ = connection
                .execute(
                    "INSERT INTO saga_journal (saga_id, step_index, step_name, status, recorded_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(saga_id, step_index) DO UPDATE SET
                        step_name = excluded.step_name, status = excluded.status, recorded_at = excluded.recorded_at",
                    params![
                        saga_id.to_string(),
                        step_index,
                        step_name.to_string(),
                        status_to_str(status).to_string(),
                        chrono::Utc::now().to_rfc3339(),
                    ],
                )
                .await;
        })
    }

    fn status<'a>(&'a self, saga_id: Uuid, step_index: u32) -> BoxFuture<'a, Option<SagaStepStatus>> {
        Box::pin(async move {
            let connection = self.client.get_connection().ok()?;
            let mut rows = connection
                .query(
                    "SELECT status FROM saga_journal WHERE saga_id = ?1 AND step_index = ?2",
                    params![saga_id.to_string(), step_index],
                )
                .await
                .ok()?;
            let row = rows.next().await.ok()??;
            let raw: String = row.get(0).ok()?;
            str_to_status(&raw)
        })
    }
}

fn status_to_str(status: SagaStepStatus) -> &'static str {
    match status {
        SagaStepStatus::Pending => "pending",
        SagaStepStatus::Completed => "completed",
        SagaStepStatus::Compensated => "compensated",
        SagaStepStatus::Cancelled => "cancelled",
    }
}

fn str_to_status(raw: &str) -> Option<SagaStepStatus> {
    match raw {
        "pending" => Some(SagaStepStatus::Pending),
        "completed" => Some(SagaStepStatus::Completed),
        "compensated" => Some(SagaStepStatus::Compensated),
        "cancelled" => Some(SagaStepStatus::Cancelled),
        _ => None,
    }
}
