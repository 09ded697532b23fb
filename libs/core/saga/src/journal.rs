// [libs/core/saga/src/journal.rs]
/*!
 * SagaJournal: registro monótono por paso que hace que los reintentos
 * tras un reinicio salten las acciones forward ya completadas (§4.10,
 * Testable Property 10). `broker-infra-db` provee la implementación
 * respaldada por el almacén persistente; aquí vive la variante en
 * memoria usada por tests y por sagas de corta vida.
 */

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

use broker_domain_models::saga::SagaStepStatus;
use uuid::Uuid;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait SagaJournal: Send + Sync {
    fn record<'a>(
        &'a self,
        saga_id: Uuid,
        step_index: u32,
        step_name: &'a str,
        status: SagaStepStatus,
    ) -> BoxFuture<'a, ()>;

    fn status<'a>(&'a self, saga_id: Uuid, step_index: u32) -> BoxFuture<'a, Option<SagaStepStatus>>;
}

#[derive(Default)]
pub struct InMemorySagaJournal {
    entries: RwLock<HashMap<(Uuid, u32), SagaStepStatus>>,
}

impl InMemorySagaJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SagaJournal for InMemorySagaJournal {
    fn record<'a>(
        &'a self,
        saga_id: Uuid,
        step_index: u32,
        _step_name: &'a str,
        status: SagaStepStatus,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            self.entries.write().expect("saga journal lock poisoned").insert((saga_id, step_index), status);
        })
    }

    fn status<'a>(&'a self, saga_id: Uuid, step_index: u32) -> BoxFuture<'a, Option<SagaStepStatus>> {
        Box::pin(async move {
            self.entries.read().expect("saga journal lock poisoned").get(&(saga_id, step_index)).copied()
        })
    }
}
