// [libs/infra/db-turso/src/client.rs]
/*!
 * Gestiona el enlace hacia el cluster libSQL (local, en memoria, o
 * remoto). En modo memoria mantiene un ancla de conexión viva para que
 * el esquema permanezca visible entre hilos durante la vida del
 * proceso.
 */

use std::sync::Arc;

use libsql::{Builder, Connection, Database};
use tracing::{info, instrument};

use crate::errors::DbError;
use crate::schema::apply_schema;

#[derive(Clone)]
pub struct TursoClient {
    driver: Arc<Database>,
    _memory_anchor: Option<Arc<Connection>>,
}

impl TursoClient {
    #[instrument(skip(access_token))]
    pub async fn connect(connection_url: &str, access_token: Option<String>) -> Result<Self, DbError> {
        if connection_url.is_empty() {
            return Err(DbError::ConnectionError("DATABASE_URL is empty".into()));
        }

        let is_remote = connection_url.starts_with("libsql://") || connection_url.starts_with("https://");
        let is_memory = connection_url.contains(":memory:") || connection_url.contains("mode=memory");

        let driver = if is_remote {
            let token = access_token
                .ok_or_else(|| DbError::ConnectionError("remote connection requires an access token".into()))?;
            Builder::new_remote(connection_url.to_string(), token).build().await
        } else {
            Builder::new_local(connection_url).build().await
        }
        .map_err(|error| DbError::ConnectionError(error.to_string()))?;

        let driver = Arc::new(driver);
        let mut anchor = None;

        if is_memory {
            let anchor_conn = driver.connect().map_err(|error| DbError::ConnectionError(error.to_string()))?;
            apply_schema(&anchor_conn).await?;
            anchor = Some(Arc::new(anchor_conn));
            info!("memory-backed database anchored for the lifetime of the process");
        } else {
            let bootstrap_conn = driver.connect().map_err(|error| DbError::ConnectionError(error.to_string()))?;
            apply_schema(&bootstrap_conn).await?;
        }

        Ok(Self { driver, _memory_anchor: anchor })
    }

    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.driver.connect().map_err(|error| DbError::ConnectionError(error.to_string()))
    }
}
