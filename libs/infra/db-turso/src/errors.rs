// [libs/infra/db-turso/src/errors.rs]
/*!
 * Catalogación semántica de fallos de persistencia del adaptador
 * libSQL.
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("DATABASE_UPLINK_SEVERED: {0}")]
    ConnectionError(String),

    #[error("SQL_QUERY_REJECTED: {0}")]
    QueryError(#[from] libsql::Error),

    #[error("DATA_MAPPING_VIOLATION: {0}")]
    MappingError(String),

    #[error("NOT_FOUND: {0}")]
    NotFound(String),
}
