// [libs/domain/models-rs/src/saga.rs]
/*!
 * SagaJournalEntry: el registro persistido que hace que cada paso de
 * saga sea idempotente tras un reinicio (C11, Testable Property 10).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SagaStepStatus {
    Pending,
    Completed,
    Compensated,
    Cancelled,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaJournalEntry {
    pub saga_id: Uuid,
    pub step_index: u32,
    pub step_name: String,
    pub status: SagaStepStatus,
    pub recorded_at: DateTime<Utc>,
}
