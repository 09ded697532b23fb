// [libs/domain/models-rs/src/agent.rs]
/*!
 * AgentRegistry's uniform contract types (C6): the tagged variant
 * `AgentKind`, the AgentStatus snapshot, and bounded-retention Activity
 * entries.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Acquisition,
    Qualification,
    Sourcing,
    Closing,
    Operations,
    Failover,
    Dispute,
    Retention,
}

impl AgentKind {
    pub fn label(self) -> &'static str {
        match self {
            AgentKind::Acquisition => "acquisition",
            AgentKind::Qualification => "qualification",
            AgentKind::Sourcing => "sourcing",
            AgentKind::Closing => "closing",
            AgentKind::Operations => "operations",
            AgentKind::Failover => "failover",
            AgentKind::Dispute => "dispute-resolution",
            AgentKind::Retention => "retention",
        }
    }
}

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatusLabel {
    Active,
    Standby,
    Processing,
    Warning,
    Error,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    pub id: AgentKind,
    pub name: String,
    pub status: AgentStatusLabel,
    /// 0-100.
    pub activity_level: u8,
    pub current_task: Option<String>,
    pub last_activity_at: DateTime<Utc>,
    pub pending_suggestion: Option<String>,
}

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Success,
    Warning,
    Error,
    Info,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub activity_type: String,
    pub status: ActivityStatus,
    pub description: String,
    pub metadata: Option<Value>,
}
