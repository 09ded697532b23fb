// [apps/orchestrator/src/services/agent_registry.rs]
/*!
 * AgentRegistry (C6): snapshot en memoria del estado de cada agente y
 * una bitácora de actividad acotada que alimenta el panel de mando
 * (§4.11, §4.12). No persiste nada; se reconstruye vacío en cada
 * arranque del proceso.
 */

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use broker_domain_models::agent::{ActivityEntry, ActivityStatus, AgentKind, AgentStatus, AgentStatusLabel};
use chrono::Utc;
use uuid::Uuid;

const ACTIVITY_FEED_CAPACITY: usize = 1000;

const ALL_AGENT_KINDS: [AgentKind; 8] = [
    AgentKind::Acquisition,
    AgentKind::Qualification,
    AgentKind::Sourcing,
    AgentKind::Closing,
    AgentKind::Operations,
    AgentKind::Failover,
    AgentKind::Dispute,
    AgentKind::Retention,
];

pub struct AgentRegistry {
    statuses: RwLock<HashMap<AgentKind, AgentStatus>>,
    activity: RwLock<VecDeque<ActivityEntry>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        let mut statuses = HashMap::with_capacity(ALL_AGENT_KINDS.len());
        for kind in ALL_AGENT_KINDS {
            statuses.insert(
                kind,
                AgentStatus {
                    id: kind,
                    name: kind.label().to_string(),
                    status: AgentStatusLabel::Standby,
                    activity_level: 0,
                    current_task: None,
                    last_activity_at: Utc::now(),
                    pending_suggestion: None,
                },
            );
        }

        Self { statuses: RwLock::new(statuses), activity: RwLock::new(VecDeque::with_capacity(ACTIVITY_FEED_CAPACITY)) }
    }

    pub fn snapshot(&self) -> Vec<AgentStatus> {
        self.statuses.read().expect("agent registry lock poisoned").values().cloned().collect()
    }

    pub fn get(&self, kind: AgentKind) -> Option<AgentStatus> {
        self.statuses.read().expect("agent registry lock poisoned").get(&kind).cloned()
    }

    pub fn set_status(&self, kind: AgentKind, status: AgentStatusLabel, current_task: Option<String>) {
        let mut guard = self.statuses.write().expect("agent registry lock poisoned");
        if let Some(entry) = guard.get_mut(&kind) {
            entry.status = status;
            entry.current_task = current_task;
            entry.last_activity_at = Utc::now();
        }
    }

    pub fn set_activity_level(&self, kind: AgentKind, level: u8) {
        let mut guard = self.statuses.write().expect("agent registry lock poisoned");
        if let Some(entry) = guard.get_mut(&kind) {
            entry.activity_level = level.min(100);
        }
    }

    pub fn suggest(&self, kind: AgentKind, suggestion: Option<String>) {
        let mut guard = self.statuses.write().expect("agent registry lock poisoned");
        if let Some(entry) = guard.get_mut(&kind) {
            entry.pending_suggestion = suggestion;
        }
    }

    /// Descarta la sugerencia pendiente de un agente por veto de un
    /// operador (§4.14, comando `veto_agent`) y lo regresa a standby.
    pub fn veto(&self, kind: AgentKind) {
        let mut guard = self.statuses.write().expect("agent registry lock poisoned");
        if let Some(entry) = guard.get_mut(&kind) {
            entry.pending_suggestion = None;
            entry.status = AgentStatusLabel::Standby;
            entry.current_task = None;
            entry.last_activity_at = Utc::now();
        }
    }

    pub fn record_activity(&self, activity_type: impl Into<String>, status: ActivityStatus, description: impl Into<String>) {
        let entry = ActivityEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            activity_type: activity_type.into(),
            status,
            description: description.into(),
            metadata: None,
        };

        let mut feed = self.activity.write().expect("activity feed lock poisoned");
        if feed.len() == ACTIVITY_FEED_CAPACITY {
            feed.pop_front();
        }
        feed.push_back(entry);
    }

    pub fn recent_activity(&self, limit: usize) -> Vec<ActivityEntry> {
        let feed = self.activity.read().expect("activity feed lock poisoned");
        feed.iter().rev().take(limit).cloned().collect()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_all_kinds_on_standby() {
        let registry = AgentRegistry::new();
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), ALL_AGENT_KINDS.len());
        assert!(snapshot.iter().all(|s| matches!(s.status, AgentStatusLabel::Standby)));
    }

    #[test]
    fn activity_feed_drops_oldest_beyond_capacity() {
        let registry = AgentRegistry::new();
        for i in 0..(ACTIVITY_FEED_CAPACITY + 10) {
            registry.record_activity("test", ActivityStatus::Info, format!("entry {i}"));
        }
        let recent = registry.recent_activity(ACTIVITY_FEED_CAPACITY + 10);
        assert_eq!(recent.len(), ACTIVITY_FEED_CAPACITY);
        assert!(recent[0].description.contains(&(ACTIVITY_FEED_CAPACITY + 9).to_string()));
    }

    #[test]
    fn set_status_updates_task_and_timestamp() {
        let registry = AgentRegistry::new();
        registry.set_status(AgentKind::Failover, AgentStatusLabel::Processing, Some("evaluating carrier".into()));
        let status = registry.get(AgentKind::Failover).unwrap();
        assert!(matches!(status.status, AgentStatusLabel::Processing));
        assert_eq!(status.current_task.as_deref(), Some("evaluating carrier"));
    }

    #[test]
    fn veto_clears_pending_suggestion_and_returns_to_standby() {
        let registry = AgentRegistry::new();
        registry.suggest(AgentKind::Closing, Some("switch carrier".into()));
        registry.set_status(AgentKind::Closing, AgentStatusLabel::Processing, Some("awaiting approval".into()));

        registry.veto(AgentKind::Closing);

        let status = registry.get(AgentKind::Closing).unwrap();
        assert!(status.pending_suggestion.is_none());
        assert!(matches!(status.status, AgentStatusLabel::Standby));
        assert!(status.current_task.is_none());
    }
}
