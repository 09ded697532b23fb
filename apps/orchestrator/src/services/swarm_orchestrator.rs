// [apps/orchestrator/src/services/swarm_orchestrator.rs]
/*!
 * SwarmOrchestrator (§4.11): vigila el bus de eventos en busca de
 * patrones que cruzan los límites de un único agente. La única
 * detección activa hoy es la de fraude de transportista: tres
 * `carrier.failover_succeeded` para el mismo transportista dentro de
 * una ventana de 24h disparan `carrier.fraud_suspect` para que
 * DisputeAgent lo investigue.
 */

use std::collections::HashMap;

use broker_domain_models::events::BrokerEvent;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

const FRAUD_SUSPECT_THRESHOLD: usize = 3;
const FRAUD_WINDOW_HOURS: i64 = 24;

use crate::state::AppState;

pub fn spawn_swarm_orchestrator(state: AppState) {
    tokio::spawn(async move {
        let mut receiver = state.event_bus.subscribe();
        let mut occurrences: HashMap<Uuid, Vec<DateTime<Utc>>> = HashMap::new();

        info!("swarm orchestrator started, watching for cross-agent patterns");

        loop {
            match receiver.recv().await {
                Ok(envelope) => {
                    if let BrokerEvent::CarrierFailoverSucceeded { from_carrier, .. } = envelope.event {
                        let now = Utc::now();
                        let window_start = now - ChronoDuration::hours(FRAUD_WINDOW_HOURS);

                        let timestamps = occurrences.entry(from_carrier).or_default();
                        timestamps.retain(|t| *t >= window_start);
                        timestamps.push(now);

                        if timestamps.len() >= FRAUD_SUSPECT_THRESHOLD {
                            state.event_bus.publish(
                                BrokerEvent::CarrierFraudSuspect { carrier_id: from_carrier, occurrences: timestamps.len() as u32 },
                                "swarm-orchestrator",
                            );
                            timestamps.clear();
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "swarm orchestrator lagged behind event bus");
                }
                Err(RecvError::Closed) => {
                    warn!("event bus closed, swarm orchestrator exiting");
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_retains_only_recent_occurrences() {
        let now = Utc::now();
        let mut timestamps = vec![now - ChronoDuration::hours(30), now - ChronoDuration::hours(1)];
        let window_start = now - ChronoDuration::hours(FRAUD_WINDOW_HOURS);
        timestamps.retain(|t| *t >= window_start);
        assert_eq!(timestamps.len(), 1);
    }
}
