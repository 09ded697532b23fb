// [apps/orchestrator/src/services/event_bus.rs]
/*!
 * EventBus (C12): difusión en proceso de `EventEnvelope` hacia el
 * CommandCenterHub y hacia los agentes en background que observan
 * eventos de otros agentes (§4.11). Capacidad fija; un suscriptor lento
 * recibe `RecvError::Lagged` en vez de bloquear al publicador.
 */

use std::collections::VecDeque;
use std::sync::Mutex;

use broker_domain_models::events::{BrokerEvent, EventEnvelope};
use tokio::sync::broadcast;
use tracing::trace;

const CHANNEL_CAPACITY: usize = 1024;

/// Tamaño del buffer de repetición usado por el CommandCenterHub (§4.12)
/// al conectar un nuevo operador. Independiente de `HubConfig.replay_last_n`,
/// que sólo acota cuántas de estas entradas se reenvían por conexión.
const REPLAY_BUFFER_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    replay_buffer: Mutex<VecDeque<EventEnvelope>>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender, replay_buffer: Mutex::new(VecDeque::with_capacity(REPLAY_BUFFER_CAPACITY)) }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: BrokerEvent, source: impl Into<String>) {
        let envelope = EventEnvelope::new(event, source);

        if let Ok(mut buffer) = self.replay_buffer.lock() {
            if buffer.len() == REPLAY_BUFFER_CAPACITY {
                buffer.pop_front();
            }
            buffer.push_back(envelope.clone());
        }

        match self.sender.send(envelope) {
            Ok(subscriber_count) => trace!(subscriber_count, "event dispatched"),
            Err(_) => trace!("event discarded: no active subscribers"),
        }
    }

    /// Últimas `n` entradas conocidas, en orden cronológico ascendente.
    pub fn recent(&self, n: usize) -> Vec<EventEnvelope> {
        match self.replay_buffer.lock() {
            Ok(buffer) => buffer.iter().rev().take(n).rev().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
