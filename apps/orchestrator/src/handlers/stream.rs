// [apps/orchestrator/src/handlers/stream.rs]
/*!
 * CommandCenterHub (C11, §4.12): acepta el upgrade a WebSocket y abre
 * cuatro tareas por conexión: un reenvío del bus compartido hacia un
 * buffer acotado por sesión con descarte del más antiguo (el
 * `broadcast` compartido no puede hacer eso sin cerrar al receptor
 * lento), la difusión de ese buffer + latido de vida hacia el
 * operador, y la ingesta de comandos en sentido inverso. La primera
 * tarea que termina aborta a las otras tres.
 */

use std::collections::VecDeque;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use broker_domain_models::agent::ActivityStatus;
use broker_domain_models::events::{BrokerEvent, EventEnvelope};
use futures::sink::SinkExt;
use futures::stream::StreamExt;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time::{interval, Duration};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::state::AppState;

const COMMAND_BUFFER_CAPACITY: usize = 32;

#[instrument(skip(upgrade, state))]
pub async fn open_command_center_socket(upgrade: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| run_command_center_session(socket, state))
}

struct SessionBuffer {
    capacity: usize,
    queue: Mutex<VecDeque<EventEnvelope>>,
    notify: Notify,
}

impl SessionBuffer {
    fn new(capacity: usize) -> Self {
        Self { capacity, queue: Mutex::new(VecDeque::with_capacity(capacity)), notify: Notify::new() }
    }

    /// Empuja una entrada, descartando la más antigua si el buffer está
    /// lleno. Devuelve `true` si hubo descarte.
    async fn push(&self, envelope: EventEnvelope) -> bool {
        let mut queue = self.queue.lock().await;
        let dropped = if queue.len() == self.capacity {
            queue.pop_front();
            true
        } else {
            false
        };
        queue.push_back(envelope);
        drop(queue);
        self.notify.notify_one();
        dropped
    }

    async fn drain(&self) -> Vec<EventEnvelope> {
        let mut queue = self.queue.lock().await;
        queue.drain(..).collect()
    }
}

async fn run_command_center_session(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.event_bus.subscribe();

    let session_id = Uuid::new_v4();
    info!(%session_id, "command center session opened");

    let buffer = Arc::new(SessionBuffer::new(state.config.hub.buffer_size));

    for envelope in state.event_bus.recent(state.config.hub.replay_last_n) {
        buffer.push(envelope).await;
    }

    let feed_state = state.clone();
    let feed_buffer = buffer.clone();
    let mut feed_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(envelope) => {
                    if feed_buffer.push(envelope).await {
                        warn!(%session_id, "command center session buffer full, dropped oldest frame");
                        let warning = EventEnvelope::new(
                            BrokerEvent::StreamLagWarning { subscriber_id: session_id, dropped: 1 },
                            "command-center-hub",
                        );
                        feed_buffer.push(warning).await;
                    }
                }
                Err(RecvError::Lagged(dropped)) => {
                    warn!(%session_id, dropped, "command center session lagged behind event bus");
                    feed_state.agent_registry.record_activity(
                        "command-center",
                        ActivityStatus::Warning,
                        format!("session {session_id} lagged by {dropped} frames"),
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let (command_tx, mut command_rx) = mpsc::channel::<String>(COMMAND_BUFFER_CAPACITY);

    let worker_state = state.clone();
    let mut worker_task = tokio::spawn(async move {
        while let Some(raw_command) = command_rx.recv().await {
            debug!(%session_id, "dispatching operator command");
            worker_state.event_bus.publish(
                BrokerEvent::CommandExecuted { command: raw_command, operator: session_id.to_string(), detail: None },
                "command-center-hub",
            );
        }
    });

    let heartbeat_secs = state.config.hub.heartbeat_s;
    let downstream_buffer = buffer.clone();
    let mut downstream_task = tokio::spawn(async move {
        let mut heartbeat = interval(Duration::from_secs(heartbeat_secs));

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if sender.send(Message::Ping(vec![])).await.is_err() {
                        break;
                    }
                }
                _ = downstream_buffer.notify.notified() => {
                    for envelope in downstream_buffer.drain().await {
                        if sender.send(Message::Text(serialize_envelope(&envelope))).await.is_err() {
                            return;
                        }
                    }
                }
            }
        }
    });

    let mut upstream_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Text(raw_command)) => {
                    if command_tx.send(raw_command).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Err(error) => {
                    warn!(%session_id, %error, "command center socket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut downstream_task) => {
            feed_task.abort();
            upstream_task.abort();
            worker_task.abort();
        }
        _ = (&mut upstream_task) => {
            feed_task.abort();
            downstream_task.abort();
            worker_task.abort();
        }
        _ = (&mut worker_task) => {
            feed_task.abort();
            downstream_task.abort();
            upstream_task.abort();
        }
        _ = (&mut feed_task) => {
            downstream_task.abort();
            upstream_task.abort();
            worker_task.abort();
        }
    }

    info!(%session_id, "command center session closed");
}

fn serialize_envelope(envelope: &EventEnvelope) -> String {
    serde_json::to_string(envelope).unwrap_or_else(|_| json!({"error": "serialization_failed"}).to_string())
}
