// [libs/core/resilience/src/breaker.rs]
/*!
 * CircuitBreaker (C1): máquina de tres estados por dependencia.
 *
 * - `closed`: las operaciones pasan; cada fallo incrementa
 *   `consecutive_failures`; al alcanzar `failure_threshold` sin éxito
 *   intermedio, transiciona a `open` y registra `opened_at`. Cualquier
 *   éxito pone el contador a cero.
 * - `open`: falla rápido con `CircuitError::Open` en <10ms. Cuando
 *   `now - opened_at >= recovery_timeout`, la siguiente llamada
 *   transiciona a `half_open`.
 * - `half_open`: admite hasta `half_open_probe_count` operaciones en
 *   paralelo; cualquier fallo vuelve a `open` (resetea `opened_at`); si
 *   todas las sondas tienen éxito, transiciona a `closed`.
 */

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};

use broker_domain_models::resilience::CircuitStateKind;
use tracing::{instrument, warn};

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub half_open_probe_count: u32,
    pub call_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            half_open_probe_count: 2,
            call_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitError<E> {
    #[error("circuit_open")]
    Open,
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Operation(E),
}

struct Inner {
    state: CircuitStateKind,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    half_open_in_flight: u32,
    half_open_successes: u32,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: CircuitStateKind::Closed,
            consecutive_failures: 0,
            opened_at: None,
            half_open_in_flight: 0,
            half_open_successes: 0,
        }
    }
}

/// Sondeo para admitir o no la llamada, sin mantener el lock cruzando un
/// punto de suspensión.
enum Admission {
    Proceed,
    ProceedAsHalfOpenProbe,
    Reject,
}

pub struct CircuitBreaker {
    pub name: String,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner::new()),
        }
    }

    pub fn state(&self) -> CircuitStateKind {
        self.inner.lock().expect("breaker lock poisoned").state
    }

    /// Exporta el estado como entero (0=closed, 1=open, 2=half_open) para
    /// métricas, siguiendo la convención de §4.1.
    pub fn state_metric(&self) -> u8 {
        match self.state() {
            CircuitStateKind::Closed => 0,
            CircuitStateKind::Open => 1,
            CircuitStateKind::HalfOpen => 2,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().expect("breaker lock poisoned").consecutive_failures
    }

    /// Reseteo manual para administradores (§4.1).
    pub fn reset(&self) {
        let mut guard = self.inner.lock().expect("breaker lock poisoned");
        *guard = Inner::new();
    }

    fn admit(&self) -> Admission {
        let mut guard = self.inner.lock().expect("breaker lock poisoned");
        match guard.state {
            CircuitStateKind::Closed => Admission::Proceed,
            CircuitStateKind::Open => {
                let elapsed_since_open = guard
                    .opened_at
                    .map(|opened| opened.elapsed())
                    .unwrap_or(Duration::ZERO);

                if elapsed_since_open >= self.config.recovery_timeout {
                    guard.state = CircuitStateKind::HalfOpen;
                    guard.half_open_in_flight = 1;
                    guard.half_open_successes = 0;
                    Admission::ProceedAsHalfOpenProbe
                } else {
                    Admission::Reject
                }
            }
            CircuitStateKind::HalfOpen => {
                if guard.half_open_in_flight < self.config.half_open_probe_count {
                    guard.half_open_in_flight += 1;
                    Admission::ProceedAsHalfOpenProbe
                } else {
                    Admission::Reject
                }
            }
        }
    }

    fn record_success(&self, was_half_open_probe: bool) {
        let mut guard = self.inner.lock().expect("breaker lock poisoned");
        guard.consecutive_failures = 0;

        if was_half_open_probe && guard.state == CircuitStateKind::HalfOpen {
            guard.half_open_successes += 1;
            guard.half_open_in_flight = guard.half_open_in_flight.saturating_sub(1);

            if guard.half_open_successes >= self.config.half_open_probe_count {
                guard.state = CircuitStateKind::Closed;
                guard.opened_at = None;
                guard.half_open_successes = 0;
            }
        }
    }

    fn record_failure(&self, was_half_open_probe: bool) {
        let mut guard = self.inner.lock().expect("breaker lock poisoned");

        if was_half_open_probe {
            guard.half_open_in_flight = guard.half_open_in_flight.saturating_sub(1);
            guard.state = CircuitStateKind::Open;
            guard.opened_at = Some(Instant::now());
            guard.half_open_successes = 0;
            guard.consecutive_failures += 1;
            return;
        }

        guard.consecutive_failures += 1;
        if guard.state == CircuitStateKind::Closed
            && guard.consecutive_failures >= self.config.failure_threshold
        {
            guard.state = CircuitStateKind::Open;
            guard.opened_at = Some(Instant::now());
        }
    }

    /// Ejecuta `operation` a través del breaker. Nunca mantiene el lock
    /// mientras el future está suspendido.
    #[instrument(skip(self, operation), fields(dependency = %self.name))]
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let admission = self.admit();
        let was_probe = match admission {
            Admission::Reject => {
                return Err(CircuitError::Open);
            }
            Admission::Proceed => false,
            Admission::ProceedAsHalfOpenProbe => true,
        };

        match tokio::time::timeout(self.config.call_timeout, operation()).await {
            Ok(Ok(value)) => {
                self.record_success(was_probe);
                Ok(value)
            }
            Ok(Err(err)) => {
                self.record_failure(was_probe);
                warn!(dependency = %self.name, "operation failed, breaker recorded failure");
                Err(CircuitError::Operation(err))
            }
            Err(_) => {
                self.record_failure(was_probe);
                warn!(dependency = %self.name, "operation timed out, breaker recorded failure");
                Err(CircuitError::Timeout(self.config.call_timeout))
            }
        }
    }
}

/// Registro global de breakers por nombre de dependencia (§4.1).
pub struct BreakerRegistry {
    breakers: RwLock<HashMap<String, std::sync::Arc<CircuitBreaker>>>,
    default_config: BreakerConfig,
}

impl BreakerRegistry {
    pub fn new(default_config: BreakerConfig) -> Self {
        Self {
            breakers: RwLock::new(HashMap::new()),
            default_config,
        }
    }

    pub fn get_or_create(&self, dependency: &str) -> std::sync::Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.read().expect("registry lock poisoned").get(dependency) {
            return existing.clone();
        }

        let mut write_guard = self.breakers.write().expect("registry lock poisoned");
        write_guard
            .entry(dependency.to_string())
            .or_insert_with(|| {
                std::sync::Arc::new(CircuitBreaker::new(dependency, self.default_config.clone()))
            })
            .clone()
    }

    pub fn register_with_config(&self, dependency: &str, config: BreakerConfig) -> std::sync::Arc<CircuitBreaker> {
        let breaker = std::sync::Arc::new(CircuitBreaker::new(dependency, config));
        self.breakers
            .write()
            .expect("registry lock poisoned")
            .insert(dependency.to_string(), breaker.clone());
        breaker
    }

    pub fn snapshot_states(&self) -> HashMap<String, u8> {
        self.breakers
            .read()
            .expect("registry lock poisoned")
            .iter()
            .map(|(name, breaker)| (name.clone(), breaker.state_metric()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> BreakerConfig {
        BreakerConfig {
            failure_threshold: 3,
            recovery_timeout: Duration::from_millis(20),
            half_open_probe_count: 2,
            call_timeout: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn closed_to_open_requires_consecutive_failures_with_no_intervening_success() {
        let breaker = CircuitBreaker::new("remote_prosody", fast_config());

        for _ in 0..2 {
            let _ = breaker.execute(|| async { Err::<(), _>("boom") }).await;
        }
        assert_eq!(breaker.state(), CircuitStateKind::Closed);

        let _ = breaker.execute(|| async { Ok::<_, &str>(()) }).await;
        assert_eq!(breaker.consecutive_failures(), 0);

        for _ in 0..3 {
            let _ = breaker.execute(|| async { Err::<(), _>("boom") }).await;
        }
        assert_eq!(breaker.state(), CircuitStateKind::Open);
    }

    #[tokio::test]
    async fn open_circuit_rejects_fast() {
        let breaker = CircuitBreaker::new("local_llm", fast_config());
        for _ in 0..3 {
            let _ = breaker.execute(|| async { Err::<(), _>("boom") }).await;
        }
        assert_eq!(breaker.state(), CircuitStateKind::Open);

        let started = Instant::now();
        let result = breaker.execute(|| async { Ok::<_, &str>(()) }).await;
        assert!(matches!(result, Err(CircuitError::Open)));
        assert!(started.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn half_open_closes_after_all_probes_succeed() {
        let breaker = CircuitBreaker::new("remote_prosody", fast_config());
        for _ in 0..3 {
            let _ = breaker.execute(|| async { Err::<(), _>("boom") }).await;
        }
        assert_eq!(breaker.state(), CircuitStateKind::Open);

        tokio::time::sleep(Duration::from_millis(25)).await;

        let first = breaker.execute(|| async { Ok::<_, &str>(()) }).await;
        assert!(first.is_ok());
        assert_eq!(breaker.state(), CircuitStateKind::HalfOpen);

        let second = breaker.execute(|| async { Ok::<_, &str>(()) }).await;
        assert!(second.is_ok());
        assert_eq!(breaker.state(), CircuitStateKind::Closed);
    }

    #[tokio::test]
    async fn half_open_failure_reopens_circuit() {
        let breaker = CircuitBreaker::new("remote_prosody", fast_config());
        for _ in 0..3 {
            let _ = breaker.execute(|| async { Err::<(), _>("boom") }).await;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;

        let probe = breaker.execute(|| async { Err::<(), _>("still down") }).await;
        assert!(probe.is_err());
        assert_eq!(breaker.state(), CircuitStateKind::Open);
    }

    #[tokio::test]
    async fn registry_reuses_breaker_per_dependency() {
        let registry = BreakerRegistry::new(fast_config());
        let a = registry.get_or_create("remote_prosody");
        let b = registry.get_or_create("remote_prosody");
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Mirrors the `closed`/`open` transition rule documented on this module:
    /// the counter resets on any success and opens once it reaches
    /// `threshold`; once open (with a recovery timeout long enough to never
    /// elapse during the run) every further call is rejected without
    /// touching the counter.
    fn model_ends_open(threshold: u32, ops: &[bool]) -> bool {
        let mut consecutive = 0u32;
        let mut open = false;
        for &success in ops {
            if open {
                break;
            }
            if success {
                consecutive = 0;
            } else {
                consecutive += 1;
                if consecutive >= threshold {
                    open = true;
                }
            }
        }
        open
    }

    proptest! {
        #[test]
        fn breaker_opens_iff_a_consecutive_failure_run_reaches_threshold(
            ops in proptest::collection::vec(any::<bool>(), 0..40)
        ) {
            let threshold = 3;
            let config = BreakerConfig {
                failure_threshold: threshold,
                recovery_timeout: Duration::from_secs(3600),
                half_open_probe_count: 2,
                call_timeout: Duration::from_secs(5),
            };

            let ended_open = tokio::runtime::Runtime::new().unwrap().block_on(async {
                let breaker = CircuitBreaker::new("model-dependency", config);
                for &success in &ops {
                    let _ = breaker
                        .execute(|| async move { if success { Ok::<(), &str>(()) } else { Err("boom") } })
                        .await;
                }
                breaker.state() == CircuitStateKind::Open
            });

            prop_assert_eq!(ended_open, model_ends_open(threshold, &ops));
        }
    }
}
