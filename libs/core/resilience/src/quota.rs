// [libs/core/resilience/src/quota.rs]
/*!
 * QuotaLedger (C2): cachea el consumo de minutos de una API remota con
 * TTL de 5 minutos; en fallo remoto y sin cache vigente, retorna un
 * valor conservador (percent = 99.9) para forzar el camino de fallback
 * (§4.2).
 */

use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tracing::warn;

const CACHE_TTL: Duration = Duration::from_secs(5 * 60);
const CONSERVATIVE_FALLBACK_PERCENT: f64 = 99.9;
const FALLBACK_REQUIRED_THRESHOLD_PCT: f64 = 90.0;

#[derive(Debug, Clone, Copy)]
pub struct QuotaSnapshot {
    pub used: u64,
    pub limit: u64,
    pub percent: f64,
}

impl QuotaSnapshot {
    fn from_used_limit(used: u64, limit: u64) -> Self {
        let percent = if limit == 0 { 100.0 } else { (used as f64 / limit as f64) * 100.0 };
        Self { used, limit, percent }
    }

    fn conservative() -> Self {
        Self { used: 0, limit: 0, percent: CONSERVATIVE_FALLBACK_PERCENT }
    }
}

struct CachedEntry {
    snapshot: QuotaSnapshot,
    cached_at: Instant,
}

pub struct QuotaLedger {
    cache: RwLock<HashMap<String, CachedEntry>>,
    usage: RwLock<HashMap<String, u64>>,
}

impl QuotaLedger {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            usage: RwLock::new(HashMap::new()),
        }
    }

    fn cached_if_fresh(&self, dependency: &str) -> Option<QuotaSnapshot> {
        let cache = self.cache.read().expect("quota cache lock poisoned");
        cache.get(dependency).and_then(|entry| {
            if entry.cached_at.elapsed() < CACHE_TTL {
                Some(entry.snapshot)
            } else {
                None
            }
        })
    }

    fn store(&self, dependency: &str, snapshot: QuotaSnapshot) {
        self.cache.write().expect("quota cache lock poisoned").insert(
            dependency.to_string(),
            CachedEntry { snapshot, cached_at: Instant::now() },
        );
    }

    /// Obtiene la cuota de la dependencia, consultando al proveedor remoto
    /// sólo en caché fría. `fetch_remote` típicamente envuelve una llamada
    /// HTTP a través de `broker-infra-ai-clients`.
    pub async fn get_quota<F, Fut, E>(&self, dependency: &str, fetch_remote: F) -> QuotaSnapshot
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(u64, u64), E>>,
        E: std::fmt::Display,
    {
        if let Some(cached) = self.cached_if_fresh(dependency) {
            return cached;
        }

        match fetch_remote().await {
            Ok((used, limit)) => {
                let snapshot = QuotaSnapshot::from_used_limit(used, limit);
                self.store(dependency, snapshot);
                snapshot
            }
            Err(fetch_error) => {
                warn!(
                    dependency,
                    error = %fetch_error,
                    "quota fetch failed with no fresh cache; returning conservative fallback"
                );
                QuotaSnapshot::conservative()
            }
        }
    }

    /// Registra uso local inmediato (antes de que el proveedor confirme),
    /// útil para no exceder la cuota entre refrescos del cache.
    pub fn record_usage(&self, dependency: &str, units: u64) {
        let mut usage = self.usage.write().expect("usage lock poisoned");
        *usage.entry(dependency.to_string()).or_insert(0) += units;
    }

    pub fn local_usage(&self, dependency: &str) -> u64 {
        *self.usage.read().expect("usage lock poisoned").get(dependency).unwrap_or(&0)
    }

    /// §4.2: `fallback_required(dep) := percent >= 90%`.
    pub async fn fallback_required<F, Fut, E>(&self, dependency: &str, fetch_remote: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(u64, u64), E>>,
        E: std::fmt::Display,
    {
        self.get_quota(dependency, fetch_remote).await.percent >= FALLBACK_REQUIRED_THRESHOLD_PCT
    }
}

impl Default for QuotaLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn caches_quota_within_ttl() {
        let ledger = QuotaLedger::new();
        let calls = std::sync::atomic::AtomicU32::new(0);

        let fetch = || async {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok::<_, &str>((10u64, 100u64))
        };
        let snapshot1 = ledger.get_quota("remote_prosody", fetch).await;
        assert_eq!(snapshot1.percent, 10.0);

        let fetch2 = || async {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok::<_, &str>((99u64, 100u64))
        };
        let snapshot2 = ledger.get_quota("remote_prosody", fetch2).await;
        assert_eq!(snapshot2.percent, 10.0, "second call must hit cache, not remote");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn returns_conservative_fallback_on_remote_failure_with_cold_cache() {
        let ledger = QuotaLedger::new();
        let snapshot = ledger
            .get_quota("remote_prosody", || async { Err::<(u64, u64), _>("network down") })
            .await;
        assert_eq!(snapshot.percent, CONSERVATIVE_FALLBACK_PERCENT);
    }

    #[tokio::test]
    async fn fallback_required_at_90_percent_threshold() {
        let ledger = QuotaLedger::new();
        assert!(
            ledger
                .fallback_required("remote_prosody", || async { Ok::<_, &str>((90u64, 100u64)) })
                .await
        );

        let ledger2 = QuotaLedger::new();
        assert!(
            !ledger2
                .fallback_required("remote_prosody", || async { Ok::<_, &str>((89u64, 100u64)) })
                .await
        );
    }
}
