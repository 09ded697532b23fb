// [apps/orchestrator/src/services/rate_limiter.rs]
/*!
 * RateLimiter (C14): token bucket por (endpoint, identidad de cliente),
 * recarga lineal por tiempo transcurrido. Puro en memoria: un reinicio
 * del proceso resetea todos los cupos, lo cual es aceptable porque el
 * propósito es absorber ráfagas, no imponer cuotas de facturación.
 */

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub capacity: u32,
    pub refill_per_second: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { capacity: 60, refill_per_second: 1.0 }
    }
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config, buckets: Mutex::new(HashMap::new()) }
    }

    /// `true` si la solicitud se admite y consume un token; `false` si el cupo está agotado.
    pub fn check(&self, endpoint: &str, client_key: &str) -> bool {
        let key = format!("{endpoint}:{client_key}");
        let mut buckets = self.buckets.lock().expect("rate limiter lock poisoned");
        let now = Instant::now();
        let bucket = buckets.entry(key).or_insert_with(|| Bucket { tokens: self.config.capacity as f64, last_refill: now });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.config.refill_per_second).min(self.config.capacity as f64);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Elimina buckets inactivos por más de `idle_for` para evitar crecimiento ilimitado del mapa.
    pub fn sweep(&self, idle_for: Duration) {
        let mut buckets = self.buckets.lock().expect("rate limiter lock poisoned");
        let now = Instant::now();
        buckets.retain(|_, bucket| now.duration_since(bucket.last_refill) < idle_for);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_capacity_then_rejects() {
        let limiter = RateLimiter::new(RateLimitConfig { capacity: 3, refill_per_second: 0.0 });
        assert!(limiter.check("/api/v1/shipments", "client-a"));
        assert!(limiter.check("/api/v1/shipments", "client-a"));
        assert!(limiter.check("/api/v1/shipments", "client-a"));
        assert!(!limiter.check("/api/v1/shipments", "client-a"));
    }

    #[test]
    fn buckets_are_independent_per_endpoint_and_client() {
        let limiter = RateLimiter::new(RateLimitConfig { capacity: 1, refill_per_second: 0.0 });
        assert!(limiter.check("/api/v1/shipments", "client-a"));
        assert!(limiter.check("/api/v1/disputes", "client-a"));
        assert!(limiter.check("/api/v1/shipments", "client-b"));
    }

    #[test]
    fn sweep_removes_only_idle_buckets() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        limiter.check("/api/v1/shipments", "client-a");
        limiter.sweep(Duration::from_secs(0));
        assert_eq!(limiter.buckets.lock().unwrap().len(), 0);
    }
}
