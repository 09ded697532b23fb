// [libs/core/revenue/src/monitor.rs]
/*!
 * RevenueMonitor (C7): MRR móvil de 30 días y confianza de disparo por
 * nivel económico (§4.6).
 */

use broker_domain_models::level::{EconomicLevel, LevelState};
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy)]
pub struct CompletedPayment {
    pub amount: f64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub enum CostAlert {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy)]
pub struct LevelTrigger {
    pub level_id: broker_domain_models::level::LevelId,
    pub mrr: f64,
    pub confidence: f64,
    pub meets_threshold: bool,
}

impl LevelTrigger {
    pub fn fires(&self) -> bool {
        self.meets_threshold && self.confidence >= 1.0
    }
}

pub struct RevenueMonitor {
    levels: Vec<EconomicLevel>,
}

impl RevenueMonitor {
    pub fn new(levels: Vec<EconomicLevel>) -> Self {
        Self { levels }
    }

    /// Suma pagos completados en los 30 días previos a `as_of` (§4.6).
    pub fn calculate_mrr(payments: &[CompletedPayment], as_of: DateTime<Utc>) -> f64 {
        let window_start = as_of - Duration::days(30);
        payments
            .iter()
            .filter(|payment| payment.completed_at >= window_start && payment.completed_at <= as_of)
            .map(|payment| payment.amount)
            .sum()
    }

    /// Evalúa el disparador para el nivel inmediatamente superior al
    /// actual. `None` si ya está en el nivel máximo.
    pub fn check_trigger(&self, state: &LevelState, mrr: f64) -> Option<LevelTrigger> {
        let next_level_id = state.current_level.next()?;
        let next_level = self.levels.iter().find(|level| level.level_id == next_level_id)?;

        let meets_threshold = mrr >= next_level.mrr_threshold;
        let debounce = next_level.debounce_months.max(1);
        let confidence = if meets_threshold {
            (state.consecutive_months_over_next_threshold as f64 / debounce as f64).min(1.0)
        } else {
            0.0
        };

        Some(LevelTrigger { level_id: next_level_id, mrr, confidence, meets_threshold })
    }

    /// §4.7 modo seguro: cost_ratio = burn / mrr.
    pub fn cost_alert(cost_ratio: f64) -> Option<CostAlert> {
        if cost_ratio > 0.90 {
            Some(CostAlert::Critical)
        } else if cost_ratio > 0.80 {
            Some(CostAlert::Warning)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_domain_models::level::LevelId;
    use std::collections::BTreeSet;

    fn level(id: LevelId, mrr_threshold: f64, debounce_months: u32) -> EconomicLevel {
        EconomicLevel {
            level_id: id,
            mrr_threshold,
            max_burn: mrr_threshold * 0.5,
            debounce_months,
            active_components: BTreeSet::new(),
            disabled_components: BTreeSet::new(),
        }
    }

    #[test]
    fn mrr_excludes_payments_outside_trailing_window() {
        let now = Utc::now();
        let payments = vec![
            CompletedPayment { amount: 100.0, completed_at: now },
            CompletedPayment { amount: 50.0, completed_at: now - Duration::days(40) },
        ];
        assert_eq!(RevenueMonitor::calculate_mrr(&payments, now), 100.0);
    }

    #[test]
    fn trigger_confidence_scales_with_consecutive_months() {
        let monitor = RevenueMonitor::new(vec![level(LevelId::L1, 1000.0, 3)]);
        let mut state = LevelState::default();
        state.consecutive_months_over_next_threshold = 1;
        let trigger = monitor.check_trigger(&state, 1500.0).unwrap();
        assert!((trigger.confidence - (1.0 / 3.0)).abs() < 1e-9);
        assert!(!trigger.fires());
    }

    #[test]
    fn trigger_fires_at_full_debounce() {
        let monitor = RevenueMonitor::new(vec![level(LevelId::L1, 1000.0, 2)]);
        let mut state = LevelState::default();
        state.consecutive_months_over_next_threshold = 2;
        let trigger = monitor.check_trigger(&state, 1500.0).unwrap();
        assert!(trigger.fires());
    }

    #[test]
    fn debounce_of_two_needs_two_consecutive_months_over_threshold() {
        let monitor = RevenueMonitor::new(vec![level(LevelId::L2, 800.0, 2)]);
        let mut state = LevelState::default();
        state.current_level = LevelId::L1;

        state.consecutive_months_over_next_threshold = 1;
        let month_one = monitor.check_trigger(&state, 900.0).unwrap();
        assert!(month_one.meets_threshold);
        assert!((month_one.confidence - 0.5).abs() < 1e-9);
        assert!(!month_one.fires());

        state.consecutive_months_over_next_threshold = 2;
        let month_two = monitor.check_trigger(&state, 920.0).unwrap();
        assert!((month_two.confidence - 1.0).abs() < 1e-9);
        assert!(month_two.fires());
    }

    #[test]
    fn cost_alert_thresholds() {
        assert!(matches!(RevenueMonitor::cost_alert(0.95), Some(CostAlert::Critical)));
        assert!(matches!(RevenueMonitor::cost_alert(0.85), Some(CostAlert::Warning)));
        assert!(RevenueMonitor::cost_alert(0.5).is_none());
    }
}
