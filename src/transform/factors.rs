// SPDX-License-Identifier: MIT
//! Impulse-factor aggregation for the radar chart and factor breakdown panel.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Factor, FactorReading, ImpulseScoreEvent};

/// One radar-chart axis: mean weight of a factor across observed events.
#[derive(Debug, Clone, Serialize)]
pub struct RadarPoint {
    pub key: &'static str,
    pub label: &'static str,
    /// Mean `impulse_weight` over events where the factor was observed,
    /// rounded to 2 decimals. 0 when the factor never appeared.
    pub avg_weight: f64,
    pub full_mark: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FactorAggregate {
    /// Always the fixed 7-factor order, one point per factor.
    pub radar: Vec<RadarPoint>,
    /// Factor readings of the most recent event, when any exist.
    pub latest: Option<BTreeMap<String, FactorReading>>,
}

/// Mean factor weights across events, radar-chart ready.
///
/// The mean is over events *observing* the factor, not over all events: a
/// factor present in 2 of 5 events with weights 0.4 and 0.6 averages 0.5.
/// Non-finite weights are ignored.
pub fn aggregate_impulse_factors(events: &[ImpulseScoreEvent]) -> FactorAggregate {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();

    for event in events {
        for (key, reading) in &event.factors {
            if !reading.impulse_weight.is_finite() {
                continue;
            }
            *sums.entry(key.as_str()).or_default() += reading.impulse_weight;
            *counts.entry(key.as_str()).or_default() += 1;
        }
    }

    let radar = Factor::ALL
        .iter()
        .map(|f| {
            let avg = match counts.get(f.key()) {
                Some(&n) if n > 0 => round2(sums[f.key()] / f64::from(n)),
                _ => 0.0,
            };
            RadarPoint {
                key: f.key(),
                label: f.label(),
                avg_weight: avg,
                full_mark: 1.0,
            }
        })
        .collect();

    let latest = events
        .first()
        .filter(|e| !e.factors.is_empty())
        .map(|e| e.factors.clone());

    FactorAggregate { radar, latest }
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, weights: &[(&str, f64)]) -> ImpulseScoreEvent {
        let mut factors = BTreeMap::new();
        for (key, w) in weights {
            factors.insert(
                key.to_string(),
                FactorReading { value: String::new(), impulse_weight: *w },
            );
        }
        ImpulseScoreEvent {
            id: id.to_string(),
            child_id: "kid-1".to_string(),
            timestamp: "2026-02-25T12:00:00Z".to_string(),
            product_name: String::new(),
            amount: 0.0,
            merchant_name: String::new(),
            merchant_category: String::new(),
            impulse_score: 0.5,
            factors,
            alert_triggered: false,
            alert_type: String::new(),
            child_response: None,
            coaching_message: None,
            ai_justification: None,
        }
    }

    #[test]
    fn mean_is_over_observed_entries_only() {
        // velocity observed in 2 of 5 events → mean of the 2 observations.
        let events = vec![
            event("a", &[("velocity", 0.4)]),
            event("b", &[]),
            event("c", &[("velocity", 0.6)]),
            event("d", &[]),
            event("e", &[]),
        ];
        let agg = aggregate_impulse_factors(&events);
        let velocity = agg.radar.iter().find(|p| p.key == "velocity").unwrap();
        assert_eq!(velocity.avg_weight, 0.5);
    }

    #[test]
    fn radar_always_has_seven_axes() {
        let agg = aggregate_impulse_factors(&[]);
        assert_eq!(agg.radar.len(), 7);
        assert!(agg.radar.iter().all(|p| p.avg_weight == 0.0));
        assert!(agg.latest.is_none());
    }

    #[test]
    fn unobserved_factor_reads_zero() {
        let events = vec![event("a", &[("velocity", 0.9)])];
        let agg = aggregate_impulse_factors(&events);
        let goal = agg.radar.iter().find(|p| p.key == "goal_impact").unwrap();
        assert_eq!(goal.avg_weight, 0.0);
    }

    #[test]
    fn non_finite_weights_ignored() {
        let events = vec![
            event("a", &[("velocity", f64::NAN)]),
            event("b", &[("velocity", 0.8)]),
        ];
        let agg = aggregate_impulse_factors(&events);
        let velocity = agg.radar.iter().find(|p| p.key == "velocity").unwrap();
        assert_eq!(velocity.avg_weight, 0.8);
    }

    #[test]
    fn latest_comes_from_first_event() {
        let events = vec![
            event("newest", &[("velocity", 0.7)]),
            event("older", &[("velocity", 0.1)]),
        ];
        let agg = aggregate_impulse_factors(&events);
        let latest = agg.latest.unwrap();
        assert_eq!(latest["velocity"].impulse_weight, 0.7);
    }
}
