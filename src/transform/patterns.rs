// SPDX-License-Identifier: MIT
//! Time-bucket heatmap, decision distribution, timeline, and score rollups.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::Serialize;

use super::factors::round2;
use crate::model::ImpulseScoreEvent;

// ─── Time-pattern heatmap ─────────────────────────────────────────────────────

/// Monday-first day labels, matching the heatmap rows.
pub const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Five coarse time-of-day slots, matching the heatmap columns.
pub const TIME_SLOTS: [&str; 5] = ["Morning", "Midday", "Afternoon", "Evening", "Night"];

/// Hour → slot mapping: Morning 6–10, Midday 10–14, Afternoon 14–18,
/// Evening 18–22, Night otherwise.
pub fn hour_to_slot(hour: u32) -> &'static str {
    match hour {
        6..=9 => "Morning",
        10..=13 => "Midday",
        14..=17 => "Afternoon",
        18..=21 => "Evening",
        _ => "Night",
    }
}

/// One heatmap cell. The full grid always has 35 of these (7 days × 5 slots).
#[derive(Debug, Clone, Serialize)]
pub struct PatternCell {
    pub day: &'static str,
    pub time_slot: &'static str,
    pub count: u32,
    /// Mean score of the cell's events, rounded to 2 decimals; 0 when empty.
    pub avg_score: f64,
}

/// Bucket events into the 7×5 (weekday × time-slot) grid.
///
/// Weekday and hour come from the timestamp's embedded offset (the backend
/// emits child-local timestamps). Events with unparseable timestamps are
/// skipped; the grid itself always contains all 35 cells.
pub fn time_patterns(events: &[ImpulseScoreEvent]) -> Vec<PatternCell> {
    let mut cells: BTreeMap<(usize, usize), (u32, f64)> = BTreeMap::new();

    for event in events {
        let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(&event.timestamp) else {
            continue;
        };
        let day_idx = dt.weekday().num_days_from_monday() as usize;
        let slot = hour_to_slot(dt.hour());
        let slot_idx = TIME_SLOTS.iter().position(|s| *s == slot).unwrap_or(4);
        let entry = cells.entry((day_idx, slot_idx)).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += event.score();
    }

    let mut grid = Vec::with_capacity(35);
    for (day_idx, day) in DAY_NAMES.iter().enumerate() {
        for (slot_idx, slot) in TIME_SLOTS.iter().enumerate() {
            let (count, total) = cells
                .get(&(day_idx, slot_idx))
                .copied()
                .unwrap_or((0, 0.0));
            grid.push(PatternCell {
                day,
                time_slot: slot,
                count,
                avg_score: if count > 0 { round2(total / f64::from(count)) } else { 0.0 },
            });
        }
    }
    grid
}

// ─── Decision distribution ────────────────────────────────────────────────────

/// One donut/bar slice with its fixed display colour.
#[derive(Debug, Clone, Serialize)]
pub struct DistributionSlice {
    pub name: String,
    pub raw_key: String,
    pub value: u32,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionDistribution {
    /// Counts per alert type (sentinel bucket "unknown" for absent tags).
    pub outcomes: Vec<DistributionSlice>,
    /// Counts per child response (sentinel bucket "no_response").
    pub responses: Vec<DistributionSlice>,
    pub total_decisions: usize,
}

fn outcome_color(key: &str) -> &'static str {
    match key {
        "impulse_pause" => "#E07A5F",
        "gentle_nudge" => "#7E6AE6",
        "celebrate" => "#11A39A",
        "suppress" => "#94A3B8",
        _ => "#CBD5E1",
    }
}

fn response_color(key: &str) -> &'static str {
    match key {
        "waited" => "#11A39A",
        "proceeded" => "#E07A5F",
        "dismissed" => "#94A3B8",
        _ => "#CBD5E1",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Tally alert-type and child-response counts.
///
/// Absent tags are legitimate categories here ("unknown"/"no_response"), not
/// data-quality faults; the totals across each map equal the event count.
pub fn decision_distribution(events: &[ImpulseScoreEvent]) -> DecisionDistribution {
    let mut outcome_counts: BTreeMap<String, u32> = BTreeMap::new();
    let mut response_counts: BTreeMap<String, u32> = BTreeMap::new();

    for event in events {
        let alert = if event.alert_type.is_empty() {
            "unknown"
        } else {
            event.alert_type.as_str()
        };
        *outcome_counts.entry(alert.to_string()).or_default() += 1;

        let resp = match event.child_response.as_deref() {
            Some(r) if !r.is_empty() => r,
            _ => "no_response",
        };
        *response_counts.entry(resp.to_string()).or_default() += 1;
    }

    let outcomes = outcome_counts
        .into_iter()
        .map(|(key, value)| DistributionSlice {
            name: crate::transform::action_label(&key).to_string(),
            color: outcome_color(&key),
            raw_key: key,
            value,
        })
        .collect();

    let responses = response_counts
        .into_iter()
        .map(|(key, value)| DistributionSlice {
            name: if key == "no_response" {
                "Pending".to_string()
            } else {
                capitalize(&key)
            },
            color: response_color(&key),
            raw_key: key,
            value,
        })
        .collect();

    DecisionDistribution {
        outcomes,
        responses,
        total_decisions: events.len(),
    }
}

// ─── Score timeline ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct TimelinePoint {
    pub id: String,
    /// Short display date, e.g. "Feb 25".
    pub date: String,
    /// Score rounded to 2 decimals for chart display.
    pub score: f64,
    pub product: String,
    pub amount: f64,
    pub alert_type: String,
}

/// Events sorted ascending by timestamp (not by score), chart-ready.
/// Unparseable timestamps sort to the front.
pub fn score_timeline(events: &[ImpulseScoreEvent]) -> Vec<TimelinePoint> {
    let mut ordered: Vec<&ImpulseScoreEvent> = events.iter().collect();
    ordered.sort_by_key(|e| {
        DateTime::<FixedOffset>::parse_from_rfc3339(&e.timestamp)
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(i64::MIN)
    });
    ordered
        .into_iter()
        .map(|e| TimelinePoint {
            id: e.id.clone(),
            date: crate::transform::short_date(&e.timestamp),
            score: round2(e.score()),
            product: e.product_name.clone(),
            amount: e.amount,
            alert_type: e.alert_type.clone(),
        })
        .collect()
}

// ─── Tests ────────────────────────────────────────────────────────────────────
