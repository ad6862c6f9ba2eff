// SPDX-License-Identifier: MIT
//! Backend DTOs — serialisable types returned by the `/api` REST backend.
//!
//! Everything here arrives read-only from the scoring service. Optional fields
//! default instead of failing deserialisation; the frontend never rejects a
//! payload over a missing field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── Discovery ────────────────────────────────────────────────────────────────

/// A child as listed in the family discovery endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: u32,
}

/// One family returned by `GET /families`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    pub id: String,
    #[serde(default)]
    pub children: Vec<ChildRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyList {
    #[serde(default)]
    pub families: Vec<Family>,
}

// ─── Family overview ──────────────────────────────────────────────────────────

/// Per-child block inside `GET /family/{id}/overview`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: u32,
    pub habit_score: HabitScore,
    #[serde(default)]
    pub goals: Vec<OverviewGoal>,
    #[serde(default)]
    pub streak: StreakSummary,
    #[serde(default)]
    pub recent_decisions: Vec<DecisionLogEntry>,
    #[serde(default)]
    pub memories: Vec<Memory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyOverview {
    pub family_id: String,
    #[serde(default)]
    pub children: Vec<FamilyMember>,
}

/// 0–100 composite habit score with its sub-component breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitScore {
    pub score: f64,
    #[serde(default)]
    pub components: HabitComponents,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitComponents {
    #[serde(default)]
    pub savings_streak_days: f64,
    #[serde(default)]
    pub impulse_resistance_rate: f64,
    #[serde(default)]
    pub goal_progress_velocity: f64,
    #[serde(default)]
    pub spending_consistency: f64,
    #[serde(default)]
    pub implementation_intentions_completed: f64,
}

/// Goal shape embedded in the family overview (lighter than [`SavingsGoal`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewGoal {
    pub name: String,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default)]
    pub target_amount: f64,
    #[serde(default)]
    pub pct_complete: Option<f64>,
    #[serde(default)]
    pub weeks_remaining: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreakSummary {
    #[serde(default)]
    pub current_days: u32,
    #[serde(default)]
    pub companion_state: String,
}

// ─── Goals ────────────────────────────────────────────────────────────────────

/// A savings goal from `GET /child/{id}/goals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: String,
    pub child_id: String,
    pub name: String,
    #[serde(default)]
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default)]
    pub weekly_contribution: f64,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalList {
    #[serde(default)]
    pub goals: Vec<SavingsGoal>,
}

// ─── Impulse scores ───────────────────────────────────────────────────────────

/// One observed value + weight contribution for a scoring factor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactorReading {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub impulse_weight: f64,
}

/// One detected purchase-intent event from `GET /child/{id}/impulse-scores`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpulseScoreEvent {
    pub id: String,
    pub child_id: String,
    /// RFC 3339 timestamp in the child's local offset.
    pub timestamp: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub merchant_name: String,
    #[serde(default)]
    pub merchant_category: String,
    /// Composite impulse score. Backend contract says [0,1]; see [`Self::score`].
    #[serde(default)]
    pub impulse_score: f64,
    /// Named factor → reading. `BTreeMap` gives deterministic iteration order.
    #[serde(default)]
    pub factors: BTreeMap<String, FactorReading>,
    #[serde(default)]
    pub alert_triggered: bool,
    #[serde(default)]
    pub alert_type: String,
    #[serde(default)]
    pub child_response: Option<String>,
    #[serde(default)]
    pub coaching_message: Option<String>,
    #[serde(default)]
    pub ai_justification: Option<String>,
}

impl ImpulseScoreEvent {
    /// The composite score clamped into [0,1]. The backend contract already
    /// promises this range; the clamp keeps downstream threshold code honest
    /// against a misbehaving payload.
    pub fn score(&self) -> f64 {
        self.impulse_score.clamp(0.0, 1.0)
    }
}

// ─── Decision log ─────────────────────────────────────────────────────────────

/// One automated-intervention record from `GET /flowchart/{id}/decision-log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    pub id: String,
    pub timestamp: String,
    #[serde(default)]
    pub trigger: String,
    #[serde(default)]
    pub impulse_score: Option<f64>,
    #[serde(default)]
    pub decision: String,
    #[serde(default)]
    pub coaching_message: Option<String>,
    #[serde(default)]
    pub ai_justification: Option<String>,
    #[serde(default)]
    pub child_response: Option<String>,
    #[serde(default)]
    pub factors: Option<BTreeMap<String, FactorReading>>,
    #[serde(default)]
    pub pipeline_nodes: Option<serde_json::Value>,
    #[serde(default)]
    pub pipeline_edges: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLog {
    #[serde(default)]
    pub latest: Option<DecisionLogEntry>,
    #[serde(default)]
    pub history: Vec<DecisionLogEntry>,
}

// ─── Memories ─────────────────────────────────────────────────────────────────

/// An observation the backend's reasoning layer stored about a child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub child_id: String,
    pub created_at: String,
    #[serde(default)]
    pub memory_type: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub suppress_alerts: bool,
    #[serde(default)]
    pub suppress_until: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryList {
    #[serde(default)]
    pub memories: Vec<Memory>,
}

// ─── Streak ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Streak {
    #[serde(default)]
    pub current_days: u32,
    #[serde(default)]
    pub longest_days: Option<u32>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub companion_state: String,
}

// ─── Spending ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryStats {
    #[serde(default)]
    pub sum: f64,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub mean: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyTotal {
    pub week: String,
    #[serde(default)]
    pub total: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImpulseIndicators {
    #[serde(default)]
    pub evening_pct: f64,
    #[serde(default)]
    pub weekend_pct: f64,
}

/// Spending rollup from `GET /child/{id}/spending`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpendingSummary {
    #[serde(default)]
    pub child_id: Option<String>,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryStats>,
    #[serde(default)]
    pub weekly_trend: Vec<WeeklyTotal>,
    #[serde(default)]
    pub impulse_indicators: ImpulseIndicators,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightList {
    #[serde(default)]
    pub insights: Vec<String>,
}

// ─── Coaching ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentionSuggestion {
    pub trigger_situation: String,
    pub planned_action: String,
}

/// Reply from `POST /coaching/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub suggested_intention: Option<IntentionSuggestion>,
    #[serde(default)]
    pub memory_updated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProactiveNudge {
    #[serde(default)]
    pub has_nudge: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub saving_tip: Option<String>,
    #[serde(default)]
    pub prediction: Option<NudgePrediction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NudgePrediction {
    pub item: String,
    pub merchant: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub confidence: f64,
}

// ─── Risk / prediction ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    pub factor: String,
    #[serde(default)]
    pub contribution: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScore {
    #[serde(default)]
    pub risk_score: f64,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub factors: Vec<RiskFactor>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub action_suggestion: String,
    #[serde(default)]
    pub risk_window_start: Option<String>,
    #[serde(default)]
    pub risk_window_end: Option<String>,
    #[serde(default)]
    pub pattern_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveAlert {
    pub alert_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub action_suggestion: Option<String>,
}

/// Aggregate from `GET /extension/check-risk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskCheck {
    pub current_risk_score: RiskScore,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub active_alerts: Vec<ActiveAlert>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DismissAlertAck {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub dismissed: bool,
}

// ─── Implementation intentions ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intention {
    pub id: String,
    pub child_id: String,
    pub trigger_situation: String,
    pub planned_action: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub total_triggered: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentionSet {
    #[serde(default)]
    pub intentions: Vec<Intention>,
    #[serde(default)]
    pub suggestions: Vec<IntentionSuggestion>,
}

// ─── Live feed ────────────────────────────────────────────────────────────────

/// Incremental payload from `GET /child/{id}/live-feed?since=…`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveFeed {
    #[serde(default)]
    pub new_impulse_scores: Vec<ImpulseScoreEvent>,
    #[serde(default)]
    pub proactive_predictions: Vec<Prediction>,
    #[serde(default)]
    pub should_wait: bool,
    #[serde(default)]
    pub wait_message: Option<String>,
    #[serde(default)]
    pub wait_duration_seconds: Option<u64>,
}

// ─── Factor vocabulary ────────────────────────────────────────────────────────

/// The seven known scoring factors, in radar-chart display order.
///
/// The backend sends factor keys as free strings; this enum is the closed set
/// the narrative and transform layers know how to talk about. Unknown keys
/// take the generic fallback path instead of being dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Factor {
    AmountVsAverage,
    Velocity,
    CategoryFrequency,
    MemorySuppression,
    TimeOfDay,
    DayOfWeek,
    GoalImpact,
}

impl Factor {
    /// All factors, in the fixed display order the radar chart expects.
    pub const ALL: [Factor; 7] = [
        Factor::AmountVsAverage,
        Factor::Velocity,
        Factor::CategoryFrequency,
        Factor::MemorySuppression,
        Factor::TimeOfDay,
        Factor::DayOfWeek,
        Factor::GoalImpact,
    ];

    /// The backend's wire key for this factor.
    pub fn key(self) -> &'static str {
        match self {
            Factor::AmountVsAverage => "amount_vs_average",
            Factor::Velocity => "velocity",
            Factor::CategoryFrequency => "category_frequency",
            Factor::MemorySuppression => "memory_suppression",
            Factor::TimeOfDay => "time_of_day",
            Factor::DayOfWeek => "day_of_week",
            Factor::GoalImpact => "goal_impact",
        }
    }

    /// Short display label.
    pub fn label(self) -> &'static str {
        match self {
            Factor::AmountVsAverage => "Amount",
            Factor::Velocity => "Velocity",
            Factor::CategoryFrequency => "Category",
            Factor::MemorySuppression => "Memory",
            Factor::TimeOfDay => "Time",
            Factor::DayOfWeek => "Day",
            Factor::GoalImpact => "Goal Impact",
        }
    }

    /// Nominal share of the composite score, as displayed ("20%").
    pub fn share(self) -> &'static str {
        match self {
            Factor::AmountVsAverage | Factor::Velocity => "20%",
            Factor::CategoryFrequency | Factor::MemorySuppression => "15%",
            Factor::TimeOfDay | Factor::DayOfWeek | Factor::GoalImpact => "10%",
        }
    }

    /// Parse a wire key. `None` for keys outside the closed set.
    pub fn from_key(key: &str) -> Option<Factor> {
        Factor::ALL.iter().copied().find(|f| f.key() == key)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_key_roundtrip() {
        for f in Factor::ALL {
            assert_eq!(Factor::from_key(f.key()), Some(f));
        }
        assert_eq!(Factor::from_key("astrology_sign"), None);
    }

    #[test]
    fn score_clamped_to_unit_interval() {
        let mut e: ImpulseScoreEvent =
            serde_json::from_value(serde_json::json!({
                "id": "evt-1",
                "child_id": "kid-1",
                "timestamp": "2026-02-25T19:30:00-05:00",
            }))
            .unwrap();
        e.impulse_score = 1.7;
        assert_eq!(e.score(), 1.0);
        e.impulse_score = -0.2;
        assert_eq!(e.score(), 0.0);
    }

    #[test]
    fn impulse_event_tolerates_missing_optionals() {
        let e: ImpulseScoreEvent = serde_json::from_value(serde_json::json!({
            "id": "evt-2",
            "child_id": "kid-1",
            "timestamp": "2026-02-25T19:30:00-05:00",
        }))
        .unwrap();
        assert!(e.factors.is_empty());
        assert!(!e.alert_triggered);
        assert_eq!(e.child_response, None);
        assert_eq!(e.amount, 0.0);
    }

    #[test]
    fn live_feed_defaults_empty() {
        let feed: LiveFeed = serde_json::from_str("{}").unwrap();
        assert!(feed.new_impulse_scores.is_empty());
        assert!(!feed.should_wait);
    }

    #[test]
    fn decision_log_roundtrip_json() {
        let entry = DecisionLogEntry {
            id: "dl-1".to_string(),
            timestamp: "2026-02-25T10:00:00Z".to_string(),
            trigger: "Amazon purchase - phone case".to_string(),
            impulse_score: Some(0.42),
            decision: "gentle_nudge".to_string(),
            coaching_message: Some("Worth a think?".to_string()),
            ai_justification: None,
            child_response: Some("waited".to_string()),
            factors: None,
            pipeline_nodes: None,
            pipeline_edges: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: DecisionLogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.decision, "gentle_nudge");
        assert_eq!(back.child_response.as_deref(), Some("waited"));
    }
}
