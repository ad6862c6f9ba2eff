// SPDX-License-Identifier: MIT
//! Transform layer — pure functions reshaping backend DTOs into view-models.
//!
//! No I/O, deterministic, never panics. Missing or malformed optional fields
//! fall back to defaults (0, `None`, empty map) instead of erroring.

pub mod factors;
pub mod patterns;

use chrono::DateTime;
use serde::Serialize;

use crate::model::{DecisionLogEntry, HabitScore, Memory, SavingsGoal, OverviewGoal, Streak};

// ─── Goal status ──────────────────────────────────────────────────────────────

/// Derived progress bucket for a savings goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Completed,
    OnTrack,
    Behind,
    AtRisk,
}

/// Pure threshold function on the current/target ratio.
///
/// `target <= 0` is always `AtRisk` — no divide-by-zero.
pub fn goal_status(current: f64, target: f64) -> GoalStatus {
    let pct = if target > 0.0 { current / target } else { 0.0 };
    if pct >= 1.0 {
        GoalStatus::Completed
    } else if pct >= 0.4 {
        GoalStatus::OnTrack
    } else if pct >= 0.15 {
        GoalStatus::Behind
    } else {
        GoalStatus::AtRisk
    }
}

/// Emoji shown on a goal card. Closed lookup with a generic fallback.
pub fn goal_emoji(name: &str) -> &'static str {
    match name {
        "Skateboard" | "Skateboard Fund" => "\u{1F6F9}",
        "Gaming" | "Gaming Fund" => "\u{1F3AE}",
        "College" | "College Fund" => "\u{1F393}",
        "LEGO" => "\u{1F9F1}",
        _ => "\u{1F3AF}",
    }
}

/// UI-facing goal card data.
#[derive(Debug, Clone, Serialize)]
pub struct GoalView {
    pub id: String,
    pub child_id: String,
    pub child_name: String,
    pub child_avatar: String,
    pub name: String,
    pub emoji: &'static str,
    pub current_amount: f64,
    pub target_amount: f64,
    pub weekly_contribution: f64,
    pub start_date: String,
    pub status: GoalStatus,
}

pub fn goal_view(g: &SavingsGoal, child_name: &str, child_avatar: &str) -> GoalView {
    GoalView {
        id: g.id.clone(),
        child_id: g.child_id.clone(),
        child_name: child_name.to_string(),
        child_avatar: child_avatar.to_string(),
        name: g.name.clone(),
        emoji: goal_emoji(&g.name),
        current_amount: g.current_amount,
        target_amount: g.target_amount,
        weekly_contribution: g.weekly_contribution,
        start_date: g.created_at.clone().unwrap_or_default(),
        status: goal_status(g.current_amount, g.target_amount),
    }
}

/// Overview goals have no id of their own; synthesise `{child_id}-{name}`.
pub fn overview_goal_view(
    g: &OverviewGoal,
    child_id: &str,
    child_name: &str,
    child_avatar: &str,
) -> GoalView {
    GoalView {
        id: format!("{child_id}-{}", g.name),
        child_id: child_id.to_string(),
        child_name: child_name.to_string(),
        child_avatar: child_avatar.to_string(),
        name: g.name.clone(),
        emoji: goal_emoji(&g.name),
        current_amount: g.current_amount,
        target_amount: g.target_amount,
        weekly_contribution: 0.0,
        start_date: String::new(),
        status: goal_status(g.current_amount, g.target_amount),
    }
}

// ─── Habit score ──────────────────────────────────────────────────────────────

/// Fixed label bucket for a 0–100 habit score.
pub fn habit_label(score: f64) -> &'static str {
    if score >= 70.0 {
        "Excellent habits!"
    } else if score >= 50.0 {
        "Building momentum"
    } else if score >= 30.0 {
        "Getting started"
    } else {
        "Needs attention"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitView {
    pub score: f64,
    pub label: &'static str,
    pub savings_streak_days: f64,
    pub impulse_resistance_rate: f64,
    pub goal_progress_velocity: f64,
    pub spending_consistency: f64,
    pub implementation_intentions_completed: f64,
}

pub fn habit_view(h: &HabitScore) -> HabitView {
    HabitView {
        score: h.score,
        label: habit_label(h.score),
        savings_streak_days: h.components.savings_streak_days,
        impulse_resistance_rate: h.components.impulse_resistance_rate,
        goal_progress_velocity: h.components.goal_progress_velocity,
        spending_consistency: h.components.spending_consistency,
        implementation_intentions_completed: h.components.implementation_intentions_completed,
    }
}

// ─── Streak ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct StreakView {
    pub current_days: u32,
    pub longest_days: u32,
    pub last_activity_date: String,
    /// 21-entry calendar, oldest day first; `true` = active day in the streak.
    pub calendar: Vec<bool>,
}

pub fn streak_view(s: &Streak) -> StreakView {
    let calendar = (0u32..21).rev().map(|i| i < s.current_days).collect();
    StreakView {
        current_days: s.current_days,
        longest_days: s.longest_days.unwrap_or(s.current_days),
        last_activity_date: s.last_updated.clone().unwrap_or_default(),
        calendar,
    }
}

// ─── Memories ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MemoryView {
    pub id: String,
    pub child_id: String,
    pub memory_type: String,
    pub content: String,
    pub created_at: String,
    pub suppress_alerts: bool,
    pub confidence: f64,
    pub category: Option<String>,
    pub merchant_name: Option<String>,
}

/// Preserves confidence/category/merchant for the memory log panel.
pub fn memory_view(m: &Memory) -> MemoryView {
    MemoryView {
        id: m.id.clone(),
        child_id: m.child_id.clone(),
        memory_type: m.memory_type.clone(),
        content: m.content.clone(),
        created_at: m.created_at.clone(),
        suppress_alerts: m.suppress_alerts,
        confidence: m.confidence.unwrap_or(0.0),
        category: m.category.clone(),
        merchant_name: m.merchant_name.clone(),
    }
}

// ─── Decisions ────────────────────────────────────────────────────────────────

/// Display label per alert/decision tag. Unknown tags pass through raw.
pub fn action_label(decision: &str) -> &str {
    match decision {
        "impulse_pause" => "Impulse pause",
        "gentle_nudge" => "Gentle check-in",
        "celebrate" => "No intervention",
        "suppress" => "Suppressed",
        other => other,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionView {
    pub id: String,
    pub timestamp: String,
    pub item: String,
    pub impulse_score: f64,
    pub action: String,
    pub message: String,
    pub child_response: String,
}

pub fn decision_view(d: &DecisionLogEntry) -> DecisionView {
    DecisionView {
        id: d.id.clone(),
        timestamp: short_datetime(&d.timestamp),
        item: d.trigger.clone(),
        impulse_score: d.impulse_score.unwrap_or(0.0),
        action: action_label(&d.decision).to_string(),
        message: d.coaching_message.clone().unwrap_or_default(),
        child_response: d
            .child_response
            .clone()
            .unwrap_or_else(|| "proceeded".to_string()),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityItem {
    pub id: String,
    pub child_id: String,
    pub child_name: String,
    pub kind: &'static str,
    pub icon: &'static str,
    pub title: String,
    pub subtitle: String,
    pub timestamp: String,
}

/// Most recent five decisions as activity-feed rows.
pub fn decisions_to_activity(
    decisions: &[DecisionLogEntry],
    child_id: &str,
    child_name: &str,
) -> Vec<ActivityItem> {
    decisions
        .iter()
        .take(5)
        .map(|d| {
            let waited = d.child_response.as_deref() == Some("waited");
            ActivityItem {
                id: d.id.clone(),
                child_id: child_id.to_string(),
                child_name: child_name.to_string(),
                kind: if waited { "impulse_resisted" } else { "browsing" },
                icon: if waited { "\u{1F4AA}" } else { "\u{1F440}" },
                title: if waited {
                    "Waited on purchase".to_string()
                } else if d.trigger.is_empty() {
                    "Purchase detected".to_string()
                } else {
                    d.trigger.clone()
                },
                subtitle: d
                    .coaching_message
                    .clone()
                    .unwrap_or_else(|| d.decision.clone()),
                timestamp: short_date(&d.timestamp),
            }
        })
        .collect()
}

// ─── Insights ─────────────────────────────────────────────────────────────────

const INSIGHT_KINDS: [&str; 4] = ["positive", "pattern", "opportunity", "learning"];
const INSIGHT_ICONS: [&str; 4] = ["\u{1F3AF}", "\u{1F4CA}", "\u{1F4A1}", "\u{1F4D6}"];

#[derive(Debug, Clone, Serialize)]
pub struct InsightView {
    pub id: String,
    pub child_id: String,
    pub child_name: String,
    pub kind: &'static str,
    pub icon: &'static str,
    pub title: String,
    pub description: String,
    pub impact: &'static str,
    pub confidence: u32,
    pub action: &'static str,
}

/// The backend sends bare strings; assign type/icon on a fixed 4-cycle.
pub fn insight_views(texts: &[String], child_id: &str, child_name: &str) -> Vec<InsightView> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let kind = INSIGHT_KINDS[i % 4];
            let mut title = String::with_capacity(kind.len());
            let mut chars = kind.chars();
            if let Some(first) = chars.next() {
                title.extend(first.to_uppercase());
                title.push_str(chars.as_str());
            }
            InsightView {
                id: format!("insight-{child_id}-{i}"),
                child_id: child_id.to_string(),
                child_name: child_name.to_string(),
                kind,
                icon: INSIGHT_ICONS[i % 4],
                title,
                description: text.clone(),
                impact: "Medium",
                confidence: 80,
                action: "View Details",
            }
        })
        .collect()
}

// ─── Stats overview ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct StatsOverview {
    pub total_saved: i64,
    /// Percentage of alert-triggered events the child waited on (0 when no
    /// alerts were triggered).
    pub impulse_resist_pct: u32,
    pub impulse_pauses: usize,
    pub active_goals: usize,
    pub streak_rate: u32,
}

pub fn stats_overview(
    events: &[crate::model::ImpulseScoreEvent],
    streak: Option<&Streak>,
    goals: &[GoalView],
) -> StatsOverview {
    let total_alerts = events.iter().filter(|e| e.alert_triggered).count();
    let waited = events
        .iter()
        .filter(|e| e.alert_triggered && e.child_response.as_deref() == Some("waited"))
        .count();
    let impulse_resist_pct = if total_alerts > 0 {
        ((waited as f64 / total_alerts as f64) * 100.0).round() as u32
    } else {
        0
    };
    let total_saved: f64 = goals.iter().map(|g| g.current_amount).sum();

    StatsOverview {
        total_saved: total_saved.round() as i64,
        impulse_resist_pct,
        impulse_pauses: total_alerts,
        active_goals: goals
            .iter()
            .filter(|g| g.status != GoalStatus::Completed)
            .count(),
        streak_rate: streak
            .map(|s| (s.current_days * 5).min(100))
            .unwrap_or(0),
    }
}

// ─── Timestamp display helpers ────────────────────────────────────────────────

/// "Feb 25, 7:30 PM" — unparseable timestamps pass through raw.
pub(crate) fn short_datetime(ts: &str) -> String {
    match DateTime::parse_from_rfc3339(ts) {
        Ok(dt) => dt.format("%b %-d, %-I:%M %p").to_string(),
        Err(_) => ts.to_string(),
    }
}

/// "Feb 25" — unparseable timestamps pass through raw.
pub(crate) fn short_date(ts: &str) -> String {
    match DateTime::parse_from_rfc3339(ts) {
        Ok(dt) => dt.format("%b %-d").to_string(),
        Err(_) => ts.to_string(),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
