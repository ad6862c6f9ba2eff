// SPDX-License-Identifier: MIT
//! Narrative engine — deterministic "chat bubble" text from impulse data.
//!
//! Pure and side-effect free: every generator takes DTOs and returns an
//! ordered bubble sequence for the detail panel. Absent optional fields omit
//! their bubble; the engine itself never fails.

pub mod factor;
pub mod pipeline;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::model::{FactorReading, ImpulseScoreEvent};

// ─── Bubble ───────────────────────────────────────────────────────────────────

/// UI label category of a bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleKind {
    Context,
    Score,
    Factors,
    Decision,
    Response,
    Insight,
}

/// Styling class derived from fixed score thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Neutral,
    Positive,
    Caution,
    Celebrate,
}

/// One unit of generated narrative text. `text` uses paired `**bold**`
/// markers, rendered by [`bold_spans`] rather than a markdown parser.
#[derive(Debug, Clone, Serialize)]
pub struct Bubble {
    /// Stable id: prefix + monotonic index within the sequence.
    pub id: String,
    pub kind: BubbleKind,
    pub text: String,
    pub emphasis: Emphasis,
}

// ─── Shared helpers ───────────────────────────────────────────────────────────

pub(crate) struct TsParts {
    pub day: String,
    pub date: String,
    pub time: String,
}

/// Split an RFC 3339 timestamp into display parts ("Wednesday", "February 25",
/// "7:30 PM"). Unparseable input degrades to the raw string.
pub(crate) fn ts_parts(ts: &str) -> TsParts {
    match DateTime::<FixedOffset>::parse_from_rfc3339(ts) {
        Ok(dt) => TsParts {
            day: dt.format("%A").to_string(),
            date: dt.format("%B %-d").to_string(),
            time: dt.format("%-I:%M %p").to_string(),
        },
        Err(_) => TsParts {
            day: "Unknown".to_string(),
            date: ts.to_string(),
            time: "unknown time".to_string(),
        },
    }
}

pub(crate) fn score_label(s: f64) -> &'static str {
    if s >= 0.7 {
        "very high"
    } else if s >= 0.6 {
        "high"
    } else if s >= 0.45 {
        "moderate"
    } else if s >= 0.35 {
        "mild"
    } else {
        "low"
    }
}

pub(crate) fn score_emphasis(s: f64) -> Emphasis {
    if s >= 0.6 {
        Emphasis::Caution
    } else if s >= 0.35 {
        Emphasis::Neutral
    } else {
        Emphasis::Positive
    }
}

/// Top-N factor readings by weight, descending.
///
/// Non-finite weights are filtered out; the sort is stable, so equal weights
/// keep the map's iteration order.
pub(crate) fn top_factors<'a>(
    factors: &'a std::collections::BTreeMap<String, FactorReading>,
    n: usize,
) -> Vec<(&'a str, &'a FactorReading)> {
    let mut entries: Vec<(&str, &FactorReading)> = factors
        .iter()
        .filter(|(_, r)| r.impulse_weight.is_finite())
        .map(|(k, r)| (k.as_str(), r))
        .collect();
    entries.sort_by(|a, b| b.1.impulse_weight.total_cmp(&a.1.impulse_weight));
    entries.truncate(n);
    entries
}

pub(crate) fn alert_label(alert_type: &str) -> &str {
    match alert_type {
        "impulse_pause" => "impulse pause",
        "gentle_nudge" => "gentle check-in",
        "celebrate" => "celebration",
        "suppress" => "silent suppression",
        other => other,
    }
}

pub(crate) fn alert_explanation(alert_type: &str) -> String {
    match alert_type {
        "impulse_pause" => "Monty stepped in with a full impulse pause — showing a Wait & Win overlay to encourage a 24-hour cool-down before deciding.".to_string(),
        "gentle_nudge" => "Monty sent a gentle check-in — just enough to make them think twice without being heavy-handed.".to_string(),
        "celebrate" => "Everything looked intentional and planned, so Monty celebrated the smart decision! No intervention needed.".to_string(),
        "suppress" => "Monty's memory bank flagged this as a known routine purchase, so the alert was silently suppressed.".to_string(),
        other => format!("Monty decided on: {other}."),
    }
}

fn response_text(resp: Option<&str>) -> (String, Emphasis) {
    match resp {
        Some("waited") => (
            "They **waited** — choosing to sleep on it. That self-control is exactly the habit Monty is helping build.".to_string(),
            Emphasis::Positive,
        ),
        Some("proceeded") => (
            "They went ahead with the purchase. That's okay — each moment is a learning opportunity, and awareness is the first step.".to_string(),
            Emphasis::Neutral,
        ),
        Some("dismissed") => (
            "They dismissed the notification. Monty will keep the gentle approach and try again next time.".to_string(),
            Emphasis::Neutral,
        ),
        _ => (
            "No response was needed — this was a positive, planned purchase.".to_string(),
            Emphasis::Celebrate,
        ),
    }
}

// ─── Single-event narrative ───────────────────────────────────────────────────

/// Bubble sequence for one event, compared against the full event set.
///
/// Order is fixed: context → score → factors (when present) → decision →
/// AI reasoning (when present) → response → comparative insight (when the
/// comparison set has more than one entry).
pub fn single_event(event: &ImpulseScoreEvent, all: &[ImpulseScoreEvent]) -> Vec<Bubble> {
    let parts = ts_parts(&event.timestamp);
    let mut bubbles = Vec::new();
    let mut i = 0usize;

    bubbles.push(Bubble {
        id: format!("ctx-{i}"),
        kind: BubbleKind::Context,
        text: format!(
            "On **{}**, {} at **{}**, a **${:.2} {}** purchase was detected at **{}**.",
            parts.day, parts.date, parts.time, event.amount, event.product_name,
            event.merchant_name,
        ),
        emphasis: Emphasis::Neutral,
    });
    i += 1;

    let score = event.score();
    let label = score_label(score);
    let score_text = if score >= 0.6 {
        format!(
            "This triggered a **{label} impulse score of {score:.2}**. The model thinks this was likely an unplanned, emotionally-driven purchase."
        )
    } else if score >= 0.35 {
        format!(
            "Monty gave this a **{label} impulse score of {score:.2}** — not alarming, but worth keeping an eye on."
        )
    } else {
        format!(
            "This got a **{label} impulse score of {score:.2}** — it looks like a planned, intentional purchase."
        )
    };
    bubbles.push(Bubble {
        id: format!("score-{i}"),
        kind: BubbleKind::Score,
        text: score_text,
        emphasis: score_emphasis(score),
    });
    i += 1;

    if !event.factors.is_empty() {
        let lines: Vec<String> = top_factors(&event.factors, 3)
            .into_iter()
            .map(|(key, reading)| format!("\u{2022} {}", factor::factor_narrative(key, reading)))
            .collect();
        bubbles.push(Bubble {
            id: format!("factors-{i}"),
            kind: BubbleKind::Factors,
            text: format!("**Top contributing factors:**\n{}", lines.join("\n")),
            emphasis: Emphasis::Neutral,
        });
        i += 1;
    }

    let decision_text = match &event.coaching_message {
        Some(msg) if !msg.is_empty() => format!(
            "Monty's decision: **{}**.\n\n\"{msg}\"",
            alert_label(&event.alert_type)
        ),
        _ => format!(
            "Monty's decision: **{}**. {}",
            alert_label(&event.alert_type),
            alert_explanation(&event.alert_type)
        ),
    };
    bubbles.push(Bubble {
        id: format!("decision-{i}"),
        kind: BubbleKind::Decision,
        text: decision_text,
        emphasis: if event.alert_type == "celebrate" {
            Emphasis::Celebrate
        } else if score >= 0.6 {
            Emphasis::Caution
        } else {
            Emphasis::Neutral
        },
    });
    i += 1;

    if let Some(just) = event.ai_justification.as_deref().filter(|j| !j.is_empty()) {
        bubbles.push(Bubble {
            id: format!("ai-{i}"),
            kind: BubbleKind::Insight,
            text: format!("**AI's reasoning:** {just}"),
            emphasis: Emphasis::Neutral,
        });
        i += 1;
    }

    let (resp_text, resp_emphasis) = response_text(event.child_response.as_deref());
    bubbles.push(Bubble {
        id: format!("resp-{i}"),
        kind: BubbleKind::Response,
        text: resp_text,
        emphasis: resp_emphasis,
    });
    i += 1;

    if all.len() > 1 {
        let avg = all.iter().map(|e| e.score()).sum::<f64>() / all.len() as f64;
        let diff = score - avg;
        let comparison = if diff > 0.1 {
            "higher than"
        } else if diff < -0.1 {
            "lower than"
        } else {
            "about the same as"
        };
        bubbles.push(Bubble {
            id: format!("insight-{i}"),
            kind: BubbleKind::Insight,
            text: format!(
                "For context, this score is **{comparison}** the average of **{avg:.2}** across {} tracked events.",
                all.len()
            ),
            emphasis: if diff < -0.1 {
                Emphasis::Positive
            } else if diff > 0.1 {
                Emphasis::Caution
            } else {
                Emphasis::Neutral
            },
        });
    }

    bubbles
}

// ─── Group narrative ──────────────────────────────────────────────────────────

/// Bubble sequence for a named group of events (a heatmap cell, one decision
/// type, one response type). Empty input produces an empty sequence.
pub fn group(events: &[ImpulseScoreEvent], label: &str, context: &str) -> Vec<Bubble> {
    if events.is_empty() {
        return Vec::new();
    }
    let mut bubbles = Vec::new();
    let mut i = 0usize;

    let total: f64 = events.iter().map(|e| e.amount).sum();
    let avg_score = events.iter().map(|e| e.score()).sum::<f64>() / events.len() as f64;
    let high_count = events.iter().filter(|e| e.score() >= 0.6).count();
    let waited_count = events
        .iter()
        .filter(|e| e.child_response.as_deref() == Some("waited"))
        .count();

    bubbles.push(Bubble {
        id: format!("grp-summary-{i}"),
        kind: BubbleKind::Context,
        text: format!(
            "**{label}**: {} purchase{} totaling **${total:.2}**. {context}",
            events.len(),
            if events.len() > 1 { "s" } else { "" },
        ),
        emphasis: Emphasis::Neutral,
    });
    i += 1;

    bubbles.push(Bubble {
        id: format!("grp-pattern-{i}"),
        kind: BubbleKind::Score,
        text: format!(
            "Average impulse score: **{avg_score:.2}** ({}). {}",
            score_label(avg_score),
            if high_count > 0 {
                format!("**{high_count}** flagged as high-impulse.")
            } else {
                "No high-impulse events in this group.".to_string()
            },
        ),
        emphasis: score_emphasis(avg_score),
    });
    i += 1;

    if events.len() > 1 {
        let prompted = events.iter().filter(|e| e.alert_triggered).count();
        let resist_pct = if prompted > 0 {
            ((waited_count as f64 / prompted as f64) * 100.0).round() as u32
        } else {
            100
        };
        bubbles.push(Bubble {
            id: format!("grp-insight-{i}"),
            kind: BubbleKind::Insight,
            text: if waited_count > 0 {
                format!(
                    "Waited on **{waited_count}** out of {prompted} prompted events (**{resist_pct}%** resistance rate)."
                )
            } else {
                "No impulse pauses were triggered in this group.".to_string()
            },
            emphasis: if resist_pct >= 60 {
                Emphasis::Positive
            } else {
                Emphasis::Neutral
            },
        });
    }

    bubbles
}

// ─── Bold-span renderer ───────────────────────────────────────────────────────

/// One rendered segment of bubble text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'a> {
    pub text: &'a str,
    pub bold: bool,
}

/// Split bubble text on paired `**` markers.
///
/// Not a markdown parser: only paired `**` is recognised; an unpaired marker
/// is kept as literal text.
pub fn bold_spans(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("**") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("**") else {
            break;
        };
        if open > 0 {
            spans.push(Span { text: &rest[..open], bold: false });
        }
        spans.push(Span { text: &after[..close], bold: true });
        rest = &after[close + 2..];
    }
    if !rest.is_empty() {
        spans.push(Span { text: rest, bold: false });
    }
    spans
}

// ─── Tests ────────────────────────────────────────────────────────────────────
