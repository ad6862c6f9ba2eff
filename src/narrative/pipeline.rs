// SPDX-License-Identifier: MIT
//! Decision-pipeline stage narratives for the flowchart panel.

use crate::model::{DecisionLogEntry, ImpulseScoreEvent};

use super::{
    alert_explanation, alert_label, factor::factor_label, score_emphasis, score_label,
    top_factors, ts_parts, Bubble, BubbleKind, Emphasis,
};

/// Fixed explanation of a pipeline stage; unknown ids get the generic line.
fn node_explanation(node_id: &str) -> String {
    match node_id {
        "detect" => "**Detection Stage** — When a purchase event comes in from the bank API, Monty immediately identifies the product, merchant, amount, and category. This is the raw input before any analysis begins.".to_string(),
        "memory" => "**Memory Check** — Monty checks its memory bank for context. Has the parent flagged purchases at this merchant as routine? Is there a pattern of waiting on similar items? Past behavior shapes how aggressively Monty intervenes.".to_string(),
        "score" => "**Impulse Scoring** — This is where the math happens. Monty evaluates 7 different behavioral factors — amount, velocity, category, memory, time, day, and goal impact — each weighted by importance, to compute a composite impulse score between 0 and 1.".to_string(),
        "goal" => "**Goal Impact Check** — Monty assesses how this purchase would affect active savings goals. Would buying this set back the Skateboard Fund by weeks? Goal-aligned purchases (like buying skateboard parts) get a pass.".to_string(),
        "decision" => "**Decision Engine** — Based on the composite score and goal impact, Monty decides what action to take: a full impulse pause (score > 0.6), a gentle nudge (0.35-0.6), a celebration (< 0.35), or silent suppression for known routines.".to_string(),
        "action" => "**Action Delivery** — Finally, Monty delivers the intervention. For impulse pauses, it's a full-screen Wait & Win overlay. For gentle nudges, a brief check-in. For celebrations, positive reinforcement. The coaching message is personalized to the specific purchase and the child's history.".to_string(),
        other => format!("This is the **{other}** stage of Monty's decision pipeline."),
    }
}

/// Bubble sequence for one flowchart node, anchored to the latest event and
/// (optionally) its decision-log record.
pub fn pipeline_stage(
    node_id: &str,
    event: &ImpulseScoreEvent,
    decision_log: Option<&DecisionLogEntry>,
) -> Vec<Bubble> {
    let mut bubbles = vec![Bubble {
        id: "node-explain-0".to_string(),
        kind: BubbleKind::Context,
        text: node_explanation(node_id),
        emphasis: Emphasis::Neutral,
    }];
    let mut i = 1usize;

    match node_id {
        "detect" => {
            let parts = ts_parts(&event.timestamp);
            bubbles.push(Bubble {
                id: format!("node-detail-{i}"),
                kind: BubbleKind::Context,
                text: format!(
                    "For the latest event: a **${:.2} {}** at **{}** was detected on {}, {} at {}.",
                    event.amount, event.product_name, event.merchant_name,
                    parts.day, parts.date, parts.time,
                ),
                emphasis: Emphasis::Neutral,
            });
        }
        "score" => {
            let score = event.score();
            bubbles.push(Bubble {
                id: format!("node-detail-{i}"),
                kind: BubbleKind::Score,
                text: format!(
                    "The composite score came out to **{score:.2}** ({}).",
                    score_label(score)
                ),
                emphasis: score_emphasis(score),
            });
            i += 1;
            if !event.factors.is_empty() {
                let lines: Vec<String> = top_factors(&event.factors, 3)
                    .into_iter()
                    .map(|(key, reading)| {
                        format!(
                            "\u{2022} **{}**: {:.2} — {}",
                            factor_label(key),
                            reading.impulse_weight,
                            reading.value,
                        )
                    })
                    .collect();
                bubbles.push(Bubble {
                    id: format!("node-factors-{i}"),
                    kind: BubbleKind::Factors,
                    text: format!("Top contributing factors:\n{}", lines.join("\n")),
                    emphasis: Emphasis::Neutral,
                });
            }
        }
        "decision" => {
            bubbles.push(Bubble {
                id: format!("node-detail-{i}"),
                kind: BubbleKind::Decision,
                text: format!(
                    "Monty chose: **{}**. {}",
                    alert_label(&event.alert_type),
                    alert_explanation(&event.alert_type)
                ),
                emphasis: if event.alert_type == "celebrate" {
                    Emphasis::Celebrate
                } else {
                    Emphasis::Neutral
                },
            });
        }
        "action" => {
            if let Some(msg) = decision_log
                .and_then(|d| d.coaching_message.as_deref())
                .filter(|m| !m.is_empty())
            {
                bubbles.push(Bubble {
                    id: format!("node-detail-{i}"),
                    kind: BubbleKind::Decision,
                    text: format!("Coaching message delivered:\n\n\"{msg}\""),
                    emphasis: Emphasis::Neutral,
                });
            }
        }
        "memory" => {
            if let Some(just) = decision_log
                .and_then(|d| d.ai_justification.as_deref())
                .filter(|j| !j.is_empty())
            {
                bubbles.push(Bubble {
                    id: format!("node-detail-{i}"),
                    kind: BubbleKind::Insight,
                    text: format!("AI justification: {just}"),
                    emphasis: Emphasis::Neutral,
                });
            }
        }
        _ => {}
    }

    bubbles
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FactorReading;
    use std::collections::BTreeMap;

    fn event() -> ImpulseScoreEvent {
        let mut factors = BTreeMap::new();
        factors.insert(
            "velocity".to_string(),
            FactorReading { value: "3 in 1h".to_string(), impulse_weight: 0.7 },
        );
        ImpulseScoreEvent {
            id: "evt-1".to_string(),
            child_id: "kid-1".to_string(),
            timestamp: "2026-02-25T19:30:00-05:00".to_string(),
            product_name: "Wireless Earbuds".to_string(),
            amount: 49.99,
            merchant_name: "Amazon".to_string(),
            merchant_category: "electronics".to_string(),
            impulse_score: 0.72,
            factors,
            alert_triggered: true,
            alert_type: "impulse_pause".to_string(),
            child_response: None,
            coaching_message: None,
            ai_justification: None,
        }
    }

    fn log() -> DecisionLogEntry {
        DecisionLogEntry {
            id: "dl-1".to_string(),
            timestamp: "2026-02-25T19:30:05-05:00".to_string(),
            trigger: "Amazon purchase".to_string(),
            impulse_score: Some(0.72),
            decision: "impulse_pause".to_string(),
            coaching_message: Some("Your Skateboard Fund says hi.".to_string()),
            ai_justification: Some("Two similar purchases this week.".to_string()),
            child_response: None,
            factors: None,
            pipeline_nodes: None,
            pipeline_edges: None,
        }
    }

    #[test]
    fn explanation_always_first() {
        for node in ["detect", "memory", "score", "goal", "decision", "action"] {
            let bubbles = pipeline_stage(node, &event(), None);
            assert_eq!(bubbles[0].id, "node-explain-0");
            assert_eq!(bubbles[0].kind, BubbleKind::Context);
        }
    }

    #[test]
    fn score_node_adds_composite_and_factors() {
        let bubbles = pipeline_stage("score", &event(), None);
        assert_eq!(bubbles.len(), 3);
        assert!(bubbles[1].text.contains("**0.72** (very high)"));
        assert_eq!(bubbles[1].emphasis, Emphasis::Caution);
        assert!(bubbles[2].text.contains("**Velocity**: 0.70 — 3 in 1h"));
    }

    #[test]
    fn action_node_needs_a_logged_message() {
        assert_eq!(pipeline_stage("action", &event(), None).len(), 1);
        let bubbles = pipeline_stage("action", &event(), Some(&log()));
        assert_eq!(bubbles.len(), 2);
        assert!(bubbles[1].text.contains("\"Your Skateboard Fund says hi.\""));
    }

    #[test]
    fn memory_node_surfaces_justification() {
        let bubbles = pipeline_stage("memory", &event(), Some(&log()));
        assert!(bubbles[1].text.starts_with("AI justification:"));
    }

    #[test]
    fn unknown_node_gets_generic_explanation() {
        let bubbles = pipeline_stage("quantum", &event(), None);
        assert_eq!(bubbles.len(), 1);
        assert!(bubbles[0].text.contains("**quantum** stage"));
    }
}
