// SPDX-License-Identifier: MIT
//! Per-factor narrative templates.
//!
//! Each known factor has three weight-tier phrasings; unknown keys fall back
//! to the generic label/value/weight template. The tier breakpoints differ
//! per factor (0.6/0.3 for most, 0.4 for memory, 0.5/0.2 for goal impact).

use crate::model::{Factor, FactorReading, ImpulseScoreEvent};

use super::{Bubble, BubbleKind, Emphasis};

/// Display label for a wire key; unknown keys keep the raw key.
pub(crate) fn factor_label(key: &str) -> &str {
    match Factor::from_key(key) {
        Some(f) => f.label(),
        None => key,
    }
}

/// One-line narrative for a single factor reading.
pub(crate) fn factor_narrative(key: &str, reading: &FactorReading) -> String {
    let w = reading.impulse_weight;
    let v = reading.value.as_str();
    let has_value = !v.is_empty();
    // `paren` = " (**value**)" when a value was observed, "" otherwise.
    let paren = if has_value {
        format!(" (**{v}**)")
    } else {
        String::new()
    };
    let colon = if has_value {
        format!(": **{v}**")
    } else {
        String::new()
    };

    match Factor::from_key(key) {
        Some(Factor::AmountVsAverage) => {
            if w >= 0.6 {
                format!("The price{paren} is significantly above their typical spending — a big signal.")
            } else if w >= 0.3 {
                format!("The amount{paren} is in their normal range — not a major flag.")
            } else {
                format!("The amount{paren} is low relative to their usual purchases.")
            }
        }
        Some(Factor::Velocity) => {
            if w >= 0.6 {
                format!("Purchase velocity is high{paren} — rapid-fire spending raises a flag.")
            } else if w >= 0.3 {
                format!("Moderate velocity{paren} — not unusual but worth noting.")
            } else {
                format!("Normal purchase cadence{paren}.")
            }
        }
        Some(Factor::CategoryFrequency) => {
            if w >= 0.6 {
                format!("Category frequency is elevated{paren} — they've been shopping in this category a lot.")
            } else if w >= 0.3 {
                format!("Category frequency is moderate{paren}.")
            } else {
                format!("This category isn't a frequent one for them{paren}.")
            }
        }
        Some(Factor::MemorySuppression) => {
            if w >= 0.4 {
                format!("Memory check{colon} — past behavior shows a pattern here.")
            } else {
                format!("Memory check{colon} — no concerning patterns stored.")
            }
        }
        Some(Factor::TimeOfDay) => {
            if w >= 0.6 {
                format!("Late-night browsing{paren} tends to correlate with more impulsive decisions.")
            } else if w >= 0.3 {
                format!("The time{paren} is slightly elevated for impulse risk.")
            } else {
                format!("The time{paren} is typical — daytime purchases are usually more intentional.")
            }
        }
        Some(Factor::DayOfWeek) => {
            if w >= 0.6 {
                format!("Weekend spending{paren} is a known high-impulse window.")
            } else if w >= 0.3 {
                format!("The day{paren} carries moderate impulse risk.")
            } else {
                format!("The day{paren} is low-risk for impulse spending.")
            }
        }
        Some(Factor::GoalImpact) => {
            if w >= 0.5 {
                format!("This purchase would impact their savings{colon}.")
            } else if w >= 0.2 {
                format!("Small impact on goals{colon}.")
            } else {
                format!("No meaningful goal impact{colon}.")
            }
        }
        None => {
            let tail = if has_value {
                format!(": {v}")
            } else {
                String::new()
            };
            format!("**{}**{tail} (weight {w:.2}).", factor_label(key))
        }
    }
}

/// Longer prose description shown when a radar axis is selected.
fn factor_description(key: &str) -> &'static str {
    match Factor::from_key(key) {
        Some(Factor::AmountVsAverage) => "This factor measures how the purchase amount compares to the child's typical spending. Higher amounts relative to their average signal potential impulse behavior.",
        Some(Factor::Velocity) => "Velocity tracks how quickly purchases are happening. Multiple purchases in a short window is a strong impulse indicator.",
        Some(Factor::CategoryFrequency) => "This measures how often the child shops in this product category. Repeated purchases in the same category (especially entertainment) suggest habitual impulse spending.",
        Some(Factor::MemorySuppression) => "Memory suppression checks Monty's stored observations. If the child has a history of waiting or the parent has flagged certain purchases as routine, this factor adjusts accordingly.",
        Some(Factor::TimeOfDay) => "Time-of-day captures when the purchase happens. Evening and late-night purchases (after 7 PM) consistently show higher impulse rates in behavioral research.",
        Some(Factor::DayOfWeek) => "Day-of-week captures weekly patterns. Weekends (especially Saturday evenings) tend to be peak impulse windows for young spenders.",
        Some(Factor::GoalImpact) => "Goal impact measures how this purchase would affect active savings goals. A $50 purchase when the child is saving for a skateboard is more significant than when no goals are active.",
        None => "This factor contributes to the overall impulse score.",
    }
}

/// Bubble sequence for one factor examined across all events: what the factor
/// is, then the child's observed pattern (omitted when never observed).
pub fn factor(key: &str, all: &[ImpulseScoreEvent]) -> Vec<Bubble> {
    let mut bubbles = Vec::new();
    let mut i = 0usize;
    let label = factor_label(key);
    let share = Factor::from_key(key).map(Factor::share).unwrap_or("?");

    bubbles.push(Bubble {
        id: format!("fac-desc-{i}"),
        kind: BubbleKind::Context,
        text: format!(
            "**{label} Factor** ({share} of composite score)\n\n{}",
            factor_description(key)
        ),
        emphasis: Emphasis::Neutral,
    });
    i += 1;

    let weights: Vec<(f64, &ImpulseScoreEvent)> = all
        .iter()
        .filter_map(|e| {
            e.factors
                .get(key)
                .map(|r| r.impulse_weight)
                .filter(|w| w.is_finite())
                .map(|w| (w, e))
        })
        .collect();

    if !weights.is_empty() {
        let avg = weights.iter().map(|(w, _)| w).sum::<f64>() / weights.len() as f64;
        let (max, max_event) = weights
            .iter()
            .fold((f64::MIN, None), |(best, best_e), (w, e)| {
                if *w > best { (*w, Some(*e)) } else { (best, best_e) }
            });
        let tail = match max_event {
            Some(e) => format!(
                " on a **{}** purchase (${:.2}).",
                e.product_name, e.amount
            ),
            None => ".".to_string(),
        };
        bubbles.push(Bubble {
            id: format!("fac-pattern-{i}"),
            kind: BubbleKind::Score,
            text: format!(
                "Across **{}** events, the **{label}** factor averaged **{avg:.2}**. The highest was **{max:.2}**{tail}",
                weights.len()
            ),
            emphasis: if avg >= 0.5 {
                Emphasis::Caution
            } else if avg >= 0.3 {
                Emphasis::Neutral
            } else {
                Emphasis::Positive
            },
        });
    }

    bubbles
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn reading(value: &str, weight: f64) -> FactorReading {
        FactorReading { value: value.to_string(), impulse_weight: weight }
    }

    #[test]
    fn amount_tiers() {
        assert_eq!(
            factor_narrative("amount_vs_average", &reading("$49.99", 0.8)),
            "The price (**$49.99**) is significantly above their typical spending — a big signal."
        );
        assert_eq!(
            factor_narrative("amount_vs_average", &reading("", 0.4)),
            "The amount is in their normal range — not a major flag."
        );
        assert_eq!(
            factor_narrative("amount_vs_average", &reading("$2.00", 0.1)),
            "The amount (**$2.00**) is low relative to their usual purchases."
        );
    }

    #[test]
    fn memory_uses_single_breakpoint() {
        assert!(factor_narrative("memory_suppression", &reading("2 waits", 0.4))
            .contains("past behavior shows a pattern"));
        assert!(factor_narrative("memory_suppression", &reading("2 waits", 0.39))
            .contains("no concerning patterns stored"));
    }

    #[test]
    fn goal_impact_breakpoints() {
        assert!(factor_narrative("goal_impact", &reading("-2 weeks", 0.5))
            .starts_with("This purchase would impact"));
        assert!(factor_narrative("goal_impact", &reading("-2 weeks", 0.3))
            .starts_with("Small impact on goals"));
        assert!(factor_narrative("goal_impact", &reading("", 0.1))
            .starts_with("No meaningful goal impact"));
    }

    #[test]
    fn unknown_key_generic_template() {
        assert_eq!(
            factor_narrative("moon_phase", &reading("waxing", 0.42)),
            "**moon_phase**: waxing (weight 0.42)."
        );
        assert_eq!(
            factor_narrative("moon_phase", &reading("", 0.42)),
            "**moon_phase** (weight 0.42)."
        );
    }

    #[test]
    fn factor_narrative_description_first() {
        let bubbles = factor("velocity", &[]);
        assert_eq!(bubbles.len(), 1);
        assert!(bubbles[0].text.starts_with("**Velocity Factor** (20% of composite score)"));
    }

    #[test]
    fn factor_pattern_names_max_weight_event() {
        let mut low = ImpulseScoreEvent {
            id: "low".to_string(),
            child_id: "kid-1".to_string(),
            timestamp: "2026-02-24T10:00:00Z".to_string(),
            product_name: "Stickers".to_string(),
            amount: 3.0,
            merchant_name: String::new(),
            merchant_category: String::new(),
            impulse_score: 0.2,
            factors: BTreeMap::new(),
            alert_triggered: false,
            alert_type: String::new(),
            child_response: None,
            coaching_message: None,
            ai_justification: None,
        };
        let mut high = low.clone();
        high.id = "high".to_string();
        high.product_name = "Drone".to_string();
        high.amount = 89.0;
        low.factors.insert("velocity".to_string(), reading("1 in 3d", 0.2));
        high.factors.insert("velocity".to_string(), reading("4 in 1h", 0.8));

        let bubbles = factor("velocity", &[low, high]);
        assert_eq!(bubbles.len(), 2);
        assert!(bubbles[1].text.contains("Across **2** events"));
        // avg 0.5 → caution, max names the Drone purchase.
        assert!(bubbles[1].text.contains("**0.80** on a **Drone** purchase ($89.00)."));
        assert_eq!(bubbles[1].emphasis, Emphasis::Caution);
    }
}
