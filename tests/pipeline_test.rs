//! End-to-end pipeline tests: backend JSON → transforms → narrative.

use monty_insight::model::ImpulseScoreEvent;
use monty_insight::narrative;
use monty_insight::transform::patterns::{decision_distribution, score_timeline, time_patterns};
use monty_insight::transform::{goal_status, goal_view, GoalStatus};

fn sample_events() -> Vec<ImpulseScoreEvent> {
    // Three events, deliberately out of timestamp order, scores [0.8, 0.3, 0.5].
    serde_json::from_value(serde_json::json!([
        {
            "id": "evt-c",
            "child_id": "kid-1",
            "timestamp": "2026-02-27T20:15:00-05:00",
            "product_name": "Hoodie",
            "amount": 35.00,
            "merchant_name": "StreetWear",
            "merchant_category": "clothing",
            "impulse_score": 0.5,
            "alert_triggered": true,
            "alert_type": "gentle_nudge",
            "child_response": null
        },
        {
            "id": "evt-a",
            "child_id": "kid-1",
            "timestamp": "2026-02-25T19:30:00-05:00",
            "product_name": "Wireless Earbuds",
            "amount": 49.99,
            "merchant_name": "Amazon",
            "merchant_category": "electronics",
            "impulse_score": 0.8,
            "factors": {
                "velocity": { "value": "3 in 1h", "impulse_weight": 0.7 },
                "time_of_day": { "value": "7:30 PM", "impulse_weight": 0.65 },
                "amount_vs_average": { "value": "$49.99", "impulse_weight": 0.8 }
            },
            "alert_triggered": true,
            "alert_type": "impulse_pause",
            "child_response": "waited"
        },
        {
            "id": "evt-b",
            "child_id": "kid-1",
            "timestamp": "2026-02-26T09:00:00-05:00",
            "product_name": "Sketchbook",
            "amount": 8.50,
            "merchant_name": "ArtShop",
            "merchant_category": "hobby",
            "impulse_score": 0.3,
            "alert_triggered": false,
            "alert_type": "celebrate",
            "child_response": null
        }
    ]))
    .unwrap()
}

#[test]
fn timeline_sorted_by_timestamp_and_rounded() {
    let events = sample_events();
    let timeline = score_timeline(&events);
    let ids: Vec<&str> = timeline.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["evt-a", "evt-b", "evt-c"]);
    let scores: Vec<f64> = timeline.iter().map(|p| p.score).collect();
    assert_eq!(scores, [0.8, 0.3, 0.5]);
    assert_eq!(timeline[0].date, "Feb 25");
}

#[test]
fn group_narrative_reports_sum_and_mean() {
    let events = sample_events();
    let bubbles = narrative::group(&events, "This Week", "All events this week.");
    assert!(bubbles[0].text.contains("3 purchases totaling **$93.49**"));
    // (0.8 + 0.3 + 0.5) / 3 = 0.5333… → displayed as 0.53.
    assert!(bubbles[1].text.contains("Average impulse score: **0.53**"));
}

#[test]
fn single_event_narrative_from_wire_json() {
    let events = sample_events();
    let earbuds = events.iter().find(|e| e.id == "evt-a").unwrap();
    let bubbles = narrative::single_event(earbuds, &events);

    // Fixed order: context, score, factors, decision, response, insight.
    use monty_insight::narrative::BubbleKind::*;
    let kinds: Vec<_> = bubbles.iter().map(|b| b.kind).collect();
    assert_eq!(kinds, vec![Context, Score, Factors, Decision, Response, Insight]);

    // Top factor is amount_vs_average (0.8) and renders its high-tier line.
    let factors = &bubbles[2];
    assert!(factors.text.contains("significantly above their typical spending"));

    // 0.8 vs mean 0.533 → higher than, caution.
    let insight = bubbles.last().unwrap();
    assert!(insight.text.contains("**higher than**"));
}

#[test]
fn distribution_counts_all_three_events() {
    let events = sample_events();
    let dist = decision_distribution(&events);
    assert_eq!(dist.total_decisions, 3);
    let outcome_total: u32 = dist.outcomes.iter().map(|s| s.value).sum();
    assert_eq!(outcome_total, 3);
    let responses: u32 = dist.responses.iter().map(|s| s.value).sum();
    assert_eq!(responses, 3);
    // Two events had no response → sentinel bucket.
    let pending = dist
        .responses
        .iter()
        .find(|s| s.raw_key == "no_response")
        .unwrap();
    assert_eq!(pending.value, 2);
}

#[test]
fn heatmap_places_all_events_in_local_time_cells() {
    let events = sample_events();
    let grid = time_patterns(&events);
    assert_eq!(grid.len(), 35);
    let total: u32 = grid.iter().map(|c| c.count).sum();
    assert_eq!(total, 3);
    // evt-a: Wed 19:30 local → Wed/Evening.
    let wed_evening = grid
        .iter()
        .find(|c| c.day == "Wed" && c.time_slot == "Evening")
        .unwrap();
    assert_eq!(wed_evening.count, 1);
    assert_eq!(wed_evening.avg_score, 0.8);
    // evt-b: Thu 09:00 local → Thu/Morning.
    let thu_morning = grid
        .iter()
        .find(|c| c.day == "Thu" && c.time_slot == "Morning")
        .unwrap();
    assert_eq!(thu_morning.count, 1);
}

#[test]
fn goal_roundtrip_status_parity() {
    let goal: monty_insight::model::SavingsGoal = serde_json::from_value(serde_json::json!({
        "id": "goal-1",
        "child_id": "kid-1",
        "name": "Gaming Fund",
        "target_amount": 200.0,
        "current_amount": 90.0,
        "weekly_contribution": 15.0,
        "created_at": "2026-01-01T00:00:00Z"
    }))
    .unwrap();

    let raw_status = goal_status(goal.current_amount, goal.target_amount);
    let view = goal_view(&goal, "Maya", "fox");
    assert_eq!(view.status, raw_status);
    assert_eq!(
        goal_status(view.current_amount, view.target_amount),
        raw_status
    );
    assert_eq!(raw_status, GoalStatus::OnTrack);
}
