// SPDX-License-Identifier: MIT
//! Typed REST client for the Monty backend.
//!
//! Thin wrapper over `reqwest` against a fixed base URL. No retries, no
//! caching, no backoff — a failed call is an `Err` the caller handles.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::model::{
    ChatReply, DecisionLog, DismissAlertAck, FamilyList, FamilyOverview, GoalList, InsightList,
    Intention, IntentionSet, LiveFeed, MemoryList, ImpulseScoreEvent, ProactiveNudge, RiskCheck,
    SavingsGoal, SpendingSummary, Streak,
};

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx HTTP response.
    #[error("{method} {path} failed: {status}")]
    Status {
        method: &'static str,
        path: String,
        status: reqwest::StatusCode,
    },
    /// Transport-level failure (connect, timeout, TLS).
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The response body was not the expected JSON shape.
    #[error("decoding response from {path} failed: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

// ─── ApiClient ────────────────────────────────────────────────────────────────

/// HTTP client bound to one backend base URL, e.g. `http://127.0.0.1:8000/api`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client with the given per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { http, base_url })
    }

    /// The base URL this client is bound to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "GET");
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::Transport { path: path.to_string(), source })?;
        if !resp.status().is_success() {
            return Err(ApiError::Status {
                method: "GET",
                path: path.to_string(),
                status: resp.status(),
            });
        }
        resp.json::<T>()
            .await
            .map_err(|source| ApiError::Decode { path: path.to_string(), source })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        debug!(path, "POST");
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport { path: path.to_string(), source })?;
        if !resp.status().is_success() {
            return Err(ApiError::Status {
                method: "POST",
                path: path.to_string(),
                status: resp.status(),
            });
        }
        resp.json::<T>()
            .await
            .map_err(|source| ApiError::Decode { path: path.to_string(), source })
    }

    // ─── Discovery ───────────────────────────────────────────────────────────

    pub async fn families(&self) -> Result<FamilyList, ApiError> {
        self.get("/families").await
    }

    pub async fn family_overview(&self, family_id: &str) -> Result<FamilyOverview, ApiError> {
        self.get(&format!("/family/{family_id}/overview")).await
    }

    // ─── Child data ──────────────────────────────────────────────────────────

    pub async fn child_goals(&self, child_id: &str) -> Result<GoalList, ApiError> {
        self.get(&format!("/child/{child_id}/goals")).await
    }

    pub async fn create_goal(
        &self,
        child_id: &str,
        name: &str,
        target_amount: f64,
        weekly_contribution: f64,
    ) -> Result<SavingsGoal, ApiError> {
        self.post(
            &format!("/child/{child_id}/goals"),
            &serde_json::json!({
                "name": name,
                "target_amount": target_amount,
                "weekly_contribution": weekly_contribution,
            }),
        )
        .await
    }

    pub async fn update_goal(
        &self,
        child_id: &str,
        goal_id: &str,
        updates: &serde_json::Value,
    ) -> Result<SavingsGoal, ApiError> {
        self.post(&format!("/child/{child_id}/goals/{goal_id}"), updates)
            .await
    }

    pub async fn add_money_to_goal(
        &self,
        child_id: &str,
        goal_id: &str,
        amount: f64,
    ) -> Result<SavingsGoal, ApiError> {
        self.post(
            &format!("/child/{child_id}/goals/{goal_id}/add-money"),
            &serde_json::json!({ "amount": amount }),
        )
        .await
    }

    pub async fn child_spending(&self, child_id: &str) -> Result<SpendingSummary, ApiError> {
        self.get(&format!("/child/{child_id}/spending")).await
    }

    pub async fn child_insights(&self, child_id: &str) -> Result<InsightList, ApiError> {
        self.get(&format!("/child/{child_id}/insights")).await
    }

    pub async fn child_streak(&self, child_id: &str) -> Result<Streak, ApiError> {
        self.get(&format!("/child/{child_id}/streak")).await
    }

    pub async fn child_impulse_scores(
        &self,
        child_id: &str,
    ) -> Result<Vec<ImpulseScoreEvent>, ApiError> {
        self.get(&format!("/child/{child_id}/impulse-scores")).await
    }

    pub async fn child_memories(&self, child_id: &str) -> Result<MemoryList, ApiError> {
        self.get(&format!("/child/{child_id}/memories")).await
    }

    pub async fn child_intentions(&self, child_id: &str) -> Result<IntentionSet, ApiError> {
        self.get(&format!("/child/{child_id}/implementation-intentions"))
            .await
    }

    pub async fn create_intention(
        &self,
        child_id: &str,
        trigger_situation: &str,
        planned_action: &str,
    ) -> Result<Intention, ApiError> {
        self.post(
            &format!("/child/{child_id}/implementation-intentions"),
            &serde_json::json!({
                "trigger_situation": trigger_situation,
                "planned_action": planned_action,
            }),
        )
        .await
    }

    /// Incremental feed of new events since the given RFC 3339 cursor.
    pub async fn live_feed(
        &self,
        child_id: &str,
        since: Option<&str>,
    ) -> Result<LiveFeed, ApiError> {
        let path = match since {
            Some(since) => format!(
                "/child/{child_id}/live-feed?since={}",
                urlencode(since)
            ),
            None => format!("/child/{child_id}/live-feed"),
        };
        self.get(&path).await
    }

    // ─── Coaching ────────────────────────────────────────────────────────────

    pub async fn send_chat_message(
        &self,
        child_id: &str,
        message: &str,
        context: Option<&str>,
    ) -> Result<ChatReply, ApiError> {
        self.post(
            "/coaching/chat",
            &serde_json::json!({
                "child_id": child_id,
                "message": message,
                "context": context,
            }),
        )
        .await
    }

    pub async fn proactive_nudge(&self, child_id: &str) -> Result<ProactiveNudge, ApiError> {
        self.get(&format!("/coaching/proactive-nudge/{child_id}"))
            .await
    }

    // ─── Risk / extension ────────────────────────────────────────────────────

    pub async fn check_risk(&self, child_id: &str) -> Result<RiskCheck, ApiError> {
        self.get(&format!("/extension/check-risk?child_id={child_id}"))
            .await
    }

    pub async fn dismiss_alert(&self, alert_id: &str) -> Result<DismissAlertAck, ApiError> {
        self.post(
            &format!("/extension/dismiss-alert?alert_id={alert_id}"),
            &serde_json::json!({}),
        )
        .await
    }

    // ─── Decision pipeline ───────────────────────────────────────────────────

    pub async fn decision_log(&self, child_id: &str) -> Result<DecisionLog, ApiError> {
        self.get(&format!("/flowchart/{child_id}/decision-log"))
            .await
    }
}

/// Percent-encode a query value. Only the characters that can appear in an
/// RFC 3339 timestamp need escaping (`+`, `:`).
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => out.push(c),
            _ => {
                let mut buf = [0u8; 4];
                for b in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("%{b:02X}"));
                }
            }
        }
    }
    out
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let c = ApiClient::new("http://localhost:8000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(c.base_url(), "http://localhost:8000/api");
    }

    #[test]
    fn urlencode_rfc3339_cursor() {
        assert_eq!(
            urlencode("2026-02-25T19:30:00+01:00"),
            "2026-02-25T19%3A30%3A00%2B01%3A00"
        );
        assert_eq!(urlencode("plain-value_1.0~x"), "plain-value_1.0~x");
    }
}
