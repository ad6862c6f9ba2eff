// SPDX-License-Identifier: MIT
//! Live-feed poller — incremental delivery of new impulse events.
//!
//! The poller owns its `since` cursor. Each tick fetches the live feed for
//! one child; on success the cursor advances to the poll time and the payload
//! is forwarded, on failure the cursor stays put so the next poll re-covers
//! the window (at-least-once delivery).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use crate::client::{ApiClient, ApiError};
use crate::model::LiveFeed;

// ─── Source trait ─────────────────────────────────────────────────────────────

/// The one backend call the poller needs, behind a trait so tests can fake it.
#[async_trait]
pub trait LiveFeedSource: Send + Sync {
    async fn live_feed(&self, child_id: &str, since: &str) -> Result<LiveFeed, ApiError>;
}

#[async_trait]
impl LiveFeedSource for ApiClient {
    async fn live_feed(&self, child_id: &str, since: &str) -> Result<LiveFeed, ApiError> {
        ApiClient::live_feed(self, child_id, Some(since)).await
    }
}

// ─── Poller ───────────────────────────────────────────────────────────────────

pub struct LiveFeedPoller<S: LiveFeedSource> {
    source: Arc<S>,
    child_id: String,
    interval: Duration,
    cursor: RwLock<DateTime<Utc>>,
}

/// Running poller task. `stop()` (or drop) aborts the loop; an in-flight
/// request is not awaited, only abandoned.
pub struct PollerHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl<S: LiveFeedSource + 'static> LiveFeedPoller<S> {
    /// Cursor starts at "now" — only events after construction are delivered.
    pub fn new(source: Arc<S>, child_id: impl Into<String>, interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            source,
            child_id: child_id.into(),
            interval,
            cursor: RwLock::new(Utc::now()),
        })
    }

    /// The current `since` cursor.
    pub async fn cursor(&self) -> DateTime<Utc> {
        *self.cursor.read().await
    }

    /// One polling pass. Advances the cursor only when the fetch succeeds.
    pub async fn poll_once(&self) -> Option<LiveFeed> {
        let since = { self.cursor.read().await.to_rfc3339() };
        match self.source.live_feed(&self.child_id, &since).await {
            Ok(feed) => {
                *self.cursor.write().await = Utc::now();
                debug!(
                    child = %self.child_id,
                    new_scores = feed.new_impulse_scores.len(),
                    "live feed poll"
                );
                Some(feed)
            }
            Err(e) => {
                warn!(child = %self.child_id, "live feed poll failed: {e}");
                None
            }
        }
    }

    /// Spawn the polling loop. Feeds are sent on the returned channel; the
    /// loop ends when the handle is stopped or the receiver is dropped.
    pub fn spawn(self: Arc<Self>) -> (PollerHandle, mpsc::Receiver<LiveFeed>) {
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Some(feed) = self.poll_once().await {
                    if tx.send(feed).await.is_err() {
                        break;
                    }
                }
            }
        });
        (PollerHandle { handle }, rx)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FlakySource {
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LiveFeedSource for FlakySource {
        async fn live_feed(&self, _child_id: &str, _since: &str) -> Result<LiveFeed, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(ApiError::Status {
                    method: "GET",
                    path: "/child/kid-1/live-feed".to_string(),
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                })
            } else {
                Ok(LiveFeed::default())
            }
        }
    }

    #[tokio::test]
    async fn cursor_advances_only_on_success() {
        let source = Arc::new(FlakySource {
            fail: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        });
        let poller = LiveFeedPoller::new(Arc::clone(&source), "kid-1", Duration::from_secs(30));

        let before = poller.cursor().await;
        assert!(poller.poll_once().await.is_none());
        assert_eq!(poller.cursor().await, before, "failed poll must not advance");

        source.fail.store(false, Ordering::SeqCst);
        assert!(poller.poll_once().await.is_some());
        assert!(poller.cursor().await > before, "successful poll advances");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn spawn_delivers_feeds_and_stop_aborts() {
        let source = Arc::new(FlakySource {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        });
        let poller = LiveFeedPoller::new(Arc::clone(&source), "kid-1", Duration::from_millis(5));
        let (handle, mut rx) = poller.spawn();

        let feed = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("poll within a second")
            .expect("channel open");
        assert!(feed.new_impulse_scores.is_empty());

        handle.stop();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after = source.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), after, "no polls after stop");
    }
}
