// SPDX-License-Identifier: MIT
//! Dashboard aggregate loader.
//!
//! One `load()` call produces the full snapshot the dashboard renders from:
//! family discovery, the active family's overview, then a parallel fan-out
//! for insights, impulse scores, and risk data. Each fan-out branch degrades
//! independently, so a partial backend outage dims a widget instead of
//! blanking the page.

use std::sync::Arc;

use futures_util::future::join_all;
use thiserror::Error;
use tracing::warn;

use crate::client::{ApiClient, ApiError};
use crate::model::{ChildRef, FamilyOverview, ImpulseScoreEvent, RiskCheck};
use crate::session::Session;
use crate::transform::{insight_views, InsightView};

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend answered but knows no families — the one full-page error.
    #[error("no family data found; seed the backend and retry")]
    NoFamilies,
    #[error(transparent)]
    Api(#[from] ApiError),
}

// ─── Snapshot ─────────────────────────────────────────────────────────────────

/// Everything the dashboard needs for an initial render.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub family_id: String,
    pub children: Vec<ChildRef>,
    pub overview: FamilyOverview,
    /// Insights across all children, flattened.
    pub insights: Vec<InsightView>,
    /// Impulse scores for the first child.
    pub impulse_scores: Vec<ImpulseScoreEvent>,
    /// Risk payload for the first child; `None` when that branch failed.
    pub risk: Option<RiskCheck>,
}

// ─── Provider ─────────────────────────────────────────────────────────────────

pub struct DashboardProvider {
    client: Arc<ApiClient>,
    session: Arc<Session>,
}

impl DashboardProvider {
    pub fn new(client: Arc<ApiClient>, session: Arc<Session>) -> Self {
        Self { client, session }
    }

    /// Full load: discovery → active family → overview → parallel detail
    /// fan-out. Also used as the refetch path after any write.
    pub async fn load(&self) -> Result<DashboardSnapshot, ProviderError> {
        let families = self.client.families().await?.families;
        if families.is_empty() {
            return Err(ProviderError::NoFamilies);
        }

        // Persisted selection wins when it still exists; otherwise first.
        let selected = self.session.selected_family_id();
        let family = selected
            .as_deref()
            .and_then(|id| families.iter().find(|f| f.id == id))
            .unwrap_or(&families[0]);
        let family_id = family.id.clone();

        let overview = self.client.family_overview(&family_id).await?;

        let children: Vec<ChildRef> = if overview.children.is_empty() {
            family.children.clone()
        } else {
            overview
                .children
                .iter()
                .map(|c| ChildRef { id: c.id.clone(), name: c.name.clone(), age: c.age })
                .collect()
        };

        let (insights, impulse_scores, risk) = match overview.children.first() {
            Some(first) => {
                let first_id = first.id.clone();
                tokio::join!(
                    self.all_child_insights(&overview),
                    self.child_scores(&first_id),
                    self.child_risk(&first_id),
                )
            }
            None => (Vec::new(), Vec::new(), None),
        };

        Ok(DashboardSnapshot {
            family_id,
            children,
            overview,
            insights,
            impulse_scores,
            risk,
        })
    }

    /// Insights for every child, flattened. A failed child fetch contributes
    /// nothing rather than failing the set.
    async fn all_child_insights(&self, overview: &FamilyOverview) -> Vec<InsightView> {
        let fetches = overview.children.iter().map(|child| {
            let client = Arc::clone(&self.client);
            async move {
                match client.child_insights(&child.id).await {
                    Ok(list) => insight_views(&list.insights, &child.id, &child.name),
                    Err(e) => {
                        warn!(child = %child.id, "insights fetch failed: {e}");
                        Vec::new()
                    }
                }
            }
        });
        join_all(fetches).await.into_iter().flatten().collect()
    }

    async fn child_scores(&self, child_id: &str) -> Vec<ImpulseScoreEvent> {
        match self.client.child_impulse_scores(child_id).await {
            Ok(scores) => scores,
            Err(e) => {
                warn!(child = %child_id, "impulse scores fetch failed: {e}");
                Vec::new()
            }
        }
    }

    async fn child_risk(&self, child_id: &str) -> Option<RiskCheck> {
        match self.client.check_risk(child_id).await {
            Ok(risk) => Some(risk),
            Err(e) => {
                warn!(child = %child_id, "risk check failed: {e}");
                None
            }
        }
    }
}
