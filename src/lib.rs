// SPDX-License-Identifier: MIT
//! Monty Insight — dashboard data pipeline for the Monty financial-literacy
//! coach.
//!
//! The pipeline: the typed [`client::ApiClient`] fetches backend DTOs
//! ([`model`]), the pure [`transform`] layer reshapes them into view-models,
//! and the [`narrative`] engine turns impulse events into explanatory chat
//! bubbles. [`provider`] orchestrates the initial fan-out, [`feed`] polls for
//! incremental updates, and [`session`] persists the small bits of client
//! state that survive restarts.

pub mod client;
pub mod config;
pub mod feed;
pub mod model;
pub mod narrative;
pub mod provider;
pub mod session;
pub mod transform;

pub use client::{ApiClient, ApiError};
pub use config::InsightConfig;
pub use provider::{DashboardProvider, DashboardSnapshot, ProviderError};
