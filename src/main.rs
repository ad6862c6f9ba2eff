// SPDX-License-Identifier: MIT
//! `monty-insight` CLI — exercise the dashboard pipeline against a backend.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use monty_insight::feed::LiveFeedPoller;
use monty_insight::narrative::{self, Bubble};
use monty_insight::session::{FileStore, Session};
use monty_insight::transform::{
    self, factors::aggregate_impulse_factors, patterns,
};
use monty_insight::{ApiClient, DashboardProvider, InsightConfig};

#[derive(Parser)]
#[command(
    name = "monty-insight",
    about = "Monty Insight — dashboard data pipeline CLI",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Backend base URL, e.g. http://127.0.0.1:8000/api
    #[arg(long, env = "MONTY_API_URL")]
    api_url: Option<String>,

    /// Data directory for config and the session store
    #[arg(long, env = "MONTY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MONTY_LOG")]
    log: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Load the full dashboard snapshot and print family rollups
    Overview,
    /// Print the score timeline and decision distribution for a child
    Events { child_id: String },
    /// Narrate the latest (or a named) impulse event for a child
    Explain {
        child_id: String,
        /// Event id; defaults to the most recent event
        #[arg(long)]
        event: Option<String>,
    },
    /// Poll the live feed until interrupted
    Watch { child_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = InsightConfig::load(args.data_dir);
    if let Some(api_url) = args.api_url {
        config.api_base_url = api_url;
    }
    if let Some(log) = args.log {
        config.log = log;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log.clone())),
        )
        .init();

    let client = Arc::new(
        ApiClient::new(config.api_base_url.clone(), config.request_timeout())
            .context("building HTTP client")?,
    );
    let session = Arc::new(Session::new(Box::new(FileStore::open(
        config.session_store_path(),
    ))));

    match args.command {
        Command::Overview => overview(client, session).await,
        Command::Events { child_id } => events(client, &child_id).await,
        Command::Explain { child_id, event } => explain(client, &child_id, event.as_deref()).await,
        Command::Watch { child_id } => watch(client, &child_id, &config).await,
    }
}

async fn overview(client: Arc<ApiClient>, session: Arc<Session>) -> Result<()> {
    let provider = DashboardProvider::new(client, session);
    let snapshot = provider.load().await.context("loading dashboard data")?;

    println!("Family {}", snapshot.family_id);
    for child in &snapshot.overview.children {
        let habit = transform::habit_view(&child.habit_score);
        println!(
            "  {} (age {}) — habit score {:.0} ({})",
            child.name, child.age, habit.score, habit.label
        );
        for goal in &child.goals {
            let view = transform::overview_goal_view(goal, &child.id, &child.name, "fox");
            println!(
                "    {} {} — ${:.2} of ${:.2} [{}]",
                view.emoji,
                view.name,
                view.current_amount,
                view.target_amount,
                serde_json::to_string(&view.status)?.trim_matches('"'),
            );
        }
    }
    println!("{} insights, {} impulse events", snapshot.insights.len(), snapshot.impulse_scores.len());
    Ok(())
}

async fn events(client: Arc<ApiClient>, child_id: &str) -> Result<()> {
    let scores = client
        .child_impulse_scores(child_id)
        .await
        .context("fetching impulse scores")?;

    println!("Timeline:");
    for point in patterns::score_timeline(&scores) {
        println!(
            "  {}  {:.2}  {} (${:.2})",
            point.date, point.score, point.product, point.amount
        );
    }

    let dist = patterns::decision_distribution(&scores);
    println!("\nDecisions ({} total):", dist.total_decisions);
    for slice in &dist.outcomes {
        println!("  {:<18} {}", slice.name, slice.value);
    }
    println!("Responses:");
    for slice in &dist.responses {
        println!("  {:<18} {}", slice.name, slice.value);
    }

    let agg = aggregate_impulse_factors(&scores);
    println!("\nFactor averages:");
    for point in &agg.radar {
        println!("  {:<12} {:.2}", point.label, point.avg_weight);
    }
    Ok(())
}

async fn explain(client: Arc<ApiClient>, child_id: &str, event_id: Option<&str>) -> Result<()> {
    let scores = client
        .child_impulse_scores(child_id)
        .await
        .context("fetching impulse scores")?;
    let event = match event_id {
        Some(id) => scores
            .iter()
            .find(|e| e.id == id)
            .with_context(|| format!("no event with id {id}"))?,
        None => scores.first().context("child has no impulse events")?,
    };

    for bubble in narrative::single_event(event, &scores) {
        print_bubble(&bubble);
    }
    Ok(())
}

fn print_bubble(bubble: &Bubble) {
    // Render **bold** as terminal bold.
    let mut line = String::new();
    for span in narrative::bold_spans(&bubble.text) {
        if span.bold {
            line.push_str("\x1b[1m");
            line.push_str(span.text);
            line.push_str("\x1b[0m");
        } else {
            line.push_str(span.text);
        }
    }
    println!("{line}\n");
}

async fn watch(client: Arc<ApiClient>, child_id: &str, config: &InsightConfig) -> Result<()> {
    info!(child = child_id, "watching live feed (Ctrl-C to stop)");
    let poller = LiveFeedPoller::new(client, child_id, config.live_feed_interval());
    let (handle, mut rx) = poller.spawn();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(feed) = rx.recv() => {
                for event in &feed.new_impulse_scores {
                    println!(
                        "new event: {} ${:.2} at {} (score {:.2})",
                        event.product_name, event.amount, event.merchant_name, event.score()
                    );
                }
                if feed.should_wait {
                    println!(
                        "wait prompt: {}",
                        feed.wait_message.as_deref().unwrap_or("take a moment")
                    );
                }
            }
        }
    }
    handle.stop();
    Ok(())
}
