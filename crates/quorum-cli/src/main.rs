//! `quorum` CLI: render availability feeds from a JSON snapshot of stored rows.
//!
//! ## Usage
//!
//! ```sh
//! # Render the feed published under a token (stdout)
//! quorum feed -i snapshot.json --token t0k3n --host feeds.example.org
//!
//! # Write to a file, pinning the clock for reproducible output
//! quorum feed -i snapshot.json --token t0k3n --now 2026-03-01T08:00:00Z -o board-games.ics
//!
//! # Refuse feeds of over-quota owners
//! quorum feed -i snapshot.json --token t0k3n --over-quota owner-1,owner-2
//!
//! # Inspect the numbered slots as JSON
//! quorum slots -i snapshot.json --token t0k3n
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use quorum_engine::error::FeedError;
use quorum_engine::pipeline::{compute_slots, generate_feed, FeedRequest, ServingHost};
use quorum_engine::store::{FixedQuota, MemoryStore};
use std::io::{self, Read};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "quorum",
    version,
    about = "Group availability feeds (iCalendar)"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the iCalendar feed for a calendar token
    Feed {
        #[command(flatten)]
        request: RequestArgs,
        /// Host the feed is served from (used in event UIDs)
        #[arg(long, default_value = "localhost")]
        host: String,
        /// Value of an X-Forwarded-Host header, takes priority over --host
        #[arg(long)]
        forwarded_host: Option<String>,
        /// Value of an X-Real-Host header, takes priority over --host
        #[arg(long)]
        real_host: Option<String>,
    },
    /// Print the numbered slots of a calendar as JSON
    Slots {
        #[command(flatten)]
        request: RequestArgs,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// Snapshot JSON file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,
    /// Feed token of the calendar
    #[arg(long)]
    token: String,
    /// Request time as RFC 3339 (defaults to now)
    #[arg(long, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,
    /// Comma-separated owner ids that are over quota
    #[arg(long, value_delimiter = ',')]
    over_quota: Vec<String>,
}

impl RequestArgs {
    fn load_store(&self) -> Result<MemoryStore> {
        let json = read_input(self.input.as_deref())?;
        MemoryStore::from_json(&json).context("Failed to parse calendar snapshot")
    }

    fn quota(&self) -> FixedQuota {
        FixedQuota::new(self.over_quota.iter().map(|o| o.trim()).filter(|o| !o.is_empty()))
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Feed {
            request,
            host,
            forwarded_host,
            real_host,
        } => {
            let store = request.load_store()?;
            let feed_request = FeedRequest {
                token: request.token.clone(),
                host: ServingHost::resolve(forwarded_host.as_deref(), real_host.as_deref(), &host),
                now: request.now(),
            };

            let response = generate_feed(&store, &request.quota(), &feed_request)
                .map_err(refused)?;
            info!(
                filename = %response.filename,
                events = response.event_count,
                "feed ready"
            );
            write_output(request.output.as_deref(), &response.body)?;
        }
        Commands::Slots { request } => {
            let store = request.load_store()?;
            let report = compute_slots(&store, &request.quota(), &request.token, request.now())
                .map_err(refused)?;
            let mut json = serde_json::to_string_pretty(&report)?;
            json.push('\n');
            write_output(request.output.as_deref(), &json)?;
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_now(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

/// Attach the HTTP status a server would answer with.
fn refused(err: FeedError) -> anyhow::Error {
    let status = err.status_code();
    anyhow::Error::new(err).context(format!("Feed request failed with status {}", status))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
