//! facetrack — operational CLI for the visitor tracking core
//!
//! `replay` feeds a recorded observation stream (one JSON frame per
//! line) through the full pipeline; `stats` and `events` expose the
//! dashboard queries from a terminal.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::Table;
use ft_core::{
	config, AppConfig, FaceTracker, FrameObservations, VisitEventFilter, VisitEventKind, VisitorId,
};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "facetrack", about = "Visitor identity and visit lifecycle tracking")]
struct Cli {
	/// Data directory (defaults to the platform data dir)
	#[arg(long, env = "FACETRACK_DATA_DIR", global = true)]
	data_dir: Option<PathBuf>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Process a recorded observation stream (JSON Lines, one frame per line)
	Replay {
		/// Path of the stream file
		input: PathBuf,

		/// Leave sessions open at end of stream instead of running the
		/// final exit sweep
		#[arg(long)]
		no_final_sweep: bool,
	},

	/// Show visitor and event totals
	Stats,

	/// List visit events
	Events {
		/// Maximum number of events to show
		#[arg(long, default_value_t = 20)]
		limit: usize,

		/// Filter by visitor id (e.g. visitor_0001)
		#[arg(long)]
		visitor: Option<String>,

		/// Filter by event type: entry, re-detection or exit
		#[arg(long)]
		kind: Option<String>,

		/// Only events at or after this RFC 3339 timestamp
		#[arg(long)]
		since: Option<String>,

		/// Only events at or before this RFC 3339 timestamp
		#[arg(long)]
		until: Option<String>,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let data_dir = match &cli.data_dir {
		Some(dir) => dir.clone(),
		None => config::default_data_dir()?,
	};
	let config = AppConfig::load_from(&data_dir)?;
	let _guard = ft_core::init_logging(&config);

	match cli.command {
		Commands::Replay {
			input,
			no_final_sweep,
		} => replay(config, &input, no_final_sweep).await,
		Commands::Stats => stats(config).await,
		Commands::Events {
			limit,
			visitor,
			kind,
			since,
			until,
		} => events(config, limit, visitor, kind, since, until).await,
	}
}

async fn replay(mut config: AppConfig, input: &PathBuf, no_final_sweep: bool) -> Result<()> {
	if no_final_sweep {
		config.lifecycle.final_sweep_on_shutdown = false;
	}

	let stream = fs::read_to_string(input)
		.with_context(|| format!("failed to read stream file {}", input.display()))?;

	let mut tracker = FaceTracker::open(config).await?;
	let mut frames = 0usize;
	let mut emitted = 0usize;

	for (line_number, line) in stream.lines().enumerate() {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}

		let frame: FrameObservations = serde_json::from_str(line)
			.with_context(|| format!("malformed frame on line {}", line_number + 1))?;

		emitted += tracker.process_frame(&frame).await?.len();
		frames += 1;
	}

	emitted += tracker.shutdown(None).await?.len();

	println!(
		"{} {frames} frames, {emitted} events, {} known visitors",
		"Replay complete:".green().bold(),
		tracker.visitor_count()
	);
	Ok(())
}

async fn stats(config: AppConfig) -> Result<()> {
	let tracker = FaceTracker::open(config).await?;
	let log = tracker.visit_log();

	let mut table = Table::new();
	table.set_header(vec!["Metric", "Value"]);
	table.add_row(vec![
		"Registered identities".to_string(),
		tracker.visitor_count().to_string(),
	]);
	table.add_row(vec![
		"Unique visitors logged".to_string(),
		log.unique_visitors().await?.to_string(),
	]);
	table.add_row(vec![
		"Total events".to_string(),
		log.total_events().await?.to_string(),
	]);
	println!("{table}");

	let counts = log.daily_counts(&VisitEventFilter::default()).await?;
	if !counts.is_empty() {
		let mut table = Table::new();
		table.set_header(vec!["Date", "Event", "Count"]);
		for bucket in counts {
			table.add_row(vec![
				bucket.date.to_string(),
				bucket.kind.to_string(),
				bucket.count.to_string(),
			]);
		}
		println!("{table}");
	}

	Ok(())
}

async fn events(
	config: AppConfig,
	limit: usize,
	visitor: Option<String>,
	kind: Option<String>,
	since: Option<String>,
	until: Option<String>,
) -> Result<()> {
	let tracker = FaceTracker::open(config).await?;
	let log = tracker.visit_log();

	let kinds = kind
		.map(|k| {
			VisitEventKind::from_str(&k)
				.map(|kind| vec![kind])
				.map_err(|_| anyhow!("unknown event type {k:?}; expected entry, re-detection or exit"))
		})
		.transpose()?;

	let filter = VisitEventFilter {
		visitor_id: visitor.map(VisitorId::from),
		kinds,
		since: parse_timestamp(since.as_deref())?,
		until: parse_timestamp(until.as_deref())?,
	};

	let has_filters = filter.visitor_id.is_some()
		|| filter.kinds.is_some()
		|| filter.since.is_some()
		|| filter.until.is_some();

	// Unfiltered listings show the newest events, filtered ones the full
	// match in chronological order
	let events = if has_filters {
		let mut events = log.query(&filter).await?;
		events.truncate(limit);
		events
	} else {
		log.recent(limit as u64).await?
	};

	if events.is_empty() {
		println!("{}", "No events found".yellow());
		return Ok(());
	}

	let mut table = Table::new();
	table.set_header(vec!["Timestamp", "Visitor", "Event", "Evidence"]);
	for event in events {
		table.add_row(vec![
			event.timestamp.to_rfc3339(),
			event.visitor_id.to_string(),
			event.kind.to_string(),
			event
				.evidence
				.map(|p| p.display().to_string())
				.unwrap_or_else(|| "-".to_string()),
		]);
	}
	println!("{table}");

	Ok(())
}

fn parse_timestamp(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
	value
		.map(|v| {
			v.parse::<DateTime<Utc>>()
				.map_err(|e| anyhow!("invalid timestamp {v:?}: {e}"))
		})
		.transpose()
}
