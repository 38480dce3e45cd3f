//! Structured logging setup
//!
//! The planner and consumer crates emit `tracing` events (`debug` for plans
//! and dispatches, `trace` for tile refinement). This module installs a
//! `tracing-subscriber` that renders them.
//!
//! # Example
//!
//! ```ignore
//! use ubtile::tracing_support::{init_tracing, TracingConfig, TracingFormat};
//!
//! init_tracing(
//!     TracingConfig::default()
//!         .with_format(TracingFormat::Json)
//!         .with_filter("ubtile_planner=trace,warn"),
//! )?;
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directive (e.g. `RUST_LOG=ubtile_planner=debug`)
//! - `UBTILE_LOG_FORMAT`: output format (`json`, `compact` or `pretty`, default: `pretty`)

use anyhow::Result;
use ubtile_exec::DispatchReport;
use ubtile_planner::PlanRecord;

#[cfg(feature = "tracing")]
use anyhow::Context;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "UBTILE_LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "ubtile_core=info,ubtile_planner=info,ubtile_exec=info,warn";

/// Tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Multi-line human-readable output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
    /// Single line per event
    Compact,
}

impl TracingFormat {
    /// Parse a format name; unknown names fall back to [`TracingFormat::Pretty`]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => TracingFormat::Json,
            "compact" => TracingFormat::Compact,
            _ => TracingFormat::Pretty,
        }
    }
}

/// Subscriber configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    pub format: TracingFormat,
    /// `EnvFilter` directive
    pub filter: String,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_file: bool,
    pub with_line_number: bool,
}

impl Default for TracingConfig {
    /// Reads `UBTILE_LOG_FORMAT` and `RUST_LOG`
    fn default() -> Self {
        let format = std::env::var(LOG_FORMAT_ENV)
            .map(|s| TracingFormat::parse(&s))
            .unwrap_or_default();
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());

        Self {
            format,
            filter,
            with_ansi: true,
            with_target: true,
            // consumer workers run on a thread pool
            with_thread_ids: true,
            with_file: false,
            with_line_number: false,
        }
    }
}

impl TracingConfig {
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.with_ansi = ansi;
        self
    }

    pub fn with_source_location(mut self, enable: bool) -> Self {
        self.with_file = enable;
        self.with_line_number = enable;
        self
    }
}

/// Install the global subscriber.
///
/// Call once at startup; a second call fails because a global subscriber is
/// already set.
///
/// # Errors
///
/// Fails on an invalid filter directive or when a subscriber is already set.
#[cfg(feature = "tracing")]
pub fn init_tracing(config: TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("invalid filter directive {:?}", config.filter))?;

    let base = fmt::layer()
        .with_target(config.with_target)
        .with_thread_ids(config.with_thread_ids)
        .with_file(config.with_file)
        .with_line_number(config.with_line_number);

    let layer = match config.format {
        TracingFormat::Pretty => base.pretty().with_ansi(config.with_ansi).boxed(),
        TracingFormat::Json => base.json().boxed(),
        TracingFormat::Compact => base.compact().with_ansi(config.with_ansi).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .context("global tracing subscriber already set")?;

    Ok(())
}

/// No-op without the `tracing` feature
#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_config: TracingConfig) -> Result<()> {
    Ok(())
}

/// Emit one `info` event summarizing a plan record
pub fn record_plan(record: &PlanRecord) {
    tracing::info!(
        variant = %record.variant,
        tiling_key = record.tiling_key,
        workspace_bytes = record.workspace_bytes,
        total_elements = record.plan.total_elements,
        used_workers = record.plan.used_workers,
        tile_elems = record.plan.tile_elems,
        "plan_record"
    );
}

/// Emit one `info` event summarizing a dispatch
pub fn record_dispatch(report: &DispatchReport) {
    tracing::info!(
        used_workers = report.used_workers,
        tiles = report.tiles,
        elements = report.elements,
        parallel = report.parallel,
        "dispatch_report"
    );
}
