//! Log setup plus one-line JSON summaries for CLI runs.

use crate::record::LabelSummary;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::EnvFilter;

type InitError = Box<dyn std::error::Error + Send + Sync>;

/// Summary line for one labeled batch (ndjson). Counts sit at the top level.
#[derive(Serialize)]
pub struct BatchLogEvent<'a> {
    pub ts: String,
    pub input: &'a str,
    pub output: &'a str,
    pub mode: &'a str,
    #[serde(flatten)]
    pub summary: LabelSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<&'a str>,
}

pub struct StructuredLogger;

impl StructuredLogger {
    /// Diagnostics go to stderr so stdout stays free for CSV and summary lines.
    /// `RUST_LOG` overrides `default_level`. Fails if a subscriber is already installed.
    pub fn init(json: bool, default_level: &str) -> Result<(), InitError> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        if json {
            builder
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .try_init()
        } else {
            builder.with_target(false).try_init()
        }
    }

    /// One JSON object and a newline.
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        serde_json::to_writer(&mut *w, event)?;
        w.write_all(b"\n")
    }
}
