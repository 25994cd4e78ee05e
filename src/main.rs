//! Flow labeler entrypoint: label a CSV file once, serve the labeling API, or list the archive.

use clap::{Parser, Subcommand, ValueEnum};
use flow_labeler::{
    config::{LabelerConfig, ScoringMode},
    logging::{BatchLogEvent, StructuredLogger},
    model,
    pipeline::LabelingPipeline,
    record::FlowBatch,
    server::{self, AppState},
    storage::BatchArchive,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "flow-labeler")]
#[command(version, about = "Label network-flow records as NAP, Benign or Malicious")]
struct Cli {
    /// Path to configuration file (falls back to FLOW_LABELER_CONFIG, then config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP labeling service
    Serve {
        /// Listen address, overrides server.bind
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Label one CSV file and write the result
    Label {
        input: PathBuf,
        output: PathBuf,

        /// Scoring strategy, overrides scoring.mode
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// List archived batches, newest first
    Files,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Heuristic,
    Classifier,
}

impl From<ModeArg> for ScoringMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Heuristic => ScoringMode::Heuristic,
            ModeArg::Classifier => ScoringMode::Classifier,
        }
    }
}

fn load_config(cli: &Cli) -> LabelerConfig {
    let path = cli
        .config
        .clone()
        .or_else(|| std::env::var("FLOW_LABELER_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.json"));
    LabelerConfig::load(&path)
}

/// Classifier is only loaded when the configured mode will use it.
fn build_pipeline(config: &LabelerConfig) -> LabelingPipeline {
    let classifier = match config.scoring.mode {
        ScoringMode::Classifier => model::load_classifier(&config.model_path),
        ScoringMode::Heuristic => None,
    };
    LabelingPipeline::new(config, classifier)
}

fn run_label(config: &LabelerConfig, input: &PathBuf, output: &PathBuf) -> Result<(), BoxError> {
    let pipeline = build_pipeline(config);
    if config.scoring.mode == ScoringMode::Classifier && !pipeline.classifier_available() {
        warn!("classifier unavailable; every valid row will be labeled NAP");
    }

    let batch = FlowBatch::from_reader(BufReader::new(File::open(input)?))?;
    let labeled = pipeline.label_batch(batch)?;

    let mut out = BufWriter::new(File::create(output)?);
    labeled.write_csv(&mut out, &config.output.label_column)?;
    out.flush()?;

    let archive_name = if config.archive.enabled {
        let archive = BatchArchive::open(&config.archive.dir)?;
        let entry = archive.store(&labeled.to_csv(&config.output.label_column), &labeled.summary())?;
        info!(dir = %archive.dir().display(), archive = %entry.name, "batch archived");
        Some(entry.name)
    } else {
        None
    };

    let input = input.display().to_string();
    let output = output.display().to_string();
    let mode = match config.scoring.mode {
        ScoringMode::Heuristic => "heuristic",
        ScoringMode::Classifier => "classifier",
    };
    let event = BatchLogEvent {
        ts: chrono::Utc::now().to_rfc3339(),
        input: &input,
        output: &output,
        mode,
        summary: labeled.summary(),
        archive: archive_name.as_deref(),
    };
    StructuredLogger::emit_json(&event, &mut std::io::stdout())?;
    Ok(())
}

fn run_files(config: &LabelerConfig) -> Result<(), BoxError> {
    let archive = BatchArchive::open(&config.archive.dir)?;
    let mut stdout = std::io::stdout();
    for entry in archive.list()? {
        StructuredLogger::emit_json(&entry, &mut stdout)?;
    }
    Ok(())
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let mut config = load_config(&cli);

    StructuredLogger::init(config.log.json, &config.log.level)?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            info!(mode = ?config.scoring.mode, bind = %config.server.bind, "flow labeler starting");

            let pipeline = Arc::new(build_pipeline(&config));
            let archive = if config.archive.enabled {
                let archive = BatchArchive::open(&config.archive.dir)?;
                info!(dir = %archive.dir().display(), "archive ready");
                Some(Arc::new(archive))
            } else {
                None
            };
            let bind = config.server.bind.clone();
            let state = AppState {
                pipeline,
                archive,
                config: Arc::new(config),
            };

            let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
            rt.block_on(server::serve(state, &bind))?;
            info!("flow labeler stopped");
        }
        Commands::Label { input, output, mode } => {
            if let Some(mode) = mode {
                config.scoring.mode = mode.into();
            }
            run_label(&config, &input, &output)?;
        }
        Commands::Files => run_files(&config)?,
    }

    Ok(())
}
