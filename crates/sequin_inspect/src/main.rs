// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequin sequence inspector.
//!
//! Loads a sequence document the way the sequencer does (view members
//! materialized, effect times snapped to the timing grid) and prints the
//! timeline rows it flattens to.

mod dump;

use clap::Parser;
use sequin_sequencer::{
    LoadError, SequenceModel, SequencerSettings, SettingsError, ViewRegistry, SETTINGS_FILE_NAME,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "sequin_inspect", version, about = "Print the timeline rows of a sequence")]
struct Args {
    /// Sequence document
    #[arg(long)]
    sequence: PathBuf,

    /// View registry XML (defaults to the one named in the settings)
    #[arg(long)]
    views: Option<PathBuf>,

    /// Settings file (defaults to ./sequencer.ron when present)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Timing grid frequency in Hz
    #[arg(long)]
    frequency: Option<f64>,

    /// Print rows as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, thiserror::Error)]
enum InspectError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Failed to read view registry {path:?}: {source}")]
    Views {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode rows: {0}")]
    Json(#[from] serde_json::Error),
}

fn load_settings(args: &Args) -> Result<SequencerSettings, SettingsError> {
    let mut settings = match &args.settings {
        Some(path) => SequencerSettings::load(path)?,
        None if Path::new(SETTINGS_FILE_NAME).exists() => {
            SequencerSettings::load(Path::new(SETTINGS_FILE_NAME))?
        }
        None => SequencerSettings::default(),
    };
    if let Some(frequency) = args.frequency {
        settings.frequency = frequency;
    }
    Ok(settings)
}

fn load_views(path: Option<&Path>) -> Result<ViewRegistry, InspectError> {
    let Some(path) = path else {
        return Ok(ViewRegistry::new());
    };
    let content = std::fs::read_to_string(path).map_err(|source| InspectError::Views {
        path: path.to_path_buf(),
        source,
    })?;
    let views = ViewRegistry::from_xml_str(&content);
    tracing::debug!("Loaded {} views from {:?}", views.view_count(), path);
    Ok(views)
}

fn run(args: &Args) -> Result<(), InspectError> {
    let settings = load_settings(args)?;
    let views = load_views(args.views.as_deref().or(settings.views_file.as_deref()))?;

    let mut model = SequenceModel::with_views(views);
    let report = model.load_sequence_file(
        &args.sequence,
        settings.grid(),
        &settings.effect_type_table(),
    )?;
    tracing::info!(
        "Loaded {:?}: {} elements, {} effects, {} warnings at {} Hz",
        args.sequence,
        report.elements,
        report.effects,
        report.warnings.len(),
        settings.frequency
    );

    let rows = dump::collect_rows(&mut model);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", dump::render_table(&rows));
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("sequin_inspect=info,sequin_sequencer=info")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting Sequin inspector v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        tracing::error!("Inspection failed: {e}");
        std::process::exit(1);
    }
}
