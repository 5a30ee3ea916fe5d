//! PPH Predictor: postpartum haemorrhage risk screening
//!
//! Main entry point for the command-line application.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pph_predictor::adapters::sanitize::SanitizingMakeWriter;
use pph_predictor::application::AppContext;
use pph_predictor::config::{AppConfig, LogMode};
use pph_predictor::domain::RawInputs;
use pph_predictor::ports::ScoringStrategy;

#[derive(Debug, Parser)]
#[command(
    name = "pph-predictor",
    version,
    about = "Postpartum haemorrhage risk screening",
    long_about = "pph-predictor scores PPH risk from six clinical inputs and keeps a local history.\n\n\
        Commands:\n  \
        predict  Score one patient and store the result\n  \
        list     Show stored predictions, newest first\n  \
        export   Write the history as CSV or PDF\n\n\
        Every option can also be set through PPH_* environment variables."
)]
struct Cli {
    /// SQLite history file [env: PPH_DB_PATH]
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Scoring strategy: rules or model [env: PPH_SCORING]
    #[arg(long, global = true)]
    scoring: Option<ScoringStrategy>,

    /// Model asset used by the model strategy [env: PPH_MODEL_PATH]
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Directory for exported files [env: PPH_EXPORT_DIR]
    #[arg(long, global = true)]
    export_dir: Option<PathBuf>,

    /// Outbox file for replication; sync is off when unset [env: PPH_SYNC_OUTBOX]
    #[arg(long, global = true)]
    sync_outbox: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score one patient and store the result
    Predict(PredictArgs),
    /// List stored predictions, newest first
    List,
    /// Export the prediction history
    #[command(subcommand)]
    Export(ExportFormat),
}

/// Values are taken as typed and validated together.
#[derive(Debug, Args)]
struct PredictArgs {
    /// Age in years
    #[arg(long, default_value = "")]
    age: String,

    /// Number of prior births
    #[arg(long, default_value = "")]
    parity: String,

    /// Delivery mode: 0 vaginal, 1 caesarean
    #[arg(long, default_value = "")]
    mode: String,

    /// Haemoglobin in g/dL
    #[arg(long, default_value = "")]
    hb: String,

    /// Previous PPH: 0 or 1
    #[arg(long, default_value = "")]
    previous_pph: String,

    /// Prolonged labour: 0 or 1
    #[arg(long, default_value = "")]
    prolonged_labor: String,
}

impl From<PredictArgs> for RawInputs {
    fn from(args: PredictArgs) -> Self {
        Self {
            age: args.age,
            parity: args.parity,
            mode: args.mode,
            haemoglobin: args.hb,
            previous_pph: args.previous_pph,
            prolonged_labor: args.prolonged_labor,
        }
    }
}

#[derive(Debug, Subcommand)]
enum ExportFormat {
    /// Write predictions.csv
    Csv,
    /// Write predictions.pdf
    Pdf,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(db) = &self.db {
            config.db_path = db.clone();
        }
        if let Some(scoring) = self.scoring {
            config.scoring = scoring;
        }
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if let Some(dir) = &self.export_dir {
            config.export_dir = dir.clone();
        }
        if let Some(outbox) = &self.sync_outbox {
            config.sync_outbox = Some(outbox.clone());
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    cli.apply(&mut config);

    // stdout carries command output; logs go to stderr or a file.
    let (writer, _guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: a missing directory surfaces as the open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("cannot open log file {:?}", config.log_file))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting PPH predictor...");

    let ctx = AppContext::init(config)?;
    let outcome = run(&ctx, cli.command);
    ctx.shutdown();
    outcome
}

fn run(ctx: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::Predict(args) => {
            let record = ctx.predictions.predict_raw(&RawInputs::from(args))?;
            match record.score {
                Some(score) => println!("{} (probability {score:.3})", record.label),
                None => println!("{}", record.label),
            }
            println!("Stored as prediction {}", record.id);
        }
        Command::List => {
            let history = ctx.predictions.history()?;
            if history.is_empty() {
                println!("No predictions found.");
            }
            for record in &history {
                println!("#{}\n{}\n", record.id, record.summary());
            }
        }
        Command::Export(ExportFormat::Csv) => {
            println!("{}", ctx.exports.export_csv()?.display());
        }
        Command::Export(ExportFormat::Pdf) => {
            println!("{}", ctx.exports.export_pdf()?.display());
        }
    }
    Ok(())
}
