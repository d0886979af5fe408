use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use emotional_baseline::import;
use emotional_baseline::report;
use emotional_baseline::{
    AppConfig, BaselineEstimator, BaselinePersonalizationParams, BaselineStore, EmotionAnalysis,
    EnvironmentalContext,
};

#[derive(Parser)]
#[command(name = "emotional-baseline")]
#[command(about = "Personal emotional baselines and normalization", long_about = None)]
struct Cli {
    /// TOML config file (falls back to BASELINE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding stored baselines (falls back to BASELINE_STORE_DIR)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Establish a baseline from CSV samples
    Create {
        #[arg(long)]
        user: String,
        #[arg(long)]
        csv: PathBuf,
        /// Personalization parameters as JSON
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Fold new CSV samples into an existing baseline
    Update {
        #[arg(long)]
        user: String,
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Normalize an analysis JSON document against a stored baseline
    Normalize {
        #[arg(long)]
        user: String,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        setting: Option<String>,
        /// Recent event description, repeatable
        #[arg(long = "event")]
        events: Vec<String>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "baseline-report.md")]
        out: PathBuf,
    },
    /// List users with stored baselines
    List,
}

fn read_params(path: Option<&Path>) -> anyhow::Result<Option<BaselinePersonalizationParams>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read params {}", path.display()))?;
    let params = serde_json::from_str(&content)
        .with_context(|| format!("invalid personalization params in {}", path.display()))?;
    Ok(Some(params))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.config.as_deref())?;
    let store_dir = config.store_dir(cli.store_dir.as_deref());
    let store = BaselineStore::open(&store_dir)
        .with_context(|| format!("failed to open baseline store {}", store_dir.display()))?;
    let estimator = BaselineEstimator::new(config.estimator.clone());

    match cli.command {
        Commands::Create { user, csv, params } => {
            let samples = import::import_csv(&csv, Some(&user))?;
            let params = read_params(params.as_deref())?;
            let baseline = estimator.create_baseline(&user, &samples, params.as_ref())?;
            store.save(&baseline, None)?;
            println!(
                "Baseline created for {} from {} samples (confidence {:.2}).",
                user, baseline.data_point_count, baseline.confidence_score
            );
        }
        Commands::Update { user, csv, params } => {
            let existing = store
                .load(&user)?
                .with_context(|| format!("no baseline stored for {user}"))?;
            let samples = import::import_csv(&csv, Some(&user))?;
            let params = read_params(params.as_deref())?;
            let updated = estimator.update_baseline(&existing, &samples, params.as_ref())?;
            if updated == existing {
                println!("No samples for {user} in {}.", csv.display());
                return Ok(());
            }
            store.save(&updated, Some(existing.updated_at))?;
            println!(
                "Baseline for {} now covers {} samples (confidence {:.2}).",
                user, updated.data_point_count, updated.confidence_score
            );
        }
        Commands::Normalize {
            user,
            input,
            setting,
            events,
        } => {
            let baseline = store
                .load(&user)?
                .with_context(|| format!("no baseline stored for {user}"))?;
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read analysis {}", input.display()))?;
            let analysis: EmotionAnalysis =
                serde_json::from_str(&content).context("invalid analysis document")?;

            let context = (setting.is_some() || !events.is_empty()).then(|| EnvironmentalContext {
                setting,
                time_of_day: None,
                recent_events: events,
            });
            let normalized = estimator.normalize(&analysis, &baseline, context.as_ref())?;
            info!(
                user = %user,
                emotions = normalized.emotions.len(),
                contextual = context.is_some(),
                "normalized analysis"
            );
            eprint!(
                "{}",
                report::build_normalization_summary(&analysis, &normalized)
            );
            println!("{}", serde_json::to_string_pretty(&normalized)?);
        }
        Commands::Report { user, out } => {
            let baseline = store
                .load(&user)?
                .with_context(|| format!("no baseline stored for {user}"))?;
            std::fs::write(&out, report::build_report(&baseline))?;
            println!("Report written to {}.", out.display());
        }
        Commands::List => {
            let users = store.list_users()?;
            if users.is_empty() {
                println!("No baselines stored in {}.", store.dir().display());
                return Ok(());
            }
            for user in users {
                println!("- {user}");
            }
        }
    }

    Ok(())
}
