use std::{env, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flukematch::{
    batch::{self, Query},
    config, storage, FeatureVector, Reduction, Scorer,
};
use log::info;

#[derive(Parser)]
#[command(name = "flukematch")]
#[command(version, about = "Identify individuals from fluke trailing-edge curvature")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a curvature feature file under an identity
    Enroll {
        /// Identity (individual) the features belong to
        #[arg(short, long)]
        identity: String,
        /// Item label for this annotation (defaults to a random UUID)
        #[arg(long)]
        item: Option<String>,
        /// JSON feature file: {"buckets": [[...], ...]}
        features: PathBuf,
    },
    /// Rank enrolled identities against one or more query feature files
    Identify {
        /// Number of identities and candidates to show (overrides config)
        #[arg(short, long)]
        top: Option<usize>,
        /// Decision function for combining an identity's scores (overrides config)
        #[arg(short, long)]
        decision: Option<Reduction>,
        #[arg(required = true)]
        features: Vec<PathBuf>,
    },
    /// Remove all enrolled features of an identity
    Purge {
        #[arg(short, long)]
        identity: String,
    },
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(None)?;

    match cli.command {
        Commands::Enroll {
            identity,
            item,
            features,
        } => enroll(&cfg, &identity, item, &features),
        Commands::Identify {
            top,
            decision,
            features,
        } => identify(&cfg, top, decision, &features),
        Commands::Purge { identity } => purge(&cfg, &identity),
        Commands::Config => open_config(),
    }
}

fn read_features(path: &Path) -> Result<FeatureVector> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading features {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing features {}", path.display()))
}

fn enroll(cfg: &config::Config, identity: &str, item: Option<String>, path: &Path) -> Result<()> {
    let features = read_features(path)?;
    let expected = cfg.matching.sizes.len();
    if features.bucket_count() != expected {
        anyhow::bail!(
            "{} has {} buckets, configured sizes {:?} need {}",
            path.display(),
            features.bucket_count(),
            cfg.matching.sizes,
            expected
        );
    }

    let item = item.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    info!("Enrolling {} as {}", item, identity);

    let record = storage::FeatureRecord {
        item: item.clone(),
        features,
    };
    storage::save_record(cfg.store_prefix(), identity, record)
        .context("Failed to save feature record")?;

    info!("✓ {} enrolled for {}", item, identity);
    Ok(())
}

fn identify(
    cfg: &config::Config,
    top: Option<usize>,
    decision: Option<Reduction>,
    paths: &[PathBuf],
) -> Result<()> {
    let mut matching = cfg.matching.clone();
    if let Some(d) = decision {
        matching.decision = d;
    }
    let top = top.unwrap_or(cfg.top);

    let candidates =
        storage::load_candidates(cfg.store_prefix()).context("Failed to load feature store")?;
    if candidates.is_empty() {
        anyhow::bail!(
            "No enrolled features in {}. Run 'enroll' first.",
            cfg.store_prefix().display()
        );
    }
    info!("Loaded {} enrolled candidate(s)", candidates.len());

    let queries = paths
        .iter()
        .map(|p| -> Result<Query> {
            Ok(Query {
                item: p
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| p.display().to_string()),
                identity: None,
                features: read_features(p)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let scorer = Scorer::from_config(&matching)?;
    let matches = batch::identify_all(&scorer, &queries, &candidates, None, matching.verbose)?;

    for m in &matches {
        info!("Query {}:", m.query_item);
        for (rank, (identity, score)) in m.outcome.ranked_identities().iter().take(top).enumerate() {
            info!("  #{} {} ({:.4})", rank + 1, identity, score);
        }
        for d in m.outcome.ranked_candidates().iter().take(top) {
            info!("    {} [{}] {:.4}", d.item, d.identity, d.score);
        }
    }

    Ok(())
}

fn purge(cfg: &config::Config, identity: &str) -> Result<()> {
    info!("Purging enrolled features for: {}", identity);

    storage::purge(cfg.store_prefix(), identity).context("Failed to purge feature records")?;

    info!("✓ All features purged for: {}", identity);
    Ok(())
}

fn open_config() -> Result<()> {
    let config_path = config::CONFIG_PATH.as_os_str();
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
