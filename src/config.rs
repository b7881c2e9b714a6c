use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{error::ScoreError, feature::WeightVector, reduction::Reduction};

pub static CONFIG_PATH: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(
        option_env!("FLUKEMATCH_CONFIG_PATH").unwrap_or("/usr/local/etc/flukematch/config.toml"),
    )
});

pub static STORE_PREFIX: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("FLUKEMATCH_STORE_PREFIX").unwrap_or("/usr/local/var/flukematch"))
});

/// Parameters of the BC-DTW identification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Block sizes the curvature was integrated over, one bucket each.
    pub sizes: Vec<u32>,
    /// Per-bucket weights. Uniform when absent.
    pub weights: Option<Vec<f32>>,
    /// How candidate scores of one identity are combined.
    pub decision: Reduction,
    /// DTW band half-width.
    pub window: usize,
    /// DTW weights along the trailing edge, one per curvature value.
    pub position_weights: Option<Vec<f32>>,
    /// Log progress per query.
    pub verbose: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            sizes: vec![5, 10, 15, 20],
            weights: None,
            decision: Reduction::Mean,
            window: 50,
            position_weights: None,
            verbose: false,
        }
    }
}

impl MatchConfig {
    /// Weights to score with. Explicit weights must match `sizes` exactly.
    pub fn resolve_weights(&self) -> Result<WeightVector, ScoreError> {
        match &self.weights {
            None => Ok(WeightVector::uniform(self.sizes.len())),
            Some(w) if w.len() == self.sizes.len() => Ok(WeightVector(w.clone())),
            Some(w) => Err(ScoreError::DimensionMismatch {
                what: "configured weights vs sizes".to_string(),
                expected: self.sizes.len(),
                actual: w.len(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of identities and candidates to print per query.
    pub top: usize,
    /// Feature store location, overriding the built-in prefix.
    pub store: Option<PathBuf>,
    pub matching: MatchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            top: 5,
            store: None,
            matching: MatchConfig::default(),
        }
    }
}

impl Config {
    pub fn store_prefix(&self) -> &Path {
        self.store.as_deref().unwrap_or(&STORE_PREFIX)
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}
