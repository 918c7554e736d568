//! Tool configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizgate_core::engine::EngineConfig;
use quizgate_core::model::{OverwritePolicy, DEFAULT_PASSING_SCORE};

/// Top-level quizgate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizgateConfig {
    /// Passing score for banks that do not set one.
    #[serde(default = "default_passing_score")]
    pub default_passing_score: u8,
    /// Which superior host values a new attempt may overwrite.
    #[serde(default)]
    pub overwrite: OverwritePolicy,
    /// Upper bound on one result commit, in milliseconds.
    #[serde(default = "default_commit_timeout")]
    pub commit_timeout_ms: u64,
    /// Retries on transient commit failures.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first commit retry, in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Where the file-backed host record lives.
    #[serde(default = "default_record_path")]
    pub record_path: PathBuf,
    /// Allow skipping for banks that do not say otherwise.
    #[serde(default)]
    pub enable_skip: bool,
}

fn default_passing_score() -> u8 {
    DEFAULT_PASSING_SCORE
}
fn default_commit_timeout() -> u64 {
    5000
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    200
}
fn default_record_path() -> PathBuf {
    PathBuf::from("./quizgate-record.json")
}

impl Default for QuizgateConfig {
    fn default() -> Self {
        Self {
            default_passing_score: default_passing_score(),
            overwrite: OverwritePolicy::default(),
            commit_timeout_ms: default_commit_timeout(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            record_path: default_record_path(),
            enable_skip: false,
        }
    }
}

impl QuizgateConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            commit_timeout: Duration::from_millis(self.commit_timeout_ms),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizgate.toml` in the current directory
/// 2. `~/.config/quizgate/config.toml`
///
/// Environment variable overrides: `QUIZGATE_PASSING_SCORE`, `QUIZGATE_RECORD_PATH`.
pub fn load_config() -> Result<QuizgateConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizgateConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizgate.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizgateConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizgateConfig::default(),
    };

    // Apply env var overrides
    if let Ok(score) = std::env::var("QUIZGATE_PASSING_SCORE") {
        config.default_passing_score = score
            .trim()
            .parse()
            .with_context(|| format!("QUIZGATE_PASSING_SCORE is not a score: {score:?}"))?;
    }
    if let Ok(path) = std::env::var("QUIZGATE_RECORD_PATH") {
        config.record_path = PathBuf::from(path);
    }

    if config.default_passing_score > 100 {
        anyhow::bail!(
            "default_passing_score must be between 0 and 100, got {}",
            config.default_passing_score
        );
    }

    config.record_path = PathBuf::from(resolve_env_vars(&config.record_path.to_string_lossy()));

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizgate"))
}
