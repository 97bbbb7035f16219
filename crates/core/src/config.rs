use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mining::MiningOptions;
use crate::recommend::DEFAULT_RECOMMENDATION_COUNT;
use crate::rules::{RuleMetric, RuleThreshold, DEFAULT_MIN_THRESHOLD};

pub const DEFAULT_MIN_SUPPORT: f64 = 0.01;
pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["affinity.toml", "config/affinity.toml"];

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub mining: MiningConfig,
    pub rules: RulesConfig,
    pub recommend: RecommendConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MiningConfig {
    pub min_support: f64,
    pub max_len: Option<usize>,
    pub max_itemsets: Option<usize>,
    pub time_budget_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RulesConfig {
    pub metric: RuleMetric,
    pub min_threshold: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecommendConfig {
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub min_support: Option<f64>,
    pub max_len: Option<usize>,
    pub max_itemsets: Option<usize>,
    pub time_budget_ms: Option<u64>,
    pub rule_metric: Option<RuleMetric>,
    pub min_threshold: Option<f64>,
    pub recommendation_count: Option<usize>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mining: MiningConfig {
                min_support: DEFAULT_MIN_SUPPORT,
                max_len: None,
                max_itemsets: None,
                time_budget_ms: None,
            },
            rules: RulesConfig {
                metric: RuleMetric::Support,
                min_threshold: DEFAULT_MIN_THRESHOLD,
            },
            recommend: RecommendConfig { count: DEFAULT_RECOMMENDATION_COUNT },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options
                .config_path
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn mining_options(&self) -> MiningOptions {
        MiningOptions {
            min_support: self.mining.min_support,
            max_len: self.mining.max_len,
            max_itemsets: self.mining.max_itemsets,
            time_budget: self.mining.time_budget_ms.map(Duration::from_millis),
        }
    }

    pub fn rule_threshold(&self) -> RuleThreshold {
        RuleThreshold::new(self.rules.metric, self.rules.min_threshold)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(mining) = patch.mining {
            if let Some(min_support) = mining.min_support {
                self.mining.min_support = min_support;
            }
            if let Some(max_len) = mining.max_len {
                self.mining.max_len = Some(max_len);
            }
            if let Some(max_itemsets) = mining.max_itemsets {
                self.mining.max_itemsets = Some(max_itemsets);
            }
            if let Some(time_budget_ms) = mining.time_budget_ms {
                self.mining.time_budget_ms = Some(time_budget_ms);
            }
        }

        if let Some(rules) = patch.rules {
            if let Some(metric) = rules.metric {
                self.rules.metric = metric;
            }
            if let Some(min_threshold) = rules.min_threshold {
                self.rules.min_threshold = min_threshold;
            }
        }

        if let Some(recommend) = patch.recommend {
            if let Some(count) = recommend.count {
                self.recommend.count = count;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("AFFINITY_MINING_MIN_SUPPORT") {
            self.mining.min_support = parse_f64("AFFINITY_MINING_MIN_SUPPORT", &value)?;
        }
        if let Some(value) = read_env("AFFINITY_MINING_MAX_LEN") {
            self.mining.max_len = Some(parse_usize("AFFINITY_MINING_MAX_LEN", &value)?);
        }
        if let Some(value) = read_env("AFFINITY_MINING_MAX_ITEMSETS") {
            self.mining.max_itemsets = Some(parse_usize("AFFINITY_MINING_MAX_ITEMSETS", &value)?);
        }
        if let Some(value) = read_env("AFFINITY_MINING_TIME_BUDGET_MS") {
            self.mining.time_budget_ms = Some(parse_u64("AFFINITY_MINING_TIME_BUDGET_MS", &value)?);
        }

        if let Some(value) = read_env("AFFINITY_RULES_METRIC") {
            self.rules.metric = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "AFFINITY_RULES_METRIC".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = read_env("AFFINITY_RULES_MIN_THRESHOLD") {
            self.rules.min_threshold = parse_f64("AFFINITY_RULES_MIN_THRESHOLD", &value)?;
        }

        if let Some(value) = read_env("AFFINITY_RECOMMEND_COUNT") {
            self.recommend.count = parse_usize("AFFINITY_RECOMMEND_COUNT", &value)?;
        }

        let log_level =
            read_env("AFFINITY_LOGGING_LEVEL").or_else(|| read_env("AFFINITY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("AFFINITY_LOGGING_FORMAT").or_else(|| read_env("AFFINITY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(min_support) = overrides.min_support {
            self.mining.min_support = min_support;
        }
        if let Some(max_len) = overrides.max_len {
            self.mining.max_len = Some(max_len);
        }
        if let Some(max_itemsets) = overrides.max_itemsets {
            self.mining.max_itemsets = Some(max_itemsets);
        }
        if let Some(time_budget_ms) = overrides.time_budget_ms {
            self.mining.time_budget_ms = Some(time_budget_ms);
        }
        if let Some(metric) = overrides.rule_metric {
            self.rules.metric = metric;
        }
        if let Some(min_threshold) = overrides.min_threshold {
            self.rules.min_threshold = min_threshold;
        }
        if let Some(count) = overrides.recommendation_count {
            self.recommend.count = count;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mining_options()
            .validate()
            .map_err(|error| ConfigError::Validation(format!("mining: {error}")))?;
        self.rule_threshold()
            .validate()
            .map_err(|error| ConfigError::Validation(format!("rules: {error}")))?;
        validate_recommend(&self.recommend)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_recommend(recommend: &RecommendConfig) -> Result<(), ConfigError> {
    if recommend.count == 0 {
        return Err(ConfigError::Validation(
            "recommend.count must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    mining: Option<MiningPatch>,
    rules: Option<RulesPatch>,
    recommend: Option<RecommendPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct MiningPatch {
    min_support: Option<f64>,
    max_len: Option<usize>,
    max_itemsets: Option<usize>,
    time_budget_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RulesPatch {
    metric: Option<RuleMetric>,
    min_threshold: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendPatch {
    count: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
