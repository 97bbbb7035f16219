use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use affinity_core::config::{AppConfig, LoadOptions, CONFIG_FILE_CANDIDATES};
use toml::Value;

use super::CommandResult;

const COMMAND: &str = "config";

pub fn run(config_path: Option<&Path>) -> CommandResult {
    let options = LoadOptions {
        config_path: config_path.map(Path::to_path_buf),
        require_file: config_path.is_some(),
        ..LoadOptions::default()
    };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2);
        }
    };

    let config_file_path = detect_config_path(config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: [(&str, String, &[&str]); 9] = [
        (
            "mining.min_support",
            config.mining.min_support.to_string(),
            &["AFFINITY_MINING_MIN_SUPPORT"],
        ),
        ("mining.max_len", render_optional(config.mining.max_len), &["AFFINITY_MINING_MAX_LEN"]),
        (
            "mining.max_itemsets",
            render_optional(config.mining.max_itemsets),
            &["AFFINITY_MINING_MAX_ITEMSETS"],
        ),
        (
            "mining.time_budget_ms",
            render_optional(config.mining.time_budget_ms),
            &["AFFINITY_MINING_TIME_BUDGET_MS"],
        ),
        ("rules.metric", config.rules.metric.to_string(), &["AFFINITY_RULES_METRIC"]),
        (
            "rules.min_threshold",
            config.rules.min_threshold.to_string(),
            &["AFFINITY_RULES_MIN_THRESHOLD"],
        ),
        ("recommend.count", config.recommend.count.to_string(), &["AFFINITY_RECOMMEND_COUNT"]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["AFFINITY_LOGGING_LEVEL", "AFFINITY_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["AFFINITY_LOGGING_FORMAT", "AFFINITY_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in &fields {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, value, source));
    }

    CommandResult::raw(lines.join("\n"))
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|env_key| env::var_os(env_key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "<unset>".to_string(), |value| value.to_string())
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
