pub mod config;
pub mod mine;
pub mod recommend;
pub mod summary;

use std::path::PathBuf;

use affinity_core::config::{AppConfig, ConfigOverrides};
use affinity_core::{
    ApplicationError, FrequentItemsetTable, ItemsetMiner, RuleGenerator, RuleMetric, RuleTable,
    TransactionSet,
};
use clap::Args;
use serde::Serialize;

use crate::ingest::{self, IngestOptions, InputFormat, DEFAULT_BASKET_COLUMN, DEFAULT_ITEM_COLUMN};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct CommandReport<'a, T: Serialize> {
    command: &'a str,
    status: &'static str,
    error_class: Option<&'static str>,
    #[serde(flatten)]
    payload: &'a T,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(&payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(command, error.error_class(), error.to_string(), error.exit_code())
    }

    /// Successful result whose fields sit next to `command` and `status`.
    pub fn report<T: Serialize>(command: &str, payload: &T) -> Self {
        let report = CommandReport { command, status: "ok", error_class: None, payload };
        Self { exit_code: 0, output: serialize_payload(&report) }
    }

    /// Successful result printed verbatim.
    pub fn raw(output: String) -> Self {
        Self { exit_code: 0, output }
    }
}

fn serialize_payload<T: Serialize>(payload: &T) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    #[arg(long, help = "CSV file holding the purchase rows")]
    pub input: PathBuf,
    #[arg(
        long,
        value_enum,
        default_value_t = InputFormat::Pairs,
        help = "Layout of the input file"
    )]
    pub format: InputFormat,
    #[arg(long, default_value = DEFAULT_BASKET_COLUMN, help = "Basket column for the pairs layout")]
    pub basket_column: String,
    #[arg(long, default_value = DEFAULT_ITEM_COLUMN, help = "Item column for the pairs layout")]
    pub item_column: String,
}

impl InputArgs {
    pub fn new(input: impl Into<PathBuf>, format: InputFormat) -> Self {
        Self {
            input: input.into(),
            format,
            basket_column: DEFAULT_BASKET_COLUMN.to_string(),
            item_column: DEFAULT_ITEM_COLUMN.to_string(),
        }
    }

    pub fn load_transactions(&self) -> Result<TransactionSet, ApplicationError> {
        let options = IngestOptions {
            format: self.format,
            basket_column: self.basket_column.clone(),
            item_column: self.item_column.clone(),
        };
        let rows = ingest::read_rows(&self.input, &options)?;
        Ok(TransactionSet::build(rows)?)
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct TuningArgs {
    #[arg(long, help = "Minimum support fraction in (0, 1]")]
    pub min_support: Option<f64>,
    #[arg(long, help = "Largest itemset size to mine")]
    pub max_len: Option<usize>,
    #[arg(long, help = "Stop mining before the table exceeds this many itemsets")]
    pub max_itemsets: Option<usize>,
    #[arg(long, help = "Stop mining after this many milliseconds")]
    pub time_budget_ms: Option<u64>,
    #[arg(long, value_parser = parse_metric, help = "Rule metric the threshold applies to")]
    pub metric: Option<RuleMetric>,
    #[arg(long, help = "Minimum value of the selected rule metric")]
    pub min_threshold: Option<f64>,
}

impl TuningArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            min_support: self.min_support,
            max_len: self.max_len,
            max_itemsets: self.max_itemsets,
            time_budget_ms: self.time_budget_ms,
            rule_metric: self.metric,
            min_threshold: self.min_threshold,
            ..ConfigOverrides::default()
        }
    }
}

fn parse_metric(value: &str) -> Result<RuleMetric, String> {
    value.parse::<RuleMetric>().map_err(|error| error.to_string())
}

/// Frequent itemsets and the rules derived from them under one configuration.
pub(crate) fn mine_rules(
    transactions: &TransactionSet,
    config: &AppConfig,
) -> Result<(FrequentItemsetTable, RuleTable), ApplicationError> {
    let table = ItemsetMiner::new(config.mining_options())?.mine(transactions);
    let rules = RuleGenerator::new(config.rule_threshold())?.generate(&table)?;
    Ok((table, rules))
}
