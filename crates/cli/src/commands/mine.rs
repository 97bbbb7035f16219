use affinity_core::config::AppConfig;
use affinity_core::{ApplicationError, Itemset, Rule, RuleThreshold, Truncation};
use clap::ValueEnum;
use serde::Serialize;

use super::{mine_rules, CommandResult, InputArgs};

const COMMAND: &str = "mine";
const ITEM_SEPARATOR: &str = ";";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Serialize)]
struct MineReport<'a> {
    transaction_count: usize,
    itemset_count: usize,
    truncation: Option<Truncation>,
    threshold: RuleThreshold,
    rules: &'a [Rule],
}

pub fn run(config: &AppConfig, input: &InputArgs, output: OutputFormat) -> CommandResult {
    match execute(config, input, output) {
        Ok(result) => result,
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn execute(
    config: &AppConfig,
    input: &InputArgs,
    output: OutputFormat,
) -> Result<CommandResult, ApplicationError> {
    let transactions = input.load_transactions()?;
    let (table, rules) = mine_rules(&transactions, config)?;

    match output {
        OutputFormat::Json => {
            let report = MineReport {
                transaction_count: table.transaction_count(),
                itemset_count: table.len(),
                truncation: table.truncation(),
                threshold: rules.threshold(),
                rules: rules.rules(),
            };
            Ok(CommandResult::report(COMMAND, &report))
        }
        OutputFormat::Csv => Ok(CommandResult::raw(render_csv(rules.rules())?)),
    }
}

/// One line per rule; multi-item sides are joined with `;`.
pub fn render_csv(rules: &[Rule]) -> Result<String, ApplicationError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "antecedents",
            "consequents",
            "antecedent support",
            "consequent support",
            "support",
            "confidence",
            "lift",
            "leverage",
            "conviction",
        ])
        .map_err(output_error)?;

    for rule in rules {
        writer
            .write_record([
                join_items(&rule.antecedent),
                join_items(&rule.consequent),
                rule.antecedent_support.to_string(),
                rule.consequent_support.to_string(),
                rule.support.to_string(),
                rule.confidence.to_string(),
                rule.lift.to_string(),
                rule.leverage.to_string(),
                rule.conviction.map_or_else(|| "inf".to_string(), |value| value.to_string()),
            ])
            .map_err(output_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| ApplicationError::Input(format!("could not flush CSV output: {error}")))?;
    let rendered = String::from_utf8(bytes)
        .map_err(|error| ApplicationError::Input(format!("CSV output is not UTF-8: {error}")))?;
    Ok(rendered.trim_end().to_string())
}

fn join_items(itemset: &Itemset) -> String {
    itemset.iter().map(|item| item.as_str()).collect::<Vec<_>>().join(ITEM_SEPARATOR)
}

fn output_error(error: csv::Error) -> ApplicationError {
    ApplicationError::Input(format!("could not write CSV output: {error}"))
}
