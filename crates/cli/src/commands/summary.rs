use affinity_core::config::AppConfig;
use affinity_core::{ApplicationError, DatasetSummary, MiningSummary};
use serde::Serialize;

use super::{mine_rules, CommandResult, InputArgs};

const COMMAND: &str = "summary";

#[derive(Debug, Serialize)]
struct SummaryReport {
    dataset: DatasetSummary,
    mining: MiningSummary,
}

pub fn run(config: &AppConfig, input: &InputArgs, top_items: usize) -> CommandResult {
    match execute(config, input, top_items) {
        Ok(result) => result,
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn execute(
    config: &AppConfig,
    input: &InputArgs,
    top_items: usize,
) -> Result<CommandResult, ApplicationError> {
    let transactions = input.load_transactions()?;
    let dataset = DatasetSummary::from_transactions(&transactions, top_items);
    let (table, rules) = mine_rules(&transactions, config)?;
    let mining = MiningSummary::from_table(&table).with_rules(&rules);

    Ok(CommandResult::report(COMMAND, &SummaryReport { dataset, mining }))
}
