use affinity_core::config::AppConfig;
use affinity_core::{ApplicationError, Item, Itemset, Recommender};
use serde::Serialize;

use super::{mine_rules, CommandResult, InputArgs};

const COMMAND: &str = "recommend";

#[derive(Debug, Serialize)]
struct Recommendation<'a> {
    consequent: &'a Itemset,
    lift: f64,
    confidence: f64,
}

#[derive(Debug, Serialize)]
struct RecommendReport<'a> {
    item: &'a Item,
    count: usize,
    rule_count: usize,
    recommendations: Vec<Recommendation<'a>>,
}

pub fn run(config: &AppConfig, input: &InputArgs, item: &str) -> CommandResult {
    match execute(config, input, item) {
        Ok(result) => result,
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn execute(
    config: &AppConfig,
    input: &InputArgs,
    item: &str,
) -> Result<CommandResult, ApplicationError> {
    let transactions = input.load_transactions()?;
    let (_, rules) = mine_rules(&transactions, config)?;
    let target = Item::new(item.trim());
    let count = config.recommend.count;

    let recommender = Recommender::new(&rules);
    let recommendations = recommender
        .ranked_rules(&target)
        .take(count)
        .map(|rule| Recommendation {
            consequent: &rule.consequent,
            lift: rule.lift,
            confidence: rule.confidence,
        })
        .collect();

    let report = RecommendReport { item: &target, count, rule_count: rules.len(), recommendations };
    Ok(CommandResult::report(COMMAND, &report))
}
