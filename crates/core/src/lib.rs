pub mod config;
pub mod domain;
pub mod errors;
pub mod mining;
pub mod recommend;
pub mod report;
pub mod rules;

pub use domain::item::{BasketId, Item};
pub use domain::itemset::Itemset;
pub use domain::transaction::{RawRow, Transaction, TransactionSet};
pub use errors::{ApplicationError, MiningError};
pub use mining::{FrequentItemsetTable, ItemsetMiner, MiningOptions, Support, Truncation};
pub use recommend::Recommender;
pub use report::{DatasetSummary, MiningSummary};
pub use rules::{Rule, RuleGenerator, RuleMetric, RuleTable, RuleThreshold};
