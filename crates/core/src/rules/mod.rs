//! Association rule derivation
//!
//! Expands each frequent itemset into antecedent → consequent rules and scores them
//! with support, confidence, lift, leverage and conviction.

mod generator;
mod metrics;

pub use generator::RuleGenerator;
pub use metrics::{Rule, RuleMetric, RuleThreshold};

use serde::Serialize;

use crate::errors::MiningError;
use crate::mining::FrequentItemsetTable;

/// Default metric threshold applied when none is configured
pub const DEFAULT_MIN_THRESHOLD: f64 = 0.01;

/// Rules that passed the metric threshold, in generation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleTable {
    threshold: RuleThreshold,
    rules: Vec<Rule>,
}

impl RuleTable {
    pub(crate) fn new(threshold: RuleThreshold, rules: Vec<Rule>) -> Self {
        Self { threshold, rules }
    }

    pub fn threshold(&self) -> RuleThreshold {
        self.threshold
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Generate rules keeping those with support at or above `min_support`.
pub fn generate(table: &FrequentItemsetTable, min_support: f64) -> Result<RuleTable, MiningError> {
    RuleGenerator::new(RuleThreshold::support(min_support))?.generate(table)
}
