//! Types for the Itemset Miner

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::itemset::Itemset;
use crate::errors::MiningError;

/// Parameters for one mining run
#[derive(Debug, Clone, PartialEq)]
pub struct MiningOptions {
    /// Minimum support fraction, in (0, 1]
    pub min_support: f64,
    /// Largest itemset size to search
    pub max_len: Option<usize>,
    /// Upper bound on the number of itemsets kept across all levels
    pub max_itemsets: Option<usize>,
    /// Wall-clock budget checked between levels
    pub time_budget: Option<Duration>,
}

impl MiningOptions {
    pub fn new(min_support: f64) -> Self {
        Self { min_support, max_len: None, max_itemsets: None, time_budget: None }
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    pub fn with_max_itemsets(mut self, max_itemsets: usize) -> Self {
        self.max_itemsets = Some(max_itemsets);
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn validate(&self) -> Result<(), MiningError> {
        validate_min_support(self.min_support)?;
        if self.max_len == Some(0) {
            return Err(MiningError::InvalidParameter(
                "max_len must be greater than zero".to_owned(),
            ));
        }
        if self.max_itemsets == Some(0) {
            return Err(MiningError::InvalidParameter(
                "max_itemsets must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_min_support(min_support: f64) -> Result<(), MiningError> {
    if !(min_support > 0.0 && min_support <= 1.0) {
        return Err(MiningError::InvalidParameter(format!(
            "min_support must be in (0, 1], got {min_support}"
        )));
    }
    Ok(())
}

/// Why a mining run stopped before the search space was exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Truncation {
    MaxLen,
    MaxItemsets,
    TimeBudget,
}

/// Support of one itemset, both as an exact count and as a fraction of all transactions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Support {
    pub count: usize,
    pub fraction: f64,
}

impl Support {
    pub fn new(count: usize, transaction_count: usize) -> Self {
        let fraction =
            if transaction_count == 0 { 0.0 } else { count as f64 / transaction_count as f64 };
        Self { count, fraction }
    }
}

/// Frequent itemsets with their supports, keyed canonically (size, then lexicographic).
#[derive(Debug, Clone, PartialEq)]
pub struct FrequentItemsetTable {
    transaction_count: usize,
    min_support: f64,
    entries: BTreeMap<Itemset, Support>,
    truncation: Option<Truncation>,
}

impl FrequentItemsetTable {
    pub(crate) fn empty(transaction_count: usize, min_support: f64) -> Self {
        Self { transaction_count, min_support, entries: BTreeMap::new(), truncation: None }
    }

    /// Build a table from externally supplied counts.
    ///
    /// No closure check is performed here; `RuleGenerator` reports missing subsets.
    pub fn from_counts<I>(transaction_count: usize, min_support: f64, counts: I) -> Self
    where
        I: IntoIterator<Item = (Itemset, usize)>,
    {
        let entries = counts
            .into_iter()
            .map(|(itemset, count)| (itemset, Support::new(count, transaction_count)))
            .collect();
        Self { transaction_count, min_support, entries, truncation: None }
    }

    pub(crate) fn insert(&mut self, itemset: Itemset, count: usize) {
        self.entries.insert(itemset, Support::new(count, self.transaction_count));
    }

    pub(crate) fn set_truncation(&mut self, truncation: Truncation) {
        self.truncation = Some(truncation);
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    pub fn truncation(&self) -> Option<Truncation> {
        self.truncation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, itemset: &Itemset) -> Option<&Support> {
        self.entries.get(itemset)
    }

    pub fn support(&self, itemset: &Itemset) -> Option<f64> {
        self.entries.get(itemset).map(|support| support.fraction)
    }

    pub fn contains(&self, itemset: &Itemset) -> bool {
        self.entries.contains_key(itemset)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Itemset, &Support)> + '_ {
        self.entries.iter()
    }

    /// Itemsets of exactly `size` items.
    pub fn level(&self, size: usize) -> impl Iterator<Item = (&Itemset, &Support)> + '_ {
        self.entries.iter().filter(move |(itemset, _)| itemset.len() == size)
    }

    pub fn max_itemset_len(&self) -> usize {
        self.entries.keys().next_back().map(Itemset::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::{FrequentItemsetTable, MiningOptions, Support};
    use crate::domain::itemset::Itemset;
    use crate::errors::MiningError;

    #[test]
    fn options_reject_out_of_range_support() {
        for value in [0.0, -0.1, 1.000_1, f64::NAN] {
            let error = MiningOptions::new(value).validate().expect_err("must be rejected");
            assert!(matches!(error, MiningError::InvalidParameter(_)));
        }
        assert!(MiningOptions::new(1.0).validate().is_ok());
    }

    #[test]
    fn options_reject_zero_caps() {
        assert!(MiningOptions::new(0.5).with_max_len(0).validate().is_err());
        assert!(MiningOptions::new(0.5).with_max_itemsets(0).validate().is_err());
    }

    #[test]
    fn support_fraction_is_exact_for_full_coverage() {
        assert_eq!(Support::new(7, 7).fraction, 1.0);
        assert_eq!(Support::new(0, 0).fraction, 0.0);
    }

    #[test]
    fn table_reports_levels_and_max_len() {
        let table = FrequentItemsetTable::from_counts(
            4,
            0.5,
            vec![
                (Itemset::new(["a"]).expect("itemset"), 3),
                (Itemset::new(["b"]).expect("itemset"), 3),
                (Itemset::new(["a", "b"]).expect("itemset"), 2),
            ],
        );

        assert_eq!(table.len(), 3);
        assert_eq!(table.level(1).count(), 2);
        assert_eq!(table.max_itemset_len(), 2);
        assert_eq!(table.support(&Itemset::new(["a", "b"]).expect("itemset")), Some(0.5));
    }
}
