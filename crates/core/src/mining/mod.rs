//! Frequent itemset mining
//!
//! Level-wise (Apriori) search over a `TransactionSet`. Support is counted exactly from
//! per-item transaction-id lists that are intersected as itemsets grow.

mod apriori;
mod types;

pub use apriori::ItemsetMiner;
pub use types::*;

pub(crate) use types::validate_min_support;

use crate::domain::transaction::TransactionSet;
use crate::errors::MiningError;

/// Tolerance applied when comparing a support fraction against a threshold.
pub const SUPPORT_EPSILON: f64 = 1e-9;

/// Mine with only a support threshold and no caps.
pub fn mine(
    transactions: &TransactionSet,
    min_support: f64,
) -> Result<FrequentItemsetTable, MiningError> {
    Ok(ItemsetMiner::new(MiningOptions::new(min_support))?.mine(transactions))
}

pub(crate) fn meets_threshold(count: usize, transaction_count: usize, min_support: f64) -> bool {
    transaction_count > 0
        && count as f64 / transaction_count as f64 + SUPPORT_EPSILON >= min_support
}
