//! Level-wise Apriori search

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use tracing::{debug, info};

use super::types::{FrequentItemsetTable, MiningOptions, Truncation};
use super::meets_threshold;
use crate::domain::item::Item;
use crate::domain::itemset::Itemset;
use crate::domain::transaction::TransactionSet;
use crate::errors::MiningError;

/// A frequent itemset of the current level with the ids of the transactions containing it.
#[derive(Debug, Clone)]
struct LevelEntry {
    items: Vec<Item>,
    tids: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ItemsetMiner {
    options: MiningOptions,
}

impl ItemsetMiner {
    /// Fails fast on invalid options, before any mining work.
    pub fn new(options: MiningOptions) -> Result<Self, MiningError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn mine(&self, transactions: &TransactionSet) -> FrequentItemsetTable {
        let started = Instant::now();
        let transaction_count = transactions.len();
        let min_support = self.options.min_support;
        let mut table = FrequentItemsetTable::empty(transaction_count, min_support);

        let mut level = frequent_singletons(transactions, min_support);
        let mut size = 1usize;

        while !level.is_empty() {
            if let Some(cap) = self.options.max_itemsets {
                if table.len() + level.len() > cap {
                    table.set_truncation(Truncation::MaxItemsets);
                    info!(
                        event_name = "mining.truncated",
                        reason = "max_itemsets",
                        level = size,
                        kept = table.len(),
                        "itemset cap reached; returning completed levels"
                    );
                    break;
                }
            }

            debug!(
                event_name = "mining.level.completed",
                level = size,
                frequent = level.len(),
                "frequent itemset level completed"
            );
            for entry in &level {
                table.insert(Itemset::from_sorted(entry.items.clone()), entry.tids.len());
            }

            // caps only truncate when another level could still be joined
            if !has_join_candidate(&level) {
                break;
            }
            if self.options.max_len.is_some_and(|max_len| size >= max_len) {
                table.set_truncation(Truncation::MaxLen);
                info!(
                    event_name = "mining.truncated",
                    reason = "max_len",
                    level = size,
                    kept = table.len(),
                    "itemset size cap reached"
                );
                break;
            }
            if self.options.time_budget.is_some_and(|budget| started.elapsed() >= budget) {
                table.set_truncation(Truncation::TimeBudget);
                info!(
                    event_name = "mining.truncated",
                    reason = "time_budget",
                    level = size,
                    kept = table.len(),
                    "time budget exhausted"
                );
                break;
            }

            level = next_level(&level, transaction_count, min_support);
            size += 1;
        }

        info!(
            event_name = "mining.completed",
            transactions = transaction_count,
            min_support,
            itemsets = table.len(),
            max_len = table.max_itemset_len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "frequent itemset mining completed"
        );
        table
    }
}

fn frequent_singletons(transactions: &TransactionSet, min_support: f64) -> Vec<LevelEntry> {
    let mut incidence: BTreeMap<&Item, Vec<usize>> = BTreeMap::new();
    for (tid, transaction) in transactions.iter().enumerate() {
        for item in transaction.items() {
            incidence.entry(item).or_default().push(tid);
        }
    }

    incidence
        .into_iter()
        .filter(|(_, tids)| meets_threshold(tids.len(), transactions.len(), min_support))
        .map(|(item, tids)| LevelEntry { items: vec![item.clone()], tids })
        .collect()
}

/// Join itemsets sharing their first `k - 2` items, prune candidates with an infrequent
/// `(k - 1)`-subset, and count the survivors by intersecting their parents' tid lists.
///
/// `level` must be sorted lexicographically by `items`; the output keeps that order.
fn next_level(level: &[LevelEntry], transaction_count: usize, min_support: f64) -> Vec<LevelEntry> {
    let previous: HashSet<&[Item]> = level.iter().map(|entry| entry.items.as_slice()).collect();
    let prefix_len = level.first().map(|entry| entry.items.len() - 1).unwrap_or(0);
    let mut next = Vec::new();

    for (index, left) in level.iter().enumerate() {
        let prefix = &left.items[..prefix_len];
        for right in &level[index + 1..] {
            if &right.items[..prefix_len] != prefix {
                break;
            }

            let mut candidate = left.items.clone();
            candidate.push(right.items[prefix_len].clone());

            if !all_subsets_frequent(&candidate, &previous) {
                continue;
            }

            let tids = intersect(&left.tids, &right.tids);
            if meets_threshold(tids.len(), transaction_count, min_support) {
                next.push(LevelEntry { items: candidate, tids });
            }
        }
    }

    next
}

/// Sorted entries sharing a `(k - 1)`-prefix are adjacent, so a join partner exists
/// exactly when some neighbouring pair shares its prefix.
fn has_join_candidate(level: &[LevelEntry]) -> bool {
    level.windows(2).any(|pair| {
        let prefix_len = pair[0].items.len() - 1;
        pair[0].items[..prefix_len] == pair[1].items[..prefix_len]
    })
}

/// The two subsets that drop one of the last two items are the join parents, so only
/// the subsets dropping a prefix item need a lookup.
fn all_subsets_frequent(candidate: &[Item], previous: &HashSet<&[Item]>) -> bool {
    let mut subset: Vec<Item> = Vec::with_capacity(candidate.len() - 1);
    for skip in 0..candidate.len().saturating_sub(2) {
        subset.clear();
        subset.extend(
            candidate
                .iter()
                .enumerate()
                .filter(|(position, _)| *position != skip)
                .map(|(_, item)| item.clone()),
        );
        if !previous.contains(subset.as_slice()) {
            return false;
        }
    }
    true
}

fn intersect(left: &[usize], right: &[usize]) -> Vec<usize> {
    let mut output = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                output.push(left[i]);
                i += 1;
                j += 1;
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{intersect, ItemsetMiner};
    use crate::domain::itemset::Itemset;
    use crate::domain::transaction::TransactionSet;
    use crate::errors::MiningError;
    use crate::mining::{mine, MiningOptions, Truncation};

    fn itemset(items: &[&str]) -> Itemset {
        Itemset::new(items.iter().copied()).expect("non-empty itemset")
    }

    fn four_baskets() -> TransactionSet {
        TransactionSet::from_baskets(vec![
            ("T1", vec!["A", "B"]),
            ("T2", vec!["A", "B"]),
            ("T3", vec!["A"]),
            ("T4", vec!["B", "C"]),
        ])
        .expect("valid baskets")
    }

    #[test]
    fn mines_reference_scenario() {
        let table = mine(&four_baskets(), 0.5).expect("valid support");

        assert_eq!(table.len(), 3);
        assert_eq!(table.support(&itemset(&["A"])), Some(0.75));
        assert_eq!(table.support(&itemset(&["B"])), Some(0.75));
        assert_eq!(table.support(&itemset(&["A", "B"])), Some(0.5));
        assert!(!table.contains(&itemset(&["C"])));
        assert_eq!(table.truncation(), None);
    }

    #[test]
    fn invalid_support_fails_before_mining() {
        for value in [0.0, 1.5] {
            let error = mine(&four_baskets(), value).expect_err("invalid support");
            assert!(matches!(error, MiningError::InvalidParameter(_)));
        }
    }

    #[test]
    fn item_in_every_transaction_survives_full_support() {
        let transactions = TransactionSet::from_baskets(vec![
            ("b1", vec!["x", "y"]),
            ("b2", vec!["x"]),
            ("b3", vec!["x", "z"]),
        ])
        .expect("valid baskets");

        let table = mine(&transactions, 1.0).expect("valid support");
        assert_eq!(table.len(), 1);
        assert_eq!(table.support(&itemset(&["x"])), Some(1.0));
    }

    #[test]
    fn threshold_boundary_is_not_lost_to_rounding() {
        let baskets: Vec<(String, Vec<&str>)> = (0..10)
            .map(|index| (format!("b{index}"), if index < 3 { vec!["p", "q"] } else { vec!["r"] }))
            .collect();
        let transactions = TransactionSet::from_baskets(baskets).expect("valid baskets");

        // 0.1 * 3.0 rounds to a value just above 3 / 10
        let table = mine(&transactions, 0.1 * 3.0).expect("valid support");
        assert!(table.contains(&itemset(&["p", "q"])));
    }

    #[test]
    fn empty_first_level_returns_empty_table() {
        let transactions =
            TransactionSet::from_baskets(vec![("b1", vec!["a"]), ("b2", vec!["b"])])
                .expect("valid baskets");

        let table = mine(&transactions, 0.9).expect("valid support");
        assert!(table.is_empty());
        assert_eq!(table.transaction_count(), 2);
    }

    #[test]
    fn candidates_with_infrequent_subsets_are_pruned() {
        // {a,b}, {a,c} frequent, {b,c} not: {a,b,c} must not be produced even though
        // a, b, c co-occur once.
        let transactions = TransactionSet::from_baskets(vec![
            ("b1", vec!["a", "b"]),
            ("b2", vec!["a", "b"]),
            ("b3", vec!["a", "c"]),
            ("b4", vec!["a", "c"]),
            ("b5", vec!["a", "b", "c"]),
        ])
        .expect("valid baskets");

        let table = mine(&transactions, 0.4).expect("valid support");
        assert!(table.contains(&itemset(&["a", "b"])));
        assert!(table.contains(&itemset(&["a", "c"])));
        assert!(!table.contains(&itemset(&["b", "c"])));
        assert!(!table.contains(&itemset(&["a", "b", "c"])));
    }

    #[test]
    fn finds_three_item_sets() {
        let transactions = TransactionSet::from_baskets(vec![
            ("b1", vec!["a", "b", "c"]),
            ("b2", vec!["a", "b", "c"]),
            ("b3", vec!["a", "b"]),
            ("b4", vec!["c"]),
        ])
        .expect("valid baskets");

        let table = mine(&transactions, 0.5).expect("valid support");
        assert_eq!(table.support(&itemset(&["a", "b", "c"])), Some(0.5));
        assert_eq!(table.max_itemset_len(), 3);
        assert_eq!(table.level(2).count(), 3);
    }

    #[test]
    fn max_len_caps_search_and_marks_truncation() {
        let transactions = TransactionSet::from_baskets(vec![
            ("b1", vec!["a", "b", "c"]),
            ("b2", vec!["a", "b", "c"]),
        ])
        .expect("valid baskets");

        let miner =
            ItemsetMiner::new(MiningOptions::new(0.5).with_max_len(2)).expect("valid options");
        let table = miner.mine(&transactions);

        assert_eq!(table.max_itemset_len(), 2);
        assert_eq!(table.len(), 6);
        assert_eq!(table.truncation(), Some(Truncation::MaxLen));
    }

    #[test]
    fn max_len_without_joinable_level_is_not_truncation() {
        let transactions = TransactionSet::from_baskets(vec![
            ("b1", vec!["a", "b"]),
            ("b2", vec!["c", "d"]),
        ])
        .expect("valid baskets");

        let capped =
            ItemsetMiner::new(MiningOptions::new(0.5).with_max_len(2)).expect("valid options");
        let table = capped.mine(&transactions);

        assert_eq!(table.len(), 6);
        assert_eq!(table.truncation(), None);
        assert_eq!(table, mine(&transactions, 0.5).expect("valid support"));
    }

    #[test]
    fn max_itemsets_keeps_only_complete_levels() {
        let transactions = TransactionSet::from_baskets(vec![
            ("b1", vec!["a", "b", "c"]),
            ("b2", vec!["a", "b", "c"]),
        ])
        .expect("valid baskets");

        let miner =
            ItemsetMiner::new(MiningOptions::new(0.5).with_max_itemsets(4)).expect("valid options");
        let table = miner.mine(&transactions);

        assert_eq!(table.len(), 3);
        assert_eq!(table.max_itemset_len(), 1);
        assert_eq!(table.truncation(), Some(Truncation::MaxItemsets));
    }

    #[test]
    fn zero_time_budget_stops_after_first_level() {
        let miner = ItemsetMiner::new(MiningOptions::new(0.5).with_time_budget(Duration::ZERO))
            .expect("valid options");
        let table = miner.mine(&four_baskets());

        assert_eq!(table.len(), 2);
        assert_eq!(table.truncation(), Some(Truncation::TimeBudget));
    }

    #[test]
    fn result_is_independent_of_transaction_order() {
        let forward = four_baskets();
        let reversed = TransactionSet::from_baskets(vec![
            ("T4", vec!["C", "B"]),
            ("T3", vec!["A"]),
            ("T2", vec!["B", "A"]),
            ("T1", vec!["B", "A"]),
        ])
        .expect("valid baskets");

        assert_eq!(
            mine(&forward, 0.25).expect("valid support"),
            mine(&reversed, 0.25).expect("valid support")
        );
    }

    #[test]
    fn intersect_merges_sorted_lists() {
        assert_eq!(intersect(&[0, 2, 4, 6], &[1, 2, 3, 6, 8]), vec![2, 6]);
        assert!(intersect(&[], &[1]).is_empty());
    }
}
