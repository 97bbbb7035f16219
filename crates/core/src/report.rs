use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::item::Item;
use crate::domain::transaction::TransactionSet;
use crate::mining::{FrequentItemsetTable, Truncation};
use crate::rules::RuleTable;

pub const DEFAULT_TOP_ITEMS: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemFrequency {
    pub item: Item,
    pub baskets: usize,
    pub support: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub transaction_count: usize,
    pub distinct_items: usize,
    pub item_occurrences: usize,
    pub min_basket_size: usize,
    pub max_basket_size: usize,
    pub mean_basket_size: f64,
    pub top_items: Vec<ItemFrequency>,
}

impl DatasetSummary {
    pub fn from_transactions(transactions: &TransactionSet, top_n: usize) -> Self {
        let mut frequencies: BTreeMap<&Item, usize> = BTreeMap::new();
        let mut item_occurrences = 0usize;
        let mut min_basket_size = usize::MAX;
        let mut max_basket_size = 0usize;

        for transaction in transactions {
            item_occurrences += transaction.len();
            min_basket_size = min_basket_size.min(transaction.len());
            max_basket_size = max_basket_size.max(transaction.len());
            for item in transaction.items() {
                *frequencies.entry(item).or_default() += 1;
            }
        }

        let transaction_count = transactions.len();
        let distinct_items = frequencies.len();
        let mut ranked: Vec<(&Item, usize)> = frequencies.into_iter().collect();
        // stable sort keeps item order for equal counts
        ranked.sort_by(|left, right| right.1.cmp(&left.1));

        let top_items = ranked
            .into_iter()
            .take(top_n)
            .map(|(item, baskets)| ItemFrequency {
                item: item.clone(),
                baskets,
                support: baskets as f64 / transaction_count as f64,
            })
            .collect();

        Self {
            transaction_count,
            distinct_items,
            item_occurrences,
            min_basket_size: if transaction_count == 0 { 0 } else { min_basket_size },
            max_basket_size,
            mean_basket_size: if transaction_count == 0 {
                0.0
            } else {
                item_occurrences as f64 / transaction_count as f64
            },
            top_items,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LevelSummary {
    pub size: usize,
    pub itemsets: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MiningSummary {
    pub transaction_count: usize,
    pub min_support: f64,
    pub itemset_count: usize,
    pub levels: Vec<LevelSummary>,
    pub truncation: Option<Truncation>,
    pub rule_count: Option<usize>,
    pub max_lift: Option<f64>,
}

impl MiningSummary {
    pub fn from_table(table: &FrequentItemsetTable) -> Self {
        let mut per_size: BTreeMap<usize, usize> = BTreeMap::new();
        for (itemset, _) in table.iter() {
            *per_size.entry(itemset.len()).or_default() += 1;
        }

        Self {
            transaction_count: table.transaction_count(),
            min_support: table.min_support(),
            itemset_count: table.len(),
            levels: per_size
                .into_iter()
                .map(|(size, itemsets)| LevelSummary { size, itemsets })
                .collect(),
            truncation: table.truncation(),
            rule_count: None,
            max_lift: None,
        }
    }

    pub fn with_rules(mut self, rules: &RuleTable) -> Self {
        self.rule_count = Some(rules.len());
        self.max_lift = rules.iter().map(|rule| rule.lift).reduce(f64::max);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{DatasetSummary, LevelSummary, MiningSummary};
    use crate::domain::item::Item;
    use crate::domain::transaction::TransactionSet;
    use crate::mining::mine;
    use crate::rules::generate;

    fn transactions() -> TransactionSet {
        TransactionSet::from_baskets(vec![
            ("T1", vec!["A", "B"]),
            ("T2", vec!["A", "B"]),
            ("T3", vec!["A"]),
            ("T4", vec!["B", "C"]),
        ])
        .expect("valid baskets")
    }

    #[test]
    fn dataset_summary_counts_baskets_and_items() {
        let summary = DatasetSummary::from_transactions(&transactions(), 2);

        assert_eq!(summary.transaction_count, 4);
        assert_eq!(summary.distinct_items, 3);
        assert_eq!(summary.item_occurrences, 7);
        assert_eq!(summary.min_basket_size, 1);
        assert_eq!(summary.max_basket_size, 2);
        assert!((summary.mean_basket_size - 1.75).abs() < 1e-12);
        assert_eq!(summary.top_items.len(), 2);
        assert_eq!(summary.top_items[0].item, Item::from("A"));
        assert_eq!(summary.top_items[1].item, Item::from("B"));
        assert_eq!(summary.top_items[0].support, 0.75);
    }

    #[test]
    fn empty_dataset_summary_has_zero_sizes() {
        let summary = DatasetSummary::from_transactions(&TransactionSet::default(), 5);

        assert_eq!(summary.transaction_count, 0);
        assert_eq!(summary.min_basket_size, 0);
        assert_eq!(summary.mean_basket_size, 0.0);
        assert!(summary.top_items.is_empty());
    }

    #[test]
    fn mining_summary_groups_levels_and_rules() {
        let table = mine(&transactions(), 0.5).expect("valid support");
        let rules = generate(&table, 0.5).expect("consistent table");
        let summary = MiningSummary::from_table(&table).with_rules(&rules);

        assert_eq!(summary.itemset_count, 3);
        assert_eq!(
            summary.levels,
            vec![LevelSummary { size: 1, itemsets: 2 }, LevelSummary { size: 2, itemsets: 1 }]
        );
        assert_eq!(summary.rule_count, Some(2));
        assert!(summary.max_lift.is_some_and(|lift| (lift - 8.0 / 9.0).abs() < 1e-12));
    }
}
