//! Rule generation from a frequent itemset table

use tracing::{debug, info};

use super::metrics::{Rule, RuleThreshold};
use super::RuleTable;
use crate::domain::item::Item;
use crate::domain::itemset::Itemset;
use crate::errors::MiningError;
use crate::mining::FrequentItemsetTable;

/// Largest itemset whose antecedent subsets are enumerated.
const MAX_EXPANDABLE_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct RuleGenerator {
    threshold: RuleThreshold,
}

impl RuleGenerator {
    pub fn new(threshold: RuleThreshold) -> Result<Self, MiningError> {
        threshold.validate()?;
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> RuleThreshold {
        self.threshold
    }

    /// Emit every rule `A → F \ A` for each frequent itemset `F` with at least two items
    /// and each non-empty proper subset `A`.
    ///
    /// Itemsets are visited in table order and antecedents in ascending subset-mask order,
    /// so the output order is reproducible.
    pub fn generate(&self, table: &FrequentItemsetTable) -> Result<RuleTable, MiningError> {
        let mut rules = Vec::new();
        let mut considered = 0usize;

        for (itemset, support) in table.iter().filter(|(itemset, _)| itemset.len() >= 2) {
            if itemset.len() > MAX_EXPANDABLE_LEN {
                return Err(MiningError::InvalidParameter(format!(
                    "itemset {itemset} has {} items; at most {MAX_EXPANDABLE_LEN} can be expanded into rules",
                    itemset.len()
                )));
            }

            let items = itemset.items();
            let full_mask: u64 = (1u64 << items.len()) - 1;
            for mask in 1..full_mask {
                let antecedent = select(items, mask);
                let consequent = select(items, full_mask & !mask);
                let antecedent_support = lookup(table, itemset, &antecedent)?;
                let consequent_support = lookup(table, itemset, &consequent)?;

                considered += 1;
                let rule = Rule::from_supports(
                    antecedent,
                    consequent,
                    antecedent_support,
                    consequent_support,
                    support.fraction,
                );
                if self.threshold.accepts(&rule) {
                    rules.push(rule);
                }
            }
            debug!(
                event_name = "rules.itemset.expanded",
                itemset = %itemset,
                antecedents = full_mask - 1,
                "expanded frequent itemset into rules"
            );
        }

        info!(
            event_name = "rules.generated",
            metric = %self.threshold.metric,
            min_threshold = self.threshold.min_threshold,
            considered,
            kept = rules.len(),
            "association rules generated"
        );
        Ok(RuleTable::new(self.threshold, rules))
    }
}

fn select(items: &[Item], mask: u64) -> Itemset {
    let selected = items
        .iter()
        .enumerate()
        .filter(|(position, _)| mask & (1u64 << position) != 0)
        .map(|(_, item)| item.clone())
        .collect();
    Itemset::from_sorted(selected)
}

fn lookup(
    table: &FrequentItemsetTable,
    itemset: &Itemset,
    subset: &Itemset,
) -> Result<f64, MiningError> {
    match table.support(subset) {
        Some(fraction) if fraction > 0.0 => Ok(fraction),
        _ => Err(MiningError::InconsistentTable {
            itemset: itemset.to_string(),
            missing: subset.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::RuleGenerator;
    use crate::domain::itemset::Itemset;
    use crate::domain::transaction::TransactionSet;
    use crate::errors::MiningError;
    use crate::mining::{mine, FrequentItemsetTable};
    use crate::rules::{generate, RuleMetric, RuleThreshold};

    fn itemset(items: &[&str]) -> Itemset {
        Itemset::new(items.iter().copied()).expect("non-empty itemset")
    }

    fn reference_table() -> FrequentItemsetTable {
        let transactions = TransactionSet::from_baskets(vec![
            ("T1", vec!["A", "B"]),
            ("T2", vec!["A", "B"]),
            ("T3", vec!["A"]),
            ("T4", vec!["B", "C"]),
        ])
        .expect("valid baskets");
        mine(&transactions, 0.5).expect("valid support")
    }

    #[test]
    fn reference_scenario_yields_both_directions() {
        let rules = generate(&reference_table(), 0.5).expect("consistent table");

        assert_eq!(rules.len(), 2);
        let a_to_b = &rules.rules()[0];
        assert_eq!(a_to_b.antecedent, itemset(&["A"]));
        assert_eq!(a_to_b.consequent, itemset(&["B"]));
        assert_eq!(a_to_b.support, 0.5);
        assert!((a_to_b.confidence - 0.667).abs() < 1e-3);
        assert!((a_to_b.lift - 0.889).abs() < 1e-3);
        assert_eq!(rules.rules()[1].antecedent, itemset(&["B"]));
    }

    #[test]
    fn three_item_sets_expand_to_six_rules() {
        let transactions = TransactionSet::from_baskets(vec![
            ("b1", vec!["a", "b", "c"]),
            ("b2", vec!["a", "b", "c"]),
            ("b3", vec!["a", "b"]),
        ])
        .expect("valid baskets");
        let table = mine(&transactions, 0.6).expect("valid support");
        let rules = generate(&table, 0.6).expect("consistent table");

        let from_triple = rules
            .iter()
            .filter(|rule| rule.antecedent.len() + rule.consequent.len() == 3)
            .count();
        assert_eq!(from_triple, 6);
        assert!(rules.iter().all(|rule| rule.antecedent.is_disjoint(&rule.consequent)));
        assert!(rules.iter().all(|rule| rule.antecedent_support + 1e-12 >= rule.support));
    }

    #[test]
    fn missing_subset_support_is_inconsistent() {
        let table = FrequentItemsetTable::from_counts(
            4,
            0.5,
            vec![(itemset(&["A"]), 3), (itemset(&["A", "B"]), 2)],
        );

        let error = generate(&table, 0.5).expect_err("B is missing");
        assert_eq!(
            error,
            MiningError::InconsistentTable {
                itemset: "{A, B}".to_owned(),
                missing: "{B}".to_owned(),
            }
        );
    }

    #[test]
    fn metric_threshold_filters_rules() {
        let transactions = TransactionSet::from_baskets(vec![
            ("b1", vec!["x", "y"]),
            ("b2", vec!["x", "y"]),
            ("b3", vec!["x"]),
            ("b4", vec!["z"]),
        ])
        .expect("valid baskets");
        let table = mine(&transactions, 0.25).expect("valid support");

        let generator = RuleGenerator::new(RuleThreshold::new(RuleMetric::Confidence, 1.0))
            .expect("valid threshold");
        let rules = generator.generate(&table).expect("consistent table");

        assert_eq!(rules.len(), 1);
        assert_eq!(rules.rules()[0].antecedent, itemset(&["y"]));
        assert_eq!(rules.rules()[0].conviction, None);
    }

    #[test]
    fn invalid_threshold_fails_before_generation() {
        let error = generate(&reference_table(), 0.0).expect_err("zero support threshold");
        assert!(matches!(error, MiningError::InvalidParameter(_)));
    }

    #[test]
    fn empty_table_yields_empty_rules() {
        let table = FrequentItemsetTable::from_counts(3, 0.5, Vec::new());
        let rules = generate(&table, 0.5).expect("empty table is consistent");
        assert!(rules.is_empty());
    }
}
