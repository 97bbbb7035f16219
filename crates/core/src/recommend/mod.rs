//! Rule-based recommendations
//!
//! Ranks the consequents of rules whose antecedent contains a target item.

use std::cmp::Ordering;

use tracing::debug;

use crate::domain::item::Item;
use crate::domain::itemset::Itemset;
use crate::errors::MiningError;
use crate::rules::{Rule, RuleTable};

/// Default number of recommendations returned per query
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 1;

/// Ranks a rule table once and answers repeated queries against that ranking.
#[derive(Debug, Clone)]
pub struct Recommender<'a> {
    rules: &'a RuleTable,
    ranked: Vec<usize>,
}

impl<'a> Recommender<'a> {
    /// Order rules by lift descending, then confidence descending, then table position.
    pub fn new(rules: &'a RuleTable) -> Self {
        let mut ranked: Vec<usize> = (0..rules.len()).collect();
        let all = rules.rules();
        ranked.sort_by(|left, right| rank_order(&all[*left], &all[*right]));
        Self { rules, ranked }
    }

    /// Rules whose antecedent contains `target`, best first.
    pub fn ranked_rules<'s>(&'s self, target: &'s Item) -> impl Iterator<Item = &'a Rule> + 's
    where
        'a: 's,
    {
        let all = self.rules.rules();
        self.ranked
            .iter()
            .map(move |index| &all[*index])
            .filter(move |rule| rule.antecedent.contains(target))
    }

    /// Up to `count` consequents for `target`. No matching rule yields an empty sequence.
    pub fn recommend<'s>(
        &'s self,
        target: &'s Item,
        count: usize,
    ) -> Result<impl Iterator<Item = &'a Itemset> + 's, MiningError>
    where
        'a: 's,
    {
        validate_count(count)?;
        debug!(event_name = "recommend.query", target = %target, count, "recommendation query");
        Ok(self.ranked_rules(target).take(count).map(|rule| &rule.consequent))
    }
}

/// One-shot query returning owned consequents.
pub fn recommend(
    rules: &RuleTable,
    target: &Item,
    count: usize,
) -> Result<Vec<Itemset>, MiningError> {
    let recommender = Recommender::new(rules);
    let recommendations = recommender.recommend(target, count)?.cloned().collect();
    Ok(recommendations)
}

fn validate_count(count: usize) -> Result<(), MiningError> {
    if count == 0 {
        return Err(MiningError::InvalidParameter(
            "recommendation count must be at least 1".to_owned(),
        ));
    }
    Ok(())
}

fn rank_order(left: &Rule, right: &Rule) -> Ordering {
    right.lift.total_cmp(&left.lift).then_with(|| right.confidence.total_cmp(&left.confidence))
}

#[cfg(test)]
mod tests {
    use super::{recommend, Recommender};
    use crate::domain::item::Item;
    use crate::domain::itemset::Itemset;
    use crate::domain::transaction::TransactionSet;
    use crate::errors::MiningError;
    use crate::mining::{mine, FrequentItemsetTable};
    use crate::rules::{generate, RuleTable};

    fn itemset(items: &[&str]) -> Itemset {
        Itemset::new(items.iter().copied()).expect("non-empty itemset")
    }

    /// Rules with antecedent `t` and consequents `c1..c5` at chosen lift/confidence values.
    fn five_rule_table() -> RuleTable {
        // support(t) = 0.5; support(c_i) and support({t, c_i}) chosen so that
        // lift(c1)=1.6, lift(c2)=1.2 (conf 0.6), lift(c3)=1.2 (conf 0.3),
        // lift(c4)=0.8, lift(c5)=2.0
        let counts = vec![
            (itemset(&["t"]), 10),
            (itemset(&["c1"]), 5),
            (itemset(&["c2"]), 10),
            (itemset(&["c3"]), 5),
            (itemset(&["c4"]), 5),
            (itemset(&["c5"]), 2),
            (itemset(&["c1", "t"]), 4),
            (itemset(&["c2", "t"]), 6),
            (itemset(&["c3", "t"]), 3),
            (itemset(&["c4", "t"]), 2),
            (itemset(&["c5", "t"]), 2),
        ];
        let table = FrequentItemsetTable::from_counts(20, 0.05, counts);
        generate(&table, 0.05).expect("consistent table")
    }

    #[test]
    fn top_two_follow_lift_order() {
        let rules = five_rule_table();
        let target = Item::from("t");

        let top = recommend(&rules, &target, 2).expect("valid count");
        assert_eq!(top, vec![itemset(&["c5"]), itemset(&["c1"])]);
    }

    #[test]
    fn lift_ties_break_on_confidence() {
        let rules = five_rule_table();
        let recommender = Recommender::new(&rules);
        let target = Item::from("t");

        let ranked: Vec<_> = recommender.recommend(&target, 5).expect("valid count").collect();
        assert_eq!(
            ranked,
            vec![
                &itemset(&["c5"]),
                &itemset(&["c1"]),
                &itemset(&["c2"]),
                &itemset(&["c3"]),
                &itemset(&["c4"]),
            ]
        );
    }

    #[test]
    fn repeated_queries_are_stable() {
        let rules = five_rule_table();
        let recommender = Recommender::new(&rules);
        let target = Item::from("t");

        let first: Vec<_> = recommender.recommend(&target, 3).expect("valid count").collect();
        let second: Vec<_> = recommender.recommend(&target, 3).expect("valid count").collect();
        assert_eq!(first, second);

        let shorter: Vec<_> = recommender.recommend(&target, 1).expect("valid count").collect();
        assert_eq!(shorter, first[..1].to_vec());
    }

    #[test]
    fn unknown_target_yields_empty_sequence() {
        let transactions = TransactionSet::from_baskets(vec![
            ("T1", vec!["A", "B"]),
            ("T2", vec!["A", "B"]),
            ("T3", vec!["A"]),
            ("T4", vec!["B", "C"]),
        ])
        .expect("valid baskets");
        let table = mine(&transactions, 0.5).expect("valid support");
        let rules = generate(&table, 0.5).expect("consistent table");

        let recommendations = recommend(&rules, &Item::from("2_0"), 1).expect("valid count");
        assert!(recommendations.is_empty());
    }

    #[test]
    fn zero_count_is_invalid() {
        let rules = five_rule_table();
        let error = recommend(&rules, &Item::from("t"), 0).expect_err("count must be >= 1");
        assert!(matches!(error, MiningError::InvalidParameter(_)));
    }

    #[test]
    fn ranked_rules_only_include_matching_antecedents() {
        let rules = five_rule_table();
        let recommender = Recommender::new(&rules);
        let target = Item::from("c5");

        let ranked: Vec<_> = recommender.ranked_rules(&target).collect();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].consequent, itemset(&["t"]));
    }
}
