use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::item::Item;
use crate::errors::MiningError;

/// Non-empty set of distinct items, stored sorted so that equal sets compare equal.
///
/// Itemsets order by size first and then lexicographically, which gives frequent-itemset
/// tables a canonical level-by-level iteration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Item>", into = "Vec<Item>")]
pub struct Itemset(Vec<Item>);

impl Itemset {
    pub fn new<I, T>(items: I) -> Result<Self, MiningError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Item>,
    {
        let mut items: Vec<Item> = items.into_iter().map(Into::into).collect();
        if items.is_empty() {
            return Err(MiningError::InvalidParameter("itemset must not be empty".to_owned()));
        }
        items.sort_unstable();
        items.dedup();
        Ok(Self(items))
    }

    pub fn singleton(item: Item) -> Self {
        Self(vec![item])
    }

    /// Caller guarantees `items` is non-empty, sorted and free of duplicates.
    pub(crate) fn from_sorted(items: Vec<Item>) -> Self {
        debug_assert!(!items.is_empty());
        debug_assert!(items.windows(2).all(|pair| pair[0] < pair[1]));
        Self(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.0.iter()
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.0.binary_search(item).is_ok()
    }

    pub fn is_subset_of(&self, other: &Itemset) -> bool {
        self.0.iter().all(|item| other.contains(item))
    }

    pub fn is_disjoint(&self, other: &Itemset) -> bool {
        self.0.iter().all(|item| !other.contains(item))
    }

    /// The itemset with the element at `index` removed, or `None` when that would leave it empty.
    pub fn without(&self, index: usize) -> Option<Itemset> {
        if self.0.len() <= 1 || index >= self.0.len() {
            return None;
        }
        let mut items = self.0.clone();
        items.remove(index);
        Some(Self(items))
    }

    pub fn union(&self, other: &Itemset) -> Itemset {
        let mut items = self.0.clone();
        items.extend(other.0.iter().cloned());
        items.sort_unstable();
        items.dedup();
        Self(items)
    }
}

impl Ord for Itemset {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.len().cmp(&other.0.len()).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Itemset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<Vec<Item>> for Itemset {
    type Error = MiningError;

    fn try_from(items: Vec<Item>) -> Result<Self, Self::Error> {
        Self::new(items)
    }
}

impl From<Itemset> for Vec<Item> {
    fn from(itemset: Itemset) -> Self {
        itemset.0
    }
}

impl<'a> IntoIterator for &'a Itemset {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Itemset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, item) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            f.write_str(item.as_str())?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::Itemset;
    use crate::domain::item::Item;
    use crate::errors::MiningError;

    #[test]
    fn new_sorts_and_collapses_duplicates() {
        let itemset = Itemset::new(["b", "a", "b"]).expect("non-empty itemset");

        assert_eq!(itemset.items(), &[Item::from("a"), Item::from("b")]);
        assert_eq!(itemset.to_string(), "{a, b}");
    }

    #[test]
    fn empty_itemset_is_rejected() {
        let error = Itemset::new(Vec::<Item>::new()).expect_err("empty itemset must fail");
        assert!(matches!(error, MiningError::InvalidParameter(_)));
    }

    #[test]
    fn ordering_is_size_first_then_lexicographic() {
        let single_z = Itemset::new(["z"]).expect("itemset");
        let pair = Itemset::new(["a", "b"]).expect("itemset");
        let other_pair = Itemset::new(["a", "c"]).expect("itemset");

        assert!(single_z < pair);
        assert!(pair < other_pair);
    }

    #[test]
    fn subset_and_disjoint_checks() {
        let ab = Itemset::new(["a", "b"]).expect("itemset");
        let abc = Itemset::new(["a", "b", "c"]).expect("itemset");
        let d = Itemset::new(["d"]).expect("itemset");

        assert!(ab.is_subset_of(&abc));
        assert!(!abc.is_subset_of(&ab));
        assert!(ab.is_disjoint(&d));
        assert_eq!(ab.union(&d), Itemset::new(["a", "b", "d"]).expect("itemset"));
        assert_eq!(abc.without(1), Some(Itemset::new(["a", "c"]).expect("itemset")));
        assert_eq!(d.without(0), None);
    }

    #[test]
    fn deserialization_enforces_non_empty() {
        let parsed: Result<Itemset, _> = serde_json::from_str("[]");
        assert!(parsed.is_err());

        let parsed: Itemset = serde_json::from_str(r#"["9_4","2_0"]"#).expect("valid itemset");
        assert_eq!(parsed.to_string(), "{2_0, 9_4}");
    }
}
