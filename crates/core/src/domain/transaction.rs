use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::item::{BasketId, Item};
use crate::errors::MiningError;

/// One `(basket, item)` observation handed over by the ETL step.
///
/// Either field may be absent; `TransactionSet::build` rejects such rows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub basket_id: Option<String>,
    pub item: Option<String>,
}

impl RawRow {
    pub fn new(basket_id: impl Into<String>, item: impl Into<String>) -> Self {
        Self { basket_id: Some(basket_id.into()), item: Some(item.into()) }
    }
}

/// A basket: identifier plus the distinct items purchased together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: BasketId,
    items: BTreeSet<Item>,
}

impl Transaction {
    pub fn items(&self) -> &BTreeSet<Item> {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.items.contains(item)
    }
}

/// Read-only collection of baskets, ordered by first appearance of each basket id.
#[derive(Clone, Debug, Default)]
pub struct TransactionSet {
    transactions: Vec<Transaction>,
    positions: HashMap<BasketId, usize>,
}

impl TransactionSet {
    pub fn build<I>(rows: I) -> Result<Self, MiningError>
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut set = Self::default();
        let mut row_count = 0usize;

        for (index, row) in rows.into_iter().enumerate() {
            let row_number = index + 1;
            row_count = row_number;
            let basket_id = required_field(row.basket_id, row_number, "basket id")?;
            let item = required_field(row.item, row_number, "item")?;

            let basket_id = BasketId(basket_id);
            let position = match set.positions.get(&basket_id) {
                Some(position) => *position,
                None => {
                    let position = set.transactions.len();
                    set.positions.insert(basket_id.clone(), position);
                    set.transactions.push(Transaction { id: basket_id, items: BTreeSet::new() });
                    position
                }
            };
            set.transactions[position].items.insert(Item(item));
        }

        debug!(
            event_name = "transactions.built",
            rows = row_count,
            transactions = set.transactions.len(),
            "transaction set built"
        );
        Ok(set)
    }

    /// Convenience constructor from already grouped baskets.
    pub fn from_baskets<I, B, S, T>(baskets: I) -> Result<Self, MiningError>
    where
        I: IntoIterator<Item = (B, S)>,
        B: Into<String>,
        S: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut rows = Vec::new();
        for (basket_id, items) in baskets {
            let basket_id = basket_id.into();
            rows.extend(items.into_iter().map(|item| RawRow::new(basket_id.clone(), item)));
        }
        Self::build(rows)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn get(&self, basket_id: &BasketId) -> Option<&Transaction> {
        self.positions.get(basket_id).map(|position| &self.transactions[*position])
    }

    pub fn distinct_items(&self) -> BTreeSet<&Item> {
        self.transactions.iter().flat_map(|transaction| transaction.items.iter()).collect()
    }
}

impl<'a> IntoIterator for &'a TransactionSet {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}

fn required_field(value: Option<String>, row: usize, field: &str) -> Result<String, MiningError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_owned()),
        _ => Err(MiningError::MalformedInput { row, reason: format!("missing {field}") }),
    }
}
