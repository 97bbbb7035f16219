pub mod item;
pub mod itemset;
pub mod transaction;
