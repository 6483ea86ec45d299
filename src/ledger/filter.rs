use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::{Category, TransactionRecord};

/// Category selection applied to the record list. View state only; never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Income,
    Spent,
}

impl CategoryFilter {
    pub fn matches(self, record: &TransactionRecord) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Income => record.category == Category::Income,
            CategoryFilter::Spent => record.category == Category::Spent,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Some(CategoryFilter::All),
            other => Category::parse(other).map(Self::from),
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        match category {
            Category::Income => CategoryFilter::Income,
            Category::Spent => CategoryFilter::Spent,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CategoryFilter::All => "All",
            CategoryFilter::Income => "Income",
            CategoryFilter::Spent => "Spent",
        };
        f.write_str(label)
    }
}

/// Newest-first view over `records` restricted to `filter`.
pub fn newest_first<'a>(
    records: &'a [TransactionRecord],
    filter: CategoryFilter,
) -> impl Iterator<Item = &'a TransactionRecord> + 'a {
    records.iter().rev().filter(move |record| filter.matches(record))
}
