use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Session-local record identifier.
pub type RecordId = u64;

/// Whether a record credits savings or counts as spending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    Income,
    Spent,
}

impl Category {
    /// Returns the opposite category, mirroring the entry form's toggle.
    pub fn toggled(self) -> Self {
        match self {
            Category::Income => Category::Spent,
            Category::Spent => Category::Income,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "income" => Some(Category::Income),
            "spent" | "expense" => Some(Category::Spent),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Income => "Income",
            Category::Spent => "Spent",
        };
        f.write_str(label)
    }
}

/// A single income or expense entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub id: RecordId,
    pub amount: f64,
    #[serde(default)]
    pub source: String,
    pub category: Category,
    pub date: NaiveDate,
}

/// Raw amount as supplied by a caller, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum AmountInput {
    Text(String),
    Number(f64),
}

impl AmountInput {
    /// Resolves the input to a finite, non-negative amount. Anything else becomes `0`.
    pub fn normalize(&self) -> f64 {
        let value = match self {
            AmountInput::Text(text) => parse_leading_number(text).unwrap_or(0.0),
            AmountInput::Number(value) => *value,
        };
        normalize_amount(value)
    }
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        AmountInput::Text(value.to_string())
    }
}

impl From<String> for AmountInput {
    fn from(value: String) -> Self {
        AmountInput::Text(value)
    }
}

impl From<f64> for AmountInput {
    fn from(value: f64) -> Self {
        AmountInput::Number(value)
    }
}

impl From<u32> for AmountInput {
    fn from(value: u32) -> Self {
        AmountInput::Number(f64::from(value))
    }
}

/// Maps non-finite, negative and zero amounts to `0`. Any other amount is kept as given.
pub fn normalize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parses the longest numeric prefix of `text`, so `"12.50 usd"` yields `12.5`.
/// Returns `None` when no digits lead the input.
pub fn parse_leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digit_count = end - digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        let fraction_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        digit_count += end - fraction_start;
    }
    if digit_count == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    trimmed[..end].parse::<f64>().ok()
}
