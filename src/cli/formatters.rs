use chrono::NaiveDate;

use crate::{
    config::{Config, DateStyle},
    ledger::{Totals, TransactionRecord},
};

/// Renders amounts and dates according to the active [`Config`].
#[derive(Debug, Clone)]
pub struct Formatters {
    currency_symbol: String,
    date_style: DateStyle,
}

impl Formatters {
    pub fn new(config: &Config) -> Self {
        Self {
            currency_symbol: config.currency_symbol.clone(),
            date_style: config.date_style,
        }
    }

    /// Two decimals with the currency symbol in front, sign before the symbol.
    pub fn amount(&self, amount: f64) -> String {
        if amount < 0.0 {
            format!("-{}{:.2}", self.currency_symbol, -amount)
        } else {
            format!("{}{:.2}", self.currency_symbol, amount)
        }
    }

    pub fn date(&self, date: NaiveDate) -> String {
        match self.date_style {
            DateStyle::Long => date.format("%B %-d, %Y").to_string(),
            DateStyle::Iso => date.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn record(&self, record: &TransactionRecord) -> String {
        let source = if record.source.is_empty() {
            "-"
        } else {
            record.source.as_str()
        };
        format!(
            "#{:<4} {:<7} {:>12}  {:<20} {}",
            record.id,
            record.category.to_string(),
            self.amount(record.amount),
            source,
            self.date(record.date)
        )
    }

    pub fn totals(&self, totals: &Totals) -> Vec<String> {
        vec![
            format!("Net balance:  {}", self.amount(totals.net)),
            format!("Total spent:  {}", self.amount(totals.spent)),
            format!("Total saved:  {}", self.amount(totals.saved)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Category;

    #[test]
    fn long_dates_read_like_prose() {
        let formatters = Formatters::new(&Config::default());
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(formatters.date(date), "January 1, 2023");
    }

    #[test]
    fn amounts_have_two_decimals_and_leading_sign() {
        let formatters = Formatters::new(&Config::default());
        assert_eq!(formatters.amount(12.5), "$12.50");
        assert_eq!(formatters.amount(-20.0), "-$20.00");
    }

    #[test]
    fn record_row_uses_dash_for_missing_source() {
        let config = Config {
            date_style: DateStyle::Iso,
            ..Config::default()
        };
        let formatters = Formatters::new(&config);
        let record = TransactionRecord {
            id: 3,
            amount: 4.0,
            source: String::new(),
            category: Category::Spent,
            date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        };
        let row = formatters.record(&record);
        assert!(row.starts_with("#3"));
        assert!(row.contains("Spent"));
        assert!(row.contains("$4.00"));
        assert!(row.contains(" - "));
        assert!(row.ends_with("2024-02-29"));
    }
}
