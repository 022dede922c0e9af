//! Monthly aggregation of ledger transactions into per-category series

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ledger::Transaction;

/// Calendar month key, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Month containing the given date
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First day of this month
    pub fn first_day(&self) -> NaiveDate {
        // year/month always come from a valid NaiveDate
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Summed amount for one category in one month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyObservation {
    pub period: YearMonth,
    pub value: f64,
}

/// Chronological monthly totals for a single category
///
/// Periods are strictly increasing. Missing months are not filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySeries {
    pub category: String,
    pub observations: Vec<MonthlyObservation>,
}

impl CategorySeries {
    /// Number of observed months
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    /// First day of each observed month
    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.observations
            .iter()
            .map(|o| o.period.first_day())
            .collect()
    }

    pub fn last_period(&self) -> Option<YearMonth> {
        self.observations.last().map(|o| o.period)
    }
}

/// Group transactions by (category, month) and sum their amounts
///
/// The result is keyed by category name; each series is sorted by month.
pub fn aggregate_monthly(transactions: &[Transaction]) -> BTreeMap<String, CategorySeries> {
    let mut totals: BTreeMap<&str, BTreeMap<YearMonth, f64>> = BTreeMap::new();

    for tx in transactions {
        *totals
            .entry(tx.category.as_str())
            .or_default()
            .entry(YearMonth::of(tx.date))
            .or_insert(0.0) += tx.amount;
    }

    totals
        .into_iter()
        .map(|(category, months)| {
            let observations = months
                .into_iter()
                .map(|(period, value)| MonthlyObservation { period, value })
                .collect();
            (
                category.to_string(),
                CategorySeries {
                    category: category.to_string(),
                    observations,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(date: &str, category: &str, amount: f64) -> Transaction {
        Transaction {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category: category.to_string(),
            amount,
        }
    }

    #[test]
    fn test_year_month_ordering_and_succ() {
        let dec = YearMonth {
            year: 2023,
            month: 12,
        };
        let jan = dec.succ();
        assert_eq!(jan, YearMonth { year: 2024, month: 1 });
        assert!(dec < jan);
        assert_eq!(jan.succ(), YearMonth { year: 2024, month: 2 });
        assert_eq!(jan.first_day(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(dec.to_string(), "2023-12");
    }

    #[test]
    fn test_aggregate_sums_within_month() {
        let txs = vec![
            tx("2024-01-05", "Food", 100.0),
            tx("2024-01-25", "Food", 50.0),
            tx("2024-02-01", "Food", -30.0),
        ];

        let series = aggregate_monthly(&txs);
        let food = &series["Food"];
        assert_eq!(food.len(), 2);
        assert_eq!(food.values(), vec![150.0, -30.0]);
    }

    #[test]
    fn test_aggregate_sorts_unordered_input() {
        let txs = vec![
            tx("2024-03-10", "Rent", 3.0),
            tx("2023-11-10", "Rent", 1.0),
            tx("2024-01-10", "Rent", 2.0),
        ];

        let series = aggregate_monthly(&txs);
        let rent = &series["Rent"];
        let periods: Vec<String> = rent
            .observations
            .iter()
            .map(|o| o.period.to_string())
            .collect();
        assert_eq!(periods, vec!["2023-11", "2024-01", "2024-03"]);
        assert_eq!(rent.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_aggregate_does_not_fill_gaps() {
        let txs = vec![tx("2024-01-10", "Gym", 1.0), tx("2024-06-10", "Gym", 1.0)];
        let series = aggregate_monthly(&txs);
        assert_eq!(series["Gym"].len(), 2);
    }

    #[test]
    fn test_aggregate_one_series_per_category() {
        let txs = vec![
            tx("2024-01-10", "A", 1.0),
            tx("2024-01-10", "B", 2.0),
            tx("2024-01-11", "A", 3.0),
        ];
        let series = aggregate_monthly(&txs);
        assert_eq!(series.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(series["A"].values(), vec![4.0]);
        assert_eq!(series["B"].category, "B");
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate_monthly(&[]).is_empty());
    }
}
