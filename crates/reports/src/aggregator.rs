//! Pure folds over already-fetched records that produce the report figures.
//!
//! Amounts are integer cents. Every function is total: empty input yields
//! zeroed summaries or empty lists and a zero denominator yields 0%.
//! Sums saturate at `i64::MAX` instead of overflowing.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use transactions::models::{Transaction, TransactionKind};

pub use savings::progress::{savings_goal_progress, SavingsGoalProgress};

/// Label used for transactions without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryBreakdown {
    pub category: String,
    pub total: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyEvolution {
    pub month_key: String, // YYYY-MM
    pub month_label: String,
    pub income: i64,
    pub expense: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub total_income: i64,
    pub total_expense: i64,
    pub balance: i64,
    pub savings_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodComparison {
    pub percentage_change: f64,
    pub is_positive: bool,
}

fn percentage(part: i64, total: i64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

fn category_label(t: &Transaction) -> &str {
    match t.category.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => UNCATEGORIZED,
    }
}

pub fn category_breakdown(transactions: &[Transaction], kind: TransactionKind) -> Vec<CategoryBreakdown> {
    let mut groups: HashMap<&str, i64> = HashMap::new();
    for t in transactions.iter().filter(|t| t.kind == kind) {
        let sum = groups.entry(category_label(t)).or_insert(0);
        *sum = sum.saturating_add(t.amount);
    }

    let total = groups.values().fold(0i64, |acc, sum| acc.saturating_add(*sum));

    let mut breakdown: Vec<CategoryBreakdown> = groups
        .into_iter()
        .map(|(category, sum)| CategoryBreakdown {
            category: category.to_string(),
            total: sum,
            percentage: percentage(sum, total),
        })
        .collect();

    breakdown.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    breakdown
}

pub fn monthly_evolution(transactions: &[Transaction]) -> Vec<MonthlyEvolution> {
    // (year, month) -> (a date in that month, income, expense)
    let mut months: BTreeMap<(i32, u32), (NaiveDate, i64, i64)> = BTreeMap::new();
    for t in transactions {
        let key = (t.occurred_on.year(), t.occurred_on.month());
        let entry = months.entry(key).or_insert((t.occurred_on, 0, 0));
        match t.kind {
            TransactionKind::Income => entry.1 = entry.1.saturating_add(t.amount),
            TransactionKind::Expense => entry.2 = entry.2.saturating_add(t.amount),
        }
    }

    months
        .into_values()
        .map(|(date, income, expense)| MonthlyEvolution {
            month_key: date.format("%Y-%m").to_string(),
            month_label: date.format("%b %Y").to_string(),
            income,
            expense,
            balance: income.saturating_sub(expense),
        })
        .collect()
}

pub fn summary(transactions: &[Transaction]) -> Summary {
    let total_of = |kind: TransactionKind| -> i64 {
        transactions
            .iter()
            .filter(|t| t.kind == kind)
            .fold(0i64, |acc, t| acc.saturating_add(t.amount))
    };
    let total_income = total_of(TransactionKind::Income);
    let total_expense = total_of(TransactionKind::Expense);
    let balance = total_income.saturating_sub(total_expense);

    Summary {
        total_income,
        total_expense,
        balance,
        savings_rate: if total_income > 0 { balance as f64 / total_income as f64 * 100.0 } else { 0.0 },
    }
}

/// A previous total of zero reports a 0% change, whatever the current total.
pub fn period_comparison(current: i64, previous: i64) -> PeriodComparison {
    let percentage_change = if previous > 0 {
        ((current as f64 - previous as f64) / previous as f64).abs() * 100.0
    } else {
        0.0
    };

    PeriodComparison {
        percentage_change,
        is_positive: current >= previous,
    }
}
