use chrono::{NaiveDate, NaiveDateTime};
use common::money::to_cents;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("Unknown transaction kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub amount: i64, // Cents, always positive
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub category: Option<String>, // Name of the category, if any
    pub occurred_on: NaiveDate,
    pub created_at: NaiveDateTime,
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTransactionRequest {
    description: String,
    amount: i64,
    kind: TransactionKind,
    category_id: Option<i64>,
    occurred_on: NaiveDate,
}

/// Transaction as submitted by the create/edit form.
#[derive(Debug, Deserialize, Validate)]
pub struct RawCreateTransactionRequest {
    #[validate(length(min = 1, max = 200, message = "Description must be 1-200 characters"))]
    pub description: String,
    #[validate(range(min = 0.01, max = 1_000_000_000.0, message = "Amount must be between 0.01 and 1000000000.00"))]
    pub amount_dollars: f64,
    pub kind: TransactionKind,
    pub category_id: Option<String>,
    pub occurred_on: String,
}

impl RawCreateTransactionRequest {
    /// Empty select values mean "no category".
    pub fn category_id(&self) -> Result<Option<i64>, String> {
        match self.category_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| "Invalid category ID".to_string()),
        }
    }
}

impl CreateTransactionRequest {
    pub fn new(
        description: String,
        amount_dollars: f64,
        kind: TransactionKind,
        category_id: Option<i64>,
        occurred_on: &str,
    ) -> Result<Self, String> {
        let description = description.trim().to_string();
        if description.is_empty() {
            return Err("Description cannot be empty".to_string());
        }

        let occurred_on = NaiveDate::parse_from_str(occurred_on, "%Y-%m-%d")
            .map_err(|_| "Invalid date format, expected YYYY-MM-DD".to_string())?;

        let amount = to_cents(amount_dollars)?;

        Ok(Self {
            description,
            amount,
            kind,
            category_id,
            occurred_on,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn category_id(&self) -> Option<i64> {
        self.category_id
    }

    pub fn occurred_on(&self) -> NaiveDate {
        self.occurred_on
    }
}

#[derive(Debug, Serialize)]
pub struct MonthlySummary {
    pub month: String,
    pub total_income: i64,
    pub total_expenses: i64,
    pub net: i64,
}

impl MonthlySummary {
    pub fn from_transactions(month: &str, transactions: &[Transaction]) -> Self {
        let mut total_income: i64 = 0;
        let mut total_expenses: i64 = 0;

        for t in transactions {
            match t.kind {
                TransactionKind::Income => total_income = i64::saturating_add(total_income, t.amount),
                TransactionKind::Expense => total_expenses = i64::saturating_add(total_expenses, t.amount),
            }
        }

        Self {
            month: month.to_string(),
            total_income,
            total_expenses,
            net: i64::saturating_sub(total_income, total_expenses),
        }
    }
}
