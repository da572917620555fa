use chrono::NaiveDate;
use common::money::to_cents;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub color: String,
    pub is_income: bool,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub color: String,
    pub is_income: bool,
    pub is_active: bool,
}

#[derive(Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "Category name must be 1-50 characters"))]
    pub name: String,
    pub color: Option<String>,
    pub is_income: bool,
    pub is_active: bool,
}

impl CreateCategoryRequest {
    pub fn new(name: String, color: String, is_income: bool) -> Result<Self, String> {
        if name.trim().is_empty() {
            return Err("Category name cannot be empty".to_string());
        }

        Ok(Self {
            name: name.trim().to_string(),
            color,
            is_income,
            is_active: true,
        })
    }
}

/// Parses a `YYYY-MM` month into its first day.
pub fn first_day_of_month(month: &str) -> Result<NaiveDate, String> {
    if month.len() != 7 {
        return Err("Invalid month format. Expected YYYY-MM".to_string());
    }
    NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .map_err(|_| "Invalid month format. Expected YYYY-MM".to_string())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MonthlyBudget {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub month: String, // YYYY-MM
    pub amount: i64,   // Cents
}

#[derive(Debug, Serialize)]
pub struct CreateMonthlyBudgetRequest {
    category_id: i64,
    month: String,
    amount: i64,
}

impl CreateMonthlyBudgetRequest {
    pub fn new(category_id: i64, month: String, amount_dollars: f64) -> Result<Self, String> {
        let amount = to_cents(amount_dollars)?;

        first_day_of_month(&month)?;

        Ok(Self {
            category_id,
            month,
            amount,
        })
    }

    pub fn category_id(&self) -> i64 {
        self.category_id
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }
}

// Combined View Model for the UI
#[derive(Debug, Serialize, Clone)]
pub struct CategoryBudgetView {
    pub category: Category,
    pub budget: Option<MonthlyBudget>, // None if no budget set for this month
    pub spent: i64,
    pub remaining: i64,
    pub percent_spent: f64,
    pub percent_remaining: f64,
}

impl CategoryBudgetView {
    pub fn new(category: Category, budget: Option<MonthlyBudget>) -> Self {
        Self {
            category,
            budget,
            spent: 0,
            remaining: 0,
            percent_spent: 0.0,
            percent_remaining: 0.0,
        }
    }

    pub fn limit(&self) -> i64 {
        self.budget.as_ref().map(|b| b.amount).unwrap_or(0)
    }

    /// Fills in progress against the budget from the month's actual total.
    ///
    /// For expense categories `remaining` is what is left to spend; for income
    /// categories it is how far actual income is ahead of the target. Either
    /// way a negative value means the category is behind.
    pub fn with_spent(mut self, spent: i64) -> Self {
        let limit = self.limit();
        self.spent = spent;
        self.remaining = if self.category.is_income {
            spent - limit
        } else {
            limit - spent
        };

        if limit > 0 {
            self.percent_spent = spent as f64 / limit as f64 * 100.0;
            self.percent_remaining = self.remaining as f64 / limit as f64 * 100.0;
        } else {
            self.percent_spent = 0.0;
            self.percent_remaining = 0.0;
        }
        self
    }

    pub fn is_over_budget(&self) -> bool {
        self.budget.is_some() && self.remaining < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(is_income: bool) -> Category {
        Category {
            id: 1,
            user_id: 1,
            name: "Groceries".into(),
            color: "#ffffff".into(),
            is_income,
            is_active: true,
        }
    }

    fn budget(amount: i64) -> MonthlyBudget {
        MonthlyBudget { id: 1, user_id: 1, category_id: 1, month: "2026-01".into(), amount }
    }

    #[test]
    fn test_create_category_request_valid() {
        let req = CreateCategoryRequest::new("  Groceries ".to_string(), "#ffffff".to_string(), false).unwrap();
        assert_eq!(req.name, "Groceries");
        assert_eq!(req.color, "#ffffff");
        assert!(req.is_active);
    }

    #[test]
    fn test_create_category_request_empty() {
        assert!(CreateCategoryRequest::new("   ".to_string(), "#ffffff".to_string(), false).is_err());
    }

    #[test]
    fn test_budget_request_converts_to_cents() {
        let req = CreateMonthlyBudgetRequest::new(3, "2026-02".into(), 250.5).unwrap();
        assert_eq!(req.amount(), 25050);
        assert_eq!(req.month(), "2026-02");
    }

    #[test]
    fn test_budget_request_rejects_non_positive_amount() {
        assert!(CreateMonthlyBudgetRequest::new(3, "2026-02".into(), 0.0).is_err());
        assert!(CreateMonthlyBudgetRequest::new(3, "2026-02".into(), -10.0).is_err());
        assert!(CreateMonthlyBudgetRequest::new(3, "2026-02".into(), 2e9).is_err());
    }

    #[test]
    fn test_budget_request_rejects_bad_month() {
        assert!(CreateMonthlyBudgetRequest::new(3, "2026-13".into(), 10.0).is_err());
        assert!(CreateMonthlyBudgetRequest::new(3, "202602".into(), 10.0).is_err());
    }

    #[test]
    fn test_expense_budget_progress() {
        let view = CategoryBudgetView::new(category(false), Some(budget(20000))).with_spent(25000);
        assert_eq!(view.remaining, -5000);
        assert_eq!(view.percent_spent, 125.0);
        assert!(view.is_over_budget());
    }

    #[test]
    fn test_income_budget_progress() {
        let view = CategoryBudgetView::new(category(true), Some(budget(100000))).with_spent(120000);
        assert_eq!(view.remaining, 20000);
        assert!(!view.is_over_budget());
    }

    #[test]
    fn test_progress_without_budget_is_zero_percent() {
        let view = CategoryBudgetView::new(category(false), None).with_spent(5000);
        assert_eq!(view.percent_spent, 0.0);
        assert!(!view.is_over_budget());
    }
}
