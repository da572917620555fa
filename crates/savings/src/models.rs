use chrono::NaiveDate;
use common::money::to_cents;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct SavingsGoal {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub target_amount: i64,  // Cents
    pub current_amount: i64, // Cents, only ever increased by contributions
    pub target_date: NaiveDate,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSavingsGoalRequest {
    description: String,
    target_amount: i64,
    target_date: NaiveDate,
    category: Option<String>,
}

/// Goal as submitted by the create/edit form.
#[derive(Debug, Deserialize, Validate)]
pub struct RawSavingsGoalRequest {
    #[validate(length(min = 1, max = 200, message = "Description must be 1-200 characters"))]
    pub description: String,
    #[validate(range(min = 0.01, max = 1_000_000_000.0, message = "Target must be between 0.01 and 1000000000.00"))]
    pub target_dollars: f64,
    pub target_date: String,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContributionRequest {
    #[validate(range(min = 0.01, max = 1_000_000_000.0, message = "Contribution must be between 0.01 and 1000000000.00"))]
    pub amount_dollars: f64,
}

impl CreateSavingsGoalRequest {
    pub fn new(
        description: String,
        target_dollars: f64,
        target_date: &str,
        category: Option<String>,
    ) -> Result<Self, String> {
        let description = description.trim().to_string();
        if description.is_empty() {
            return Err("Description cannot be empty".to_string());
        }

        let target_amount = to_cents(target_dollars)?;
        let target_date = NaiveDate::parse_from_str(target_date, "%Y-%m-%d")
            .map_err(|_| "Invalid date format, expected YYYY-MM-DD".to_string())?;

        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            description,
            target_amount,
            target_date,
            category,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn target_amount(&self) -> i64 {
        self.target_amount
    }

    pub fn target_date(&self) -> NaiveDate {
        self.target_date
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

impl TryFrom<RawSavingsGoalRequest> for CreateSavingsGoalRequest {
    type Error = String;

    fn try_from(raw: RawSavingsGoalRequest) -> Result<Self, Self::Error> {
        raw.validate().map_err(|e| e.to_string())?;
        Self::new(raw.description, raw.target_dollars, &raw.target_date, raw.category)
    }
}
