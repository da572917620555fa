use crate::aggregator::{
    category_breakdown, monthly_evolution, period_comparison, savings_goal_progress, summary,
    CategoryBreakdown, MonthlyEvolution, PeriodComparison, SavingsGoalProgress, Summary,
};
use crate::period::ReportPeriod;
use chrono::NaiveDate;
use database::Database;
use savings::models::SavingsGoal;
use savings::service::{SavingsError, SavingsService};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use transactions::models::{DateRange, TransactionKind};
use transactions::service::{TransactionError, TransactionService};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
}

impl From<TransactionError> for ReportError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::InvalidInput(msg) => ReportError::InvalidInput(msg),
            other => ReportError::Infrastructure(other.to_string()),
        }
    }
}

impl From<SavingsError> for ReportError {
    fn from(err: SavingsError) -> Self {
        match err {
            SavingsError::InvalidInput(msg) => ReportError::InvalidInput(msg),
            other => ReportError::Infrastructure(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalReport {
    pub goal: SavingsGoal,
    pub progress: SavingsGoalProgress,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportOverview {
    pub period: ReportPeriod,
    pub range: Option<DateRange>,
    pub summary: Summary,
    /// `None` when the period has no previous window.
    pub income_comparison: Option<PeriodComparison>,
    pub expense_comparison: Option<PeriodComparison>,
    pub expense_breakdown: Vec<CategoryBreakdown>,
    pub income_breakdown: Vec<CategoryBreakdown>,
    pub evolution: Vec<MonthlyEvolution>,
    pub goals: Vec<GoalReport>,
}

pub struct ReportService;

impl ReportService {
    #[instrument(skip(db))]
    pub async fn build_overview(
        db: &Database,
        user_id: i64,
        period: ReportPeriod,
        today: NaiveDate,
    ) -> Result<ReportOverview, ReportError> {
        let range = period.range(today);
        let transactions = TransactionService::list_in_range(db, user_id, range, None).await?;
        let current = summary(&transactions);

        let (income_comparison, expense_comparison) = match period.previous_range(today) {
            Some(previous_range) => {
                let previous = Self::previous_summary(db, user_id, previous_range).await?;
                (
                    Some(period_comparison(current.total_income, previous.total_income)),
                    Some(period_comparison(current.total_expense, previous.total_expense)),
                )
            }
            None => (None, None),
        };

        let goals = SavingsService::list_goals(db, user_id)
            .await?
            .into_iter()
            .map(|goal| GoalReport {
                progress: savings_goal_progress(&goal, today),
                goal,
            })
            .collect();

        tracing::debug!("Aggregated {} transactions for {:?}", transactions.len(), period);

        Ok(ReportOverview {
            period,
            range,
            summary: current,
            income_comparison,
            expense_comparison,
            expense_breakdown: category_breakdown(&transactions, TransactionKind::Expense),
            income_breakdown: category_breakdown(&transactions, TransactionKind::Income),
            evolution: monthly_evolution(&transactions),
            goals,
        })
    }

    async fn previous_summary(db: &Database, user_id: i64, range: DateRange) -> Result<Summary, ReportError> {
        let transactions = TransactionService::list_in_range(db, user_id, Some(range), None).await?;
        Ok(summary(&transactions))
    }
}
