use crate::models::{
    CreateTransactionRequest, DateRange, MonthlySummary, RawCreateTransactionRequest, Transaction, TransactionKind,
};
use crate::repository::TransactionRepository;
use categories::models::first_day_of_month;
use categories::service::{CategoryError, CategoryService};
use chrono::{Days, Months, NaiveDate};
use database::{Database, RepositoryError};
use tracing::instrument;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Transaction not found")]
    NotFound,
}

impl From<RepositoryError> for TransactionError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => TransactionError::NotFound,
            RepositoryError::CheckViolation(msg) => TransactionError::InvalidInput(msg),
            RepositoryError::Infrastructure(e) => TransactionError::Infrastructure(e.to_string()),
            _ => TransactionError::Infrastructure(err.to_string()),
        }
    }
}

pub struct TransactionService;

impl TransactionService {
    /// Validates the form and checks that its category belongs to the user
    /// and matches the transaction kind.
    async fn validate(
        db: &Database,
        user_id: i64,
        form: RawCreateTransactionRequest,
    ) -> Result<CreateTransactionRequest, TransactionError> {
        form.validate().map_err(|e| TransactionError::InvalidInput(e.to_string()))?;
        let category_id = form.category_id().map_err(TransactionError::InvalidInput)?;

        if let Some(category_id) = category_id {
            let category = CategoryService::get_category(db, user_id, category_id)
                .await
                .map_err(|e| match e {
                    CategoryError::NotFound => TransactionError::InvalidInput("Invalid category ID".into()),
                    other => {
                        tracing::error!("Failed to get category for transaction: {:?}", other);
                        TransactionError::Infrastructure(other.to_string())
                    }
                })?;

            if category.is_income != (form.kind == TransactionKind::Income) {
                return Err(TransactionError::InvalidInput(format!(
                    "Category '{}' cannot hold {} transactions",
                    category.name, form.kind
                )));
            }
        }

        CreateTransactionRequest::new(form.description, form.amount_dollars, form.kind, category_id, &form.occurred_on)
            .map_err(TransactionError::InvalidInput)
    }

    #[instrument(skip(db, form))]
    pub async fn create_transaction(
        db: &Database,
        user_id: i64,
        form: RawCreateTransactionRequest,
    ) -> Result<i64, TransactionError> {
        let req = Self::validate(db, user_id, form).await?;

        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        let id = repo.create(user_id, &req).await?;

        uow.commit().await?;

        Ok(id)
    }

    #[instrument(skip(db, form))]
    pub async fn update_transaction(
        db: &Database,
        user_id: i64,
        id: i64,
        form: RawCreateTransactionRequest,
    ) -> Result<Transaction, TransactionError> {
        let req = Self::validate(db, user_id, form).await?;

        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        repo.update(user_id, id, &req).await?;

        let transaction = repo.find_by_id(user_id, id).await?
            .ok_or(TransactionError::NotFound)?;

        uow.commit().await?;

        Ok(transaction)
    }

    #[instrument(skip(db))]
    pub async fn get_transaction(db: &Database, user_id: i64, id: i64) -> Result<Transaction, TransactionError> {
        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        let transaction = repo.find_by_id(user_id, id).await?
            .ok_or(TransactionError::NotFound)?;

        Ok(transaction)
    }

    #[instrument(skip(db))]
    pub async fn list_in_range(
        db: &Database,
        user_id: i64,
        range: Option<DateRange>,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Transaction>, TransactionError> {
        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        let transactions = repo.list_in_range(user_id, range, kind).await?;

        Ok(transactions)
    }

    /// Like [`TransactionService::list_in_range`] with each bound optional.
    #[instrument(skip(db))]
    pub async fn list_between(
        db: &Database,
        user_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Transaction>, TransactionError> {
        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        let transactions = repo.list_between(user_id, start, end, kind).await?;

        Ok(transactions)
    }

    #[instrument(skip(db))]
    pub async fn get_month_view(
        db: &Database,
        user_id: i64,
        month: &str, // YYYY-MM
    ) -> Result<(Vec<Transaction>, MonthlySummary), TransactionError> {
        let first = first_day_of_month(month).map_err(TransactionError::InvalidInput)?;
        let last = first + Months::new(1) - Days::new(1);

        let transactions = Self::list_in_range(db, user_id, Some(DateRange::new(first, last)), None).await?;
        let summary = MonthlySummary::from_transactions(month, &transactions);

        Ok((transactions, summary))
    }

    #[instrument(skip(db))]
    pub async fn delete_transaction(db: &Database, user_id: i64, id: i64) -> Result<(), TransactionError> {
        let mut uow = db.begin().await?;
        let mut repo = TransactionRepository::new(uow.connection());

        repo.delete(user_id, id).await?;

        uow.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::get_test_db;

    const USER: i64 = 1;

    fn form(description: &str, dollars: f64, kind: TransactionKind, category_id: Option<i64>, date: &str) -> RawCreateTransactionRequest {
        RawCreateTransactionRequest {
            description: description.into(),
            amount_dollars: dollars,
            kind,
            category_id: category_id.map(|id| id.to_string()),
            occurred_on: date.into(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_transaction() {
        let db = get_test_db().await;
        let food = CategoryService::create_category(&db, USER, "Food".into(), false).await.unwrap();

        let id = TransactionService::create_transaction(&db, USER, form("Groceries", 42.1, TransactionKind::Expense, Some(food), "2026-01-05"))
            .await
            .unwrap();

        let t = TransactionService::get_transaction(&db, USER, id).await.unwrap();
        assert_eq!(t.amount, 4210);
        assert_eq!(t.category.as_deref(), Some("Food"));
    }

    #[tokio::test]
    async fn test_create_rejects_kind_mismatch() {
        let db = get_test_db().await;
        let salary = CategoryService::create_category(&db, USER, "Salary".into(), true).await.unwrap();

        let err = TransactionService::create_transaction(&db, USER, form("Oops", 5.0, TransactionKind::Expense, Some(salary), "2026-01-05")).await;
        assert!(matches!(err, Err(TransactionError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_category() {
        let db = get_test_db().await;
        let err = TransactionService::create_transaction(&db, USER, form("Oops", 5.0, TransactionKind::Expense, Some(77), "2026-01-05")).await;
        assert!(matches!(err, Err(TransactionError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_zero_amount() {
        let db = get_test_db().await;
        let err = TransactionService::create_transaction(&db, USER, form("Nothing", 0.0, TransactionKind::Expense, None, "2026-01-05")).await;
        assert!(matches!(err, Err(TransactionError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_amount_above_limit() {
        let db = get_test_db().await;
        let err = TransactionService::create_transaction(&db, USER, form("Windfall", 5e16, TransactionKind::Income, None, "2026-01-05")).await;
        assert!(matches!(err, Err(TransactionError::InvalidInput(_))));
        assert!(TransactionService::list_between(&db, USER, None, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_month_view_summary() {
        let db = get_test_db().await;
        TransactionService::create_transaction(&db, USER, form("Salary", 3000.0, TransactionKind::Income, None, "2026-02-01")).await.unwrap();
        TransactionService::create_transaction(&db, USER, form("Rent", 1200.0, TransactionKind::Expense, None, "2026-02-28")).await.unwrap();
        TransactionService::create_transaction(&db, USER, form("March rent", 1200.0, TransactionKind::Expense, None, "2026-03-01")).await.unwrap();

        let (transactions, summary) = TransactionService::get_month_view(&db, USER, "2026-02").await.unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(summary.total_income, 300000);
        assert_eq!(summary.total_expenses, 120000);
        assert_eq!(summary.net, 180000);
    }

    #[tokio::test]
    async fn test_month_view_rejects_bad_month() {
        let db = get_test_db().await;
        let err = TransactionService::get_month_view(&db, USER, "February").await;
        assert!(matches!(err, Err(TransactionError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete_transaction() {
        let db = get_test_db().await;
        let id = TransactionService::create_transaction(&db, USER, form("Cofee", 3.0, TransactionKind::Expense, None, "2026-01-05")).await.unwrap();

        let updated = TransactionService::update_transaction(&db, USER, id, form("Coffee", 3.5, TransactionKind::Expense, None, "2026-01-05"))
            .await
            .unwrap();
        assert_eq!(updated.description, "Coffee");
        assert_eq!(updated.amount, 350);

        TransactionService::delete_transaction(&db, USER, id).await.unwrap();
        let err = TransactionService::get_transaction(&db, USER, id).await;
        assert!(matches!(err, Err(TransactionError::NotFound)));
    }
}
