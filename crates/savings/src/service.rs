use crate::models::{CreateSavingsGoalRequest, RawSavingsGoalRequest, SavingsGoal};
use common::money::to_cents;
use crate::repository::SavingsGoalRepository;
use database::{Database, RepositoryError};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum SavingsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Savings goal not found")]
    NotFound,
}

impl From<RepositoryError> for SavingsError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => SavingsError::NotFound,
            RepositoryError::CheckViolation(msg) => SavingsError::InvalidInput(msg),
            RepositoryError::Infrastructure(e) => SavingsError::Infrastructure(e.to_string()),
            _ => SavingsError::Infrastructure(err.to_string()),
        }
    }
}

pub struct SavingsService;

impl SavingsService {
    #[instrument(skip(db))]
    pub async fn create_goal(db: &Database, user_id: i64, form: RawSavingsGoalRequest) -> Result<i64, SavingsError> {
        let req = CreateSavingsGoalRequest::try_from(form).map_err(SavingsError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let mut repo = SavingsGoalRepository::new(uow.connection());

        let id = repo.create(user_id, &req).await?;

        uow.commit().await?;

        Ok(id)
    }

    #[instrument(skip(db))]
    pub async fn update_goal(
        db: &Database,
        user_id: i64,
        id: i64,
        form: RawSavingsGoalRequest,
    ) -> Result<SavingsGoal, SavingsError> {
        let req = CreateSavingsGoalRequest::try_from(form).map_err(SavingsError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let mut repo = SavingsGoalRepository::new(uow.connection());

        repo.update(user_id, id, &req).await?;
        let goal = repo.find_by_id(user_id, id).await?
            .ok_or(SavingsError::NotFound)?;

        uow.commit().await?;
        Ok(goal)
    }

    /// Adds money to a goal. Contributions only ever increase the saved amount.
    #[instrument(skip(db))]
    pub async fn contribute(
        db: &Database,
        user_id: i64,
        id: i64,
        amount_dollars: f64,
    ) -> Result<SavingsGoal, SavingsError> {
        let amount = to_cents(amount_dollars).map_err(SavingsError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let mut repo = SavingsGoalRepository::new(uow.connection());

        repo.add_contribution(user_id, id, amount).await?;
        let goal = repo.find_by_id(user_id, id).await?
            .ok_or(SavingsError::NotFound)?;

        uow.commit().await?;

        if goal.current_amount >= goal.target_amount {
            tracing::info!("Savings goal {} reached its target", goal.id);
        }
        Ok(goal)
    }

    #[instrument(skip(db))]
    pub async fn list_goals(db: &Database, user_id: i64) -> Result<Vec<SavingsGoal>, SavingsError> {
        let mut uow = db.begin().await?;
        let mut repo = SavingsGoalRepository::new(uow.connection());

        let goals = repo.list(user_id).await?;
        Ok(goals)
    }

    #[instrument(skip(db))]
    pub async fn get_goal(db: &Database, user_id: i64, id: i64) -> Result<SavingsGoal, SavingsError> {
        let mut uow = db.begin().await?;
        let mut repo = SavingsGoalRepository::new(uow.connection());

        let goal = repo.find_by_id(user_id, id).await?
            .ok_or(SavingsError::NotFound)?;
        Ok(goal)
    }

    #[instrument(skip(db))]
    pub async fn delete_goal(db: &Database, user_id: i64, id: i64) -> Result<(), SavingsError> {
        let mut uow = db.begin().await?;
        let mut repo = SavingsGoalRepository::new(uow.connection());

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

    fn form(description: &str, target: f64, date: &str) -> RawSavingsGoalRequest {
        RawSavingsGoalRequest {
            description: description.into(),
            target_dollars: target,
            target_date: date.into(),
            category: None,
        }
    }

    #[tokio::test]
    async fn test_create_goal_validation() {
        let db = get_test_db().await;
        let err = SavingsService::create_goal(&db, USER, form("", 100.0, "2026-12-01")).await;
        assert!(matches!(err, Err(SavingsError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_contribute_can_exceed_target() {
        let db = get_test_db().await;
        let id = SavingsService::create_goal(&db, USER, form("Laptop", 1000.0, "2026-12-01")).await.unwrap();

        SavingsService::contribute(&db, USER, id, 700.0).await.unwrap();
        let goal = SavingsService::contribute(&db, USER, id, 500.0).await.unwrap();
        assert_eq!(goal.current_amount, 120000);
        assert!(goal.current_amount > goal.target_amount);
    }

    #[tokio::test]
    async fn test_contribute_rejects_non_positive_amount() {
        let db = get_test_db().await;
        let id = SavingsService::create_goal(&db, USER, form("Laptop", 1000.0, "2026-12-01")).await.unwrap();

        assert!(matches!(SavingsService::contribute(&db, USER, id, 0.0).await, Err(SavingsError::InvalidInput(_))));
        assert!(matches!(SavingsService::contribute(&db, USER, id, -50.0).await, Err(SavingsError::InvalidInput(_))));
        assert_eq!(SavingsService::get_goal(&db, USER, id).await.unwrap().current_amount, 0);
    }

    #[tokio::test]
    async fn test_contribute_to_missing_goal() {
        let db = get_test_db().await;
        let err = SavingsService::contribute(&db, USER, 123, 5.0).await;
        assert!(matches!(err, Err(SavingsError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_and_delete_goal() {
        let db = get_test_db().await;
        let id = SavingsService::create_goal(&db, USER, form("Laptop", 1000.0, "2026-12-01")).await.unwrap();

        let goal = SavingsService::update_goal(&db, USER, id, form("Desktop", 1500.0, "2027-01-01")).await.unwrap();
        assert_eq!(goal.description, "Desktop");

        SavingsService::delete_goal(&db, USER, id).await.unwrap();
        assert!(SavingsService::list_goals(&db, USER).await.unwrap().is_empty());
    }
}
