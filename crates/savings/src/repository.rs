use crate::models::{CreateSavingsGoalRequest, SavingsGoal};
use chrono::NaiveDate;
use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct SavingsGoalRecord {
    id: i64,
    user_id: i64,
    description: String,
    target_amount: i64,
    current_amount: i64,
    target_date: NaiveDate,
    category: Option<String>,
}

impl From<SavingsGoalRecord> for SavingsGoal {
    fn from(record: SavingsGoalRecord) -> Self {
        SavingsGoal {
            id: record.id,
            user_id: record.user_id,
            description: record.description,
            target_amount: record.target_amount,
            current_amount: record.current_amount,
            target_date: record.target_date,
            category: record.category,
        }
    }
}

pub(crate) struct SavingsGoalRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> SavingsGoalRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, user_id: i64, req: &CreateSavingsGoalRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO savings_goals (user_id, description, target_amount, target_date, category) VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(user_id)
        .bind(req.description())
        .bind(req.target_amount())
        .bind(req.target_date())
        .bind(req.category())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn list(&mut self, user_id: i64) -> Result<Vec<SavingsGoal>, RepositoryError> {
        let records = sqlx::query_as::<_, SavingsGoalRecord>(
            "SELECT id, user_id, description, target_amount, current_amount, target_date, category FROM savings_goals WHERE user_id = $1 ORDER BY target_date, id",
        )
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(records.into_iter().map(|r| r.into()).collect())
    }

    pub async fn find_by_id(&mut self, user_id: i64, id: i64) -> Result<Option<SavingsGoal>, RepositoryError> {
        let record = sqlx::query_as::<_, SavingsGoalRecord>(
            "SELECT id, user_id, description, target_amount, current_amount, target_date, category FROM savings_goals WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(record.map(|r| r.into()))
    }

    /// Updates the goal definition; the saved amount is left untouched.
    pub async fn update(&mut self, user_id: i64, id: i64, req: &CreateSavingsGoalRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE savings_goals SET description = $1, target_amount = $2, target_date = $3, category = $4 WHERE id = $5 AND user_id = $6",
        )
        .bind(req.description())
        .bind(req.target_amount())
        .bind(req.target_date())
        .bind(req.category())
        .bind(id)
        .bind(user_id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn add_contribution(&mut self, user_id: i64, id: i64, amount: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE savings_goals SET current_amount = current_amount + $1 WHERE id = $2 AND user_id = $3",
        )
        .bind(amount)
        .bind(id)
        .bind(user_id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn delete(&mut self, user_id: i64, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM savings_goals WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
