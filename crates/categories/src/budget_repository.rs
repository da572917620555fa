use crate::models::{CreateMonthlyBudgetRequest, MonthlyBudget};
use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct MonthlyBudgetRecord {
    id: i64,
    user_id: i64,
    category_id: i64,
    month: String,
    amount: i64,
}

impl From<MonthlyBudgetRecord> for MonthlyBudget {
    fn from(record: MonthlyBudgetRecord) -> Self {
        MonthlyBudget {
            id: record.id,
            user_id: record.user_id,
            category_id: record.category_id,
            month: record.month,
            amount: record.amount,
        }
    }
}

pub(crate) struct MonthlyBudgetRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> MonthlyBudgetRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    /// One budget per (user, category, month): setting it again replaces the amount.
    pub async fn upsert(&mut self, user_id: i64, req: &CreateMonthlyBudgetRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO monthly_budgets (user_id, category_id, month, amount)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(user_id, category_id, month) DO UPDATE SET
            amount = excluded.amount
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(req.category_id())
        .bind(req.month())
        .bind(req.amount())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn get_for_month(&mut self, user_id: i64, month: &str) -> Result<Vec<MonthlyBudget>, RepositoryError> {
        let records = sqlx::query_as::<_, MonthlyBudgetRecord>(
            "SELECT id, user_id, category_id, month, amount FROM monthly_budgets WHERE user_id = $1 AND month = $2",
        )
        .bind(user_id)
        .bind(month)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(records.into_iter().map(|r| r.into()).collect())
    }

    pub async fn delete(&mut self, user_id: i64, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM monthly_budgets WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // "Auto-Copy" Logic
    // Copies budgets from source_month to target_month ONLY if target_month has no entries.
    pub async fn copy_budgets(&mut self, user_id: i64, source_month: &str, target_month: &str) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM monthly_budgets WHERE user_id = $1 AND month = $2")
            .bind(user_id)
            .bind(target_month)
            .fetch_one(&mut *self.conn)
            .await?;

        if count > 0 {
            return Ok(0); // Already exists, don't overwrite
        }

        let result = sqlx::query(
            r#"
            INSERT INTO monthly_budgets (user_id, category_id, month, amount)
            SELECT user_id, category_id, $1, amount FROM monthly_budgets WHERE user_id = $2 AND month = $3
            "#,
        )
        .bind(target_month)
        .bind(user_id)
        .bind(source_month)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::get_test_db;

    const USER: i64 = 1;

    async fn setup_category(conn: &mut database::Connection, name: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO categories (user_id, name, color, is_income, is_active) VALUES ($1, $2, '#000', 0, 1) RETURNING id",
        )
        .bind(USER)
        .bind(name)
        .fetch_one(&mut *conn)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_replaces_amount() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let cat_id = setup_category(uow.connection(), "Food").await;

        let mut repo = MonthlyBudgetRepository::new(uow.connection());
        let first = repo.upsert(USER, &CreateMonthlyBudgetRequest::new(cat_id, "2026-01".into(), 100.0).unwrap()).await.unwrap();
        let second = repo.upsert(USER, &CreateMonthlyBudgetRequest::new(cat_id, "2026-01".into(), 150.0).unwrap()).await.unwrap();
        assert_eq!(first, second);

        let budgets = repo.get_for_month(USER, "2026-01").await.unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].amount, 15000);
    }

    #[tokio::test]
    async fn test_copy_budgets_only_into_empty_month() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let food = setup_category(uow.connection(), "Food").await;
        let rent = setup_category(uow.connection(), "Rent").await;

        let mut repo = MonthlyBudgetRepository::new(uow.connection());
        repo.upsert(USER, &CreateMonthlyBudgetRequest::new(food, "2026-01".into(), 100.0).unwrap()).await.unwrap();
        repo.upsert(USER, &CreateMonthlyBudgetRequest::new(rent, "2026-01".into(), 900.0).unwrap()).await.unwrap();

        assert_eq!(repo.copy_budgets(USER, "2026-01", "2026-02").await.unwrap(), 2);
        assert_eq!(repo.copy_budgets(USER, "2026-01", "2026-02").await.unwrap(), 0);
        assert_eq!(repo.get_for_month(USER, "2026-02").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_budget() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let food = setup_category(uow.connection(), "Food").await;

        let mut repo = MonthlyBudgetRepository::new(uow.connection());
        let id = repo.upsert(USER, &CreateMonthlyBudgetRequest::new(food, "2026-01".into(), 100.0).unwrap()).await.unwrap();
        repo.delete(USER, id).await.unwrap();
        assert!(repo.get_for_month(USER, "2026-01").await.unwrap().is_empty());
        assert!(matches!(repo.delete(USER, id).await, Err(RepositoryError::NotFound)));
    }
}
