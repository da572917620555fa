use crate::models::{CreateTransactionRequest, DateRange, Transaction, TransactionKind};
use chrono::{NaiveDate, NaiveDateTime};
use database::{self, RepositoryError};
use sqlx::FromRow;

const SELECT_TRANSACTIONS: &str = "SELECT t.id, t.user_id, t.description, t.amount, t.kind, t.category_id, c.name AS category, t.occurred_on, t.created_at \
     FROM transactions t LEFT JOIN categories c ON c.id = t.category_id";

#[derive(FromRow)]
struct TransactionRecord {
    id: i64,
    user_id: i64,
    description: String,
    amount: i64,
    kind: String,
    category_id: Option<i64>,
    category: Option<String>,
    occurred_on: NaiveDate,
    created_at: NaiveDateTime,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = RepositoryError;

    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        let kind = record
            .kind
            .parse::<TransactionKind>()
            .map_err(RepositoryError::InvalidData)?;

        Ok(Transaction {
            id: record.id,
            user_id: record.user_id,
            description: record.description,
            amount: record.amount,
            kind,
            category_id: record.category_id,
            category: record.category,
            occurred_on: record.occurred_on,
            created_at: record.created_at,
        })
    }
}

pub(crate) struct TransactionRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> TransactionRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, user_id: i64, req: &CreateTransactionRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO transactions (user_id, description, amount, kind, category_id, occurred_on) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(user_id)
        .bind(req.description())
        .bind(req.amount())
        .bind(req.kind().as_str())
        .bind(req.category_id())
        .bind(req.occurred_on())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn update(&mut self, user_id: i64, id: i64, req: &CreateTransactionRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE transactions SET description = $1, amount = $2, kind = $3, category_id = $4, occurred_on = $5 WHERE id = $6 AND user_id = $7",
        )
        .bind(req.description())
        .bind(req.amount())
        .bind(req.kind().as_str())
        .bind(req.category_id())
        .bind(req.occurred_on())
        .bind(id)
        .bind(user_id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn find_by_id(&mut self, user_id: i64, id: i64) -> Result<Option<Transaction>, RepositoryError> {
        let record = sqlx::query_as::<_, TransactionRecord>(&format!(
            "{} WHERE t.id = $1 AND t.user_id = $2",
            SELECT_TRANSACTIONS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        record.map(Transaction::try_from).transpose()
    }

    /// Transactions of the user, newest first. `None` bounds are open.
    pub async fn list_between(
        &mut self,
        user_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let records = sqlx::query_as::<_, TransactionRecord>(&format!(
            "{} WHERE t.user_id = $1 \
             AND ($2 IS NULL OR t.occurred_on >= $2) \
             AND ($3 IS NULL OR t.occurred_on <= $3) \
             AND ($4 IS NULL OR t.kind = $4) \
             ORDER BY t.occurred_on DESC, t.id DESC",
            SELECT_TRANSACTIONS
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(&mut *self.conn)
        .await?;

        records.into_iter().map(Transaction::try_from).collect()
    }

    pub async fn list_in_range(
        &mut self,
        user_id: i64,
        range: Option<DateRange>,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        self.list_between(user_id, range.map(|r| r.start), range.map(|r| r.end), kind).await
    }

    pub async fn delete(&mut self, user_id: i64, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
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
