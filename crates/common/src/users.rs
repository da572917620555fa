use database::{Database, RepositoryError};
use tracing::instrument;

/// Returns the id of the user called `name`, creating the user on first login.
#[instrument(skip(db))]
pub async fn find_or_create_user(db: &Database, name: &str) -> Result<i64, RepositoryError> {
    let mut uow = db.begin().await?;

    sqlx::query("INSERT INTO users (name) VALUES ($1) ON CONFLICT(name) DO NOTHING")
        .bind(name)
        .execute(&mut *uow.connection())
        .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE name = $1")
        .bind(name)
        .fetch_one(&mut *uow.connection())
        .await?;

    uow.commit().await?;
    Ok(id)
}
