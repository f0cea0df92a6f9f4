use rust_decimal::Decimal;
use sqlx::SqliteConnection;

use super::model::{User, UserRow};
use crate::db::parse_decimal;
use crate::error::AppError;

pub struct UserRepo;

impl UserRepo {
    /// Maps a unique-index violation on `username` to `DuplicateUsername`.
    pub async fn insert(
        conn: &mut SqliteConnection,
        username: &str,
        hash: &str,
        cash: Decimal,
    ) -> Result<i64, AppError> {
        let result = sqlx::query(r#"INSERT INTO users (username, hash, cash) VALUES (?, ?, ?)"#)
            .bind(username)
            .bind(hash)
            .bind(cash.to_string())
            .execute(conn)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::DuplicateUsername
                }
                e => AppError::Database(e),
            })?;
        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_username(
        conn: &mut SqliteConnection,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(
            r#"SELECT id, username, hash, cash FROM users WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(conn)
        .await?
        .map(User::try_from)
        .transpose()
    }

    /// A session for a user that no longer exists is an authentication failure.
    pub async fn get_cash(conn: &mut SqliteConnection, user_id: i64) -> Result<Decimal, AppError> {
        let row: Option<(String,)> = sqlx::query_as(r#"SELECT cash FROM users WHERE id = ?"#)
            .bind(user_id)
            .fetch_optional(conn)
            .await?;
        match row {
            Some((cash,)) => parse_decimal("users.cash", &cash),
            None => Err(AppError::Authentication(
                "your session refers to an unknown user, please log in again".to_string(),
            )),
        }
    }

    pub async fn update_cash(
        conn: &mut SqliteConnection,
        user_id: i64,
        cash: Decimal,
    ) -> Result<(), AppError> {
        sqlx::query(r#"UPDATE users SET cash = ? WHERE id = ?"#)
            .bind(cash.to_string())
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
