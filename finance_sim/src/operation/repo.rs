use sqlx::SqliteConnection;

use super::model::{Operation, OperationRow};
use crate::error::AppError;

pub struct OperationRepo;

impl OperationRepo {
    pub async fn insert(conn: &mut SqliteConnection, op: &Operation) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"INSERT INTO operations (user_id, symbol, shares, price, total, timestamp, type)
                VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(op.user_id)
        .bind(&op.symbol)
        .bind(op.shares)
        .bind(op.price.to_string())
        .bind(op.total.to_string())
        .bind(op.timestamp)
        .bind(op.kind.as_str())
        .execute(conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Newest first; rows sharing a timestamp keep insertion order reversed.
    pub async fn list_by_user(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<Vec<Operation>, AppError> {
        sqlx::query_as::<_, OperationRow>(
            r#"SELECT operation_id, user_id, symbol, shares, price, total, timestamp, type
                FROM operations WHERE user_id = ?
                ORDER BY timestamp DESC, operation_id DESC"#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await?
        .into_iter()
        .map(Operation::try_from)
        .collect()
    }
}
