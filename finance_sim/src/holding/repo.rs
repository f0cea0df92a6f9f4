use sqlx::SqliteConnection;

use super::model::{Holding, HoldingRow};
use crate::error::AppError;

pub struct HoldingRepo;

impl HoldingRepo {
    pub async fn find(
        conn: &mut SqliteConnection,
        user_id: i64,
        symbol: &str,
    ) -> Result<Option<Holding>, AppError> {
        sqlx::query_as::<_, HoldingRow>(
            r#"SELECT user_id, symbol, shares, avg_price, cur_price, cost_basis, present_value
                FROM holdings WHERE user_id = ? AND symbol = ?"#,
        )
        .bind(user_id)
        .bind(symbol)
        .fetch_optional(conn)
        .await?
        .map(Holding::try_from)
        .transpose()
    }

    pub async fn list_by_user(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<Vec<Holding>, AppError> {
        sqlx::query_as::<_, HoldingRow>(
            r#"SELECT user_id, symbol, shares, avg_price, cur_price, cost_basis, present_value
                FROM holdings WHERE user_id = ? ORDER BY symbol"#,
        )
        .bind(user_id)
        .fetch_all(conn)
        .await?
        .into_iter()
        .map(Holding::try_from)
        .collect()
    }

    pub async fn insert(conn: &mut SqliteConnection, holding: &Holding) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO holdings (user_id, symbol, shares, avg_price,
                cur_price, cost_basis, present_value)
                VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(holding.user_id)
        .bind(&holding.symbol)
        .bind(holding.shares)
        .bind(holding.avg_price.to_string())
        .bind(holding.cur_price.to_string())
        .bind(holding.cost_basis.to_string())
        .bind(holding.present_value.to_string())
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn update(conn: &mut SqliteConnection, holding: &Holding) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE holdings
            SET shares = ?, avg_price = ?, cur_price = ?, cost_basis = ?, present_value = ?
            WHERE user_id = ? AND symbol = ?"#,
        )
        .bind(holding.shares)
        .bind(holding.avg_price.to_string())
        .bind(holding.cur_price.to_string())
        .bind(holding.cost_basis.to_string())
        .bind(holding.present_value.to_string())
        .bind(holding.user_id)
        .bind(&holding.symbol)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn delete(
        conn: &mut SqliteConnection,
        user_id: i64,
        symbol: &str,
    ) -> Result<(), AppError> {
        sqlx::query(r#"DELETE FROM holdings WHERE user_id = ? AND symbol = ?"#)
            .bind(user_id)
            .bind(symbol)
            .execute(conn)
            .await?;
        Ok(())
    }
}
