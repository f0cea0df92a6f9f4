use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::db::parse_decimal;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Buy,
    Sell,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Buy => "BUY",
            OperationKind::Sell => "SELL",
        }
    }
}

impl TryFrom<&str> for OperationKind {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, AppError> {
        match value {
            "BUY" => Ok(OperationKind::Buy),
            "SELL" => Ok(OperationKind::Sell),
            other => Err(AppError::Corrupt {
                column: "operations.type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only record of an executed buy or sell.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operation_id: Option<i64>,
    pub user_id: i64,
    pub symbol: String,
    pub shares: i64,
    pub price: Decimal,
    pub total: Decimal,
    pub timestamp: DateTime<Utc>,
    pub kind: OperationKind,
}

impl Operation {
    pub fn new(
        user_id: i64,
        kind: OperationKind,
        symbol: &str,
        shares: i64,
        price: Decimal,
    ) -> Self {
        Self {
            operation_id: None,
            user_id,
            symbol: symbol.to_string(),
            shares,
            price,
            total: price * Decimal::from(shares),
            timestamp: Utc::now(),
            kind,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct OperationRow {
    pub operation_id: i64,
    pub user_id: i64,
    pub symbol: String,
    pub shares: i64,
    pub price: String,
    pub total: String,
    pub timestamp: DateTime<Utc>,
    #[sqlx(rename = "type")]
    pub kind: String,
}

impl TryFrom<OperationRow> for Operation {
    type Error = AppError;

    fn try_from(row: OperationRow) -> Result<Self, AppError> {
        Ok(Self {
            operation_id: Some(row.operation_id),
            price: parse_decimal("operations.price", &row.price)?,
            total: parse_decimal("operations.total", &row.total)?,
            kind: row.kind.as_str().try_into()?,
            user_id: row.user_id,
            symbol: row.symbol,
            shares: row.shares,
            timestamp: row.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn total_is_price_times_shares() {
        let op = Operation::new(1, OperationKind::Sell, "NFLX", 3, dec!(12.5));
        assert_eq!(op.total, dec!(37.5));
        assert_eq!(op.kind.to_string(), "SELL");
    }

    #[test]
    fn unknown_kind_is_corrupt() {
        assert!(OperationKind::try_from("HOLD").is_err());
        assert_eq!(OperationKind::try_from("BUY").unwrap(), OperationKind::Buy);
    }
}
