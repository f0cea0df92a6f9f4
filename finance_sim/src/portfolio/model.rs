use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppError;
use crate::holding::model::Holding;
use crate::operation::model::OperationKind;

#[derive(Debug, Default, Deserialize)]
pub struct TradeForm {
    pub symbol: Option<String>,
    pub shares: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteForm {
    pub symbol: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BalanceForm {
    pub balance: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceAction {
    Deposit,
    Withdraw,
}

impl TryFrom<&str> for BalanceAction {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, AppError> {
        match value.trim() {
            "deposit" => Ok(BalanceAction::Deposit),
            "withdraw" | "withdrawal" => Ok(BalanceAction::Withdraw),
            _ => Err(AppError::validation("please choose deposit or withdraw")),
        }
    }
}

/// Outcome of an executed buy or sell.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub kind: OperationKind,
    pub symbol: String,
    pub shares: i64,
    pub price: Decimal,
    pub total: Decimal,
    pub cash: Decimal,
}

#[derive(Debug, Clone)]
pub struct PortfolioSummary {
    pub holdings: Vec<Holding>,
    pub cash: Decimal,
    pub total: Decimal,
}

/// Parses a strictly positive whole number typed into a form.
pub fn parse_positive(raw: Option<&str>, message: &str) -> Result<i64, AppError> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| AppError::validation(message))
}
