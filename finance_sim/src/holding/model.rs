use rust_decimal::Decimal;

use crate::db::parse_decimal;
use crate::error::AppError;

/// A user's aggregated position in one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub user_id: i64,
    pub symbol: String,
    pub shares: i64,
    pub avg_price: Decimal,
    pub cur_price: Decimal,
    pub cost_basis: Decimal,
    pub present_value: Decimal,
}

impl Holding {
    /// First purchase of a symbol.
    pub fn open(user_id: i64, symbol: String, shares: i64, price: Decimal) -> Self {
        let cost = price * Decimal::from(shares);
        Self {
            user_id,
            symbol,
            shares,
            avg_price: cost / Decimal::from(shares),
            cur_price: price,
            cost_basis: cost,
            present_value: cost,
        }
    }

    /// Merges a purchase into the position using a shares-weighted average.
    /// A position that would no longer fit is refused and left as it was.
    pub fn add(&mut self, shares: i64, price: Decimal) -> Result<(), AppError> {
        let too_large = || {
            AppError::validation(format!("You cannot hold that many shares of {}", self.symbol))
        };
        let total_shares = self.shares.checked_add(shares).ok_or_else(too_large)?;
        let cost = price
            .checked_mul(Decimal::from(shares))
            .ok_or_else(too_large)?;
        let held_cost = self
            .avg_price
            .checked_mul(Decimal::from(self.shares))
            .and_then(|held| held.checked_add(cost))
            .ok_or_else(too_large)?;
        let cost_basis = self.cost_basis.checked_add(cost).ok_or_else(too_large)?;

        self.avg_price = held_cost / Decimal::from(total_shares);
        self.cost_basis = cost_basis;
        self.shares = total_shares;
        self.revalue(price);
        Ok(())
    }

    /// Removes sold shares. Cost basis is the pre-sale average times what is left.
    pub fn remove(&mut self, shares: i64, price: Decimal) {
        self.shares -= shares;
        self.cost_basis = self.avg_price * Decimal::from(self.shares);
        self.revalue(price);
    }

    pub fn revalue(&mut self, price: Decimal) {
        self.cur_price = price;
        self.present_value = price.saturating_mul(Decimal::from(self.shares));
    }

    pub fn is_closed(&self) -> bool {
        self.shares == 0
    }
}

#[derive(sqlx::FromRow)]
pub struct HoldingRow {
    pub user_id: i64,
    pub symbol: String,
    pub shares: i64,
    pub avg_price: String,
    pub cur_price: String,
    pub cost_basis: String,
    pub present_value: String,
}

impl TryFrom<HoldingRow> for Holding {
    type Error = AppError;

    fn try_from(row: HoldingRow) -> Result<Self, AppError> {
        Ok(Self {
            avg_price: parse_decimal("holdings.avg_price", &row.avg_price)?,
            cur_price: parse_decimal("holdings.cur_price", &row.cur_price)?,
            cost_basis: parse_decimal("holdings.cost_basis", &row.cost_basis)?,
            present_value: parse_decimal("holdings.present_value", &row.present_value)?,
            user_id: row.user_id,
            symbol: row.symbol,
            shares: row.shares,
        })
    }
}
