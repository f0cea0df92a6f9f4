use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::model::{BalanceAction, PortfolioSummary, Trade};
use crate::db::Store;
use crate::error::AppError;
use crate::holding::{model::Holding, repo::HoldingRepo};
use crate::operation::{
    model::{Operation, OperationKind},
    repo::OperationRepo,
};
use crate::quote::{Quote, QuoteProvider, normalize_symbol};
use crate::user::repo::UserRepo;

/// Cash and holdings bookkeeping. Every mutating call runs in one transaction;
/// an early return drops it and rolls back.
#[derive(Clone)]
pub struct PortfolioEngine {
    store: Store,
    quotes: Arc<dyn QuoteProvider>,
}

impl PortfolioEngine {
    pub fn new(store: Store, quotes: Arc<dyn QuoteProvider>) -> Self {
        Self { store, quotes }
    }

    pub async fn quote(&self, symbol: &str) -> Result<Quote, AppError> {
        let symbol = require_symbol(symbol)?;
        self.quotes.lookup(&symbol).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "The stock symbol {} is invalid. Please try again.",
                symbol
            ))
        })
    }

    pub async fn buy(&self, user_id: i64, symbol: &str, shares: i64) -> Result<Trade, AppError> {
        require_shares(shares)?;
        let quote = self.quote(symbol).await?;
        let cost = quote
            .price
            .checked_mul(Decimal::from(shares))
            .ok_or_else(|| AppError::validation("Please enter a valid amount of shares"))?;

        let mut tx = self.store.begin().await?;
        let cash = UserRepo::get_cash(&mut tx, user_id).await?;
        if cash < cost {
            return Err(AppError::InsufficientFunds(format!(
                "You don't have enough money to buy {} shares of {}.",
                shares, quote.symbol
            )));
        }
        let (holding, opened) = match HoldingRepo::find(&mut tx, user_id, &quote.symbol).await? {
            Some(mut holding) => {
                holding.add(shares, quote.price)?;
                (holding, false)
            }
            None => (
                Holding::open(user_id, quote.symbol.clone(), shares, quote.price),
                true,
            ),
        };

        let cash = cash - cost;
        UserRepo::update_cash(&mut tx, user_id, cash).await?;
        let op = Operation::new(user_id, OperationKind::Buy, &quote.symbol, shares, quote.price);
        OperationRepo::insert(&mut tx, &op).await?;
        if opened {
            HoldingRepo::insert(&mut tx, &holding).await?;
        } else {
            HoldingRepo::update(&mut tx, &holding).await?;
        }
        tx.commit().await?;

        info!(user_id, symbol = %quote.symbol, shares, total = %cost, "buy executed");
        Ok(Trade {
            kind: OperationKind::Buy,
            symbol: quote.symbol,
            shares,
            price: quote.price,
            total: cost,
            cash,
        })
    }

    pub async fn sell(&self, user_id: i64, symbol: &str, shares: i64) -> Result<Trade, AppError> {
        require_shares(shares)?;
        let symbol = require_symbol(symbol)?;

        // Reject before asking the provider; re-checked inside the transaction.
        {
            let mut conn = self.store.acquire().await?;
            let held = HoldingRepo::find(&mut conn, user_id, &symbol).await?;
            check_owned(held.as_ref(), &symbol, shares)?;
        }

        let quote = self.quote(&symbol).await?;
        let proceeds = quote
            .price
            .checked_mul(Decimal::from(shares))
            .ok_or_else(|| AppError::validation("Please enter a valid amount of shares"))?;

        let mut tx = self.store.begin().await?;
        let mut holding = HoldingRepo::find(&mut tx, user_id, &symbol).await?;
        check_owned(holding.as_ref(), &symbol, shares)?;
        let cash = UserRepo::get_cash(&mut tx, user_id)
            .await?
            .checked_add(proceeds)
            .ok_or_else(|| AppError::validation("cash balance too large"))?;
        UserRepo::update_cash(&mut tx, user_id, cash).await?;

        if let Some(holding) = holding.as_mut() {
            holding.remove(shares, quote.price);
            if holding.is_closed() {
                HoldingRepo::delete(&mut tx, user_id, &symbol).await?;
            } else {
                HoldingRepo::update(&mut tx, holding).await?;
            }
        }

        let op = Operation::new(user_id, OperationKind::Sell, &symbol, shares, quote.price);
        OperationRepo::insert(&mut tx, &op).await?;
        tx.commit().await?;

        info!(user_id, symbol = %symbol, shares, total = %proceeds, "sell executed");
        Ok(Trade {
            kind: OperationKind::Sell,
            symbol,
            shares,
            price: quote.price,
            total: proceeds,
            cash,
        })
    }

    /// Returns the cash balance after the deposit or withdrawal.
    pub async fn balance(
        &self,
        user_id: i64,
        action: BalanceAction,
        amount: i64,
    ) -> Result<Decimal, AppError> {
        if amount <= 0 {
            return Err(AppError::validation("please enter a valid amount of money"));
        }
        let amount = Decimal::from(amount);

        let mut tx = self.store.begin().await?;
        let cash = UserRepo::get_cash(&mut tx, user_id).await?;
        let cash = match action {
            BalanceAction::Deposit => cash
                .checked_add(amount)
                .ok_or_else(|| AppError::validation("please enter a valid amount of money"))?,
            BalanceAction::Withdraw if amount > cash => {
                return Err(AppError::InsufficientFunds(
                    "please enter a valid amount to withdraw".to_string(),
                ));
            }
            BalanceAction::Withdraw => cash - amount,
        };
        UserRepo::update_cash(&mut tx, user_id, cash).await?;
        tx.commit().await?;

        info!(user_id, ?action, %amount, "balance adjusted");
        Ok(cash)
    }

    pub async fn cash(&self, user_id: i64) -> Result<Decimal, AppError> {
        let mut conn = self.store.acquire().await?;
        UserRepo::get_cash(&mut conn, user_id).await
    }

    /// Refreshes current price and present value of every holding. Symbols the
    /// provider no longer knows, or cannot answer for right now, keep their
    /// last price.
    pub async fn revalue_holdings(&self, user_id: i64) -> Result<Vec<Holding>, AppError> {
        let mut holdings = {
            let mut conn = self.store.acquire().await?;
            HoldingRepo::list_by_user(&mut conn, user_id).await?
        };

        let mut changed = Vec::with_capacity(holdings.len());
        for (idx, holding) in holdings.iter_mut().enumerate() {
            match self.quotes.lookup(&holding.symbol).await {
                Ok(Some(quote)) => {
                    holding.revalue(quote.price);
                    changed.push(idx);
                }
                Ok(None) => warn!(symbol = %holding.symbol, "no quote while revaluing, keeping last price"),
                Err(e) => warn!(
                    symbol = %holding.symbol,
                    "quote lookup failed while revaluing, keeping last price: {}",
                    e
                ),
            }
        }

        if !changed.is_empty() {
            let mut tx = self.store.begin().await?;
            for idx in changed {
                HoldingRepo::update(&mut tx, &holdings[idx]).await?;
            }
            tx.commit().await?;
        }
        Ok(holdings)
    }

    pub async fn portfolio(&self, user_id: i64) -> Result<PortfolioSummary, AppError> {
        let holdings = self.revalue_holdings(user_id).await?;
        let cash = self.cash(user_id).await?;
        let invested: Decimal = holdings.iter().map(|h| h.present_value).sum();
        Ok(PortfolioSummary {
            holdings,
            cash,
            total: cash + invested,
        })
    }

    pub async fn history(&self, user_id: i64) -> Result<Vec<Operation>, AppError> {
        let mut conn = self.store.acquire().await?;
        OperationRepo::list_by_user(&mut conn, user_id).await
    }

    pub async fn held_symbols(&self, user_id: i64) -> Result<Vec<String>, AppError> {
        let mut conn = self.store.acquire().await?;
        Ok(HoldingRepo::list_by_user(&mut conn, user_id)
            .await?
            .into_iter()
            .map(|h| h.symbol)
            .collect())
    }
}

fn require_shares(shares: i64) -> Result<(), AppError> {
    if shares <= 0 {
        return Err(AppError::validation("Please enter a valid amount of shares"));
    }
    Ok(())
}

fn require_symbol(symbol: &str) -> Result<String, AppError> {
    normalize_symbol(symbol).ok_or_else(|| AppError::validation("Please enter a stock symbol"))
}

fn check_owned(holding: Option<&Holding>, symbol: &str, shares: i64) -> Result<(), AppError> {
    let owned = holding.map_or(0, |h| h.shares);
    if owned < shares {
        return Err(AppError::InsufficientShares(format!(
            "you do not have {} shares of {} (owned: {})",
            shares, symbol, owned
        )));
    }
    Ok(())
}
