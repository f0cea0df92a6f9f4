use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::RwLock;

use super::{Quote, QuoteProvider, normalize_symbol};
use crate::error::AppError;

/// In-memory price table for offline runs and tests. Prices can be moved
/// with [`StaticQuotes::set_price`].
#[derive(Default)]
pub struct StaticQuotes {
    quotes: RwLock<HashMap<String, Quote>>,
}

impl StaticQuotes {
    pub fn with_prices<'a>(prices: impl IntoIterator<Item = (&'a str, Decimal)>) -> Self {
        let quotes = prices
            .into_iter()
            .filter_map(|(symbol, price)| {
                let symbol = normalize_symbol(symbol)?;
                Some((
                    symbol.clone(),
                    Quote {
                        name: symbol.clone(),
                        symbol,
                        price,
                    },
                ))
            })
            .collect();
        Self {
            quotes: RwLock::new(quotes),
        }
    }

    pub fn demo() -> Self {
        Self::with_prices([
            ("AAPL", dec!(187.44)),
            ("MSFT", dec!(415.10)),
            ("NFLX", dec!(628.35)),
            ("GOOG", dec!(172.50)),
        ])
    }

    pub async fn set_price(&self, symbol: &str, price: Decimal) {
        if let Some(symbol) = normalize_symbol(symbol) {
            let mut quotes = self.quotes.write().await;
            quotes
                .entry(symbol.clone())
                .and_modify(|q| q.price = price)
                .or_insert(Quote {
                    name: symbol.clone(),
                    symbol,
                    price,
                });
        }
    }

    pub async fn remove(&self, symbol: &str) {
        if let Some(symbol) = normalize_symbol(symbol) {
            self.quotes.write().await.remove(&symbol);
        }
    }
}

#[async_trait]
impl QuoteProvider for StaticQuotes {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, AppError> {
        let Some(symbol) = normalize_symbol(symbol) else {
            return Ok(None);
        };
        Ok(self.quotes.read().await.get(&symbol).cloned())
    }
}
