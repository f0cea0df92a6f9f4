use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cfg::{QuoteConfig, QuoteSource};
use crate::error::AppError;

pub mod http;
pub mod stat;

pub use http::HttpQuotes;
pub use stat::StaticQuotes;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
}

/// Source of current prices. `Ok(None)` means the symbol is unknown.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, AppError>;
}

/// Trims and upper-cases a ticker; `None` when nothing usable is left.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_ascii_uppercase();
    let valid = !symbol.is_empty()
        && symbol.len() <= 12
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^'));
    valid.then_some(symbol)
}

pub fn from_config(cfg: &QuoteConfig) -> Result<Arc<dyn QuoteProvider>, AppError> {
    let provider: Arc<dyn QuoteProvider> = match cfg.provider {
        QuoteSource::Http => Arc::new(HttpQuotes::new(&cfg.base_url, &cfg.api_key)?),
        QuoteSource::Static => Arc::new(StaticQuotes::demo()),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_trimmed_and_uppercased() {
        assert_eq!(normalize_symbol("  aapl "), Some("AAPL".to_string()));
        assert_eq!(normalize_symbol("brk.b"), Some("BRK.B".to_string()));
    }

    #[test]
    fn blank_or_odd_symbols_are_rejected() {
        assert_eq!(normalize_symbol("   "), None);
        assert_eq!(normalize_symbol("AA PL"), None);
        assert_eq!(normalize_symbol("../etc"), None);
    }
}
