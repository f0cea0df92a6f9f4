use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Quote, QuoteProvider, normalize_symbol};
use crate::error::AppError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    symbol: String,
    company_name: Option<String>,
    latest_price: Option<Decimal>,
}

/// IEX-style JSON endpoint: `GET {base_url}/stock/{symbol}/quote?token={key}`.
pub struct HttpQuotes {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpQuotes {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AppError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

/// Bodies without a usable price count as unknown symbols.
pub fn parse_quote(body: &str) -> Option<Quote> {
    let parsed: QuoteResponse = serde_json::from_str(body).ok()?;
    let price = parsed.latest_price.filter(|p| *p > Decimal::ZERO)?;
    let symbol = normalize_symbol(&parsed.symbol)?;
    Some(Quote {
        name: parsed.company_name.unwrap_or_else(|| symbol.clone()),
        symbol,
        price,
    })
}

#[async_trait]
impl QuoteProvider for HttpQuotes {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, AppError> {
        let Some(symbol) = normalize_symbol(symbol) else {
            return Ok(None);
        };
        let url = format!("{}/stock/{}/quote", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("quote not found for {}", symbol);
                Ok(None)
            }
            status if status.is_success() => {
                let body = response.text().await?;
                let quote = parse_quote(&body);
                if quote.is_none() {
                    warn!("unusable quote payload for {}", symbol);
                }
                Ok(quote)
            }
            status => Err(AppError::Internal(format!(
                "quote provider answered {} for {}",
                status, symbol
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_provider_payload() {
        let body = r#"{"symbol":"aapl","companyName":"Apple Inc","latestPrice":187.44}"#;
        let quote = parse_quote(body).unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.name, "Apple Inc");
        assert_eq!(quote.price, dec!(187.44));
    }

    #[test]
    fn missing_name_falls_back_to_symbol() {
        let quote = parse_quote(r#"{"symbol":"XYZ","latestPrice":"3.5"}"#).unwrap();
        assert_eq!(quote.name, "XYZ");
        assert_eq!(quote.price, dec!(3.5));
    }

    #[test]
    fn payload_without_price_is_unknown() {
        assert!(parse_quote(r#"{"symbol":"XYZ","latestPrice":null}"#).is_none());
        assert!(parse_quote("Unknown symbol").is_none());
    }
}
