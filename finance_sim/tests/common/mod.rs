#![allow(dead_code)]

use std::sync::Arc;

use finance_sim::auth::Accounts;
use finance_sim::db::Store;
use finance_sim::portfolio::PortfolioEngine;
use finance_sim::quote::{QuoteProvider, StaticQuotes};
use finance_sim::svc::Service;
use finance_sim::user::model::RegisterForm;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const SECRET: &str = "integration-secret-integration-secret";
pub const DEFAULT_CASH: Decimal = dec!(10000.00);

pub struct Harness {
    pub store: Store,
    pub quotes: Arc<StaticQuotes>,
    pub engine: PortfolioEngine,
    pub accounts: Accounts,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Store::in_memory().await.unwrap();
        let quotes = Arc::new(StaticQuotes::with_prices([
            ("AAPL", dec!(50)),
            ("NFLX", dec!(100)),
        ]));
        let provider: Arc<dyn QuoteProvider> = quotes.clone();
        let engine = PortfolioEngine::new(store.clone(), provider);
        let accounts = Accounts::new(store.clone(), SECRET, 3600, DEFAULT_CASH);
        Self {
            store,
            quotes,
            engine,
            accounts,
        }
    }

    pub fn service(&self) -> Service {
        Service::new(self.engine.clone(), self.accounts.clone())
    }

    pub async fn register(&self, username: &str) -> i64 {
        let form = RegisterForm {
            username: Some(username.to_string()),
            password: Some("secret".to_string()),
            confirmation: Some("secret".to_string()),
        };
        self.accounts.register(&form).await.unwrap().user_id
    }

    pub async fn count(&self, sql: &str) -> i64 {
        let mut conn = self.store.acquire().await.unwrap();
        let (n,): (i64,) = sqlx::query_as(sql).fetch_one(&mut *conn).await.unwrap();
        n
    }

    pub async fn exec(&self, sql: &str) {
        let mut conn = self.store.acquire().await.unwrap();
        sqlx::query(sql).execute(&mut *conn).await.unwrap();
    }
}
