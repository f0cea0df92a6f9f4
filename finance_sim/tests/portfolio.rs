mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{DEFAULT_CASH, Harness};
use finance_sim::error::AppError;
use finance_sim::holding::repo::HoldingRepo;
use finance_sim::operation::model::OperationKind;
use finance_sim::portfolio::PortfolioEngine;
use finance_sim::portfolio::model::BalanceAction;
use finance_sim::quote::{Quote, QuoteProvider};
use rust_decimal_macros::dec;

struct Unreachable;

#[async_trait]
impl QuoteProvider for Unreachable {
    async fn lookup(&self, _symbol: &str) -> Result<Option<Quote>, AppError> {
        Err(AppError::Internal("quote service unreachable".to_string()))
    }
}

async fn holding(h: &Harness, user_id: i64, symbol: &str) -> Option<finance_sim::holding::model::Holding> {
    let mut conn = h.store.acquire().await.unwrap();
    HoldingRepo::find(&mut conn, user_id, symbol).await.unwrap()
}

#[tokio::test]
async fn buy_then_sell_round_trip() {
    let h = Harness::new().await;
    let user = h.register("alice").await;

    let trade = h.engine.buy(user, "aapl", 10).await.unwrap();
    assert_eq!(trade.symbol, "AAPL");
    assert_eq!(trade.total, dec!(500));
    assert_eq!(h.engine.cash(user).await.unwrap(), dec!(9500));
    let held = holding(&h, user, "AAPL").await.unwrap();
    assert_eq!(held.shares, 10);
    assert_eq!(held.avg_price, dec!(50));

    h.quotes.set_price("AAPL", dec!(60)).await;
    let trade = h.engine.sell(user, "AAPL", 10).await.unwrap();
    assert_eq!(trade.total, dec!(600));
    assert_eq!(trade.cash, dec!(10100));
    assert_eq!(h.engine.cash(user).await.unwrap(), dec!(10100));
    assert!(holding(&h, user, "AAPL").await.is_none());

    let history = h.engine.history(user).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, OperationKind::Sell);
    assert_eq!(history[0].price, dec!(60));
    assert_eq!(history[1].kind, OperationKind::Buy);
    assert_eq!(history[1].total, dec!(500));
}

#[tokio::test]
async fn second_buy_averages_price() {
    let h = Harness::new().await;
    let user = h.register("bob").await;

    h.engine.buy(user, "AAPL", 10).await.unwrap();
    h.quotes.set_price("AAPL", dec!(70)).await;
    h.engine.buy(user, "AAPL", 30).await.unwrap();

    let held = holding(&h, user, "AAPL").await.unwrap();
    assert_eq!(held.shares, 40);
    assert_eq!(held.avg_price, dec!(65));
    assert_eq!(held.cost_basis, dec!(2600));
    assert_eq!(h.engine.cash(user).await.unwrap(), DEFAULT_CASH - dec!(2600));
    assert_eq!(
        h.count("SELECT COUNT(*) FROM holdings").await,
        1,
        "one row per user and symbol"
    );
}

#[tokio::test]
async fn merging_one_symbol_leaves_other_holdings_alone() {
    let h = Harness::new().await;
    let user = h.register("carol").await;

    h.engine.buy(user, "AAPL", 2).await.unwrap();
    h.engine.buy(user, "NFLX", 3).await.unwrap();
    h.engine.buy(user, "AAPL", 2).await.unwrap();

    let netflix = holding(&h, user, "NFLX").await.unwrap();
    assert_eq!(netflix.shares, 3);
    assert_eq!(netflix.avg_price, dec!(100));
    assert_eq!(holding(&h, user, "AAPL").await.unwrap().shares, 4);
}

#[tokio::test]
async fn partial_sell_recomputes_cost_basis() {
    let h = Harness::new().await;
    let user = h.register("dave").await;

    h.engine.buy(user, "NFLX", 10).await.unwrap();
    h.quotes.set_price("NFLX", dec!(80)).await;
    h.engine.sell(user, "NFLX", 4).await.unwrap();

    let held = holding(&h, user, "NFLX").await.unwrap();
    assert_eq!(held.shares, 6);
    assert_eq!(held.avg_price, dec!(100));
    assert_eq!(held.cost_basis, dec!(600));
    assert_eq!(held.present_value, dec!(480));
    assert_eq!(h.engine.cash(user).await.unwrap(), dec!(9320));
}

#[tokio::test]
async fn overselling_is_rejected_without_changes() {
    let h = Harness::new().await;
    let user = h.register("erin").await;
    h.engine.buy(user, "AAPL", 5).await.unwrap();

    let err = h.engine.sell(user, "AAPL", 6).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientShares(_)));
    assert_eq!(h.engine.cash(user).await.unwrap(), dec!(9750));
    assert_eq!(holding(&h, user, "AAPL").await.unwrap().shares, 5);
    assert_eq!(h.count("SELECT COUNT(*) FROM operations").await, 1);

    let err = h.engine.sell(user, "NFLX", 1).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientShares(_)));
}

#[tokio::test]
async fn buying_beyond_cash_is_rejected_without_changes() {
    let h = Harness::new().await;
    let user = h.register("frank").await;
    h.quotes.set_price("AAPL", dec!(2000)).await;

    let err = h.engine.buy(user, "AAPL", 6).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds(_)));
    assert_eq!(h.engine.cash(user).await.unwrap(), DEFAULT_CASH);
    assert!(holding(&h, user, "AAPL").await.is_none());
    assert_eq!(h.count("SELECT COUNT(*) FROM operations").await, 0);

    // Spending exactly the balance is allowed.
    h.engine.buy(user, "AAPL", 5).await.unwrap();
    assert_eq!(h.engine.cash(user).await.unwrap(), dec!(0));
}

#[tokio::test]
async fn bad_trade_input_is_rejected() {
    let h = Harness::new().await;
    let user = h.register("gina").await;

    assert!(matches!(
        h.engine.buy(user, "AAPL", 0).await.unwrap_err(),
        AppError::Validation(_)
    ));
    assert!(matches!(
        h.engine.buy(user, "   ", 1).await.unwrap_err(),
        AppError::Validation(_)
    ));
    assert!(matches!(
        h.engine.buy(user, "ZZZZ", 1).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        h.engine.sell(user, "AAPL", -1).await.unwrap_err(),
        AppError::Validation(_)
    ));
    assert_eq!(h.engine.cash(user).await.unwrap(), DEFAULT_CASH);
}

#[tokio::test]
async fn deposit_and_withdraw() {
    let h = Harness::new().await;
    let user = h.register("hank").await;

    let cash = h
        .engine
        .balance(user, BalanceAction::Deposit, 250)
        .await
        .unwrap();
    assert_eq!(cash, dec!(10250));
    let cash = h
        .engine
        .balance(user, BalanceAction::Withdraw, 10250)
        .await
        .unwrap();
    assert_eq!(cash, dec!(0));

    let err = h
        .engine
        .balance(user, BalanceAction::Withdraw, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds(_)));
    let err = h
        .engine
        .balance(user, BalanceAction::Deposit, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.engine.cash(user).await.unwrap(), dec!(0));
}

#[tokio::test]
async fn portfolio_revalues_holdings() {
    let h = Harness::new().await;
    let user = h.register("iris").await;
    h.engine.buy(user, "AAPL", 10).await.unwrap();
    h.engine.buy(user, "NFLX", 5).await.unwrap();

    // Valued at execution price, total is conserved.
    let summary = h.engine.portfolio(user).await.unwrap();
    assert_eq!(summary.total, DEFAULT_CASH);

    h.quotes.set_price("AAPL", dec!(55)).await;
    let summary = h.engine.portfolio(user).await.unwrap();
    let aapl = summary.holdings.iter().find(|x| x.symbol == "AAPL").unwrap();
    assert_eq!(aapl.cur_price, dec!(55));
    assert_eq!(aapl.present_value, dec!(550));
    assert_eq!(summary.cash, dec!(9000));
    assert_eq!(summary.total, dec!(10050));

    let stored = holding(&h, user, "AAPL").await.unwrap();
    assert_eq!(stored.present_value, dec!(550));
}

#[tokio::test]
async fn revalue_keeps_last_price_for_unknown_symbols() {
    let h = Harness::new().await;
    let user = h.register("jack").await;
    h.engine.buy(user, "NFLX", 2).await.unwrap();
    h.quotes.remove("NFLX").await;

    let holdings = h.engine.revalue_holdings(user).await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].cur_price, dec!(100));
    assert_eq!(holdings[0].present_value, dec!(200));
}

#[tokio::test]
async fn users_do_not_see_each_other() {
    let h = Harness::new().await;
    let a = h.register("kim").await;
    let b = h.register("lee").await;
    h.engine.buy(a, "AAPL", 1).await.unwrap();

    assert!(h.engine.held_symbols(b).await.unwrap().is_empty());
    assert!(h.engine.history(b).await.unwrap().is_empty());
    assert_eq!(h.engine.held_symbols(a).await.unwrap(), vec!["AAPL".to_string()]);
}

#[tokio::test]
async fn failure_after_debit_rolls_everything_back() {
    let h = Harness::new().await;
    let user = h.register("mona").await;
    h.engine.buy(user, "AAPL", 1).await.unwrap();
    h.exec(
        "CREATE TRIGGER block_new_holdings BEFORE INSERT ON holdings \
         BEGIN SELECT RAISE(ABORT, 'holdings locked'); END",
    )
    .await;

    // Cash and the operation are written before the holding insert fails.
    let err = h.engine.buy(user, "NFLX", 2).await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
    assert_eq!(h.engine.cash(user).await.unwrap(), dec!(9950));
    assert_eq!(h.count("SELECT COUNT(*) FROM operations").await, 1);
    assert!(holding(&h, user, "NFLX").await.is_none());
}

#[tokio::test]
async fn share_count_overflow_is_refused() {
    let h = Harness::new().await;
    let user = h.register("nora").await;
    for _ in 0..3 {
        h.engine
            .balance(user, BalanceAction::Deposit, i64::MAX)
            .await
            .unwrap();
    }
    h.quotes.set_price("AAPL", dec!(1)).await;
    h.engine.buy(user, "AAPL", i64::MAX).await.unwrap();
    let cash = h.engine.cash(user).await.unwrap();

    let err = h.engine.buy(user, "AAPL", 1).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.engine.cash(user).await.unwrap(), cash);
    assert_eq!(holding(&h, user, "AAPL").await.unwrap().shares, i64::MAX);
    assert_eq!(h.count("SELECT COUNT(*) FROM operations").await, 1);
}

#[tokio::test]
async fn revalue_keeps_last_price_when_quotes_fail() {
    let h = Harness::new().await;
    let user = h.register("otto").await;
    h.engine.buy(user, "AAPL", 4).await.unwrap();

    let offline = PortfolioEngine::new(h.store.clone(), Arc::new(Unreachable));
    let summary = offline.portfolio(user).await.unwrap();
    assert_eq!(summary.holdings.len(), 1);
    assert_eq!(summary.holdings[0].cur_price, dec!(50));
    assert_eq!(summary.total, DEFAULT_CASH);
}
