//! HTML pages. Every interpolated user or provider value goes through [`escape`].

use std::fmt::Write as _;

use rust_decimal::Decimal;

use crate::holding::model::Holding;
use crate::operation::model::Operation;
use crate::portfolio::model::PortfolioSummary;
use crate::quote::Quote;

/// Formats money as `$1,234.56`.
pub fn usd(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let (int, frac) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}${}.{}", sign, grouped, frac)
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

pub fn layout(title: &str, logged_in: bool, flash: Option<&str>, main: &str) -> String {
    let nav = if logged_in {
        r#"<ul class="nav">
      <li><a href="/quote">Quote</a></li>
      <li><a href="/buy">Buy</a></li>
      <li><a href="/sell">Sell</a></li>
      <li><a href="/history">History</a></li>
      <li><a href="/balance">Balance</a></li>
      <li><a href="/logout">Log Out</a></li>
    </ul>"#
    } else {
        r#"<ul class="nav">
      <li><a href="/register">Register</a></li>
      <li><a href="/login">Log In</a></li>
    </ul>"#
    };
    let flash = flash
        .map(|msg| format!(r#"<div class="alert">{}</div>"#, escape(msg)))
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="initial-scale=1, width=device-width">
    <title>Finance: {title}</title>
  </head>
  <body>
    <nav><a href="/">Finance</a>
    {nav}
    </nav>
    {flash}
    <main>
{main}
    </main>
  </body>
</html>
"#,
        title = escape(title),
    )
}

pub fn apology(message: &str, code: u16) -> String {
    format!(
        r#"<h1 class="apology">{code}</h1>
<p class="apology-message">{}</p>"#,
        escape(message)
    )
}

pub fn index(summary: &PortfolioSummary) -> String {
    let mut rows = String::new();
    for h in &summary.holdings {
        let _ = write!(rows, "{}", holding_row(h));
    }
    format!(
        r#"<table class="portfolio">
  <thead>
    <tr><th>Symbol</th><th>Shares</th><th>Average Price</th><th>Current Price</th><th>Cost Basis</th><th>Present Value</th></tr>
  </thead>
  <tbody>
{rows}  </tbody>
  <tfoot>
    <tr><td colspan="5">Cash</td><td>{cash}</td></tr>
    <tr><td colspan="5">TOTAL</td><td>{total}</td></tr>
  </tfoot>
</table>"#,
        cash = usd(summary.cash),
        total = usd(summary.total),
    )
}

fn holding_row(h: &Holding) -> String {
    format!(
        "    <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        escape(&h.symbol),
        h.shares,
        usd(h.avg_price),
        usd(h.cur_price),
        usd(h.cost_basis),
        usd(h.present_value),
    )
}

pub fn buy_form() -> String {
    r#"<form action="/buy" method="post">
  <input autocomplete="off" autofocus name="symbol" placeholder="Symbol" type="text">
  <input min="1" name="shares" placeholder="Shares" type="number">
  <button type="submit">Buy</button>
</form>"#
        .to_string()
}

pub fn sell_form(symbols: &[String]) -> String {
    let mut options = String::new();
    for symbol in symbols {
        let symbol = escape(symbol);
        let _ = writeln!(options, r#"    <option value="{symbol}">{symbol}</option>"#);
    }
    format!(
        r#"<form action="/sell" method="post">
  <select name="symbol">
    <option disabled selected>Symbol</option>
{options}  </select>
  <input min="1" name="shares" placeholder="Shares" type="number">
  <button type="submit">Sell</button>
</form>"#
    )
}

pub fn quote_form() -> String {
    r#"<form action="/quote" method="post">
  <input autocomplete="off" autofocus name="symbol" placeholder="Symbol" type="text">
  <button type="submit">Quote</button>
</form>"#
        .to_string()
}

pub fn quoted(quote: &Quote) -> String {
    format!(
        r#"<p>A share of {} ({}) costs {}.</p>"#,
        escape(&quote.name),
        escape(&quote.symbol),
        usd(quote.price)
    )
}

pub fn history(operations: &[Operation]) -> String {
    let mut rows = String::new();
    for op in operations {
        let _ = writeln!(
            rows,
            "    <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            op.kind,
            escape(&op.symbol),
            op.shares,
            usd(op.price),
            usd(op.total),
            op.timestamp.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    format!(
        r#"<table class="history">
  <thead>
    <tr><th>Type</th><th>Symbol</th><th>Shares</th><th>Price</th><th>Total</th><th>Transacted</th></tr>
  </thead>
  <tbody>
{rows}  </tbody>
</table>"#
    )
}

pub fn login_form() -> String {
    r#"<form action="/login" method="post">
  <input autocomplete="off" autofocus name="username" placeholder="Username" type="text">
  <input name="password" placeholder="Password" type="password">
  <button type="submit">Log In</button>
</form>"#
        .to_string()
}

pub fn register_form() -> String {
    r#"<form action="/register" method="post">
  <input autocomplete="off" autofocus name="username" placeholder="Username" type="text">
  <input name="password" placeholder="Password" type="password">
  <input name="confirmation" placeholder="Confirm password" type="password">
  <button type="submit">Register</button>
</form>"#
        .to_string()
}

pub fn balance(cash: Decimal) -> String {
    format!(
        r#"<p>Your current balance is {}.</p>
<form action="/balance" method="post">
  <input min="1" name="balance" placeholder="Amount" type="number">
  <select name="action">
    <option value="deposit">Deposit</option>
    <option value="withdraw">Withdraw</option>
  </select>
  <button type="submit">Submit</button>
</form>"#,
        usd(cash)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn usd_groups_thousands_and_rounds_cents() {
        assert_eq!(usd(dec!(9500)), "$9,500.00");
        assert_eq!(usd(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(usd(dec!(0.5)), "$0.50");
        assert_eq!(usd(dec!(999.999)), "$1,000.00");
        assert_eq!(usd(dec!(-42.1)), "-$42.10");
        assert_eq!(usd(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x")</script>&'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;&amp;&#x27;"
        );
    }

    #[test]
    fn layout_escapes_flash_and_picks_nav() {
        let page = layout("Buy", true, Some("<b>done</b>"), "");
        assert!(page.contains("&lt;b&gt;done&lt;/b&gt;"));
        assert!(page.contains("/logout"));
        let page = layout("Log In", false, None, "");
        assert!(page.contains("/register"));
        assert!(!page.contains("/logout"));
    }

    #[test]
    fn sell_form_lists_symbols() {
        let html = sell_form(&["AAPL".to_string(), "NFLX".to_string()]);
        assert!(html.contains(r#"<option value="AAPL">AAPL</option>"#));
        assert!(html.contains(r#"<option value="NFLX">NFLX</option>"#));
    }
}
