use tracing::error;

use crate::{
    auth::Accounts,
    constant::{FLASH_COOKIE, SESSION_COOKIE},
    error::AppError,
    mdw::Identity,
    operation::model::OperationKind,
    portfolio::{
        PortfolioEngine,
        model::{BalanceAction, BalanceForm, QuoteForm, Trade, TradeForm, parse_positive},
    },
    req::Request,
    resp::{Response, Status},
    user::model::{LoginForm, RegisterForm},
    view,
};

#[derive(Clone)]
pub struct Service {
    engine: PortfolioEngine,
    accounts: Accounts,
}

impl Service {
    pub fn new(engine: PortfolioEngine, accounts: Accounts) -> Self {
        Self { engine, accounts }
    }

    pub fn jwt_secret(&self) -> &str {
        self.accounts.jwt_secret()
    }

    pub async fn index(&self, request: &Request, identity: Identity) -> Result<Response, AppError> {
        let summary = self.engine.portfolio(identity.user_id).await?;
        Ok(page(request, "Portfolio", true, &view::index(&summary)))
    }

    pub fn buy_page(&self, request: &Request) -> Response {
        page(request, "Buy", true, &view::buy_form())
    }

    pub async fn buy(&self, request: &Request, identity: Identity) -> Result<Response, AppError> {
        let form: TradeForm = request.form()?;
        let shares = parse_positive(
            form.shares.as_deref(),
            "Please enter a valid amount of shares",
        )?;
        let trade = self
            .engine
            .buy(identity.user_id, form.symbol.as_deref().unwrap_or(""), shares)
            .await?;
        Ok(redirect_with_flash("/", &trade_message(&trade)))
    }

    pub async fn sell_page(
        &self,
        request: &Request,
        identity: Identity,
    ) -> Result<Response, AppError> {
        let symbols = self.engine.held_symbols(identity.user_id).await?;
        Ok(page(request, "Sell", true, &view::sell_form(&symbols)))
    }

    pub async fn sell(&self, request: &Request, identity: Identity) -> Result<Response, AppError> {
        let form: TradeForm = request.form()?;
        let shares = parse_positive(
            form.shares.as_deref(),
            "please enter a positive amount of shares",
        )?;
        let trade = self
            .engine
            .sell(identity.user_id, form.symbol.as_deref().unwrap_or(""), shares)
            .await?;
        Ok(redirect_with_flash("/", &trade_message(&trade)))
    }

    /// `GET /quote?symbol=X` answers directly; a bare `GET` shows the form.
    pub async fn quote_page(&self, request: &Request) -> Result<Response, AppError> {
        let form: QuoteForm = request.query()?;
        match form.symbol.as_deref() {
            Some(symbol) if !symbol.trim().is_empty() => self.quoted(request, symbol).await,
            _ => Ok(page(request, "Quote", true, &view::quote_form())),
        }
    }

    pub async fn quote(&self, request: &Request) -> Result<Response, AppError> {
        let form: QuoteForm = request.form()?;
        self.quoted(request, form.symbol.as_deref().unwrap_or(""))
            .await
    }

    async fn quoted(&self, request: &Request, symbol: &str) -> Result<Response, AppError> {
        let quote = self.engine.quote(symbol).await?;
        Ok(page(request, "Quoted", true, &view::quoted(&quote)))
    }

    pub async fn history(
        &self,
        request: &Request,
        identity: Identity,
    ) -> Result<Response, AppError> {
        let operations = self.engine.history(identity.user_id).await?;
        Ok(page(request, "History", true, &view::history(&operations)))
    }

    pub async fn balance_page(
        &self,
        request: &Request,
        identity: Identity,
    ) -> Result<Response, AppError> {
        let cash = self.engine.cash(identity.user_id).await?;
        Ok(page(request, "Balance", true, &view::balance(cash)))
    }

    pub async fn balance(
        &self,
        request: &Request,
        identity: Identity,
    ) -> Result<Response, AppError> {
        let form: BalanceForm = request.form()?;
        let amount = parse_positive(form.balance.as_deref(), "please enter a valid cash amount")?;
        let action = BalanceAction::try_from(form.action.as_deref().unwrap_or(""))?;
        self.engine
            .balance(identity.user_id, action, amount)
            .await?;
        let message = match action {
            BalanceAction::Deposit => format!("${} successfully deposited to your account!", amount),
            BalanceAction::Withdraw => {
                format!("${} successfully withdrawn from your account!", amount)
            }
        };
        Ok(redirect_with_flash("/balance", &message))
    }

    /// Showing the login form forgets any current session.
    pub fn login_page(&self, request: &Request) -> Response {
        page(request, "Log In", false, &view::login_form()).clear_cookie(SESSION_COOKIE)
    }

    pub async fn login(&self, request: &Request) -> Result<Response, AppError> {
        let form: LoginForm = request.form()?;
        let identity = self.accounts.login(&form).await?;
        let token = self.accounts.issue_session(identity)?;
        Ok(Response::redirect("/").set_cookie(SESSION_COOKIE, &token))
    }

    pub fn logout(&self) -> Response {
        Response::redirect("/").clear_cookie(SESSION_COOKIE)
    }

    pub fn register_page(&self, request: &Request) -> Response {
        page(request, "Register", false, &view::register_form())
    }

    pub async fn register(&self, request: &Request) -> Result<Response, AppError> {
        let form: RegisterForm = request.form()?;
        let identity = self.accounts.register(&form).await?;
        let token = self.accounts.issue_session(identity)?;
        Ok(redirect_with_flash("/", "Registered!").set_cookie(SESSION_COOKIE, &token))
    }

    pub fn not_found(&self, logged_in: bool) -> Response {
        Response::html(
            Status::NotFound,
            view::layout(
                "Not Found",
                logged_in,
                None,
                &view::apology("page not found", 404),
            ),
        )
    }

    /// Renders the apology page. Infrastructure errors are logged and shown
    /// without detail.
    pub fn error_page(&self, err: &AppError, logged_in: bool) -> Response {
        let status = err.status();
        let message = if err.is_internal() {
            error!("request failed: {:?}", err);
            "something went wrong, please try again".to_string()
        } else {
            err.to_string()
        };
        Response::html(
            status,
            view::layout(
                "Apology",
                logged_in,
                None,
                &view::apology(&message, status.code()),
            ),
        )
    }
}

fn trade_message(trade: &Trade) -> String {
    let verb = match trade.kind {
        OperationKind::Buy => "bought",
        OperationKind::Sell => "sold",
    };
    format!(
        "{} shares of {} {} successfully!",
        trade.shares, trade.symbol, verb
    )
}

/// Renders a 200 page, consuming any pending flash message.
fn page(request: &Request, title: &str, logged_in: bool, main: &str) -> Response {
    let flash = request.cookie(FLASH_COOKIE).and_then(decode_flash);
    let body = view::layout(title, logged_in, flash.as_deref(), main);
    let response = Response::html(Status::Ok, body);
    match flash {
        Some(_) => response.clear_cookie(FLASH_COOKIE),
        None => response,
    }
}

fn redirect_with_flash(location: &str, message: &str) -> Response {
    Response::redirect(location).set_cookie(FLASH_COOKIE, &encode_flash(message))
}

/// Flash text travels form-encoded so it stays a valid cookie value.
fn encode_flash(message: &str) -> String {
    serde_urlencoded::to_string(&[("m", message)]).unwrap_or_default()
}

fn decode_flash(raw: &str) -> Option<String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(raw)
        .ok()?
        .into_iter()
        .find_map(|(k, v)| (k == "m" && !v.is_empty()).then_some(v))
}
