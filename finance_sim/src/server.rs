use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::oneshot::Receiver;
use tracing::{debug, error, info};

use crate::auth::Accounts;
use crate::cfg::Config;
use crate::constant::{self, PROTECTED_PATHS};
use crate::db::Store;
use crate::mdw::{Identity, Middleware};
use crate::portfolio::PortfolioEngine;
use crate::quote::QuoteProvider;
use crate::req::Method::{GET, POST};
use crate::req::Request;
use crate::resp::Response;
use crate::svc::Service;

pub struct Server {
    svc: Arc<Service>,
    addr: String,
    max_request_bytes: usize,
}

impl Server {
    pub fn new(config: &Config, store: Store, quotes: Arc<dyn QuoteProvider>) -> Self {
        Self {
            svc: Arc::new(Service::new(
                PortfolioEngine::new(store.clone(), quotes),
                Accounts::new(
                    store,
                    &config.auth.jwt_secret,
                    config.auth.session_ttl_secs,
                    config.account.default_cash,
                ),
            )),
            addr: config.server.addr.clone(),
            max_request_bytes: config.server.max_request_bytes,
        }
    }

    pub async fn start(self, mut shutdown_rx: Receiver<()>) -> Result<()> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        info!("Server running on http://{}", self.addr);

        loop {
            tokio::select! {
                conn = listener.accept() => {
                    let (stream, peer) = match conn {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!("unable to accept connection: {}", e);
                            continue;
                        }
                    };
                    let svc = Arc::clone(&self.svc);
                    let max_bytes = self.max_request_bytes;
                    tokio::spawn(async move {
                        debug!(%peer, "{}", constant::LOGGING_INCOMING_REQUEST);
                        if let Err(e) = Self::handle_client(stream, &svc, max_bytes).await {
                            info!(%peer, "Connection error: {:#}", e);
                        }
                    });
                },
                _ = &mut shutdown_rx => {
                    info!("shutting down ...");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Serves exactly one request on `stream`.
    pub async fn handle_client<S: AsyncRead + AsyncWrite + Unpin>(
        mut stream: S,
        svc: &Service,
        max_bytes: usize,
    ) -> Result<()> {
        let started = Instant::now();
        let (request, identity) =
            Middleware::new(&mut stream, max_bytes, svc.jwt_secret()).await?;

        let response = Self::route(&request, identity, svc).await;
        response
            .write_to(&mut stream)
            .await
            .context("Failed to write response")?;

        info!(
            method = ?request.method,
            path = %request.path,
            status = response.status.code(),
            user_id = identity.map(|i| i.user_id),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "{}",
            constant::LOGGING_RESPONSE
        );
        Ok(())
    }

    async fn route(request: &Request, identity: Option<Identity>, svc: &Service) -> Response {
        let logged_in = identity.is_some();
        let path = request.path.as_str();

        //Router
        let result = match (&request.method, path, identity) {
            (GET, "/login", _) => Ok(svc.login_page(request)),
            (POST, "/login", _) => svc.login(request).await,
            (GET, "/register", _) => Ok(svc.register_page(request)),
            (POST, "/register", _) => svc.register(request).await,
            (GET, "/logout", _) => Ok(svc.logout()),

            (_, path, None) if PROTECTED_PATHS.contains(&path) => Ok(Response::redirect("/login")),

            (GET, "/", Some(id)) => svc.index(request, id).await,
            (GET, "/buy", Some(_)) => Ok(svc.buy_page(request)),
            (POST, "/buy", Some(id)) => svc.buy(request, id).await,
            (GET, "/sell", Some(id)) => svc.sell_page(request, id).await,
            (POST, "/sell", Some(id)) => svc.sell(request, id).await,
            (GET, "/quote", Some(_)) => svc.quote_page(request).await,
            (POST, "/quote", Some(_)) => svc.quote(request).await,
            (GET, "/history", Some(id)) => svc.history(request, id).await,
            (GET, "/balance", Some(id)) => svc.balance_page(request, id).await,
            (POST, "/balance", Some(id)) => svc.balance(request, id).await,

            _ => Ok(svc.not_found(logged_in)),
        };

        result.unwrap_or_else(|e| svc.error_page(&e, logged_in))
    }
}
