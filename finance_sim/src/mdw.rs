use anyhow::{Result, anyhow};
use auth_validate::jwt::verify_jwt;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crate::constant::SESSION_COOKIE;
use crate::req::Request;
use crate::resp::{Response, Status};

/// The logged-in user a request acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
}

pub struct Middleware {}

impl Middleware {
    /// Reads the request and resolves the session cookie. Unreadable requests
    /// are answered with 400 here and reported as `Err`.
    pub async fn new<S: AsyncRead + AsyncWrite + Unpin>(
        stream: &mut S,
        max_bytes: usize,
        jwt_secret: &str,
    ) -> Result<(Request, Option<Identity>)> {
        let request = match Request::new(&mut *stream, max_bytes).await {
            Ok(req) => req,
            Err(e) => {
                info!("rejecting request: {:#}", e);
                let _ = Response::html(Status::BadRequest, format!("400 Bad Request: {}", e))
                    .write_to(stream)
                    .await;
                return Err(anyhow!("request format invalid"));
            }
        };
        let identity = Self::identify(&request, jwt_secret);
        Ok((request, identity))
    }

    /// Missing, forged, expired or malformed sessions all mean anonymous.
    pub fn identify(request: &Request, jwt_secret: &str) -> Option<Identity> {
        let token = request.cookie(SESSION_COOKIE).filter(|t| !t.is_empty())?;
        match verify_jwt(token, jwt_secret) {
            Ok(sub) => sub.parse::<i64>().ok().map(|user_id| Identity { user_id }),
            Err(e) => {
                debug!("ignoring session cookie: {}", e);
                None
            }
        }
    }
}
