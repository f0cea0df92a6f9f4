use auth_validate::jwt::issue_jwt;
use auth_validate::password::{hash_password, verify_password};
use rust_decimal::Decimal;
use tracing::info;

use crate::db::Store;
use crate::error::AppError;
use crate::mdw::Identity;
use crate::user::model::{LoginForm, RegisterForm};
use crate::user::repo::UserRepo;

/// Registration, credential checks and session token issuing.
#[derive(Clone)]
pub struct Accounts {
    store: Store,
    jwt_secret: String,
    session_ttl_secs: u64,
    default_cash: Decimal,
}

impl Accounts {
    pub fn new(store: Store, jwt_secret: &str, session_ttl_secs: u64, default_cash: Decimal) -> Self {
        Self {
            store,
            jwt_secret: jwt_secret.to_string(),
            session_ttl_secs,
            default_cash,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<Identity, AppError> {
        let username = non_blank(form.username.as_deref())
            .ok_or_else(|| AppError::validation("must provide username"))?;
        let password = form
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::validation("must provide password"))?;
        if form.confirmation.as_deref() != Some(password) {
            return Err(AppError::validation("passwords do not match"));
        }

        let mut conn = self.store.acquire().await?;
        if UserRepo::find_by_username(&mut conn, username).await?.is_some() {
            return Err(AppError::DuplicateUsername);
        }
        let hash = hash_password(password)?;
        let user_id = UserRepo::insert(&mut conn, username, &hash, self.default_cash).await?;

        info!(user_id, username, "user registered");
        Ok(Identity { user_id })
    }

    pub async fn login(&self, form: &LoginForm) -> Result<Identity, AppError> {
        let username = non_blank(form.username.as_deref())
            .ok_or_else(|| AppError::Authentication("must provide username".to_string()))?;
        let password = form
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::Authentication("must provide password".to_string()))?;

        let user = {
            let mut conn = self.store.acquire().await?;
            UserRepo::find_by_username(&mut conn, username).await?
        };
        let invalid = || AppError::Authentication("invalid username and/or password".to_string());
        let user = user.ok_or_else(invalid)?;
        if !verify_password(password, &user.hash)? {
            return Err(invalid());
        }

        info!(user_id = user.id, "user logged in");
        Ok(Identity { user_id: user.id })
    }

    pub fn issue_session(&self, identity: Identity) -> Result<String, AppError> {
        Ok(issue_jwt(
            &identity.user_id.to_string(),
            &self.jwt_secret,
            self.session_ttl_secs,
        )?)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
