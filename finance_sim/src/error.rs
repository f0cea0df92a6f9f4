use std::{error::Error, fmt::Debug};

use crate::resp::Status;

#[derive(thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InsufficientFunds(String),

    #[error("{0}")]
    InsufficientShares(String),

    #[error("username already exists")]
    DuplicateUsername,

    #[error("{0}")]
    Authentication(String),

    #[error("Query error")]
    Database(#[from] sqlx::Error),

    #[error("Quote provider error")]
    Quote(#[from] reqwest::Error),

    #[error("Corrupt value {value:?} in column {column}")]
    Corrupt { column: &'static str, value: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status(&self) -> Status {
        match self {
            AppError::Validation(_)
            | AppError::NotFound(_)
            | AppError::InsufficientFunds(_)
            | AppError::InsufficientShares(_)
            | AppError::DuplicateUsername => Status::BadRequest,
            AppError::Authentication(_) => Status::Forbidden,
            AppError::Database(_)
            | AppError::Quote(_)
            | AppError::Corrupt { .. }
            | AppError::Internal(_) => Status::InternalError,
        }
    }

    /// Infrastructure failures; their details stay in the logs.
    pub fn is_internal(&self) -> bool {
        self.status() == Status::InternalError
    }
}

impl From<auth_validate::AuthError> for AppError {
    fn from(err: auth_validate::AuthError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        if let Some(source) = self.source() {
            write!(f, " (Caused by: {})", source)?;
        }
        Ok(())
    }
}
