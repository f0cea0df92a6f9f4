#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Failed to sign token: {0}")]
    Sign(String),

    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("System clock is before UNIX_EPOCH")]
    Clock,
}
