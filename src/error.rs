// Error taxonomy for the record keeping core
// Business-rule violations are raised where they are detected and propagate unchanged

use thiserror::Error;

/// Every failure the core can surface to a caller
#[derive(Debug, Error)]
pub enum GymError {
    /// Entity absent (account, membership or workout class)
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("username '{0}' already exists")]
    DuplicateUsername(String),

    /// Unknown username and wrong password look identical on purpose
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("invalid role: {0} (expected ADMIN, TRAINER or MEMBER)")]
    InvalidRole(String),

    /// Ownership or role check failed
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Operation is never allowed on this record (e.g. deleting an admin)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Longer than bcrypt can hash without truncating
    #[error("password is {0} bytes, at most 72 are allowed")]
    PasswordTooLong(usize),

    #[error("invalid membership cost: {0}")]
    InvalidCost(f64),

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, GymError>;

impl GymError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        GymError::NotFound { entity, id }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        GymError::Unauthorized(reason.into())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        GymError::Forbidden(reason.into())
    }
}
