// Gym Records - Core Library
// Accounts, memberships and workout classes behind role-based authorization.
// Used by the CLI menu and by tests.

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod logging;
pub mod password;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use db::{setup_database, Database};
pub use entities::{
    Account, AccountDirectory, Role,
    Membership, MembershipLedger, MembershipPlan,
    ClassCatalog, WorkoutClass,
};
pub use error::{GymError, Result};
pub use password::{BcryptHasher, PasswordHasher, MIN_BCRYPT_COST};
pub use session::{Gym, Permission, ProfileUpdate, Session, SessionUser};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
