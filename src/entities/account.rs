// Account Entity + Account Directory
//
// One Account record carries a closed Role tag instead of per-role subtypes.
// The directory owns credential handling: hashes on the way in, constant-time
// verification on the way back, never plaintext.

use crate::db::Database;
use crate::error::{GymError, Result};
use crate::password::PasswordHasher;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

// ============================================================================
// ROLE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Trainer,
    Member,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Trainer, Role::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Trainer => "TRAINER",
            Role::Member => "MEMBER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive: "member" and "MEMBER" are the same role
impl FromStr for Role {
    type Err = GymError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "TRAINER" => Ok(Role::Trainer),
            "MEMBER" => Ok(Role::Member),
            _ => Err(GymError::InvalidRole(s.to_string())),
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = String::column_result(value)?;
        text.parse::<Role>()
            .map_err(|_| FromSqlError::Other(format!("invalid stored role: {}", text).into()))
    }
}

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

#[derive(Clone, Serialize)]
pub struct Account {
    /// Assigned by storage on creation (0 until then)
    pub id: i64,
    pub username: String,
    /// bcrypt hash, never serialized or printed
    #[serde(skip)]
    pub(crate) password_hash: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub role: Role,
}

impl Account {
    pub fn new(
        username: String,
        password_hash: String,
        email: String,
        phone: String,
        address: String,
        role: Role,
    ) -> Self {
        Account {
            id: 0,
            username,
            password_hash,
            email,
            phone,
            address,
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("address", &self.address)
            .field("role", &self.role)
            .finish()
    }
}

// ============================================================================
// ACCOUNT DIRECTORY
// ============================================================================

pub struct AccountDirectory<'a> {
    db: &'a Database,
    hasher: &'a dyn PasswordHasher,
}

impl<'a> AccountDirectory<'a> {
    pub fn new(db: &'a Database, hasher: &'a dyn PasswordHasher) -> Self {
        AccountDirectory { db, hasher }
    }

    /// Create an account with a hashed password.
    ///
    /// Fails with `DuplicateUsername` if the name is taken, with
    /// `InvalidRole` unless `role` is ADMIN, TRAINER or MEMBER, and with
    /// `PasswordTooLong` past 72 bytes.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
        phone: &str,
        address: &str,
        role: &str,
    ) -> Result<Account> {
        if self.db.find_account_by_username(username)?.is_some() {
            return Err(GymError::DuplicateUsername(username.to_string()));
        }
        let role: Role = role.parse()?;

        let mut account = Account::new(
            username.to_string(),
            self.hasher.hash(password)?,
            email.to_string(),
            phone.to_string(),
            address.to_string(),
            role,
        );
        account.id = self.db.insert_account(&account)?;

        info!(account_id = account.id, username, %role, "account registered");
        Ok(account)
    }

    /// Verify credentials. Unknown username and wrong password both yield
    /// `InvalidCredentials` after comparable work.
    pub fn login(&self, username: &str, password: &str) -> Result<Account> {
        let Some(account) = self.db.find_account_by_username(username)? else {
            self.hasher.verify_missing(password);
            warn!(username, "login rejected");
            return Err(GymError::InvalidCredentials);
        };

        match self.hasher.verify(password, &account.password_hash) {
            Ok(true) => {}
            // An overlong password cannot match; it must fail like any other
            Ok(false) | Err(GymError::PasswordTooLong(_)) => {
                warn!(username, "login rejected");
                return Err(GymError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        }

        info!(account_id = account.id, username, "login succeeded");
        Ok(account)
    }

    pub fn get_by_id(&self, id: i64) -> Result<Account> {
        self.db
            .find_account_by_id(id)?
            .ok_or_else(|| GymError::not_found("account", id))
    }

    pub fn list_all(&self) -> Result<Vec<Account>> {
        self.db.list_accounts()
    }

    /// Persist username/email/phone/address/role changes
    pub fn update_profile(&self, account: &Account) -> Result<bool> {
        let updated = self.db.update_account(account)?;
        if updated {
            info!(account_id = account.id, "profile updated");
        }
        Ok(updated)
    }

    pub fn change_password(&self, id: i64, new_password: &str) -> Result<bool> {
        let hash = self.hasher.hash(new_password)?;
        let updated = self.db.update_password_hash(id, &hash)?;
        if updated {
            info!(account_id = id, "password changed");
        }
        Ok(updated)
    }

    /// Check a password for an account that is already known
    pub fn verify_password(&self, account: &Account, password: &str) -> Result<bool> {
        self.hasher.verify(password, &account.password_hash)
    }

    /// Remove an account. Admin accounts can never be deleted.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let account = self.get_by_id(id)?;
        if account.is_admin() {
            warn!(account_id = id, "refused to delete admin account");
            return Err(GymError::forbidden("admin accounts cannot be deleted"));
        }

        let deleted = self.db.delete_account(id)?;
        if deleted {
            info!(account_id = id, username = %account.username, "account deleted");
        }
        Ok(deleted)
    }
}
