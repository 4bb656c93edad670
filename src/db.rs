// Persistence Gateway - SQLite storage for accounts, memberships and classes
//
// Every operation is a single parameterized statement. Business rules live in
// the entities layer; this module only maps rows to records and back.

use crate::entities::{Account, Membership, WorkoutClass};
use crate::error::{GymError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

const ACCOUNT_COLUMNS: &str = "id, username, password_hash, email, phone, address, role";
const MEMBERSHIP_COLUMNS: &str = "id, membership_type, description, cost, account_id, start_date";
const CLASS_COLUMNS: &str =
    "id, class_type, description, trainer_id, capacity, schedule_time, duration_minutes";

/// Date format used for `memberships.start_date`
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Handle on the gym database
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        // WAL only applies to file databases
        conn.pragma_update(None, "journal_mode", "WAL")?;
        setup_database(&conn)?;
        debug!(path = %path.display(), "database opened");
        Ok(Database { conn })
    }

    /// Fresh private database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(Database { conn })
    }

    // ========================================================================
    // ACCOUNTS
    // ========================================================================

    /// Insert an account and return its assigned id
    pub fn insert_account(&self, account: &Account) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO accounts (username, password_hash, email, phone, address, role)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    account.username,
                    account.password_hash,
                    account.email,
                    account.phone,
                    account.address,
                    account.role,
                ],
            )
            .map_err(|e| username_conflict(e, &account.username))?;

        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_account_by_id(&self, id: i64) -> Result<Option<Account>> {
        let account = self
            .conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
                [id],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    pub fn find_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let account = self
            .conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?1"),
                [username],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"))?;
        let accounts = stmt
            .query_map([], account_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(accounts)
    }

    /// Persist username/email/phone/address/role. The password hash is untouched.
    pub fn update_account(&self, account: &Account) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE accounts
                 SET username = ?1, email = ?2, phone = ?3, address = ?4, role = ?5
                 WHERE id = ?6",
                params![
                    account.username,
                    account.email,
                    account.phone,
                    account.address,
                    account.role,
                    account.id,
                ],
            )
            .map_err(|e| username_conflict(e, &account.username))?;
        Ok(changed > 0)
    }

    pub fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE accounts SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, id],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_account(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM accounts WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    // ========================================================================
    // MEMBERSHIPS
    // ========================================================================

    pub fn insert_membership(&self, membership: &Membership) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO memberships (membership_type, description, cost, account_id, start_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                membership.membership_type,
                membership.description,
                membership.cost,
                membership.account_id,
                membership.start_date.format(DATE_FORMAT).to_string(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_membership_by_id(&self, id: i64) -> Result<Option<Membership>> {
        let membership = self
            .conn
            .query_row(
                &format!("SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE id = ?1"),
                [id],
                membership_from_row,
            )
            .optional()?;
        Ok(membership)
    }

    pub fn list_memberships_by_account(&self, account_id: i64) -> Result<Vec<Membership>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE account_id = ?1 ORDER BY id"
        ))?;
        let memberships = stmt
            .query_map([account_id], membership_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(memberships)
    }

    pub fn list_memberships(&self) -> Result<Vec<Membership>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {MEMBERSHIP_COLUMNS} FROM memberships ORDER BY id"))?;
        let memberships = stmt
            .query_map([], membership_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(memberships)
    }

    /// Persist type/description/cost by id
    pub fn update_membership(&self, membership: &Membership) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE memberships SET membership_type = ?1, description = ?2, cost = ?3
             WHERE id = ?4",
            params![
                membership.membership_type,
                membership.description,
                membership.cost,
                membership.id,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_membership(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM memberships WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    /// SUM(cost) over every membership, 0.0 when there are none
    pub fn total_membership_cost(&self) -> Result<f64> {
        let total: f64 = self.conn.query_row(
            "SELECT COALESCE(SUM(cost), 0.0) FROM memberships",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    // ========================================================================
    // WORKOUT CLASSES
    // ========================================================================

    pub fn insert_class(&self, class: &WorkoutClass) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO workout_classes
                (class_type, description, trainer_id, capacity, schedule_time, duration_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                class.class_type,
                class.description,
                class.trainer_id,
                class.capacity,
                class.schedule_time.to_rfc3339(),
                class.duration_minutes,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_class_by_id(&self, id: i64) -> Result<Option<WorkoutClass>> {
        let class = self
            .conn
            .query_row(
                &format!("SELECT {CLASS_COLUMNS} FROM workout_classes WHERE id = ?1"),
                [id],
                class_from_row,
            )
            .optional()?;
        Ok(class)
    }

    pub fn list_classes_by_trainer(&self, trainer_id: i64) -> Result<Vec<WorkoutClass>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CLASS_COLUMNS} FROM workout_classes WHERE trainer_id = ?1 ORDER BY id"
        ))?;
        let classes = stmt
            .query_map([trainer_id], class_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(classes)
    }

    pub fn list_classes(&self) -> Result<Vec<WorkoutClass>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CLASS_COLUMNS} FROM workout_classes ORDER BY id"))?;
        let classes = stmt
            .query_map([], class_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(classes)
    }

    /// Persist type/description by id
    pub fn update_class(&self, class: &WorkoutClass) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE workout_classes SET class_type = ?1, description = ?2 WHERE id = ?3",
            params![class.class_type, class.description, class.id],
        )?;
        Ok(changed > 0)
    }

    /// Delete by id, scoped to the owning trainer
    pub fn delete_class(&self, id: i64, trainer_id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM workout_classes WHERE id = ?1 AND trainer_id = ?2",
            params![id, trainer_id],
        )?;
        Ok(changed > 0)
    }
}

/// Create tables and indexes (idempotent)
pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            address TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('ADMIN', 'TRAINER', 'MEMBER')),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- account_id is a weak reference: no foreign key, no cascade
        CREATE TABLE IF NOT EXISTS memberships (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            membership_type TEXT NOT NULL,
            description TEXT NOT NULL,
            cost REAL NOT NULL,
            account_id INTEGER NOT NULL,
            start_date TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS workout_classes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            class_type TEXT NOT NULL,
            description TEXT NOT NULL,
            trainer_id INTEGER NOT NULL,
            capacity INTEGER NOT NULL,
            schedule_time TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_memberships_account ON memberships(account_id);
        CREATE INDEX IF NOT EXISTS idx_classes_trainer ON workout_classes(trainer_id);",
    )?;

    Ok(())
}

/// A UNIQUE violation on insert/update of an account can only be the username
fn username_conflict(err: rusqlite::Error, username: &str) -> GymError {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            GymError::DuplicateUsername(username.to_string())
        }
        other => other.into(),
    }
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        role: row.get(6)?,
    })
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<Membership> {
    let start_date_str: String = row.get(5)?;
    let start_date = NaiveDate::parse_from_str(&start_date_str, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(Membership {
        id: row.get(0)?,
        membership_type: row.get(1)?,
        description: row.get(2)?,
        cost: row.get(3)?,
        account_id: row.get(4)?,
        start_date,
    })
}

fn class_from_row(row: &Row<'_>) -> rusqlite::Result<WorkoutClass> {
    let schedule_str: String = row.get(5)?;
    let schedule_time = DateTime::parse_from_rfc3339(&schedule_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(WorkoutClass {
        id: row.get(0)?,
        class_type: row.get(1)?,
        description: row.get(2)?,
        trainer_id: row.get(3)?,
        capacity: row.get(4)?,
        schedule_time,
        duration_minutes: row.get(6)?,
    })
}
