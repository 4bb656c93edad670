// Session / Authorization Layer
//
// State machine: Anonymous --login--> Authenticated(role) --logout--> Anonymous
//
// The session is an explicit value handed to every call. Each operation checks
// the caller's role against the permission table and, where records are owned,
// uses the caller's own account id; nothing relies on the menu hiding options.

use crate::db::Database;
use crate::entities::{
    Account, AccountDirectory, ClassCatalog, Membership, MembershipLedger, MembershipPlan, Role,
    WorkoutClass,
};
use crate::error::{GymError, Result};
use crate::password::PasswordHasher;
use serde::Serialize;
use tracing::{info, warn};

// ============================================================================
// PERMISSIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ListAccounts,
    DeleteAccount,
    ViewRevenue,
    CreateClass,
    ListOwnClasses,
    UpdateOwnClass,
    DeleteOwnClass,
    ListAllClasses,
    PurchaseMembership,
    ListOwnMemberships,
    CancelOwnMembership,
    /// View/edit own profile and change own password
    ManageProfile,
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ListAccounts,
    Permission::DeleteAccount,
    Permission::ViewRevenue,
    Permission::ManageProfile,
];

const TRAINER_PERMISSIONS: &[Permission] = &[
    Permission::CreateClass,
    Permission::ListOwnClasses,
    Permission::UpdateOwnClass,
    Permission::DeleteOwnClass,
    Permission::PurchaseMembership,
    Permission::ManageProfile,
];

const MEMBER_PERMISSIONS: &[Permission] = &[
    Permission::ListAllClasses,
    Permission::PurchaseMembership,
    Permission::ListOwnMemberships,
    Permission::CancelOwnMembership,
    Permission::ManageProfile,
];

impl Role {
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Admin => ADMIN_PERMISSIONS,
            Role::Trainer => TRAINER_PERMISSIONS,
            Role::Member => MEMBER_PERMISSIONS,
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// The authenticated caller.
///
/// Only `Gym::login` and `Gym::update_profile` hand these out, so a session
/// cannot be made up by the caller:
///
/// ```compile_fail
/// use gym_records::{Role, Session, SessionUser};
///
/// let forged = Session::Authenticated(SessionUser {
///     account_id: 1,
///     username: "root".to_string(),
///     role: Role::Admin,
/// });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    account_id: i64,
    username: String,
    role: Role,
}

impl SessionUser {
    pub(crate) fn new(account: &Account) -> Self {
        SessionUser {
            account_id: account.id,
            username: account.username.clone(),
            role: account.role,
        }
    }

    pub fn account_id(&self) -> i64 {
        self.account_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    fn check(&self, permission: Permission) -> Result<()> {
        if self.role.allows(permission) {
            return Ok(());
        }
        warn!(account_id = self.account_id, role = %self.role, ?permission, "permission denied");
        Err(GymError::unauthorized(format!(
            "{} accounts may not perform {:?}",
            self.role, permission
        )))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(SessionUser),
}

impl Session {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// Role as of login; `Gym` re-reads the stored role on every call
    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }

    /// Unconditional transition back to Anonymous
    pub fn logout(self) -> Session {
        if let Session::Authenticated(user) = &self {
            info!(account_id = user.account_id, "logged out");
        }
        Session::Anonymous
    }

    /// The caller, if their role at login grants `permission`; `Unauthorized` otherwise
    pub fn require(&self, permission: Permission) -> Result<&SessionUser> {
        let Some(user) = self.user() else {
            warn!(?permission, "permission denied for anonymous session");
            return Err(GymError::unauthorized("login required"));
        };
        user.check(permission)?;
        Ok(user)
    }
}

/// Fields a caller may change on their own profile; `None` keeps the old value
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

// ============================================================================
// GYM FACADE
// ============================================================================

/// Entry point tying the three directories together behind role checks
pub struct Gym {
    db: Database,
    hasher: Box<dyn PasswordHasher>,
}

impl Gym {
    pub fn new(db: Database, hasher: impl PasswordHasher + 'static) -> Self {
        Gym {
            db,
            hasher: Box::new(hasher),
        }
    }

    /// Unchecked directory access, for bootstrap tooling and tests
    pub fn accounts(&self) -> AccountDirectory<'_> {
        AccountDirectory::new(&self.db, self.hasher.as_ref())
    }

    pub fn memberships(&self) -> MembershipLedger<'_> {
        MembershipLedger::new(&self.db)
    }

    pub fn classes(&self) -> ClassCatalog<'_> {
        ClassCatalog::new(&self.db)
    }

    // ------------------------------------------------------------------------
    // Anonymous operations
    // ------------------------------------------------------------------------

    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let account = self.accounts().login(username, password)?;
        Ok(Session::Authenticated(SessionUser::new(&account)))
    }

    /// Re-load the caller's account and check `permission` against its stored
    /// role. A deleted account's session is refused; ids are never reused.
    fn caller(&self, session: &Session, permission: Permission) -> Result<SessionUser> {
        let Some(cached) = session.user() else {
            warn!(?permission, "permission denied for anonymous session");
            return Err(GymError::unauthorized("login required"));
        };
        let Some(account) = self.db.find_account_by_id(cached.account_id)? else {
            warn!(account_id = cached.account_id, ?permission, "session account no longer exists");
            return Err(GymError::unauthorized("account no longer exists"));
        };

        let user = SessionUser::new(&account);
        user.check(permission)?;
        Ok(user)
    }

    /// Self-service registration: MEMBER or TRAINER only
    pub fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
        phone: &str,
        address: &str,
        role: &str,
    ) -> Result<Account> {
        if role.parse::<Role>()? == Role::Admin {
            warn!(username, "refused self-registration as admin");
            return Err(GymError::forbidden("admin accounts cannot be self-registered"));
        }
        self.accounts()
            .register(username, password, email, phone, address, role)
    }

    // ------------------------------------------------------------------------
    // Admin
    // ------------------------------------------------------------------------

    pub fn list_accounts(&self, session: &Session) -> Result<Vec<Account>> {
        self.caller(session, Permission::ListAccounts)?;
        self.accounts().list_all()
    }

    /// Delete a non-admin account
    pub fn delete_account(&self, session: &Session, account_id: i64) -> Result<bool> {
        self.caller(session, Permission::DeleteAccount)?;
        self.accounts().delete(account_id)
    }

    pub fn total_revenue(&self, session: &Session) -> Result<f64> {
        self.caller(session, Permission::ViewRevenue)?;
        self.memberships().total_revenue()
    }

    // ------------------------------------------------------------------------
    // Trainer
    // ------------------------------------------------------------------------

    pub fn create_class(
        &self,
        session: &Session,
        class_type: &str,
        description: &str,
    ) -> Result<WorkoutClass> {
        let user = self.caller(session, Permission::CreateClass)?;
        self.classes().create(class_type, description, user.account_id)
    }

    pub fn list_own_classes(&self, session: &Session) -> Result<Vec<WorkoutClass>> {
        let user = self.caller(session, Permission::ListOwnClasses)?;
        self.classes().list_by_trainer(user.account_id)
    }

    /// Change type/description of one of the caller's classes
    pub fn update_class(
        &self,
        session: &Session,
        class_id: i64,
        class_type: &str,
        description: &str,
    ) -> Result<bool> {
        let user = self.caller(session, Permission::UpdateOwnClass)?;
        let class = WorkoutClass {
            id: class_id,
            ..WorkoutClass::new(class_type, description, user.account_id)
        };
        self.classes().update(&class)
    }

    pub fn delete_class(&self, session: &Session, class_id: i64) -> Result<bool> {
        let user = self.caller(session, Permission::DeleteOwnClass)?;
        self.classes().delete(class_id, user.account_id)
    }

    // ------------------------------------------------------------------------
    // Member (purchase is shared with trainers)
    // ------------------------------------------------------------------------

    pub fn list_classes(&self, session: &Session) -> Result<Vec<WorkoutClass>> {
        self.caller(session, Permission::ListAllClasses)?;
        self.classes().list_all()
    }

    /// Buy a plan for the caller's own account
    pub fn purchase_membership(&self, session: &Session, plan: MembershipPlan) -> Result<Membership> {
        let user = self.caller(session, Permission::PurchaseMembership)?;
        self.memberships().purchase_plan(plan, user.account_id)
    }

    pub fn list_own_memberships(&self, session: &Session) -> Result<Vec<Membership>> {
        let user = self.caller(session, Permission::ListOwnMemberships)?;
        self.memberships().list_by_account(user.account_id)
    }

    /// Cancel one of the caller's own memberships
    pub fn cancel_membership(&self, session: &Session, membership_id: i64) -> Result<bool> {
        let user = self.caller(session, Permission::CancelOwnMembership)?;
        let membership = self.memberships().get_by_id(membership_id)?;
        if membership.account_id != user.account_id {
            warn!(
                account_id = user.account_id,
                membership_id, "refused to cancel another account's membership"
            );
            return Err(GymError::unauthorized(format!(
                "membership {} belongs to another account",
                membership_id
            )));
        }
        self.memberships().delete(membership_id)
    }

    // ------------------------------------------------------------------------
    // Every role
    // ------------------------------------------------------------------------

    pub fn profile(&self, session: &Session) -> Result<Account> {
        let user = self.caller(session, Permission::ManageProfile)?;
        self.accounts().get_by_id(user.account_id)
    }

    /// Edit the caller's own profile. The role is never changed on this path.
    pub fn update_profile(&self, session: &mut Session, update: ProfileUpdate) -> Result<Account> {
        let user = self.caller(session, Permission::ManageProfile)?;
        let mut account = self.accounts().get_by_id(user.account_id)?;

        if let Some(username) = update.username {
            account.username = username;
        }
        if let Some(email) = update.email {
            account.email = email;
        }
        if let Some(phone) = update.phone {
            account.phone = phone;
        }
        if let Some(address) = update.address {
            account.address = address;
        }

        if !self.accounts().update_profile(&account)? {
            return Err(GymError::not_found("account", account.id));
        }
        *session = Session::Authenticated(SessionUser::new(&account));
        Ok(account)
    }

    /// Change the caller's password after re-checking the current one
    pub fn change_password(&self, session: &Session, current: &str, new_password: &str) -> Result<bool> {
        let user = self.caller(session, Permission::ManageProfile)?;
        let directory = self.accounts();
        let account = directory.get_by_id(user.account_id)?;

        if !directory.verify_password(&account, current)? {
            warn!(account_id = account.id, "password change rejected");
            return Err(GymError::InvalidCredentials);
        }
        directory.change_password(account.id, new_password)
    }
}
