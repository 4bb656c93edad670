// Entity Models
//
// Each entity has:
// - A record struct keyed by an integer id assigned by storage
// - A directory/ledger/catalog that owns its business rules

pub mod account;
pub mod membership;
pub mod workout_class;

pub use account::{Account, AccountDirectory, Role};
pub use membership::{Membership, MembershipLedger, MembershipPlan};
pub use workout_class::{ClassCatalog, WorkoutClass};
