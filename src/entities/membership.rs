// Membership Entity + Membership Ledger
//
// The ledger is deliberately permissive: it neither checks who owns a
// membership on update/delete nor that the account id exists on purchase.
// Ownership is enforced one layer up, in the session facade.

use crate::db::Database;
use crate::error::{GymError, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Membership {
    pub id: i64,
    /// Free-text tier label ("Monthly", "Annual", ...)
    pub membership_type: String,
    pub description: String,
    pub cost: f64,
    /// Owning account (weak reference)
    pub account_id: i64,
    pub start_date: NaiveDate,
}

impl Membership {
    /// New, unsaved membership starting today
    pub fn new(
        membership_type: impl Into<String>,
        description: impl Into<String>,
        cost: f64,
        account_id: i64,
    ) -> Self {
        Membership {
            id: 0,
            membership_type: membership_type.into(),
            description: description.into(),
            cost,
            account_id,
            start_date: Utc::now().date_naive(),
        }
    }
}

/// Plans offered at the front desk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipPlan {
    Monthly,
    Annual,
}

impl MembershipPlan {
    pub const ALL: [MembershipPlan; 2] = [MembershipPlan::Monthly, MembershipPlan::Annual];

    pub fn label(&self) -> &'static str {
        match self {
            MembershipPlan::Monthly => "Monthly",
            MembershipPlan::Annual => "Annual",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MembershipPlan::Monthly => "30-day membership",
            MembershipPlan::Annual => "365-day membership",
        }
    }

    pub fn cost(&self) -> f64 {
        match self {
            MembershipPlan::Monthly => 50.0,
            MembershipPlan::Annual => 500.0,
        }
    }
}

fn validate_cost(cost: f64) -> Result<()> {
    if !cost.is_finite() || cost < 0.0 {
        return Err(GymError::InvalidCost(cost));
    }
    Ok(())
}

pub struct MembershipLedger<'a> {
    db: &'a Database,
}

impl<'a> MembershipLedger<'a> {
    pub fn new(db: &'a Database) -> Self {
        MembershipLedger { db }
    }

    /// Record a purchase. The caller is responsible for passing a real account id.
    pub fn purchase(
        &self,
        membership_type: &str,
        description: &str,
        cost: f64,
        account_id: i64,
    ) -> Result<Membership> {
        validate_cost(cost)?;

        let mut membership = Membership::new(membership_type, description, cost, account_id);
        membership.id = self.db.insert_membership(&membership)?;

        info!(
            membership_id = membership.id,
            account_id,
            membership_type,
            cost,
            "membership purchased"
        );
        Ok(membership)
    }

    pub fn purchase_plan(&self, plan: MembershipPlan, account_id: i64) -> Result<Membership> {
        self.purchase(plan.label(), plan.description(), plan.cost(), account_id)
    }

    pub fn get_by_id(&self, id: i64) -> Result<Membership> {
        self.db
            .find_membership_by_id(id)?
            .ok_or_else(|| GymError::not_found("membership", id))
    }

    pub fn list_by_account(&self, account_id: i64) -> Result<Vec<Membership>> {
        self.db.list_memberships_by_account(account_id)
    }

    pub fn list_all(&self) -> Result<Vec<Membership>> {
        self.db.list_memberships()
    }

    /// Persist type/description/cost by id. No ownership check here.
    pub fn update(&self, membership: &Membership) -> Result<bool> {
        validate_cost(membership.cost)?;
        let updated = self.db.update_membership(membership)?;
        if updated {
            info!(membership_id = membership.id, "membership updated");
        }
        Ok(updated)
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self.db.delete_membership(id)?;
        if deleted {
            info!(membership_id = id, "membership cancelled");
        }
        Ok(deleted)
    }

    /// Sum of cost over every membership, 0.0 when there are none
    pub fn total_revenue(&self) -> Result<f64> {
        self.db.total_membership_cost()
    }
}
