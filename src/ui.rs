// Interactive text menu
//
// Pure I/O over the Gym facade: every decision (role, ownership, credentials)
// is made by the core, the menu only renders results and error messages.

use anyhow::Result;
use gym_records::{
    Account, Gym, GymError, Membership, MembershipPlan, ProfileUpdate, Role, Session,
    WorkoutClass,
};
use serde::Serialize;
use std::io::{BufRead, Write};

/// Input ran out; the menu shuts down quietly
#[derive(Debug, thiserror::Error)]
#[error("end of input")]
struct EndOfInput;

pub struct Menu<'a, R, W> {
    gym: &'a Gym,
    input: R,
    output: W,
    json: bool,
    session: Session,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(gym: &'a Gym, input: R, output: W, json: bool) -> Self {
        Menu {
            gym,
            input,
            output,
            json,
            session: Session::Anonymous,
        }
    }

    /// Run until the user exits or input ends
    pub fn run(&mut self) -> Result<()> {
        match self.main_menu() {
            Err(e) if e.is::<EndOfInput>() => {
                writeln!(self.output, "\nGoodbye!")?;
                Ok(())
            }
            other => other,
        }
    }

    fn main_menu(&mut self) -> Result<()> {
        loop {
            writeln!(self.output, "\n╭--------------------------------------╮")?;
            writeln!(self.output, "│ Welcome to the Gym Management System │")?;
            writeln!(self.output, "╰--------------------------------------╯\n")?;
            writeln!(self.output, "1. Login")?;
            writeln!(self.output, "2. Register")?;
            writeln!(self.output, "3. Exit")?;

            match self.ask("Choose an option: ")?.as_str() {
                "1" => self.login()?,
                "2" => self.register()?,
                "3" => {
                    writeln!(self.output, "Goodbye!")?;
                    return Ok(());
                }
                _ => writeln!(self.output, "Invalid option. Please try again.")?,
            }
        }
    }

    fn login(&mut self) -> Result<()> {
        let username = self.ask("Enter username: ")?;
        let password = self.ask("Enter password: ")?;

        match self.gym.login(&username, &password) {
            Ok(session) => {
                writeln!(self.output, "Welcome, {}!", username)?;
                self.session = session;
                self.role_menu()
            }
            Err(e) => self.show_error("Login failed", &e),
        }
    }

    fn register(&mut self) -> Result<()> {
        let username = self.ask("Enter username: ")?;
        let password = self.ask("Enter password: ")?;
        let email = self.ask("Enter email: ")?;
        let phone = self.ask("Enter phone number: ")?;
        let address = self.ask("Enter address: ")?;
        writeln!(self.output, "Select role:")?;
        writeln!(self.output, "1. Member")?;
        writeln!(self.output, "2. Trainer")?;
        let role = match self.ask("Choose role (1-2): ")?.as_str() {
            "1" => Role::Member.as_str().to_string(),
            "2" => Role::Trainer.as_str().to_string(),
            other => other.to_string(),
        };

        match self
            .gym
            .register(&username, &password, &email, &phone, &address, &role)
        {
            Ok(_) => writeln!(self.output, "Registration successful! Please login.")?,
            Err(e) => self.show_error("Registration failed", &e)?,
        }
        Ok(())
    }

    fn role_menu(&mut self) -> Result<()> {
        while let Some(role) = self.session.role() {
            writeln!(self.output, "\n=== {} Menu ===", role)?;
            match role {
                Role::Admin => self.admin_menu()?,
                Role::Trainer => self.trainer_menu()?,
                Role::Member => self.member_menu()?,
            }
        }
        writeln!(self.output, "Logged out successfully!")?;
        Ok(())
    }

    // ========================================================================
    // ROLE MENUS
    // ========================================================================

    fn admin_menu(&mut self) -> Result<()> {
        writeln!(self.output, "1. View all users")?;
        writeln!(self.output, "2. Delete user")?;
        writeln!(self.output, "3. View total revenue")?;
        writeln!(self.output, "4. Edit profile")?;
        writeln!(self.output, "5. Change password")?;
        writeln!(self.output, "6. Logout")?;

        match self.ask("Choose an option: ")?.as_str() {
            "1" => match self.gym.list_accounts(&self.session) {
                Ok(accounts) => self.render(&accounts, account_text)?,
                Err(e) => self.show_error("Error", &e)?,
            },
            "2" => {
                let Some(id) = self.ask_id("Enter user ID to delete: ")? else {
                    return Ok(());
                };
                match self.gym.delete_account(&self.session, id) {
                    Ok(true) => writeln!(self.output, "User deleted successfully.")?,
                    Ok(false) => writeln!(self.output, "No user was deleted.")?,
                    Err(e) => self.show_error("Error", &e)?,
                }
            }
            "3" => match self.gym.total_revenue(&self.session) {
                Ok(revenue) => writeln!(self.output, "Total Revenue: ${:.2}", revenue)?,
                Err(e) => self.show_error("Error", &e)?,
            },
            "4" => self.edit_profile()?,
            "5" => self.change_password()?,
            "6" => self.logout(),
            _ => writeln!(self.output, "Invalid option.")?,
        }
        Ok(())
    }

    fn trainer_menu(&mut self) -> Result<()> {
        writeln!(self.output, "1. Create workout class")?;
        writeln!(self.output, "2. View my classes")?;
        writeln!(self.output, "3. Update class")?;
        writeln!(self.output, "4. Delete class")?;
        writeln!(self.output, "5. Purchase membership")?;
        writeln!(self.output, "6. Edit profile")?;
        writeln!(self.output, "7. Change password")?;
        writeln!(self.output, "8. Logout")?;

        match self.ask("Choose an option: ")?.as_str() {
            "1" => {
                let class_type = self.ask("Enter class type: ")?;
                let description = self.ask("Enter class description: ")?;
                match self.gym.create_class(&self.session, &class_type, &description) {
                    Ok(class) => {
                        writeln!(self.output, "Workout class created:")?;
                        self.render(&[class], class_text)?;
                    }
                    Err(e) => self.show_error("Error", &e)?,
                }
            }
            "2" => match self.gym.list_own_classes(&self.session) {
                Ok(classes) => self.render(&classes, class_text)?,
                Err(e) => self.show_error("Error", &e)?,
            },
            "3" => {
                let Some(id) = self.ask_id("Enter class ID to update: ")? else {
                    return Ok(());
                };
                let class_type = self.ask("Enter new class type: ")?;
                let description = self.ask("Enter new class description: ")?;
                match self
                    .gym
                    .update_class(&self.session, id, &class_type, &description)
                {
                    Ok(true) => writeln!(self.output, "Workout class updated successfully.")?,
                    Ok(false) => writeln!(self.output, "Workout class was not updated.")?,
                    Err(e) => self.show_error("Error", &e)?,
                }
            }
            "4" => {
                let Some(id) = self.ask_id("Enter class ID to delete: ")? else {
                    return Ok(());
                };
                match self.gym.delete_class(&self.session, id) {
                    Ok(true) => writeln!(self.output, "Workout class deleted successfully.")?,
                    Ok(false) => writeln!(self.output, "Workout class was not deleted.")?,
                    Err(e) => self.show_error("Error", &e)?,
                }
            }
            "5" => self.purchase_membership()?,
            "6" => self.edit_profile()?,
            "7" => self.change_password()?,
            "8" => self.logout(),
            _ => writeln!(self.output, "Invalid option.")?,
        }
        Ok(())
    }

    fn member_menu(&mut self) -> Result<()> {
        writeln!(self.output, "1. View available classes")?;
        writeln!(self.output, "2. Purchase membership")?;
        writeln!(self.output, "3. View my memberships")?;
        writeln!(self.output, "4. Cancel membership")?;
        writeln!(self.output, "5. Edit profile")?;
        writeln!(self.output, "6. Change password")?;
        writeln!(self.output, "7. Logout")?;

        match self.ask("Choose an option: ")?.as_str() {
            "1" => match self.gym.list_classes(&self.session) {
                Ok(classes) => self.render(&classes, class_text)?,
                Err(e) => self.show_error("Error", &e)?,
            },
            "2" => self.purchase_membership()?,
            "3" => match self.gym.list_own_memberships(&self.session) {
                Ok(memberships) => self.render(&memberships, membership_text)?,
                Err(e) => self.show_error("Error", &e)?,
            },
            "4" => {
                let Some(id) = self.ask_id("Enter membership ID to cancel: ")? else {
                    return Ok(());
                };
                match self.gym.cancel_membership(&self.session, id) {
                    Ok(true) => writeln!(self.output, "Membership cancelled.")?,
                    Ok(false) => writeln!(self.output, "Membership was not cancelled.")?,
                    Err(e) => self.show_error("Error", &e)?,
                }
            }
            "5" => self.edit_profile()?,
            "6" => self.change_password()?,
            "7" => self.logout(),
            _ => writeln!(self.output, "Invalid option.")?,
        }
        Ok(())
    }

    // ========================================================================
    // SHARED ACTIONS
    // ========================================================================

    fn purchase_membership(&mut self) -> Result<()> {
        writeln!(self.output, "Available Membership Types:")?;
        for (i, plan) in MembershipPlan::ALL.iter().enumerate() {
            writeln!(self.output, "{}. {} (${:.0})", i + 1, plan.label(), plan.cost())?;
        }
        let plan = match self.ask("Choose membership type (1-2): ")?.as_str() {
            "1" => MembershipPlan::Monthly,
            "2" => MembershipPlan::Annual,
            _ => {
                writeln!(self.output, "Invalid option.")?;
                return Ok(());
            }
        };

        match self.gym.purchase_membership(&self.session, plan) {
            Ok(membership) => {
                writeln!(self.output, "Membership purchased successfully:")?;
                self.render(&[membership], membership_text)?;
            }
            Err(e) => self.show_error("Error", &e)?,
        }
        Ok(())
    }

    fn edit_profile(&mut self) -> Result<()> {
        writeln!(self.output, "Leave a field blank to keep its current value.")?;
        let update = ProfileUpdate {
            username: non_blank(self.ask("New username: ")?),
            email: non_blank(self.ask("New email: ")?),
            phone: non_blank(self.ask("New phone number: ")?),
            address: non_blank(self.ask("New address: ")?),
        };

        let gym = self.gym;
        match gym.update_profile(&mut self.session, update) {
            Ok(account) => {
                writeln!(self.output, "Profile updated:")?;
                self.render(&[account], account_text)?;
            }
            Err(e) => self.show_error("Error", &e)?,
        }
        Ok(())
    }

    fn change_password(&mut self) -> Result<()> {
        let current = self.ask("Current password: ")?;
        let new_password = self.ask("New password: ")?;
        match self
            .gym
            .change_password(&self.session, &current, &new_password)
        {
            Ok(_) => writeln!(self.output, "Password changed.")?,
            Err(e) => self.show_error("Error", &e)?,
        }
        Ok(())
    }

    fn logout(&mut self) {
        self.session = std::mem::take(&mut self.session).logout();
    }

    // ========================================================================
    // I/O HELPERS
    // ========================================================================

    fn ask(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(EndOfInput.into());
        }
        Ok(line.trim().to_string())
    }

    /// Numeric id prompt; prints a notice and yields None on bad input
    fn ask_id(&mut self, label: &str) -> Result<Option<i64>> {
        let raw = self.ask(label)?;
        match raw.parse() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                writeln!(self.output, "'{}' is not a valid id.", raw)?;
                Ok(None)
            }
        }
    }

    fn show_error(&mut self, prefix: &str, err: &GymError) -> Result<()> {
        writeln!(self.output, "{}: {}", prefix, err)?;
        Ok(())
    }

    fn render<T: Serialize>(&mut self, items: &[T], text: fn(&T) -> String) -> Result<()> {
        if items.is_empty() && !self.json {
            writeln!(self.output, "(none)")?;
            return Ok(());
        }
        for item in items {
            if self.json {
                writeln!(self.output, "{}", serde_json::to_string(item)?)?;
            } else {
                writeln!(self.output, "{}", text(item))?;
            }
        }
        Ok(())
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn account_text(account: &Account) -> String {
    format!(
        "╭─ Account #{} ─────────────────\n│ Username: {}\n│ Role: {}\n│ Email: {}\n│ Phone: {}\n│ Address: {}\n╰───────────────────────────────",
        account.id, account.username, account.role, account.email, account.phone, account.address
    )
}

fn class_text(class: &WorkoutClass) -> String {
    format!(
        "╭─ Workout Class #{} ─────────────────\n│ Type: {}\n│ Description: {}\n│ Trainer ID: {}\n│ Capacity: {}\n│ Scheduled: {} ({} min)\n╰───────────────────────────────────",
        class.id,
        class.class_type,
        class.description,
        class.trainer_id,
        class.capacity,
        class.schedule_time.format("%Y-%m-%d %H:%M UTC"),
        class.duration_minutes
    )
}

fn membership_text(membership: &Membership) -> String {
    format!(
        "╭─ Membership #{} ─────────────────\n│ Type: {}\n│ Description: {}\n│ Cost: ${:.2}\n│ Account ID: {}\n│ Started: {}\n╰──────────────────────────────────",
        membership.id,
        membership.membership_type,
        membership.description,
        membership.cost,
        membership.account_id,
        membership.start_date
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gym_records::{BcryptHasher, Database, MIN_BCRYPT_COST};
    use std::io::Cursor;

    fn gym() -> Gym {
        Gym::new(
            Database::open_in_memory().unwrap(),
            BcryptHasher::new(MIN_BCRYPT_COST),
        )
    }

    fn run_script(gym: &Gym, script: &[&str], json: bool) -> String {
        let input = Cursor::new(script.join("\n") + "\n");
        let mut output = Vec::new();
        Menu::new(gym, input, &mut output, json).run().unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_register_login_purchase_flow() {
        let gym = gym();
        let out = run_script(
            &gym,
            &[
                "2", "alice", "pw1", "a@x.com", "555", "addr", "1", // register as member
                "1", "alice", "wrong", // failed login
                "1", "alice", "pw1", // login
                "2", "2", // buy annual
                "3", // list memberships
                "7", // logout
                "3", // exit
            ],
            false,
        );

        assert!(out.contains("Registration successful! Please login."));
        assert!(out.contains("Login failed: invalid username or password"));
        assert!(out.contains("Welcome, alice!"));
        assert!(out.contains("=== MEMBER Menu ==="));
        assert!(out.contains("Membership purchased successfully:"));
        assert!(out.contains("Cost: $500.00"));
        assert!(out.contains("Logged out successfully!"));
        assert!(out.trim_end().ends_with("Goodbye!"));
    }

    #[test]
    fn test_trainer_cannot_touch_foreign_class() {
        let gym = gym();
        gym.accounts()
            .register("tom", "pw", "t@x.com", "555", "addr", "TRAINER")
            .unwrap();
        gym.accounts()
            .register("tina", "pw", "t2@x.com", "555", "addr", "TRAINER")
            .unwrap();
        let tina = gym.login("tina", "pw").unwrap();
        let class = gym.create_class(&tina, "Spin", "fast").unwrap();
        let class_id = class.id.to_string();

        let out = run_script(
            &gym,
            &["1", "tom", "pw", "4", class_id.as_str(), "3", class_id.as_str(), "x", "y", "8", "3"],
            false,
        );

        assert_eq!(out.matches("Error: unauthorized").count(), 2);
        assert_eq!(gym.classes().get_by_id(class.id).unwrap().class_type, "Spin");
    }

    #[test]
    fn test_admin_revenue_and_json_listing() {
        let gym = gym();
        gym.accounts()
            .register("root", "pw", "r@x.com", "555", "addr", "ADMIN")
            .unwrap();
        gym.memberships().purchase("Monthly", "30-day membership", 50.0, 1).unwrap();
        gym.memberships().purchase("Annual", "365-day membership", 500.0, 2).unwrap();

        let out = run_script(&gym, &["1", "root", "pw", "3", "1", "2", "1", "6", "3"], true);

        assert!(out.contains("Total Revenue: $550.00"));
        assert!(out.contains(r#""username":"root""#));
        assert!(out.contains(r#""role":"ADMIN""#));
        assert!(!out.contains("password_hash"));
        assert!(!out.contains("$2b$"));
        assert!(out.contains("Error: forbidden"));
    }

    #[test]
    fn test_end_of_input_exits_cleanly() {
        let gym = gym();
        let out = run_script(&gym, &["9"], false);
        assert!(out.contains("Invalid option. Please try again."));
        assert!(out.trim_end().ends_with("Goodbye!"));
    }
}
