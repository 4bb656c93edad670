mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gym_records::{logging, BcryptHasher, Config, Database, Gym, Role};
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "gym-records",
    version,
    about = "Gym membership and class scheduling records",
    long_about = "Role-based record keeper for a small gym: admins, trainers and members, memberships and workout classes."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Database file (overrides GYM_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level or filter directive (overrides GYM_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Render listings as JSON lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive menu (default)
    Menu,

    /// Create the database schema
    Init,

    /// Bootstrap an admin account
    CreateAdmin {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long, default_value = "")]
        address: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.json_output = cli.json;

    logging::init_logging(&config.log_level)?;

    let db = open_database(&config)?;
    let gym = Gym::new(db, BcryptHasher::new(config.bcrypt_cost));

    match cli.command.unwrap_or(Command::Menu) {
        Command::Menu => {
            let stdin = io::stdin();
            let mut menu = ui::Menu::new(&gym, stdin.lock(), io::stdout(), config.json_output);
            menu.run()?;
        }
        Command::Init => {
            println!("✓ Database ready at {}", config.database_path.display());
        }
        Command::CreateAdmin {
            username,
            password,
            email,
            phone,
            address,
        } => {
            let admin = gym
                .accounts()
                .register(&username, &password, &email, &phone, &address, Role::Admin.as_str())
                .context("Failed to create admin account")?;
            println!("✓ Admin '{}' created with id {}", admin.username, admin.id);
        }
    }

    Ok(())
}

fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }

    let db = Database::open(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    info!(path = %config.database_path.display(), "database ready");
    Ok(db)
}
