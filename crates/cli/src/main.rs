//! Jamur POS CLI - Database migrations, staff accounts and seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! jamur-pos migrate
//!
//! # Create a staff account (password from -p or JAMUR_POS_PASSWORD)
//! jamur-pos user create -e kasir@jamur.com -n "Kasir Jamur" -r cashier
//!
//! # Seed demo data
//! jamur-pos seed demo
//!
//! # Seed a catalog from YAML
//! jamur-pos seed catalog seeds/demo_catalog.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "jamur-pos")]
#[command(author, version, about = "Jamur POS CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage staff accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new staff account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`owner`, `cashier`)
        #[arg(short, long, default_value = "cashier")]
        role: String,

        /// Password (at least 8 characters)
        #[arg(short, long, env = "JAMUR_POS_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Owner and cashier accounts plus the demo catalog
    Demo,
    /// Categories and products from a YAML file
    Catalog {
        /// Path to the YAML file
        file: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                password,
            } => commands::user::create(&email, &name, &role, &password).await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Demo => commands::seed::demo().await?,
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "jamur-pos", "user", "create", "-e", "kasir@jamur.com", "-n", "Kasir", "-r", "cashier",
            "-p", "rahasia123",
        ])
        .unwrap();

        match cli.command {
            Commands::User {
                action: UserAction::Create { email, role, password, .. },
            } => {
                assert_eq!(email, "kasir@jamur.com");
                assert_eq!(role, "cashier");
                assert_eq!(password, "rahasia123");
            }
            _ => panic!("expected user create"),
        }
    }

    #[test]
    fn test_parse_seed_catalog() {
        let cli = Cli::try_parse_from(["jamur-pos", "seed", "catalog", "menu.yaml"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Seed { target: SeedTarget::Catalog { file } } if file == "menu.yaml"
        ));
    }
}
