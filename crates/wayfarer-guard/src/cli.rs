//! CLI module for wayfarer-guard.
//!
//! Administers the SQL record store: schema setup, profiles and tiers, usage
//! inspection and repair. It can be used either as a standalone binary or as
//! a subcommand of the main wayfarer-rs CLI.
//!
//! # Usage
//!
//! ```bash
//! # Initialize database schema
//! wayfarer-guard init -d sqlite:wayfarer.db
//!
//! # Add a user on the explorer tier
//! wayfarer-guard add-user -d sqlite:wayfarer.db -u alice --tier explorer
//!
//! # List all users
//! wayfarer-guard list -d sqlite:wayfarer.db --format json
//!
//! # Recompute usage from stored image sizes
//! wayfarer-guard reconcile -d sqlite:wayfarer.db
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::model::UserProfile;
use crate::quota::QuotaSnapshot;
use crate::size::format_bytes;
use crate::sql::{SqlStore, SqlStoreConfig};
use crate::tier::{Tier, TierCatalog};
use crate::{RecordStore, sha224_hex};

/// Guard administration CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wayfarer-guard",
    version,
    about = "Manage wayfarer profiles, tiers and storage usage"
)]
pub struct GuardArgs {
    #[command(subcommand)]
    pub command: GuardCommands,
}

/// Guard CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum GuardCommands {
    /// Initialize database schema.
    Init {
        /// Database connection URL.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,
    },

    /// Add a user profile.
    AddUser {
        /// Database connection URL.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// User ID (as issued by the identity provider).
        #[arg(short, long)]
        user_id: String,

        /// Email address.
        #[arg(short, long)]
        email: Option<String>,

        /// Subscription tier.
        #[arg(short, long, default_value = "free")]
        tier: Tier,
    },

    /// Change a user's subscription tier.
    SetTier {
        /// Database connection URL.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// User ID to update.
        #[arg(short, long)]
        user_id: String,

        /// New subscription tier.
        #[arg(short, long)]
        tier: Tier,
    },

    /// List all users.
    List {
        /// Database connection URL.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// Output format (table, json, csv).
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show a user's storage usage against the default tier limits.
    Usage {
        /// Database connection URL.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// User ID to inspect.
        #[arg(short, long)]
        user_id: String,
    },

    /// Recompute every user's storage usage from stored image sizes.
    Reconcile {
        /// Database connection URL.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,
    },

    /// Show a bearer token hash (for static identity configuration).
    HashToken {
        /// Token to hash.
        token: String,
    },
}

/// Profile row for display.
#[derive(Tabled, Serialize)]
struct ProfileDisplay {
    #[tabled(rename = "User ID")]
    id: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Limit")]
    limit: String,
}

fn profile_display(catalog: &TierCatalog, profile: &UserProfile) -> ProfileDisplay {
    let quota = QuotaSnapshot::for_profile(catalog, profile);
    ProfileDisplay {
        id: profile.id.clone(),
        email: profile.email.clone().unwrap_or_else(|| "-".to_string()),
        tier: profile.subscription_tier.clone(),
        used: format_bytes(quota.used_bytes),
        limit: format_bytes(quota.limit_bytes),
    }
}

/// Run the guard CLI with the given arguments.
///
/// This is the main entry point for the guard CLI, used by both the
/// standalone binary and the unified wayfarer-rs CLI.
pub async fn run(args: GuardArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        GuardCommands::Init { database } => {
            let store = connect(&database).await?;
            store.init_schema().await?;
            println!("Database schema initialized successfully.");
            Ok(())
        }
        GuardCommands::AddUser {
            database,
            user_id,
            email,
            tier,
        } => {
            let store = connect(&database).await?;
            let profile = UserProfile::new(user_id.trim(), tier).with_email(email);
            if profile.id.is_empty() {
                return Err("user id must not be empty".into());
            }
            if store.insert_profile_if_absent(&profile).await? {
                println!("User '{}' added on the {} tier.", profile.id, tier);
                Ok(())
            } else {
                Err(format!("User '{}' already exists.", profile.id).into())
            }
        }
        GuardCommands::SetTier {
            database,
            user_id,
            tier,
        } => {
            let store = connect(&database).await?;
            if store.set_subscription_tier(&user_id, tier.as_str()).await? {
                println!("User '{user_id}' moved to the {tier} tier.");
                Ok(())
            } else {
                Err(format!("User '{user_id}' not found.").into())
            }
        }
        GuardCommands::List { database, format } => list_users(&database, &format).await,
        GuardCommands::Usage { database, user_id } => {
            let store = connect(&database).await?;
            let profile = store
                .get_profile(&user_id)
                .await?
                .ok_or_else(|| format!("User '{user_id}' not found."))?;
            let catalog = TierCatalog::default();
            let quota = QuotaSnapshot::for_profile(&catalog, &profile);
            let images = store.list_images(&user_id).await?;
            let stored: u64 = images.iter().map(|i| i.size_bytes).sum();

            println!("User:      {}", profile.id);
            println!("Tier:      {}", profile.subscription_tier);
            println!("Used:      {}", format_bytes(quota.used_bytes));
            println!("Limit:     {}", format_bytes(quota.limit_bytes));
            println!("Remaining: {}", format_bytes(quota.remaining_bytes));
            println!("Images:    {} ({})", images.len(), format_bytes(stored));
            if stored != quota.used_bytes {
                println!("Recorded usage differs from image sizes; run `reconcile` to repair.");
            }
            Ok(())
        }
        GuardCommands::Reconcile { database } => {
            let store = connect(&database).await?;
            let n = store.reconcile_usage().await?;
            println!("Reconciled storage usage for {n} user(s).");
            Ok(())
        }
        GuardCommands::HashToken { token } => {
            println!("{}", sha224_hex(&token));
            Ok(())
        }
    }
}

/// Connect to database.
async fn connect(url: &str) -> Result<SqlStore, Box<dyn std::error::Error>> {
    let config = SqlStoreConfig::new(url).max_connections(1).min_connections(0);
    Ok(SqlStore::connect(config).await?)
}

/// List all users.
async fn list_users(url: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = connect(url).await?;
    let profiles = store.list_profiles().await?;

    if profiles.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    let catalog = TierCatalog::default();
    let users: Vec<ProfileDisplay> = profiles
        .iter()
        .map(|p| profile_display(&catalog, p))
        .collect();
    println!("{}", render(&users, format)?);
    Ok(())
}

fn render(users: &[ProfileDisplay], format: &str) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        "json" => serde_json::to_string_pretty(users)?,
        "csv" => {
            let mut out = String::from("id,email,tier,used,limit");
            for u in users {
                out.push('\n');
                out.push_str(&format!(
                    "{},{},{},{},{}",
                    u.id, u.email, u.tier, u.used, u.limit
                ));
            }
            out
        }
        _ => Table::new(users).to_string(),
    })
}
