//! Bếp CLI - migrations, accounts, menu seeding, and media uploads.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! bep-cli migrate
//!
//! # Create a back-office account (password read from BEP_NEW_PASSWORD)
//! bep-cli user create -u lan -r staff --full-name "Nguyễn Thị Lan"
//!
//! # Load the menu from YAML
//! bep-cli menu seed crates/cli/seed/menu.yaml
//!
//! # Stage and publish a hero video
//! bep-cli video upload ./hero.mp4 --slot hero --activate
//! ```
//!
//! # Commands
//!
//! - `migrate` - Apply database migrations
//! - `user create` / `user list` - Manage back-office accounts
//! - `menu seed` - Upsert menu items from a YAML file
//! - `video upload` / `video activate` - Staged hero and reservation videos
//! - `objects upload` - Upload files through pre-signed URLs

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;

use bep_core::{Locale, VideoSlot};

mod commands;

#[derive(Parser)]
#[command(name = "bep-cli")]
#[command(author, version, about = "Bếp site CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate {
        #[command(flatten)]
        database: DatabaseArgs,
    },
    /// Manage back-office accounts
    User {
        #[command(flatten)]
        database: DatabaseArgs,

        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage the menu
    Menu {
        #[command(flatten)]
        database: DatabaseArgs,

        #[command(subcommand)]
        action: MenuAction,
    },
    /// Hero and reservation videos
    Video {
        #[command(flatten)]
        site: SiteArgs,

        #[command(subcommand)]
        action: VideoAction,
    },
    /// Files uploaded through pre-signed URLs
    Objects {
        #[command(flatten)]
        site: SiteArgs,

        #[command(subcommand)]
        action: ObjectsAction,
    },
}

#[derive(Args)]
struct DatabaseArgs {
    /// `PostgreSQL` connection URL
    #[arg(long, env = "BEP_DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

impl DatabaseArgs {
    fn url(self) -> SecretString {
        SecretString::from(self.database_url)
    }
}

#[derive(Args)]
struct SiteArgs {
    /// Site base URL
    #[arg(long, env = "BEP_BASE_URL", default_value = "http://localhost:3000")]
    base_url: String,

    /// Back-office username
    #[arg(long, env = "BEP_USERNAME")]
    username: String,

    /// Back-office password
    #[arg(long, env = "BEP_PASSWORD", hide_env_values = true)]
    password: String,

    /// Language for notifications (`vi` or `en`)
    #[arg(long, env = "BEP_LOCALE", default_value = "vi")]
    locale: Locale,

    /// Where the signed-in identity is persisted between runs
    #[arg(long, env = "BEP_SESSION_FILE", default_value = ".bep-session.json")]
    session_file: PathBuf,
}

impl SiteArgs {
    fn connection<'a>(&'a self, password: &'a SecretString) -> commands::media::Connection<'a> {
        commands::media::Connection {
            base_url: &self.base_url,
            username: &self.username,
            password,
            locale: self.locale,
            session_file: &self.session_file,
        }
    }
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a back-office account
    Create {
        /// Login name (3-32 characters: a-z, 0-9, `.`, `_`, `-`)
        #[arg(short, long)]
        username: String,

        /// Initial password
        #[arg(long, env = "BEP_NEW_PASSWORD", hide_env_values = true)]
        password: String,

        /// Role (`admin` or `staff`)
        #[arg(short, long, default_value = "staff")]
        role: String,

        /// Grant a permission; repeat for several. Defaults to the role's set.
        #[arg(short, long = "permission")]
        permissions: Vec<String>,

        /// Display name
        #[arg(long)]
        full_name: Option<String>,

        /// Contact email
        #[arg(short, long)]
        email: Option<String>,
    },
    /// List all accounts
    List,
}

#[derive(Subcommand)]
enum MenuAction {
    /// Upsert menu items from a YAML file, matched by slug
    Seed {
        /// Path to the YAML file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum VideoAction {
    /// Upload a video and stage it as the slot's pending video
    Upload {
        /// Video file
        file: PathBuf,

        /// Target slot (`hero` or `reservation`)
        #[arg(short, long)]
        slot: VideoSlot,

        /// Publish right after staging
        #[arg(long)]
        activate: bool,
    },
    /// Publish the slot's pending video
    Activate {
        /// Target slot (`hero` or `reservation`)
        #[arg(short, long)]
        slot: VideoSlot,
    },
}

#[derive(Subcommand)]
enum ObjectsAction {
    /// Upload files one by one through pre-signed URLs
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { database } => commands::migrate::run(&database.url()).await?,
        Commands::User { database, action } => match action {
            UserAction::Create {
                username,
                password,
                role,
                permissions,
                full_name,
                email,
            } => {
                let password = SecretString::from(password);
                let args = commands::user::CreateArgs {
                    username: &username,
                    password: &password,
                    role: &role,
                    permissions: &permissions,
                    full_name: full_name.as_deref(),
                    email: email.as_deref(),
                };
                commands::user::create(&database.url(), &args).await?;
            }
            UserAction::List => commands::user::list(&database.url()).await?,
        },
        Commands::Menu { database, action } => match action {
            MenuAction::Seed { file } => commands::menu::seed(&database.url(), &file).await?,
        },
        Commands::Video { site, action } => {
            let password = SecretString::from(site.password.clone());
            let connection = site.connection(&password);
            match action {
                VideoAction::Upload {
                    file,
                    slot,
                    activate,
                } => commands::media::upload_video(&connection, &file, slot, activate).await?,
                VideoAction::Activate { slot } => {
                    commands::media::activate_video(&connection, slot).await?;
                }
            }
        }
        Commands::Objects { site, action } => match action {
            ObjectsAction::Upload { files } => {
                let password = SecretString::from(site.password.clone());
                commands::media::upload_objects(&site.connection(&password), &files).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_video_slot_parses_from_args() {
        let cli = Cli::try_parse_from([
            "bep-cli",
            "video",
            "--username",
            "lan",
            "--password",
            "secret-pass",
            "activate",
            "--slot",
            "reservation",
        ])
        .map_err(|e| e.to_string());
        let Ok(Cli {
            command: Commands::Video { action: VideoAction::Activate { slot }, .. },
        }) = cli
        else {
            panic!("unexpected parse: {cli:?}", cli = cli.err());
        };
        assert_eq!(slot, VideoSlot::Reservation);
    }

    #[test]
    fn test_unknown_slot_is_rejected() {
        let cli = Cli::try_parse_from([
            "bep-cli", "video", "--username", "lan", "--password", "x", "activate", "--slot", "menu",
        ]);
        assert!(cli.is_err());
    }
}
