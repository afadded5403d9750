//! `tasknotes` command-line entry point.
//!
//! # Responsibility
//! - Load configuration and bootstrap logging.
//! - Dispatch to the web server, fixture seeding and user admin commands.

mod config;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use config::AppConfig;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tasknotes_core::form::UserForm;
use tasknotes_core::repo::user_repo::SqliteUserRepository;
use tasknotes_core::service::user_service::UserService;
use tasknotes_core::{load_fixtures, open_db, Argon2PasswordHasher, ServiceError};
use tasknotes_web::AppState;
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "tasknotes", version, about = "Tasks and notes with per-user visibility")]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve,
    /// Fill the database with random sample data.
    Seed {
        /// Seed for a reproducible data set.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Create a user account.
    CreateUser(CreateUserArgs),
    /// Print core linkage info.
    Ping,
}

#[derive(Debug, Args)]
struct CreateUserArgs {
    #[arg(long)]
    email: String,
    /// Display name; defaults to the part of the email before `@`.
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    password: String,
    /// Grant the admin role.
    #[arg(long)]
    admin: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Command::Ping = cli.command {
        println!("tasknotes_core ping={}", tasknotes_core::ping());
        println!("tasknotes_core version={}", tasknotes_core::core_version());
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    let cwd = std::env::current_dir().context("resolving working directory")?;
    let log_dir = config.absolute_log_dir(&cwd);
    tasknotes_core::init_logging(&config.log_level, &log_dir.to_string_lossy())
        .context("initializing logging")?;

    match cli.command {
        Command::Serve => serve(&config),
        Command::Seed { seed } => seed_database(&config, seed),
        Command::CreateUser(args) => create_user(&config, args),
        Command::Ping => Ok(()),
    }
}

fn serve(config: &AppConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    runtime.block_on(async {
        let state = AppState::new(&config.database_path, Argon2PasswordHasher::default())
            .context("preparing application state")?;
        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .with_context(|| format!("binding {}", config.bind_addr))?;
        println!("listening on http://{}", listener.local_addr()?);
        tasknotes_web::serve(listener, state)
            .await
            .context("serving HTTP")
    })
}

fn seed_database(config: &AppConfig, seed: Option<u64>) -> Result<()> {
    let conn = open_db(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let summary = load_fixtures(&conn, &Argon2PasswordHasher::default(), &mut rng)
        .context("loading fixtures")?;
    info!(
        "event=fixtures_cli module=cli status=ok users={} admins={} tasks={} notes={}",
        summary.users, summary.admins, summary.tasks, summary.notes
    );
    println!(
        "seeded {} users, {} admins, {} categories, {} tags, {} tasks, {} notes",
        summary.users,
        summary.admins,
        summary.categories,
        summary.tags,
        summary.tasks,
        summary.notes
    );
    Ok(())
}

fn create_user(config: &AppConfig, args: CreateUserArgs) -> Result<()> {
    let conn = open_db(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    let service = UserService::new(SqliteUserRepository::try_new(&conn)?);
    let name = args
        .name
        .unwrap_or_else(|| default_display_name(&args.email));
    let form = UserForm {
        email: args.email,
        name,
        is_admin: args.admin,
        password: Some(args.password),
    };
    let user = match service.create_from_form(&form, &Argon2PasswordHasher::default()) {
        Ok(user) => user,
        Err(ServiceError::Invalid(errors)) => bail!("invalid user: {errors}"),
        Err(other) => return Err(other).context("creating user"),
    };
    println!(
        "created user id={} email={} admin={}",
        user.id.unwrap_or_default(),
        user.email,
        user.is_admin()
    );
    Ok(())
}

fn default_display_name(email: &str) -> String {
    email
        .split_once('@')
        .map_or(email, |(local, _)| local)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{default_display_name, Cli, Command};
    use clap::Parser;

    #[test]
    fn display_name_defaults_to_email_local_part() {
        assert_eq!(default_display_name("ada@example.com"), "ada");
        assert_eq!(default_display_name("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn create_user_accepts_missing_name() {
        let cli = Cli::try_parse_from([
            "tasknotes",
            "create-user",
            "--email",
            "ada@example.com",
            "--password",
            "secret-pass",
        ])
        .unwrap();
        match cli.command {
            Command::CreateUser(args) => {
                assert_eq!(args.name, None);
                assert!(!args.admin);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
