//! Printshop CLI - drive the client session from a terminal.
//!
//! The session is persisted under `PRINTSHOP_STATE_DIR`, so a login in one
//! invocation is visible to the next.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password may also come from PRINTSHOP_PASSWORD)
//! printshop login jane@example.com --password 'correct horse'
//!
//! # Create an account
//! printshop register --first-name Jane --last-name Doe -e jane@example.com
//!
//! # Show the signed-in user, or re-check the token against the backend
//! printshop whoami
//! printshop validate
//!
//! # Ask the route guards about a navigation
//! printshop check-route /orders
//! printshop check-route /admin/orders --admin
//!
//! printshop logout
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use printshop_client::ClientConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "printshop")]
#[command(author, version, about = "Printshop client session tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session
    Login {
        /// Email address or username
        identifier: String,

        /// Account password
        #[arg(short, long, env = "PRINTSHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and persist the session
    Register {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(short, long)]
        email: String,

        /// Account password (at least 8 characters)
        #[arg(short, long, env = "PRINTSHOP_PASSWORD", hide_env_values = true)]
        password: String,

        /// Password confirmation; defaults to `--password`
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Print the cached user
    Whoami,
    /// Refresh the cached user from the backend
    Validate,
    /// Clear the persisted session
    Logout,
    /// Run the route guards for a path
    CheckRoute {
        /// Requested path, e.g. `/orders`
        path: String,

        /// Also apply the admin guard
        #[arg(long)]
        admin: bool,
    },
}

/// Initialize Sentry when a DSN is configured.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "printshop_client=info,printshop_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), commands::CommandError> {
    let context = commands::Context::open(config)?;

    match cli.command {
        Commands::Login {
            identifier,
            password,
        } => commands::auth::login(&context, identifier, password).await?,
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
        } => {
            let confirm_password = confirm_password.unwrap_or_else(|| password.clone());
            let form = printshop_client::forms::RegisterForm {
                first_name,
                last_name,
                email,
                password,
                confirm_password,
            };
            commands::auth::register(&context, &form).await?;
        }
        Commands::Whoami => commands::auth::whoami(&context)?,
        Commands::Validate => commands::auth::validate(&context).await?,
        Commands::Logout => commands::auth::logout(&context),
        Commands::CheckRoute { path, admin } => {
            commands::route::check(&context, &path, admin).await?;
        }
    }
    Ok(())
}
