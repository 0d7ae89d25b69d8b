//! Catalog admin CLI.
//!
//! # Usage
//!
//! ```bash
//! # Start a session. The password comes from CATALOG_PASSWORD or a
//! # prompt; the prompt does not hide what is typed.
//! catalog login -e admin@example.com
//!
//! # Browse interactively with debounced search
//! catalog browse
//!
//! # One-shot commands
//! catalog products list --search tote
//! catalog products create --name "Canvas tote" --price 12.50
//! catalog products delete 17
//! catalog categories list
//! catalog logout
//! ```
//!
//! Configuration comes from the environment (`CATALOG_API_URL`,
//! `CATALOG_SESSION_FILE`, ...). Set `CATALOG_LOG_JSON` for JSON logs.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use catalog_admin::AppState;
use catalog_admin::config::AdminConfig;
use catalog_core::{CategoryId, ProductId};
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(author, version, about = "Catalog administration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the catalog backend
    ///
    /// Without `--password` or `CATALOG_PASSWORD` the password is read from
    /// a prompt that echoes the input.
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Password; prefer CATALOG_PASSWORD over the flag, which shows in shell history
        #[arg(long, env = "CATALOG_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// End the current session
    Logout,
    /// Show the logged-in user and their permissions
    Whoami,
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Browse products interactively
    Browse,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// Name search term
        #[arg(short, long)]
        search: Option<String>,

        /// Category id
        #[arg(short, long)]
        category: Option<CategoryId>,
    },
    /// Create a product
    Create {
        #[arg(short, long)]
        name: String,

        /// Price, e.g. 12.50
        #[arg(short, long)]
        price: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Units in stock (defaults to 0)
        #[arg(long)]
        stock: Option<String>,

        /// Image file to upload
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    /// Delete a product
    Delete {
        id: ProductId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// List categories
    List,
}

/// Initialize Sentry and return the guard that must be kept alive.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "catalog_admin=info,catalog_cli=info".into());

    // Logs go to stderr so command output stays pipeable
    let json = std::env::var_os("CATALOG_LOG_JSON").is_some();
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[allow(clippy::print_stderr)]
fn fail(error: &CliError) -> ! {
    eprintln!("error: {}", error.user_message());
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    let config = match AdminConfig::from_env() {
        Ok(config) => config,
        Err(e) => fail(&CliError::Config(e)),
    };

    let sentry_guard = init_sentry(&config);
    init_tracing();

    let cli = Cli::parse();

    let mut state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => fail(&e.into()),
    };

    if let Err(e) = run(cli, &mut state).await {
        let e = match e {
            CliError::App(e) => CliError::App(state.check(e)),
            other => other,
        };
        tracing::debug!(error = %e, "Command failed");
        // exit() skips destructors, so flush Sentry first
        drop(sentry_guard);
        fail(&e);
    }
}

async fn run(cli: Cli, state: &mut AppState) -> Result<(), CliError> {
    match cli.command {
        Commands::Login { email, password } => commands::auth::login(state, email, password).await,
        Commands::Logout => commands::auth::logout(state).await,
        Commands::Whoami => commands::auth::whoami(state),
        Commands::Products { action } => match action {
            ProductAction::List { search, category } => {
                commands::products::list(state, search, category).await
            }
            ProductAction::Create {
                name,
                price,
                description,
                stock,
                photo,
            } => {
                let args = commands::products::CreateArgs {
                    name,
                    price,
                    description,
                    stock,
                    photo,
                };
                commands::products::create(state, args).await
            }
            ProductAction::Delete { id, yes } => commands::products::delete(state, id, yes).await,
        },
        Commands::Categories {
            action: CategoryAction::List,
        } => commands::categories::list(state).await,
        Commands::Browse => commands::browse::run(state).await,
    }
}
