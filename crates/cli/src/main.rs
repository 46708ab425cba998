//! AutoSouq CLI - local stores, the hosted catalog and seller accounts.
//!
//! # Usage
//!
//! ```bash
//! # Create the local and hosted schemas
//! autosouq migrate all
//!
//! # Load the sample sellers and listings
//! autosouq seed crates/cli/seed/sample_cars.yaml
//!
//! # Browse local listings
//! autosouq browse --search bmw --max-price 350000 --location Dubai
//!
//! # Featured listings from the hosted catalog
//! autosouq featured --limit 3
//!
//! # Sell a car
//! autosouq login -e sales@dubailuxury.ae -p showroom-2024
//! autosouq sell --title "2020 Audi A6" --make Audi --model A6 --year 2020 \
//!     --price 175000 --mileage 58000 --location Sharjah --publish
//! ```
//!
//! Records are printed one per line on stdout; logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autosouq_storefront::config::StorefrontConfig;
use autosouq_storefront::error::AppError;
use autosouq_storefront::state::AppState;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "autosouq")]
#[command(author, version, about = "AutoSouq car classifieds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update store schemas
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Load sellers and listings from a YAML file
    Seed {
        /// Path to the seed file
        file: PathBuf,

        /// Also insert into the hosted catalog
        #[arg(long)]
        remote: bool,
    },
    /// Search local listings
    Browse {
        /// Title substring
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        min_price: Option<Decimal>,

        #[arg(long)]
        max_price: Option<Decimal>,

        /// Exact location, or `all`
        #[arg(short, long)]
        location: Option<String>,
    },
    /// List the locations of local listings
    Locations,
    /// Show one listing
    Show {
        id: String,

        /// Look the listing up in the hosted catalog
        #[arg(long)]
        remote: bool,
    },
    /// Newest listings from the hosted catalog
    Featured {
        /// Number of listings (default: `AUTOSOUQ_FEATURED_LIMIT`)
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// A seller's listings in the hosted catalog
    Seller { id: String },
    /// Create an account and log in
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(short, long)]
        location: Option<String>,
    },
    /// Log in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Forget the current session
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Show or change the logged-in account's profile
    Profile {
        #[arg(short, long)]
        name: Option<String>,

        /// New phone number, empty to clear
        #[arg(long)]
        phone: Option<String>,

        /// New location, empty to clear
        #[arg(short, long)]
        location: Option<String>,

        /// Use the hosted profile instead of the local account
        #[arg(long)]
        remote: bool,
    },
    /// List a car for sale
    Sell(commands::listings::SellArgs),
    /// Listings of the logged-in account
    Mine,
    /// Delete all local accounts, listings and the session
    Reset,
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Embedded `SQLite` store
    Local,
    /// Hosted `PostgreSQL` catalog
    Remote,
    /// Both stores
    All,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
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

    // Needed for Sentry init
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Must be done before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "autosouq_storefront=info,autosouq_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        e.report();
        output::failure(&e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), AppError> {
    let state = AppState::open(config).await?;

    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Local => commands::migrate::local(&state).await?,
            MigrateTarget::Remote => commands::migrate::remote(&state).await?,
            MigrateTarget::All => {
                commands::migrate::local(&state).await?;
                commands::migrate::remote(&state).await?;
            }
        },
        Commands::Seed { file, remote } => commands::seed::run(&state, &file, remote).await?,
        Commands::Browse {
            search,
            min_price,
            max_price,
            location,
        } => {
            commands::listings::browse(&state, search, min_price, max_price, location).await;
        }
        Commands::Locations => commands::listings::locations(&state).await,
        Commands::Show { id, remote } => {
            if remote {
                commands::catalog::show(&state, &id).await?;
            } else {
                commands::listings::show(&state, &id).await?;
            }
        }
        Commands::Featured { limit } => commands::catalog::featured(&state, limit).await?,
        Commands::Seller { id } => commands::catalog::seller(&state, &id).await?,
        Commands::Register {
            name,
            email,
            password,
            phone,
            location,
        } => {
            commands::account::register(
                &state,
                &name,
                &email,
                &password,
                phone.as_deref(),
                location.as_deref(),
            )
            .await?;
        }
        Commands::Login { email, password } => {
            commands::account::login(&state, &email, &password).await?;
        }
        Commands::Logout => commands::account::logout(&state).await?,
        Commands::Whoami => commands::account::whoami(&state).await?,
        Commands::Profile {
            name,
            phone,
            location,
            remote,
        } => {
            let changes = autosouq_storefront::services::ProfileChanges {
                name,
                phone,
                location,
            };
            if remote {
                commands::catalog::profile(&state, changes).await?;
            } else {
                commands::account::profile(&state, &changes).await?;
            }
        }
        Commands::Sell(args) => commands::listings::sell(&state, args).await?,
        Commands::Mine => commands::listings::mine(&state).await?,
        Commands::Reset => commands::account::reset(&state).await?,
    }
    Ok(())
}
