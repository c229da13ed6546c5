//! Capstone CLI - the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! capstone shop --category lifestyle --sort price-low
//! capstone product 3
//!
//! # Cart and wishlist
//! capstone cart add 3 --quantity 2
//! capstone cart update 3 -- -1
//! capstone wishlist toggle 5
//!
//! # Account
//! capstone login -e user@example.com -p password123
//! capstone whoami
//! capstone logout
//! ```
//!
//! Without `CAPSTONE_BACKEND_URL` the CLI runs in demo mode with an
//! in-memory backend and the account `user@example.com` / `password123`.
//! Local cart and wishlist snapshots live in `CAPSTONE_DATA_DIR`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use capstone_storefront::config::StorefrontConfig;
use capstone_storefront::error::AppError;
use capstone_storefront::services::auth::SignUpForm;
use capstone_storefront::state::AppState;

mod commands;
mod console;

use console::ConsoleNotifier;

#[derive(Parser)]
#[command(name = "capstone")]
#[command(author, version, about = "Capstone storefront CLI")]
struct Cli {
    /// Write logs as JSON lines instead of text
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Shop {
        /// Category filter (`all`, `lifestyle`, `street`, ...)
        #[arg(short, long, default_value = "all")]
        category: String,

        /// Sort order (`newest`, `price-low`, `price-high`, `name-asc`, `name-desc`)
        #[arg(short, long, default_value = "newest")]
        sort: String,
    },
    /// Show one product
    Product {
        /// Product id
        id: String,
    },
    /// Show featured reviews
    Reviews {
        /// How many reviews to show
        #[arg(short, long, default_value_t = 3)]
        count: usize,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: Option<WishlistAction>,
    },
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Signup {
        /// Full name
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Repeat the password
        #[arg(short, long)]
        confirm_password: String,
    },
    /// Sign out
    Logout,
    /// Show who is signed in
    Whoami,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    List,
    /// Add a product
    Add {
        /// Product id
        id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove {
        /// Product id
        id: String,
    },
    /// Set a line's quantity; zero or less removes it
    Update {
        /// Product id
        id: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show the wishlist
    List,
    /// Save a product
    Add {
        /// Product id
        id: String,
    },
    /// Remove a product
    Remove {
        /// Product id
        id: String,
    },
    /// Save a product, or remove it if already saved
    Toggle {
        /// Product id
        id: String,
    },
    /// Empty the wishlist
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.sentry_environment.clone().into()),
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

fn init_tracing(json: bool) {
    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "capstone_storefront=info,capstone_cli=info".into());

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

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(cli.log_json);
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(cli.log_json);

    if let Err(e) = run(cli, config).await {
        e.report();
        console::error(&e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), AppError> {
    let state = AppState::new(config, Arc::new(ConsoleNotifier))?;
    if state.is_demo() {
        tracing::info!("demo mode: sign in as user@example.com / password123");
    }
    state.start().await;

    let result = dispatch(&state, cli.command).await;

    // Let queued backend writes land before the process exits
    state.flush().await;
    result
}

async fn dispatch(state: &AppState, command: Commands) -> Result<(), AppError> {
    match command {
        Commands::Shop { category, sort } => commands::shop::list(state, &category, &sort),
        Commands::Product { id } => commands::shop::show(state, &id)?,
        Commands::Reviews { count } => commands::shop::reviews(state, count),
        Commands::Cart { action } => match action.unwrap_or(CartAction::List) {
            CartAction::List => commands::cart::list(state),
            CartAction::Add { id, quantity } => commands::cart::add(state, &id, quantity)?,
            CartAction::Remove { id } => commands::cart::remove(state, &id),
            CartAction::Update { id, quantity } => {
                commands::cart::update(state, &id, quantity);
            }
            CartAction::Clear => state.cart().clear(),
        },
        Commands::Wishlist { action } => match action.unwrap_or(WishlistAction::List) {
            WishlistAction::List => commands::wishlist::list(state),
            WishlistAction::Add { id } => commands::wishlist::add(state, &id)?,
            WishlistAction::Remove { id } => commands::wishlist::remove(state, &id),
            WishlistAction::Toggle { id } => commands::wishlist::toggle(state, &id)?,
            WishlistAction::Clear => state.wishlist().clear(),
        },
        Commands::Login { email, password } => {
            commands::account::login(state, &email, &password).await?;
        }
        Commands::Signup {
            name,
            email,
            password,
            confirm_password,
        } => {
            let form = SignUpForm {
                name,
                email,
                password,
                confirm_password,
            };
            commands::account::signup(state, &form).await?;
        }
        Commands::Logout => commands::account::logout(state).await?,
        Commands::Whoami => commands::account::whoami(state),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_log_json_flag_is_global() {
        let cli = Cli::try_parse_from(["capstone", "cart", "--log-json"]).unwrap();
        assert!(cli.log_json);
        assert!(matches!(cli.command, Commands::Cart { action: None }));

        let cli = Cli::try_parse_from(["capstone", "whoami"]).unwrap();
        assert!(!cli.log_json);
    }
}
