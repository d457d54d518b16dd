//! propdash store server binary

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use propdash_store::state::DEFAULT_DATABASE_URL;
use propdash_store::{accounts, error::ApiError, router, AppState};

/// Command-line arguments for the store server
#[derive(Parser, Debug)]
#[command(name = "propdash-store")]
#[command(about = "Local PostgREST-style store and session service for propdash")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    /// Public key clients send in the `apikey` header
    #[arg(long, env = "PROPDASH_STORE_KEY")]
    api_key: String,

    /// Account to create at startup, as `email:password`
    #[arg(long, env = "PROPDASH_SEED_USER")]
    seed_user: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

async fn seed(state: &AppState, spec: &str) -> Result<()> {
    let (email, password) = spec
        .split_once(':')
        .context("--seed-user must look like email:password")?;

    match accounts::create_user(&state.db, email, password).await {
        Ok(user) => info!("Seeded user {}", user.email),
        Err(ApiError::UserExists) => info!("Seed user {} already exists", email),
        Err(e) => return Err(anyhow::anyhow!(e)),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("propdash_store=info,tower_http=debug"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::connect(&args.database_url, args.api_key.clone()).await?;

    if let Some(spec) = &args.seed_user {
        seed(&state, spec).await?;
    }

    let app = router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("invalid --host/--port")?;
    info!("Starting propdash store on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
