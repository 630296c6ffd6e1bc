//! UniFind - Campus Marketplace API
//! Mission: Verified students trade, report lost items, and message each other

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unifind_backend::{
    api::{create_router, AppState},
    auth::{BcryptHasher, JwtHandler},
    config::ServerConfig,
    db::Database,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let config = ServerConfig::parse();
    config.validate().context("Invalid configuration")?;

    info!("🚀 UniFind API starting");

    let db = Database::open(&config.database_path)?;
    info!("🗄️ Database ready at: {}", config.database_path.display());

    let jwt_handler = Arc::new(JwtHandler::new(config.token_config()));
    let hasher = Arc::new(BcryptHasher::new(config.password_config()));
    let email_policy = config.email_policy();
    info!(
        "🔐 Registration restricted to @{} (bcrypt cost {})",
        email_policy.domain(),
        config.bcrypt_cost
    );

    let state = AppState::new(db, jwt_handler, hasher, email_policy);
    let app = create_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Initialize tracing with an env-overridable filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unifind_backend=debug,unifind=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // Also the crate root, for runs started from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
