//! Server configuration
//!
//! Parsed once at startup from flags and environment (after `.env` is
//! loaded). Components receive the pieces they need; nothing reads the
//! environment later.
//!
//! Environment Variables:
//!   BIND_ADDR             - listen address (default: 0.0.0.0:3000)
//!   DATABASE_PATH         - SQLite file (default: unifind.db)
//!   JWT_SECRET            - HMAC signing secret
//!   BCRYPT_COST           - bcrypt work factor, 4..=31 (default: 10)
//!   ALLOWED_EMAIL_DOMAIN  - institutional email domain (default: ku.edu.np)

use anyhow::{bail, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

use crate::auth::{EmailPolicy, PasswordConfig, TokenConfig};

pub const DEV_JWT_SECRET: &str = "unifind-dev-secret-change-me";

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Parser, Debug, Clone)]
#[command(name = "unifind")]
#[command(about = "Campus marketplace API server")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long = "bind", env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: SocketAddr,

    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "unifind.db")]
    pub database_path: PathBuf,

    /// Secret used to sign access tokens
    #[arg(long, env = "JWT_SECRET", default_value = DEV_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: String,

    /// bcrypt work factor
    #[arg(long, env = "BCRYPT_COST", default_value_t = 10)]
    pub bcrypt_cost: u32,

    /// Only emails under this domain may register
    #[arg(long, env = "ALLOWED_EMAIL_DOMAIN", default_value = "ku.edu.np")]
    pub email_domain: String,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if self.email_domain.trim().trim_start_matches('.').is_empty() {
            bail!("ALLOWED_EMAIL_DOMAIN must not be empty");
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            bail!(
                "BCRYPT_COST must be between {} and {}, got {}",
                MIN_BCRYPT_COST,
                MAX_BCRYPT_COST,
                self.bcrypt_cost
            );
        }

        if self.jwt_secret == DEV_JWT_SECRET {
            warn!("⚠️ JWT_SECRET not set, using the development secret");
        }
        Ok(())
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.jwt_secret.clone(),
        }
    }

    pub fn password_config(&self) -> PasswordConfig {
        PasswordConfig {
            cost: self.bcrypt_cost,
        }
    }

    pub fn email_policy(&self) -> EmailPolicy {
        EmailPolicy::new(self.email_domain.clone())
    }
}
