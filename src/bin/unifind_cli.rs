//! UniFind command-line client
//!
//! Keeps the login token in a file between runs and sends it as a bearer
//! token on every protected call.
//!
//! Usage:
//!   unifind-cli login --email ram@ku.edu.np --password ...
//!   unifind-cli items --category Books --max-price 500
//!   unifind-cli logout
//!
//! Environment Variables:
//!   UNIFIND_URL         - API base URL (default: http://localhost:3000)
//!   UNIFIND_TOKEN_FILE  - token file (default: .unifind_token)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unifind_backend::client::{ApiClient, FileTokenStorage};
use unifind_backend::marketplace::{ItemFilter, NewItem, NewMessage, PostKind};

#[derive(Parser, Debug)]
#[command(name = "unifind-cli")]
#[command(about = "Command-line client for the UniFind campus marketplace")]
struct Args {
    /// API base URL
    #[arg(long, env = "UNIFIND_URL", default_value = "http://localhost:3000")]
    url: String,

    /// Where the login token is kept
    #[arg(long, env = "UNIFIND_TOKEN_FILE", default_value = ".unifind_token")]
    token_file: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account (does not log in)
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "UNIFIND_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and store the token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "UNIFIND_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show who the stored token belongs to
    Whoami,
    /// Forget the stored token
    Logout,
    /// Browse items for sale
    Items {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        max_price: Option<f64>,
    },
    /// List an item for sale
    Sell {
        #[arg(long)]
        title: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Browse the lost & found board
    LostFound {
        /// Lost or Found
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Show received messages
    Messages,
    /// Message another user
    Send {
        #[arg(long)]
        to: i64,
        #[arg(long)]
        item: Option<i64>,
        content: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let storage = FileTokenStorage::new(&args.token_file);
    let mut client = ApiClient::new(&args.url, storage).context("Failed to build client")?;

    match args.command {
        Command::Register {
            name,
            email,
            password,
        } => {
            let message = client.register(&name, &email, &password).await?;
            println!("{message}");
        }
        Command::Login { email, password } => {
            let claims = client.login(&email, &password).await?;
            println!("Logged in as {} <{}>", claims.name, claims.email);
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out");
        }
        command => {
            if client.restore().await?.is_none() {
                anyhow::bail!("Not logged in. Run `unifind-cli login` first.");
            }
            run_authenticated(&client, command).await?;
        }
    }

    Ok(())
}

async fn run_authenticated(client: &ApiClient<FileTokenStorage>, command: Command) -> Result<()> {
    match command {
        Command::Whoami => {
            let dashboard = client.dashboard().await?;
            println!("{}", dashboard.message);
            println!("id: {}  email: {}", dashboard.user.id, dashboard.user.email);
        }
        Command::Items {
            category,
            search,
            max_price,
        } => {
            let filter = ItemFilter {
                category,
                search,
                max_price,
            };
            for listing in client.list_items(&filter).await? {
                println!(
                    "#{:<5} {:<30} {:>10.2}  {} (seller: {})",
                    listing.item.id,
                    listing.item.title,
                    listing.item.price,
                    listing.item.category.as_deref().unwrap_or("-"),
                    listing.seller_name
                );
            }
        }
        Command::Sell {
            title,
            price,
            description,
            category,
        } => {
            let created = client
                .create_item(&NewItem {
                    title,
                    description,
                    price,
                    category,
                })
                .await?;
            println!("{} (id {})", created.message, created.id);
        }
        Command::LostFound { kind } => {
            let kind = match kind.as_deref() {
                None => None,
                Some(raw) => Some(
                    PostKind::parse(raw)
                        .with_context(|| format!("--type must be Lost or Found, got {raw}"))?,
                ),
            };
            for listing in client.lost_found(kind).await? {
                println!(
                    "#{:<5} [{}] {:<30} {} (by {})",
                    listing.post.id,
                    listing.post.kind.as_str(),
                    listing.post.title,
                    listing.post.location.as_deref().unwrap_or("-"),
                    listing.user_name
                );
            }
        }
        Command::Messages => {
            for msg in client.inbox().await? {
                let about = msg
                    .item_title
                    .map(|t| format!(" re: {t}"))
                    .unwrap_or_default();
                println!(
                    "{} from {}{}: {}",
                    msg.message.created_at, msg.sender_name, about, msg.message.content
                );
            }
        }
        Command::Send { to, item, content } => {
            let confirmation = client
                .send_message(&NewMessage {
                    receiver_id: to,
                    item_id: item,
                    content,
                })
                .await?;
            println!("{confirmation}");
        }
        Command::Register { .. } | Command::Login { .. } | Command::Logout => {}
    }

    Ok(())
}
