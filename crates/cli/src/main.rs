//! Nevyra CLI - shop the Nevyra storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Create an account (the token is remembered under the data directory)
//! nevyra register -e asha@example.com -p "correct horse" -n Asha
//!
//! # Browse and fill the cart
//! nevyra products list --category devices --sort price-low
//! nevyra cart add p3 --quantity 2
//!
//! # Save an address and check out
//! nevyra address add --first-name Asha --last-name Rao --email asha@example.com \
//!     --phone 9876543210 --address "12 MG Road" --city Bengaluru --zip 560001
//! nevyra checkout --method gateway --coupon WELCOME10
//!
//! # Admin dashboard (admin accounts only)
//! nevyra admin analytics
//! ```
//!
//! # Environment Variables
//!
//! See `nevyra_client::config` (`NEVYRA_API_URL`, `NEVYRA_DATA_DIR`, ...).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use url::Url;

use nevyra_client::config::ConfigError;
use nevyra_client::{ClientConfig, ClientError, NevyraClient, OpenError};
use nevyra_core::{AddressId, AddressInput, OrderId, PaymentMethod, ProductId};

mod commands;

#[derive(Parser)]
#[command(name = "nevyra")]
#[command(author, version, about = "Nevyra storefront CLI")]
struct Cli {
    /// API root, overriding `NEVYRA_API_URL`
    #[arg(long, global = true)]
    api_url: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show or update the signed-in profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
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
    /// Manage saved shipping addresses
    Address {
        #[command(subcommand)]
        action: Option<AddressAction>,
    },
    /// Place an order for the cart
    Checkout(CheckoutArgs),
    /// Order history
    Orders {
        #[command(subcommand)]
        action: Option<OrderAction>,
    },
    /// Admin listings
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// One page of products
    List(commands::shop::ListArgs),
    /// Text search
    Search { query: String },
    /// One product
    Show { id: ProductId },
    /// Categories with product counts
    Categories,
}

#[derive(Subcommand)]
enum CartAction {
    /// Priced cart contents
    Show,
    /// Add a product
    Add {
        id: ProductId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a quantity; zero or less removes the product
    Set {
        id: ProductId,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product
    Remove { id: ProductId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    Show,
    Add { id: ProductId },
    Remove { id: ProductId },
    /// Add the product if missing, remove it otherwise
    Toggle { id: ProductId },
}

#[derive(Subcommand)]
enum AddressAction {
    List,
    Add(AddressArgs),
    Update {
        id: AddressId,
        #[command(flatten)]
        address: AddressArgs,
    },
    Delete { id: AddressId },
    /// Make an address the default
    Default { id: AddressId },
}

#[derive(Subcommand)]
enum OrderAction {
    List,
    Show { id: OrderId },
    /// Cancel a pending or confirmed order
    Cancel { id: OrderId },
}

#[derive(Subcommand)]
enum AdminAction {
    Orders,
    Customers,
    Products,
    /// Revenue and order figures
    Analytics,
}

/// Shipping address fields.
#[derive(Args)]
struct AddressArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    /// Street address
    #[arg(long)]
    address: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    zip: String,
}

impl From<AddressArgs> for AddressInput {
    fn from(args: AddressArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
            address: args.address,
            city: args.city,
            zip_code: args.zip,
        }
    }
}

#[derive(Args)]
struct CheckoutArgs {
    /// `gateway` or `cod`
    #[arg(short, long)]
    method: PaymentMethod,
    /// Ship to this saved address instead of the default
    #[arg(short, long)]
    address: Option<AddressId>,
    #[arg(short, long)]
    coupon: Option<String>,
}

/// Errors that end a CLI run.
#[derive(Debug, Error)]
enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not open client: {0}")]
    Open(#[from] OpenError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nevyra_client=info,nevyra=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        if let CliError::Client(err) = &e {
            if let Some(fields) = err.field_errors() {
                for (field, message) in fields.iter() {
                    tracing::error!("{}: {message}", field.label());
                }
            }
            if err.requires_login() {
                tracing::error!("Run `nevyra login` first");
            }
        }
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    let client = NevyraClient::open(config)?;

    match cli.command {
        Commands::Register {
            email,
            password,
            name,
        } => commands::account::register(&client, &email, &password, name.as_deref()).await?,
        Commands::Login { email, password } => {
            commands::account::login(&client, &email, &password).await?;
        }
        Commands::Logout => commands::account::logout(&client)?,
        Commands::Profile { name, phone } => {
            commands::account::profile(&client, name, phone).await?;
        }
        Commands::Products { action } => match action {
            ProductAction::List(args) => commands::shop::list(&client, &args).await?,
            ProductAction::Search { query } => commands::shop::search(&client, &query).await?,
            ProductAction::Show { id } => commands::shop::show(&client, &id).await?,
            ProductAction::Categories => commands::shop::categories(&client).await?,
        },
        Commands::Cart { action } => {
            commands::shop::cart(&client, action.unwrap_or(CartAction::Show)).await?;
        }
        Commands::Wishlist { action } => {
            commands::shop::wishlist(&client, action.unwrap_or(WishlistAction::Show)).await?;
        }
        Commands::Address { action } => {
            commands::checkout::address(&client, action.unwrap_or(AddressAction::List)).await?;
        }
        Commands::Checkout(args) => commands::checkout::checkout(&client, args).await?,
        Commands::Orders { action } => {
            commands::checkout::orders(&client, action.unwrap_or(OrderAction::List)).await?;
        }
        Commands::Admin { action } => commands::admin::run(&client, action).await?,
    }
    Ok(())
}
