//! CLI commands

use anyhow::{bail, Context, Result};
use atelier_gateway::{
    export, filter_items, paginate, Dashboard, ListingQuery, VariantMatrix, VideoUpload,
};
use atelier_shared::{token, AtelierConfig, CredentialField, ProfileUpdate};
use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init,

    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,

        /// Password (read from ATELIER_PASSWORD when omitted)
        #[arg(long, env = "ATELIER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the stored session
    Status,

    /// Product catalogue
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Orders and shipping
    Orders {
        #[command(subcommand)]
        command: OrderCommands,
    },

    /// Return requests
    Returns {
        #[command(subcommand)]
        command: ReturnCommands,
    },

    /// Content videos
    Videos {
        #[command(subcommand)]
        command: VideoCommands,
    },

    /// Designer profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

/// Filtering and paging of list output
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Case-insensitive text search
    #[arg(long)]
    search: Option<String>,

    /// Only rows with this status
    #[arg(long)]
    status: Option<String>,

    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long, default_value_t = 10)]
    per_page: usize,
}

impl ListArgs {
    fn query(&self) -> ListingQuery {
        ListingQuery {
            search: self.search.clone(),
            status: self.status.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// List products
    List(ListArgs),

    /// Export products as CSV, one row per variant
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Switch a product between active and inactive
    Toggle { id: String },

    /// Replace a product's variants with every size and colour combination
    Variants {
        id: String,

        /// SKU prefix of the generated variants
        #[arg(long)]
        sku: String,

        /// Size, may be repeated
        #[arg(long = "size", required = true)]
        sizes: Vec<String>,

        /// Colour, may be repeated
        #[arg(long = "color", required = true)]
        colors: Vec<String>,

        #[arg(long)]
        price: f64,

        /// Stock per variant
        #[arg(long, default_value_t = 0)]
        stock: u32,
    },

    /// Import a product spreadsheet
    Import {
        file: PathBuf,

        /// Update existing products instead of creating new ones
        #[arg(long)]
        edit: bool,
    },
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// List orders
    List(ListArgs),

    /// Export orders as CSV
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a shipment for an order
    Ship {
        id: String,

        /// Parcel weight in kilograms
        #[arg(long)]
        weight: f64,

        #[arg(long)]
        carrier: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ReturnCommands {
    /// List return requests
    List(ListArgs),

    /// Approve a return request
    Approve {
        id: String,
        #[arg(long)]
        note: Option<String>,
    },

    /// Reject a return request
    Reject {
        id: String,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum VideoCommands {
    /// List published videos
    List(ListArgs),

    /// Upload and publish a video
    Upload {
        file: PathBuf,

        #[arg(long)]
        title: String,

        #[arg(long)]
        description: Option<String>,

        /// Product to tag, may be repeated
        #[arg(long = "product")]
        products: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show the designer profile
    Show,

    /// Change profile fields
    Update {
        #[arg(long)]
        brand_name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },
}

impl Commands {
    pub async fn execute(self, config: &AtelierConfig) -> Result<()> {
        let store = config
            .credentials
            .open_store()
            .context("Failed to open credential store")?;
        let dashboard = Dashboard::new(config, store)?;

        match self {
            Commands::Init => bail!("init is handled before the configuration is loaded"),
            Commands::Login { email, password } => {
                let data = dashboard.session().login(&email, &password).await?;
                if !data.is_approved {
                    info!("Designer account is awaiting approval");
                }
                print_json(&json!({
                    "userId": data.user_id,
                    "designerId": data.designer_id,
                    "approved": data.is_approved,
                }))
            }
            Commands::Logout => {
                dashboard.session().logout();
                print_json(&json!({ "authenticated": false }))
            }
            Commands::Status => status(&dashboard),
            Commands::Products { command } => command.execute(&dashboard).await,
            Commands::Orders { command } => command.execute(&dashboard).await,
            Commands::Returns { command } => command.execute(&dashboard).await,
            Commands::Videos { command } => command.execute(&dashboard).await,
            Commands::Profile { command } => command.execute(&dashboard).await,
        }
    }
}

fn status(dashboard: &Dashboard) -> Result<()> {
    let credentials = dashboard.session().credentials();
    let expires_at = credentials
        .access_token
        .as_deref()
        .and_then(token::expires_at)
        .map(|at| at.to_rfc3339());

    print_json(&json!({
        "authenticated": dashboard.session().is_authenticated(),
        "userId": credentials.user_id,
        "designerId": credentials.designer_id,
        "accessTokenExpiresAt": expires_at,
        "accessTokenExpired": token::is_expired(credentials.access_token.as_deref()),
        "hasRefreshToken": dashboard.api().store().get(CredentialField::RefreshToken).is_some(),
    }))
}

impl ProductCommands {
    async fn execute(self, dashboard: &Dashboard) -> Result<()> {
        let products = dashboard.products();
        match self {
            ProductCommands::List(args) => {
                let all = products.list().await?;
                let hits = filter_items(&all, &args.query());
                print_json(&paginate(&hits, args.page, args.per_page))
            }
            ProductCommands::Export { output } => {
                let all = products.list().await?;
                write_csv(output.as_deref(), |out| export::write_products_csv(out, &all))
            }
            ProductCommands::Toggle { id } => {
                let product = products.toggle_status(&id).await?;
                info!("Product {} is now {}", product.id, product.status());
                print_json(&product)
            }
            ProductCommands::Variants {
                id,
                sku,
                sizes,
                colors,
                price,
                stock,
            } => {
                if !(price.is_finite() && price >= 0.0) {
                    bail!("Invalid price: {price}");
                }
                let variants = VariantMatrix::new(sku, price)
                    .sizes(sizes)
                    .colors(colors)
                    .stock(stock)
                    .generate();
                if variants.is_empty() {
                    bail!("No variants to create, pass at least one non-blank --size and --color");
                }
                let product = products.replace_variants(&id, &variants).await?;
                info!("Product {} now has {} variants", product.id, variants.len());
                print_json(&product)
            }
            ProductCommands::Import { file, edit } => {
                let (name, bytes) = read_upload(&file).await?;
                let report = if edit {
                    products.bulk_edit(dashboard.uploader(), &name, bytes).await?
                } else {
                    products.bulk_import(dashboard.uploader(), &name, bytes).await?
                };
                print_json(&report)
            }
        }
    }
}

impl OrderCommands {
    async fn execute(self, dashboard: &Dashboard) -> Result<()> {
        let orders = dashboard.orders();
        match self {
            OrderCommands::List(args) => {
                let all = orders.list().await?;
                let hits = filter_items(&all, &args.query());
                print_json(&paginate(&hits, args.page, args.per_page))
            }
            OrderCommands::Export { output } => {
                let all = orders.list().await?;
                write_csv(output.as_deref(), |out| export::write_orders_csv(out, &all))
            }
            OrderCommands::Ship {
                id,
                weight,
                carrier,
            } => print_json(&orders.ship(&id, carrier, weight).await?),
        }
    }
}

impl ReturnCommands {
    async fn execute(self, dashboard: &Dashboard) -> Result<()> {
        let returns = dashboard.returns();
        match self {
            ReturnCommands::List(args) => {
                let all = returns.list().await?;
                let hits = filter_items(&all, &args.query());
                print_json(&paginate(&hits, args.page, args.per_page))
            }
            ReturnCommands::Approve { id, note } => print_json(&returns.approve(&id, note).await?),
            ReturnCommands::Reject { id, note } => print_json(&returns.reject(&id, note).await?),
        }
    }
}

impl VideoCommands {
    async fn execute(self, dashboard: &Dashboard) -> Result<()> {
        let videos = dashboard.videos();
        match self {
            VideoCommands::List(args) => {
                let all = videos.list().await?;
                let hits = filter_items(&all, &args.query());
                print_json(&paginate(&hits, args.page, args.per_page))
            }
            VideoCommands::Upload {
                file,
                title,
                description,
                products,
            } => {
                let (name, bytes) = read_upload(&file).await?;
                let meta = VideoUpload {
                    title,
                    description,
                    product_ids: products,
                };
                print_json(&videos.upload(dashboard.uploader(), &name, bytes, meta).await?)
            }
        }
    }
}

impl ProfileCommands {
    async fn execute(self, dashboard: &Dashboard) -> Result<()> {
        let profile = dashboard.profile();
        match self {
            ProfileCommands::Show => print_json(&profile.get().await?),
            ProfileCommands::Update {
                brand_name,
                bio,
                phone,
                website,
            } => {
                let update = ProfileUpdate {
                    brand_name,
                    bio,
                    phone,
                    logo_url: None,
                    website,
                };
                print_json(&profile.update(&update).await?)
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_csv<F>(output: Option<&Path>, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> atelier_shared::Result<()>,
{
    match output {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write(&mut file)?;
            info!("Wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write(&mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}

async fn read_upload(path: &Path) -> Result<(String, Vec<u8>)> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} is not a file", path.display()))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((name, bytes))
}
