use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use wholesale_invoices::{
    config::{self, AppConfig, database},
    core::{catalog, export, invoice, reconcile, retention},
    errors::{Error, Result},
};

#[derive(Parser)]
#[command(name = "wholesale-invoices")]
#[command(about = "Wholesale invoice bookkeeping with grouped PDF reports")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, short = 'c', default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database tables and seed the catalog from the configuration
    Init,

    /// List invoices, newest first
    Invoices,

    /// Create an invoice
    New {
        /// Invoice date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Add a line item to an invoice
    AddLine {
        /// Invoice id
        invoice: i64,

        /// Vendor name
        #[arg(long)]
        vendor: String,

        /// Item name, vendor-scoped or shared
        #[arg(long)]
        item: String,

        /// Units ordered
        #[arg(long, short = 'q')]
        quantity: String,

        /// Price per unit, a leading $ is accepted
        #[arg(long, short = 'p')]
        price: String,

        /// Free-form note printed in the Info column
        #[arg(long, default_value = "")]
        info: String,
    },

    /// Remove a line item from an invoice
    RemoveLine {
        /// Invoice id
        invoice: i64,

        /// Line item id (see `show --lines`)
        line: i64,

        /// Delete the invoice too when no line items remain
        #[arg(long)]
        drop_empty: bool,
    },

    /// Print an invoice report as text
    Show {
        /// Invoice id
        invoice: i64,

        /// List the raw line items with their ids instead of the grouped report
        #[arg(long)]
        lines: bool,
    },

    /// Export an invoice report as PDF
    Export {
        /// Invoice id
        invoice: i64,

        /// Output file (defaults to the configured directory and file name template)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Delete an invoice and its line items
    Delete {
        /// Invoice id
        invoice: i64,
    },

    /// Delete invoices older than the retention window
    Prune {
        /// Also delete invoices without line items
        #[arg(long)]
        empty: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Env vars can also be set externally
    dotenv().ok();

    let cli = Cli::parse();
    let app_config = config::load_app_configuration(&cli.config)?;

    let database_url = database::get_database_url(app_config.database_url.as_deref());
    database::ensure_database_directory(&database_url)?;
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to open database: {}", e))?;
    database::create_tables(&db).await?;

    run(&db, &app_config, cli.command)
        .await
        .inspect_err(|e| error!("{}", e))
}

async fn run(db: &DatabaseConnection, app_config: &AppConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            let (vendors, items) = catalog::seed_catalog(db, &app_config.catalog).await?;
            println!("Database ready: {vendors} vendors and {items} items added");
        }
        Commands::Invoices => {
            let invoices = invoice::list_invoices(db).await?;
            if invoices.is_empty() {
                println!("No invoices");
            }
            for header in invoices {
                let count = invoice::count_line_items(db, header.id).await?;
                println!("{:>6}  {}  {count} line items", header.id, header.date);
            }
        }
        Commands::New { date } => {
            let header = invoice::create_invoice(db, date.unwrap_or_else(today)).await?;
            println!("Created invoice {} dated {}", header.id, header.date);
        }
        Commands::AddLine {
            invoice: invoice_id,
            vendor,
            item,
            quantity,
            price,
            info,
        } => {
            let fields = line_fields(db, &vendor, &item, &quantity, &price, info).await?;
            let mut working_set = reconcile::WorkingSet::load(db, invoice_id).await?;
            working_set.push_new(fields);
            let outcome = working_set.save(db).await?;
            for id in &outcome.inserted_ids {
                println!("Added line item {id} to invoice {invoice_id}");
            }
        }
        Commands::RemoveLine {
            invoice: invoice_id,
            line,
            drop_empty,
        } => {
            let mut working_set = reconcile::WorkingSet::load(db, invoice_id).await?;
            if !working_set.rows().iter().any(|row| row.id() == Some(line)) {
                return Err(Error::NotFound {
                    entity: "line item",
                    id: line.to_string(),
                });
            }
            working_set.remove_by_id(line);
            let outcome = working_set.save(db).await?;
            println!("Removed line item {line} from invoice {invoice_id}");
            if outcome.invoice_is_empty() {
                if drop_empty {
                    invoice::delete_invoice(db, invoice_id).await?;
                    println!("Invoice {invoice_id} had no line items left and was deleted");
                } else {
                    println!("Invoice {invoice_id} has no line items left");
                }
            }
        }
        Commands::Show {
            invoice: invoice_id,
            lines,
        } => {
            if lines {
                for item in invoice::get_line_items(db, invoice_id).await? {
                    println!(
                        "{:>6}  {:<20} {:<8} {:<24} {:>5} x {:>8}  {}",
                        item.id,
                        item.vendor_name,
                        item.item_code,
                        item.item_name,
                        item.quantity,
                        item.unit_price,
                        item.optional_info
                    );
                }
            } else {
                print!(
                    "{}",
                    export::export_text(db, invoice_id, &app_config.report).await?
                );
            }
        }
        Commands::Export {
            invoice: invoice_id,
            output,
        } => {
            let path =
                export::export_pdf(db, invoice_id, &app_config.report, output.as_deref()).await?;
            println!("Invoice {invoice_id} exported to {}", path.display());
        }
        Commands::Delete {
            invoice: invoice_id,
        } => {
            invoice::delete_invoice(db, invoice_id).await?;
            println!("Deleted invoice {invoice_id}");
        }
        Commands::Prune { empty } => {
            let cutoff = app_config.retention.cutoff(today());
            let pruned = retention::prune_invoices_before(db, cutoff).await?;
            println!("Deleted {pruned} invoices dated before {cutoff}");
            if empty {
                let removed = retention::delete_empty_invoices(db).await?;
                println!("Deleted {removed} empty invoices");
            }
        }
    }
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolves names and parses the editor-style quantity and price text.
async fn line_fields(
    db: &DatabaseConnection,
    vendor: &str,
    item: &str,
    quantity: &str,
    price: &str,
    info: String,
) -> Result<reconcile::LineItemFields> {
    let vendor = catalog::find_vendor_by_name(db, vendor)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "vendor",
            id: vendor.to_string(),
        })?;
    let item = match catalog::find_item_for_vendor(db, vendor.id, item).await? {
        Some(found) => found,
        None => {
            if catalog::find_item_id_by_name(db, item).await?.is_some() {
                warn!("Item '{}' exists but is not sold by {}", item, vendor.name);
            }
            return Err(Error::NotFound {
                entity: "item",
                id: item.to_string(),
            });
        }
    };

    Ok(reconcile::LineItemFields {
        vendor_id: vendor.id,
        item_id: item.id,
        quantity: reconcile::parse_quantity(quantity)?,
        unit_price: reconcile::parse_unit_price(price)?,
        optional_info: info,
    })
}
