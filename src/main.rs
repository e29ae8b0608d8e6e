use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use idealista_scout::config::{Config, Secrets, DEFAULT_CONFIG_FILE};
use idealista_scout::loader;
use idealista_scout::scrapers::IdealistaClient;
use idealista_scout::warehouse::PgWarehouse;
use idealista_scout::Pipeline;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// How many rows of the batch to print before loading
const PREVIEW_ROWS: usize = 5;

#[derive(Parser)]
#[command(author, version, about = "Load private-seller Idealista listings into the warehouse")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "SCOUT_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Fetch and print the batch without touching the warehouse
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env may set RUST_LOG, so load it before the filter is built
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let Secrets {
        api_key,
        warehouse_credentials,
    } = Secrets::from_env().context("Missing credentials")?;
    let table = config.warehouse.table_ref();

    info!("🏠 Idealista Scout");
    info!(areas = config.areas.len(), table = %table, "Starting run");

    let client = IdealistaClient::new(&config.api, api_key)?;
    let pipeline = Pipeline::new(client, config.areas.clone(), config.pipeline.clone());

    let batch = pipeline.build_batch(Utc::now()).await;

    for (i, row) in batch.rows.iter().take(PREVIEW_ROWS).enumerate() {
        let record = &row.record;
        println!(
            "{}. {} ({} €)",
            i + 1,
            record.address.as_deref().unwrap_or("-"),
            record.price.map(|p| p.to_string()).unwrap_or_else(|| "-".into())
        );
        println!("   Code: {:?}", record.property_code);
        println!("   Area: {}", record.origin_location_name.as_deref().unwrap_or("-"));
        println!("   URL: {}", record.url.as_deref().unwrap_or("-"));
    }
    info!(rows = batch.len(), "Total number of properties collected (private)");

    if args.dry_run {
        info!("Dry run, skipping warehouse load");
        return Ok(());
    }

    let result = async {
        let warehouse = PgWarehouse::from_credentials_file(&warehouse_credentials).await?;
        let written = loader::load(&batch, &warehouse, &table).await?;
        anyhow::Ok(written)
    }
    .await;

    match result {
        Ok(written) => info!(rows = written, table = %table, "✅ Run finished"),
        Err(e) => error!("An error occurred during warehouse load: {:#}", e),
    }

    Ok(())
}
