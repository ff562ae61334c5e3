use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn};

use valorem::app::build_service;
use valorem::config::Config;
use valorem::domain::investment::{self, DealInputs, UnderwritingSettings};
use valorem::domain::NormalizedAddress;
use valorem::provider::{AvmProvider, DatasetProviderBuilder};
use valorem::store::MemoryStore;

#[derive(Parser)]
#[command(name = "valorem", version, about = "Multi-provider AVM aggregation")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape every configured provider for an address and print the
    /// reconciled analysis.
    Analyze {
        street: String,
        city: String,
        state: String,
        zip: String,
        /// Purchase price; with --purchase set, deal metrics are included.
        #[arg(long)]
        purchase: Option<Decimal>,
        /// Renovation budget for the deal metrics.
        #[arg(long, default_value = "0")]
        reno: Decimal,
        /// Hold period in months for the deal metrics.
        #[arg(long, default_value = "12")]
        hold_months: u32,
    },
    /// Print the stable property identifier for an address.
    Id {
        street: String,
        city: String,
        state: String,
        zip: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;
    config.init_logging();

    match cli.command {
        Command::Analyze {
            street,
            city,
            state,
            zip,
            purchase,
            reno,
            hold_months,
        } => {
            let address = NormalizedAddress::new(street, city, state, zip);
            analyze(&config, &address, purchase, reno, hold_months).await?;
        }
        Command::Id {
            street,
            city,
            state,
            zip,
        } => {
            let address = NormalizedAddress::new(street, city, state, zip);
            println!("{}", address.property_id());
        }
    }

    Ok(())
}

async fn analyze(
    config: &Config,
    address: &NormalizedAddress,
    purchase: Option<Decimal>,
    reno: Decimal,
    hold_months: u32,
) -> anyhow::Result<()> {
    let providers = build_providers(config)?;
    anyhow::ensure!(
        !providers.is_empty(),
        "no scrapeable providers configured; set DATASET_API_TOKEN and dataset ids"
    );
    info!(providers = providers.len(), address = %address, "starting analysis");

    let store = Arc::new(MemoryStore::new());
    let service = build_service(config, providers, store);

    let analysis = service.analyze_property(address).await?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);

    if let Some(purchase) = purchase {
        let inputs = DealInputs {
            purchase,
            reno,
            hold_months,
        };
        let metrics = investment::evaluate(
            &inputs,
            &UnderwritingSettings::default(),
            Decimal::from(analysis.average_estimate),
            analysis.average_rent,
        );
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    }

    Ok(())
}

/// Build one dataset-API provider per enabled source that has a dataset id.
fn build_providers(config: &Config) -> anyhow::Result<Vec<Arc<dyn AvmProvider>>> {
    let Some(token) = config.dataset.api_token.clone() else {
        warn!("DATASET_API_TOKEN not set; no providers can be built");
        return Ok(Vec::new());
    };

    let mut providers: Vec<Arc<dyn AvmProvider>> = Vec::new();
    for name in &config.providers.enabled {
        match config.dataset.datasets.get(name) {
            Some(dataset_id) => {
                let provider = DatasetProviderBuilder::new(name.as_str(), dataset_id, &token)
                    .api_base(&config.dataset.api_base)
                    .poll_interval(std::time::Duration::from_millis(
                        config.dataset.poll_interval_ms,
                    ))
                    .poll_deadline(std::time::Duration::from_millis(
                        config.dataset.poll_deadline_ms,
                    ))
                    .build()?;
                providers.push(Arc::new(provider));
            }
            None => {
                warn!(provider = %name, "no dataset id configured, skipping");
            }
        }
    }
    Ok(providers)
}
