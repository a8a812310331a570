mod extract;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricefuse")]
#[command(about = "Extract title, prices and image from product pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the extraction pipeline against one or more product URLs
    Extract {
        #[arg(required = true)]
        urls: Vec<String>,
        /// Pretty-print the JSON output
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Normalize raw price strings and report the inferred currency
    Normalize {
        #[arg(required = true)]
        raw: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { urls, pretty } => {
            let config = pricefuse_core::load_app_config()?;
            let env_filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();

            let records = extract::run_extract(&config, urls).await?;
            let rendered = if pretty {
                serde_json::to_string_pretty(&records)?
            } else {
                serde_json::to_string(&records)?
            };
            println!("{rendered}");
        }
        Commands::Normalize { raw } => {
            println!("{}", serde_json::to_string_pretty(&extract::normalize_all(&raw))?);
        }
    }

    Ok(())
}
