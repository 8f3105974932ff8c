use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use folio::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for folio::AppCommand {
    fn from(cmd: Commands) -> folio::AppCommand {
        match cmd {
            Commands::Create { name } => folio::AppCommand::Create { name },
            Commands::Delete { name } => folio::AppCommand::Delete { name },
            Commands::Portfolios => folio::AppCommand::Portfolios,
            Commands::Buy {
                portfolio,
                symbol,
                quantity,
                date,
            } => folio::AppCommand::Buy {
                portfolio,
                symbol,
                quantity,
                date,
            },
            Commands::Sell {
                portfolio,
                symbol,
                date,
                price,
            } => folio::AppCommand::Sell {
                portfolio,
                symbol,
                date,
                price,
            },
            Commands::View { portfolio } => folio::AppCommand::View { portfolio },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Create a new portfolio
    Create { name: String },
    /// Delete a portfolio and all of its shares
    Delete { name: String },
    /// List portfolios
    Portfolios,
    /// Record a share purchase (priced at the nearest trading day)
    Buy {
        portfolio: String,
        symbol: String,
        /// Whole number of shares
        quantity: u32,
        /// Purchase date, YYYY-MM-DD
        date: NaiveDate,
    },
    /// Remove recorded shares by symbol, purchase date and price
    Sell {
        portfolio: String,
        symbol: String,
        /// Purchase date, YYYY-MM-DD
        date: NaiveDate,
        /// Purchase price reported at buy time
        price: f64,
    },
    /// Display portfolio gain/loss
    View { portfolio: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => folio::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = folio::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
provider:
  base_url: "https://cloud.iexapis.com/v1"
  # token: "sk_..."   # or set FOLIO_API_TOKEN
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
