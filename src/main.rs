use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use currency::core::log::init_logging;

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

impl From<Commands> for currency::AppCommand {
    fn from(cmd: Commands) -> currency::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => currency::AppCommand::Convert {
                amount,
                from: from.map(|c| c.to_uppercase()),
                to: to.map(|c| c.to_uppercase()),
            },
            Commands::Rates { base, bitcoin } => currency::AppCommand::Rates {
                base: base.map(|c| c.to_uppercase()),
                bitcoin,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies, BTC included
    Convert {
        /// Amount to convert (defaults to 1)
        amount: Option<f64>,
        /// Currency to convert from (defaults to USD)
        #[arg(short, long)]
        from: Option<String>,
        /// Currency to convert to (defaults to BTC)
        #[arg(short, long)]
        to: Option<String>,
    },
    /// Display the current rates against a base currency
    Rates {
        /// Base currency (defaults to the configured `from` currency)
        #[arg(short, long)]
        base: Option<String>,
        /// Include the bitcoin price in the base currency
        #[arg(long)]
        bitcoin: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => currency::cli::setup::setup(),
        Some(cmd) => currency::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
