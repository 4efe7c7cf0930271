use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use nomisma::core::currency::CurrencyCode;
use nomisma::core::log::init_logging;

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

impl From<Commands> for nomisma::AppCommand {
    fn from(cmd: Commands) -> nomisma::AppCommand {
        match cmd {
            Commands::Rates { base, all, window } => nomisma::AppCommand::Rates {
                base,
                all,
                trading_days: window,
            },
            Commands::History { code, base, days } => {
                nomisma::AppCommand::History { code, base, days }
            }
            Commands::Register {
                email,
                first_name,
                last_name,
                password,
            } => nomisma::AppCommand::Register {
                email,
                first_name,
                last_name,
                password,
            },
            Commands::Login { email, password } => nomisma::AppCommand::Login { email, password },
            Commands::Logout => nomisma::AppCommand::Logout,
            Commands::Whoami => nomisma::AppCommand::Whoami,
            Commands::Profile {
                first_name,
                last_name,
            } => nomisma::AppCommand::Profile {
                first_name,
                last_name,
            },
            Commands::Passwd {
                current_password,
                new_password,
            } => nomisma::AppCommand::Passwd {
                current_password,
                new_password,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show live exchange rates with buying and sales prices
    Rates {
        /// Base currency, defaults to the configured one
        #[arg(short, long)]
        base: Option<CurrencyCode>,
        /// Show every currency instead of the watchlist
        #[arg(short, long)]
        all: bool,
        /// Compare the two most recent trading days of the past week
        #[arg(short, long)]
        window: bool,
    },
    /// Show the rate history of one currency with market stats
    History {
        /// Currency to look up, e.g. USD
        code: CurrencyCode,
        /// Base currency, defaults to the configured one
        #[arg(short, long)]
        base: Option<CurrencyCode>,
        /// Number of days to cover
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=3650))]
        days: Option<u32>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Prompted for when omitted
        #[arg(long, env = "NOMISMA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long, env = "NOMISMA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Update first and last name
    Profile {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Change the account password
    Passwd {
        /// Prompted for when omitted
        #[arg(long, env = "NOMISMA_CURRENT_PASSWORD", hide_env_values = true)]
        current_password: Option<String>,
        /// Prompted for, with confirmation, when omitted
        #[arg(long, env = "NOMISMA_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => nomisma::cli::setup::setup(),
        Some(cmd) => nomisma::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
