pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::account::AccountService;
use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::core::currency::CurrencyCode;
use crate::providers::firebase::{FirebaseAuthProvider, FirestoreProfileStore};
use crate::providers::frankfurter::FrankfurterProvider;
use crate::store::session::SessionStore;
use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Rates {
        base: Option<CurrencyCode>,
        all: bool,
        trading_days: bool,
    },
    History {
        code: CurrencyCode,
        base: Option<CurrencyCode>,
        days: Option<u32>,
    },
    Register {
        email: String,
        first_name: String,
        last_name: String,
        password: Option<String>,
    },
    Login {
        email: String,
        password: Option<String>,
    },
    Logout,
    Whoami,
    Profile {
        first_name: String,
        last_name: String,
    },
    Passwd {
        current_password: Option<String>,
        new_password: Option<String>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Nomisma starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Rates {
            base,
            all,
            trading_days,
        } => {
            let provider = quote_provider(&config)?;
            let base = base.unwrap_or_else(|| config.currency.clone());
            let watchlist: &[CurrencyCode] = if all { &[] } else { &config.watchlist };
            let comparison = if trading_days {
                cli::rates::Comparison::TradingDays
            } else {
                cli::rates::Comparison::PreviousDay
            };
            cli::rates::run(
                &provider,
                &base,
                watchlist,
                comparison,
                Local::now().date_naive(),
            )
            .await
        }
        AppCommand::History { code, base, days } => {
            let provider = quote_provider(&config)?;
            let base = base.unwrap_or_else(|| config.currency.clone());
            cli::history::run(
                &provider,
                &base,
                &code,
                days.unwrap_or(config.history_days),
                Local::now().date_naive(),
            )
            .await
        }
        AppCommand::Logout => {
            let sessions = SessionStore::new(config.default_data_path()?);
            cli::account::logout(&sessions)
        }
        command => run_account_command(command, &config).await,
    }
}

fn quote_provider(config: &AppConfig) -> Result<FrankfurterProvider> {
    let settings = &config.providers.frankfurter;
    let cache = Arc::new(Cache::new(Duration::from_secs(settings.cache_ttl_secs)));
    let provider = FrankfurterProvider::new(
        &settings.base_url,
        Duration::from_secs(settings.timeout_secs),
        cache,
    )?;
    Ok(provider)
}

async fn run_account_command(command: AppCommand, config: &AppConfig) -> Result<()> {
    let firebase = config.firebase()?;
    let identity = FirebaseAuthProvider::new(firebase)?;
    let profiles = FirestoreProfileStore::new(firebase)?;
    let service = AccountService::new(&identity, &profiles);
    let sessions = SessionStore::new(config.default_data_path()?);

    match command {
        AppCommand::Register {
            email,
            first_name,
            last_name,
            password,
        } => cli::account::register(&service, &email, &first_name, &last_name, password).await,
        AppCommand::Login { email, password } => {
            cli::account::login(&service, &sessions, &email, password).await
        }
        AppCommand::Whoami => cli::account::whoami(&service, &sessions).await,
        AppCommand::Profile {
            first_name,
            last_name,
        } => cli::account::update_profile(&service, &sessions, &first_name, &last_name).await,
        AppCommand::Passwd {
            current_password,
            new_password,
        } => {
            cli::account::change_password(&service, &sessions, current_password, new_password)
                .await
        }
        AppCommand::Rates { .. } | AppCommand::History { .. } | AppCommand::Logout => {
            unreachable!("handled by run_command")
        }
    }
}
