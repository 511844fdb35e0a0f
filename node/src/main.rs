// stakeledger/node/src/main.rs

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use stakeledger_primitives::{Clock, SystemClock, UserId};
use stakeledger_storage::{BalanceAdjustment, FeeDenomination, Wallet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod config;
mod logging;
mod scheduler;
mod services;

use config::{NodeConfig, StorageBackend};
use logging::{init_logging, LogConfig};
use services::Services;

#[derive(Parser)]
#[command(name = "stakeledger")]
#[command(about = "Token valuation and recurring fee processing")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Data directory
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Keep all state in memory for this invocation
    #[arg(long)]
    memory: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current token price
    Valuation,

    /// Inspect or consume the token supply
    Supply {
        #[command(subcommand)]
        command: SupplyCommands,
    },

    /// Manage user wallets
    Wallet {
        #[command(subcommand)]
        command: WalletCommands,
    },

    /// Charge recurring fees
    Fees {
        #[command(subcommand)]
        command: FeeCommands,
    },
}

#[derive(Subcommand)]
enum SupplyCommands {
    /// Show the supply ledger
    Show,

    /// Record a token issuance
    Issue {
        #[arg(long)]
        amount: Decimal,
    },
}

#[derive(Subcommand)]
enum WalletCommands {
    /// Open a wallet with a recurring fee
    Create {
        #[arg(long)]
        user: String,

        /// Fee charged each period
        #[arg(long)]
        fee: Decimal,

        /// Days between charges
        #[arg(long, default_value = "30")]
        period_days: u32,

        /// Fee is denominated in tokens and converted at the current price
        #[arg(long)]
        token: bool,

        /// Opening base balance
        #[arg(long, default_value = "0")]
        deposit: Decimal,
    },

    /// Show one wallet
    Show {
        #[arg(long)]
        user: String,
    },

    /// Credit a balance
    Deposit {
        #[arg(long)]
        user: String,

        #[arg(long)]
        amount: Decimal,

        /// Credit the token balance instead of the base balance
        #[arg(long)]
        token: bool,
    },

    /// Debit a balance
    Withdraw {
        #[arg(long)]
        user: String,

        #[arg(long)]
        amount: Decimal,

        /// Debit the token balance instead of the base balance
        #[arg(long)]
        token: bool,
    },
}

#[derive(Subcommand)]
enum FeeCommands {
    /// Process one user's wallet now
    Process {
        #[arg(long)]
        user: String,
    },

    /// Process every wallet that is due
    RunDue,

    /// Process due wallets periodically until interrupted
    Schedule {
        /// Override the configured interval
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogConfig::from_env().with_verbosity(cli.verbose))?;

    let mut config = NodeConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }
    if cli.memory {
        config.storage.backend = StorageBackend::Memory;
    }
    if let Commands::Fees {
        command: FeeCommands::Schedule {
            interval_secs: Some(secs),
        },
    } = &cli.command
    {
        config.scheduler.interval_secs = *secs;
    }
    config.validate()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let services = Services::build(&config, clock.clone())?;

    let result = match cli.command {
        Commands::Valuation => print_json(&services.valuation.valuation_report().await),
        Commands::Supply { command } => run_supply(&services, command).await,
        Commands::Wallet { command } => run_wallet(&services, clock.as_ref(), command).await,
        Commands::Fees { command } => run_fees(&services, &config, command).await,
    };

    services.flush()?;
    result
}

async fn run_supply(services: &Services, command: SupplyCommands) -> Result<()> {
    let ledger = match command {
        SupplyCommands::Show => services.supply.snapshot().await?,
        SupplyCommands::Issue { amount } => services.supply.issue(amount)?,
    };

    #[derive(Serialize)]
    struct SupplyView {
        total_supply: Decimal,
        consumed_supply: Decimal,
        remaining_supply: Decimal,
    }

    print_json(&SupplyView {
        total_supply: ledger.total_supply,
        consumed_supply: ledger.consumed_supply,
        remaining_supply: ledger.remaining_supply(),
    })
}

async fn run_wallet(services: &Services, clock: &dyn Clock, command: WalletCommands) -> Result<()> {
    let wallet = match command {
        WalletCommands::Create {
            user,
            fee,
            period_days,
            token,
            deposit,
        } => {
            let denomination = if token {
                FeeDenomination::Token
            } else {
                FeeDenomination::Base
            };
            let wallet = Wallet::new(UserId::new(user), fee, period_days, denomination, clock.now())
                .with_balances(deposit, Decimal::ZERO);
            services.wallets.create_wallet(wallet.clone()).await?;
            info!(user_id = %wallet.user_id, due = %wallet.next_fee_due_at, "Wallet created");
            wallet
        }
        WalletCommands::Show { user } => {
            let user_id = UserId::new(user);
            services
                .wallets
                .get_wallet(&user_id)
                .await?
                .with_context(|| format!("Wallet not found: {}", user_id))?
        }
        WalletCommands::Deposit {
            user,
            amount,
            token,
        } => {
            ensure!(amount > Decimal::ZERO, "amount must be positive");
            adjust(services, user, amount, token).await?
        }
        WalletCommands::Withdraw {
            user,
            amount,
            token,
        } => {
            ensure!(amount > Decimal::ZERO, "amount must be positive");
            adjust(services, user, -amount, token).await?
        }
    };

    print_json(&wallet)
}

async fn adjust(services: &Services, user: String, delta: Decimal, token: bool) -> Result<Wallet> {
    let adjustment = if token {
        BalanceAdjustment::token(delta)
    } else {
        BalanceAdjustment::base(delta)
    };
    Ok(services
        .wallets
        .adjust_balances(&UserId::new(user), adjustment)
        .await?)
}

async fn run_fees(services: &Services, config: &NodeConfig, command: FeeCommands) -> Result<()> {
    match command {
        FeeCommands::Process { user } => {
            let outcome = services.processor.process_one(&UserId::new(user)).await?;
            print_json(&outcome)
        }
        FeeCommands::RunDue => {
            let summary = services.processor.process_all_due().await?;
            print_json(&summary)
        }
        FeeCommands::Schedule { .. } => {
            if config.storage.backend == StorageBackend::Memory {
                warn!("Scheduling against in-memory storage; charges are not persisted");
            }

            let shutdown = CancellationToken::new();
            let ctrl_c = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Shutdown requested");
                    ctrl_c.cancel();
                }
            });

            let summaries = scheduler::run_scheduler(
                services.processor.clone(),
                config.scheduler.clone(),
                shutdown,
            )
            .await;
            print_json(&summaries)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
