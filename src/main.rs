// offer-ledger - command-line client over a local ledger database

use clap::{Parser, Subcommand};
use offer_ledger::identity::{AccountId, Keypair};
use offer_ledger::ledger::{
    Amount, AmountError, EventRecord, Ledger, LedgerConfig, LedgerError, LedgerEvent, Offer, OfferId,
    PaymentPolicy,
};
use offer_ledger::storage::{LedgerStore, StoreError};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid amount '{input}': {source}")]
    Amount { input: String, source: AmountError },

    #[error("no account labelled '{0}'")]
    UnknownAccount(String),

    #[error("an account labelled '{0}' already exists")]
    AccountExists(String),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "offer-ledger", version, about = "List and buy offers on a local marketplace ledger")]
struct Cli {
    /// Directory of the ledger database
    #[arg(long, global = true, default_value = "./offer-ledger-data")]
    data_dir: PathBuf,

    /// Accept overpayment and refund the excess
    #[arg(long, global = true)]
    refund_excess: bool,

    /// Reject offers with an empty description
    #[arg(long, global = true)]
    reject_empty_description: bool,

    /// Reject offers with a zero price
    #[arg(long, global = true)]
    reject_zero_price: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage local account keypairs
    #[command(subcommand)]
    Account(AccountCommand),
    /// Credit funds to an account
    Deposit { label: String, amount: String },
    /// Show an account's balance
    Balance { label: String },
    /// List a new offer
    Create {
        #[arg(long = "as")]
        seller: String,
        description: String,
        price: String,
    },
    /// Buy an offer, attaching a payment
    Buy {
        #[arg(long = "as")]
        buyer: String,
        id: u64,
        payment: String,
    },
    /// Show one offer
    Get { id: u64 },
    /// List offers page by page
    List {
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Number of offers ever created
    Count,
    /// Show the event log
    Events {
        #[arg(long, default_value_t = 0)]
        since: u64,
    },
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Generate and store a new keypair
    New { label: String },
    /// List stored accounts
    List,
    /// Show an account id and public key
    Show { label: String },
}

#[derive(Serialize)]
struct OfferView {
    id: u64,
    seller: String,
    description: String,
    price: String,
    available: bool,
}

impl From<&Offer> for OfferView {
    fn from(offer: &Offer) -> Self {
        Self {
            id: offer.id().value(),
            seller: offer.seller().to_string(),
            description: offer.description().to_string(),
            price: offer.price().to_string(),
            available: offer.is_available(),
        }
    }
}

#[derive(Serialize)]
struct AccountView {
    label: String,
    account: String,
    public_key: String,
}

fn parse_amount(input: &str) -> Result<Amount, CliError> {
    Amount::parse_decimal(input).map_err(|source| CliError::Amount {
        input: input.to_string(),
        source,
    })
}

fn config_from(cli: &Cli) -> LedgerConfig {
    let mut config = LedgerConfig::new();
    if cli.refund_excess {
        config = config.with_payment_policy(PaymentPolicy::RefundExcess);
    }
    if cli.reject_empty_description {
        config = config.reject_empty_descriptions();
    }
    if cli.reject_zero_price {
        config = config.reject_zero_prices();
    }
    config
}

fn describe_event(record: &EventRecord) -> String {
    let detail = match &record.event {
        LedgerEvent::OfferCreated {
            id,
            seller,
            description,
            price,
        } => format!("id={} seller={} price={} description={:?}", id, seller, price, description),
        LedgerEvent::OfferSold {
            id,
            buyer,
            description,
            price,
        } => format!("id={} buyer={} price={} description={:?}", id, buyer, price, description),
        LedgerEvent::FundsDeposited { account, amount } => format!("account={} amount={}", account, amount),
    };
    format!(
        "#{} {} {} {}",
        record.sequence,
        record.timestamp.to_rfc3339(),
        record.event.name(),
        detail
    )
}

fn print_offer(offer: &Offer) {
    println!(
        "#{} {} price={} seller={} description={:?}",
        offer.id(),
        if offer.is_available() { "available" } else { "sold" },
        offer.price(),
        offer.seller(),
        offer.description()
    );
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce()) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text();
    }
    Ok(())
}

fn resolve_account(store: &LedgerStore, label: &str) -> Result<Keypair, CliError> {
    store
        .load_keypair_with_label(label)?
        .ok_or_else(|| CliError::UnknownAccount(label.to_string()))
}

fn run_account(store: &LedgerStore, command: AccountCommand, json: bool) -> Result<(), CliError> {
    let view = |label: &str, keypair: &Keypair| AccountView {
        label: label.to_string(),
        account: keypair.account_id().to_string(),
        public_key: keypair.public_key().to_hex(),
    };

    match command {
        AccountCommand::New { label } => {
            if store.load_keypair_with_label(&label)?.is_some() {
                return Err(CliError::AccountExists(label));
            }
            let keypair = Keypair::generate();
            store.save_keypair_with_label(&keypair, &label)?;
            let account = view(&label, &keypair);
            emit(json, &account, || println!("{} {}", account.label, account.account))
        }
        AccountCommand::List => {
            let mut accounts = Vec::new();
            for label in store.keypair_labels()? {
                let keypair = resolve_account(store, &label)?;
                accounts.push(view(&label, &keypair));
            }
            emit(json, &accounts, || {
                for account in &accounts {
                    println!("{} {}", account.label, account.account);
                }
            })
        }
        AccountCommand::Show { label } => {
            let keypair = resolve_account(store, &label)?;
            let account = view(&label, &keypair);
            emit(json, &account, || {
                println!("label:      {}", account.label);
                println!("account:    {}", account.account);
                println!("public key: {}", account.public_key);
            })
        }
    }
}

fn account_of(accounts: &HashMap<String, AccountId>, label: &str) -> Result<AccountId, CliError> {
    accounts
        .get(label)
        .copied()
        .ok_or_else(|| CliError::UnknownAccount(label.to_string()))
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = config_from(&cli);
    let json = cli.json;
    let store = LedgerStore::open(&cli.data_dir)?;
    debug!(data_dir = %cli.data_dir.display(), "opened ledger store");

    if let Command::Account(command) = cli.command {
        return run_account(&store, command, json);
    }

    // Accounts are resolved before the store moves into the ledger.
    let mut accounts = HashMap::new();
    for label in store.keypair_labels()? {
        let keypair = resolve_account(&store, &label)?;
        accounts.insert(label, keypair.account_id());
    }
    let ledger = Ledger::open(store, config)?;

    match cli.command {
        Command::Account(_) => {}
        Command::Deposit { label, amount } => {
            let account = account_of(&accounts, &label)?;
            let amount = parse_amount(&amount)?;
            let balance = ledger.deposit(&account, amount)?;
            emit(json, &balance.to_string(), || println!("balance: {}", balance))?;
        }
        Command::Balance { label } => {
            let balance = ledger.balance_of(&account_of(&accounts, &label)?);
            emit(json, &balance.to_string(), || println!("{}", balance))?;
        }
        Command::Create {
            seller,
            description,
            price,
        } => {
            let seller = account_of(&accounts, &seller)?;
            let price = parse_amount(&price)?;
            let id = ledger.create_offer(&seller, description, price)?;
            emit(json, &id.value(), || println!("created offer #{}", id))?;
        }
        Command::Buy { buyer, id, payment } => {
            let buyer = account_of(&accounts, &buyer)?;
            let payment = parse_amount(&payment)?;
            let purchase = ledger.buy_offer(&buyer, OfferId::new(id), payment)?;
            emit(json, &purchase, || {
                println!(
                    "bought offer #{} for {} from {}",
                    purchase.offer_id, purchase.price, purchase.seller
                );
                if !purchase.refund.is_zero() {
                    println!("refunded {}", purchase.refund);
                }
            })?;
        }
        Command::Get { id } => {
            let offer = ledger.get_offer(OfferId::new(id))?;
            emit(json, &OfferView::from(&offer), || print_offer(&offer))?;
        }
        Command::List { offset, limit } => {
            let page = ledger.list_offers(offset, limit);
            let views: Vec<OfferView> = page.offers.iter().map(OfferView::from).collect();
            emit(json, &views, || {
                page.offers.iter().for_each(print_offer);
                match page.next_offset {
                    Some(next) => println!(
                        "-- {} of {} offers, next page at --offset {}",
                        views.len(),
                        page.total,
                        next
                    ),
                    None => println!("-- {} offers in total", page.total),
                }
            })?;
        }
        Command::Count => {
            let count = ledger.next_offer_id().value();
            emit(json, &count, || println!("{}", count))?;
        }
        Command::Events { since } => {
            let records = ledger.events_since(since);
            emit(json, &records, || {
                records.iter().for_each(|r| println!("{}", describe_event(r)))
            })?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
