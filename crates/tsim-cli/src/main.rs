//! tsim: the trading-simulator command line.
//!
//! The application surface over the ledger core: accounts, portfolios, the
//! ticker catalog, trades, and reports. Every mutation goes through the
//! same store/engine paths the library tests exercise; this binary only
//! parses input and renders output.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tsim_config::{LoadedConfig, SimConfig};
use tsim_engine::{portfolio_report, refresh_prices, seed_catalog, TradeEngine, TradeRequest, TradeSize};
use tsim_ledger::{Money, Qty, TradeAction};
use tsim_md::{FixedPriceSource, HttpPriceSource, PriceSource};
use tsim_store::{Store, ENV_DB_PATH};

#[derive(Parser)]
#[command(name = "tsim")]
#[command(about = "Trading simulator CLI", long_about = None)]
struct Cli {
    /// Layered YAML config paths in merge order (base -> overrides)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// User accounts
    User {
        #[command(subcommand)]
        cmd: UserCmd,
    },

    /// Cash balance operations
    Account {
        #[command(subcommand)]
        cmd: AccountCmd,
    },

    /// Portfolio management
    Portfolio {
        #[command(subcommand)]
        cmd: PortfolioCmd,
    },

    /// Ticker catalog management
    Catalog {
        #[command(subcommand)]
        cmd: CatalogCmd,
    },

    /// Buy or sell within a portfolio
    Trade {
        #[command(subcommand)]
        cmd: TradeCmd,
    },

    /// Valued positions for a portfolio
    Positions {
        #[arg(long)]
        username: String,
        #[arg(long)]
        portfolio: String,
    },

    /// Totals and cost-basis allocation for a portfolio
    Summary {
        #[arg(long)]
        username: String,
        #[arg(long)]
        portfolio: String,
    },

    /// Transaction history for a portfolio
    History {
        #[arg(long)]
        username: String,
        #[arg(long)]
        portfolio: String,
        /// Inclusive start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Inclusive end date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Current quote (or history) for one symbol
    Quote {
        symbol: String,
        /// Show the close series from this date instead of one quote
        #[arg(long)]
        start: Option<String>,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    /// Connectivity + schema presence
    Status,
    /// Apply schema migrations
    Migrate,
}

#[derive(Subcommand)]
enum UserCmd {
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Check a login credential
    Verify {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Delete the user and everything it owns
    Delete {
        #[arg(long)]
        username: String,
    },
}

#[derive(Subcommand)]
enum AccountCmd {
    Deposit {
        #[arg(long)]
        username: String,
        /// Dollar amount, e.g. 1000 or 49.99
        amount: String,
    },
    Withdraw {
        #[arg(long)]
        username: String,
        amount: String,
    },
    Balance {
        #[arg(long)]
        username: String,
    },
}

#[derive(Subcommand)]
enum PortfolioCmd {
    Create {
        #[arg(long)]
        username: String,
        name: String,
    },
    Delete {
        #[arg(long)]
        username: String,
        name: String,
    },
    List {
        #[arg(long)]
        username: String,
    },
}

#[derive(Subcommand)]
enum CatalogCmd {
    /// Seed tickers from the catalog file, quoting initial prices
    Seed {
        /// Seed at most N symbols (overrides config)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Re-quote every ticker and refresh cached prices
    Refresh,
    /// List the catalog with cached prices
    List,
}

#[derive(Subcommand)]
enum TradeCmd {
    Buy {
        #[arg(long)]
        username: String,
        #[arg(long)]
        portfolio: String,
        symbol: String,
        /// Size in shares, e.g. 10 or 2.5
        #[arg(long, conflicts_with = "dollars")]
        shares: Option<String>,
        /// Size in dollars, converted at the quoted price
        #[arg(long)]
        dollars: Option<String>,
    },
    Sell {
        #[arg(long)]
        username: String,
        #[arg(long)]
        portfolio: String,
        symbol: String,
        #[arg(long, conflicts_with = "dollars")]
        shares: Option<String>,
        #[arg(long)]
        dollars: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // dev-time .env.local bootstrap; absence is fine
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();
    let loaded = load_config(&cli.config_paths)?;
    init_tracing(&loaded.config);
    tracing::debug!(config_hash = %loaded.config_hash, "configuration loaded");

    let store = open_store(&loaded.config).await?;

    match cli.cmd {
        Commands::Db { cmd } => run_db(&store, cmd).await,
        Commands::User { cmd } => run_user(&store, cmd).await,
        Commands::Account { cmd } => run_account(&store, cmd).await,
        Commands::Portfolio { cmd } => run_portfolio(&store, cmd).await,
        Commands::Catalog { cmd } => run_catalog(&store, &loaded.config, cmd).await,
        Commands::Trade { cmd } => run_trade(&store, &loaded.config, cmd).await,
        Commands::Positions { username, portfolio } => {
            run_positions(&store, &loaded.config, &username, &portfolio).await
        }
        Commands::Summary { username, portfolio } => {
            run_summary(&store, &loaded.config, &username, &portfolio).await
        }
        Commands::History {
            username,
            portfolio,
            from,
            to,
        } => run_history(&store, &username, &portfolio, from, to).await,
        Commands::Quote { symbol, start } => {
            run_quote(&store, &loaded.config, &symbol, start).await
        }
    }
}

fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    if paths.is_empty() {
        return Ok(tsim_config::default_config());
    }
    let refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    tsim_config::load_layered_yaml(&refs)
}

fn init_tracing(config: &SimConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.filter.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn open_store(config: &SimConfig) -> Result<Store> {
    let path = std::env::var(ENV_DB_PATH).unwrap_or_else(|_| config.database.path.clone());
    Store::open(&path)
        .await
        .with_context(|| format!("cannot open database at {path}"))
}

/// Build the configured price source. `fixed` serves the cached catalog
/// prices from the store, which makes fully-offline runs possible.
async fn price_source(store: &Store, config: &SimConfig) -> Result<Box<dyn PriceSource>> {
    match config.prices.provider.as_str() {
        "http" => {
            let base_url = config
                .prices
                .base_url
                .as_deref()
                .ok_or_else(|| anyhow!("prices.base_url is required for the http provider"))?;
            let src = HttpPriceSource::new(base_url, config.prices.api_key_env.as_deref())?;
            Ok(Box::new(src))
        }
        "fixed" => {
            let mut src = FixedPriceSource::new();
            for row in store.all_tickers().await? {
                if let Some(price) = row.last_price {
                    src.set_price(&row.symbol, price);
                }
            }
            Ok(Box::new(src))
        }
        other => bail!("unknown price provider '{other}' (expected http or fixed)"),
    }
}

async fn run_db(store: &Store, cmd: DbCmd) -> Result<()> {
    match cmd {
        DbCmd::Status => {
            let st = store.status().await?;
            println!("connectivity: {}", if st.ok { "ok" } else { "FAILED" });
            println!("schema:       {}", if st.has_schema { "present" } else { "missing" });
        }
        DbCmd::Migrate => {
            store.migrate().await?;
            println!("migrations applied");
        }
    }
    Ok(())
}

async fn run_user(store: &Store, cmd: UserCmd) -> Result<()> {
    match cmd {
        UserCmd::Create {
            username,
            password,
            email,
        } => {
            store
                .create_user(&username, &password, email.as_deref())
                .await?;
            println!("user '{username}' created");
        }
        UserCmd::Verify { username, password } => {
            if store.verify_user(&username, &password).await? {
                println!("ok");
            } else {
                bail!("invalid credentials for '{username}'");
            }
        }
        UserCmd::Delete { username } => {
            store.delete_user(&username).await?;
            println!("user '{username}' deleted");
        }
    }
    Ok(())
}

async fn run_account(store: &Store, cmd: AccountCmd) -> Result<()> {
    match cmd {
        AccountCmd::Deposit { username, amount } => {
            let amount = parse_money(&amount)?;
            let balance = store.deposit(&username, amount).await?;
            println!("deposited ${amount}; balance ${balance}");
        }
        AccountCmd::Withdraw { username, amount } => {
            let amount = parse_money(&amount)?;
            let balance = store.withdraw(&username, amount).await?;
            println!("withdrew ${amount}; balance ${balance}");
        }
        AccountCmd::Balance { username } => {
            let balance = store.balance(&username).await?;
            println!("${balance}");
        }
    }
    Ok(())
}

async fn run_portfolio(store: &Store, cmd: PortfolioCmd) -> Result<()> {
    match cmd {
        PortfolioCmd::Create { username, name } => {
            let uid = store.user_id(&username).await?;
            store.create_portfolio(uid, &name).await?;
            println!("portfolio '{name}' created for '{username}'");
        }
        PortfolioCmd::Delete { username, name } => {
            let uid = store.user_id(&username).await?;
            store.delete_portfolio(uid, &name).await?;
            println!("portfolio '{name}' deleted");
        }
        PortfolioCmd::List { username } => {
            let uid = store.user_id(&username).await?;
            for name in store.portfolio_names(uid).await? {
                println!("{name}");
            }
        }
    }
    Ok(())
}

async fn run_catalog(store: &Store, config: &SimConfig, cmd: CatalogCmd) -> Result<()> {
    match cmd {
        CatalogCmd::Seed { limit } => {
            let entries = tsim_md::load_catalog(&config.catalog.path)?;
            let prices = price_source(store, config).await?;
            let limit = limit.or(config.catalog.seed_limit);
            let outcome = seed_catalog(store, prices.as_ref(), &entries, limit).await?;
            println!("seeded {} symbols ({} skipped)", outcome.updated, outcome.skipped);
        }
        CatalogCmd::Refresh => {
            let prices = price_source(store, config).await?;
            let outcome = refresh_prices(store, prices.as_ref()).await?;
            println!("refreshed {} symbols ({} skipped)", outcome.updated, outcome.skipped);
        }
        CatalogCmd::List => {
            for row in store.all_tickers().await? {
                let price = row
                    .last_price
                    .map(|p| format!("${p}"))
                    .unwrap_or_else(|| "-".to_string());
                let name = row.company_name.unwrap_or_default();
                println!("{:<8} {:>12}  {}", row.symbol, price, name);
            }
        }
    }
    Ok(())
}

async fn run_trade(store: &Store, config: &SimConfig, cmd: TradeCmd) -> Result<()> {
    let (action, username, portfolio, symbol, shares, dollars) = match cmd {
        TradeCmd::Buy {
            username,
            portfolio,
            symbol,
            shares,
            dollars,
        } => (TradeAction::Buy, username, portfolio, symbol, shares, dollars),
        TradeCmd::Sell {
            username,
            portfolio,
            symbol,
            shares,
            dollars,
        } => (TradeAction::Sell, username, portfolio, symbol, shares, dollars),
    };

    let size = match (shares, dollars) {
        (Some(s), None) => TradeSize::Shares(
            Qty::parse(&s).map_err(|e| anyhow!("invalid share quantity: {e}"))?,
        ),
        (None, Some(d)) => TradeSize::Cash(parse_money(&d)?),
        _ => bail!("give exactly one of --shares or --dollars"),
    };

    let uid = store.user_id(&username).await?;
    let portfolio_id = store.portfolio_id(uid, &portfolio).await?;
    let prices = price_source(store, config).await?;

    let receipt = TradeEngine::new(store, prices.as_ref())
        .execute(&TradeRequest {
            username,
            portfolio_id,
            symbol: symbol.clone(),
            action,
            size,
        })
        .await?;

    println!(
        "{} {} {} @ ${} (gross ${}); balance ${}",
        receipt.action, receipt.qty, symbol, receipt.price, receipt.gross, receipt.balance_after
    );
    Ok(())
}

async fn run_positions(
    store: &Store,
    config: &SimConfig,
    username: &str,
    portfolio: &str,
) -> Result<()> {
    let uid = store.user_id(username).await?;
    let portfolio_id = store.portfolio_id(uid, portfolio).await?;
    let prices = price_source(store, config).await?;
    let report = portfolio_report(store, prices.as_ref(), portfolio_id).await?;

    if report.rows.is_empty() {
        println!("no positions; buy something from the catalog first");
        return Ok(());
    }

    println!(
        "{:<8} {:>12} {:>12} {:>14} {:>12} {:>14} {:>14}",
        "Ticker", "Qty", "Avg Price", "Cost Basis", "Price", "Value", "P/L"
    );
    for row in &report.rows {
        println!(
            "{:<8} {:>12} {:>12} {:>14} {:>12} {:>14} {:>14}",
            row.symbol,
            row.qty.to_string(),
            format!("${}", row.average_price),
            format!("${}", row.cost_basis),
            format!("${}", row.current_price),
            format!("${}", row.current_value),
            format!("${}", row.profit_loss),
        );
    }
    println!(
        "totals: cost ${}, value ${}, p/l ${}",
        report.totals.total_cost_basis, report.totals.total_value, report.totals.total_profit_loss
    );
    Ok(())
}

async fn run_summary(
    store: &Store,
    config: &SimConfig,
    username: &str,
    portfolio: &str,
) -> Result<()> {
    let uid = store.user_id(username).await?;
    let portfolio_id = store.portfolio_id(uid, portfolio).await?;
    let prices = price_source(store, config).await?;
    let report = portfolio_report(store, prices.as_ref(), portfolio_id).await?;

    println!("cost basis:  ${}", report.totals.total_cost_basis);
    println!("value:       ${}", report.totals.total_value);
    println!("profit/loss: ${}", report.totals.total_profit_loss);
    println!();
    println!("allocation by cost basis:");
    for slice in &report.allocation {
        println!("  {:<8} ${}", slice.label, slice.cost_basis);
    }
    Ok(())
}

async fn run_history(
    store: &Store,
    username: &str,
    portfolio: &str,
    from: Option<String>,
    to: Option<String>,
) -> Result<()> {
    let uid = store.user_id(username).await?;
    let portfolio_id = store.portfolio_id(uid, portfolio).await?;

    let range = match (from, to) {
        (None, None) => None,
        (f, t) => {
            let start = match f {
                Some(d) => day_start(&d)?,
                None => DateTime::<Utc>::MIN_UTC,
            };
            let end = match t {
                Some(d) => day_end(&d)?,
                None => Utc::now(),
            };
            Some((start, end))
        }
    };

    let trades = store.trades(portfolio_id, range).await?;
    if trades.is_empty() {
        println!("no transactions in range");
        return Ok(());
    }
    for t in trades {
        println!(
            "{}  {:<4} {:>12} {:<8} @ ${}",
            t.executed_at.format("%Y-%m-%d %H:%M:%S"),
            t.action,
            t.qty.to_string(),
            t.ticker_symbol,
            t.price
        );
    }
    Ok(())
}

async fn run_quote(
    store: &Store,
    config: &SimConfig,
    symbol: &str,
    start: Option<String>,
) -> Result<()> {
    let prices = price_source(store, config).await?;
    match start {
        None => {
            let price = prices
                .current_price(symbol)
                .await
                .map_err(|e| anyhow!("{e}"))?;
            println!("{symbol}: ${price}");
        }
        Some(date) => {
            let start = day_start(&date)?;
            let points = prices
                .history(symbol, start)
                .await
                .map_err(|e| anyhow!("{e}"))?;
            if points.is_empty() {
                println!("no history for {symbol} since {date}");
            }
            for p in points {
                println!("{}  ${}", p.ts.format("%Y-%m-%d"), p.price);
            }
        }
    }
    Ok(())
}

fn parse_money(s: &str) -> Result<Money> {
    Money::parse(s).map_err(|e| anyhow!("invalid dollar amount: {e}"))
}

fn day_start(date: &str) -> Result<DateTime<Utc>> {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{date}' (expected YYYY-MM-DD)"))?;
    Ok(d.and_hms_opt(0, 0, 0).unwrap().and_utc())
}

fn day_end(date: &str) -> Result<DateTime<Utc>> {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{date}' (expected YYYY-MM-DD)"))?;
    Ok(d.and_hms_opt(23, 59, 59).unwrap().and_utc())
}
