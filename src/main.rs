use anyhow::{Context, Result, anyhow};
use cartretry::config::{ClassifierKind, InserterConfig, InserterOverrides};
use cartretry::{
    CartItem, CartService, FlakyWriter, InMemoryCartItemStore, RetryingInserter, WriteError,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "cartretry")]
#[command(about = "Add a cart item with manual retry and exponential backoff")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct PolicyArgs {
    /// JSON file with retry settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    max_attempts: Option<usize>,
    #[arg(long)]
    initial_delay_ms: Option<u64>,
    #[arg(long)]
    multiplier: Option<f64>,
    #[arg(long)]
    max_delay_ms: Option<u64>,
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[arg(long, value_enum)]
    classifier: Option<ClassifierArg>,
}

impl PolicyArgs {
    fn overrides(&self) -> InserterOverrides {
        InserterOverrides {
            max_attempts: self.max_attempts,
            initial_delay_ms: self.initial_delay_ms,
            backoff_multiplier: self.multiplier,
            max_delay_ms: self.max_delay_ms,
            overall_timeout_ms: self.timeout_ms,
            classifier: self.classifier.map(Into::into),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ClassifierArg {
    RetryAll,
    SerializationConflicts,
}

impl From<ClassifierArg> for ClassifierKind {
    fn from(arg: ClassifierArg) -> Self {
        match arg {
            ClassifierArg::RetryAll => ClassifierKind::RetryAll,
            ClassifierArg::SerializationConflicts => ClassifierKind::SerializationConflicts,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Insert one cart item through a writer that fails the first N times
    Demo {
        #[command(flatten)]
        policy: PolicyArgs,
        #[arg(long, default_value_t = 2)]
        fail_times: usize,
        /// SQLSTATE of the injected failure
        #[arg(long, default_value = "40001")]
        sql_state: String,
        #[arg(long, default_value = "sku-42")]
        product: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Print the backoff delays of the effective policy
    Schedule {
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Demo {
            policy,
            fail_times,
            sql_state,
            product,
            quantity,
        } => demo(&policy, fail_times, &sql_state, product, quantity).await,
        Command::Schedule { policy } => schedule(&policy),
    }
}

fn load_config(args: &PolicyArgs) -> Result<InserterConfig> {
    let config = match &args.config {
        Some(path) => InserterConfig::from_file(path).map_err(|e| anyhow!(e))?,
        None => InserterConfig::default(),
    };

    Ok(config.with_overrides(&args.overrides()))
}

async fn demo(
    args: &PolicyArgs,
    fail_times: usize,
    sql_state: &str,
    product: String,
    quantity: u32,
) -> Result<()> {
    let config = load_config(args)?;
    let policy = config.to_policy().map_err(|e| anyhow!(e))?;

    let store = InMemoryCartItemStore::new();
    let writer = FlakyWriter::new(store.clone(), fail_times)
        .with_error(WriteError::sql_with_state("injected failure", sql_state));

    let inserter = RetryingInserter::new(writer, policy)
        .context("Failed to build inserter")?
        .with_classifier(config.classifier);
    let service = CartService::from_inserter(inserter);

    let cart_id = Uuid::new_v4();
    info!(%cart_id, product = %product, quantity, "adding item to cart");

    let item = CartItem::new(cart_id, product, quantity);
    let result = service.add_item_to_cart_until(item, shutdown()).await;
    let calls = service.inserter().writer().calls();

    match result {
        Ok(id) => {
            println!("Inserted cart item {} after {} attempt(s)", id, calls);
            Ok(())
        }
        Err(err) => Err(anyhow!(err).context(format!("Insert failed after {} attempt(s)", calls))),
    }
}

fn schedule(args: &PolicyArgs) -> Result<()> {
    let policy = load_config(args)?.to_policy().map_err(|e| anyhow!(e))?;

    println!("max_attempts: {}", policy.max_attempts);
    for (retry, delay) in policy.schedule().iter().enumerate() {
        println!("before attempt {}: {}ms", retry + 2, delay.as_millis());
    }
    Ok(())
}

async fn shutdown() {
    if tokio::signal::ctrl_c().await.is_err() {
        futures::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
