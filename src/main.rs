use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use storefront_payments::application::authorization::AuthorizationGate;
use storefront_payments::application::events::{EventDispatcher, EventKind};
use storefront_payments::application::service::{PaymentService, SendPaymentRequest};
use storefront_payments::domain::cart::ShoppingCart;
use storefront_payments::domain::ports::{
    CartStore, CartStoreBox, OrderStore, OrderStoreBox, PaymentGatewayBox, PaymentStore,
    PaymentStoreBox, UserStore, UserStoreBox,
};
use storefront_payments::domain::user::User;
use storefront_payments::error::Error;
use storefront_payments::infrastructure::in_memory::InMemoryStore;
use storefront_payments::interfaces::csv::report::PaymentReportWriter;
use storefront_payments::interfaces::events::reader::{EventReader, InboundEvent};
use storefront_payments::interfaces::gateway::client::{GatewayConfig, HttpGateway};
use storefront_payments::interfaces::gateway::sandbox::SandboxGateway;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input JSON-lines event stream (users, carts, payment requests,
    /// gateway callbacks, order toggles)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Base URL of the payment gateway. Without it the in-process sandbox
    /// gateway is used.
    #[arg(long)]
    gateway_url: Option<String>,

    /// API key sent as X-API-Key.
    #[arg(long, default_value = "")]
    api_key: String,

    /// Send X-SANDBOX: 1 so the provider runs transactions in its test
    /// environment.
    #[arg(long)]
    sandbox: bool,

    /// Gateway call timeout in seconds.
    #[arg(long, default_value_t = 30)]
    gateway_timeout: u64,
}

/// One boxed handle per port; with the in-memory and RocksDB stores a
/// clone shares the underlying state, so every box sees the same records.
struct Stores {
    gate_users: UserStoreBox,
    users: UserStoreBox,
    carts: CartStoreBox,
    seed_carts: CartStoreBox,
    payments: PaymentStoreBox,
    orders: OrderStoreBox,
    report_orders: OrderStoreBox,
}

fn stores_from<S>(store: S) -> Stores
where
    S: UserStore + CartStore + PaymentStore + OrderStore + Clone + 'static,
{
    Stores {
        gate_users: Box::new(store.clone()),
        users: Box::new(store.clone()),
        carts: Box::new(store.clone()),
        seed_carts: Box::new(store.clone()),
        payments: Box::new(store.clone()),
        orders: Box::new(store.clone()),
        report_orders: Box::new(store),
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_persistent(path: &Path) -> Result<Stores> {
    use storefront_payments::infrastructure::rocksdb::RocksDbStore;
    Ok(stores_from(RocksDbStore::open(path).into_diagnostic()?))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_persistent(_path: &Path) -> Result<Stores> {
    miette::bail!("--db-path requires a build with the storage-rocksdb feature")
}

async fn apply_event(
    service: &PaymentService,
    users: &UserStoreBox,
    carts: &CartStoreBox,
    orders: &OrderStoreBox,
    event: InboundEvent,
) -> storefront_payments::error::Result<()> {
    match event {
        InboundEvent::User { username, role } => users.store(User::new(username, role)).await,
        InboundEvent::Cart { id, owner, items } => {
            carts.store(ShoppingCart { id, owner, items }).await
        }
        InboundEvent::PaymentRequest {
            order_id,
            amount,
            cart_id,
            requested_by,
            description,
            payer_name,
            payer_phone,
            payer_email,
            callback_url,
        } => {
            let link = service
                .send_payment_request(SendPaymentRequest {
                    order_id,
                    amount,
                    description,
                    cart_id,
                    requested_by,
                    payer_name,
                    payer_phone,
                    payer_email,
                    callback_url,
                })
                .await?;
            tracing::info!(%link, "redirect link issued");
            Ok(())
        }
        InboundEvent::Callback { payload } => {
            let paid = service.payment_outcome_validation(&payload).await?;
            tracing::info!(transaction_id = %payload.id, paid, "callback processed");
            Ok(())
        }
        InboundEvent::ToggleSent {
            transaction_id,
            requested_by,
        } => {
            // Replay streams reference gateway transaction ids; resolve to
            // the materialized order.
            let order = orders
                .get_all()
                .await?
                .into_iter()
                .find(|order| order.transaction_id == transaction_id)
                .ok_or_else(|| Error::NotFound(format!("order for transaction {transaction_id}")))?;
            service.toggle_order_to_sent(order.id, &requested_by).await?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the CSV report.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let stores = match &cli.db_path {
        Some(path) => open_persistent(path)?,
        None => stores_from(InMemoryStore::new()),
    };

    let gateway: PaymentGatewayBox = match &cli.gateway_url {
        Some(url) => Box::new(
            HttpGateway::new(GatewayConfig {
                base_url: url.clone(),
                api_key: cli.api_key.clone(),
                sandbox: cli.sandbox,
                timeout: Duration::from_secs(cli.gateway_timeout),
            })
            .into_diagnostic()?,
        ),
        None => Box::new(SandboxGateway::new()),
    };

    let mut dispatcher = EventDispatcher::new();
    for kind in [
        EventKind::PaymentConfirmed,
        EventKind::PaymentRejected,
        EventKind::OrderPlaced,
        EventKind::OrderSent,
    ] {
        dispatcher.register(kind, |event| {
            tracing::info!(?event, "domain event");
            Ok(())
        });
    }

    let service = PaymentService::new(
        AuthorizationGate::new(stores.gate_users),
        gateway,
        stores.payments,
        stores.carts,
        stores.orders,
        Arc::new(dispatcher),
        Duration::from_secs(cli.gateway_timeout),
    );

    let file = File::open(&cli.input).into_diagnostic()?;
    for event in EventReader::new(file).events() {
        match event {
            Ok(event) => {
                if let Err(e) =
                    apply_event(&service, &stores.users, &stores.seed_carts, &stores.report_orders, event)
                        .await
                {
                    eprintln!("Error processing event: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading event: {e}");
            }
        }
    }

    let payments = match service.get_payments().await {
        Ok(payments) => payments,
        Err(Error::EmptyResult) => Vec::new(),
        Err(e) => return Err(e).into_diagnostic(),
    };
    let orders = stores.report_orders.get_all().await.into_diagnostic()?;

    let stdout = io::stdout();
    PaymentReportWriter::new(stdout.lock())
        .write_report(&payments, &orders)
        .into_diagnostic()?;

    Ok(())
}
