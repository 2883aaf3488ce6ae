//! Operational smoke check: sign in, reload everything the cashier UI
//! needs, and print a grouped sales summary. Read-only against the
//! backend; it never creates, edits, or deletes anything.

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lele_krispy_pos::format::format_rupiah;
use lele_krispy_pos::{AppConfig, AppStore};

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lele_krispy_pos=debug"));
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();

    info!("Lele Krispy POS smoke check v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run().await {
        eprintln!("Smoke check failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let username =
        std::env::var("POS_USERNAME").map_err(|_| "POS_USERNAME is not set".to_string())?;
    let password =
        std::env::var("POS_PASSWORD").map_err(|_| "POS_PASSWORD is not set".to_string())?;

    let mut store = AppStore::new(AppConfig::from_env())?;
    store.login(&username, &password).await?;
    store.reload_all().await?;

    println!("Signed in as {}", store.username().unwrap_or("(unknown)"));
    println!(
        "Products: {}   Suppliers: {}   Transactions: {}",
        store.products().len(),
        store.suppliers().len(),
        store.history().len()
    );
    for day in store.grouped_history() {
        println!(
            "  {} - {} ({} sales)",
            day.label,
            format_rupiah(day.subtotal),
            day.transactions.len()
        );
    }
    Ok(())
}
