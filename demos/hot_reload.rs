//! Example demonstrating a file-backed store with hot reload.
//!
//! This example shows how to:
//! - Resolve the data source from a configuration address
//! - Read typed values and decode sections into structs
//! - Watch a prefix, and bind a component to the one leaf it cares about
//!
//! Run with: cargo run --example hot_reload
//!
//! The address comes from `HOTSWAP_CONFIG` and defaults to
//! `demos/config/hot_reload.yaml`. While running, edit that file to see reloads.

use hotswap_store::prelude::*;
use serde::Deserialize;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDRESS: &str = "demos/config/hot_reload.yaml";

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    dsn: String,
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Hot Reload Example ===\n");

    let registry = SourceRegistry::with_defaults();
    let address = std::env::var(hotswap_store::sources::ADDRESS_ENV)
        .unwrap_or_else(|_| DEFAULT_ADDRESS.to_string());
    let source = registry.resolve(&address)?;
    let decoder = hotswap_store::formats::for_path(&address)?;

    let store = Store::new();
    let _reload = store.load_from_source(source.clone(), decoder).await?;
    println!("Loaded {} ({} keys)\n", source.name(), store.traverse(".").len());

    println!(
        "Server: {}:{} (read timeout {:?})",
        store.get_string("server.host").unwrap_or_default(),
        store.get_int("server.port").unwrap_or_default(),
        store.get_duration("server.read_timeout"),
    );

    store.watch("server", |store| {
        println!(
            "\n[Event] server section changed, port is now {:?}",
            store.get_int("server.port")
        );
    });

    // Only a DSN change means reconnecting; pool size tweaks do not.
    let databases = BindingSet::<DatabaseConfig>::new(store.clone(), "dsn");
    let default_db = databases.get("dbs.default")?;
    let mut reconnect = default_db.subscribe();

    let db = default_db.get();
    println!("Database: {} (max connections: {})", db.dsn, db.max_connections);

    println!("\n===> Try editing {} to see automatic reloads! <===", address);
    println!("     - Change server.port: 8080 -> 9090");
    println!("     - Change dbs.default.dsn to trigger a reconnect");
    println!("\nPress Ctrl+C to exit\n");

    loop {
        tokio::select! {
            changed = reconnect.changed() => {
                if changed.is_err() {
                    break;
                }
                let db = default_db.get();
                println!("\n[Event] reconnecting default database to {}", db.dsn);
            }
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_secs(5)) => {
                println!(
                    "[Status] version {}, default pool {:?}",
                    store.version(),
                    store.get_int("dbs.default.max_connections"),
                );
            }
        }
    }

    source.close()?;
    Ok(())
}
