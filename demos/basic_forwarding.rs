//! Basic forwarding example
//!
//! Installs a forwarder on an in-process bus, logs a few lines and prints
//! what a collector subscribed to the subject receives.
//!
//! Run with: cargo run --example basic_forwarding

use log_forwarder::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Log Forwarder - Basic Usage Example ===\n");

    let transport = Arc::new(MemoryTransport::new());
    let collector = transport.subscribe("logs.demo");

    let mut logger = Logger::builder().min_level(LogLevel::Debug).build();

    let config = ForwarderConfig::from_json(
        r#"{"subject": "logs.demo", "dimensions": {"env": "dev", "service": "demo"}}"#,
    )?;
    let forwarder = install(&config, transport.clone(), &mut logger)?;

    let seq = AtomicU64::new(1);
    forwarder.add_dynamic_field("seq", move || seq.fetch_add(1, Ordering::Relaxed).to_string());

    logger.debug("Cache warmed");
    logger.info("Server started");
    logger.log_with_fields(
        LogLevel::Warn,
        "Slow request",
        Fields::from([("latency_ms".to_string(), FieldValue::from(1250))]),
    );

    println!("Collected on '{}':", forwarder.subject());
    for message in collector.try_iter() {
        print!("  {}", String::from_utf8_lossy(&message.payload));
    }

    transport.close();
    logger.error("Lost: transport closed");
    println!(
        "\nForwarded: {}, dropped: {}",
        forwarder.metrics().forwarded(),
        forwarder.metrics().dropped_count()
    );

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
