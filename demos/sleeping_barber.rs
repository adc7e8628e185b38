//! Sleeping barber demo
//!
//! Three barbers, ten seats, clients arriving every 0-200ms and a shop that
//! closes after ten seconds.
//!
//! Run with: RUST_LOG=info cargo run --example sleeping_barber

use service_facility::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== The Sleeping Barber Problem ===\n");

    let config = FacilityConfig::default()
        .with_capacity(10)
        .with_worker_names(["Saha", "Aditya", "Khetan"])
        .with_service_time(DelayRange::fixed(Duration::from_millis(1000)))
        .with_time_open(Duration::from_secs(10));

    let shop = Arc::new(Facility::open(config)?);
    shop.start_arrivals(ArrivalConfig::new(DelayRange::from_millis(0, 200)))?;

    // Block until the shop is closed
    let closer = shop.close_after_time_open()?;
    let report = closer
        .join()
        .map_err(|_| FacilityError::join("closer", "Closer thread panicked"))??;

    println!("\n=== Day Summary ===");
    match report.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("could not render report: {}", e),
    }

    Ok(())
}
