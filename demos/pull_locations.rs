use prism_pull::{PrismConfig, PrismSession, TimePeriod, Variables};

#[tokio::main]
async fn main() {
    // Logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // e.g. PRISM_LOCATIONS=./points.csv (lat,lon,name rows)
    let csv_path = std::env::var("PRISM_LOCATIONS")
        .expect("PRISM_LOCATIONS environment variable not set");

    let config = PrismConfig::from_env().with_download_dir("./downloads");
    let mut session = PrismSession::new(config)
        .await
        .expect("Failed to launch browser");

    println!("=== PRISM annual values per location ===\n");

    let period = TimePeriod::Annual {
        start_year: 2020,
        end_year: 2022,
    };

    match session
        .get_values_for_locations(&csv_path, period, Variables::default())
        .await
    {
        Ok(paths) => {
            for path in paths {
                println!("✓ {:?}", path);
            }
        }
        Err(e) => eprintln!("✗ Error: {}", e),
    }

    session.close().await.expect("Failed to close browser");
    println!("\n=== Done ===");
}
