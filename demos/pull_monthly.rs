use prism_pull::{ClimateVariable, Coordinates, PrismConfig, PrismSession, Variables, YearMonth};

#[tokio::main]
async fn main() {
    // Logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = PrismConfig::from_env()
        .with_download_dir("./downloads")
        .with_headless(false); // show the window

    let mut session = match PrismSession::new(config).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    println!("=== PRISM monthly values ===");

    let bend = Coordinates::new(44.0582, -121.3153);
    let vars = Variables::default().with(ClimateVariable::MaxTemp);

    match session
        .get_monthly_values(bend, YearMonth::new(2020, 1), YearMonth::new(2024, 6), vars)
        .await
    {
        Ok(path) => println!("Saved CSV to {:?}", path),
        Err(e) => eprintln!("Error: {}", e),
    }

    if let Err(e) = session.close().await {
        eprintln!("Error: {}", e);
    }
}
