//! PRISM climate data puller
//!
//! Drives the PRISM Explorer form (<https://prism.oregonstate.edu/explorer/>)
//! in a headless Chromium and lets the browser save the resulting CSV.
//!
//! # Example
//!
//! ```rust,ignore
//! use prism_pull::{Coordinates, PrismConfig, PrismSession, Variables, YearMonth};
//! use prism_pull::ClimateVariable;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), prism_pull::PrismError> {
//!     let config = PrismConfig::new().with_download_dir("./downloads");
//!     let mut session = PrismSession::new(config).await?;
//!
//!     let bend = Coordinates::new(44.0582, -121.3153);
//!     let vars = Variables::default().with(ClimateVariable::MaxTemp);
//!     let path = session
//!         .get_monthly_values(bend, YearMonth::new(2020, 1), YearMonth::new(2024, 6), vars)
//!         .await?;
//!     println!("CSV downloaded: {:?}", path);
//!
//!     session.close().await
//! }
//! ```
//!
//! # tower Service example
//!
//! ```rust,ignore
//! use prism_pull::{Coordinates, PrismRequest, PrismService, TimePeriod};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = PrismService::new();
//!     let request = PrismRequest::new(Coordinates::new(44.0582, -121.3153), TimePeriod::DailyNormals)
//!         .with_download_dir("./downloads");
//!
//!     let result = service.call(request).await.unwrap();
//!     println!("{} bytes", result.content.len());
//! }
//! ```

pub mod browser;
pub mod config;
pub mod download;
pub mod error;
pub mod form;
pub mod locations;
pub mod query;
pub mod service;
pub mod session;
pub mod traits;
pub mod validate;

// Re-exports
pub use browser::ChromeDriver;
pub use config::PrismConfig;
pub use error::{PrismError, ValidationError};
pub use locations::Location;
pub use query::{ClimateVariable, Coordinates, Query, TimePeriod, Variables, YearMonth};
pub use service::{PrismRequest, PrismResult, PrismService};
pub use session::PrismSession;
pub use traits::FormDriver;
