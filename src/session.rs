//! One browser session against the PRISM Explorer.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate};
use tracing::{info, warn};

use crate::browser::ChromeDriver;
use crate::config::PrismConfig;
use crate::download::{rename_with_prefix, DownloadWatcher};
use crate::error::PrismError;
use crate::form::{form_steps, SINGLE_URL};
use crate::locations::read_locations;
use crate::query::{Coordinates, Query, TimePeriod, Variables, YearMonth};
use crate::traits::FormDriver;
use crate::validate::is_within_past_6_months;

/// Drives the explorer form and collects the CSV each query produces.
///
/// Calls run one at a time against a single page. Every getter returns the
/// path of the downloaded file inside [`PrismConfig::download_dir`].
pub struct PrismSession<D: FormDriver = ChromeDriver> {
    config: PrismConfig,
    driver: D,
}

impl PrismSession<ChromeDriver> {
    /// Launches Chromium with the given settings.
    pub async fn new(config: PrismConfig) -> Result<Self, PrismError> {
        info!("Starting new PRISM session...");
        let driver = ChromeDriver::launch(&config).await?;
        info!("PRISM session initialized.");
        Ok(Self::with_driver(config, driver))
    }
}

impl<D: FormDriver> PrismSession<D> {
    pub fn with_driver(config: PrismConfig, driver: D) -> Self {
        Self { config, driver }
    }

    pub fn config(&self) -> &PrismConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Fills the single-location form for `query`, submits it and waits for the download.
    pub async fn submit_coordinates(&mut self, query: &Query) -> Result<PathBuf, PrismError> {
        let today = Local::now().date_naive();
        query.validate(today.year())?;
        warn_if_provisional(query, today);

        info!(
            "Requesting {} at {}",
            query.period.name(),
            query.coordinates
        );

        std::fs::create_dir_all(&self.config.download_dir)?;
        let watcher = DownloadWatcher::snapshot(&self.config.download_dir)?;

        self.driver.open(SINGLE_URL).await?;
        for step in form_steps(query) {
            self.driver.apply(&step).await?;
        }

        let path = watcher.wait(self.config.download_timeout).await?;
        info!("Saved {:?}", path);
        Ok(path)
    }

    /// Baseline monthly and annual averages over the last three full decades.
    ///
    /// This is the only period that offers cloud transmittance and solar radiation.
    pub async fn get_30_year_monthly_normals(
        &mut self,
        coordinates: Coordinates,
        variables: Variables,
    ) -> Result<PathBuf, PrismError> {
        self.submit_coordinates(&Query::new(
            coordinates,
            TimePeriod::MonthlyNormals,
            variables,
        ))
        .await
    }

    /// Baseline daily averages over the last three full decades.
    pub async fn get_30_year_daily_normals(
        &mut self,
        coordinates: Coordinates,
        variables: Variables,
    ) -> Result<PathBuf, PrismError> {
        self.submit_coordinates(&Query::new(coordinates, TimePeriod::DailyNormals, variables))
            .await
    }

    pub async fn get_annual_values(
        &mut self,
        coordinates: Coordinates,
        start_year: i32,
        end_year: i32,
        variables: Variables,
    ) -> Result<PathBuf, PrismError> {
        let period = TimePeriod::Annual {
            start_year,
            end_year,
        };
        self.submit_coordinates(&Query::new(coordinates, period, variables))
            .await
    }

    /// Values for `month` in every year from `start_year` to `end_year`, inclusive.
    pub async fn get_single_month_values(
        &mut self,
        coordinates: Coordinates,
        month: u32,
        start_year: i32,
        end_year: i32,
        variables: Variables,
    ) -> Result<PathBuf, PrismError> {
        let period = TimePeriod::SingleMonth {
            month,
            start_year,
            end_year,
        };
        self.submit_coordinates(&Query::new(coordinates, period, variables))
            .await
    }

    pub async fn get_monthly_values(
        &mut self,
        coordinates: Coordinates,
        start: YearMonth,
        end: YearMonth,
        variables: Variables,
    ) -> Result<PathBuf, PrismError> {
        let period = TimePeriod::Monthly { start, end };
        self.submit_coordinates(&Query::new(coordinates, period, variables))
            .await
    }

    pub async fn get_daily_values(
        &mut self,
        coordinates: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
        variables: Variables,
    ) -> Result<PathBuf, PrismError> {
        let period = TimePeriod::Daily { start, end };
        self.submit_coordinates(&Query::new(coordinates, period, variables))
            .await
    }

    /// Runs the same period for every row of a location CSV.
    ///
    /// Each download is renamed to `<name>_<original file name>`.
    pub async fn get_values_for_locations(
        &mut self,
        locations_csv: impl AsRef<Path>,
        period: TimePeriod,
        variables: Variables,
    ) -> Result<Vec<PathBuf>, PrismError> {
        let locations = read_locations(locations_csv)?;

        let mut paths = Vec::with_capacity(locations.len());
        for (i, location) in locations.iter().enumerate() {
            info!(
                "Location {}/{}: {}",
                i + 1,
                locations.len(),
                location.name
            );
            let query = Query::new(location.coordinates(), period, variables.clone());
            let path = self.submit_coordinates(&query).await?;
            paths.push(rename_with_prefix(&path, &location.name)?);
        }

        Ok(paths)
    }

    pub async fn close(&mut self) -> Result<(), PrismError> {
        info!("Closing PRISM session...");
        self.driver.close().await?;
        info!("PRISM session closed.");
        Ok(())
    }
}

/// The last requested day, when it falls in the six months before `today`.
///
/// PRISM revises those values, so such downloads contain provisional data.
pub fn provisional_until(query: &Query, today: NaiveDate) -> Option<NaiveDate> {
    query
        .period
        .last_day()
        .filter(|last_day| is_within_past_6_months(*last_day, today))
}

fn warn_if_provisional(query: &Query, today: NaiveDate) {
    if let Some(last_day) = provisional_until(query, today) {
        warn!(
            "Request runs to {}; PRISM values from the last six months are provisional",
            last_day
        );
    }
}
