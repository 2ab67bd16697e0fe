use thiserror::Error;

/// Input rejected before any browser interaction happens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Month must be between 1 and 12.")]
    Month(u32),

    #[error("Day must be between 1 and {max} for {month}/{year}.")]
    Day {
        day: u32,
        month: u32,
        year: i32,
        max: u32,
    },

    #[error("Year must be between {min} and {max}.")]
    Year { year: i32, min: i32, max: i32 },

    #[error("Latitude must be between -90 and 90, got {0}.")]
    Latitude(f64),

    #[error("Longitude must be between -180 and 180, got {0}.")]
    Longitude(f64),

    #[error("Start year must be less than or equal to end year.")]
    YearOrder,

    #[error("Start month must be less than or equal to end month when years are equal.")]
    MonthOrder,

    #[error("Start day must be less than or equal to end day when months and years are equal.")]
    DayOrder,

    #[error("At least one climate variable must be selected.")]
    NoVariables,

    #[error("{0} is only available for 30-year monthly normals.")]
    NormalsOnly(&'static str),

    #[error("Location row {row}: {reason}")]
    LocationRow { row: usize, reason: String },

    #[error("Location file is empty.")]
    NoLocations,
}

#[derive(Error, Debug)]
pub enum PrismError {
    #[error("Browser initialization failed: {0}")]
    BrowserInit(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("JavaScript evaluation failed: {0}")]
    JavaScript(String),

    #[error("File I/O error: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}
