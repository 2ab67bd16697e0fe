//! What to ask the portal for: where, when and which variables.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validate::{
    check_coordinates, check_date_order, check_month, check_year, check_year_order,
    days_in_month,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_coordinates(self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// A data layer the explorer can return. Each maps to one checkbox on the form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ClimateVariable {
    Precipitation,
    MinTemp,
    MeanTemp,
    MaxTemp,
    MinVpd,
    MaxVpd,
    MeanDewpointTemp,
    CloudTransmittance,
    SolarRadHorizSfc,
    SolarRadSlopedSfc,
    SolarRadClearSky,
}

impl ClimateVariable {
    pub const ALL: [ClimateVariable; 11] = [
        ClimateVariable::Precipitation,
        ClimateVariable::MinTemp,
        ClimateVariable::MeanTemp,
        ClimateVariable::MaxTemp,
        ClimateVariable::MinVpd,
        ClimateVariable::MaxVpd,
        ClimateVariable::MeanDewpointTemp,
        ClimateVariable::CloudTransmittance,
        ClimateVariable::SolarRadHorizSfc,
        ClimateVariable::SolarRadSlopedSfc,
        ClimateVariable::SolarRadClearSky,
    ];

    /// PRISM's short code, also the suffix of the checkbox id.
    pub fn code(self) -> &'static str {
        match self {
            ClimateVariable::Precipitation => "ppt",
            ClimateVariable::MinTemp => "tmin",
            ClimateVariable::MeanTemp => "tmean",
            ClimateVariable::MaxTemp => "tmax",
            ClimateVariable::MinVpd => "vpdmin",
            ClimateVariable::MaxVpd => "vpdmax",
            ClimateVariable::MeanDewpointTemp => "tdmean",
            ClimateVariable::CloudTransmittance => "soltrans",
            ClimateVariable::SolarRadHorizSfc => "soltotal",
            ClimateVariable::SolarRadSlopedSfc => "solslope",
            ClimateVariable::SolarRadClearSky => "solclear",
        }
    }

    pub fn form_id(self) -> &'static str {
        match self {
            ClimateVariable::Precipitation => "cvar_ppt",
            ClimateVariable::MinTemp => "cvar_tmin",
            ClimateVariable::MeanTemp => "cvar_tmean",
            ClimateVariable::MaxTemp => "cvar_tmax",
            ClimateVariable::MinVpd => "cvar_vpdmin",
            ClimateVariable::MaxVpd => "cvar_vpdmax",
            ClimateVariable::MeanDewpointTemp => "cvar_tdmean",
            ClimateVariable::CloudTransmittance => "cvar_soltrans",
            ClimateVariable::SolarRadHorizSfc => "cvar_soltotal",
            ClimateVariable::SolarRadSlopedSfc => "cvar_solslope",
            ClimateVariable::SolarRadClearSky => "cvar_solclear",
        }
    }

    /// The explorer loads with these boxes already ticked.
    pub fn checked_by_default(self) -> bool {
        matches!(
            self,
            ClimateVariable::Precipitation | ClimateVariable::MeanTemp
        )
    }

    /// Cloud and solar layers only exist as 30-year monthly normals.
    pub fn normals_only(self) -> bool {
        matches!(
            self,
            ClimateVariable::CloudTransmittance
                | ClimateVariable::SolarRadHorizSfc
                | ClimateVariable::SolarRadSlopedSfc
                | ClimateVariable::SolarRadClearSky
        )
    }
}

impl fmt::Display for ClimateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ClimateVariable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        ClimateVariable::ALL
            .into_iter()
            .find(|v| v.code() == s)
            .ok_or_else(|| {
                let codes: Vec<_> = ClimateVariable::ALL.iter().map(|v| v.code()).collect();
                format!("unknown variable '{}', expected one of: {}", s, codes.join(", "))
            })
    }
}

/// The set of variables to request. Defaults to precipitation and mean temperature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variables(BTreeSet<ClimateVariable>);

impl Default for Variables {
    fn default() -> Self {
        ClimateVariable::ALL
            .into_iter()
            .filter(|v| v.checked_by_default())
            .collect()
    }
}

impl Variables {
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn with(mut self, variable: ClimateVariable) -> Self {
        self.0.insert(variable);
        self
    }

    pub fn without(mut self, variable: ClimateVariable) -> Self {
        self.0.remove(&variable);
        self
    }

    pub fn contains(&self, variable: ClimateVariable) -> bool {
        self.0.contains(&variable)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ClimateVariable> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<ClimateVariable> for Variables {
    fn from_iter<I: IntoIterator<Item = ClimateVariable>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }
}

/// Parses `YYYY-MM`.
impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))?;
        let year = year
            .parse()
            .map_err(|_| format!("bad year in '{}'", s))?;
        let month = month
            .parse()
            .map_err(|_| format!("bad month in '{}'", s))?;
        Ok(Self { year, month })
    }
}

/// Which time series the explorer should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePeriod {
    /// 30-year normals, one value per month plus the annual value.
    MonthlyNormals,
    /// 30-year normals, one value per day of the year.
    DailyNormals,
    Annual {
        start_year: i32,
        end_year: i32,
    },
    /// The same month in every year of the range.
    SingleMonth {
        month: u32,
        start_year: i32,
        end_year: i32,
    },
    Monthly {
        start: YearMonth,
        end: YearMonth,
    },
    Daily {
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl TimePeriod {
    pub fn name(&self) -> &'static str {
        match self {
            TimePeriod::MonthlyNormals => "30-year monthly normals",
            TimePeriod::DailyNormals => "30-year daily normals",
            TimePeriod::Annual { .. } => "annual values",
            TimePeriod::SingleMonth { .. } => "single month values",
            TimePeriod::Monthly { .. } => "monthly values",
            TimePeriod::Daily { .. } => "daily values",
        }
    }

    pub fn is_normals(&self) -> bool {
        matches!(self, TimePeriod::MonthlyNormals | TimePeriod::DailyNormals)
    }

    pub fn validate(&self, present_year: i32) -> Result<(), ValidationError> {
        match *self {
            TimePeriod::MonthlyNormals | TimePeriod::DailyNormals => Ok(()),
            TimePeriod::Annual {
                start_year,
                end_year,
            } => {
                check_year(start_year, present_year)?;
                check_year(end_year, present_year)?;
                check_year_order(start_year, end_year)
            }
            TimePeriod::SingleMonth {
                month,
                start_year,
                end_year,
            } => {
                check_month(month)?;
                check_year(start_year, present_year)?;
                check_year(end_year, present_year)?;
                check_year_order(start_year, end_year)
            }
            TimePeriod::Monthly { start, end } => {
                check_month(start.month)?;
                check_month(end.month)?;
                check_year(start.year, present_year)?;
                check_year(end.year, present_year)?;
                check_date_order((start.year, start.month, 1), (end.year, end.month, 1))
            }
            TimePeriod::Daily { start, end } => {
                check_year(start.year(), present_year)?;
                check_year(end.year(), present_year)?;
                check_date_order(
                    (start.year(), start.month(), start.day()),
                    (end.year(), end.month(), end.day()),
                )
            }
        }
    }

    /// Last day the period covers. `None` for normals.
    pub fn last_day(&self) -> Option<NaiveDate> {
        let end_of_month = |year: i32, month: u32| {
            NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
        };
        match *self {
            TimePeriod::MonthlyNormals | TimePeriod::DailyNormals => None,
            TimePeriod::Annual { end_year, .. } => NaiveDate::from_ymd_opt(end_year, 12, 31),
            TimePeriod::SingleMonth {
                month, end_year, ..
            } => end_of_month(end_year, month),
            TimePeriod::Monthly { end, .. } => end_of_month(end.year, end.month),
            TimePeriod::Daily { end, .. } => Some(end),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub coordinates: Coordinates,
    pub period: TimePeriod,
    pub variables: Variables,
}

impl Query {
    pub fn new(coordinates: Coordinates, period: TimePeriod, variables: Variables) -> Self {
        Self {
            coordinates,
            period,
            variables,
        }
    }

    pub fn validate(&self, present_year: i32) -> Result<(), ValidationError> {
        self.coordinates.validate()?;
        self.period.validate(present_year)?;

        if self.variables.is_empty() {
            return Err(ValidationError::NoVariables);
        }
        if self.period != TimePeriod::MonthlyNormals {
            if let Some(v) = self.variables.iter().find(|v| v.normals_only()) {
                return Err(ValidationError::NormalsOnly(v.code()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bend() -> Coordinates {
        Coordinates::new(44.0582, -121.3153)
    }

    #[test]
    fn test_default_variables() {
        let vars = Variables::default();
        assert!(vars.contains(ClimateVariable::Precipitation));
        assert!(vars.contains(ClimateVariable::MeanTemp));
        assert_eq!(vars.iter().count(), 2);
    }

    #[test]
    fn test_variable_codes_parse() {
        for v in ClimateVariable::ALL {
            assert_eq!(v.code().parse::<ClimateVariable>(), Ok(v));
            assert!(v.form_id().ends_with(v.code()));
        }
        assert!("snow".parse::<ClimateVariable>().is_err());
        assert_eq!("TMAX".parse::<ClimateVariable>(), Ok(ClimateVariable::MaxTemp));
    }

    #[test]
    fn test_year_month_from_str() {
        assert_eq!("2020-06".parse::<YearMonth>(), Ok(YearMonth::new(2020, 6)));
        assert!("2020".parse::<YearMonth>().is_err());
        assert!("2020-xx".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_period_validation() {
        let annual = TimePeriod::Annual {
            start_year: 2022,
            end_year: 2020,
        };
        assert_eq!(annual.validate(2025), Err(ValidationError::YearOrder));

        let single = TimePeriod::SingleMonth {
            month: 13,
            start_year: 2020,
            end_year: 2024,
        };
        assert_eq!(single.validate(2025), Err(ValidationError::Month(13)));

        let monthly = TimePeriod::Monthly {
            start: YearMonth::new(2020, 6),
            end: YearMonth::new(2020, 1),
        };
        assert_eq!(monthly.validate(2025), Err(ValidationError::MonthOrder));

        let daily = TimePeriod::Daily {
            start: NaiveDate::from_ymd_opt(1890, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        };
        assert!(matches!(
            daily.validate(2025),
            Err(ValidationError::Year { year: 1890, .. })
        ));

        assert!(TimePeriod::MonthlyNormals.validate(2025).is_ok());
    }

    #[test]
    fn test_last_day() {
        assert_eq!(TimePeriod::DailyNormals.last_day(), None);
        let single = TimePeriod::SingleMonth {
            month: 2,
            start_year: 2020,
            end_year: 2024,
        };
        assert_eq!(single.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29));
        let monthly = TimePeriod::Monthly {
            start: YearMonth::new(2020, 1),
            end: YearMonth::new(2021, 6),
        };
        assert_eq!(monthly.last_day(), NaiveDate::from_ymd_opt(2021, 6, 30));
    }

    #[test]
    fn test_query_rejects_solar_outside_monthly_normals() {
        let vars = Variables::default().with(ClimateVariable::SolarRadClearSky);

        let normals = Query::new(bend(), TimePeriod::MonthlyNormals, vars.clone());
        assert!(normals.validate(2025).is_ok());

        let daily_normals = Query::new(bend(), TimePeriod::DailyNormals, vars);
        assert_eq!(
            daily_normals.validate(2025),
            Err(ValidationError::NormalsOnly("solclear"))
        );
    }

    #[test]
    fn test_query_rejects_empty_variables() {
        let query = Query::new(bend(), TimePeriod::DailyNormals, Variables::empty());
        assert_eq!(query.validate(2025), Err(ValidationError::NoVariables));
    }

    #[test]
    fn test_query_rejects_bad_coordinates() {
        let query = Query::new(
            Coordinates::new(120.0, 0.0),
            TimePeriod::MonthlyNormals,
            Variables::default(),
        );
        assert!(matches!(
            query.validate(2025),
            Err(ValidationError::Latitude(_))
        ));
    }
}
