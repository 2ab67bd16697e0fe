//! The PRISM Explorer form, expressed as a list of element interactions.

use chrono::Datelike;

use crate::query::{ClimateVariable, Query, TimePeriod};

pub const SINGLE_URL: &str = "https://prism.oregonstate.edu/explorer/";

pub const LOCATION_COORDS_ID: &str = "loc_method_coords";
pub const LATITUDE_ID: &str = "loc_lat";
pub const LONGITUDE_ID: &str = "loc_lon";
pub const MONTHLY_NORMALS_ID: &str = "tper_monthly_normals";
pub const DAILY_NORMALS_ID: &str = "tper_daily_normals";
pub const SUBMIT_ID: &str = "submit_button";
pub const DOWNLOAD_ID: &str = "download_button";

/// One interaction with an element found by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStep {
    Click(&'static str),
    Fill(&'static str, String),
    Select(&'static str, String),
}

impl FormStep {
    pub fn element_id(&self) -> &'static str {
        match self {
            FormStep::Click(id) | FormStep::Fill(id, _) | FormStep::Select(id, _) => id,
        }
    }
}

fn select(id: &'static str, value: impl ToString) -> FormStep {
    FormStep::Select(id, value.to_string())
}

/// Location fields: switch to coordinate entry and type both values.
pub fn location_steps(query: &Query) -> Vec<FormStep> {
    vec![
        FormStep::Click(LOCATION_COORDS_ID),
        FormStep::Fill(LATITUDE_ID, query.coordinates.latitude.to_string()),
        FormStep::Fill(LONGITUDE_ID, query.coordinates.longitude.to_string()),
    ]
}

/// Period radio followed by the date dropdowns it reveals.
///
/// Years are selected first, then months, then days.
pub fn period_steps(period: &TimePeriod) -> Vec<FormStep> {
    match *period {
        TimePeriod::MonthlyNormals => vec![FormStep::Click(MONTHLY_NORMALS_ID)],
        TimePeriod::DailyNormals => vec![FormStep::Click(DAILY_NORMALS_ID)],
        TimePeriod::Annual {
            start_year,
            end_year,
        } => vec![
            FormStep::Click("tper_yearly"),
            select("tper_yearly_start_year", start_year),
            select("tper_yearly_end_year", end_year),
        ],
        TimePeriod::SingleMonth {
            month,
            start_year,
            end_year,
        } => vec![
            FormStep::Click("tper_onemonth"),
            select("tper_onemonth_start_year", start_year),
            select("tper_onemonth_end_year", end_year),
            select("tper_onemonth_month", month),
        ],
        TimePeriod::Monthly { start, end } => vec![
            FormStep::Click("tper_monthly"),
            select("tper_monthly_start_year", start.year),
            select("tper_monthly_end_year", end.year),
            select("tper_monthly_start_month", start.month),
            select("tper_monthly_end_month", end.month),
        ],
        TimePeriod::Daily { start, end } => vec![
            FormStep::Click("tper_daily"),
            select("tper_daily_start_year", start.year()),
            select("tper_daily_end_year", end.year()),
            select("tper_daily_start_month", start.month()),
            select("tper_daily_end_month", end.month()),
            select("tper_daily_start_day", start.day()),
            select("tper_daily_end_day", end.day()),
        ],
    }
}

/// Checkbox clicks that turn the page's default selection into the requested one.
///
/// Precipitation and mean temperature start ticked, so they are clicked when
/// unwanted; everything else is clicked when wanted.
pub fn variable_steps(query: &Query) -> Vec<FormStep> {
    ClimateVariable::ALL
        .into_iter()
        .filter(|v| v.checked_by_default() != query.variables.contains(*v))
        .map(|v| FormStep::Click(v.form_id()))
        .collect()
}

/// Every step for `query`, ending with submit and download.
pub fn form_steps(query: &Query) -> Vec<FormStep> {
    let mut steps = location_steps(query);
    steps.extend(period_steps(&query.period));
    steps.extend(variable_steps(query));
    steps.push(FormStep::Click(SUBMIT_ID));
    steps.push(FormStep::Click(DOWNLOAD_ID));
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Coordinates, Variables, YearMonth};
    use chrono::NaiveDate;

    fn query(period: TimePeriod, variables: Variables) -> Query {
        Query::new(Coordinates::new(44.0582, -121.3153), period, variables)
    }

    fn ids(steps: &[FormStep]) -> Vec<&'static str> {
        steps.iter().map(FormStep::element_id).collect()
    }

    #[test]
    fn test_location_steps() {
        let q = query(TimePeriod::MonthlyNormals, Variables::default());
        assert_eq!(
            location_steps(&q),
            vec![
                FormStep::Click("loc_method_coords"),
                FormStep::Fill("loc_lat", "44.0582".into()),
                FormStep::Fill("loc_lon", "-121.3153".into()),
            ]
        );
    }

    #[test]
    fn test_normals_only_click_the_radio() {
        assert_eq!(
            period_steps(&TimePeriod::MonthlyNormals),
            vec![FormStep::Click("tper_monthly_normals")]
        );
        assert_eq!(
            period_steps(&TimePeriod::DailyNormals),
            vec![FormStep::Click("tper_daily_normals")]
        );
    }

    #[test]
    fn test_annual_selects_years_only() {
        let steps = period_steps(&TimePeriod::Annual {
            start_year: 2020,
            end_year: 2022,
        });
        assert_eq!(
            steps,
            vec![
                FormStep::Click("tper_yearly"),
                FormStep::Select("tper_yearly_start_year", "2020".into()),
                FormStep::Select("tper_yearly_end_year", "2022".into()),
            ]
        );
    }

    #[test]
    fn test_single_month_selects_one_month() {
        let steps = period_steps(&TimePeriod::SingleMonth {
            month: 6,
            start_year: 2020,
            end_year: 2024,
        });
        assert_eq!(
            ids(&steps),
            vec![
                "tper_onemonth",
                "tper_onemonth_start_year",
                "tper_onemonth_end_year",
                "tper_onemonth_month",
            ]
        );
        assert_eq!(steps[3], FormStep::Select("tper_onemonth_month", "6".into()));
    }

    #[test]
    fn test_monthly_selects_both_months() {
        let steps = period_steps(&TimePeriod::Monthly {
            start: YearMonth::new(2020, 1),
            end: YearMonth::new(2025, 6),
        });
        assert_eq!(
            steps[1..],
            [
                FormStep::Select("tper_monthly_start_year", "2020".into()),
                FormStep::Select("tper_monthly_end_year", "2025".into()),
                FormStep::Select("tper_monthly_start_month", "1".into()),
                FormStep::Select("tper_monthly_end_month", "6".into()),
            ]
        );
    }

    #[test]
    fn test_daily_selects_days_last() {
        let steps = period_steps(&TimePeriod::Daily {
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        });
        assert_eq!(steps.len(), 7);
        assert_eq!(steps[5], FormStep::Select("tper_daily_start_day", "1".into()));
        assert_eq!(steps[6], FormStep::Select("tper_daily_end_day", "31".into()));
    }

    #[test]
    fn test_default_variables_need_no_clicks() {
        let q = query(TimePeriod::MonthlyNormals, Variables::default());
        assert!(variable_steps(&q).is_empty());
    }

    #[test]
    fn test_variable_toggles() {
        let vars = Variables::default()
            .without(ClimateVariable::Precipitation)
            .with(ClimateVariable::MaxVpd);
        let q = query(TimePeriod::DailyNormals, vars);
        assert_eq!(
            variable_steps(&q),
            vec![
                FormStep::Click("cvar_ppt"),
                FormStep::Click("cvar_vpdmax"),
            ]
        );
    }

    #[test]
    fn test_form_ends_with_submit_then_download() {
        let q = query(TimePeriod::MonthlyNormals, Variables::default());
        let steps = form_steps(&q);
        let n = steps.len();
        assert_eq!(steps[n - 2], FormStep::Click("submit_button"));
        assert_eq!(steps[n - 1], FormStep::Click("download_button"));
        assert_eq!(steps[0], FormStep::Click("loc_method_coords"));
    }
}
