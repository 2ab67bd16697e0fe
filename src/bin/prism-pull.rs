use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use chrono::NaiveDate;
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use prism_pull::{
    ClimateVariable, Coordinates, PrismConfig, PrismError, PrismSession, Query, TimePeriod,
    Variables, YearMonth,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "prism-pull")]
#[command(author, version, about = "Download PRISM climate data through the PRISM Explorer", long_about = None)]
struct Cli {
    /// Directory the browser saves downloads into (default: current directory)
    #[arg(short, long, global = true)]
    download_dir: Option<PathBuf>,

    /// Seconds to wait for each form element (default: PRISM_DRIVER_WAIT or 5)
    #[arg(short, long, global = true)]
    wait: Option<u64>,

    /// Seconds to wait for each download to finish (default: 30)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show the browser window
    #[arg(long, global = true)]
    no_headless: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Point {
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    lon: f64,
}

#[derive(Args, Debug)]
struct VarArgs {
    /// Variable code (ppt, tmin, tmean, tmax, vpdmin, vpdmax, tdmean, soltrans,
    /// soltotal, solslope, solclear). Repeatable; defaults to ppt and tmean.
    #[arg(long = "var", value_parser = clap::value_parser!(ClimateVariable))]
    vars: Vec<ClimateVariable>,
}

impl VarArgs {
    fn variables(&self) -> Variables {
        if self.vars.is_empty() {
            Variables::default()
        } else {
            self.vars.iter().copied().collect()
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PeriodKind {
    MonthlyNormals,
    DailyNormals,
    Annual,
    SingleMonth,
    Monthly,
    Daily,
}

impl PeriodKind {
    fn name(self) -> String {
        self.to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default()
    }

    fn flags(self) -> &'static [&'static str] {
        match self {
            PeriodKind::MonthlyNormals | PeriodKind::DailyNormals => &[],
            PeriodKind::Annual => &["--start-year", "--end-year"],
            PeriodKind::SingleMonth => &["--month", "--start-year", "--end-year"],
            PeriodKind::Monthly | PeriodKind::Daily => &["--start", "--end"],
        }
    }
}

/// Period options of the `locations` subcommand.
#[derive(Args, Debug)]
struct PeriodArgs {
    /// Period to request for every location
    #[arg(long, value_enum, default_value_t = PeriodKind::MonthlyNormals)]
    period: PeriodKind,

    #[arg(long)]
    start_year: Option<i32>,

    #[arg(long)]
    end_year: Option<i32>,

    /// Month for --period single-month
    #[arg(long)]
    month: Option<u32>,

    /// YYYY-MM for --period monthly, YYYY-MM-DD for --period daily
    #[arg(long)]
    start: Option<String>,

    /// YYYY-MM for --period monthly, YYYY-MM-DD for --period daily
    #[arg(long)]
    end: Option<String>,
}

fn required<T: Clone>(value: &Option<T>, flag: &str, kind: PeriodKind) -> Result<T, String> {
    value
        .clone()
        .ok_or_else(|| format!("--period {} needs {}", kind.name(), flag))
}

impl PeriodArgs {
    fn time_period(&self) -> Result<TimePeriod, String> {
        let kind = self.period;
        let given = [
            ("--start-year", self.start_year.is_some()),
            ("--end-year", self.end_year.is_some()),
            ("--month", self.month.is_some()),
            ("--start", self.start.is_some()),
            ("--end", self.end.is_some()),
        ];
        if let Some((flag, _)) = given
            .iter()
            .find(|(flag, set)| *set && !kind.flags().contains(flag))
        {
            return Err(format!("{} does not apply to --period {}", flag, kind.name()));
        }

        let period = match kind {
            PeriodKind::MonthlyNormals => TimePeriod::MonthlyNormals,
            PeriodKind::DailyNormals => TimePeriod::DailyNormals,
            PeriodKind::Annual => TimePeriod::Annual {
                start_year: required(&self.start_year, "--start-year", kind)?,
                end_year: required(&self.end_year, "--end-year", kind)?,
            },
            PeriodKind::SingleMonth => TimePeriod::SingleMonth {
                month: required(&self.month, "--month", kind)?,
                start_year: required(&self.start_year, "--start-year", kind)?,
                end_year: required(&self.end_year, "--end-year", kind)?,
            },
            PeriodKind::Monthly => TimePeriod::Monthly {
                start: required(&self.start, "--start", kind)?.parse()?,
                end: required(&self.end, "--end", kind)?.parse()?,
            },
            PeriodKind::Daily => {
                let date = |s: String| {
                    s.parse::<NaiveDate>()
                        .map_err(|e| format!("'{}' is not a YYYY-MM-DD date: {}", s, e))
                };
                TimePeriod::Daily {
                    start: date(required(&self.start, "--start", kind)?)?,
                    end: date(required(&self.end, "--end", kind)?)?,
                }
            }
        };
        Ok(period)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 30-year monthly normals
    MonthlyNormals {
        #[command(flatten)]
        point: Point,
        #[command(flatten)]
        vars: VarArgs,
    },
    /// 30-year daily normals
    DailyNormals {
        #[command(flatten)]
        point: Point,
        #[command(flatten)]
        vars: VarArgs,
    },
    /// Annual values for a range of years
    Annual {
        #[command(flatten)]
        point: Point,
        #[arg(long)]
        start_year: i32,
        #[arg(long)]
        end_year: i32,
        #[command(flatten)]
        vars: VarArgs,
    },
    /// One month across a range of years
    SingleMonth {
        #[command(flatten)]
        point: Point,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        start_year: i32,
        #[arg(long)]
        end_year: i32,
        #[command(flatten)]
        vars: VarArgs,
    },
    /// Monthly values, --start/--end as YYYY-MM
    Monthly {
        #[command(flatten)]
        point: Point,
        #[arg(long)]
        start: YearMonth,
        #[arg(long)]
        end: YearMonth,
        #[command(flatten)]
        vars: VarArgs,
    },
    /// Daily values, --start/--end as YYYY-MM-DD
    Daily {
        #[command(flatten)]
        point: Point,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[command(flatten)]
        vars: VarArgs,
    },
    /// One period for every row of a lat,lon,name CSV
    Locations {
        csv: PathBuf,
        #[command(flatten)]
        period: PeriodArgs,
        #[command(flatten)]
        vars: VarArgs,
    },
}

/// What to download, resolved from the command line before the browser starts.
#[derive(Debug, PartialEq)]
enum Request {
    Single(Query),
    Locations {
        csv: PathBuf,
        period: TimePeriod,
        variables: Variables,
    },
}

impl Command {
    fn into_request(self) -> Result<Request, String> {
        let single = |point: Point, period, vars: VarArgs| {
            Request::Single(Query::new(
                Coordinates::new(point.lat, point.lon),
                period,
                vars.variables(),
            ))
        };

        let request = match self {
            Command::MonthlyNormals { point, vars } => {
                single(point, TimePeriod::MonthlyNormals, vars)
            }
            Command::DailyNormals { point, vars } => single(point, TimePeriod::DailyNormals, vars),
            Command::Annual {
                point,
                start_year,
                end_year,
                vars,
            } => single(
                point,
                TimePeriod::Annual {
                    start_year,
                    end_year,
                },
                vars,
            ),
            Command::SingleMonth {
                point,
                month,
                start_year,
                end_year,
                vars,
            } => single(
                point,
                TimePeriod::SingleMonth {
                    month,
                    start_year,
                    end_year,
                },
                vars,
            ),
            Command::Monthly {
                point,
                start,
                end,
                vars,
            } => single(point, TimePeriod::Monthly { start, end }, vars),
            Command::Daily {
                point,
                start,
                end,
                vars,
            } => single(point, TimePeriod::Daily { start, end }, vars),
            Command::Locations { csv, period, vars } => Request::Locations {
                csv,
                period: period.time_period()?,
                variables: vars.variables(),
            },
        };
        Ok(request)
    }
}

#[derive(Serialize)]
struct Downloaded {
    path: PathBuf,
    bytes: u64,
}

impl Cli {
    /// Command-line flags layered over `base`. Flags that weren't given leave it alone.
    fn apply(&self, base: PrismConfig) -> PrismConfig {
        let mut config = base;
        if let Some(wait) = self.wait {
            config = config.with_driver_wait(Duration::from_secs(wait));
        }
        if let Some(timeout) = self.timeout {
            config = config.with_download_timeout(Duration::from_secs(timeout));
        }
        if let Some(dir) = &self.download_dir {
            config = config.with_download_dir(dir);
        }
        if self.no_headless {
            config = config.with_headless(false);
        }
        config
    }
}

async fn run(session: &mut PrismSession, request: Request) -> Result<Vec<PathBuf>, PrismError> {
    match request {
        Request::Single(query) => Ok(vec![session.submit_coordinates(&query).await?]),
        Request::Locations {
            csv,
            period,
            variables,
        } => {
            session
                .get_values_for_locations(csv, period, variables)
                .await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.apply(PrismConfig::from_env());
    let request = match cli.command.into_request() {
        Ok(request) => request,
        Err(msg) => Cli::command().error(ErrorKind::ArgumentConflict, msg).exit(),
    };

    let mut session = match PrismSession::new(config).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = run(&mut session, request).await;
    if let Err(e) = session.close().await {
        eprintln!("warning: {}", e);
    }

    match outcome {
        Ok(paths) => {
            let downloaded: Vec<Downloaded> = paths
                .into_iter()
                .map(|path| {
                    let bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                    Downloaded { path, bytes }
                })
                .collect();
            match serde_json::to_string_pretty(&downloaded) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("error: {}", e),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("prism-pull").chain(args.iter().copied())).unwrap()
    }

    fn locations_period(args: &[&str]) -> Result<TimePeriod, String> {
        match parse(args).command.into_request()? {
            Request::Locations { period, .. } => Ok(period),
            other => panic!("expected a locations request, got {:?}", other),
        }
    }

    #[test]
    fn test_single_location_request() {
        let cli = parse(&[
            "annual", "--lat", "44.0582", "--lon", "-121.3153", "--start-year", "2020",
            "--end-year", "2022", "--var", "tmax",
        ]);
        assert_eq!(
            cli.command.into_request().unwrap(),
            Request::Single(Query::new(
                Coordinates::new(44.0582, -121.3153),
                TimePeriod::Annual {
                    start_year: 2020,
                    end_year: 2022,
                },
                Variables::empty().with(ClimateVariable::MaxTemp),
            ))
        );
    }

    #[test]
    fn test_locations_default_to_monthly_normals() {
        assert_eq!(
            locations_period(&["locations", "pts.csv"]),
            Ok(TimePeriod::MonthlyNormals)
        );
    }

    #[test]
    fn test_locations_with_annual_period() {
        let cli = parse(&[
            "locations", "pts.csv", "--period", "annual", "--start-year", "2020", "--end-year",
            "2022",
        ]);
        assert_eq!(
            cli.command.into_request().unwrap(),
            Request::Locations {
                csv: PathBuf::from("pts.csv"),
                period: TimePeriod::Annual {
                    start_year: 2020,
                    end_year: 2022,
                },
                variables: Variables::default(),
            }
        );
    }

    #[test]
    fn test_locations_with_dated_periods() {
        assert_eq!(
            locations_period(&[
                "locations", "pts.csv", "--period", "single-month", "--month", "6",
                "--start-year", "2020", "--end-year", "2024",
            ]),
            Ok(TimePeriod::SingleMonth {
                month: 6,
                start_year: 2020,
                end_year: 2024,
            })
        );
        assert_eq!(
            locations_period(&[
                "locations", "pts.csv", "--period", "monthly", "--start", "2020-01", "--end",
                "2021-06",
            ]),
            Ok(TimePeriod::Monthly {
                start: YearMonth::new(2020, 1),
                end: YearMonth::new(2021, 6),
            })
        );
        assert_eq!(
            locations_period(&[
                "locations", "pts.csv", "--period", "daily", "--start", "2020-01-01", "--end",
                "2020-12-31",
            ]),
            Ok(TimePeriod::Daily {
                start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
            })
        );
    }

    #[test]
    fn test_locations_period_errors() {
        let err = locations_period(&[
            "locations", "pts.csv", "--period", "annual", "--start-year", "2020",
        ])
        .unwrap_err();
        assert_eq!(err, "--period annual needs --end-year");

        let err = locations_period(&["locations", "pts.csv", "--start-year", "2020"]).unwrap_err();
        assert_eq!(err, "--start-year does not apply to --period monthly-normals");

        let err = locations_period(&[
            "locations", "pts.csv", "--period", "daily", "--start", "2020-02-30", "--end",
            "2020-03-01",
        ])
        .unwrap_err();
        assert!(err.contains("2020-02-30"));
    }

    #[test]
    fn test_flags_keep_base_config_when_absent() {
        let base = PrismConfig::new()
            .with_driver_wait(Duration::from_secs(12))
            .with_download_timeout(Duration::from_secs(90));

        let config = parse(&["monthly-normals", "--lat", "44", "--lon", "-121"]).apply(base.clone());
        assert_eq!(config.driver_wait, Duration::from_secs(12));
        assert_eq!(config.download_timeout, Duration::from_secs(90));
        assert!(config.headless);
    }

    #[test]
    fn test_flags_override_base_config() {
        let config = parse(&[
            "monthly-normals", "--lat", "44", "--lon", "-121", "--wait", "3", "--timeout", "10",
            "--no-headless", "-d", "out",
        ])
        .apply(PrismConfig::new().with_driver_wait(Duration::from_secs(12)));
        assert_eq!(config.driver_wait, Duration::from_secs(3));
        assert_eq!(config.download_timeout, Duration::from_secs(10));
        assert!(!config.headless);
        assert_eq!(config.download_dir, PathBuf::from("out"));
    }
}
