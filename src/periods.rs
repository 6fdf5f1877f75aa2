use chrono::{Datelike, Duration, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Named reporting windows, always ending the day before the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Trailing7Days,
    MonthToDate,
    Trailing90Days,
    YearToDate,
}

impl Period {
    /// The four periods every STR run covers, in download order.
    pub const ALL: [Period; 4] = [
        Period::Trailing7Days,
        Period::MonthToDate,
        Period::Trailing90Days,
        Period::YearToDate,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Period::Trailing7Days => "P07D",
            Period::MonthToDate => "MTD",
            Period::Trailing90Days => "P90D",
            Period::YearToDate => "YTD",
        }
    }

    /// Position in report output: longest window first.
    pub fn sort_rank(&self) -> u8 {
        match self {
            Period::YearToDate => 0,
            Period::Trailing90Days => 1,
            Period::MonthToDate => 2,
            Period::Trailing7Days => 3,
        }
    }

    pub fn range(&self, reference: NaiveDate) -> DateRange {
        let to = reference - Duration::days(1);
        let from = match self {
            Period::Trailing7Days => to - Duration::days(6),
            Period::Trailing90Days => to - Duration::days(89),
            Period::MonthToDate => {
                let first = first_of_month(reference);
                if first > to {
                    first_of_month(to)
                } else {
                    first
                }
            }
            Period::YearToDate => {
                let first = first_of_year(reference);
                if first > to {
                    first_of_year(to)
                } else {
                    first
                }
            }
        };
        DateRange { from, to }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown period '{0}' (expected P07D, MTD, P90D or YTD)")]
pub struct UnknownPeriod(pub String);

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p07d" | "trailing-7-days" => Ok(Period::Trailing7Days),
            "mtd" | "month-to-date" => Ok(Period::MonthToDate),
            "p90d" | "trailing-90-days" => Ok(Period::Trailing90Days),
            "ytd" | "year-to-date" => Ok(Period::YearToDate),
            _ => Err(UnknownPeriod(s.to_string())),
        }
    }
}

/// Inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

/// Resolves each requested period against `reference`, keeping input order.
pub fn date_ranges(reference: NaiveDate, periods: &[Period]) -> Vec<(Period, DateRange)> {
    periods.iter().map(|p| (*p, p.range(reference))).collect()
}

fn first_of_month(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

fn first_of_year(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), 1, 1).unwrap_or(d)
}
