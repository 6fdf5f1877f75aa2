use crate::periods::Period;
use chrono::NaiveDate;
use std::fmt;

pub const METRIC_COUNT: usize = 18;

/// Canonical metric order shared by every report variant.
pub const METRIC_COLUMNS: [&str; METRIC_COUNT] = [
    "occ",
    "occ_comp",
    "occ_chng_pct",
    "occ_comp_chng_pct",
    "occ_mpi",
    "occ_rank",
    "adr",
    "adr_comp",
    "adr_chng_pct",
    "adr_comp_chng_pct",
    "adr_ari",
    "adr_rank",
    "revpar",
    "revpar_comp",
    "revpar_chng_pct",
    "revpar_comp_chng_pct",
    "revpar_rgi",
    "revpar_rank",
];

/// Either a property code from the mapping table or one of the aggregates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HotelCode {
    Property(String),
    All,
    AllUpscale,
    AllUpperUpscale,
}

impl HotelCode {
    pub fn as_str(&self) -> &str {
        match self {
            HotelCode::Property(code) => code,
            HotelCode::All => "ALL",
            HotelCode::AllUpscale => "ALL_UPSC",
            HotelCode::AllUpperUpscale => "ALL_UPPER_UPSC",
        }
    }
}

impl fmt::Display for HotelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The "Period" line of one STR report, aligned to `METRIC_COLUMNS`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRow {
    pub hotel_code: HotelCode,
    pub period: Period,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub metrics: [Option<f64>; METRIC_COUNT],
}

impl PropertyRow {
    pub fn metric(&self, name: &str) -> Option<f64> {
        METRIC_COLUMNS
            .iter()
            .position(|c| *c == name)
            .and_then(|i| self.metrics[i])
    }

    /// Report ordering: hotel code text, then YTD, P90D, MTD, P07D.
    pub fn sort_batch(rows: &mut [PropertyRow]) {
        rows.sort_by(|a, b| {
            a.hotel_code
                .as_str()
                .cmp(b.hotel_code.as_str())
                .then(a.period.sort_rank().cmp(&b.period.sort_rank()))
        });
    }
}
