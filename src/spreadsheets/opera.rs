// spreadsheets/opera.rs
use crate::domain::OperaBooking;
use crate::errors::{Classify, ErrorKind};
use crate::periods::DateRange;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const HEADER_LINES: usize = 2;
const FOOTER_LINES: usize = 2;

const EXCLUDED_MARKET_CODES: [&str; 3] = ["ALC", "ALI", "WHG"];
const EXCLUDED_STATUSES: [&str; 2] = ["CANCELLED", "NO SHOW"];
const EXCLUDED_ROOM_TYPES: [&str; 1] = ["PM"];
const EXCLUDED_RATE_CODES: [&str; 1] = ["SHR"];

#[derive(Debug, thiserror::Error)]
pub enum OperaError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read field mapping {}: {msg}", path.display())]
    Labels { path: PathBuf, msg: String },

    #[error("{}: column '{column}' not found after relabelling", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{}: bad row: {msg}", path.display())]
    Csv { path: PathBuf, msg: String },

    #[error("{}: unparseable arrival date '{value}'", path.display())]
    BadDate { path: PathBuf, value: String },
}

impl Classify for OperaError {
    fn kind(&self) -> ErrorKind {
        match self {
            OperaError::Io { .. } => ErrorKind::Transient,
            _ => ErrorKind::DataShape,
        }
    }
}

/// Opera field code (e.g. `C93`) -> human label, from the mapping workbook.
///
/// The sheet's first row is a title, the second the header; pairs follow in
/// columns A and B.
pub fn load_field_labels(path: &Path, sheet: &str) -> Result<HashMap<String, String>, OperaError> {
    let err = |msg: String| OperaError::Labels {
        path: path.to_path_buf(),
        msg,
    };
    let mut wb = open_workbook_auto(path).map_err(|e| err(e.to_string()))?;
    let range = wb.worksheet_range(sheet).map_err(|e| err(e.to_string()))?;

    let text = |pos: (u32, u32)| -> String {
        match range.get_value(pos) {
            Some(Data::String(s)) => s.trim().to_string(),
            Some(Data::Empty) | None => String::new(),
            Some(other) => other.to_string(),
        }
    };

    let mut labels = HashMap::new();
    let last_row = range.end().map(|(r, _)| r).unwrap_or(0);
    for r in 2..=last_row {
        let (code, name) = (text((r, 0)), text((r, 1)));
        if !code.is_empty() && !name.is_empty() {
            labels.insert(code, name);
        }
    }
    debug!(count = labels.len(), "loaded opera field labels");
    Ok(labels)
}

/// Relabelled, lower-cased, snake-cased column name.
fn column_name(code: &str, labels: &HashMap<String, String>) -> String {
    let label = labels.get(code.trim()).map(String::as_str).unwrap_or(code.trim());
    label.to_lowercase().replace(' ', "_")
}

/// `DD-MON-YY`, always in the 2000s.
pub fn parse_arrival_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() < 3 || !raw.is_char_boundary(raw.len() - 2) {
        return None;
    }
    let (head, yy) = raw.split_at(raw.len() - 2);
    NaiveDate::parse_from_str(&format!("{head}20{yy}"), "%d-%b-%Y").ok()
}

fn excluded(value: &str, list: &[&str]) -> bool {
    list.contains(&value)
}

struct Columns {
    resort: usize,
    confirmation_number: usize,
    email: usize,
    first_name: usize,
    last_name: usize,
    market_code: usize,
    rate_code: usize,
    vip_code: usize,
    arrival_date: usize,
    reservation_status: usize,
    stayed_room_type: usize,
}

impl Columns {
    fn locate(path: &Path, names: &[String]) -> Result<Self, OperaError> {
        let find = |column: &'static str| {
            names
                .iter()
                .position(|n| n == column)
                .ok_or_else(|| OperaError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                })
        };
        Ok(Columns {
            resort: find("resort")?,
            confirmation_number: find("confirmation_number")?,
            email: find("email")?,
            first_name: find("first_name")?,
            last_name: find("last_name")?,
            market_code: find("market_code")?,
            rate_code: find("rate_code")?,
            vip_code: find("vip_code")?,
            arrival_date: find("arrival_date")?,
            reservation_status: find("reservation_status")?,
            stayed_room_type: find("stayed_room_type")?,
        })
    }
}

/// Reads one pipe-delimited Opera export and applies the booking filters.
pub fn read_export(
    path: &Path,
    labels: &HashMap<String, String>,
    range: &DateRange,
) -> Result<Vec<OperaBooking>, OperaError> {
    let content = fs::read_to_string(path).map_err(|source| OperaError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() <= HEADER_LINES + FOOTER_LINES {
        return Ok(Vec::new());
    }
    let body = lines[HEADER_LINES..lines.len() - FOOTER_LINES].join("\n");

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .quoting(false)
        .flexible(true)
        .has_headers(true)
        .from_reader(body.as_bytes());

    let csv_err = |e: csv::Error| OperaError::Csv {
        path: path.to_path_buf(),
        msg: e.to_string(),
    };

    let names: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| column_name(h, labels))
        .collect();
    let cols = Columns::locate(path, &names)?;

    let mut out = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        let field = |i: usize| record.get(i).unwrap_or("").trim();

        if excluded(field(cols.market_code), &EXCLUDED_MARKET_CODES)
            || excluded(field(cols.reservation_status), &EXCLUDED_STATUSES)
            || excluded(field(cols.stayed_room_type), &EXCLUDED_ROOM_TYPES)
            || excluded(field(cols.rate_code), &EXCLUDED_RATE_CODES)
        {
            continue;
        }

        let raw_date = field(cols.arrival_date);
        let arrival_date = parse_arrival_date(raw_date).ok_or_else(|| OperaError::BadDate {
            path: path.to_path_buf(),
            value: raw_date.to_string(),
        })?;
        if !range.contains(arrival_date) {
            continue;
        }

        out.push(OperaBooking {
            resort: field(cols.resort).to_string(),
            confirmation_number: field(cols.confirmation_number).to_string(),
            email: field(cols.email).to_string(),
            first_name: field(cols.first_name).to_string(),
            last_name: field(cols.last_name).to_string(),
            market_code: field(cols.market_code).to_string(),
            rate_code: field(cols.rate_code).to_string(),
            vip_code: field(cols.vip_code).to_string(),
            arrival_date,
        });
    }
    Ok(out)
}

/// `<something>Historical<something>txt`.
fn is_historical_export(name: &str) -> bool {
    match name.find("Historical") {
        Some(i) => i > 0 && name.ends_with("txt") && name.len() > i + "Historical".len() + 3,
        None => false,
    }
}

/// Every historical export in `dir`, filtered, with duplicate confirmation
/// numbers dropped (first file in name order wins).
pub fn read_all_exports(
    dir: &Path,
    labels: &HashMap<String, String>,
    range: &DateRange,
) -> Result<Vec<OperaBooking>, OperaError> {
    let io_err = |source| OperaError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(is_historical_export)
            .unwrap_or(false);
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for f in &files {
        let bookings = read_export(f, labels, range)?;
        info!(file = %f.display(), bookings = bookings.len(), "read opera export");
        out.extend(
            bookings
                .into_iter()
                .filter(|b| seen.insert(b.confirmation_number.clone())),
        );
    }
    Ok(out)
}
