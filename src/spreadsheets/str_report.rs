// spreadsheets/str_report.rs
use crate::domain::{HotelCode, PropertyRow, Segment, METRIC_COUNT};
use crate::errors::{Classify, ErrorKind};
use crate::periods::Period;
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Row 2, column B: "Hotel Name #123456" (one `#` per property).
const PROPERTY_LABEL: (u32, u32) = (1, 1);
/// Row 3, column B: industry segment label on aggregate files.
const SEGMENT_LABEL: (u32, u32) = (2, 1);
/// Row 7 holds the column headers of the data region.
const HEADER_ROW: u32 = 6;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("cannot open workbook {}: {msg}", path.display())]
    Open { path: PathBuf, msg: String },

    #[error("no STR property id in label '{0}'")]
    MissingPropertyId(String),

    #[error("STR id {0} has no hotel_code mapping")]
    UnmappedProperty(String),

    #[error("header row has no 'Date' column")]
    MissingDateColumn,

    #[error("no 'Period' row in the data region")]
    MissingPeriodRow,

    #[error("non-numeric value '{0}' in the Period row")]
    NonNumeric(String),

    #[error("{variant} report should have {expected} values, found {found}")]
    ColumnCount {
        variant: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<NormalizeError>,
    },

    #[error("cannot list {}: {source}", dir.display())]
    ListDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Classify for NormalizeError {
    fn kind(&self) -> ErrorKind {
        match self {
            NormalizeError::File { source, .. } => source.kind(),
            NormalizeError::ListDir { .. } => ErrorKind::Transient,
            _ => ErrorKind::DataShape,
        }
    }
}

/// Layout of an STR STAR export, decided from its header cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportVariant {
    SingleProperty { str_id: String },
    Portfolio,
    IndustrySegment(Segment),
}

impl ReportVariant {
    /// Canonical positions this variant does not carry.
    pub fn missing_columns(&self) -> &'static [usize] {
        match self {
            ReportVariant::SingleProperty { .. } => &[],
            // occ_rank, adr_rank, revpar_rank
            ReportVariant::Portfolio => &[5, 11, 17],
            // the index and rank pair of each metric
            ReportVariant::IndustrySegment(_) => &[4, 5, 10, 11, 16, 17],
        }
    }

    pub fn value_count(&self) -> usize {
        METRIC_COUNT - self.missing_columns().len()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportVariant::SingleProperty { .. } => "single-property",
            ReportVariant::Portfolio => "portfolio",
            ReportVariant::IndustrySegment(_) => "industry-segment",
        }
    }

    /// Aligns the non-blank Period values onto the 18 canonical columns.
    pub fn align(&self, values: &[f64]) -> Result<[Option<f64>; METRIC_COUNT], NormalizeError> {
        if values.len() != self.value_count() {
            return Err(NormalizeError::ColumnCount {
                variant: self.name(),
                expected: self.value_count(),
                found: values.len(),
            });
        }

        let missing = self.missing_columns();
        let mut it = values.iter();
        let mut out = [None; METRIC_COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            if !missing.contains(&i) {
                *slot = it.next().copied();
            }
        }
        Ok(out)
    }
}

/// The two label cells that identify a report.
#[derive(Debug, Clone, Default)]
pub struct HeaderCells {
    pub property_label: String,
    pub segment_label: String,
}

pub fn classify(cells: &HeaderCells) -> Result<ReportVariant, NormalizeError> {
    let label = cells.property_label.as_str();

    if label.matches('#').count() > 1 {
        return Ok(match Segment::from_report_label(&cells.segment_label) {
            Some(segment) => ReportVariant::IndustrySegment(segment),
            None => ReportVariant::Portfolio,
        });
    }

    let str_id: String = label
        .split_once('#')
        .map(|(_, rest)| rest.chars().take_while(char::is_ascii_digit).collect())
        .unwrap_or_default();

    if str_id.is_empty() {
        return Err(NormalizeError::MissingPropertyId(label.to_string()));
    }
    Ok(ReportVariant::SingleProperty { str_id })
}

fn cell_text(range: &Range<Data>, pos: (u32, u32)) -> String {
    match range.get_value(pos) {
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn cell_number(cell: &Data) -> Result<Option<f64>, NormalizeError> {
    match cell {
        Data::Float(f) => Ok(Some(*f)),
        Data::Int(i) => Ok(Some(*i as f64)),
        Data::Empty | Data::Error(_) => Ok(None),
        Data::String(s) if s.trim().is_empty() => Ok(None),
        Data::String(s) => s
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .map(Some)
            .map_err(|_| NormalizeError::NonNumeric(s.clone())),
        other => Err(NormalizeError::NonNumeric(other.to_string())),
    }
}

/// Non-blank values of the row whose `Date` cell reads `Period`.
fn period_values(range: &Range<Data>) -> Result<Vec<f64>, NormalizeError> {
    let (last_row, last_col) = range.end().ok_or(NormalizeError::MissingDateColumn)?;

    let date_col = (0..=last_col)
        .find(|c| cell_text(range, (HEADER_ROW, *c)) == "Date")
        .ok_or(NormalizeError::MissingDateColumn)?;

    let row = ((HEADER_ROW + 1)..=last_row)
        .find(|r| cell_text(range, (*r, date_col)) == "Period")
        .ok_or(NormalizeError::MissingPeriodRow)?;

    let mut values = Vec::new();
    for c in (0..=last_col).filter(|c| *c != date_col) {
        if let Some(cell) = range.get_value((row, c)) {
            if let Some(v) = cell_number(cell)? {
                values.push(v);
            }
        }
    }
    Ok(values)
}

fn open_first_sheet(path: &Path) -> Result<Range<Data>, NormalizeError> {
    let open_err = |msg: String| NormalizeError::Open {
        path: path.to_path_buf(),
        msg,
    };
    let mut wb = open_workbook_auto(path).map_err(|e| open_err(e.to_string()))?;
    wb.worksheet_range_at(0)
        .ok_or_else(|| open_err("workbook has no sheets".into()))?
        .map_err(|e| open_err(e.to_string()))
}

/// Reads one STR export into a canonical row. `str_ids` maps STR property
/// ids to hotel codes; the dates and period are stamped on as given.
pub fn parse(
    path: &Path,
    date_from: NaiveDate,
    date_to: NaiveDate,
    period: Period,
    str_ids: &HashMap<String, String>,
) -> Result<PropertyRow, NormalizeError> {
    let range = open_first_sheet(path)?;

    let inner = || -> Result<PropertyRow, NormalizeError> {
        let cells = HeaderCells {
            property_label: cell_text(&range, PROPERTY_LABEL),
            segment_label: cell_text(&range, SEGMENT_LABEL),
        };
        let variant = classify(&cells)?;

        let hotel_code = match &variant {
            ReportVariant::SingleProperty { str_id } => str_ids
                .get(str_id)
                .map(|code| HotelCode::Property(code.clone()))
                .ok_or_else(|| NormalizeError::UnmappedProperty(str_id.clone()))?,
            ReportVariant::Portfolio => HotelCode::All,
            ReportVariant::IndustrySegment(seg) => seg.hotel_code(),
        };

        let metrics = variant.align(&period_values(&range)?)?;

        Ok(PropertyRow {
            hotel_code,
            period,
            date_from,
            date_to,
            metrics,
        })
    };

    inner().map_err(|e| NormalizeError::File {
        path: path.to_path_buf(),
        source: Box::new(e),
    })
}

fn is_spreadsheet(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("xls") || e.eq_ignore_ascii_case("xlsx"))
            .unwrap_or(false)
}

/// `.xls`/`.xlsx` files directly in `dir`, by name.
pub fn spreadsheets_in(dir: &Path) -> Result<Vec<PathBuf>, NormalizeError> {
    let list_err = |source| NormalizeError::ListDir {
        dir: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        if is_spreadsheet(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Deletes leftover spreadsheets so a retried run starts clean.
pub fn clear_spreadsheets(dir: &Path) -> Result<usize, NormalizeError> {
    if !dir.exists() {
        return Ok(0);
    }
    let files = spreadsheets_in(dir)?;
    for f in &files {
        if let Err(e) = fs::remove_file(f) {
            warn!(file = %f.display(), "could not remove stale download: {e}");
        }
    }
    Ok(files.len())
}

/// Deletes (or moves into `move_to`) every file it holds when dropped.
struct ConsumedFiles {
    files: Vec<PathBuf>,
    move_to: Option<PathBuf>,
}

impl ConsumedFiles {
    fn release(path: &Path, move_to: Option<&Path>) -> io::Result<()> {
        let Some(target_dir) = move_to else {
            return fs::remove_file(path);
        };
        fs::create_dir_all(target_dir)?;
        let target = target_dir.join(path.file_name().unwrap_or_default());
        if fs::rename(path, &target).is_err() {
            // Different filesystem.
            fs::copy(path, &target)?;
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl Drop for ConsumedFiles {
    fn drop(&mut self) {
        for f in &self.files {
            if let Err(e) = Self::release(f, self.move_to.as_deref()) {
                error!(file = %f.display(), "failed to clean up consumed file: {e}");
            }
        }
    }
}

/// Parses every spreadsheet in `dir`. All of them are removed (or moved
/// into `move_to`) on return, including when one fails to parse.
pub fn parse_all(
    dir: &Path,
    date_from: NaiveDate,
    date_to: NaiveDate,
    period: Period,
    move_to: Option<&Path>,
    str_ids: &HashMap<String, String>,
) -> Result<Vec<PropertyRow>, NormalizeError> {
    let guard = ConsumedFiles {
        files: spreadsheets_in(dir)?,
        move_to: move_to.map(Path::to_path_buf),
    };

    let mut rows = Vec::with_capacity(guard.files.len());
    for f in &guard.files {
        info!("READING FILE: {}", f.display());
        rows.push(parse(f, date_from, date_to, period, str_ids)?);
    }

    PropertyRow::sort_batch(&mut rows);
    Ok(rows)
}
