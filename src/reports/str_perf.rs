// reports/str_perf.rs
use crate::config::AppConfig;
use crate::db::property_map::{str_hotels, str_id_lookup, StrHotel};
use crate::db::{Database, DbError};
use crate::domain::{PropertyRow, Segment};
use crate::mailer::{Mailer, TempAttachment};
use crate::periods::{date_ranges, DateRange, Period};
use crate::reports::{io_err, send_to_list, ReportError};
use crate::scraper::{ReportDownloader, ReportRequest, ReportScope};
use crate::spreadsheets::str_report::{clear_spreadsheets, parse_all};
use crate::spreadsheets::{export_property_rows_xlsx, write_checkpoint};
use crate::templates::TemplateParams;
use chrono::{Datelike, Local, NaiveDate};
use std::collections::HashMap;
use std::fs;
use tracing::info;

const MESSAGE: &str = "<strong>Hello team!</strong><br>\
I've finished copying-and-pasting the data from STR, as attached, for your reporting activity. \
I've also included the execution time of the report in the filename, for your convenience.\
<br><br>Best regards,<br>Report Bot";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Cadence {
    Weekly,
    Monthly,
}

impl Cadence {
    pub fn label(&self) -> &'static str {
        match self {
            Cadence::Weekly => "Weekly",
            Cadence::Monthly => "Monthly",
        }
    }

    /// Weekly runs look back from today, monthly ones from the 1st.
    pub fn reference(&self, today: NaiveDate) -> NaiveDate {
        match self {
            Cadence::Weekly => today,
            Cadence::Monthly => today.with_day(1).unwrap_or(today),
        }
    }

    pub fn subject(&self) -> String {
        format!("STR {} Report - Raw Data", self.label())
    }
}

/// Hotels to fetch individually, and the portfolio used for the
/// aggregate and segment reports.
struct HotelSets {
    individual: Vec<StrHotel>,
    portfolio: Vec<StrHotel>,
    str_ids: HashMap<String, String>,
}

fn load_hotel_sets(cfg: &AppConfig, warehouse: &Database) -> Result<HotelSets, DbError> {
    let operator = cfg.str_portal.operator.as_str();
    let country = cfg.str_portal.portfolio_country.as_str();
    warehouse.with_conn(|conn| {
        Ok(HotelSets {
            individual: str_hotels(conn, operator, None)?,
            portfolio: str_hotels(conn, operator, Some(country))?,
            str_ids: str_id_lookup(conn)?,
        })
    })
}

/// Individual reports first, then the portfolio, then each segment.
fn requests(sets: &HotelSets, range: DateRange) -> Vec<ReportRequest> {
    let mut out = vec![
        ReportRequest {
            scope: ReportScope::Properties,
            hotels: sets.individual.clone(),
            range,
        },
        ReportRequest {
            scope: ReportScope::Portfolio,
            hotels: sets.portfolio.clone(),
            range,
        },
    ];
    for seg in Segment::ALL {
        out.push(ReportRequest {
            scope: ReportScope::IndustrySegment(seg),
            hotels: sets.portfolio.clone(),
            range,
        });
    }
    out
}

/// Downloads and normalizes every period for `reference`. Each finished
/// period is written to the checkpoint CSV before the next one starts.
pub fn collect_rows<D: ReportDownloader>(
    cfg: &AppConfig,
    warehouse: &Database,
    downloader: &mut D,
    reference: NaiveDate,
) -> Result<Vec<PropertyRow>, ReportError> {
    let sets = load_hotel_sets(cfg, warehouse)?;
    let download_dir = cfg.reports.download_dir.as_path();
    let archive_dir = cfg.reports.archive_dir.as_deref();
    fs::create_dir_all(download_dir).map_err(io_err(download_dir))?;
    fs::create_dir_all(&cfg.reports.temp_dir).map_err(io_err(&cfg.reports.temp_dir))?;
    let checkpoint = cfg.reports.temp_dir.join("str_checkpoint.csv");

    let mut all = Vec::new();
    for (period, range) in date_ranges(reference, &Period::ALL) {
        let stale = clear_spreadsheets(download_dir)?;
        if stale > 0 {
            info!(stale, "removed leftover downloads");
        }

        for req in requests(&sets, range) {
            let files = downloader.download(&req)?;
            info!(%period, scope = ?req.scope, files = files.len(), "downloaded");
        }

        let rows = parse_all(download_dir, range.from, range.to, period, archive_dir, &sets.str_ids)?;
        info!(%period, %range, rows = rows.len(), "period normalized");
        all.extend(rows);

        write_checkpoint(&all, &checkpoint).map_err(|source| ReportError::Checkpoint {
            path: checkpoint.clone(),
            source,
        })?;
    }

    PropertyRow::sort_batch(&mut all);
    Ok(all)
}

pub fn run_str_report<D: ReportDownloader, M: Mailer>(
    cfg: &AppConfig,
    warehouse: &Database,
    listman: &Database,
    downloader: &mut D,
    mailer: &M,
    cadence: Cadence,
    today: NaiveDate,
) -> Result<(), ReportError> {
    let rows = collect_rows(cfg, warehouse, downloader, cadence.reference(today))?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let file_name = format!("STR_{}_Report{}.xlsx", cadence.label(), stamp);
    let attachment = TempAttachment::new(cfg.reports.temp_dir.join(file_name));
    export_property_rows_xlsx(&rows, attachment.path())?;

    send_to_list(
        listman,
        mailer,
        &cfg.reports.str_list,
        &cadence.subject(),
        &TemplateParams::new(MESSAGE),
        Some(attachment),
    )
}
