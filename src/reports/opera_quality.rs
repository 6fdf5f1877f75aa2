// reports/opera_quality.rs
use crate::config::AppConfig;
use crate::db::property_map::new_code_lookup;
use crate::db::Database;
use crate::domain::OperaBooking;
use crate::listman::is_valid_email;
use crate::mailer::{Mailer, TempAttachment};
use crate::periods::DateRange;
use crate::reports::{io_err, send_to_list, ReportError};
use crate::spreadsheets::export_bookings_xlsx;
use crate::spreadsheets::opera::{load_field_labels, read_all_exports};
use crate::templates::{data_table, TemplateParams};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use tracing::info;

const BOOKING_COM: &str = "booking.com";
const REPEAT_GUEST_VIP: &str = "Repeat Guests";

/// The previous calendar month, relative to `today`.
pub fn default_range(today: NaiveDate) -> DateRange {
    let first_this_month = today.with_day(1).unwrap_or(today);
    let to = first_this_month - Duration::days(1);
    DateRange {
        from: to.with_day(1).unwrap_or(to),
        to,
    }
}

pub fn load_bookings(cfg: &AppConfig, range: &DateRange) -> Result<Vec<OperaBooking>, ReportError> {
    let labels = load_field_labels(&cfg.opera.mapping_file, &cfg.opera.mapping_sheet)?;
    let bookings = read_all_exports(&cfg.opera.data_dir, &labels, range)?;
    info!(%range, bookings = bookings.len(), "opera bookings loaded");
    Ok(bookings)
}

/// Email collection shares, in percent with one decimal.
///
/// Booking.com relay addresses count as invalid even though they are
/// well-formed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmailQuality {
    pub total: usize,
    pub not_collected: f64,
    pub invalid: f64,
    pub valid: f64,
}

impl EmailQuality {
    pub fn of<'a>(bookings: impl IntoIterator<Item = &'a OperaBooking>) -> Self {
        let (mut total, mut blank, mut tech_valid, mut booking_com) = (0usize, 0usize, 0usize, 0usize);
        for b in bookings {
            let email = b.email.trim();
            total += 1;
            if email.is_empty() {
                blank += 1;
            }
            if is_valid_email(email) {
                tech_valid += 1;
            }
            if email.to_ascii_lowercase().contains(BOOKING_COM) {
                booking_com += 1;
            }
        }

        if total == 0 {
            return Self {
                total,
                not_collected: 0.0,
                invalid: 0.0,
                valid: 0.0,
            };
        }

        let tech_invalid = total - tech_valid;
        let pct = |n: f64| round_to(n / total as f64 * 100.0, 1);
        Self {
            total,
            not_collected: pct(blank as f64),
            invalid: pct(tech_invalid as f64 - blank as f64 + booking_com as f64),
            valid: pct(tech_valid as f64 - booking_com as f64),
        }
    }
}

/// Per-hotel quality, keyed by the hotel's new code where one is mapped.
pub fn quality_by_hotel(
    bookings: &[OperaBooking],
    new_codes: &HashMap<String, String>,
) -> Vec<(String, EmailQuality)> {
    let mut by_resort: BTreeMap<&str, Vec<&OperaBooking>> = BTreeMap::new();
    for b in bookings {
        by_resort.entry(b.resort.as_str()).or_default().push(b);
    }

    let mut out: Vec<(String, EmailQuality)> = by_resort
        .into_iter()
        .map(|(resort, group)| {
            let hotel = new_codes
                .get(resort)
                .cloned()
                .unwrap_or_else(|| resort.to_string());
            (hotel, EmailQuality::of(group))
        })
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

fn round_to(v: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (v * f).round() / f
}

fn portfolio_message(q: &EmailQuality) -> String {
    format!(
        "Here is the email collection information from Opera:<br /><br />\
         <b>[PORTFOLIO LEVEL STATISTICS]</b><br />\
         Not Collected: {:.1}%<br />\
         Invalid: {:.1}%<br />\
         Valid: {:.1}%<br />",
        q.not_collected, q.invalid, q.valid
    )
}

pub fn run_email_quality<M: Mailer>(
    cfg: &AppConfig,
    warehouse: &Database,
    listman: &Database,
    mailer: &M,
    range: DateRange,
) -> Result<(), ReportError> {
    let bookings = load_bookings(cfg, &range)?;
    if bookings.is_empty() {
        return Err(ReportError::NoData(range));
    }

    let new_codes = warehouse.with_conn(|conn| new_code_lookup(conn, &cfg.opera.operator))?;
    let portfolio = EmailQuality::of(&bookings);
    let hotels = quality_by_hotel(&bookings, &new_codes);

    let rows: Vec<Vec<String>> = hotels
        .iter()
        .map(|(hotel, q)| {
            vec![
                hotel.clone(),
                format!("{:.1}", q.not_collected),
                format!("{:.1}", q.invalid),
                format!("{:.1}", q.valid),
            ]
        })
        .collect();
    let table = data_table(&["Hotel", "Not Collected", "Invalid", "Valid"], &rows);

    let temp_dir = &cfg.reports.temp_dir;
    fs::create_dir_all(temp_dir).map_err(io_err(temp_dir))?;
    let attachment = TempAttachment::new(temp_dir.join(format!(
        "email_list - {} to {}.xlsx",
        range.from, range.to
    )));
    export_bookings_xlsx(&bookings, attachment.path())?;

    let list = cfg.reports.opera_email_quality_list.as_str();
    let subject = format!("[{list}] Arrival Date Period: {} to {}", range.from, range.to);
    send_to_list(
        listman,
        mailer,
        list,
        &subject,
        &TemplateParams::new(portfolio_message(&portfolio)).with_table(table),
        Some(attachment),
    )
}

/// Share of bookings flagged as repeat guests, plus the arrival dates the
/// data actually covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatGuestShare {
    pub percent: f64,
    pub first_arrival: NaiveDate,
    pub last_arrival: NaiveDate,
}

pub fn repeat_guest_share(bookings: &[OperaBooking]) -> Option<RepeatGuestShare> {
    let first_arrival = bookings.iter().map(|b| b.arrival_date).min()?;
    let last_arrival = bookings.iter().map(|b| b.arrival_date).max()?;
    let repeat = bookings
        .iter()
        .filter(|b| b.vip_code == REPEAT_GUEST_VIP)
        .count();

    Some(RepeatGuestShare {
        percent: round_to(repeat as f64 / bookings.len() as f64 * 100.0, 2),
        first_arrival,
        last_arrival,
    })
}

fn repeat_guest_message(share: &RepeatGuestShare) -> String {
    format!(
        "<p>Here is your information on repeat guests, based on Opera bookings. \
         A repeat guest is one whose booking carries the VIP code \"Repeat Guests\".</p>\
         <b>Percentage of repeat guests: {}%</b><br />\
         <b>Arrival Date Range in Source Data Set: {} to {}</b>",
        share.percent, share.first_arrival, share.last_arrival
    )
}

pub fn run_repeat_guests<M: Mailer>(
    cfg: &AppConfig,
    listman: &Database,
    mailer: &M,
    range: DateRange,
) -> Result<(), ReportError> {
    let bookings = load_bookings(cfg, &range)?;
    let share = repeat_guest_share(&bookings).ok_or(ReportError::NoData(range))?;
    info!(percent = share.percent, "repeat guest share");

    let list = cfg.reports.repeat_guest_list.as_str();
    let subject = format!("[{list}] Arrival Date Period: {} to {}", range.from, range.to);
    send_to_list(
        listman,
        mailer,
        list,
        &subject,
        &TemplateParams::new(repeat_guest_message(&share)),
        None,
    )
}
