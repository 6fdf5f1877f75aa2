use crate::domain::{OperaBooking, PropertyRow, METRIC_COLUMNS};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
#[error("xlsx export failed: {0}")]
pub struct ExportError(pub String);

fn write_headers(worksheet: &mut Worksheet, headers: &[&str]) -> Result<(), ExportError> {
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|e| ExportError(format!("Failed to write header '{}': {}", header, e)))?;
    }
    Ok(())
}

fn save(workbook: &mut Workbook, path: &Path) -> Result<(), ExportError> {
    workbook
        .save(path)
        .map_err(|e| ExportError(format!("Failed to save {}: {}", path.display(), e)))
}

/// One sheet: key columns then the 18 metrics; missing metrics stay blank.
pub fn export_property_rows_xlsx(rows: &[PropertyRow], path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let mut headers = vec!["hotel_code", "period_name", "date_from", "date_to"];
    headers.extend(METRIC_COLUMNS);
    write_headers(worksheet, &headers)?;

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;

        worksheet
            .write_string(r, 0, row.hotel_code.as_str())
            .map_err(|e| ExportError(format!("Failed to write hotel_code: {}", e)))?;

        worksheet
            .write_string(r, 1, row.period.code())
            .map_err(|e| ExportError(format!("Failed to write period: {}", e)))?;

        worksheet
            .write_string(r, 2, row.date_from.format("%Y-%m-%d").to_string())
            .map_err(|e| ExportError(format!("Failed to write date_from: {}", e)))?;

        worksheet
            .write_string(r, 3, row.date_to.format("%Y-%m-%d").to_string())
            .map_err(|e| ExportError(format!("Failed to write date_to: {}", e)))?;

        for (m, value) in row.metrics.iter().enumerate() {
            if let Some(v) = value {
                worksheet
                    .write_number(r, (4 + m) as u16, *v)
                    .map_err(|e| {
                        ExportError(format!("Failed to write {}: {}", METRIC_COLUMNS[m], e))
                    })?;
            }
        }
    }

    save(&mut workbook, path)
}

/// The filtered Opera bookings behind the email-quality figures.
pub fn export_bookings_xlsx(bookings: &[OperaBooking], path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    write_headers(
        worksheet,
        &[
            "resort",
            "confirmation_number",
            "email",
            "first_name",
            "last_name",
            "market_code",
            "rate_code",
            "arrival_date_dt",
        ],
    )?;

    for (i, b) in bookings.iter().enumerate() {
        let r = (i + 1) as u32;
        let arrival = b.arrival_date.format("%Y-%m-%d").to_string();
        let cells: [&str; 8] = [
            &b.resort,
            &b.confirmation_number,
            &b.email,
            &b.first_name,
            &b.last_name,
            &b.market_code,
            &b.rate_code,
            &arrival,
        ];
        for (col, value) in cells.iter().enumerate() {
            worksheet
                .write_string(r, col as u16, *value)
                .map_err(|e| ExportError(format!("Failed to write booking {}: {}", b.confirmation_number, e)))?;
        }
    }

    save(&mut workbook, path)
}
