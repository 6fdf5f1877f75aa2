use crate::domain::{PropertyRow, METRIC_COLUMNS};
use std::path::Path;

/// Interim CSV of everything parsed so far, so a failure late in a long
/// run does not throw away finished periods.
pub fn write_checkpoint(rows: &[PropertyRow], path: &Path) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["hotel_code", "period_name", "date_from", "date_to"];
    header.extend(METRIC_COLUMNS);
    wtr.write_record(&header)?;

    for row in rows {
        let mut rec = vec![
            row.hotel_code.to_string(),
            row.period.code().to_string(),
            row.date_from.to_string(),
            row.date_to.to_string(),
        ];
        rec.extend(
            row.metrics
                .iter()
                .map(|m| m.map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&rec)?;
    }
    wtr.flush()?;
    Ok(())
}
