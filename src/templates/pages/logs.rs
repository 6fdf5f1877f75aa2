// templates/pages/logs.rs
use crate::db::logs::{LogRecord, LogType};
use crate::templates::{card, data_table, desktop_layout};
use chrono::NaiveDate;
use maud::{html, Markup};

pub fn logs_page(
    log_type: LogType,
    from: NaiveDate,
    to_exclusive: NaiveDate,
    records: &[LogRecord],
) -> Markup {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.timestamp.clone(),
                r.source.clone(),
                r.status.clone(),
                r.message.clone(),
            ]
        })
        .collect();

    let meta = format!("{} rows, {from} up to (not including) {to_exclusive}", rows.len());

    desktop_layout(
        &format!("Logs: {}", log_type.as_str()),
        html! {
            (card(log_type.table(), &meta, html! {
                @if rows.is_empty() {
                    p { "No log entries in this window." }
                } @else {
                    (data_table(&["timestamp", "source", "status", "message"], &rows))
                }
            }))
        },
    )
}
