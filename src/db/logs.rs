// src/db/logs.rs
use crate::db::connection::DbError;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::str::FromStr;

/// Which job log table to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogType {
    #[default]
    DataLoad,
    DataRun,
}

impl LogType {
    pub fn table(&self) -> &'static str {
        match self {
            LogType::DataLoad => "sys_log_dataload",
            LogType::DataRun => "sys_log_datarun",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::DataLoad => "dataload",
            LogType::DataRun => "datarun",
        }
    }
}

impl FromStr for LogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dataload" => Ok(LogType::DataLoad),
            "datarun" => Ok(LogType::DataRun),
            other => Err(format!("unknown log type '{other}' (dataload or datarun)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: String,
    pub source: String,
    pub status: String,
    pub message: String,
}

/// Rows with `from <= timestamp < to_exclusive`, newest first.
pub fn logs_between(
    conn: &Connection,
    log_type: LogType,
    from: NaiveDate,
    to_exclusive: NaiveDate,
) -> Result<Vec<LogRecord>, DbError> {
    // Table name comes from the enum, never from the request.
    let sql = format!(
        "select timestamp, source, status, message
         from {}
         where timestamp >= ?1 and timestamp < ?2
         order by timestamp desc",
        log_type.table()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            from.format("%Y-%m-%d").to_string(),
            to_exclusive.format("%Y-%m-%d").to_string()
        ],
        |r| {
            Ok(LogRecord {
                timestamp: r.get(0)?,
                source: r.get(1)?,
                status: r.get(2)?,
                message: r.get(3)?,
            })
        },
    )?;

    let mut out = Vec::new();
    for rec in rows {
        out.push(rec?);
    }
    Ok(out)
}
