// src/db/tables.rs
use crate::db::connection::DbError;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

/// A whole table rendered to text, column names first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDump {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn dump_schedules(conn: &Connection) -> Result<TableDump, DbError> {
    dump(conn, "select * from cfg_schedules order by job_name")
}

pub fn dump_mail_lists(conn: &Connection) -> Result<TableDump, DbError> {
    dump(conn, "select * from mail_list order by listname, email")
}

fn dump(conn: &Connection, sql: &str) -> Result<TableDump, DbError> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(cell_text(row.get_ref(i)?));
        }
        out.push(cells);
    }

    Ok(TableDump { columns, rows: out })
}

fn cell_text(v: ValueRef<'_>) -> String {
    match v {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
