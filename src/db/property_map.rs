// src/db/property_map.rs
use crate::db::connection::DbError;
use rusqlite::{params, Connection};
use std::collections::HashMap;

/// A property as the STR portal knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrHotel {
    pub str_hotel_id: String,
    pub str_hotel_name: String,
}

/// Hotels of `operator` that have an STR id, optionally limited to one country.
pub fn str_hotels(
    conn: &Connection,
    operator: &str,
    country: Option<&str>,
) -> Result<Vec<StrHotel>, DbError> {
    let mut stmt = conn.prepare(
        "select str_hotel_id, str_hotel_name
         from cfg_map_properties
         where operator = ?1
           and asset_type = 'hotel'
           and str_hotel_id is not null
           and (?2 is null or country = ?2)
         order by str_hotel_name",
    )?;
    let rows = stmt.query_map(params![operator, country], |r| {
        Ok(StrHotel {
            str_hotel_id: r.get(0)?,
            str_hotel_name: r.get::<_, Option<String>>(1)?.unwrap_or_default(),
        })
    })?;

    let mut out = Vec::new();
    for h in rows {
        out.push(h?);
    }
    Ok(out)
}

/// STR id -> hotel_code.
pub fn str_id_lookup(conn: &Connection) -> Result<HashMap<String, String>, DbError> {
    pairs(
        conn,
        "select str_hotel_id, hotel_code from cfg_map_properties
         where str_hotel_id is not null",
    )
}

/// hotel_code -> new_code for one operator.
pub fn new_code_lookup(conn: &Connection, operator: &str) -> Result<HashMap<String, String>, DbError> {
    let mut stmt = conn.prepare(
        "select hotel_code, new_code from cfg_map_properties
         where operator = ?1 and new_code is not null",
    )?;
    let rows = stmt.query_map(params![operator], |r| Ok((r.get(0)?, r.get(1)?)))?;
    let mut out = HashMap::new();
    for pair in rows {
        let (k, v): (String, String) = pair?;
        out.insert(k, v);
    }
    Ok(out)
}

fn pairs(conn: &Connection, sql: &str) -> Result<HashMap<String, String>, DbError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
    let mut out = HashMap::new();
    for pair in rows {
        let (k, v): (String, String) = pair?;
        out.insert(k, v);
    }
    Ok(out)
}
