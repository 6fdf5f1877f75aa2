// src/db/mail_lists.rs
use crate::db::connection::DbError;
use crate::domain::Subscription;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

pub fn list_exists(conn: &Connection, listname: &str) -> Result<bool, DbError> {
    let found = conn
        .query_row(
            "select 1 from cfg_mail_lists where listname = ?1",
            params![listname],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn find_subscription(
    conn: &Connection,
    listname: &str,
    email: &str,
) -> Result<Option<Subscription>, DbError> {
    let sub = conn
        .query_row(
            "select listname, email, subscribed, last_update
             from mail_list
             where listname = ?1 and email = ?2",
            params![listname, email],
            |r| {
                Ok(Subscription {
                    listname: r.get(0)?,
                    email: r.get(1)?,
                    subscribed: r.get(2)?,
                    last_update: r.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(sub)
}

pub fn subscription_exists(conn: &Connection, listname: &str, email: &str) -> Result<bool, DbError> {
    Ok(find_subscription(conn, listname, email)?.is_some())
}

pub fn insert_subscription(
    conn: &Connection,
    listname: &str,
    email: &str,
    now: NaiveDateTime,
) -> Result<(), DbError> {
    conn.execute(
        "insert into mail_list (listname, email, subscribed, last_update)
         values (?1, ?2, 1, ?3)",
        params![listname, email, now],
    )?;
    Ok(())
}

/// Returns the number of rows touched (0 or 1).
pub fn set_subscribed(
    conn: &Connection,
    listname: &str,
    email: &str,
    subscribed: bool,
    now: NaiveDateTime,
) -> Result<usize, DbError> {
    let n = conn.execute(
        "update mail_list
         set subscribed = ?3, last_update = ?4
         where listname = ?1 and email = ?2",
        params![listname, email, subscribed, now],
    )?;
    Ok(n)
}

/// Active subscribers of a list, alphabetical.
pub fn subscribed_emails(conn: &Connection, listname: &str) -> Result<Vec<String>, DbError> {
    let mut stmt = conn.prepare(
        "select email from mail_list
         where listname = ?1 and subscribed = 1
         order by email",
    )?;
    let rows = stmt.query_map(params![listname], |r| r.get::<_, String>(0))?;

    let mut out = Vec::new();
    for email in rows {
        out.push(email?);
    }
    Ok(out)
}
