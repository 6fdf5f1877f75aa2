use crate::config::ListmanConfig;
use crate::db::logs::{logs_between, LogType};
use crate::db::tables::{dump_mail_lists, dump_schedules};
use crate::db::Database;
use crate::errors::ServerError;
use crate::listman::{ListError, ListManager};
use crate::responses::html_response;
use crate::responses::ResultResp;
use crate::templates::pages;
use astra::Request;
use chrono::{Duration, Local, NaiveDate};
use std::collections::HashMap;
use tracing::debug;

/// What every handler may touch. Connections are opened per request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub listman: Database,
    pub warehouse: Database,
    pub listman_cfg: ListmanConfig,
}

pub fn handle(req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str();
    let path = req.uri().path();
    debug!(method, path, "request");

    match (method, path) {
        ("GET", "/") => subscribe_unsubscribe(&parse_query(&req), state),
        ("GET", "/logs") => show_logs(&parse_query(&req), state),
        ("GET", "/show_schedules") => {
            let dump = state.warehouse.with_conn(|conn| dump_schedules(conn))?;
            html_response(pages::table_page("cfg_schedules", &dump))
        }
        ("GET", "/show_mail_lists") => {
            let dump = state.listman.with_conn(|conn| dump_mail_lists(conn))?;
            html_response(pages::table_page("mail_list", &dump))
        }
        _ => Err(ServerError::NotFound),
    }
}

fn subscribe_unsubscribe(params: &HashMap<String, String>, state: &AppState) -> ResultResp {
    let (Some(action), Some(listname), Some(email)) = (
        params.get("action"),
        params.get("listname"),
        params.get("email"),
    ) else {
        return html_response(pages::usage_page(&state.listman_cfg.public_url));
    };

    let lm = ListManager::new(state.listman.clone());
    let msg = match action.as_str() {
        "sub" => match lm.subscribe(listname, email, &state.listman_cfg.allowed_domains) {
            Ok(outcome) => outcome.message(listname, email),
            Err(ListError::UnknownList(_)) => {
                format!("Unable to add {email}. List {listname} does not exist.")
            }
            Err(ListError::InvalidEmail(_)) => {
                format!("Unable to add email {email}. Invalid email provided.")
            }
            Err(e) => validation_message(e)?,
        },
        "unsub" => match lm.unsubscribe(listname, email) {
            Ok(()) => format!("{email} has been unsubscribed from mailing list {listname}"),
            Err(e) => format!("Unable to unsubscribe. {}", validation_message(e)?),
        },
        _ => return html_response(pages::invalid_action_page()),
    };

    html_response(pages::message_page(&msg))
}

/// Validation failures are answered with their message; storage failures
/// become server errors.
fn validation_message(err: ListError) -> Result<String, ServerError> {
    match err {
        ListError::Db(e) => Err(e.into()),
        other => Ok(other.to_string()),
    }
}

/// Longest `/logs` window, in days.
pub const MAX_LOG_DAYS: i64 = 3660;

/// `[date - (days - 1), date + 1)`, so `date` itself is fully included.
/// `None` when the window falls outside the calendar chrono can represent.
pub fn log_window(date: NaiveDate, days: i64) -> Option<(NaiveDate, NaiveDate)> {
    let back = Duration::try_days(days.checked_sub(1)?)?;
    let from = date.checked_sub_signed(back)?;
    let to = date.checked_add_signed(Duration::try_days(1)?)?;
    Some((from, to))
}

fn show_logs(params: &HashMap<String, String>, state: &AppState) -> ResultResp {
    let date = match params.get("date") {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ServerError::BadRequest(format!("date must be YYYY-MM-DD, got '{s}'")))?,
        None => Local::now().date_naive(),
    };

    let days = match params.get("days") {
        Some(s) => match s.parse::<i64>() {
            Ok(n) if (1..=MAX_LOG_DAYS).contains(&n) => n,
            _ => {
                return Err(ServerError::BadRequest(format!(
                    "days must be an integer from 1 to {MAX_LOG_DAYS}, got '{s}'"
                )))
            }
        },
        None => 7,
    };

    let log_type = match params.get("type") {
        Some(s) => s.parse::<LogType>().map_err(ServerError::BadRequest)?,
        None => LogType::default(),
    };

    let (from, to) = log_window(date, days).ok_or_else(|| {
        ServerError::BadRequest(format!("{days} days before {date} is out of range"))
    })?;
    let records = state
        .warehouse
        .with_conn(|conn| logs_between(conn, log_type, from, to))?;

    html_response(pages::logs_page(log_type, from, to, &records))
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}
