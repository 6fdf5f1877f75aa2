use super::{get, get_ok, state};
use crate::db::DbError;
use crate::errors::ServerError;
use crate::router::{handle, log_window};
use crate::tests::utils::{init_test_dbs, insert_subscription, register_list, TestDbs};
use chrono::NaiveDate;

fn log(dbs: &TestDbs, table: &str, ts: &str, source: &str) {
    dbs.warehouse
        .with_conn(|conn| {
            conn.execute(
                &format!(
                    "insert into {table} (timestamp, source, status, message) values (?1, ?2, 'ok', '')"
                ),
                [ts, source],
            )
            .map_err(DbError::from)
        })
        .unwrap();
}

#[test]
fn window_covers_days_up_to_and_including_date() {
    let d = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    let (from, to) = log_window(d, 5).unwrap();
    assert_eq!(from, NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
    assert_eq!(to, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
}

#[test]
fn window_past_the_calendar_edge_is_none() {
    assert_eq!(log_window(NaiveDate::MIN, 2), None);
    assert_eq!(log_window(NaiveDate::MAX, 1), None);
    assert_eq!(log_window(NaiveDate::MIN, i64::MAX), None);
}

#[test]
fn logs_are_filtered_and_newest_first() {
    let dbs = init_test_dbs();
    log(&dbs, "sys_log_dataload", "2024-03-05 23:59:59", "too_old");
    log(&dbs, "sys_log_dataload", "2024-03-06 00:00:00", "first_day");
    log(&dbs, "sys_log_dataload", "2024-03-10 18:00:00", "last_day");
    log(&dbs, "sys_log_dataload", "2024-03-11 00:00:00", "too_new");
    log(&dbs, "sys_log_datarun", "2024-03-08 12:00:00", "a_run");

    let (status, body) = get_ok(&dbs, "/logs?date=2024-03-10&days=5&type=dataload");
    assert_eq!(status, 200);
    assert!(!body.contains("too_old"));
    assert!(!body.contains("too_new"));
    assert!(!body.contains("a_run"));
    let last = body.find("last_day").unwrap();
    let first = body.find("first_day").unwrap();
    assert!(last < first, "newest row should come first");

    let (_, body) = get_ok(&dbs, "/logs?date=2024-03-10&days=5&type=datarun");
    assert!(body.contains("a_run"));
    assert!(body.contains("sys_log_datarun"));
}

#[test]
fn bad_log_parameters_are_bad_requests() {
    let dbs = init_test_dbs();
    for uri in [
        "/logs?date=10-03-2024",
        "/logs?days=zero",
        "/logs?days=0",
        "/logs?days=100000000",
        "/logs?days=9223372036854775807",
        "/logs?days=3661",
        "/logs?type=errors",
    ] {
        let err = handle(get(uri), &state(&dbs)).unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)), "{uri}");
    }
}

#[test]
fn longest_window_is_accepted() {
    let dbs = init_test_dbs();
    log(&dbs, "sys_log_dataload", "2014-03-20 09:00:00", "ten_years_back");
    let (status, body) = get_ok(&dbs, "/logs?date=2024-03-10&days=3660");
    assert_eq!(status, 200);
    assert!(body.contains("ten_years_back"));
}

#[test]
fn defaults_to_the_last_seven_days() {
    let dbs = init_test_dbs();
    let (status, body) = get_ok(&dbs, "/logs");
    assert_eq!(status, 200);
    assert!(body.contains("sys_log_dataload"));
    assert!(body.contains("No log entries in this window."));
}

#[test]
fn schedules_dump_in_job_order() {
    let dbs = init_test_dbs();
    dbs.warehouse
        .with_conn(|conn| {
            conn.execute_batch(
                "insert into cfg_schedules (job_name, start_time, end_time) values ('str-weekly', '08:00', '08:30');
                 insert into cfg_schedules (job_name, start_time, end_time) values ('opera', '03:00', '03:30');",
            )
            .map_err(DbError::from)
        })
        .unwrap();

    let (status, body) = get_ok(&dbs, "/show_schedules");
    assert_eq!(status, 200);
    assert!(body.contains("<th>job_name</th>"));
    assert!(body.find("opera").unwrap() < body.find("str-weekly").unwrap());
}

#[test]
fn mail_lists_dump_by_list_then_email() {
    let dbs = init_test_dbs();
    register_list(&dbs.listman, "a_list");
    register_list(&dbs.listman, "b_list");
    insert_subscription(&dbs.listman, "b_list", "amy@example.com", true);
    insert_subscription(&dbs.listman, "a_list", "zed@example.com", false);

    let (_, body) = get_ok(&dbs, "/show_mail_lists");
    assert!(body.contains("2 rows"));
    assert!(body.find("zed@example.com").unwrap() < body.find("amy@example.com").unwrap());
}

#[test]
fn unknown_routes_are_not_found() {
    let dbs = init_test_dbs();
    let err = handle(get("/admin"), &state(&dbs)).unwrap_err();
    assert!(matches!(err, ServerError::NotFound));

    let resp = crate::templates::html_error_response(err);
    assert_eq!(resp.status().as_u16(), 404);
}
