use super::{get, get_ok, state};
use crate::errors::ServerError;
use crate::mailer::resolve_recipients;
use crate::router::handle;
use crate::tests::utils::{init_test_dbs, insert_subscription, register_list};

#[test]
fn subscribe_then_unsubscribe_over_http() {
    let dbs = init_test_dbs();
    register_list(&dbs.listman, "ops");

    let (status, body) = get_ok(&dbs, "/?action=sub&listname=ops&email=ann%40example.com");
    assert_eq!(status, 200);
    assert!(body.contains("ann@example.com added to mailing list ops"));

    let (_, body) = get_ok(&dbs, "/?action=sub&listname=ops&email=ann@example.com");
    assert!(body.contains("subscription to mailing list ops has been updated."));

    let (_, body) = get_ok(&dbs, "/?action=unsub&listname=ops&email=ann@example.com");
    assert!(body.contains("ann@example.com has been unsubscribed from mailing list ops"));

    assert!(resolve_recipients(&dbs.listman, "ops").unwrap().is_empty());
}

#[test]
fn missing_parameters_show_usage() {
    let dbs = init_test_dbs();
    let (status, body) = get_ok(&dbs, "/?action=sub&listname=ops");
    assert_eq!(status, 200);
    assert!(body.contains("Please ensure that all input parameters are filled correctly."));
    assert!(body.contains("http://ops.example.com/listman?action=&lt;sub|unsub&gt;"));
}

#[test]
fn unknown_action_is_reported() {
    let dbs = init_test_dbs();
    let (_, body) = get_ok(&dbs, "/?action=purge&listname=ops&email=ann@example.com");
    assert!(body.contains("Invalid action. action = &quot;sub&quot; or &quot;unsub&quot; only."));
}

#[test]
fn validation_failures_are_messages_not_errors() {
    let dbs = init_test_dbs();
    register_list(&dbs.listman, "ops");

    let (status, body) = get_ok(&dbs, "/?action=sub&listname=ops&email=eve@evil.org");
    assert_eq!(status, 200);
    assert!(body.contains("Only emails from the following domains are allowed"));

    let (_, body) = get_ok(&dbs, "/?action=sub&listname=nope&email=ann@example.com");
    assert!(body.contains("Unable to add ann@example.com. List nope does not exist."));

    let (_, body) = get_ok(&dbs, "/?action=unsub&listname=ops&email=bob@example.com");
    assert!(body.contains("Unable to unsubscribe."));
    assert!(body.contains("is not subscribed to mailing list ops"));
}

#[test]
fn missing_table_is_a_server_error() {
    let dbs = init_test_dbs();
    let bare = tempfile::tempdir().unwrap();
    let mut st = state(&dbs);
    st.listman = crate::db::Database::new(bare.path().join("bare.sqlite3"));

    let err = handle(get("/?action=unsub&listname=ops&email=ann@example.com"), &st).unwrap_err();
    assert!(matches!(err, ServerError::SchemaMissing(_)));
}

#[test]
fn recipients_are_the_active_subscribers_in_order() {
    let dbs = init_test_dbs();
    register_list(&dbs.listman, "ops");
    insert_subscription(&dbs.listman, "ops", "zoe@example.com", true);
    insert_subscription(&dbs.listman, "ops", "bob@example.com", false);
    get_ok(&dbs, "/?action=sub&listname=ops&email=amy@example.com");

    assert_eq!(
        resolve_recipients(&dbs.listman, "ops").unwrap(),
        ["amy@example.com", "zoe@example.com"]
    );
}
