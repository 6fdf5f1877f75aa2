// src/listman.rs
use crate::db::connection::{Database, DbError};
use crate::db::mail_lists;
use crate::errors::{Classify, ErrorKind};
use chrono::Local;
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error(
        "Only emails from the following domains are allowed to subscribe to this mailing list: {}",
        .allowed.join(", ")
    )]
    DomainNotAllowed { email: String, allowed: Vec<String> },

    #[error("Invalid email provided: {0}")]
    InvalidEmail(String),

    #[error("List {0} does not exist.")]
    UnknownList(String),

    #[error("{email} is not subscribed to mailing list {listname}.")]
    NotSubscribed { listname: String, email: String },

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Classify for ListError {
    fn kind(&self) -> ErrorKind {
        match self {
            ListError::Db(e) => e.kind(),
            _ => ErrorKind::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Added,
    Renewed,
}

impl SubscribeOutcome {
    pub fn message(&self, listname: &str, email: &str) -> String {
        match self {
            SubscribeOutcome::Added => format!("{email} added to mailing list {listname}"),
            SubscribeOutcome::Renewed => {
                format!("{email} subscription to mailing list {listname} has been updated.")
            }
        }
    }
}

/// Loose shape check: `local@domain.tld`, one `@`, no whitespace.
pub fn is_valid_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Trims and lower-cases the domain part, so `Ann@Example.COM` and
/// `Ann@example.com` are one subscriber. The local part is kept as given.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_ascii_lowercase()),
        None => email.to_string(),
    }
}

fn domain_allowed(email: &str, allowed: &[String]) -> bool {
    let domain = email.rsplit_once('@').map(|(_, d)| d).unwrap_or("");
    allowed.iter().any(|a| a.eq_ignore_ascii_case(domain))
}

/// Subscriptions over the listman database.
#[derive(Debug, Clone)]
pub struct ListManager {
    db: Database,
}

impl ListManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn is_valid_list(&self, listname: &str) -> Result<bool, ListError> {
        self.db
            .with_conn(|conn| mail_lists::list_exists(conn, listname).map_err(ListError::from))
    }

    pub fn subscription_exists(&self, listname: &str, email: &str) -> Result<bool, ListError> {
        let email = normalize_email(email);
        self.db.with_conn(|conn| {
            mail_lists::subscription_exists(conn, listname, &email).map_err(ListError::from)
        })
    }

    /// Checks run in order: domain policy (before any DB access), email
    /// shape, list registry. Then the pair is inserted or re-activated.
    pub fn subscribe(
        &self,
        listname: &str,
        email: &str,
        allowed_domains: &[String],
    ) -> Result<SubscribeOutcome, ListError> {
        let email = normalize_email(email);
        let email = email.as_str();
        if !domain_allowed(email, allowed_domains) {
            let err = ListError::DomainNotAllowed {
                email: email.to_string(),
                allowed: allowed_domains.to_vec(),
            };
            info!(listname, email, "{err}");
            return Err(err);
        }

        if !is_valid_email(email) {
            error!(listname, email, "Unable to add email {email}. Invalid email provided.");
            return Err(ListError::InvalidEmail(email.to_string()));
        }

        let outcome = self.db.with_conn(|conn| {
            if !mail_lists::list_exists(conn, listname)? {
                return Err(ListError::UnknownList(listname.to_string()));
            }

            let now = Local::now().naive_local();
            if mail_lists::subscription_exists(conn, listname, email)? {
                mail_lists::set_subscribed(conn, listname, email, true, now)?;
                Ok(SubscribeOutcome::Renewed)
            } else {
                mail_lists::insert_subscription(conn, listname, email, now)?;
                Ok(SubscribeOutcome::Added)
            }
        });

        match &outcome {
            Ok(o) => info!("{}", o.message(listname, email)),
            Err(ListError::UnknownList(_)) => {
                error!("Unable to add {email}. List {listname} does not exist.")
            }
            Err(e) => error!(listname, email, "subscribe failed: {e}"),
        }
        outcome
    }

    /// Clears the flag on any existing pair, already unsubscribed or not;
    /// the row stays.
    pub fn unsubscribe(&self, listname: &str, email: &str) -> Result<(), ListError> {
        let email = normalize_email(email);
        let email = email.as_str();
        if !is_valid_email(email) {
            warn!(listname, email, "unsubscribe rejected: invalid email");
            return Err(ListError::InvalidEmail(email.to_string()));
        }

        let res = self.db.with_conn(|conn| {
            if !mail_lists::list_exists(conn, listname)? {
                return Err(ListError::UnknownList(listname.to_string()));
            }
            match mail_lists::find_subscription(conn, listname, email)? {
                Some(_) => {
                    let now = Local::now().naive_local();
                    mail_lists::set_subscribed(conn, listname, email, false, now)?;
                    Ok(())
                }
                None => Err(ListError::NotSubscribed {
                    listname: listname.to_string(),
                    email: email.to_string(),
                }),
            }
        });

        match &res {
            Ok(()) => info!("{email} has been unsubscribed from mailing list {listname}"),
            Err(e) => error!(listname, email, "unsubscribe failed: {e}"),
        }
        res
    }

    /// Active subscribers of `listname`, alphabetical.
    pub fn subscribers(&self, listname: &str) -> Result<Vec<String>, ListError> {
        self.db.with_conn(|conn| {
            mail_lists::subscribed_emails(conn, listname).map_err(ListError::from)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mail_lists::find_subscription;
    use crate::tests::utils::{init_test_dbs, register_list};

    fn allowed() -> Vec<String> {
        vec!["example.com".to_string()]
    }

    #[test]
    fn email_shapes() {
        for ok in ["user@domain.tld", "a.b@mail.example.com", "x@y.z"] {
            assert!(is_valid_email(ok), "{ok} should be valid");
        }
        for bad in [
            "",
            "userdomain.tld",
            "user@domaintld",
            "@domain.tld",
            "user@.tld",
            "user@domain.",
            "a@b@c.d",
            "user @domain.tld",
        ] {
            assert!(!is_valid_email(bad), "{bad:?} should be invalid");
        }
    }

    #[test]
    fn subscribe_then_unsubscribe_keeps_row() {
        let dbs = init_test_dbs();
        register_list(&dbs.listman, "ops");
        let lm = ListManager::new(dbs.listman.clone());

        let out = lm.subscribe("ops", "ann@example.com", &allowed()).unwrap();
        assert_eq!(out, SubscribeOutcome::Added);
        assert!(lm.subscription_exists("ops", "ann@example.com").unwrap());

        lm.unsubscribe("ops", "ann@example.com").unwrap();
        let sub = dbs
            .listman
            .with_conn(|conn| find_subscription(conn, "ops", "ann@example.com"))
            .unwrap()
            .expect("row must survive unsubscribe");
        assert!(!sub.subscribed);
        assert!(lm.subscription_exists("ops", "ann@example.com").unwrap());
    }

    #[test]
    fn unsubscribing_twice_succeeds_both_times() {
        let dbs = init_test_dbs();
        register_list(&dbs.listman, "ops");
        let lm = ListManager::new(dbs.listman.clone());

        lm.subscribe("ops", "ann@example.com", &allowed()).unwrap();
        lm.unsubscribe("ops", "ann@example.com").unwrap();
        lm.unsubscribe("ops", "ann@example.com").unwrap();

        let sub = dbs
            .listman
            .with_conn(|conn| find_subscription(conn, "ops", "ann@example.com"))
            .unwrap()
            .expect("row must survive unsubscribe");
        assert!(!sub.subscribed);
        assert!(lm.subscribers("ops").unwrap().is_empty());
    }

    #[test]
    fn resubscribe_updates_in_place() {
        let dbs = init_test_dbs();
        register_list(&dbs.listman, "ops");
        let lm = ListManager::new(dbs.listman.clone());

        lm.subscribe("ops", "ann@example.com", &allowed()).unwrap();
        lm.unsubscribe("ops", "ann@example.com").unwrap();
        let out = lm.subscribe("ops", "ann@example.com", &allowed()).unwrap();

        assert_eq!(out, SubscribeOutcome::Renewed);
        assert_eq!(lm.subscribers("ops").unwrap(), ["ann@example.com"]);
    }

    #[test]
    fn disallowed_domain_writes_nothing() {
        let dbs = init_test_dbs();
        register_list(&dbs.listman, "ops");
        let lm = ListManager::new(dbs.listman.clone());

        let err = lm.subscribe("ops", "eve@evil.org", &allowed()).unwrap_err();
        assert!(matches!(err, ListError::DomainNotAllowed { .. }));
        assert!(err.to_string().contains("example.com"));
        assert!(!lm.subscription_exists("ops", "eve@evil.org").unwrap());
    }

    #[test]
    fn disallowed_domain_needs_no_database() {
        // No schema applied: any DB access would fail with SchemaMissing.
        let dir = tempfile::tempdir().unwrap();
        let lm = ListManager::new(Database::new(dir.path().join("bare.sqlite3")));

        let err = lm.subscribe("ops", "eve@evil.org", &allowed()).unwrap_err();
        assert!(matches!(err, ListError::DomainNotAllowed { .. }));
    }

    #[test]
    fn domain_must_match_exactly() {
        let dbs = init_test_dbs();
        register_list(&dbs.listman, "ops");
        let lm = ListManager::new(dbs.listman.clone());

        let err = lm
            .subscribe("ops", "eve@example.com.evil.org", &allowed())
            .unwrap_err();
        assert!(matches!(err, ListError::DomainNotAllowed { .. }));
        assert!(lm.subscribe("ops", "bob@EXAMPLE.com", &allowed()).is_ok());
    }

    #[test]
    fn domain_case_does_not_split_a_subscriber() {
        let dbs = init_test_dbs();
        register_list(&dbs.listman, "ops");
        let lm = ListManager::new(dbs.listman.clone());

        assert_eq!(
            lm.subscribe("ops", "Ann@Example.COM", &allowed()).unwrap(),
            SubscribeOutcome::Added
        );
        assert_eq!(
            lm.subscribe("ops", " Ann@example.com", &allowed()).unwrap(),
            SubscribeOutcome::Renewed
        );
        assert_eq!(lm.subscribers("ops").unwrap(), ["Ann@example.com"]);

        lm.unsubscribe("ops", "Ann@EXAMPLE.com").unwrap();
        assert!(lm.subscribers("ops").unwrap().is_empty());
    }

    #[test]
    fn unknown_list_is_rejected() {
        let dbs = init_test_dbs();
        let lm = ListManager::new(dbs.listman.clone());

        let err = lm.subscribe("nope", "ann@example.com", &allowed()).unwrap_err();
        assert!(matches!(err, ListError::UnknownList(ref l) if l == "nope"));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn unsubscribe_errors_are_distinct() {
        let dbs = init_test_dbs();
        register_list(&dbs.listman, "ops");
        let lm = ListManager::new(dbs.listman.clone());

        assert!(matches!(
            lm.unsubscribe("ops", "not-an-email").unwrap_err(),
            ListError::InvalidEmail(_)
        ));
        assert!(matches!(
            lm.unsubscribe("nope", "ann@example.com").unwrap_err(),
            ListError::UnknownList(_)
        ));
        assert!(matches!(
            lm.unsubscribe("ops", "ann@example.com").unwrap_err(),
            ListError::NotSubscribed { .. }
        ));
    }

    #[test]
    fn missing_table_is_schema_missing() {
        let dir = tempfile::tempdir().unwrap();
        let lm = ListManager::new(Database::new(dir.path().join("bare.sqlite3")));

        let err = lm.subscription_exists("ops", "ann@example.com").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMissing);
    }
}
