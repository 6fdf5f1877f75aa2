use crate::db::Database;
use crate::mailer::Mailer;
use crate::reports::{send_to_list, ReportError};
use crate::templates::TemplateParams;

/// Ad-hoc notice to `list` in the basic frame, no attachment.
pub fn notify<M: Mailer>(
    listman: &Database,
    mailer: &M,
    list: &str,
    subject: &str,
    message: &str,
) -> Result<(), ReportError> {
    send_to_list(listman, mailer, list, subject, &TemplateParams::new(message), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Classify, ErrorKind};
    use crate::tests::utils::{init_test_dbs, insert_subscription, register_list, RecordingMailer};

    #[test]
    fn notice_goes_to_active_subscribers() {
        let dbs = init_test_dbs();
        register_list(&dbs.listman, "admin");
        insert_subscription(&dbs.listman, "admin", "ops@example.com", true);
        insert_subscription(&dbs.listman, "admin", "gone@example.com", false);
        let mailer = RecordingMailer::default();

        notify(&dbs.listman, &mailer, "admin", "FWK load late", "<p>Load is late.</p>").unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, ["ops@example.com"]);
        assert_eq!(sent[0].subject, "FWK load late");
        assert!(sent[0].html_body.contains("<p>Load is late.</p>"));
        assert!(sent[0].attachment.is_none());
    }

    #[test]
    fn empty_list_is_not_retried() {
        let dbs = init_test_dbs();
        register_list(&dbs.listman, "admin");
        let mailer = RecordingMailer::default();

        let err = notify(&dbs.listman, &mailer, "admin", "s", "m").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
