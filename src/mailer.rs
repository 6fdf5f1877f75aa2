// src/mailer.rs
use crate::config::SmtpConfig;
use crate::db::connection::{Database, DbError};
use crate::db::mail_lists::subscribed_emails;
use crate::errors::{Classify, ErrorKind};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::{Message, SmtpTransport, Transport};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("no recipients for '{0}'")]
    NoRecipients(String),

    #[error("invalid address '{address}': {msg}")]
    Address { address: String, msg: String },

    #[error("could not build message: {0}")]
    Build(String),

    #[error("could not read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("smtp: {0}")]
    Smtp(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl Classify for MailError {
    fn kind(&self) -> ErrorKind {
        match self {
            MailError::NoRecipients(_) | MailError::Address { .. } => ErrorKind::Validation,
            MailError::Build(_) => ErrorKind::DataShape,
            MailError::Attachment { .. } | MailError::Smtp(_) => ErrorKind::Transient,
            MailError::Db(e) => e.kind(),
        }
    }
}

/// A generated file that is removed from disk when dropped.
#[derive(Debug)]
pub struct TempAttachment {
    path: PathBuf,
    file_name: String,
}

impl TempAttachment {
    /// Takes ownership of an already written file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        Self { path, file_name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Drop for TempAttachment {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(file = %self.path.display(), "could not delete attachment: {e}");
            }
        }
    }
}

/// Everything one send needs. Dropping the job deletes its attachment.
#[derive(Debug)]
pub struct EmailJob {
    pub list: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub attachment: Option<TempAttachment>,
}

pub trait Mailer {
    /// Consumes the job; its attachment is gone once this returns.
    fn send(&self, job: EmailJob) -> Result<(), MailError>;
}

/// Active subscribers of `list`, alphabetical.
pub fn resolve_recipients(db: &Database, list: &str) -> Result<Vec<String>, MailError> {
    db.with_conn(|conn| subscribed_emails(conn, list).map_err(MailError::from))
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse::<Mailbox>().map_err(|e| MailError::Address {
        address: address.to_string(),
        msg: e.to_string(),
    })
}

pub fn sender(cfg: &SmtpConfig) -> Result<Mailbox, MailError> {
    let address = cfg.from_email.parse().map_err(|e: lettre::address::AddressError| MailError::Address {
        address: cfg.from_email.clone(),
        msg: e.to_string(),
    })?;
    Ok(Mailbox::new(Some(cfg.from_name.clone()), address))
}

/// HTML body plus an optional `application/octet-stream` attachment.
pub fn build_message(from: &Mailbox, job: &EmailJob) -> Result<Message, MailError> {
    if job.recipients.is_empty() {
        return Err(MailError::NoRecipients(job.list.clone()));
    }

    let mut builder = Message::builder().from(from.clone()).subject(job.subject.as_str());
    for r in &job.recipients {
        builder = builder.to(parse_mailbox(r)?);
    }

    let mut body = MultiPart::mixed().singlepart(SinglePart::html(job.html_body.clone()));
    if let Some(att) = &job.attachment {
        let bytes = fs::read(att.path()).map_err(|source| MailError::Attachment {
            path: att.path().to_path_buf(),
            source,
        })?;
        let content_type = ContentType::parse(mime::APPLICATION_OCTET_STREAM.as_ref())
            .map_err(|e| MailError::Build(e.to_string()))?;
        body = body.singlepart(Attachment::new(att.file_name().to_string()).body(bytes, content_type));
    }

    builder
        .multipart(body)
        .map_err(|e| MailError::Build(e.to_string()))
}

/// Plain SMTP relay, no auth, no TLS (internal relay).
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> Result<Self, MailError> {
        let transport = SmtpTransport::builder_dangerous(cfg.mail_server.as_str())
            .port(cfg.port)
            .build();
        Ok(Self {
            transport,
            from: sender(cfg)?,
        })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, job: EmailJob) -> Result<(), MailError> {
        let message = build_message(&self.from, &job)?;
        self.transport
            .send(&message)
            .map_err(|e| MailError::Smtp(e.to_string()))?;

        info!(
            list = %job.list,
            recipients = job.recipients.len(),
            "Sent email with subject \"{}\"",
            job.subject
        );
        Ok(())
        // job (and its attachment file) dropped here on every path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::{init_test_dbs, insert_subscription, register_list};

    fn from() -> Mailbox {
        "Report Bot <noreply@example.com>".parse().unwrap()
    }

    fn job(recipients: &[&str], attachment: Option<TempAttachment>) -> EmailJob {
        EmailJob {
            list: "ops".into(),
            recipients: recipients.iter().map(|s| s.to_string()).collect(),
            subject: "STR Weekly Report - Raw Data".into(),
            html_body: "<p>Hello team!</p>".into(),
            attachment,
        }
    }

    #[test]
    fn recipients_are_subscribed_only_and_sorted() {
        let dbs = init_test_dbs();
        register_list(&dbs.listman, "ops");
        insert_subscription(&dbs.listman, "ops", "zed@example.com", true);
        insert_subscription(&dbs.listman, "ops", "amy@example.com", true);
        insert_subscription(&dbs.listman, "ops", "max@example.com", false);

        let got = resolve_recipients(&dbs.listman, "ops").unwrap();
        assert_eq!(got, ["amy@example.com", "zed@example.com"]);
    }

    #[test]
    fn message_carries_html_and_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("STR_Weekly_Report.xlsx");
        fs::write(&path, b"PK\x03\x04fake").unwrap();

        let j = job(&["a@example.com", "b@example.com"], Some(TempAttachment::new(&path)));
        let msg = build_message(&from(), &j).unwrap();
        let raw = String::from_utf8_lossy(&msg.formatted()).into_owned();

        assert!(raw.contains("Subject: STR Weekly Report - Raw Data"));
        assert!(raw.contains("a@example.com"));
        assert!(raw.contains("text/html"));
        assert!(raw.contains("application/octet-stream"));
        assert!(raw.contains("STR_Weekly_Report.xlsx"));

        drop(j);
        assert!(!path.exists(), "attachment must be deleted with the job");
    }

    #[test]
    fn empty_recipient_list_is_a_validation_error_and_still_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        fs::write(&path, b"x").unwrap();

        let mailer = SmtpMailer::new(&SmtpConfig::default()).unwrap();
        let err = mailer.send(job(&[], Some(TempAttachment::new(&path)))).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!path.exists());
    }
}
