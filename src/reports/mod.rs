//! Report jobs: each one gathers data, renders the basic email frame and
//! sends it to a mailing list.

pub mod admin;
pub mod opera_quality;
pub mod schedule;
pub mod str_perf;

use crate::db::connection::{Database, DbError};
use crate::errors::{Classify, ErrorKind};
use crate::mailer::{resolve_recipients, EmailJob, MailError, Mailer, TempAttachment};
use crate::periods::DateRange;
use crate::scraper::ScraperError;
use crate::spreadsheets::opera::OperaError;
use crate::spreadsheets::str_report::NormalizeError;
use crate::spreadsheets::ExportError;
use crate::templates::{render, TemplateError, TemplateParams};
use std::path::PathBuf;
use tracing::info;

pub use admin::notify;
pub use opera_quality::{run_email_quality, run_repeat_guests};
pub use schedule::{due_jobs, Job, ScheduleWindow};
pub use str_perf::{run_str_report, Cadence};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Scraper(#[from] ScraperError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Opera(#[from] OperaError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("cannot write checkpoint {}: {source}", path.display())]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no bookings with arrival dates {0}")]
    NoData(DateRange),
}

impl Classify for ReportError {
    fn kind(&self) -> ErrorKind {
        match self {
            ReportError::Db(e) => e.kind(),
            ReportError::Scraper(e) => e.kind(),
            ReportError::Normalize(e) => e.kind(),
            ReportError::Opera(e) => e.kind(),
            ReportError::Template(e) => e.kind(),
            ReportError::Mail(e) => e.kind(),
            ReportError::Export(_) | ReportError::Checkpoint { .. } | ReportError::Io { .. } => {
                ErrorKind::Transient
            }
            ReportError::NoData(_) => ErrorKind::DataShape,
        }
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> ReportError {
    let path = path.into();
    move |source| ReportError::Io { path, source }
}

/// Renders `params` into the basic frame and mails it to every active
/// subscriber of `list`. The attachment, if any, is gone afterwards.
pub fn send_to_list<M: Mailer>(
    listman: &Database,
    mailer: &M,
    list: &str,
    subject: &str,
    params: &TemplateParams,
    attachment: Option<TempAttachment>,
) -> Result<(), ReportError> {
    let html_body = render(crate::templates::email::BASIC_FRAME, params)?;
    let recipients = resolve_recipients(listman, list)?;
    info!(list, recipients = recipients.len(), "sending \"{subject}\"");

    mailer.send(EmailJob {
        list: list.to_string(),
        recipients,
        subject: subject.to_string(),
        html_body,
        attachment,
    })?;
    Ok(())
}
