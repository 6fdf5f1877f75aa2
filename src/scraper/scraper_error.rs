use crate::errors::{Classify, ErrorKind};
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum ScraperError {
    Network(String),
    Http { status: u16, url: String },
    HtmlParse(String),
    ElementMissing(String),
    LoginRejected,
    NoDownload(String),
    Io(String),
}

impl fmt::Display for ScraperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScraperError::Network(msg) => write!(f, "Network error: {msg}"),
            ScraperError::Http { status, url } => write!(f, "HTTP {status} from {url}"),
            ScraperError::HtmlParse(msg) => write!(f, "HTML parse error: {msg}"),
            ScraperError::ElementMissing(id) => write!(f, "Page element not found: #{id}"),
            ScraperError::LoginRejected => write!(f, "Portal rejected the configured credentials"),
            ScraperError::NoDownload(msg) => write!(f, "Submission returned no spreadsheet: {msg}"),
            ScraperError::Io(msg) => write!(f, "Download write failed: {msg}"),
        }
    }
}

impl Error for ScraperError {}

impl From<reqwest::Error> for ScraperError {
    fn from(e: reqwest::Error) -> Self {
        ScraperError::Network(e.to_string())
    }
}

impl From<std::io::Error> for ScraperError {
    fn from(e: std::io::Error) -> Self {
        ScraperError::Io(e.to_string())
    }
}

impl Classify for ScraperError {
    fn kind(&self) -> ErrorKind {
        match self {
            ScraperError::LoginRejected => ErrorKind::Validation,
            ScraperError::HtmlParse(_) => ErrorKind::DataShape,
            // The portal is flaky; everything else is worth another run.
            _ => ErrorKind::Transient,
        }
    }
}
