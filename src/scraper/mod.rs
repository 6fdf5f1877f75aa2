mod form;
mod portal;
mod scraper_error;

use crate::db::property_map::StrHotel;
use crate::domain::Segment;
use crate::periods::DateRange;
use std::path::PathBuf;

pub use form::{find_link, AspNetForm};
pub use portal::{attachment_name, offered_hotels, StrPortal};
pub use scraper_error::ScraperError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportScope {
    /// One file per hotel.
    Properties,
    /// One file for all hotels against their comp sets.
    Portfolio,
    /// One file for all hotels against an industry segment.
    IndustrySegment(Segment),
}

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub scope: ReportScope,
    pub hotels: Vec<StrHotel>,
    pub range: DateRange,
}

/// Something that turns report requests into spreadsheet files on disk.
pub trait ReportDownloader {
    fn download(&mut self, req: &ReportRequest) -> Result<Vec<PathBuf>, ScraperError>;
}
