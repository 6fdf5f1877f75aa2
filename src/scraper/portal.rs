// scraper/portal.rs
use crate::config::StrPortalConfig;
use crate::db::property_map::StrHotel;
use crate::domain::Segment;
use crate::periods::DateRange;
use crate::scraper::form::{find_link, AspNetForm};
use crate::scraper::{ReportDownloader, ReportRequest, ReportScope, ScraperError};
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

const LOGIN_PAGE: &str = "ReportsOnline.aspx";
const USERNAME: &str = "username";
const PASSWORD: &str = "password";
const REPORTS_MENU: &str = "#menu-reports a";

const CENSUS_ID: &str = "ctl00_CensusID";
const PROPERTY_MULTI: &str = "ctl00_ContentPlaceHolder1_sProperty";
const INCLUDE_DUPS: &str = "ctl00_ContentPlaceHolder1_ckIncDups";
const START_DATE: &str = "ctl00_ContentPlaceHolder1_txtStartDate";
const END_DATE: &str = "ctl00_ContentPlaceHolder1_txtEndDate";
const SUBMIT: &str = "ctl00_ContentPlaceHolder1_btnSubmit2";
const SEGMENT_RADIO: &str = "ctl00_ContentPlaceHolder1_rbIndSegment";
const SEGMENT_SELECT: &str = "ctl00_ContentPlaceHolder1_sSelectGrp2Segment";
const SEGMENT_APPLY: &str = "ctl00_ContentPlaceHolder1_btnGrp2Select";

const FALLBACK_NAME: &str = "STR_OnlineReport.xls";

/// Drives the STR client portal over plain HTTP with a cookie session.
///
/// A download is finished when the response body has been fully written;
/// the file only appears under its final name after that.
pub struct StrPortal {
    client: Client,
    base_url: Url,
    userid: String,
    password: String,
    date_format: String,
    download_dir: PathBuf,
    pause: Duration,
    report_page: Option<Url>,
    last_submit: Option<Instant>,
    saved: u32,
}

impl StrPortal {
    pub fn new(cfg: &StrPortalConfig, download_dir: &Path) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;

        let base_url = Url::parse(&cfg.base_url)
            .map_err(|e| ScraperError::HtmlParse(format!("bad base_url {}: {e}", cfg.base_url)))?;

        Ok(Self {
            client,
            base_url,
            userid: cfg.userid.clone(),
            password: cfg.password.clone(),
            date_format: cfg.date_format.clone(),
            download_dir: download_dir.to_path_buf(),
            pause: Duration::from_secs(cfg.request_pause_secs),
            report_page: None,
            last_submit: None,
            saved: 0,
        })
    }

    fn get_page(&self, url: &Url) -> Result<(Url, String), ScraperError> {
        let resp = self.client.get(url.clone()).send()?;
        read_page(resp)
    }

    fn post_page(&mut self, url: &Url, fields: &[(String, String)]) -> Result<(Url, String), ScraperError> {
        self.wait_turn();
        let resp = self.client.post(url.clone()).form(fields).send()?;
        read_page(resp)
    }

    /// Logs in once per session and remembers the report page.
    fn ensure_logged_in(&mut self) -> Result<Url, ScraperError> {
        if let Some(url) = &self.report_page {
            return Ok(url.clone());
        }

        let login_url = self
            .base_url
            .join(LOGIN_PAGE)
            .map_err(|e| ScraperError::HtmlParse(e.to_string()))?;
        let (page_url, html) = self.get_page(&login_url)?;

        let mut form = AspNetForm::parse(&html, &page_url, Some(PASSWORD))?;
        form.set(USERNAME, &self.userid)?;
        form.set(PASSWORD, &self.password)?;
        let fields = form.fields().to_vec();
        let (landing_url, landing) = self.post_page(&form.action, &fields)?;

        if AspNetForm::parse(&landing, &landing_url, Some(PASSWORD)).is_ok() {
            return Err(ScraperError::LoginRejected);
        }

        let reports = find_link(&landing, &landing_url, REPORTS_MENU)?;
        info!(portal = %self.base_url, "logged in to STR");
        self.report_page = Some(reports.clone());
        Ok(reports)
    }

    /// Fresh copy of the report selection form (new view state each time).
    fn report_form(&mut self) -> Result<AspNetForm, ScraperError> {
        let url = self.ensure_logged_in()?;
        let (page_url, html) = self.get_page(&url)?;
        AspNetForm::parse(&html, &page_url, Some(SUBMIT))
    }

    fn wait_turn(&mut self) {
        if let Some(last) = self.last_submit {
            let elapsed = last.elapsed();
            if elapsed < self.pause {
                std::thread::sleep(self.pause - elapsed);
            }
        }
        self.last_submit = Some(Instant::now());
    }

    fn submit_for_download(&mut self, form: &AspNetForm, label: &str) -> Result<PathBuf, ScraperError> {
        let fields = form.submission(SUBMIT)?;
        self.wait_turn();
        let resp = self.client.post(form.action.clone()).form(&fields).send()?;
        self.save_download(resp, label)
    }

    fn save_download(&mut self, mut resp: Response, label: &str) -> Result<PathBuf, ScraperError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ScraperError::Http {
                status: status.as_u16(),
                url: resp.url().to_string(),
            });
        }

        let content_type = header_str(&resp, CONTENT_TYPE.as_str());
        let disposition = header_str(&resp, CONTENT_DISPOSITION.as_str());
        let seq = self.saved + 1;
        let path = store_download(&self.download_dir, seq, &content_type, &disposition, &mut resp, label)?;
        self.saved = seq;
        Ok(path)
    }

    fn download_properties(&mut self, hotels: &[StrHotel], range: &DateRange) -> Result<Vec<PathBuf>, ScraperError> {
        let form = self.report_form()?;
        let wanted: Vec<StrHotel> = offered_hotels(&form, CENSUS_ID, hotels)
            .into_iter()
            .cloned()
            .collect();

        let mut files = Vec::new();
        for hotel in &wanted {
            info!("DOWNLOADING STR REPORT (PROPERTY): {}", hotel.str_hotel_name);
            let mut form = self.report_form()?;
            form.set(CENSUS_ID, &hotel.str_hotel_id)?;
            fill_dates(&mut form, range, &self.date_format)?;
            files.push(self.submit_for_download(&form, &hotel.str_hotel_name)?);
        }
        Ok(files)
    }

    fn download_portfolio(
        &mut self,
        hotels: &[StrHotel],
        range: &DateRange,
        segment: Option<Segment>,
    ) -> Result<PathBuf, ScraperError> {
        let label = match segment {
            Some(s) => format!("IND_SEG: {s}"),
            None => "ALL".to_string(),
        };
        info!("DOWNLOADING STR REPORT ({label})");

        let mut form = self.report_form()?;
        let ids: Vec<String> = offered_hotels(&form, PROPERTY_MULTI, hotels)
            .iter()
            .map(|h| h.str_hotel_id.clone())
            .collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        fill_portfolio(&mut form, &id_refs, range, &self.date_format)?;

        if let Some(segment) = segment {
            let fields = segment_postback(&mut form, segment)?;
            let action = form.action.clone();
            let (page_url, html) = self.post_page(&action, &fields)?;
            debug!(segment = %segment, "segment applied");

            form = AspNetForm::parse(&html, &page_url, Some(SUBMIT))?;
            fill_portfolio(&mut form, &id_refs, range, &self.date_format)?;
        }

        self.submit_for_download(&form, &label)
    }
}

impl ReportDownloader for StrPortal {
    fn download(&mut self, req: &ReportRequest) -> Result<Vec<PathBuf>, ScraperError> {
        match req.scope {
            ReportScope::Properties => self.download_properties(&req.hotels, &req.range),
            ReportScope::Portfolio => Ok(vec![self.download_portfolio(&req.hotels, &req.range, None)?]),
            ReportScope::IndustrySegment(seg) => {
                Ok(vec![self.download_portfolio(&req.hotels, &req.range, Some(seg))?])
            }
        }
    }
}

fn fill_dates(form: &mut AspNetForm, range: &DateRange, date_format: &str) -> Result<(), ScraperError> {
    form.set(START_DATE, &range.from.format(date_format).to_string())?;
    form.set(END_DATE, &range.to.format(date_format).to_string())?;
    Ok(())
}

/// Selects the portfolio hotels and the date range. Duplicates stay excluded.
fn fill_portfolio(
    form: &mut AspNetForm,
    ids: &[&str],
    range: &DateRange,
    date_format: &str,
) -> Result<(), ScraperError> {
    form.set_all(PROPERTY_MULTI, ids)?;
    if form.has_element(INCLUDE_DUPS) {
        form.clear(INCLUDE_DUPS)?;
    }
    fill_dates(form, range, date_format)
}

/// Post-back that switches the comparison to an industry segment. The
/// portal answers with a fresh form that must be filled again.
fn segment_postback(form: &mut AspNetForm, segment: Segment) -> Result<Vec<(String, String)>, ScraperError> {
    form.check(SEGMENT_RADIO)?;
    form.set(SEGMENT_SELECT, segment.option_value())?;
    form.submission(SEGMENT_APPLY)
}

/// Streams `body` into `dir` as `{seq:03}_{name}`. It is written under a
/// `.part` name and renamed once the whole body has arrived, so a file with
/// its final name is always complete. An HTML page in place of a
/// spreadsheet is rejected before anything touches the disk.
pub fn store_download(
    dir: &Path,
    seq: u32,
    content_type: &str,
    disposition: &str,
    body: &mut impl Read,
    label: &str,
) -> Result<PathBuf, ScraperError> {
    if content_type.trim_start().to_ascii_lowercase().starts_with("text/html") {
        return Err(ScraperError::NoDownload(format!("{label}: got an HTML page")));
    }

    let final_path = dir.join(format!("{seq:03}_{}", download_file_name(disposition)));
    let part_path = final_path.with_extension("part");

    fs::create_dir_all(dir)?;
    let written = File::create(&part_path).and_then(|mut file| {
        let bytes = io::copy(body, &mut file)?;
        file.sync_all()?;
        Ok(bytes)
    });
    let bytes = match written {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = fs::remove_file(&part_path);
            return Err(e.into());
        }
    };
    fs::rename(&part_path, &final_path)?;

    info!(report = label, file = %final_path.display(), bytes, "download complete");
    Ok(final_path)
}

/// Name for a saved report. Anything that is not `.xls`/`.xlsx` gets `.xls`
/// appended so the normalizer picks it up.
pub fn download_file_name(disposition: &str) -> String {
    let name = attachment_name(disposition).unwrap_or_else(|| FALLBACK_NAME.to_string());
    let is_sheet = Path::new(&name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xls") || e.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);
    if is_sheet {
        name
    } else {
        warn!(name = %name, "download has no spreadsheet extension, saving as .xls");
        format!("{name}.xls")
    }
}

fn read_page(resp: Response) -> Result<(Url, String), ScraperError> {
    let status = resp.status();
    let url = resp.url().clone();
    if !status.is_success() {
        return Err(ScraperError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok((url, resp.text()?))
}

fn header_str(resp: &Response, name: &str) -> String {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Hotels the select actually offers; the rest are skipped with a warning.
pub fn offered_hotels<'a>(form: &AspNetForm, select_id: &str, hotels: &'a [StrHotel]) -> Vec<&'a StrHotel> {
    hotels
        .iter()
        .filter(|h| {
            let ok = form.offers(select_id, &h.str_hotel_id);
            if !ok {
                warn!(
                    hotel = %h.str_hotel_name,
                    str_id = %h.str_hotel_id,
                    "hotel not offered by the portal, skipping"
                );
            }
            ok
        })
        .collect()
}

/// File name from a `Content-Disposition` header, without any directory part.
pub fn attachment_name(header: &str) -> Option<String> {
    let raw = header
        .split(';')
        .map(str::trim)
        .find_map(|p| p.strip_prefix("filename="))?
        .trim_matches('"');
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}
