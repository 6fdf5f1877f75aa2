use crate::db::connection::{init_db, Database, DbError};
use crate::mailer::{EmailJob, MailError, Mailer};
use rust_xlsxwriter::Workbook;
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

/// A listman and a warehouse database in their own temp dir, schemas applied.
///
/// Keep the struct alive for as long as the databases are used; dropping it
/// removes the directory.
pub struct TestDbs {
    pub dir: TempDir,
    pub listman: Database,
    pub warehouse: Database,
}

/// Initialize fresh test DBs using the production schemas
pub fn init_test_dbs() -> TestDbs {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));

    let listman = Database::new(dir.path().join("listman.sqlite3"));
    let warehouse = Database::new(dir.path().join("warehouse.sqlite3"));

    init_db(&listman, schema("listman.sql"))
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    init_db(&warehouse, schema("warehouse.sql"))
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    TestDbs {
        dir,
        listman,
        warehouse,
    }
}

fn schema(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("sql").join(name)
}

pub fn register_list(db: &Database, listname: &str) {
    db.with_conn(|conn| {
        conn.execute(
            "insert into cfg_mail_lists (listname, description) values (?1, '')",
            [listname],
        )
        .map_err(DbError::from)
    })
    .unwrap();
}

pub fn insert_subscription(db: &Database, listname: &str, email: &str, subscribed: bool) {
    db.with_conn(|conn| {
        conn.execute(
            "insert into mail_list (listname, email, subscribed, last_update)
             values (?1, ?2, ?3, '2024-01-01 00:00:00')",
            rusqlite::params![listname, email, subscribed],
        )
        .map_err(DbError::from)
    })
    .unwrap();
}

/// A `feh` hotel with an STR id; its new code is `N` + hotel code.
pub fn insert_property(db: &Database, hotel_code: &str, str_id: &str, name: &str, country: &str) {
    db.with_conn(|conn| {
        conn.execute(
            "insert into cfg_map_properties
             (hotel_code, new_code, str_hotel_id, str_hotel_name, operator, asset_type, country)
             values (?1, ?2, ?3, ?4, 'feh', 'hotel', ?5)",
            rusqlite::params![hotel_code, format!("N{hotel_code}"), str_id, name, country],
        )
        .map_err(DbError::from)
    })
    .unwrap();
}

/// STAR-like export: labels in B2/B3, headers on row 7, one weekly line and
/// the Period line. A blank column sits after the first value.
pub fn write_star_report(path: &Path, property_label: &str, segment_label: &str, values: &[f64]) {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.write_string(0, 0, "STAR Report").unwrap();
    ws.write_string(1, 1, property_label).unwrap();
    if !segment_label.is_empty() {
        ws.write_string(2, 1, segment_label).unwrap();
    }

    ws.write_string(6, 0, "Date").unwrap();
    for (row, label, offset) in [(7u32, "Mon 04/03", 1000.0), (8u32, "Period", 0.0)] {
        ws.write_string(row, 0, label).unwrap();
        let mut col: u16 = 1;
        for (i, v) in values.iter().enumerate() {
            if i == 1 {
                col += 1;
            }
            ws.write_number(row, col, v + offset).unwrap();
            col += 1;
        }
    }
    wb.save(path).unwrap();
}

/// Opera field mapping workbook: title row, header row, then code/label pairs.
pub fn write_field_labels(path: &Path, sheet: &str) {
    let pairs = [
        ("C1", "Resort"),
        ("C2", "Confirmation Number"),
        ("C3", "Email"),
        ("C4", "First Name"),
        ("C5", "Last Name"),
        ("C6", "Market Code"),
        ("C7", "Rate Code"),
        ("C8", "VIP Code"),
        ("C9", "Arrival Date"),
        ("C10", "Reservation Status"),
        ("C11", "Stayed Room Type"),
    ];
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name(sheet).unwrap();
    ws.write_string(0, 0, "Opera field mapping").unwrap();
    ws.write_string(1, 0, "code").unwrap();
    ws.write_string(1, 1, "name").unwrap();
    for (i, (code, name)) in pairs.iter().enumerate() {
        ws.write_string(i as u32 + 2, 0, *code).unwrap();
        ws.write_string(i as u32 + 2, 1, *name).unwrap();
    }
    wb.save(path).unwrap();
}

#[derive(Debug, Clone)]
pub struct SentAttachment {
    pub name: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub list: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub attachment: Option<SentAttachment>,
}

/// Keeps every job instead of talking SMTP. Rejects empty recipient lists
/// the way the real mailer does.
#[derive(Default)]
pub struct RecordingMailer {
    sent: RefCell<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.borrow().clone()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, job: EmailJob) -> Result<(), MailError> {
        if job.recipients.is_empty() {
            return Err(MailError::NoRecipients(job.list.clone()));
        }
        let attachment = job.attachment.as_ref().map(|a| SentAttachment {
            name: a.file_name().to_string(),
            path: a.path().to_path_buf(),
            bytes: fs::read(a.path()).unwrap_or_default(),
        });
        self.sent.borrow_mut().push(SentMail {
            list: job.list.clone(),
            recipients: job.recipients.clone(),
            subject: job.subject.clone(),
            html_body: job.html_body.clone(),
            attachment,
        });
        Ok(())
    }
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.0.lock().map_err(|_| io::Error::other("poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuf {
    type Writer = SharedBuf;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with a thread-local subscriber and returns everything it logged.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buf = SharedBuf::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buf.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    let out = tracing::subscriber::with_default(subscriber, f);

    let bytes = buf.0.lock().map(|b| b.clone()).unwrap_or_default();
    (out, String::from_utf8_lossy(&bytes).into_owned())
}
