use crate::reports::schedule::ScheduleWindow;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Everything the binary needs, loaded once in `main` and passed down.
///
/// Sources, later ones winning: built-in defaults, the TOML file named on
/// the command line (optional), then `HOTELOPS__SECTION__KEY` environment
/// variables (after `.env` has been loaded).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub smtp: SmtpConfig,
    pub listman: ListmanConfig,
    pub logging: LoggingConfig,
    pub reports: ReportsConfig,
    pub str_portal: StrPortalConfig,
    pub opera: OperaConfig,
    pub schedule: Vec<ScheduleWindow>,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<AppConfig, ConfigError> {
        dotenvy::dotenv().ok();

        let builder = Config::builder()
            .add_source(ConfigFile::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("HOTELOPS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        builder.try_deserialize::<AppConfig>()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_workers: 8,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Two databases: subscriptions live apart from the data warehouse.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub listman_path: PathBuf,
    pub warehouse_path: PathBuf,
    pub listman_schema: PathBuf,
    pub warehouse_schema: PathBuf,
    /// Apply the schema files at start-up (`create table if not exists`).
    pub apply_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            listman_path: PathBuf::from("listman.sqlite3"),
            warehouse_path: PathBuf::from("warehouse.sqlite3"),
            listman_schema: PathBuf::from("sql/listman.sql"),
            warehouse_schema: PathBuf::from("sql/warehouse.sql"),
            apply_schema: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub mail_server: String,
    pub port: u16,
    pub from_name: String,
    pub from_email: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            mail_server: "localhost".to_string(),
            port: 25,
            from_name: "Report Bot".to_string(),
            from_email: "noreply@localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListmanConfig {
    /// Only addresses at these domains may subscribe.
    pub allowed_domains: Vec<String>,
    /// Public URL shown in the usage message.
    pub public_url: String,
}

impl Default for ListmanConfig {
    fn default() -> Self {
        Self {
            allowed_domains: vec!["example.com".to_string()],
            public_url: "http://localhost:3000/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            file_prefix: "hotelops.log".to_string(),
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    pub download_dir: PathBuf,
    /// Consumed downloads are moved here instead of being deleted.
    pub archive_dir: Option<PathBuf>,
    /// Generated attachments and checkpoints.
    pub temp_dir: PathBuf,
    pub retries: u32,
    pub backoff_base_secs: u64,
    pub str_list: String,
    pub opera_email_quality_list: String,
    pub repeat_guest_list: String,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            archive_dir: Some(PathBuf::from("downloads/archive")),
            temp_dir: PathBuf::from("temp"),
            retries: 3,
            backoff_base_secs: 1,
            str_list: "str_perf_rpt_weekly".to_string(),
            opera_email_quality_list: "op_email_quality_monitor".to_string(),
            repeat_guest_list: "op_repeat_guest_monitor".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrPortalConfig {
    pub base_url: String,
    pub userid: String,
    pub password: String,
    /// Pause between two submissions, in seconds.
    pub request_pause_secs: u64,
    pub timeout_secs: u64,
    /// chrono format for the start/end date boxes.
    pub date_format: String,
    /// Only properties in this country take part in portfolio reports.
    pub portfolio_country: String,
    pub operator: String,
}

impl Default for StrPortalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://clients.str.com/".to_string(),
            userid: String::new(),
            password: String::new(),
            request_pause_secs: 3,
            timeout_secs: 120,
            date_format: "%Y-%m-%d".to_string(),
            portfolio_country: "SG".to_string(),
            operator: "feh".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OperaConfig {
    pub data_dir: PathBuf,
    pub mapping_file: PathBuf,
    pub mapping_sheet: String,
    /// Operator whose hotel codes are translated to new codes.
    pub operator: String,
}

impl Default for OperaConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("opera"),
            mapping_file: PathBuf::from("config/opera_field_mapping.xlsx"),
            mapping_sheet: "Sheet2".to_string(),
            operator: "feh".to_string(),
        }
    }
}
