use crate::db::DbError;
use crate::mailer::MailError;
use crate::periods::DateRange;
use crate::reports::{Cadence, ReportError};
use crate::retry::RetryError;
use crate::scraper::ScraperError;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "hotelops", version, about = "Mailing lists, job monitoring and report bots")]
pub struct Cli {
    /// TOML config file; missing files fall back to defaults and env vars.
    #[arg(long, global = true, default_value = "config/hotelops.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List manager and monitoring dashboard over HTTP.
    Serve,

    /// Run one report now.
    Report {
        #[command(subcommand)]
        report: ReportCommand,
    },

    /// Send an ad-hoc notice to a mailing list.
    Notify {
        #[arg(long)]
        list: String,
        #[arg(long)]
        subject: String,
        /// HTML allowed.
        #[arg(long)]
        message: String,
    },

    /// Run every job whose schedule window contains the current time.
    RunDue,
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// STR performance report for the four standard periods.
    Str {
        #[arg(long, value_enum, default_value_t = Cadence::Weekly)]
        cadence: Cadence,
    },

    /// Opera email collection quality.
    OperaEmailQuality {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Share of Opera bookings made by repeat guests.
    RepeatGuests {
        #[command(flatten)]
        range: RangeArgs,
    },
}

/// Arrival date range; both ends or neither (previous month).
#[derive(Debug, Clone, Args)]
pub struct RangeArgs {
    #[arg(long)]
    pub from: Option<NaiveDate>,
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl RangeArgs {
    pub fn resolve(&self) -> Result<Option<DateRange>, CliError> {
        match (self.from, self.to) {
            (None, None) => Ok(None),
            (Some(from), Some(to)) if from <= to => Ok(Some(DateRange { from, to })),
            (Some(from), Some(to)) => Err(CliError::Range(format!("--from {from} is after --to {to}"))),
            _ => Err(CliError::Range("give both --from and --to, or neither".into())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("database: {0}")]
    Db(#[from] DbError),

    #[error("bad server address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    #[error("server stopped: {0}")]
    Serve(#[source] std::io::Error),

    #[error("mailer: {0}")]
    Mail(#[from] MailError),

    #[error("portal client: {0}")]
    Scraper(#[from] ScraperError),

    #[error(transparent)]
    Report(#[from] RetryError<ReportError>),

    #[error("{0}")]
    Range(String),

    #[error("{0} scheduled job(s) failed")]
    JobsFailed(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_report_subcommands() {
        let cli = Cli::try_parse_from(["hotelops", "report", "str", "--cadence", "monthly"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Report { report: ReportCommand::Str { cadence: Cadence::Monthly } }
        ));
        assert_eq!(cli.config, "config/hotelops.toml");

        let cli = Cli::try_parse_from([
            "hotelops",
            "report",
            "opera-email-quality",
            "--from",
            "2024-02-01",
            "--to",
            "2024-02-29",
            "--config",
            "other.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, "other.toml");
        let Command::Report { report: ReportCommand::OperaEmailQuality { range } } = cli.command else {
            panic!("wrong command");
        };
        let r = range.resolve().unwrap().unwrap();
        assert_eq!(r.to, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn half_a_range_is_rejected() {
        let args = RangeArgs {
            from: NaiveDate::from_ymd_opt(2024, 2, 1),
            to: None,
        };
        assert!(matches!(args.resolve(), Err(CliError::Range(_))));

        let backwards = RangeArgs {
            from: NaiveDate::from_ymd_opt(2024, 3, 1),
            to: NaiveDate::from_ymd_opt(2024, 2, 1),
        };
        assert!(backwards.resolve().is_err());
    }

    #[test]
    fn notify_and_run_due_parse() {
        let cli = Cli::try_parse_from([
            "hotelops", "notify", "--list", "admin", "--subject", "s", "--message", "m",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Notify { .. }));
        assert!(matches!(
            Cli::try_parse_from(["hotelops", "run-due"]).unwrap().command,
            Command::RunDue
        ));
    }
}
