use crate::cli::{Cli, CliError, Command, ReportCommand};
use crate::config::AppConfig;
use crate::db::connection::{init_db, Database};
use crate::mailer::SmtpMailer;
use crate::periods::DateRange;
use crate::reports::opera_quality::default_range;
use crate::reports::{
    due_jobs, notify, run_email_quality, run_repeat_guests, run_str_report, Cadence, Job,
};
use crate::retry::{with_retry, RetryPolicy};
use crate::router::{handle, AppState};
use crate::scraper::StrPortal;
use astra::Server;
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

mod cli;
mod config;
mod db;
mod domain;
mod errors;
mod listman;
mod logging;
mod mailer;
mod periods;
mod reports;
mod responses;
mod retry;
mod router;
mod scraper;
mod spreadsheets;
mod templates;

#[cfg(test)]
mod tests;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let cfg = match AppConfig::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ Failed to load config {}: {e}", cli.config);
            return ExitCode::FAILURE;
        }
    };

    // Keep the guard until exit so buffered log lines reach the file.
    let _log_guard = logging::init_logger(&cfg.logging);

    match run(cli.command, &cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, cfg: &AppConfig) -> Result<(), CliError> {
    let listman = Database::new(&cfg.database.listman_path);
    let warehouse = Database::new(&cfg.database.warehouse_path);
    if cfg.database.apply_schema {
        init_db(&listman, &cfg.database.listman_schema)?;
        init_db(&warehouse, &cfg.database.warehouse_schema)?;
    }
    let today = Local::now().date_naive();

    match command {
        Command::Serve => serve(cfg, listman, warehouse),

        Command::Report { report } => {
            let (job, range) = match report {
                ReportCommand::Str { cadence: Cadence::Weekly } => (Job::StrWeekly, None),
                ReportCommand::Str { cadence: Cadence::Monthly } => (Job::StrMonthly, None),
                ReportCommand::OperaEmailQuality { range } => {
                    (Job::OperaEmailQuality, range.resolve()?)
                }
                ReportCommand::RepeatGuests { range } => (Job::RepeatGuests, range.resolve()?),
            };
            run_job(job, cfg, &listman, &warehouse, today, range)
        }

        Command::Notify {
            list,
            subject,
            message,
        } => {
            let mailer = SmtpMailer::new(&cfg.smtp)?;
            with_retry("notify", &RetryPolicy::once(), || {
                notify(&listman, &mailer, &list, &subject, &message)
            })?;
            Ok(())
        }

        Command::RunDue => {
            let now = Local::now().naive_local();
            let due = due_jobs(&cfg.schedule, now);
            if due.is_empty() {
                info!("no jobs due at {now}");
                return Ok(());
            }

            let mut failed = 0;
            for job in due {
                if let Err(e) = run_job(job, cfg, &listman, &warehouse, today, None) {
                    error!(%job, "{e}");
                    failed += 1;
                }
            }
            if failed > 0 {
                return Err(CliError::JobsFailed(failed));
            }
            Ok(())
        }
    }
}

fn run_job(
    job: Job,
    cfg: &AppConfig,
    listman: &Database,
    warehouse: &Database,
    today: NaiveDate,
    range: Option<DateRange>,
) -> Result<(), CliError> {
    let name = job.to_string();
    let mailer = SmtpMailer::new(&cfg.smtp)?;
    info!(job = %name, "starting");

    match job {
        Job::StrWeekly | Job::StrMonthly => {
            let cadence = if job == Job::StrWeekly {
                Cadence::Weekly
            } else {
                Cadence::Monthly
            };
            let policy = RetryPolicy::new(
                cfg.reports.retries,
                Duration::from_secs(cfg.reports.backoff_base_secs),
            );
            let mut portal = StrPortal::new(&cfg.str_portal, &cfg.reports.download_dir)?;
            with_retry(&name, &policy, || {
                run_str_report(cfg, warehouse, listman, &mut portal, &mailer, cadence, today)
            })?;
        }
        Job::OperaEmailQuality => {
            let range = range.unwrap_or_else(|| default_range(today));
            with_retry(&name, &RetryPolicy::once(), || {
                run_email_quality(cfg, warehouse, listman, &mailer, range)
            })?;
        }
        Job::RepeatGuests => {
            let range = range.unwrap_or_else(|| default_range(today));
            with_retry(&name, &RetryPolicy::once(), || {
                run_repeat_guests(cfg, listman, &mailer, range)
            })?;
        }
    }

    info!(job = %name, "finished");
    Ok(())
}

fn serve(cfg: &AppConfig, listman: Database, warehouse: Database) -> Result<(), CliError> {
    let addr = cfg.server.socket_addr()?;
    let state = AppState {
        listman,
        warehouse,
        listman_cfg: cfg.listman.clone(),
    };

    info!("Starting server at http://{addr}");
    let server = Server::bind(addr).max_workers(cfg.server.max_workers);

    server
        .serve(move |req, _info| match handle(req, &state) {
            Ok(resp) => resp,
            Err(err) => templates::html_error_response(err),
        })
        .map_err(CliError::Serve)?;

    info!("Server shut down cleanly.");
    Ok(())
}
