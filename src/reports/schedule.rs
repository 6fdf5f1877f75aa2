// reports/schedule.rs
use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Jobs `run-due` knows how to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Job {
    StrWeekly,
    StrMonthly,
    OperaEmailQuality,
    RepeatGuests,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Job::StrWeekly => "str-weekly",
            Job::StrMonthly => "str-monthly",
            Job::OperaEmailQuality => "opera-email-quality",
            Job::RepeatGuests => "repeat-guests",
        };
        f.write_str(s)
    }
}

/// One `[[schedule]]` entry: `job` runs when "now" falls in
/// `start <= t < end`. A window whose end is before its start wraps past
/// midnight. Empty `weekdays` / `month_days` mean every day.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleWindow {
    pub job: Job,
    #[serde(deserialize_with = "time_of_day")]
    pub start: NaiveTime,
    #[serde(deserialize_with = "time_of_day")]
    pub end: NaiveTime,
    #[serde(default)]
    pub weekdays: Vec<Weekday>,
    #[serde(default)]
    pub month_days: Vec<u32>,
}

impl ScheduleWindow {
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        let t = now.time();
        let in_time = if self.start <= self.end {
            self.start <= t && t < self.end
        } else {
            t >= self.start || t < self.end
        };

        in_time
            && (self.weekdays.is_empty() || self.weekdays.contains(&now.weekday()))
            && (self.month_days.is_empty() || self.month_days.contains(&now.day()))
    }
}

/// Jobs whose window contains `now`, in config order, each at most once.
pub fn due_jobs(windows: &[ScheduleWindow], now: NaiveDateTime) -> Vec<Job> {
    let mut out = Vec::new();
    for w in windows.iter().filter(|w| w.contains(now)) {
        if !out.contains(&w.job) {
            out.push(w.job);
        }
    }
    out
}

fn time_of_day<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
    let s = String::deserialize(d)?;
    NaiveTime::parse_from_str(&s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M"))
        .map_err(|_| serde::de::Error::custom(format!("expected HH:MM or HH:MM:SS, got '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn window(job: Job, start: NaiveTime, end: NaiveTime) -> ScheduleWindow {
        ScheduleWindow {
            job,
            start,
            end,
            weekdays: Vec::new(),
            month_days: Vec::new(),
        }
    }

    #[test]
    fn start_is_inclusive_end_is_exclusive() {
        let w = window(Job::OperaEmailQuality, hm(3, 0), hm(3, 30));
        assert!(w.contains(at(2024, 3, 4, 3, 0)));
        assert!(w.contains(at(2024, 3, 4, 3, 29)));
        assert!(!w.contains(at(2024, 3, 4, 3, 30)));
        assert!(!w.contains(at(2024, 3, 4, 2, 59)));
    }

    #[test]
    fn window_can_wrap_midnight() {
        let w = window(Job::RepeatGuests, hm(23, 30), hm(0, 30));
        assert!(w.contains(at(2024, 3, 4, 23, 45)));
        assert!(w.contains(at(2024, 3, 5, 0, 15)));
        assert!(!w.contains(at(2024, 3, 5, 1, 0)));
    }

    #[test]
    fn weekday_and_month_day_filters() {
        let mut weekly = window(Job::StrWeekly, hm(8, 0), hm(8, 30));
        weekly.weekdays = vec![Weekday::Mon];
        // 2024-03-04 is a Monday.
        assert!(weekly.contains(at(2024, 3, 4, 8, 10)));
        assert!(!weekly.contains(at(2024, 3, 5, 8, 10)));

        let mut monthly = window(Job::StrMonthly, hm(9, 0), hm(9, 30));
        monthly.month_days = vec![1];
        assert!(monthly.contains(at(2024, 4, 1, 9, 0)));
        assert!(!monthly.contains(at(2024, 4, 2, 9, 0)));
    }

    #[test]
    fn due_jobs_keeps_config_order_without_duplicates() {
        let windows = vec![
            window(Job::StrWeekly, hm(8, 0), hm(9, 0)),
            window(Job::OperaEmailQuality, hm(8, 0), hm(8, 30)),
            window(Job::StrWeekly, hm(8, 15), hm(8, 45)),
            window(Job::RepeatGuests, hm(10, 0), hm(11, 0)),
        ];
        let due = due_jobs(&windows, at(2024, 3, 4, 8, 20));
        assert_eq!(due, [Job::StrWeekly, Job::OperaEmailQuality]);
    }

    #[test]
    fn deserializes_from_toml_config() {
        let toml = r#"
            [[schedule]]
            job = "str-weekly"
            start = "08:00"
            end = "08:30:00"
            weekdays = ["Mon"]
        "#;
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap();
        let windows: Vec<ScheduleWindow> = cfg.get("schedule").unwrap();

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].job, Job::StrWeekly);
        assert_eq!(windows[0].start, hm(8, 0));
        assert_eq!(windows[0].end, hm(8, 30));
        assert_eq!(windows[0].weekdays, [Weekday::Mon]);
    }
}
