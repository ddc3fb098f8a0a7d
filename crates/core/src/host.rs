//! Host-side helpers consumed by a turn: the clock and the input formatter.

use chrono::{Local, NaiveDateTime};

/// Source of the current local date and time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// Date as the host renders it, e.g. `10/16/2026`.
    fn date_string(&self) -> String {
        self.now().format("%-m/%-d/%Y").to_string()
    }

    /// Time as the host renders it, e.g. `9:05:00 AM`.
    fn time_string(&self) -> String {
        self.now().format("%-I:%M:%S %p").to_string()
    }
}

/// The machine's local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Normalises user input before it enters the message log.
pub trait ResponseFormatter: Send + Sync {
    fn format(&self, text: &str) -> String;
}

/// Trims the text, normalises line endings and collapses runs of blank lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl ResponseFormatter for DefaultFormatter {
    fn format(&self, text: &str) -> String {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut out = String::with_capacity(normalized.len());
        let mut blank_run = 0;
        for line in normalized.trim().lines() {
            let line = line.trim_end();
            if line.is_empty() {
                blank_run += 1;
                if blank_run > 1 {
                    continue;
                }
            } else {
                blank_run = 0;
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(line);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2026, 3, 7)
                .unwrap()
                .and_hms_opt(14, 5, 9)
                .unwrap(),
        )
    }

    #[test]
    fn fixed_clock_formats_date_and_time() {
        let clock = clock();
        assert_eq!(clock.date_string(), "3/7/2026");
        assert_eq!(clock.time_string(), "2:05:09 PM");
    }

    #[test]
    fn formatter_trims_and_collapses_blank_lines() {
        let f = DefaultFormatter;
        assert_eq!(f.format("  hello  "), "hello");
        assert_eq!(f.format("a\r\n\r\n\r\n\r\nb"), "a\n\nb");
        assert_eq!(f.format("2+2?"), "2+2?");
    }

    #[test]
    fn formatter_is_idempotent() {
        let f = DefaultFormatter;
        let once = f.format("  line one  \n\n\n line two\n");
        assert_eq!(f.format(&once), once);
    }
}
