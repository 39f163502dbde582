//! Timestamp normalization for bitable date fields
//!
//! Bitable date fields take milliseconds since the Unix epoch. Worksheet cells
//! carry dates as text in several layouts, as calendar date-times, or as plain
//! numbers (spreadsheet serials, epoch seconds or epoch milliseconds).
//!
//! Text is run through an ordered list of strategies; the first strategy that
//! recognizes the input wins. Zone-less values are wall-clock times in the
//! configured fixed offset (UTC+8 by default).

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::workbook::Cell;

/// Default timezone offset for zone-less dates
pub const DEFAULT_OFFSET_HOURS: i32 = 8;

/// Numbers strictly inside this range are treated as spreadsheet serial days.
/// The bounds cover 1954-10-03 .. 2173-10-14; values outside are never serials.
const SERIAL_MIN: f64 = 20_000.0;
const SERIAL_MAX: f64 = 100_000.0;
/// Above this a number is already epoch milliseconds (1973-03-03 onwards).
/// Epoch seconds only pass it after the year 5000.
const MILLIS_THRESHOLD: f64 = 100_000_000_000.0;
/// Above this (and below the millisecond threshold) a number is epoch seconds
const SECONDS_THRESHOLD: f64 = 1_000_000_000.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Day zero of the spreadsheet serial calendar (with the 1900 leap-year bug folded in)
static SERIAL_EPOCH: Lazy<NaiveDateTime> = Lazy::new(|| {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
});

static LOOSE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})\s*[-/.年]\s*(\d{1,2})\s*[-/.月]\s*(\d{1,2})\s*日?$")
        .expect("loose date pattern is valid")
});

/// Why a value could not be turned into a timestamp
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampError {
    /// Blank cell or empty string
    Blank,
    /// No text strategy recognized the string
    UnrecognizedText(String),
    /// The number is neither a serial nor an epoch value
    UnrecognizedNumber(f64),
    /// The cell type cannot carry a date
    UnsupportedCell(String),
    /// The date exists but cannot be represented
    OutOfRange(String),
    /// Offset hours outside -23..=23
    InvalidOffset(i32),
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimestampError::Blank => write!(f, "no date value present"),
            TimestampError::UnrecognizedText(s) => write!(f, "unable to parse date string '{}'", s),
            TimestampError::UnrecognizedNumber(n) => {
                write!(f, "unable to determine the date format of number {}", n)
            }
            TimestampError::UnsupportedCell(kind) => {
                write!(f, "cell of type {} cannot hold a date", kind)
            }
            TimestampError::OutOfRange(s) => write!(f, "date '{}' is out of range", s),
            TimestampError::InvalidOffset(h) => write!(f, "invalid timezone offset {}h", h),
        }
    }
}

impl std::error::Error for TimestampError {}

/// Result of a text strategy that recognized its input
#[derive(Debug, Clone, PartialEq)]
enum Parsed {
    /// Wall-clock time, interpreted in the normalizer's offset
    Local(NaiveDateTime),
    /// Instant with an explicit offset
    Absolute(DateTime<FixedOffset>),
    /// Numeric text, handled by the numeric rules
    Number(f64),
}

type TextStrategy = fn(&str) -> Option<Parsed>;

/// Text strategies in priority order
const TEXT_STRATEGIES: &[(&str, TextStrategy)] = &[
    ("datetime", parse_literal_datetime),
    ("iso8601", parse_iso8601),
    ("date", parse_literal_date),
    ("loose-date", parse_loose_date),
    ("numeric", parse_numeric_text),
];

fn parse_literal_datetime(s: &str) -> Option<Parsed> {
    ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(Parsed::Local)
}

fn parse_iso8601(s: &str) -> Option<Parsed> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Parsed::Absolute(dt));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(Parsed::Local)
}

fn parse_literal_date(s: &str) -> Option<Parsed> {
    ["%Y-%m-%d", "%Y年%m月%d日"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| Parsed::Local(d.and_time(NaiveTime::MIN)))
}

fn parse_loose_date(s: &str) -> Option<Parsed> {
    let caps = LOOSE_DATE.captures(s)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    let day = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(|d| Parsed::Local(d.and_time(NaiveTime::MIN)))
}

fn parse_numeric_text(s: &str) -> Option<Parsed> {
    s.parse::<f64>().ok().filter(|n| n.is_finite()).map(Parsed::Number)
}

/// Convert a spreadsheet serial day number to a calendar date-time.
///
/// The integer part counts days from 1899-12-30, the fraction is the time of
/// day (rounded to the nearest second).
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.trunc();
    let seconds = ((serial - days) * SECONDS_PER_DAY).round();
    SERIAL_EPOCH
        .checked_add_signed(Duration::try_days(days as i64)?)?
        .checked_add_signed(Duration::try_seconds(seconds as i64)?)
}

/// Converts cells and strings to bitable millisecond timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampNormalizer {
    offset: FixedOffset,
}

impl Default for TimestampNormalizer {
    fn default() -> Self {
        Self {
            offset: FixedOffset::east_opt(DEFAULT_OFFSET_HOURS * 3600)
                .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid")),
        }
    }
}

impl TimestampNormalizer {
    /// Create a normalizer for a whole-hour offset east of UTC
    pub fn new(offset_hours: i32) -> Result<Self, TimestampError> {
        if !(-23..=23).contains(&offset_hours) {
            return Err(TimestampError::InvalidOffset(offset_hours));
        }
        let offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or(TimestampError::InvalidOffset(offset_hours))?;
        Ok(Self { offset })
    }

    /// Normalize a worksheet cell
    pub fn from_cell(&self, cell: &Cell) -> Result<i64, TimestampError> {
        match cell {
            Cell::Empty => Err(TimestampError::Blank),
            Cell::Text(s) => self.from_text(s),
            Cell::Number(n) => self.from_number(*n),
            Cell::Date(dt) => self.from_datetime(*dt),
            Cell::Bool(_) => Err(TimestampError::UnsupportedCell("bool".to_string())),
        }
    }

    /// Normalize a date string by trying each text strategy in order
    pub fn from_text(&self, input: &str) -> Result<i64, TimestampError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TimestampError::Blank);
        }

        for (name, strategy) in TEXT_STRATEGIES {
            if let Some(parsed) = strategy(trimmed) {
                log::trace!("Date '{}' matched strategy {}", trimmed, name);
                return match parsed {
                    Parsed::Local(dt) => self.from_datetime(dt),
                    Parsed::Absolute(dt) => Ok(dt.timestamp_millis()),
                    Parsed::Number(n) => self.from_number(n),
                };
            }
        }

        Err(TimestampError::UnrecognizedText(trimmed.to_string()))
    }

    /// Normalize a wall-clock date-time in the configured offset
    pub fn from_datetime(&self, dt: NaiveDateTime) -> Result<i64, TimestampError> {
        self.offset
            .from_local_datetime(&dt)
            .single()
            .map(|local| local.timestamp_millis())
            .ok_or_else(|| TimestampError::OutOfRange(dt.to_string()))
    }

    /// Normalize a number: serial day, epoch milliseconds or epoch seconds
    pub fn from_number(&self, n: f64) -> Result<i64, TimestampError> {
        if !n.is_finite() {
            return Err(TimestampError::UnrecognizedNumber(n));
        }
        if n > SERIAL_MIN && n < SERIAL_MAX {
            let dt = serial_to_datetime(n).ok_or_else(|| TimestampError::OutOfRange(n.to_string()))?;
            return self.from_datetime(dt);
        }
        if n > MILLIS_THRESHOLD {
            return Ok(n as i64);
        }
        if n > SECONDS_THRESHOLD {
            return Ok((n * 1000.0) as i64);
        }
        Err(TimestampError::UnrecognizedNumber(n))
    }

    /// Calendar date (`YYYY-MM-DD`) of a millisecond timestamp in this offset
    pub fn date_string(&self, millis: i64) -> Option<String> {
        self.offset
            .timestamp_millis_opt(millis)
            .single()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2023-03-15 00:00:00 at UTC+8
    const MAR_15_2023_CST: i64 = 1_678_809_600_000;

    #[test]
    fn test_serial_matches_calendar_string() {
        let n = TimestampNormalizer::default();
        assert_eq!(n.from_number(45000.0).unwrap(), MAR_15_2023_CST);
        assert_eq!(n.from_text("2023-03-15").unwrap(), MAR_15_2023_CST);
    }

    #[test]
    fn test_millisecond_output_is_idempotent() {
        let n = TimestampNormalizer::default();
        for input in [
            "2024-03-15 10:30:00",
            "2024/03/15 10:30:00",
            "2024年3月15日",
            "2024-03-15T08:00:00Z",
            "1995-06-01",
            "1980-01-01 00:00:00",
        ] {
            let millis = n.from_text(input).unwrap();
            assert_eq!(n.from_number(millis as f64).unwrap(), millis, "input {}", input);
        }
    }

    #[test]
    fn test_literal_formats_agree() {
        let n = TimestampNormalizer::default();
        let a = n.from_text("2024-03-15 10:30:00").unwrap();
        let b = n.from_text("2024/03/15 10:30:00").unwrap();
        let c = n.from_text("2024-03-15T10:30:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_explicit_offset_is_not_adjusted() {
        let n = TimestampNormalizer::default();
        assert_eq!(n.from_text("2023-03-14T16:00:00Z").unwrap(), MAR_15_2023_CST);
        assert_eq!(n.from_text("2023-03-15T00:00:00+08:00").unwrap(), MAR_15_2023_CST);
    }

    #[test]
    fn test_chinese_and_loose_dates() {
        let n = TimestampNormalizer::default();
        assert_eq!(n.from_text("2023年03月15日").unwrap(), MAR_15_2023_CST);
        assert_eq!(n.from_text("2023年3月15日").unwrap(), MAR_15_2023_CST);
        assert_eq!(n.from_text(" 2023/3/15 ").unwrap(), MAR_15_2023_CST);
        assert_eq!(n.from_text("2023.3.15").unwrap(), MAR_15_2023_CST);
    }

    #[test]
    fn test_numeric_text_uses_number_rules() {
        let n = TimestampNormalizer::default();
        assert_eq!(n.from_text("45000").unwrap(), MAR_15_2023_CST);
    }

    #[test]
    fn test_epoch_seconds_and_millis() {
        let n = TimestampNormalizer::default();
        assert_eq!(n.from_number(1_700_000_000.0).unwrap(), 1_700_000_000_000);
        assert_eq!(n.from_number(1_700_000_000_123.0).unwrap(), 1_700_000_000_123);
        assert_eq!(n.from_number(801_936_000_000.0).unwrap(), 801_936_000_000);
    }

    #[test]
    fn test_unrecognized_inputs_fail() {
        let n = TimestampNormalizer::default();
        assert!(matches!(n.from_number(123.0), Err(TimestampError::UnrecognizedNumber(_))));
        assert!(matches!(n.from_text("next tuesday"), Err(TimestampError::UnrecognizedText(_))));
        assert!(matches!(n.from_text("   "), Err(TimestampError::Blank)));
        assert!(matches!(n.from_text("2023-02-30"), Err(TimestampError::UnrecognizedText(_))));
        assert!(n.from_cell(&Cell::Bool(true)).is_err());
    }

    #[test]
    fn test_serial_fraction_is_time_of_day() {
        let dt = serial_to_datetime(45000.5).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-03-15 12:00:00");
    }

    #[test]
    fn test_custom_offset() {
        let utc = TimestampNormalizer::new(0).unwrap();
        assert_eq!(utc.from_text("2023-03-15").unwrap(), MAR_15_2023_CST + 8 * 3_600_000);
        assert!(TimestampNormalizer::new(30).is_err());
    }

    #[test]
    fn test_date_cell_and_date_string() {
        let n = TimestampNormalizer::default();
        let dt = NaiveDate::from_ymd_opt(2023, 3, 15).unwrap().and_time(NaiveTime::MIN);
        let millis = n.from_cell(&Cell::Date(dt)).unwrap();
        assert_eq!(millis, MAR_15_2023_CST);
        assert_eq!(n.date_string(millis).unwrap(), "2023-03-15");
    }
}
