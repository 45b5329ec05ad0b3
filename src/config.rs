//! Run configuration
//!
//! Every knob that changes what a run produces lives here, with the defaults spelled out, so
//! that a published result can be reproduced from the flags it was made with.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::errors::*;

/// Where the neutral band sits. Scores in `[lower, upper]` are neutral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds { lower: -0.1, upper: 0.1 }
    }
}

impl Thresholds {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        let t = Thresholds { lower, upper };
        t.validate()?;
        Ok(t)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "thresholds must be finite numbers, got [{}, {}]", self.lower, self.upper)));
        }
        if self.lower > self.upper {
            return Err(Error::InvalidConfig(format!(
                "lower threshold {} is above upper threshold {}", self.lower, self.upper)));
        }
        Ok(())
    }
}

/// How coarsely tweets are grouped in time for the secondary summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    None,
    Hour,
    Day,
    Month,
}

/// Timestamp layouts we try, in order, before giving up on a cell
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

impl TimeBucket {
    /// Label for the bucket a timestamp falls in, or None if the timestamp can't be parsed
    pub fn bucket(&self, timestamp: &str) -> Option<String> {
        let pattern = match *self {
            TimeBucket::None => return None,
            TimeBucket::Hour => "%Y-%m-%dT%H",
            TimeBucket::Day => "%Y-%m-%d",
            TimeBucket::Month => "%Y-%m",
        };
        parse_timestamp(timestamp).map(|when| when.format(pattern).to_string())
    }
}

impl FromStr for TimeBucket {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(TimeBucket::None),
            "hour" => Ok(TimeBucket::Hour),
            "day" => Ok(TimeBucket::Day),
            "month" => Ok(TimeBucket::Month),
            other => Err(Error::InvalidConfig(format!(
                "unknown time bucket {:?}, expected none, hour, day or month", other))),
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            TimeBucket::None => "none",
            TimeBucket::Hour => "hour",
            TimeBucket::Day => "day",
            TimeBucket::Month => "month",
        };
        write!(f, "{}", name)
    }
}

/// Parse the timestamp formats seen in tweet dumps. Offsets are dropped, not converted.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(when) = DateTime::parse_from_rfc3339(raw) {
        return Some(when.naive_local());
    }
    for format in NAIVE_FORMATS {
        if let Ok(when) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(when);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
}

/// Everything a run needs besides the input and output locations
#[derive(Debug, Clone)]
pub struct Config {
    pub text_column: String,
    pub id_column: String,
    pub author_column: String,
    pub timestamp_column: String,
    /// Columns copied to the output untouched, when the input has them
    pub language_column: String,
    pub country_column: String,
    pub likes_column: String,
    pub shares_column: String,
    pub thresholds: Thresholds,
    pub time_bucket: TimeBucket,
    /// Rows handed to the thread pool at once
    pub partition_size: usize,
    /// Cleaned texts shorter than this (in chars) are rejected. 0 disables the check.
    pub min_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            text_column: "content".to_string(),
            id_column: "id".to_string(),
            author_column: "author".to_string(),
            timestamp_column: "date_time".to_string(),
            language_column: "language".to_string(),
            country_column: "country".to_string(),
            likes_column: "number_of_likes".to_string(),
            shares_column: "number_of_shares".to_string(),
            thresholds: Thresholds::default(),
            time_bucket: TimeBucket::Day,
            partition_size: 10_000,
            min_chars: 0,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        if self.partition_size == 0 {
            return Err(Error::InvalidConfig("partition size must be at least 1".to_string()));
        }
        if self.text_column.trim().is_empty() {
            return Err(Error::InvalidConfig("the text column needs a name".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
        assert_eq!(Thresholds::default(), Thresholds { lower: -0.1, upper: 0.1 });
    }

    #[test]
    fn inverted_or_nan_thresholds_are_rejected() {
        assert!(Thresholds::new(0.2, -0.2).is_err());
        assert!(Thresholds::new(::std::f64::NAN, 0.1).is_err());
        assert!(Thresholds::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn zero_partition_size_is_rejected() {
        let config = Config { partition_size: 0, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn buckets_from_common_layouts() {
        assert_eq!(TimeBucket::Day.bucket("12/05/2017 18:46"), Some("2017-05-12".to_string()));
        assert_eq!(TimeBucket::Hour.bucket("2017-05-12 18:46:03"), Some("2017-05-12T18".to_string()));
        assert_eq!(TimeBucket::Month.bucket("2017-05-12T18:46:03Z"), Some("2017-05".to_string()));
        assert_eq!(TimeBucket::Day.bucket("2017-05-12"), Some("2017-05-12".to_string()));
        assert_eq!(TimeBucket::Day.bucket("yesterday"), None);
        assert_eq!(TimeBucket::None.bucket("2017-05-12"), None);
    }

    #[test]
    fn bucket_names_parse() {
        assert_eq!("Hour".parse::<TimeBucket>().unwrap(), TimeBucket::Hour);
        assert!("week".parse::<TimeBucket>().is_err());
    }
}
