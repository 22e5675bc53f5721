//! Date bounds over shard ids.

use quarry_core::{shard_date, Error, Result};

/// Inclusive `yyyyMMdd` day bounds for a scan.
///
/// A shard is inside the range when its day prefix falls between the bounds.
/// Shards without a day prefix are never inside a range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardRange {
    begin: String,
    end: String,
}

impl ShardRange {
    /// Creates a range from two `yyyyMMdd` days.
    pub fn new(begin: impl Into<String>, end: impl Into<String>) -> Result<Self> {
        let begin = begin.into();
        let end = end.into();
        for day in [&begin, &end] {
            if day.len() != 8 || shard_date(day).is_none() {
                return Err(Error::invalid_argument(format!(
                    "shard range bound '{day}' is not a yyyyMMdd day"
                )));
            }
        }
        if begin > end {
            return Err(Error::invalid_argument(format!(
                "shard range begins after it ends ({begin} > {end})"
            )));
        }
        Ok(Self { begin, end })
    }

    /// Creates a range covering a single day.
    pub fn day(day: impl Into<String>) -> Result<Self> {
        let day = day.into();
        Self::new(day.clone(), day)
    }

    /// Returns the first day of the range.
    pub fn begin(&self) -> &str {
        &self.begin
    }

    /// Returns the last day of the range.
    pub fn end(&self) -> &str {
        &self.end
    }

    /// Returns true if the shard's day falls within the range.
    pub fn contains(&self, shard: &str) -> bool {
        match shard_date(shard) {
            Some(day) => day >= self.begin.as_str() && day <= self.end.as_str(),
            None => false,
        }
    }

    /// Returns true if every shard after `shard` is past the end of the range.
    pub fn is_past_end(&self, shard: &str) -> bool {
        shard_date(shard).is_some_and(|day| day > self.end.as_str())
    }
}
