//! Minute time bucket

use chrono::{DateTime, Datelike, Timelike, Utc};
use contracts::{ContractError, TimeBucketer};

/// Maps epoch milliseconds onto `yyyyMMddHHmm` (UTC)
#[derive(Debug, Clone, Copy, Default)]
pub struct MinuteTimeBucket;

impl TimeBucketer for MinuteTimeBucket {
    fn minute_bucket(&self, epoch_millis: i64) -> Result<i64, ContractError> {
        let time = DateTime::<Utc>::from_timestamp_millis(epoch_millis)
            .ok_or(ContractError::TimeBucket { epoch_millis })?;

        Ok(i64::from(time.year()) * 100_000_000
            + i64::from(time.month()) * 1_000_000
            + i64::from(time.day()) * 10_000
            + i64::from(time.hour()) * 100
            + i64::from(time.minute()))
    }
}
