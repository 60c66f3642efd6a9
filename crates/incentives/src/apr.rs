// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Yield estimation: projects an amount streamed over a window into an annual percentage.

use alloy_primitives::U256;
use chrono::{DateTime, Datelike, Days, FixedOffset, Offset, TimeZone, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};

use crate::{
    error::{IncentivesError, Result},
    token::TokenAmount,
};

/// 365.25 days.
pub const SECONDS_PER_YEAR: u64 = 31_557_600;

/// `streamed * SECONDS_PER_YEAR / window_seconds / unlocked * 100`.
///
/// Zero when `unlocked` is zero or the window is not a positive number of seconds.
pub fn estimate_apr(streamed: Decimal, unlocked: Decimal, window_seconds: f64) -> f64 {
    estimate_apr_f64(
        streamed.to_f64().unwrap_or(f64::NAN),
        unlocked.to_f64().unwrap_or(f64::NAN),
        window_seconds,
    )
}

/// Float variant of [estimate_apr]; NaN and infinite inputs yield zero.
pub fn estimate_apr_f64(streamed: f64, unlocked: f64, window_seconds: f64) -> f64 {
    if !streamed.is_finite() || !unlocked.is_finite() || unlocked == 0.0 {
        return 0.0;
    }
    if !window_seconds.is_finite() || window_seconds <= 0.0 {
        return 0.0;
    }
    let apr = streamed * SECONDS_PER_YEAR as f64 / window_seconds / unlocked;
    apr * 100.0
}

/// How the weekly accrual window is measured. Weeks run Sunday to Saturday 23:59:59 in the
/// caller's time zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WeekWindowPolicy {
    /// From `now` until the end of the week.
    #[default]
    RemainingInWeek,
    /// From this week's Sunday, at the current time of day, until the end of the week.
    SundayAnchored,
}

/// Length in seconds of the weekly window containing `now`, never negative.
pub fn week_window_seconds<Tz: TimeZone>(now: &DateTime<Tz>, policy: WeekWindowPolicy) -> f64 {
    let local = now.naive_local();
    let from_sunday = u64::from(local.weekday().num_days_from_sunday());

    let Some(week_end) = local
        .date()
        .checked_add_days(Days::new(6 - from_sunday))
        .and_then(|date| date.and_hms_opt(23, 59, 59))
    else {
        return 0.0;
    };
    let start = match policy {
        WeekWindowPolicy::RemainingInWeek => local,
        WeekWindowPolicy::SundayAnchored => {
            match local.date().checked_sub_days(Days::new(from_sunday)) {
                Some(sunday) => sunday.and_time(local.time()),
                None => return 0.0,
            }
        }
    };

    let tz = now.timezone();
    let start_instant = match policy {
        WeekWindowPolicy::RemainingInWeek => Some(now.clone()),
        WeekWindowPolicy::SundayAnchored => tz.from_local_datetime(&start).earliest(),
    };
    // Local times skipped by a DST transition fall back to wall-clock arithmetic.
    let window = match (start_instant, tz.from_local_datetime(&week_end).earliest()) {
        (Some(start), Some(end)) => end.signed_duration_since(start),
        _ => week_end.signed_duration_since(start),
    };

    (window.num_milliseconds() as f64 / 1000.0).max(0.0)
}

/// `timestamp` as seen at a fixed offset from UTC. Offsets of a day or more fall back to UTC.
pub fn local_datetime(timestamp: u64, utc_offset_seconds: i32) -> Result<DateTime<FixedOffset>> {
    let seconds =
        i64::try_from(timestamp).map_err(|_| IncentivesError::InvalidTimestamp(timestamp))?;
    let utc = DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or(IncentivesError::InvalidTimestamp(timestamp))?;
    let offset = FixedOffset::east_opt(utc_offset_seconds).unwrap_or_else(|| {
        tracing::warn!("Ignoring invalid UTC offset {utc_offset_seconds}s");
        Utc.fix()
    });
    Ok(utc.with_timezone(&offset))
}

/// Amounts reported by the staked vault's `get_amounts`, both with 18 decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAmounts {
    pub streaming: U256,
    pub unlocked: U256,
}

/// APR of the staked vault, annualizing this week's streamed rewards.
pub fn estimate_stream_apr<Tz: TimeZone>(
    amounts: &StreamAmounts,
    now: &DateTime<Tz>,
    policy: WeekWindowPolicy,
) -> f64 {
    let streaming = TokenAmount::from_wei(amounts.streaming).normalized_or_zero();
    let unlocked = TokenAmount::from_wei(amounts.unlocked).normalized_or_zero();
    let window = week_window_seconds(now, policy);
    tracing::debug!("Stream APR over {window}s window: streaming {streaming}, unlocked {unlocked}");
    estimate_apr(streaming, unlocked, window)
}

/// Render a percentage with a fixed number of decimals; non-finite values render as zero.
pub fn format_percent(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{value:.decimals$}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: f64 = 604_800.0;

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = expected.abs() * 1e-9;
        assert!((actual - expected).abs() <= tolerance, "{actual} != {expected}");
    }

    #[test]
    fn test_estimate_apr_weekly_scenario() {
        let apr = estimate_apr(Decimal::from(7), Decimal::from(1000), WEEK);
        assert_close(apr, 7.0 * 31_557_600.0 / 604_800.0 / 1000.0 * 100.0);
        assert_close(apr, 36.525);
    }

    #[test]
    fn test_estimate_apr_zero_guards() {
        assert_eq!(estimate_apr(Decimal::ZERO, Decimal::from(1000), WEEK), 0.0);
        assert_eq!(estimate_apr(Decimal::from(7), Decimal::ZERO, WEEK), 0.0);
        assert_eq!(estimate_apr(Decimal::from(7), Decimal::from(1000), 0.0), 0.0);
        assert_eq!(estimate_apr(Decimal::from(7), Decimal::from(1000), -5.0), 0.0);
        assert_eq!(estimate_apr_f64(f64::NAN, 1000.0, WEEK), 0.0);
        assert_eq!(estimate_apr_f64(7.0, f64::NAN, WEEK), 0.0);
        assert_eq!(estimate_apr_f64(7.0, 1000.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn test_week_window_remaining() {
        // Wednesday 2023-09-13 12:00:00 UTC
        let now = Utc.with_ymd_and_hms(2023, 9, 13, 12, 0, 0).unwrap();
        let expected = 3.0 * 86_400.0 + 11.0 * 3_600.0 + 59.0 * 60.0 + 59.0;
        assert_eq!(week_window_seconds(&now, WeekWindowPolicy::RemainingInWeek), expected);
    }

    #[test]
    fn test_week_window_sunday_anchored() {
        let now = Utc.with_ymd_and_hms(2023, 9, 13, 12, 0, 0).unwrap();
        let expected = 6.0 * 86_400.0 + 11.0 * 3_600.0 + 59.0 * 60.0 + 59.0;
        assert_eq!(week_window_seconds(&now, WeekWindowPolicy::SundayAnchored), expected);

        // Month boundary: Tuesday 2023-10-03, week started Sunday 2023-10-01.
        let now = Utc.with_ymd_and_hms(2023, 10, 3, 23, 59, 59).unwrap();
        assert_eq!(week_window_seconds(&now, WeekWindowPolicy::SundayAnchored), 6.0 * 86_400.0);
    }

    #[test]
    fn test_week_window_uses_local_calendar() {
        // Saturday 23:30 UTC is already Sunday 01:30 at +02:00.
        let utc = Utc.with_ymd_and_hms(2023, 9, 16, 23, 30, 0).unwrap();
        let remaining = week_window_seconds(&utc, WeekWindowPolicy::RemainingInWeek);
        assert_eq!(remaining, 29.0 * 60.0 + 59.0);

        let local = utc.with_timezone(&FixedOffset::east_opt(2 * 3_600).unwrap());
        let expected = 6.0 * 86_400.0 + 22.0 * 3_600.0 + 29.0 * 60.0 + 59.0;
        assert_eq!(week_window_seconds(&local, WeekWindowPolicy::RemainingInWeek), expected);
    }

    #[test]
    fn test_week_window_never_negative() {
        let now = Utc.with_ymd_and_hms(2023, 9, 16, 23, 59, 59).unwrap();
        assert_eq!(week_window_seconds(&now, WeekWindowPolicy::RemainingInWeek), 0.0);
    }

    #[test]
    fn test_stream_apr() {
        let eth = U256::from(10u64).pow(U256::from(18));
        let amounts = StreamAmounts {
            streaming: eth * U256::from(7u64),
            unlocked: eth * U256::from(1000u64),
        };
        // Sunday 00:00:00 UTC: a full week minus one second remains.
        let now = Utc.with_ymd_and_hms(2023, 9, 10, 0, 0, 0).unwrap();
        let apr = estimate_stream_apr(&amounts, &now, WeekWindowPolicy::RemainingInWeek);
        assert_close(apr, 7.0 * 31_557_600.0 / (WEEK - 1.0) / 1000.0 * 100.0);

        let empty = StreamAmounts::default();
        assert_eq!(estimate_stream_apr(&empty, &now, WeekWindowPolicy::SundayAnchored), 0.0);
    }

    #[test]
    fn test_local_datetime() {
        let local = local_datetime(1_694_649_600, 2 * 3_600).unwrap();
        assert_eq!(local.to_rfc3339(), "2023-09-14T02:00:00+02:00");
        assert_eq!(local_datetime(1_694_649_600, 90_000).unwrap().offset().local_minus_utc(), 0);
        assert_eq!(local_datetime(u64::MAX, 0), Err(IncentivesError::InvalidTimestamp(u64::MAX)));
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(36.525, 4), "36.5250%");
        assert_eq!(format_percent(f64::NAN, 2), "0.00%");
    }
}
