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

//! Epoch clock: maps wall-clock time onto epochs, bootstrap phases and countdowns.
//!
//! Every function takes `now` explicitly; nothing in here reads the system clock.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{IncentivesError, Result};

/// Time range for an epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochTimeRange {
    pub start_time: u64,
    /// Inclusive; one second before the next epoch starts.
    pub end_time: u64,
}

/// Epoch containing `now`, or [IncentivesError::BeforeGenesis].
pub fn try_current_epoch(now: u64, genesis: u64, epoch_duration: u64) -> Result<u64> {
    if now < genesis {
        return Err(IncentivesError::BeforeGenesis { now, genesis });
    }
    if epoch_duration == 0 {
        tracing::debug!("Zero epoch duration, reporting epoch 0");
        return Ok(0);
    }
    Ok((now - genesis) / epoch_duration)
}

/// Epoch containing `now`. Instants before genesis clamp to epoch 0.
pub fn current_epoch(now: u64, genesis: u64, epoch_duration: u64) -> u64 {
    match try_current_epoch(now, genesis, epoch_duration) {
        Ok(epoch) => epoch,
        Err(err) => {
            tracing::debug!("{err}, clamping to epoch 0");
            0
        }
    }
}

pub fn epoch_start(epoch: u64, genesis: u64, epoch_duration: u64) -> u64 {
    genesis.saturating_add(epoch.saturating_mul(epoch_duration))
}

pub fn epoch_time_range(epoch: u64, genesis: u64, epoch_duration: u64) -> EpochTimeRange {
    let start_time = epoch_start(epoch, genesis, epoch_duration);
    let end_time = start_time.saturating_add(epoch_duration.saturating_sub(1));
    EpochTimeRange { start_time, end_time }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpochPhase {
    Whitelisting,
    Deposit,
    Voting,
    Locked,
    Ended,
}

impl fmt::Display for EpochPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EpochPhase::Whitelisting => "Whitelisting",
            EpochPhase::Deposit => "Deposit",
            EpochPhase::Voting => "Voting",
            EpochPhase::Locked => "Locked",
            EpochPhase::Ended => "Ended",
        };
        f.write_str(name)
    }
}

/// A phase and the instants bounding it. `end` is exclusive and absent for [EpochPhase::Ended].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseWindow {
    pub phase: EpochPhase,
    pub start: u64,
    pub end: Option<u64>,
}

/// Phase durations, all in seconds and relative to the epoch start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSchedule {
    pub whitelist_duration: u64,
    pub vote_start_delay: u64,
    pub epoch_duration: u64,
    pub lock_duration: u64,
}

impl PhaseSchedule {
    fn intervals(&self, epoch_start: u64) -> [(EpochPhase, u64, u64); 4] {
        // Later boundaries never precede earlier ones; a misordered schedule yields empty phases.
        let whitelist_end = epoch_start.saturating_add(self.whitelist_duration);
        let vote_start = epoch_start.saturating_add(self.vote_start_delay).max(whitelist_end);
        let vote_end = epoch_start.saturating_add(self.epoch_duration).max(vote_start);
        let lock_end = vote_end.saturating_add(self.lock_duration);
        [
            (EpochPhase::Whitelisting, epoch_start, whitelist_end),
            (EpochPhase::Deposit, whitelist_end, vote_start),
            (EpochPhase::Voting, vote_start, vote_end),
            (EpochPhase::Locked, vote_end, lock_end),
        ]
    }

    /// Phase containing `now` for the epoch starting at `epoch_start`.
    ///
    /// Intervals are half-open. Instants before the epoch start map to the earliest non-empty
    /// phase; instants past the last interval are [EpochPhase::Ended].
    pub fn phase_at(&self, now: u64, epoch_start: u64) -> PhaseWindow {
        let intervals = self.intervals(epoch_start);

        let found = if now < epoch_start {
            intervals.iter().find(|(_, start, end)| start < end)
        } else {
            intervals.iter().find(|(_, start, end)| *start <= now && now < *end)
        };
        if let Some(&(phase, start, end)) = found {
            return PhaseWindow { phase, start, end: Some(end) };
        }

        PhaseWindow { phase: EpochPhase::Ended, start: intervals[3].2, end: None }
    }
}

/// Phase of `now` in the epoch starting at `epoch_start`, with no lock period after voting.
pub fn phase_of(
    now: u64,
    epoch_start: u64,
    whitelist_len: u64,
    vote_start_delay: u64,
    epoch_duration: u64,
) -> PhaseWindow {
    PhaseSchedule {
        whitelist_duration: whitelist_len,
        vote_start_delay,
        epoch_duration,
        lock_duration: 0,
    }
    .phase_at(now, epoch_start)
}

/// Time left until an instant. Never negative: a target in the past is [TimeRemaining::Ended].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    Remaining(Duration),
    Ended,
}

impl TimeRemaining {
    pub fn duration(&self) -> Duration {
        match self {
            TimeRemaining::Remaining(duration) => *duration,
            TimeRemaining::Ended => Duration::ZERO,
        }
    }

    pub fn has_ended(&self) -> bool {
        matches!(self, TimeRemaining::Ended)
    }
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRemaining::Ended => f.write_str("ended"),
            TimeRemaining::Remaining(duration) => {
                let secs = duration.as_secs();
                let (days, rest) = (secs / 86_400, secs % 86_400);
                let (hours, rest) = (rest / 3_600, rest % 3_600);
                let (minutes, seconds) = (rest / 60, rest % 60);
                write!(f, "{days}d {hours:02}h {minutes:02}m {seconds:02}s")
            }
        }
    }
}

pub fn time_remaining(now: u64, target: u64) -> TimeRemaining {
    if target < now {
        TimeRemaining::Ended
    } else {
        TimeRemaining::Remaining(Duration::from_secs(target - now))
    }
}

/// Countdown shown above the vote table.
pub fn vote_countdown(now: u64, vote_start: u64, vote_end: u64) -> String {
    let (label, target) =
        if now >= vote_start { ("ends in", vote_end) } else { ("starts in", vote_start) };
    match time_remaining(now, target) {
        TimeRemaining::Ended => "ended".to_string(),
        remaining => format!("{label} {remaining}"),
    }
}

/// A bootstrap period as read from the bootstrap contract. Zero timestamps are unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub begin: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodStatus {
    ComingSoon,
    /// `remaining` is `None` while the end is unset.
    Active { remaining: Option<TimeRemaining> },
    Ended,
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodStatus::ComingSoon => f.write_str("coming soon"),
            PeriodStatus::Active { remaining: Some(remaining) } => remaining.fmt(f),
            PeriodStatus::Active { remaining: None } => f.write_str("active"),
            PeriodStatus::Ended => f.write_str("ended"),
        }
    }
}

impl Period {
    pub fn status(&self, now: u64) -> PeriodStatus {
        if self.end > 0 && self.end < now {
            PeriodStatus::Ended
        } else if self.begin > 0 && self.begin < now {
            let remaining = (self.end > 0).then(|| time_remaining(now, self.end));
            PeriodStatus::Active { remaining }
        } else {
            PeriodStatus::ComingSoon
        }
    }
}

/// All periods exposed by the bootstrap contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapPeriods {
    pub whitelist: Period,
    pub incentive: Period,
    pub deposit: Period,
    pub vote: Period,
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_694_044_800;
    const EPOCH: u64 = 2_419_200;
    const WEEK: u64 = 604_800;

    #[test]
    fn test_current_epoch() {
        assert_eq!(current_epoch(T0, T0, EPOCH), 0);
        assert_eq!(current_epoch(T0 + EPOCH - 1, T0, EPOCH), 0);
        assert_eq!(current_epoch(T0 + EPOCH, T0, EPOCH), 1);
        assert_eq!(current_epoch(T0 + 5 * EPOCH + 17, T0, EPOCH), 5);
        assert_eq!(current_epoch(T0 - 1, T0, EPOCH), 0);
        assert_eq!(current_epoch(T0 + 10, T0, 0), 0);
        assert_eq!(
            try_current_epoch(T0 - 1, T0, EPOCH),
            Err(IncentivesError::BeforeGenesis { now: T0 - 1, genesis: T0 })
        );
    }

    #[test]
    fn test_epoch_time_range() {
        let range = epoch_time_range(2, T0, EPOCH);
        assert_eq!(range.start_time, T0 + 2 * EPOCH);
        assert_eq!(range.end_time, T0 + 3 * EPOCH - 1);
        assert_eq!(current_epoch(range.end_time, T0, EPOCH), 2);
    }

    #[test]
    fn test_phase_boundaries() {
        let s = T0;
        let phase = |now| phase_of(now, s, WEEK, 3 * WEEK, EPOCH).phase;
        assert_eq!(phase(s), EpochPhase::Whitelisting);
        assert_eq!(phase(s + WEEK - 1), EpochPhase::Whitelisting);
        assert_eq!(phase(s + WEEK), EpochPhase::Deposit);
        assert_eq!(phase(s + 3 * WEEK - 1), EpochPhase::Deposit);
        assert_eq!(phase(s + 3 * WEEK), EpochPhase::Voting);
        assert_eq!(phase(s + EPOCH - 1), EpochPhase::Voting);
        assert_eq!(phase(s + EPOCH), EpochPhase::Ended);
        // Uncovered instants before the start map to the first phase.
        assert_eq!(phase(s - 1), EpochPhase::Whitelisting);
    }

    #[test]
    fn test_phase_window_with_lock() {
        let schedule = PhaseSchedule {
            whitelist_duration: WEEK,
            vote_start_delay: 3 * WEEK,
            epoch_duration: EPOCH,
            lock_duration: 16 * WEEK,
        };
        let window = schedule.phase_at(T0 + EPOCH, T0);
        assert_eq!(window.phase, EpochPhase::Locked);
        assert_eq!(window.start, T0 + EPOCH);
        assert_eq!(window.end, Some(T0 + EPOCH + 16 * WEEK));

        let ended = schedule.phase_at(T0 + EPOCH + 16 * WEEK, T0);
        assert_eq!(ended.phase, EpochPhase::Ended);
        assert_eq!(ended.end, None);

        let voting = schedule.phase_at(T0 + 3 * WEEK + 5, T0);
        assert_eq!(
            voting,
            PhaseWindow { phase: EpochPhase::Voting, start: T0 + 3 * WEEK, end: Some(T0 + EPOCH) }
        );
    }

    #[test]
    fn test_phase_without_whitelist() {
        let window = phase_of(T0 - 100, T0, 0, 3 * WEEK, EPOCH);
        assert_eq!(window.phase, EpochPhase::Deposit);
        assert_eq!(window.start, T0);
    }

    #[test]
    fn test_time_remaining() {
        assert_eq!(time_remaining(100, 50), TimeRemaining::Ended);
        assert_eq!(time_remaining(100, 100), TimeRemaining::Remaining(Duration::ZERO));
        assert_eq!(time_remaining(0, 93_784).to_string(), "1d 02h 03m 04s");
        assert_eq!(time_remaining(10, 5).to_string(), "ended");
        assert_eq!(time_remaining(10, 5).duration(), Duration::ZERO);
    }

    #[test]
    fn test_vote_countdown() {
        assert_eq!(vote_countdown(0, 60, 120), "starts in 0d 00h 01m 00s");
        assert_eq!(vote_countdown(60, 60, 120), "ends in 0d 00h 01m 00s");
        assert_eq!(vote_countdown(200, 60, 120), "ended");
    }

    #[test]
    fn test_period_status() {
        assert_eq!(Period::default().status(1_000), PeriodStatus::ComingSoon);
        assert_eq!(Period { begin: 2_000, end: 3_000 }.status(1_000), PeriodStatus::ComingSoon);
        assert_eq!(
            Period { begin: 500, end: 3_000 }.status(1_000),
            PeriodStatus::Active {
                remaining: Some(TimeRemaining::Remaining(Duration::from_secs(2_000)))
            }
        );
        assert_eq!(Period { begin: 500, end: 900 }.status(1_000), PeriodStatus::Ended);
        assert_eq!(Period { begin: 500, end: 900 }.status(1_000).to_string(), "ended");
        assert_eq!(Period::default().status(1_000).to_string(), "coming soon");
    }

    #[test]
    fn test_period_without_end() {
        let open = Period { begin: 500, end: 0 }.status(1_000);
        assert_eq!(open, PeriodStatus::Active { remaining: None });
        assert_eq!(open.to_string(), "active");
    }
}
