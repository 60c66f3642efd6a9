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

use anyhow::ensure;
use clap::Args;
use derive_builder::Builder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{AggregationParams, YieldBasis},
    apr::WeekWindowPolicy,
    epoch::{current_epoch, epoch_time_range, EpochTimeRange, PhaseSchedule, PhaseWindow},
    error::MAX_DECIMALS,
    token::DEFAULT_DECIMALS,
};

/// Timing and display parameters of a bootstrap deployment.
// NOTE: See https://github.com/clap-rs/clap/issues/5092#issuecomment-1703980717 about clap usage.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Builder, Args, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Unix timestamp at which epoch 0 starts.
    #[clap(long, env, default_value_t = MAINNET.genesis_timestamp)]
    #[builder(default = "MAINNET.genesis_timestamp")]
    pub genesis_timestamp: u64,

    /// Length of an epoch, in seconds.
    #[clap(long, env, default_value_t = MAINNET.epoch_duration)]
    #[builder(default = "MAINNET.epoch_duration")]
    pub epoch_duration: u64,

    /// Length of the whitelisting phase at the start of each epoch, in seconds.
    #[clap(long, env, default_value_t = MAINNET.whitelist_duration)]
    #[builder(default = "MAINNET.whitelist_duration")]
    pub whitelist_duration: u64,

    /// Offset from the epoch start at which voting opens, in seconds.
    #[clap(long, env, default_value_t = MAINNET.vote_start_delay)]
    #[builder(default = "MAINNET.vote_start_delay")]
    pub vote_start_delay: u64,

    /// Lock period following the epoch, in seconds.
    #[clap(long, env, default_value_t = MAINNET.lock_duration)]
    #[builder(default = "MAINNET.lock_duration")]
    pub lock_duration: u64,

    /// Decimals of the vote token.
    #[clap(long, env, default_value_t = DEFAULT_DECIMALS)]
    #[builder(default = "DEFAULT_DECIMALS")]
    pub vote_decimals: u8,

    /// How the weekly window of the staked-token APR is measured.
    #[clap(long, env, value_enum, default_value_t = WeekWindowPolicy::RemainingInWeek)]
    #[builder(default)]
    pub week_window: WeekWindowPolicy,

    /// List LSTs that have votes but no incentives.
    #[clap(long, env, action = clap::ArgAction::Set, default_value_t = true)]
    #[builder(default = "true")]
    pub include_idle_lsts: bool,
}

impl BootstrapConfig {
    /// Create a new [BootstrapConfigBuilder].
    pub fn builder() -> BootstrapConfigBuilder {
        Default::default()
    }

    /// Check that the phases fit in an epoch.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.epoch_duration > 0, "epoch duration must be positive");
        ensure!(
            self.whitelist_duration <= self.vote_start_delay,
            "whitelisting ({}s) must end before voting starts ({}s)",
            self.whitelist_duration,
            self.vote_start_delay
        );
        ensure!(
            self.vote_start_delay <= self.epoch_duration,
            "voting must start within the epoch ({}s > {}s)",
            self.vote_start_delay,
            self.epoch_duration
        );
        ensure!(
            self.vote_decimals <= MAX_DECIMALS,
            "vote token decimals {} exceed {MAX_DECIMALS}",
            self.vote_decimals
        );
        Ok(())
    }

    pub fn schedule(&self) -> PhaseSchedule {
        PhaseSchedule {
            whitelist_duration: self.whitelist_duration,
            vote_start_delay: self.vote_start_delay,
            epoch_duration: self.epoch_duration,
            lock_duration: self.lock_duration,
        }
    }

    pub fn current_epoch(&self, now: u64) -> u64 {
        current_epoch(now, self.genesis_timestamp, self.epoch_duration)
    }

    pub fn epoch_time_range(&self, epoch: u64) -> EpochTimeRange {
        epoch_time_range(epoch, self.genesis_timestamp, self.epoch_duration)
    }

    /// Phase of `epoch` at `now`.
    pub fn phase_at(&self, now: u64, epoch: u64) -> PhaseWindow {
        self.schedule().phase_at(now, self.epoch_time_range(epoch).start_time)
    }

    /// Incentives accrue over one epoch.
    pub fn yield_basis(&self, vote_unit_price_usd: Decimal) -> YieldBasis {
        YieldBasis { vote_unit_price_usd, window_seconds: self.epoch_duration as f64 }
    }

    pub fn aggregation_params(&self, vote_unit_price_usd: Decimal) -> AggregationParams {
        AggregationParams {
            basis: self.yield_basis(vote_unit_price_usd),
            include_idle_lsts: self.include_idle_lsts,
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        MAINNET
    }
}

/// [BootstrapConfig] of the production deployment.
pub const MAINNET: BootstrapConfig = BootstrapConfig {
    genesis_timestamp: 1_694_044_800,
    epoch_duration: 2_419_200,
    whitelist_duration: 604_800,
    vote_start_delay: 1_814_400,
    lock_duration: 9_676_800,
    vote_decimals: DEFAULT_DECIMALS,
    week_window: WeekWindowPolicy::RemainingInWeek,
    include_idle_lsts: true,
};
