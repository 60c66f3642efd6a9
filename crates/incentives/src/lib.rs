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

//! Incentive aggregation, epoch clock and yield estimation for LST bootstrap voting.

pub mod aggregate;
pub mod apr;
pub mod deployments;
pub mod epoch;
pub mod error;
pub mod ranking;
pub mod records;
pub mod snapshot;
pub mod sort;
pub mod token;
pub mod whitelist;

// Re-export commonly used types
pub use aggregate::{
    aggregate, aggregate_scopes, AggregatedIncentiveGroup, AggregationParams, IncentiveGroups,
    IncentiveItem, IncentivesByScope, Scope, ScopeKind, YieldBasis,
};

pub use apr::{
    estimate_apr, estimate_stream_apr, week_window_seconds, StreamAmounts, WeekWindowPolicy,
    SECONDS_PER_YEAR,
};

pub use deployments::{BootstrapConfig, BootstrapConfigBuilder, MAINNET};

pub use epoch::{
    current_epoch, epoch_start, epoch_time_range, phase_of, time_remaining, EpochPhase,
    EpochTimeRange, PhaseSchedule, PhaseWindow, PeriodStatus, TimeRemaining,
};

pub use error::{IncentivesError, Result};

pub use ranking::{rank_incentives, rank_lsts, IncentiveColumn, LstColumn, LstRow, NO_CHANGE_LST};

pub use records::{
    validate_records, IncentiveRecord, IncentiveToken, RawIncentiveRecord, VoteTally,
};

pub use snapshot::{compute_view, BootstrapSnapshot, BootstrapView, ViewPublisher};

pub use sort::{sort_rows, SortDirection, SortState};

pub use token::{denormalize, normalize, TokenAmount};

pub use whitelist::{collect_whitelisted, summarize_votes, VoteSummary, WhitelistEvent};
