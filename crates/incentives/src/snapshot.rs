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

//! Orchestration: a snapshot of chain reads goes in, a presentation-ready view comes out.
//!
//! [compute_view] is pure. [ViewPublisher] recomputes the view each time a new snapshot is
//! published and keeps only the latest result.

use std::{collections::HashSet, sync::Arc};

use alloy_primitives::Address;
use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    aggregate::{aggregate_scopes, IncentivesByScope},
    apr::{estimate_stream_apr, local_datetime, StreamAmounts},
    deployments::BootstrapConfig,
    epoch::{vote_countdown, BootstrapPeriods, EpochTimeRange, PeriodStatus, PhaseWindow},
    ranking::{default_lst_sort, rank_lsts, LstColumn, LstRow},
    records::{tallies_by_lst, validate_records, RawIncentiveRecord, RejectedRecord, VoteTally},
    sort::SortState,
    token::TokenAmount,
    whitelist::{collect_whitelisted, summarize_votes, VoteSummary, WhitelistEvent},
};

/// Everything read from chain for one refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapSnapshot {
    /// Unix timestamp of the read.
    pub now: u64,
    /// Epoch to show. Defaults to the current epoch.
    pub epoch: Option<u64>,
    pub records: Vec<RawIncentiveRecord>,
    pub tallies: Vec<VoteTally>,
    pub whitelist_events: Vec<WhitelistEvent>,
    pub periods: BootstrapPeriods,
    pub viewer: Option<Address>,
    pub viewer_vote_power: Option<TokenAmount>,
    /// USD price of one unit of vote power.
    pub vote_unit_price_usd: Decimal,
    pub lst_sort: Option<SortState<LstColumn>>,
    /// Staked vault amounts, when the vault was read.
    pub stream_amounts: Option<StreamAmounts>,
    /// Viewer's offset from UTC; weeks follow the viewer's calendar.
    pub utc_offset_seconds: i32,
}

impl BootstrapSnapshot {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse bootstrap snapshot")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodStatuses {
    pub whitelist: PeriodStatus,
    pub incentive: PeriodStatus,
    pub deposit: PeriodStatus,
    pub vote: PeriodStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapView {
    pub epoch: u64,
    pub current_epoch: u64,
    pub epoch_range: EpochTimeRange,
    pub phase: PhaseWindow,
    pub vote_countdown: String,
    pub incentives: IncentivesByScope,
    pub rejected: Vec<RejectedRecord>,
    pub protocol_ranking: Vec<LstRow>,
    pub user_ranking: Vec<LstRow>,
    pub votes: VoteSummary,
    pub periods: PeriodStatuses,
    pub stream_apr: Option<f64>,
}

/// Build the view of `snapshot`. Same input, same output.
pub fn compute_view(snapshot: &BootstrapSnapshot, config: &BootstrapConfig) -> BootstrapView {
    let now = snapshot.now;
    let current_epoch = config.current_epoch(now);
    let epoch = snapshot.epoch.unwrap_or(current_epoch);
    let epoch_range = config.epoch_time_range(epoch);
    let phase = config.schedule().phase_at(now, epoch_range.start_time);

    // On-chain vote period wins over the configured schedule once it is set.
    let vote = snapshot.periods.vote;
    let vote_countdown = if vote.begin > 0 && vote.end > 0 {
        vote_countdown(now, vote.begin, vote.end)
    } else {
        let vote_start = epoch_range.start_time.saturating_add(config.vote_start_delay);
        let vote_end = epoch_range.start_time.saturating_add(config.epoch_duration);
        vote_countdown(now, vote_start, vote_end)
    };

    let validated = validate_records(&snapshot.records, epoch);
    let tallies = tallies_by_lst(
        snapshot.tallies.iter().map(|tally| tally.with_decimals(config.vote_decimals)),
    );
    let params = config.aggregation_params(snapshot.vote_unit_price_usd);
    let incentives = aggregate_scopes(&validated.records, &tallies, snapshot.viewer, &params);

    // Whitelisted LSTs first, then any other LST that received incentives.
    let whitelisted = collect_whitelisted(&snapshot.whitelist_events);
    let mut listed: HashSet<Address> = whitelisted.iter().copied().collect();
    let mut lsts = whitelisted.clone();
    for lst in incentives.protocol.keys() {
        if listed.insert(*lst) {
            lsts.push(*lst);
        }
    }

    let sort = snapshot.lst_sort.clone().unwrap_or_else(default_lst_sort);
    let protocol_ranking = rank_lsts(&lsts, &incentives.protocol, &sort);
    let user_ranking = rank_lsts(&lsts, &incentives.user, &sort);
    let viewer_vote_power = snapshot
        .viewer_vote_power
        .map(|power| TokenAmount { raw: power.raw, decimals: config.vote_decimals });
    let votes = summarize_votes(&whitelisted, &tallies, viewer_vote_power, config.vote_decimals);

    let periods = PeriodStatuses {
        whitelist: snapshot.periods.whitelist.status(now),
        incentive: snapshot.periods.incentive.status(now),
        deposit: snapshot.periods.deposit.status(now),
        vote: snapshot.periods.vote.status(now),
    };

    let stream_apr = snapshot.stream_amounts.as_ref().and_then(|amounts| {
        match local_datetime(now, snapshot.utc_offset_seconds) {
            Ok(local) => Some(estimate_stream_apr(amounts, &local, config.week_window)),
            Err(err) => {
                tracing::warn!("Skipping stream APR: {err}");
                None
            }
        }
    });

    tracing::debug!(
        "Computed view for epoch {epoch} ({}): {} records, {} rejected, {} LSTs",
        phase.phase,
        validated.records.len(),
        validated.rejected.len(),
        lsts.len()
    );

    BootstrapView {
        epoch,
        current_epoch,
        epoch_range,
        phase,
        vote_countdown,
        incentives,
        rejected: validated.rejected,
        protocol_ranking,
        user_ranking,
        votes,
        periods,
        stream_apr,
    }
}

/// Background task publishing the view of the latest snapshot.
pub struct ViewPublisher {
    views: watch::Receiver<Arc<BootstrapView>>,
    handle: JoinHandle<()>,
}

impl ViewPublisher {
    /// Spawn the publisher on the current tokio runtime. The task stops when the snapshot sender
    /// is dropped, or once the [ViewPublisher] and every receiver from [Self::subscribe] are
    /// gone.
    pub fn spawn(
        config: BootstrapConfig,
        mut snapshots: watch::Receiver<Arc<BootstrapSnapshot>>,
    ) -> anyhow::Result<Self> {
        config.validate().context("Invalid bootstrap config")?;

        let initial = {
            let snapshot = snapshots.borrow_and_update().clone();
            compute_view(&snapshot, &config)
        };
        let (sender, views) = watch::channel(Arc::new(initial));

        let handle = tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                let snapshot = snapshots.borrow_and_update().clone();
                let view = compute_view(&snapshot, &config);
                tracing::info!("Publishing view for epoch {} at {}", view.epoch, snapshot.now);
                if sender.send(Arc::new(view)).is_err() {
                    tracing::debug!("View publisher dropped, stopping");
                    return;
                }
            }
            tracing::debug!("Snapshot source closed, stopping view publisher");
        });

        Ok(Self { views, handle })
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<BootstrapView>> {
        self.views.clone()
    }

    pub fn latest(&self) -> Arc<BootstrapView> {
        self.views.borrow().clone()
    }

    /// Wait for the task to stop.
    pub async fn join(self) -> anyhow::Result<()> {
        self.handle.await.context("View publisher task failed")
    }
}
