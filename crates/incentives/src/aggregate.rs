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

//! Folds incentive deposits into per-LST totals for the protocol-wide and viewer scopes.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    apr::estimate_apr,
    error::IncentivesError,
    records::{IncentiveRecord, VoteTally},
};

/// Whose deposits an aggregation counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Every depositor.
    Protocol,
    /// Deposits made by one address.
    User(Address),
}

impl Scope {
    pub fn includes(&self, depositor: &Address) -> bool {
        match self {
            Scope::Protocol => true,
            Scope::User(viewer) => viewer == depositor,
        }
    }
}

/// Inputs for turning incentive totals into an APR for voters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldBasis {
    /// USD price of one (normalized) unit of vote power.
    pub vote_unit_price_usd: Decimal,
    /// Accrual period of the incentives, in seconds.
    pub window_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationParams {
    pub basis: YieldBasis,
    /// List LSTs that have votes but no incentives, with zero values.
    pub include_idle_lsts: bool,
}

/// One incentive in an LST's breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveItem {
    pub record: IncentiveRecord,
    pub estimated_apr: f64,
}

/// Incentives posted for one LST within one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedIncentiveGroup {
    pub lst: Address,
    /// In record order.
    pub incentives: Vec<IncentiveItem>,
    /// Sum of the incentives' USD values.
    pub normalized_sum: Decimal,
    pub usd_per_vote_unit: Decimal,
    pub estimated_apr: f64,
}

impl AggregatedIncentiveGroup {
    pub fn empty(lst: Address) -> Self {
        Self {
            lst,
            incentives: Vec::new(),
            normalized_sum: Decimal::ZERO,
            usd_per_vote_unit: Decimal::ZERO,
            estimated_apr: 0.0,
        }
    }
}

pub type IncentiveGroups = BTreeMap<Address, AggregatedIncentiveGroup>;

/// Aggregate the records accepted by `scope_filter`.
///
/// Every LST with records gets a group. LSTs known only from `tallies` get a zero-valued group
/// when `include_idle_lsts` is set; consumers treat a missing key as zero either way.
pub fn aggregate_with<F>(
    records: &[IncentiveRecord],
    tallies: &BTreeMap<Address, VoteTally>,
    scope_filter: F,
    params: &AggregationParams,
) -> IncentiveGroups
where
    F: Fn(&Address) -> bool,
{
    let mut groups = IncentiveGroups::new();
    if params.include_idle_lsts {
        for lst in tallies.keys() {
            groups.insert(*lst, AggregatedIncentiveGroup::empty(*lst));
        }
    }

    for record in records.iter().filter(|record| scope_filter(&record.depositor)) {
        let group = groups
            .entry(record.target_lst)
            .or_insert_with(|| AggregatedIncentiveGroup::empty(record.target_lst));
        group.normalized_sum = match group.normalized_sum.checked_add(record.usd_value) {
            Some(sum) => sum,
            None => {
                tracing::warn!("USD total for {} overflowed, saturating", record.target_lst);
                Decimal::MAX
            }
        };
        group.incentives.push(IncentiveItem { record: record.clone(), estimated_apr: 0.0 });
    }

    for (lst, group) in groups.iter_mut() {
        let votes =
            tallies.get(lst).map(|tally| tally.votes.normalized_or_zero()).unwrap_or(Decimal::ZERO);
        let staked_value =
            votes.checked_mul(params.basis.vote_unit_price_usd).unwrap_or(Decimal::ZERO);
        let window = params.basis.window_seconds;

        group.usd_per_vote_unit = if votes.is_zero() {
            tracing::debug!("{} for {lst}: no votes", IncentivesError::DivisionGuard);
            Decimal::ZERO
        } else {
            group.normalized_sum.checked_div(votes).unwrap_or(Decimal::ZERO)
        };
        group.estimated_apr = estimate_apr(group.normalized_sum, staked_value, window);
        for item in &mut group.incentives {
            item.estimated_apr = estimate_apr(item.record.usd_value, staked_value, window);
        }
    }

    tracing::debug!("Aggregated {} records into {} groups", records.len(), groups.len());
    groups
}

pub fn aggregate(
    records: &[IncentiveRecord],
    tallies: &BTreeMap<Address, VoteTally>,
    scope: &Scope,
    params: &AggregationParams,
) -> IncentiveGroups {
    aggregate_with(records, tallies, |depositor| scope.includes(depositor), params)
}

/// Which of the two views to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeKind {
    #[default]
    Protocol,
    User,
}

/// Aggregations for both scopes over the same snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncentivesByScope {
    pub protocol: IncentiveGroups,
    pub user: IncentiveGroups,
}

impl IncentivesByScope {
    pub fn groups(&self, kind: ScopeKind) -> &IncentiveGroups {
        match kind {
            ScopeKind::Protocol => &self.protocol,
            ScopeKind::User => &self.user,
        }
    }

    /// USD value of every incentive in the view.
    pub fn total_usd(&self, kind: ScopeKind) -> Decimal {
        self.groups(kind)
            .values()
            .fold(Decimal::ZERO, |acc, group| acc.saturating_add(group.normalized_sum))
    }
}

/// Aggregate for both scopes. Without a viewer the user view counts no deposits.
pub fn aggregate_scopes(
    records: &[IncentiveRecord],
    tallies: &BTreeMap<Address, VoteTally>,
    viewer: Option<Address>,
    params: &AggregationParams,
) -> IncentivesByScope {
    let protocol = aggregate(records, tallies, &Scope::Protocol, params);
    let user = match viewer {
        Some(viewer) => aggregate(records, tallies, &Scope::User(viewer), params),
        None => aggregate_with(records, tallies, |_| false, params),
    };
    IncentivesByScope { protocol, user }
}
