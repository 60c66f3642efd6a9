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

//! Row builders for the LST ranking table and the per-LST incentive breakdown.

use alloy_primitives::Address;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{IncentiveGroups, IncentiveItem},
    sort::{sort_rows, sort_rows_pinned, SortDirection, SortState},
};

/// Pseudo-LST for voters who want the index left unchanged. Always listed first.
pub const NO_CHANGE_LST: Address = Address::ZERO;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LstColumn {
    TotalIncentive,
    UsdPerVote,
    Apr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncentiveColumn {
    Amount,
    UsdValue,
    Apr,
}

/// Initial LST table order: largest total incentive first.
pub fn default_lst_sort() -> SortState<LstColumn> {
    SortState::by(LstColumn::TotalIncentive, SortDirection::Descending)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstRow {
    pub lst: Address,
    pub total_incentive_usd: Decimal,
    pub usd_per_vote_unit: Decimal,
    pub estimated_apr: f64,
    pub incentive_count: usize,
    pub is_no_change: bool,
}

fn to_key(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// One row per LST in `lsts` order, preceded by the no-change row. LSTs without a group read as
/// zero. A sentinel inside `lsts` is not listed twice.
pub fn lst_rows(lsts: &[Address], groups: &IncentiveGroups) -> Vec<LstRow> {
    std::iter::once(NO_CHANGE_LST)
        .chain(lsts.iter().copied().filter(|lst| *lst != NO_CHANGE_LST))
        .map(|lst| match groups.get(&lst) {
            Some(group) => LstRow {
                lst,
                total_incentive_usd: group.normalized_sum,
                usd_per_vote_unit: group.usd_per_vote_unit,
                estimated_apr: group.estimated_apr,
                incentive_count: group.incentives.len(),
                is_no_change: lst == NO_CHANGE_LST,
            },
            None => LstRow {
                lst,
                total_incentive_usd: Decimal::ZERO,
                usd_per_vote_unit: Decimal::ZERO,
                estimated_apr: 0.0,
                incentive_count: 0,
                is_no_change: lst == NO_CHANGE_LST,
            },
        })
        .collect()
}

fn lst_key(row: &LstRow, column: &LstColumn) -> f64 {
    match column {
        LstColumn::TotalIncentive => to_key(row.total_incentive_usd),
        LstColumn::UsdPerVote => to_key(row.usd_per_vote_unit),
        LstColumn::Apr => row.estimated_apr,
    }
}

/// LST table rows ordered by `state`. The no-change row stays first.
pub fn rank_lsts(
    lsts: &[Address],
    groups: &IncentiveGroups,
    state: &SortState<LstColumn>,
) -> Vec<LstRow> {
    sort_rows_pinned(&lst_rows(lsts, groups), |row| row.is_no_change, lst_key, state)
}

fn incentive_key(item: &IncentiveItem, column: &IncentiveColumn) -> f64 {
    match column {
        IncentiveColumn::Amount => to_key(item.record.token.amount.normalized_or_zero()),
        IncentiveColumn::UsdValue => to_key(item.record.usd_value),
        IncentiveColumn::Apr => item.estimated_apr,
    }
}

/// Breakdown rows for one LST. The default state keeps record order.
pub fn rank_incentives(
    items: &[IncentiveItem],
    state: &SortState<IncentiveColumn>,
) -> Vec<IncentiveItem> {
    sort_rows(items, incentive_key, state)
}
