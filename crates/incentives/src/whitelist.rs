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

//! Whitelisted LSTs and the vote totals shown alongside them.

use std::collections::{BTreeMap, HashSet};

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{records::VoteTally, token::TokenAmount};

/// A whitelisting log emitted by the bootstrap contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEvent {
    pub lst: Address,
    pub block_number: u64,
    pub transaction_index: u64,
    pub log_index: u64,
}

/// Whitelisted LSTs in the order they were first whitelisted on chain.
pub fn collect_whitelisted(events: &[WhitelistEvent]) -> Vec<Address> {
    let mut ordered = events.to_vec();
    ordered.sort_by_key(|event| (event.block_number, event.transaction_index, event.log_index));

    let mut seen = HashSet::new();
    let mut lsts = Vec::new();
    for event in ordered {
        if event.lst == Address::ZERO {
            tracing::debug!(
                "Skipping whitelist event with zero address at block {}",
                event.block_number
            );
            continue;
        }
        if seen.insert(event.lst) {
            lsts.push(event.lst);
        }
    }
    tracing::debug!("Collected {} whitelisted LSTs from {} events", lsts.len(), events.len());
    lsts
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstVotes {
    pub lst: Address,
    pub votes: TokenAmount,
    /// Fraction of all votes cast, in `[0, 1]`.
    pub share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteSummary {
    /// Votes across all whitelisted LSTs.
    pub total_votes: TokenAmount,
    pub viewer_vote_power: Option<TokenAmount>,
    pub by_lst: Vec<LstVotes>,
}

/// Sum the tallies of `whitelisted` LSTs. LSTs without a tally count as zero votes.
pub fn summarize_votes(
    whitelisted: &[Address],
    tallies: &BTreeMap<Address, VoteTally>,
    viewer_vote_power: Option<TokenAmount>,
    vote_decimals: u8,
) -> VoteSummary {
    let mut total = U256::ZERO;
    let mut by_lst = Vec::with_capacity(whitelisted.len());

    for lst in whitelisted {
        let Some(tally) = tallies.get(lst) else {
            by_lst.push(LstVotes {
                lst: *lst,
                votes: TokenAmount::zero(vote_decimals),
                share: Decimal::ZERO,
            });
            continue;
        };
        total = total.saturating_add(tally.votes.raw);

        let all = tally.total_votes.normalized_or_zero();
        let share = if all.is_zero() {
            Decimal::ZERO
        } else {
            tally.votes.normalized_or_zero().checked_div(all).unwrap_or(Decimal::ZERO)
        };
        by_lst.push(LstVotes { lst: *lst, votes: tally.votes, share });
    }

    let total_votes = TokenAmount { raw: total, decimals: vote_decimals };
    VoteSummary { total_votes, viewer_vote_power, by_lst }
}
