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

//! Incentive deposits and vote tallies, and their validation at the data-source boundary.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::{IncentivesError, Result},
    token::{TokenAmount, DEFAULT_DECIMALS},
};

/// The token posted as an incentive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveToken {
    pub address: Address,
    pub amount: TokenAmount,
    pub symbol: Option<String>,
    pub logo_uri: Option<String>,
    pub usd_price_hint: Option<Decimal>,
}

/// One incentive deposit, as observed on chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveRecord {
    pub epoch: u64,
    pub target_lst: Address,
    pub depositor: Address,
    pub token: IncentiveToken,
    pub usd_value: Decimal,
}

/// Votes for one LST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub lst: Address,
    pub votes: TokenAmount,
    pub total_votes: TokenAmount,
}

impl VoteTally {
    pub fn new(lst: Address, votes: U256, total_votes: U256) -> Self {
        Self {
            lst,
            votes: TokenAmount::from_wei(votes),
            total_votes: TokenAmount::from_wei(total_votes),
        }
    }

    /// The same raw counts, read with the vote token's `decimals`.
    pub fn with_decimals(self, decimals: u8) -> Self {
        Self {
            votes: TokenAmount { raw: self.votes.raw, decimals },
            total_votes: TokenAmount { raw: self.total_votes.raw, decimals },
            ..self
        }
    }
}

/// Key tallies by LST. Later duplicates replace earlier ones.
pub fn tallies_by_lst(
    tallies: impl IntoIterator<Item = VoteTally>,
) -> BTreeMap<Address, VoteTally> {
    tallies.into_iter().map(|tally| (tally.lst, tally)).collect()
}

/// An incentive deposit as delivered by the event source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawIncentiveRecord {
    pub epoch: Option<u64>,
    pub target_lst: Option<Address>,
    pub depositor: Option<Address>,
    pub token: Option<Address>,
    pub amount: Option<U256>,
    pub decimals: Option<u8>,
    pub symbol: Option<String>,
    pub logo_uri: Option<String>,
    pub usd_price_hint: Option<Decimal>,
    pub usd_value: Option<Decimal>,
}

/// A record that failed validation and was left out of aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub index: usize,
    pub error: IncentivesError,
}

impl IncentiveRecord {
    /// Validate a raw record. Records without an epoch are assigned `default_epoch`.
    pub fn from_raw(index: usize, raw: &RawIncentiveRecord, default_epoch: u64) -> Result<Self> {
        let missing = |field| IncentivesError::MissingField { index, field };

        let target_lst = raw.target_lst.ok_or_else(|| missing("target_lst"))?;
        let depositor = raw.depositor.ok_or_else(|| missing("depositor"))?;
        let token_address = raw.token.ok_or_else(|| missing("token"))?;
        let raw_amount = raw.amount.ok_or_else(|| missing("amount"))?;
        let amount = TokenAmount::new(raw_amount, raw.decimals.unwrap_or(DEFAULT_DECIMALS))?;

        let usd_value = match (raw.usd_value, raw.usd_price_hint) {
            (Some(value), _) => value,
            (None, Some(price)) => {
                amount.normalized_or_zero().checked_mul(price).unwrap_or(Decimal::ZERO)
            }
            (None, None) => Decimal::ZERO,
        };

        Ok(Self {
            epoch: raw.epoch.unwrap_or(default_epoch),
            target_lst,
            depositor,
            token: IncentiveToken {
                address: token_address,
                amount,
                symbol: raw.symbol.clone(),
                logo_uri: raw.logo_uri.clone(),
                usd_price_hint: raw.usd_price_hint,
            },
            usd_value,
        })
    }
}

/// Records that passed validation for one epoch, plus the ones that did not.
#[derive(Debug, Clone, Default)]
pub struct ValidatedRecords {
    pub records: Vec<IncentiveRecord>,
    pub rejected: Vec<RejectedRecord>,
}

/// Validate raw records and keep those belonging to `epoch`.
///
/// A malformed record is rejected on its own; the remaining records still come through.
pub fn validate_records(raw: &[RawIncentiveRecord], epoch: u64) -> ValidatedRecords {
    let mut validated = ValidatedRecords::default();

    for (index, raw_record) in raw.iter().enumerate() {
        match IncentiveRecord::from_raw(index, raw_record, epoch) {
            Ok(record) if record.epoch == epoch => validated.records.push(record),
            Ok(record) => {
                tracing::debug!(
                    "Skipping record {index} from epoch {} (showing {epoch})",
                    record.epoch
                );
            }
            Err(error) => {
                tracing::warn!("Rejecting incentive record: {error}");
                validated.rejected.push(RejectedRecord { index, error });
            }
        }
    }

    validated
}
