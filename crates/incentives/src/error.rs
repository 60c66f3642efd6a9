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

use alloy_primitives::U256;
use thiserror::Error;

/// Largest number of decimals an incentive or vote token may declare.
pub const MAX_DECIMALS: u8 = 18;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncentivesError {
    #[error("Invalid token decimals: {0} (expected 0..={MAX_DECIMALS})")]
    InvalidDecimals(u8),

    #[error("Timestamp {now} predates protocol genesis {genesis}")]
    BeforeGenesis { now: u64, genesis: u64 },

    /// Only used for diagnostics; every division by zero resolves to a zero result.
    #[error("Division by zero guarded to zero")]
    DivisionGuard,

    #[error("Amount {0} with {1} decimals does not fit a decimal value")]
    AmountOutOfRange(U256, u8),

    #[error("Record {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(u64),
}

pub type Result<T, E = IncentivesError> = std::result::Result<T, E>;
