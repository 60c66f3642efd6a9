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

//! Conversion of raw on-chain token amounts into comparable decimal values.

use alloy_primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{IncentivesError, Result, MAX_DECIMALS};

/// Decimals used by ETH, the vote token and most ERC-20s.
pub const DEFAULT_DECIMALS: u8 = 18;

// Decimal stores a 96 bit mantissa.
const MAX_U96: u128 = (1 << 96) - 1;

/// A raw on-chain amount together with the decimals of its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub raw: U256,
    pub decimals: u8,
}

impl TokenAmount {
    pub fn new(raw: U256, decimals: u8) -> Result<Self> {
        if decimals > MAX_DECIMALS {
            return Err(IncentivesError::InvalidDecimals(decimals));
        }
        Ok(Self { raw, decimals })
    }

    /// Amount expressed with the default 18 decimals.
    pub fn from_wei(raw: U256) -> Self {
        Self { raw, decimals: DEFAULT_DECIMALS }
    }

    pub const fn zero(decimals: u8) -> Self {
        Self { raw: U256::ZERO, decimals }
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    pub fn normalized(&self) -> Result<Decimal> {
        normalize(self.raw, self.decimals)
    }

    /// Like [Self::normalized], but an amount that cannot be represented counts as zero.
    pub fn normalized_or_zero(&self) -> Decimal {
        match self.normalized() {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("Treating amount as zero: {err}");
                Decimal::ZERO
            }
        }
    }
}

/// Convert `raw / 10^decimals` into a [Decimal].
///
/// Amounts wider than the 96 bit mantissa lose their least significant digits, one at a time,
/// until they fit. Fails if the whole-unit part alone does not fit.
pub fn normalize(raw: U256, decimals: u8) -> Result<Decimal> {
    if decimals > MAX_DECIMALS {
        return Err(IncentivesError::InvalidDecimals(decimals));
    }

    let ten = U256::from(10u8);
    let max_mantissa = U256::from(MAX_U96);
    let mut mantissa = raw;
    let mut dropped = 0u32;
    while mantissa > max_mantissa {
        mantissa /= ten;
        dropped += 1;
    }

    let decimals = u32::from(decimals);
    if dropped > decimals {
        return Err(IncentivesError::AmountOutOfRange(raw, decimals as u8));
    }

    Decimal::try_from_i128_with_scale(mantissa.to::<u128>() as i128, decimals - dropped)
        .map_err(|_| IncentivesError::AmountOutOfRange(raw, decimals as u8))
}

/// Inverse of [normalize]. Digits finer than `decimals` are truncated, negative values clamp
/// to zero.
pub fn denormalize(value: Decimal, decimals: u8) -> Result<U256> {
    if decimals > MAX_DECIMALS {
        return Err(IncentivesError::InvalidDecimals(decimals));
    }
    if value.is_zero() || value.is_sign_negative() {
        return Ok(U256::ZERO);
    }

    let mantissa = U256::from(value.mantissa().unsigned_abs());
    let scale = value.scale();
    let decimals = u32::from(decimals);
    let ten = U256::from(10u8);

    Ok(if decimals >= scale {
        mantissa * ten.pow(U256::from(decimals - scale))
    } else {
        mantissa / ten.pow(U256::from(scale - decimals))
    })
}

/// Render a decimal with thousands separators and between `min_fraction` and `max_fraction`
/// fractional digits. Rounding happens here and nowhere else.
pub fn format_amount(value: Decimal, min_fraction: u32, max_fraction: u32) -> String {
    let max_fraction = max_fraction.max(min_fraction);
    let rounded =
        value.round_dp_with_strategy(max_fraction, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let text = rounded.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let mut fraction = frac_part.trim_end_matches('0').to_string();
    while (fraction.len() as u32) < min_fraction {
        fraction.push('0');
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(&fraction);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut result = String::new();
    let mut count = 0;

    for ch in digits.chars().rev() {
        if count == 3 {
            result.insert(0, ',');
            count = 0;
        }
        result.insert(0, ch);
        count += 1;
    }

    result
}
