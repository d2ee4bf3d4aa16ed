// This file is part of Gear.
//
// Copyright (C) 2025 Gear Technologies Inc.
// SPDX-License-Identifier: GPL-3.0-or-later WITH Classpath-exception-2.0
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! [`bound`] and its helpers.

use crate::BoundError;
use alloy_primitives::{I256, U256};

/// Inputs this close to `0` or to [`U256::MAX`] are mapped onto the
/// corresponding range edge instead of being wrapped.
const EDGE_SPAN: U256 = U256::from_limbs([3, 0, 0, 0]);

/// `2^255`, the offset between the signed and the unsigned 256-bit domains.
const SIGN_BIT: U256 = U256::from_limbs([0, 0, 0, 1 << 63]);

/// How sampled values are spread over the range.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Distribution {
    /// Every value of the range is (roughly) equally likely.
    #[default]
    Uniform,
    /// Every power of two between the bounds is equally likely.
    Logarithmic,
}

/// Target range of a single [`bound`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundConfig {
    /// Inclusive lower bound.
    pub min: U256,
    /// Inclusive upper bound.
    pub max: U256,
    /// Sampling distribution.
    pub distribution: Distribution,
}

impl BoundConfig {
    /// Uniform range `[min, max]`.
    pub fn uniform(min: U256, max: U256) -> Result<Self, BoundError> {
        let config = Self {
            min,
            max,
            distribution: Distribution::Uniform,
        };
        config.validate().map(|()| config)
    }

    /// Logarithmic range `[min, max]`, `0 < min < max`.
    pub fn logarithmic(min: U256, max: U256) -> Result<Self, BoundError> {
        let config = Self {
            min,
            max,
            distribution: Distribution::Logarithmic,
        };
        config.validate().map(|()| config)
    }

    /// The whole `uint256` domain.
    pub const fn full() -> Self {
        Self {
            min: U256::ZERO,
            max: U256::MAX,
            distribution: Distribution::Uniform,
        }
    }

    /// Checks the range invariants of the configured distribution.
    pub fn validate(&self) -> Result<(), BoundError> {
        let invalid_range = BoundError::InvalidRange {
            min: self.min,
            max: self.max,
        };

        match self.distribution {
            Distribution::Uniform if self.min > self.max => Err(invalid_range),
            Distribution::Uniform => Ok(()),
            Distribution::Logarithmic if self.min.is_zero() => Err(BoundError::ZeroLowerBound),
            Distribution::Logarithmic if self.min >= self.max => Err(invalid_range),
            Distribution::Logarithmic => Ok(()),
        }
    }

    /// Returns `true` if `x` lies in `[min, max]`.
    pub fn contains(&self, x: U256) -> bool {
        self.min <= x && x <= self.max
    }

    /// Shorthand for [`bound`]`(x, self)`.
    pub fn bound(&self, x: U256) -> Result<U256, BoundError> {
        bound(x, self)
    }
}

impl Default for BoundConfig {
    fn default() -> Self {
        Self::full()
    }
}

/// Maps `x` into the range described by `config`.
///
/// The mapping is a pure function of its arguments, so a failing fuzz case
/// is reproduced exactly by re-running the same seed.
///
/// # Uniform
///
/// - values already in `[min, max]` are returned unchanged;
/// - `0..=3` map to `min..=min + 3` and `MAX - 3..=MAX` map to `max - 3..=max`
///   whenever the range is wide enough, so that the edges are always reachable;
/// - everything else is wrapped into the range by the distance it overshoots
///   the nearest bound.
///
/// # Logarithmic
///
/// The exponent is bound uniformly into `[log2(min), log2(max)]` and the
/// result is `2^exponent` clamped into `[min, max]`, so only the lowest
/// order of magnitude may yield `min` itself. The result is never zero.
pub fn bound(x: U256, config: &BoundConfig) -> Result<U256, BoundError> {
    config.validate()?;

    let BoundConfig {
        min,
        max,
        distribution,
    } = *config;

    let result = match distribution {
        Distribution::Uniform => bound_uniform(x, min, max),
        Distribution::Logarithmic => bound_logarithmic(x, min, max)?,
    };

    log::trace!("bound {x} into [{min}, {max}] ({distribution:?}): {result}");

    Ok(result)
}

/// Signed counterpart of [`bound`] with uniform distribution.
///
/// Both domains are shifted by `2^255` so that `I256::MIN` maps onto `0`,
/// the value is bound as unsigned, and the result is shifted back.
pub fn bound_signed(x: I256, min: I256, max: I256) -> Result<I256, BoundError> {
    if min > max {
        return Err(BoundError::InvalidSignedRange { min, max });
    }

    let shifted = bound_uniform(to_unsigned(x), to_unsigned(min), to_unsigned(max));

    Ok(I256::from_raw(shifted ^ SIGN_BIT))
}

/// Integer floor of `log2(x)`, `None` for zero.
pub fn log2_floor(x: U256) -> Option<usize> {
    x.bit_len().checked_sub(1)
}

/// `2^exponent`, `None` if it doesn't fit into 256 bits.
pub fn exp2(exponent: usize) -> Option<U256> {
    U256::from(1u8).checked_shl(exponent)
}

fn to_unsigned(x: I256) -> U256 {
    x.into_raw() ^ SIGN_BIT
}

// Caller guarantees `min <= max`.
fn bound_uniform(x: U256, min: U256, max: U256) -> U256 {
    if min <= x && x <= max {
        return x;
    }

    // Wraps to zero only for the full domain, which never gets here.
    let size = (max - min).wrapping_add(U256::from(1u8));

    if x <= EDGE_SPAN && size > x {
        return min + x;
    }

    let headroom = U256::MAX - x;
    if headroom <= EDGE_SPAN && size > headroom {
        return max - headroom;
    }

    if x > max {
        let rem = (x - max) % size;
        if rem.is_zero() {
            max
        } else {
            min + rem - U256::from(1u8)
        }
    } else {
        let rem = (min - x) % size;
        if rem.is_zero() {
            min
        } else {
            max - rem + U256::from(1u8)
        }
    }
}

fn bound_logarithmic(x: U256, min: U256, max: U256) -> Result<U256, BoundError> {
    let (Some(lo), Some(hi)) = (log2_floor(min), log2_floor(max)) else {
        return Err(BoundError::ZeroLowerBound);
    };

    let exponent = bound_uniform(x, U256::from(lo), U256::from(hi));

    // `exponent <= hi < 256`, so the low limb holds all of it.
    let exponent = exponent.as_limbs()[0] as usize;

    let value = exp2(exponent).ok_or(BoundError::InvalidRange { min, max })?;

    Ok(value.clamp(min, max))
}
