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

use alloy_primitives::{I256, U256};

/// Invalid bound configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BoundError {
    /// Upper bound is below the lower one, or equal to it for logarithmic sampling.
    #[error("invalid range: max {max} is less than min {min}")]
    InvalidRange {
        /// Requested lower bound.
        min: U256,
        /// Requested upper bound.
        max: U256,
    },
    /// Signed upper bound is below the lower one.
    #[error("invalid signed range: max {max} is less than min {min}")]
    InvalidSignedRange {
        /// Requested lower bound.
        min: I256,
        /// Requested upper bound.
        max: I256,
    },
    /// Logarithmic sampling was requested with `min == 0`.
    #[error("logarithmic sampling requires a non-zero lower bound")]
    ZeroLowerBound,
}
