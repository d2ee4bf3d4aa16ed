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

use gfuzz_bound::BoundError;
use gfuzz_expect::MatchError;

/// Type alias for the harness results.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Harness error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Argument range is invalid.
    #[error(transparent)]
    Bound(#[from] BoundError),
    /// Emitted logs didn't satisfy the declared expectations.
    #[error(transparent)]
    Expectation(#[from] MatchError),
    /// Test function reverted.
    #[error("test reverted: {0}")]
    Reverted(String),
    /// Configuration is unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
