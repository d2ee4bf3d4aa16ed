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

//! Matching of emitted logs against `expectEmit`-style declarations.
//!
//! Expectations are declared in a call frame and must be satisfied, in
//! declaration order, by the logs emitted during the next state-mutating
//! call made from that frame. [`EmitMatcher`] tracks the call frames
//! explicitly and reports the first violation as a [`MatchError`].

#![warn(missing_docs)]

mod error;
mod expected;
mod matcher;
mod queue;
mod record;
#[cfg(test)]
mod tests;

pub use error::MatchError;
pub use expected::ExpectedEmit;
pub use matcher::{CallKind, EmitMatcher, MatchMode, MatchState};
pub use queue::{ExpectationQueue, Observation};
pub use record::{EventRecord, LogMask};

pub use alloy_primitives::{Address, B256, Bytes, LogData};
