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

use alloy_primitives::{Address, B256};

/// Reason an expectation scope failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// Expectation doesn't check anything.
    #[error("expectation checks no topic and no data")]
    EmptyMatchMask,
    /// Expectations were left unmatched when their scope closed.
    #[error("log != expected log: {remaining} expectation(s) left unmatched")]
    UnmatchedExpectation {
        /// Number of expectations not found.
        remaining: usize,
    },
    /// Log was emitted by another contract.
    #[error("emitter mismatch: expected {expected}, got {actual}")]
    AddressMismatch {
        /// Declared emitter.
        expected: Address,
        /// Actual emitter.
        actual: Address,
    },
    /// Log carries a different number of topics.
    #[error("topic count mismatch: expected {expected}, got {actual}")]
    TopicCountMismatch {
        /// Topics of the reference event.
        expected: usize,
        /// Topics of the observed log.
        actual: usize,
    },
    /// A checked topic differs.
    #[error("topic {index} mismatch: expected {expected}, got {actual}")]
    TopicMismatch {
        /// Topic position, `0` is the event selector for named events.
        index: usize,
        /// Reference value.
        expected: B256,
        /// Observed value.
        actual: B256,
    },
    /// Checked data differs.
    #[error("log data mismatch")]
    DataMismatch,
    /// A log without topics can only fill an anonymous expectation.
    #[error("log has no event selector, expect an anonymous emit to match it")]
    MissingEventSelector,
    /// A call frame was closed without being opened.
    #[error("call scope closed without a matching call")]
    ScopeUnderflow,
}
