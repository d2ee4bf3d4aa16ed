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

//! Boundary between the harness and whatever runs the tests.

use gfuzz_bound::U256;
use gfuzz_expect::{CallKind, EmitMatcher, EventRecord, ExpectedEmit, MatchError};
use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Runs a single test function invocation.
pub trait Executor {
    /// Invokes `test` with already bounded `args`.
    fn invoke(&mut self, test: &str, args: &[U256]) -> ExecutionTrace;
}

/// Source of raw, unbounded fuzz inputs.
pub trait SeedSource {
    /// Next raw seed, to be bounded into a parameter range.
    fn random_seed(&mut self) -> U256;
}

/// Deterministic [`SeedSource`] backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct RngSeedSource(StdRng);

impl RngSeedSource {
    /// Source yielding the same seeds for the same `seed`.
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl SeedSource for RngSeedSource {
    fn random_seed(&mut self) -> U256 {
        let mut bytes = [0u8; 32];
        self.0.fill_bytes(&mut bytes);
        U256::from_be_bytes(bytes)
    }
}

/// One event of a test invocation, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceStep {
    /// Call to another contract started.
    Enter(CallKind),
    /// Innermost call returned.
    Exit,
    /// Test declared an expected emission.
    Expect(ExpectedEmit),
    /// Contract emitted a log.
    Emit(EventRecord),
}

/// How a test invocation ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Outcome {
    /// Returned normally.
    #[default]
    Success,
    /// Reverted with the given reason.
    Revert(String),
}

/// Everything the harness needs to know about a test invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionTrace {
    /// Steps in execution order.
    pub steps: Vec<TraceStep>,
    /// How the invocation ended.
    pub outcome: Outcome,
}

impl ExecutionTrace {
    /// Trace of an invocation that returned normally.
    pub fn success(steps: Vec<TraceStep>) -> Self {
        Self {
            steps,
            outcome: Outcome::Success,
        }
    }

    /// Trace of an invocation that reverted with `reason`.
    pub fn revert(steps: Vec<TraceStep>, reason: impl Into<String>) -> Self {
        Self {
            steps,
            outcome: Outcome::Revert(reason.into()),
        }
    }

    /// Returns `true` unless the invocation reverted.
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Logs emitted during the invocation.
    pub fn logs(&self) -> impl Iterator<Item = &EventRecord> {
        self.steps.iter().filter_map(|step| match step {
            TraceStep::Emit(record) => Some(record),
            _ => None,
        })
    }
}

/// Feeds `trace` into `matcher` and closes the test frame.
///
/// The matcher is reset first, so it can be reused across invocations.
pub fn replay(trace: &ExecutionTrace, matcher: &mut EmitMatcher) -> Result<(), MatchError> {
    matcher.reset();

    for step in &trace.steps {
        match step {
            TraceStep::Enter(kind) => matcher.enter_call(*kind)?,
            TraceStep::Exit => matcher.exit_call()?,
            TraceStep::Expect(expected) => matcher.declare(expected.clone())?,
            TraceStep::Emit(record) => matcher.observe(record)?,
        }
    }

    matcher.finish()
}
