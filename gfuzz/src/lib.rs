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

//! Fuzzing harness core for EVM tests.
//!
//! The harness doesn't execute anything itself. An [`Executor`] runs a test
//! function with the arguments the harness generated and hands back an
//! [`ExecutionTrace`]; the harness then checks the trace's emitted logs
//! against the expectations the test declared and reports a shrunk
//! [`Counterexample`] on failure.
//!
//! An [`InvariantRunner`] drives a [`StatefulExecutor`] through random call
//! sequences instead, checking invariant functions after every call.
//!
//! ```
//! use gfuzz::{BoundConfig, ExecutionTrace, Executor, FuzzConfig, FuzzRunner, U256};
//!
//! struct AlwaysOk;
//!
//! impl Executor for AlwaysOk {
//!     fn invoke(&mut self, _test: &str, _args: &[U256]) -> ExecutionTrace {
//!         ExecutionTrace::success(Vec::new())
//!     }
//! }
//!
//! let range = BoundConfig::uniform(U256::from(1), U256::from(3)).unwrap();
//! let mut runner = FuzzRunner::new(AlwaysOk, FuzzConfig::default().with_runs(16));
//! let report = runner.run("testNothing", &[range]).unwrap();
//!
//! assert!(report.is_success());
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod executor;
mod invariant;
mod runner;

#[cfg(feature = "mock")]
pub mod mock;

pub use config::FuzzConfig;
pub use error::{Error, Result};
pub use executor::{
    ExecutionTrace, Executor, Outcome, RngSeedSource, SeedSource, TraceStep, replay,
};
pub use invariant::{
    InvariantCall, InvariantFailure, InvariantReport, InvariantRunner, StatefulExecutor,
    TargetFunction,
};
pub use runner::{Counterexample, FuzzReport, FuzzRunner, verify};

pub use gfuzz_bound::{self as bound, BoundConfig, BoundError, Distribution, I256, U256};
pub use gfuzz_expect::{
    self as expect, Address, CallKind, EmitMatcher, EventRecord, ExpectedEmit, LogData, MatchError,
    MatchMode,
};
