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

//! Invariant campaigns: random call sequences against stateful targets.
//!
//! Every run starts from the post-set-up state and makes
//! [`FuzzConfig::depth`] calls to randomly picked target functions with
//! bounded arguments. After each successful call every invariant is invoked;
//! an invariant that reverts or misses an expected emission is broken. The
//! failing sequence is then shrunk by dropping calls and lowering arguments.

use crate::{
    Error, Result,
    config::FuzzConfig,
    executor::{ExecutionTrace, Executor, RngSeedSource, SeedSource},
    runner::{shrink_arg, verify},
};
use gfuzz_bound::{BoundConfig, U256};
use gfuzz_expect::{Address, EmitMatcher};

/// [`Executor`] whose calls change persistent state.
///
/// [`Executor::invoke`] is used to run invariants, which must not change
/// state.
pub trait StatefulExecutor: Executor {
    /// Restores the state right after set-up.
    fn reset(&mut self);

    /// Calls `target` from `sender`, keeping its effects unless it reverts.
    fn call(&mut self, sender: Address, target: &str, args: &[U256]) -> ExecutionTrace;
}

/// Function the campaign may call, with one range per argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFunction {
    /// Name passed to [`StatefulExecutor::call`].
    pub name: String,
    /// Ranges the arguments are bounded into.
    pub params: Vec<BoundConfig>,
}

impl TargetFunction {
    /// Target `name` taking `params.len()` arguments.
    pub fn new(name: impl Into<String>, params: Vec<BoundConfig>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// One call of a campaign run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantCall {
    /// Caller of the target.
    pub sender: Address,
    /// Name of the called target.
    pub target: String,
    /// Bounded arguments.
    pub args: Vec<U256>,
}

/// Shrunk call sequence breaking an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantFailure {
    /// Zero-based index of the failing run, `None` if the invariants didn't
    /// hold right after set-up.
    pub run: Option<u32>,
    /// Calls reproducing the failure from the post-set-up state.
    pub sequence: Vec<InvariantCall>,
    /// Broken invariant, `None` if the last call itself failed.
    pub invariant: Option<String>,
    /// Number of accepted shrinking steps.
    pub shrinks: u32,
    /// Why the invariant or the last call failed.
    pub reason: Error,
}

/// Result of an invariant campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantReport {
    /// Runs executed, including the failing one.
    pub runs: u32,
    /// Target calls made, not counting shrinking.
    pub calls: u64,
    /// Target calls that reverted without failing the campaign.
    pub reverts: u64,
    /// Shrunk failure, `None` if every invariant held.
    pub failure: Option<InvariantFailure>,
}

impl InvariantReport {
    /// Returns `true` if every invariant held.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Failure reason, if any.
    pub fn into_result(self) -> Result<()> {
        match self.failure {
            Some(failure) => Err(failure.reason),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Broken {
    invariant: Option<String>,
    reason: Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Passed,
    Reverted,
}

/// Drives a [`StatefulExecutor`] through random call sequences.
pub struct InvariantRunner<E, S = RngSeedSource> {
    executor: E,
    seeds: S,
    config: FuzzConfig,
    matcher: EmitMatcher,
    senders: Vec<Address>,
}

impl<E: StatefulExecutor> InvariantRunner<E> {
    /// Runner drawing seeds from [`RngSeedSource`] seeded with `config.seed`.
    pub fn new(executor: E, config: FuzzConfig) -> Self {
        let seeds = RngSeedSource::new(config.seed);
        Self::with_seed_source(executor, config, seeds)
    }
}

impl<E: StatefulExecutor, S: SeedSource> InvariantRunner<E, S> {
    /// Runner drawing seeds from `seeds`; `config.seed` is unused.
    pub fn with_seed_source(executor: E, config: FuzzConfig, seeds: S) -> Self {
        let matcher = EmitMatcher::new(config.match_mode);

        Self {
            executor,
            seeds,
            config,
            matcher,
            senders: Vec::new(),
        }
    }

    /// Restricts callers to `senders`. With none, every call comes from a
    /// random address.
    pub fn with_senders(mut self, senders: Vec<Address>) -> Self {
        self.senders = senders;
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &FuzzConfig {
        &self.config
    }

    /// Wrapped executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Unwraps the executor.
    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Runs the campaign, checking `invariants` after every call to one of
    /// `targets`.
    ///
    /// Returns an error only if the configuration is invalid; broken
    /// invariants are reported in [`InvariantReport::failure`].
    pub fn run(
        &mut self,
        invariants: &[&str],
        targets: &[TargetFunction],
    ) -> Result<InvariantReport> {
        self.config.validate()?;
        if invariants.is_empty() {
            return Err(Error::InvalidConfig("no invariants to check".into()));
        }
        if targets.is_empty() {
            return Err(Error::InvalidConfig("no target functions".into()));
        }
        for param in targets.iter().flat_map(|target| &target.params) {
            param.validate()?;
        }

        log::debug!(
            "invariant campaign: {} runs of {} calls over {} targets",
            self.config.runs,
            self.config.depth,
            targets.len()
        );

        let mut report = InvariantReport {
            runs: 0,
            calls: 0,
            reverts: 0,
            failure: None,
        };

        self.executor.reset();
        if let Err(broken) = self.check_invariants(invariants) {
            log::info!("invariants broken right after set-up: {}", broken.reason);

            report.failure = Some(InvariantFailure {
                run: None,
                sequence: Vec::new(),
                invariant: broken.invariant,
                shrinks: 0,
                reason: broken.reason,
            });
            return Ok(report);
        }

        for run in 0..self.config.runs {
            report.runs = run + 1;
            self.executor.reset();

            let mut sequence = Vec::new();
            for _ in 0..self.config.depth {
                let call = self.next_call(targets)?;
                let step = self.step(&call, invariants);

                report.calls += 1;
                sequence.push(call);

                match step {
                    Ok(Step::Passed) => {}
                    Ok(Step::Reverted) => report.reverts += 1,
                    Err(broken) => {
                        log::debug!(
                            "run {run} failed after {} calls: {}",
                            sequence.len(),
                            broken.reason
                        );

                        let failure = self.shrink(invariants, targets, run, sequence, broken);

                        log::info!(
                            "invariant campaign falsified after {} runs, shrunk to {} calls: {}",
                            run + 1,
                            failure.sequence.len(),
                            failure.reason
                        );

                        report.failure = Some(failure);
                        return Ok(report);
                    }
                }
            }
        }

        log::debug!(
            "invariants held over {} calls, {} reverted",
            report.calls,
            report.reverts
        );

        Ok(report)
    }

    fn next_call(&mut self, targets: &[TargetFunction]) -> Result<InvariantCall> {
        let target = &targets[pick(self.seeds.random_seed(), targets.len())];

        let seed = self.seeds.random_seed();
        let sender = if self.senders.is_empty() {
            Address::from_slice(&seed.to_be_bytes::<32>()[12..])
        } else {
            self.senders[pick(seed, self.senders.len())]
        };

        let args = target
            .params
            .iter()
            .map(|param| param.bound(self.seeds.random_seed()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(InvariantCall {
            sender,
            target: target.name.clone(),
            args,
        })
    }

    fn step(&mut self, call: &InvariantCall, invariants: &[&str]) -> Result<Step, Broken> {
        let trace = self.executor.call(call.sender, &call.target, &call.args);

        match verify(&trace, &mut self.matcher) {
            Ok(()) => {}
            Err(Error::Reverted(_)) if !self.config.fail_on_revert => return Ok(Step::Reverted),
            Err(reason) => {
                return Err(Broken {
                    invariant: None,
                    reason,
                });
            }
        }

        self.check_invariants(invariants).map(|()| Step::Passed)
    }

    fn check_invariants(&mut self, invariants: &[&str]) -> Result<(), Broken> {
        for &invariant in invariants {
            let trace = self.executor.invoke(invariant, &[]);
            verify(&trace, &mut self.matcher).map_err(|reason| Broken {
                invariant: Some(invariant.into()),
                reason,
            })?;
        }

        Ok(())
    }

    /// Replays `sequence` from a fresh state, returning the index of the
    /// first failing call.
    fn replay(
        &mut self,
        sequence: &[InvariantCall],
        invariants: &[&str],
    ) -> Option<(usize, Broken)> {
        self.executor.reset();

        sequence.iter().enumerate().find_map(|(idx, call)| {
            self.step(call, invariants)
                .err()
                .map(|broken| (idx, broken))
        })
    }

    fn shrink(
        &mut self,
        invariants: &[&str],
        targets: &[TargetFunction],
        run: u32,
        mut sequence: Vec<InvariantCall>,
        mut broken: Broken,
    ) -> InvariantFailure {
        let mut budget = self.config.max_shrink_iters;
        let mut shrinks = 0;

        loop {
            let before = shrinks;

            let mut idx = 0;
            while idx < sequence.len() && budget > 0 {
                budget -= 1;

                let mut candidate = sequence.clone();
                candidate.remove(idx);

                match self.replay(&candidate, invariants) {
                    Some((failed_at, reason)) => {
                        candidate.truncate(failed_at + 1);
                        sequence = candidate;
                        broken = reason;
                        shrinks += 1;
                    }
                    None => idx += 1,
                }
            }

            let mut idx = 0;
            while idx < sequence.len() {
                let Some(target) = targets.iter().find(|t| t.name == sequence[idx].target) else {
                    idx += 1;
                    continue;
                };

                for (arg, param) in target.params.iter().enumerate() {
                    let shrunk = shrink_arg(sequence[idx].args[arg], param, &mut budget, |value| {
                        let mut candidate = sequence.clone();
                        candidate[idx].args[arg] = value;
                        self.replay(&candidate, invariants)
                    });

                    sequence[idx].args[arg] = shrunk.value;
                    shrinks += shrunk.steps;
                    if let Some((failed_at, reason)) = shrunk.failure {
                        sequence.truncate(failed_at + 1);
                        broken = reason;
                    }
                }

                idx += 1;
            }

            if shrinks == before || budget == 0 {
                break;
            }
        }

        if budget == 0 {
            log::debug!("invariant shrinking budget exhausted");
        }

        InvariantFailure {
            run: Some(run),
            sequence,
            invariant: broken.invariant,
            shrinks,
            reason: broken.reason,
        }
    }
}

fn pick(seed: U256, len: usize) -> usize {
    (seed.as_limbs()[0] % len as u64) as usize
}
