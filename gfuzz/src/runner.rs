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

use crate::{
    Error, Result,
    config::FuzzConfig,
    executor::{ExecutionTrace, Executor, Outcome, RngSeedSource, SeedSource, replay},
};
use gfuzz_bound::{BoundConfig, Distribution, U256, UintValueTree};
use gfuzz_expect::EmitMatcher;
use proptest::strategy::ValueTree;

/// Failing input found by [`FuzzRunner::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterexample {
    /// Zero-based index of the failing run.
    pub run: u32,
    /// Raw seeds of the failing run, before bounding.
    pub seeds: Vec<U256>,
    /// Bounded and shrunk arguments.
    pub args: Vec<U256>,
    /// Number of accepted shrinking steps.
    pub shrinks: u32,
    /// Why the test failed on `args`.
    pub reason: Error,
}

/// Result of fuzzing a single test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzReport {
    /// Name of the fuzzed test.
    pub test: String,
    /// Runs executed, including the failing one.
    pub runs: u32,
    /// Shrunk failing input, `None` if every run passed.
    pub counterexample: Option<Counterexample>,
}

impl FuzzReport {
    /// Returns `true` if no counterexample was found.
    pub fn is_success(&self) -> bool {
        self.counterexample.is_none()
    }

    /// Failure reason of the counterexample, if any.
    pub fn into_result(self) -> Result<()> {
        match self.counterexample {
            Some(counterexample) => Err(counterexample.reason),
            None => Ok(()),
        }
    }
}

/// Checks a single invocation: it must not revert and its logs must satisfy
/// every declared expectation.
pub fn verify(trace: &ExecutionTrace, matcher: &mut EmitMatcher) -> Result<()> {
    if let Outcome::Revert(reason) = &trace.outcome {
        return Err(Error::Reverted(reason.clone()));
    }

    replay(trace, matcher).map_err(Into::into)
}

/// Drives an [`Executor`] with bounded random arguments.
pub struct FuzzRunner<E, S = RngSeedSource> {
    executor: E,
    seeds: S,
    config: FuzzConfig,
    matcher: EmitMatcher,
}

impl<E: Executor> FuzzRunner<E> {
    /// Runner drawing seeds from [`RngSeedSource`] seeded with `config.seed`.
    pub fn new(executor: E, config: FuzzConfig) -> Self {
        let seeds = RngSeedSource::new(config.seed);
        Self::with_seed_source(executor, config, seeds)
    }
}

impl<E: Executor, S: SeedSource> FuzzRunner<E, S> {
    /// Runner drawing seeds from `seeds`; `config.seed` is unused.
    pub fn with_seed_source(executor: E, config: FuzzConfig, seeds: S) -> Self {
        let matcher = EmitMatcher::new(config.match_mode);

        Self {
            executor,
            seeds,
            config,
            matcher,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &FuzzConfig {
        &self.config
    }

    /// Wrapped executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Mutable access to the wrapped executor.
    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    /// Unwraps the executor.
    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Fuzzes `test`, one argument per entry of `params`.
    ///
    /// Returns an error only if the configuration or a parameter range is
    /// invalid; test failures are reported in [`FuzzReport::counterexample`].
    pub fn run(&mut self, test: &str, params: &[BoundConfig]) -> Result<FuzzReport> {
        self.config.validate()?;
        for param in params {
            param.validate()?;
        }

        log::debug!(
            "fuzzing `{test}`: {} runs, {} params",
            self.config.runs,
            params.len()
        );

        for run in 0..self.config.runs {
            let seeds: Vec<_> = params.iter().map(|_| self.seeds.random_seed()).collect();
            let args = params
                .iter()
                .zip(&seeds)
                .map(|(param, &seed)| param.bound(seed))
                .collect::<Result<Vec<_>, _>>()?;

            if let Err(reason) = self.check(test, &args) {
                log::debug!("`{test}` failed on run {run} with {args:?}: {reason}");

                let counterexample = self.shrink(test, params, run, seeds, args, reason);

                log::info!(
                    "`{test}` falsified after {} runs, shrunk to {:?}: {}",
                    run + 1,
                    counterexample.args,
                    counterexample.reason
                );

                return Ok(FuzzReport {
                    test: test.into(),
                    runs: run + 1,
                    counterexample: Some(counterexample),
                });
            }
        }

        log::debug!("`{test}` passed {} runs", self.config.runs);

        Ok(FuzzReport {
            test: test.into(),
            runs: self.config.runs,
            counterexample: None,
        })
    }

    fn check(&mut self, test: &str, args: &[U256]) -> Result<()> {
        let trace = self.executor.invoke(test, args);
        verify(&trace, &mut self.matcher)
    }

    fn shrink(
        &mut self,
        test: &str,
        params: &[BoundConfig],
        run: u32,
        seeds: Vec<U256>,
        mut args: Vec<U256>,
        mut reason: Error,
    ) -> Counterexample {
        let mut budget = self.config.max_shrink_iters;
        let mut shrinks = 0;

        for (idx, param) in params.iter().enumerate() {
            let shrunk = shrink_arg(args[idx], param, &mut budget, |candidate| {
                let mut candidate_args = args.clone();
                candidate_args[idx] = candidate;
                self.check(test, &candidate_args).err()
            });

            args[idx] = shrunk.value;
            shrinks += shrunk.steps;
            if let Some(err) = shrunk.failure {
                reason = err;
            }
        }

        if budget == 0 {
            log::debug!("`{test}` shrinking budget exhausted");
        }

        Counterexample {
            run,
            seeds,
            args,
            shrinks,
            reason,
        }
    }
}

/// Outcome of [`shrink_arg`].
pub(crate) struct Shrunk<T> {
    /// Smallest failing value found.
    pub value: U256,
    /// Failure observed on `value`, `None` if nothing smaller failed.
    pub failure: Option<T>,
    /// Number of strictly smaller failing values accepted.
    pub steps: u32,
}

/// Binary-searches `param`'s range below `value` for the smallest input on
/// which `fails` still reports a failure, spending at most `budget` calls.
///
/// Logarithmic parameters are returned as is: their values aren't fixed
/// points of `bound`, so a shrunk value couldn't be reproduced from a seed.
pub(crate) fn shrink_arg<T>(
    value: U256,
    param: &BoundConfig,
    budget: &mut u32,
    mut fails: impl FnMut(U256) -> Option<T>,
) -> Shrunk<T> {
    let mut shrunk = Shrunk {
        value,
        failure: None,
        steps: 0,
    };

    if param.distribution == Distribution::Logarithmic {
        return shrunk;
    }

    let mut tree = UintValueTree::new(value, param.min, param.max);
    if !tree.simplify() {
        return shrunk;
    }

    while *budget > 0 {
        *budget -= 1;
        let candidate = tree.current();

        let progressed = match fails(candidate) {
            Some(failure) => {
                if candidate < shrunk.value {
                    shrunk.value = candidate;
                    shrunk.steps += 1;
                }
                shrunk.failure = Some(failure);
                tree.simplify()
            }
            None => tree.complicate(),
        };

        if !progressed {
            break;
        }
    }

    shrunk
}
