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

use crate::{Error, Result};
use gfuzz_expect::MatchMode;
use std::{env, str::FromStr};

/// Fuzz runner configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzConfig {
    /// Number of invocations per test.
    pub runs: u32,
    /// Seed of the default seed source.
    pub seed: u64,
    /// Upper limit of extra invocations spent on shrinking a counterexample.
    pub max_shrink_iters: u32,
    /// How unexpected logs are treated.
    pub match_mode: MatchMode,
    /// Calls per run of an invariant campaign.
    pub depth: u32,
    /// Whether a reverted call fails an invariant campaign.
    pub fail_on_revert: bool,
}

impl FuzzConfig {
    /// Default for [`FuzzConfig::runs`].
    pub const DEFAULT_RUNS: u32 = 256;
    /// Default for [`FuzzConfig::seed`].
    pub const DEFAULT_SEED: u64 = 0x5eed;
    /// Default for [`FuzzConfig::max_shrink_iters`].
    pub const DEFAULT_MAX_SHRINK_ITERS: u32 = 256;
    /// Default for [`FuzzConfig::depth`].
    pub const DEFAULT_DEPTH: u32 = 15;

    /// Overrides [`FuzzConfig::runs`].
    pub const RUNS_ENV: &'static str = "GFUZZ_RUNS";
    /// Overrides [`FuzzConfig::seed`].
    pub const SEED_ENV: &'static str = "GFUZZ_SEED";
    /// Overrides [`FuzzConfig::max_shrink_iters`].
    pub const MAX_SHRINK_ITERS_ENV: &'static str = "GFUZZ_MAX_SHRINK_ITERS";
    /// Overrides [`FuzzConfig::depth`].
    pub const DEPTH_ENV: &'static str = "GFUZZ_DEPTH";
    /// Overrides [`FuzzConfig::fail_on_revert`], `true` or `false`.
    pub const FAIL_ON_REVERT_ENV: &'static str = "GFUZZ_FAIL_ON_REVERT";

    /// Default config overridden by `GFUZZ_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides looked up by environment variable name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(runs) = parse(&lookup, Self::RUNS_ENV)? {
            self.runs = runs;
        }
        if let Some(seed) = parse(&lookup, Self::SEED_ENV)? {
            self.seed = seed;
        }
        if let Some(iters) = parse(&lookup, Self::MAX_SHRINK_ITERS_ENV)? {
            self.max_shrink_iters = iters;
        }
        if let Some(depth) = parse(&lookup, Self::DEPTH_ENV)? {
            self.depth = depth;
        }
        if let Some(fail_on_revert) = parse(&lookup, Self::FAIL_ON_REVERT_ENV)? {
            self.fail_on_revert = fail_on_revert;
        }

        self.validate().map(|()| self)
    }

    /// Sets [`FuzzConfig::runs`].
    pub fn with_runs(mut self, runs: u32) -> Self {
        self.runs = runs;
        self
    }

    /// Sets [`FuzzConfig::seed`].
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets [`FuzzConfig::max_shrink_iters`].
    pub fn with_max_shrink_iters(mut self, iters: u32) -> Self {
        self.max_shrink_iters = iters;
        self
    }

    /// Sets [`FuzzConfig::match_mode`].
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Sets [`FuzzConfig::depth`].
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Sets [`FuzzConfig::fail_on_revert`].
    pub fn with_fail_on_revert(mut self, fail_on_revert: bool) -> Self {
        self.fail_on_revert = fail_on_revert;
        self
    }

    /// Rejects configs no campaign can run with.
    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(Error::InvalidConfig("`runs` must be positive".into()));
        }
        if self.depth == 0 {
            return Err(Error::InvalidConfig("`depth` must be positive".into()));
        }

        Ok(())
    }
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            runs: Self::DEFAULT_RUNS,
            seed: Self::DEFAULT_SEED,
            max_shrink_iters: Self::DEFAULT_MAX_SHRINK_ITERS,
            match_mode: MatchMode::Ordered,
            depth: Self::DEFAULT_DEPTH,
            fail_on_revert: false,
        }
    }
}

fn parse<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|err| Error::InvalidConfig(format!("{key}={raw:?}: {err}")))
        })
        .transpose()
}
