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

//! [`proptest`] strategy for bounded unsigned integers.

use crate::bound::log2_floor;
use alloy_primitives::U256;
use proptest::{
    strategy::{NewTree, Strategy, ValueTree},
    test_runner::TestRunner,
};
use rand::{Rng, RngCore};

/// Value tree for bounded unsigned integers.
///
/// Shrinks by binary search between the lower bound and the current value.
/// [`ValueTree::current`] is always clamped into `[min, max]`.
#[derive(Debug, Clone)]
pub struct UintValueTree {
    lo: U256,
    curr: U256,
    hi: U256,
    fixed: bool,
    min: U256,
    max: U256,
}

impl UintValueTree {
    /// Tree starting at `start` and shrinking towards `min`.
    pub fn new(start: U256, min: U256, max: U256) -> Self {
        let start = start.clamp(min, max);

        Self {
            lo: min,
            curr: start,
            hi: start,
            fixed: false,
            min,
            max,
        }
    }

    /// Single-value tree that never shrinks.
    pub fn fixed(value: U256) -> Self {
        Self {
            fixed: true,
            ..Self::new(value, value, value)
        }
    }

    fn reposition(&mut self) -> bool {
        if self.hi < self.lo {
            return false;
        }

        let mid = self.lo + (self.hi - self.lo) / U256::from(2u8);

        if mid == self.curr {
            false
        } else {
            self.curr = mid;
            true
        }
    }
}

impl ValueTree for UintValueTree {
    type Value = U256;

    fn current(&self) -> U256 {
        self.curr.clamp(self.min, self.max)
    }

    fn simplify(&mut self) -> bool {
        if self.fixed || self.hi <= self.lo {
            return false;
        }

        self.hi = self.curr;
        self.reposition()
    }

    fn complicate(&mut self) -> bool {
        if self.fixed || self.hi <= self.lo {
            return false;
        }

        self.lo = self.curr.saturating_add(U256::from(1u8));
        self.reposition()
    }
}

/// Strategy for unsigned integers up to `uint256`.
///
/// Picks one of three generators per case, by weight:
/// 1. edge values: `min..=min + 3` or `max - 3..=max`;
/// 2. a user-supplied fixture, clamped into the range;
/// 3. a random value: uniform bit width first, then uniform bits, or
///    log-uniform magnitude when log sampling is enabled.
#[derive(Debug, Clone)]
pub struct UintStrategy {
    bits: usize,
    fixtures: Vec<U256>,
    edge_weight: usize,
    fixtures_weight: usize,
    random_weight: usize,
    min: U256,
    max: U256,
    log_sampling: bool,
}

impl UintStrategy {
    /// Default weight of edge values.
    pub const EDGE_WEIGHT: usize = 10;
    /// Default weight of fixtures.
    pub const FIXTURES_WEIGHT: usize = 40;
    /// Default weight of random values.
    pub const RANDOM_WEIGHT: usize = 50;

    /// Strategy for `uint<bits>` limited to `[min, max]`.
    ///
    /// Missing bounds default to the type's bounds. `bits` is clamped into `1..=256`.
    pub fn new(bits: usize, min: Option<U256>, max: Option<U256>) -> Self {
        let bits = bits.clamp(1, 256);
        let type_max = Self::type_max(bits);

        let min = min.unwrap_or(U256::ZERO).min(type_max);
        let max = max.unwrap_or(type_max).min(type_max).max(min);

        Self {
            bits,
            fixtures: Vec::new(),
            edge_weight: Self::EDGE_WEIGHT,
            fixtures_weight: Self::FIXTURES_WEIGHT,
            random_weight: Self::RANDOM_WEIGHT,
            min,
            max,
            log_sampling: false,
        }
    }

    /// Largest value of `uint<bits>`.
    pub fn type_max(bits: usize) -> U256 {
        if bits >= 256 {
            U256::MAX
        } else {
            (U256::from(1u8) << bits) - U256::from(1u8)
        }
    }

    /// Adds fixtures. Values wider than the type are dropped.
    pub fn with_fixtures(mut self, fixtures: impl IntoIterator<Item = U256>) -> Self {
        let type_max = Self::type_max(self.bits);

        for fixture in fixtures {
            if fixture > type_max {
                log::warn!("{fixture} is not a valid uint{} fixture", self.bits);
                continue;
            }
            self.fixtures.push(fixture);
        }

        self
    }

    /// Overrides generator weights.
    pub fn with_weights(mut self, edge: usize, fixtures: usize, random: usize) -> Self {
        self.edge_weight = edge;
        self.fixtures_weight = fixtures;
        self.random_weight = random;
        self
    }

    /// Switches random values to log-uniform magnitude.
    pub fn with_log_sampling(mut self, enabled: bool) -> Self {
        self.log_sampling = enabled;
        self
    }

    /// Inclusive bounds of generated values.
    pub fn bounds(&self) -> (U256, U256) {
        (self.min, self.max)
    }

    fn tree(&self, start: U256) -> UintValueTree {
        UintValueTree::new(start, self.min, self.max)
    }

    fn generate_edge_tree(&self, runner: &mut TestRunner) -> NewTree<Self> {
        let rng = runner.rng();
        let offset = U256::from(rng.gen_range(0u8..4));

        let start = if rng.gen_bool(0.5) {
            self.min.saturating_add(offset)
        } else {
            self.max.saturating_sub(offset)
        };

        Ok(self.tree(start))
    }

    fn generate_fixtures_tree(&self, runner: &mut TestRunner) -> NewTree<Self> {
        if self.fixtures.is_empty() {
            return self.generate_random_tree(runner);
        }

        let idx = runner.rng().gen_range(0..self.fixtures.len());

        Ok(self.tree(self.fixtures[idx]))
    }

    fn generate_random_tree(&self, runner: &mut TestRunner) -> NewTree<Self> {
        let start = if self.log_sampling {
            self.random_log_uniform(runner.rng())
        } else {
            self.random_uniform(runner.rng())
        };

        Ok(self.tree(start))
    }

    fn random_bits(rng: &mut impl RngCore, width: usize) -> U256 {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        let value = U256::from_be_bytes(bytes);

        if width >= 256 {
            value
        } else {
            value & ((U256::from(1u8) << width) - U256::from(1u8))
        }
    }

    fn random_uniform(&self, rng: &mut impl RngCore) -> U256 {
        let width = rng.gen_range(0..=self.bits);
        let value = Self::random_bits(rng, width);

        if self.max <= self.min {
            return self.min;
        }

        let range = (self.max - self.min).wrapping_add(U256::from(1u8));
        if range.is_zero() {
            value
        } else {
            self.min + value % range
        }
    }

    fn random_log_uniform(&self, rng: &mut impl RngCore) -> U256 {
        if self.max <= self.min {
            return self.min;
        }

        let lo = log2_floor(self.min).unwrap_or(0);
        let hi = log2_floor(self.max).unwrap_or(0);
        let exponent = rng.gen_range(lo..=hi);

        let magnitude = U256::from(1u8) << exponent;
        let value = magnitude | Self::random_bits(rng, exponent);

        value.clamp(self.min, self.max)
    }
}

impl Strategy for UintStrategy {
    type Tree = UintValueTree;
    type Value = U256;

    fn new_tree(&self, runner: &mut TestRunner) -> NewTree<Self> {
        let total = self.edge_weight + self.fixtures_weight + self.random_weight;
        if total == 0 {
            return self.generate_random_tree(runner);
        }

        match runner.rng().gen_range(0..total) {
            x if x < self.edge_weight => self.generate_edge_tree(runner),
            x if x < self.edge_weight + self.fixtures_weight => {
                self.generate_fixtures_tree(runner)
            }
            _ => self.generate_random_tree(runner),
        }
    }
}
