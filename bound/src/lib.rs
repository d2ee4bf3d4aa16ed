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

//! Bounded value sampling for fuzzed test arguments.
//!
//! [`bound`] folds an arbitrary 256-bit seed into `[min, max]` so that values
//! already inside the range stay untouched and the range edges remain
//! reachable. [`UintStrategy`] is a [`proptest`] strategy producing such
//! values directly, with edge biasing, fixtures and log-uniform sampling.

#![warn(missing_docs)]

mod bound;
mod error;
mod strategy;

pub use bound::{BoundConfig, Distribution, bound, bound_signed, exp2, log2_floor};
pub use error::BoundError;
pub use strategy::{UintStrategy, UintValueTree};

pub use alloy_primitives::{I256, U256};
