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

use crate::{EventRecord, ExpectedEmit, MatchError, MatchMode};

/// Result of feeding one log to an [`ExpectationQueue`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Observation {
    /// Nothing left to match, the log is extra.
    Ignored,
    /// The log became the reference event of a pending expectation.
    Filled,
    /// The log satisfied the head expectation.
    Matched,
    /// The log didn't match the head and was skipped.
    Skipped(MatchError),
}

/// FIFO of expectations declared in one call frame.
///
/// Expectations are kept in declaration order and marked found one by one;
/// the head is the first one not found yet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpectationQueue {
    items: Vec<ExpectedEmit>,
}

impl ExpectationQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends `expected` after every earlier declaration.
    pub fn push(&mut self, expected: ExpectedEmit) {
        self.items.push(expected);
    }

    /// Number of declared expectations, found or not.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of expectations not found yet.
    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|expected| !expected.found).count()
    }

    /// `true` for an empty queue too.
    pub fn all_found(&self) -> bool {
        self.items.iter().all(|expected| expected.found)
    }

    /// Oldest expectation not found yet.
    pub fn head(&self) -> Option<&ExpectedEmit> {
        self.items.iter().find(|expected| !expected.found)
    }

    /// Expectations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ExpectedEmit> {
        self.items.iter()
    }

    /// Drops every expectation.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Feeds one log.
    ///
    /// Pending expectations are filled first, in declaration order. Once
    /// all are filled, the log is compared with the head. In
    /// [`MatchMode::Ordered`] a mismatching log is skipped, in
    /// [`MatchMode::Strict`] it's an error.
    pub fn observe(
        &mut self,
        record: &EventRecord,
        mode: MatchMode,
    ) -> Result<Observation, MatchError> {
        if self.all_found() {
            return Ok(Observation::Ignored);
        }

        if let Some(pending) = self.items.iter_mut().find(|expected| expected.reference.is_none()) {
            pending.fill(record)?;
            return Ok(Observation::Filled);
        }

        let Some(head) = self.items.iter_mut().find(|expected| !expected.found) else {
            return Ok(Observation::Ignored);
        };

        match head.check(record) {
            Ok(()) => {
                head.found = true;
                Ok(Observation::Matched)
            }
            Err(err) => match mode {
                MatchMode::Ordered => Ok(Observation::Skipped(err)),
                MatchMode::Strict => Err(err),
            },
        }
    }
}
