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

use crate::{EventRecord, LogMask, MatchError};
use alloy_primitives::{Address, LogData};

/// Declared expectation of a log.
///
/// Built with a builder-like API:
///
/// ```
/// use gfuzz_expect::{Address, ExpectedEmit, LogData};
///
/// let reference = LogData::new_unchecked(vec![Default::default()], Default::default());
/// let expected = ExpectedEmit::new(reference)
///     .with_mask(true, false, false, true)
///     .from_emitter(Address::repeat_byte(0x42));
///
/// assert_eq!(expected.address(), Some(Address::repeat_byte(0x42)));
/// ```
///
/// An expectation built with [`ExpectedEmit::pending`] has no reference
/// event yet: the next observed log becomes its reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpectedEmit {
    pub(crate) mask: LogMask,
    pub(crate) address: Option<Address>,
    pub(crate) anonymous: bool,
    pub(crate) reference: Option<LogData>,
    pub(crate) depth: usize,
    pub(crate) found: bool,
}

impl ExpectedEmit {
    /// Expects `reference` with every field checked.
    pub fn new(reference: LogData) -> Self {
        Self {
            reference: Some(reference),
            ..Self::pending()
        }
    }

    /// Expects the log emitted right after the declaration.
    pub fn pending() -> Self {
        Self {
            mask: LogMask::ALL,
            address: None,
            anonymous: false,
            reference: None,
            depth: 0,
            found: false,
        }
    }

    /// Sets which indexed topics and whether data are compared.
    pub fn with_mask(
        mut self,
        check_topic1: bool,
        check_topic2: bool,
        check_topic3: bool,
        check_data: bool,
    ) -> Self {
        let topic0 = self.mask.topics[0];
        self.mask = LogMask::new(check_topic1, check_topic2, check_topic3, check_data);
        if self.anonymous {
            self.mask.topics[0] = topic0;
        }
        self
    }

    /// Requires the log to be emitted by `address`.
    pub fn from_emitter(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Treats the reference as an anonymous event: topic 0 is compared only
    /// if `check_topic0`.
    pub fn anonymous(mut self, check_topic0: bool) -> Self {
        self.anonymous = true;
        self.mask.topics[0] = check_topic0;
        self
    }

    /// Sets the reference event.
    pub fn with_reference(mut self, reference: LogData) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Fields compared against the reference.
    pub fn mask(&self) -> LogMask {
        self.mask
    }

    /// Required emitter, if any.
    pub fn address(&self) -> Option<Address> {
        self.address
    }

    /// Whether topic 0 is an ordinary indexed field.
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Reference event, `None` while pending.
    pub fn reference(&self) -> Option<&LogData> {
        self.reference.as_ref()
    }

    /// Depth of the call frame that declared the expectation.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether a log has satisfied the expectation.
    pub fn is_found(&self) -> bool {
        self.found
    }

    /// Binds the reference event to `record`.
    pub(crate) fn fill(&mut self, record: &EventRecord) -> Result<(), MatchError> {
        if !self.anonymous && record.selector().is_none() {
            return Err(MatchError::MissingEventSelector);
        }

        self.reference = Some(record.log_data().clone());
        Ok(())
    }

    /// Compares `record` with the reference event under the mask.
    ///
    /// Unfilled expectations never match.
    pub(crate) fn check(&self, record: &EventRecord) -> Result<(), MatchError> {
        let Some(reference) = &self.reference else {
            return Err(MatchError::UnmatchedExpectation { remaining: 1 });
        };

        let (expected, actual) = (reference.topics(), record.topics());
        if expected.len() != actual.len() {
            return Err(MatchError::TopicCountMismatch {
                expected: expected.len(),
                actual: actual.len(),
            });
        }

        for (index, (expected, actual)) in expected.iter().zip(actual).enumerate() {
            if self.mask.topics[index] && expected != actual {
                return Err(MatchError::TopicMismatch {
                    index,
                    expected: *expected,
                    actual: *actual,
                });
            }
        }

        if let Some(expected) = self.address {
            if expected != record.emitter() {
                return Err(MatchError::AddressMismatch {
                    expected,
                    actual: record.emitter(),
                });
            }
        }

        if self.mask.data && reference.data != *record.data() {
            return Err(MatchError::DataMismatch);
        }

        Ok(())
    }
}
