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

use alloy_primitives::{Address, B256, Bytes, Log, LogData};

/// Log emitted during execution.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventRecord {
    emitter: Address,
    data: LogData,
}

impl EventRecord {
    /// Returns `None` if more than four topics are given.
    pub fn new(emitter: Address, topics: Vec<B256>, data: impl Into<Bytes>) -> Option<Self> {
        LogData::new(topics, data.into()).map(|data| Self { emitter, data })
    }

    /// Log of `emitter` carrying already validated `data`.
    pub fn from_log_data(emitter: Address, data: LogData) -> Self {
        Self { emitter, data }
    }

    /// Contract that emitted the log.
    pub fn emitter(&self) -> Address {
        self.emitter
    }

    /// Indexed topics, at most four.
    pub fn topics(&self) -> &[B256] {
        self.data.topics()
    }

    /// ABI-encoded non-indexed fields.
    pub fn data(&self) -> &Bytes {
        &self.data.data
    }

    /// Topics and data together.
    pub fn log_data(&self) -> &LogData {
        &self.data
    }

    /// First topic, which is the event selector unless the event is anonymous.
    pub fn selector(&self) -> Option<B256> {
        self.topics().first().copied()
    }
}

impl From<Log> for EventRecord {
    fn from(log: Log) -> Self {
        Self {
            emitter: log.address,
            data: log.data,
        }
    }
}

impl From<EventRecord> for Log {
    fn from(record: EventRecord) -> Self {
        Log {
            address: record.emitter,
            data: record.data,
        }
    }
}

/// Fields of a log compared against the reference event.
///
/// Unchecked fields are ignored whatever their value. The topic count is
/// always compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LogMask {
    /// Per-position topic checks.
    pub topics: [bool; 4],
    /// Whether the non-indexed data is compared.
    pub data: bool,
}

impl LogMask {
    /// Checks everything.
    pub const ALL: Self = Self {
        topics: [true; 4],
        data: true,
    };

    /// Mask for a named event: the selector is always checked.
    pub const fn new(
        check_topic1: bool,
        check_topic2: bool,
        check_topic3: bool,
        check_data: bool,
    ) -> Self {
        Self {
            topics: [true, check_topic1, check_topic2, check_topic3],
            data: check_data,
        }
    }

    /// Mask for an anonymous event, where topic 0 is an ordinary indexed field.
    pub const fn anonymous(
        check_topic0: bool,
        check_topic1: bool,
        check_topic2: bool,
        check_topic3: bool,
        check_data: bool,
    ) -> Self {
        Self {
            topics: [check_topic0, check_topic1, check_topic2, check_topic3],
            data: check_data,
        }
    }

    /// `true` if none of the user-controlled flags is set.
    ///
    /// For named events the selector check is implicit and doesn't count.
    pub fn is_empty(&self, anonymous: bool) -> bool {
        let [topic0, topic1, topic2, topic3] = self.topics;
        let selector = anonymous && topic0;

        !(selector || topic1 || topic2 || topic3 || self.data)
    }
}

impl Default for LogMask {
    fn default() -> Self {
        Self::ALL
    }
}
