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

//! Call-scoped expectation matcher.

use crate::{EventRecord, ExpectationQueue, ExpectedEmit, MatchError, Observation};

/// Kind of a call frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// May change state; closing it checks the caller's expectations.
    #[default]
    Mutating,
    /// Pure or view call, never checks expectations.
    Static,
}

/// How logs that don't match the head expectation are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Unrelated logs may be interleaved, expected ones must appear in order.
    #[default]
    Ordered,
    /// Every log observed while an expectation is outstanding must match it.
    Strict,
}

/// State of an [`EmitMatcher`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MatchState {
    /// Nothing was declared.
    #[default]
    Idle,
    /// Some expectations are outstanding.
    Armed,
    /// Everything declared so far was matched.
    Satisfied,
    /// Terminal until [`EmitMatcher::reset`].
    Failed(MatchError),
}

#[derive(Debug, Default)]
struct Scope {
    kind: CallKind,
    queue: ExpectationQueue,
}

/// Matches observed logs against expectations, frame by frame.
///
/// The matcher keeps one [`ExpectationQueue`] per open call frame; index in
/// the stack is the call depth, `0` being the test itself. Logs go to the
/// innermost frame that still has outstanding expectations, so nested calls
/// see their ancestors' expectations.
///
/// When a [`CallKind::Mutating`] call returns, its caller's queue (if any)
/// must be fully matched; it's then cleared so that the next call can be
/// covered by new declarations.
#[derive(Debug)]
pub struct EmitMatcher {
    mode: MatchMode,
    scopes: Vec<Scope>,
    state: MatchState,
    last_mismatch: Option<MatchError>,
}

impl Default for EmitMatcher {
    fn default() -> Self {
        Self::new(MatchMode::default())
    }
}

impl EmitMatcher {
    /// Idle matcher with only the test frame open.
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            scopes: vec![Scope::default()],
            state: MatchState::Idle,
            last_mismatch: None,
        }
    }

    /// How unrelated logs are treated.
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Current state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Depth of the current call frame.
    pub fn depth(&self) -> usize {
        self.scopes.len().saturating_sub(1)
    }

    /// Number of expectations not found yet, over all frames.
    pub fn outstanding(&self) -> usize {
        self.scopes.iter().map(|scope| scope.queue.remaining()).sum()
    }

    /// Last log skipped in [`MatchMode::Ordered`], and why.
    pub fn last_mismatch(&self) -> Option<&MatchError> {
        self.last_mismatch.as_ref()
    }

    /// Forgets everything, ready for the next test invocation.
    pub fn reset(&mut self) {
        *self = Self::new(self.mode);
    }

    /// Declares an expectation in the current frame.
    pub fn declare(&mut self, mut expected: ExpectedEmit) -> Result<(), MatchError> {
        self.ensure_not_failed()?;

        if expected.mask.is_empty(expected.anonymous) {
            return self.fail(MatchError::EmptyMatchMask);
        }

        expected.depth = self.depth();
        expected.found = false;

        log::trace!("depth {}: expecting {expected:?}", expected.depth);

        self.current_scope_mut().queue.push(expected);
        self.state = MatchState::Armed;

        Ok(())
    }

    /// Feeds a log emitted in the current frame.
    pub fn observe(&mut self, record: &EventRecord) -> Result<(), MatchError> {
        self.ensure_not_failed()?;

        let Some(scope) = self
            .scopes
            .iter_mut()
            .rev()
            .find(|scope| !scope.queue.all_found())
        else {
            return Ok(());
        };

        match scope.queue.observe(record, self.mode) {
            Ok(Observation::Skipped(err)) => {
                log::trace!("skipping log of {}: {err}", record.emitter());
                self.last_mismatch = Some(err);
            }
            Ok(Observation::Matched) => {
                log::trace!("log of {} matched", record.emitter());
                if self.outstanding() == 0 {
                    self.state = MatchState::Satisfied;
                }
            }
            Ok(Observation::Filled | Observation::Ignored) => {}
            Err(err) => return self.fail(err),
        }

        Ok(())
    }

    /// Opens a nested call frame.
    pub fn enter_call(&mut self, kind: CallKind) -> Result<(), MatchError> {
        self.ensure_not_failed()?;

        self.scopes.push(Scope {
            kind,
            queue: ExpectationQueue::new(),
        });

        Ok(())
    }

    /// Closes the current call frame.
    ///
    /// Fails if the frame itself leaves expectations unmatched, or if it's a
    /// mutating call and its caller's expectations aren't all matched.
    pub fn exit_call(&mut self) -> Result<(), MatchError> {
        self.ensure_not_failed()?;

        if self.scopes.len() <= 1 {
            return self.fail(MatchError::ScopeUnderflow);
        }

        let Some(closed) = self.scopes.pop() else {
            return self.fail(MatchError::ScopeUnderflow);
        };

        Self::drain(&closed.queue).or_else(|err| self.fail(err))?;

        if closed.kind == CallKind::Static {
            return Ok(());
        }

        let caller = self.current_scope_mut();
        if caller.queue.is_empty() {
            return Ok(());
        }

        Self::drain(&caller.queue).or_else(|err| self.fail(err))?;

        self.current_scope_mut().queue.clear();
        self.settle();

        Ok(())
    }

    /// Closes the test frame, and any frame left open, checking every queue.
    pub fn finish(&mut self) -> Result<(), MatchError> {
        self.ensure_not_failed()?;

        while let Some(scope) = self.scopes.pop() {
            Self::drain(&scope.queue).or_else(|err| self.fail(err))?;
        }
        self.scopes.push(Scope::default());
        self.settle();

        Ok(())
    }

    fn drain(queue: &ExpectationQueue) -> Result<(), MatchError> {
        match queue.remaining() {
            0 => Ok(()),
            remaining => Err(MatchError::UnmatchedExpectation { remaining }),
        }
    }

    fn settle(&mut self) {
        if self.outstanding() == 0 && self.state == MatchState::Armed {
            self.state = MatchState::Satisfied;
        }
    }

    fn current_scope_mut(&mut self) -> &mut Scope {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::default());
        }

        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn ensure_not_failed(&self) -> Result<(), MatchError> {
        match &self.state {
            MatchState::Failed(err) => Err(err.clone()),
            _ => Ok(()),
        }
    }

    fn fail<T>(&mut self, err: MatchError) -> Result<T, MatchError> {
        log::debug!("expectation scope failed at depth {}: {err}", self.depth());
        if let Some(mismatch) = &self.last_mismatch {
            log::debug!("last skipped log: {mismatch}");
        }

        self.state = MatchState::Failed(err.clone());
        Err(err)
    }
}
