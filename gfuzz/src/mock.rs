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

//! In-memory executor for testing the harness without an EVM.
//!
//! Test functions are plain Rust closures. They talk to fixture contracts
//! through a [`CallRecorder`], which turns every contract call, declared
//! expectation and emitted event into a [`TraceStep`].
//!
//! [`StatefulMockExecutor`] keeps a state value across calls for invariant
//! campaigns; [`MockToken`] is the stock fixture for it.

use crate::{
    executor::{ExecutionTrace, Executor, TraceStep},
    invariant::StatefulExecutor,
};
use alloy_sol_types::SolEvent;
use gfuzz_bound::U256;
use gfuzz_expect::{Address, CallKind, EventRecord, ExpectedEmit};
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

pub use events::{Greeted, Something, Transfer};

#[allow(missing_docs)]
mod events {
    alloy_sol_types::sol! {
        /// Emitted by `Emitter`.
        event Something(
            uint256 indexed topic1,
            uint256 indexed topic2,
            uint256 indexed topic3,
            uint256 data
        );

        /// Emitted by `Greeter` on every greeting.
        event Greeted(address indexed by, string greeting);

        /// Emitted by `MockToken` on mints, burns and transfers.
        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}

/// Installs a `RUST_LOG`-filtered subscriber writing to the test output.
///
/// Subsequent calls are no-ops.
pub fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Collects the trace of a single test invocation.
#[derive(Debug, Default)]
pub struct CallRecorder {
    steps: Vec<TraceStep>,
    depth: usize,
}

impl CallRecorder {
    /// Empty recorder at depth `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call depth, `0` inside the test function itself.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Declares `expected` in the current frame.
    pub fn expect_emit(&mut self, expected: ExpectedEmit) {
        self.steps.push(TraceStep::Expect(expected));
    }

    /// Emits `event` on behalf of `emitter`.
    pub fn emit(&mut self, emitter: Address, event: &impl SolEvent) {
        let record = EventRecord::from_log_data(emitter, event.encode_log_data());
        self.emit_record(record);
    }

    /// Emits an already encoded log.
    pub fn emit_record(&mut self, record: EventRecord) {
        self.steps.push(TraceStep::Emit(record));
    }

    /// Runs `f` inside a nested call frame.
    pub fn call<T>(&mut self, kind: CallKind, f: impl FnOnce(&mut Self) -> T) -> T {
        self.steps.push(TraceStep::Enter(kind));
        self.depth += 1;

        let res = f(self);

        self.depth -= 1;
        self.steps.push(TraceStep::Exit);

        res
    }

    /// Steps recorded so far.
    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    /// Trace of a successful invocation.
    pub fn into_trace(self) -> ExecutionTrace {
        ExecutionTrace::success(self.steps)
    }

    /// Trace of an invocation reverted with `reason`.
    pub fn revert(self, reason: impl Into<String>) -> ExecutionTrace {
        ExecutionTrace::revert(self.steps, reason)
    }
}

/// Test function run by [`MockExecutor`]; `Err` reverts with its message.
pub type TestFn = Box<dyn FnMut(&mut CallRecorder, &[U256]) -> Result<(), String>>;

/// [`Executor`] running registered closures.
#[derive(Default)]
pub struct MockExecutor {
    tests: BTreeMap<String, TestFn>,
    invocations: u32,
}

impl MockExecutor {
    /// Executor without tests; every invocation reverts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `test` under `name`, replacing any previous one.
    pub fn with_test<F>(mut self, name: impl Into<String>, test: F) -> Self
    where
        F: FnMut(&mut CallRecorder, &[U256]) -> Result<(), String> + 'static,
    {
        self.tests.insert(name.into(), Box::new(test));
        self
    }

    /// Total number of invocations, over all tests.
    pub fn invocations(&self) -> u32 {
        self.invocations
    }
}

impl Executor for MockExecutor {
    fn invoke(&mut self, test: &str, args: &[U256]) -> ExecutionTrace {
        self.invocations += 1;

        let mut recorder = CallRecorder::new();
        let Some(f) = self.tests.get_mut(test) else {
            return recorder.revert(format!("unknown test `{test}`"));
        };

        match f(&mut recorder, args) {
            Ok(()) => recorder.into_trace(),
            Err(reason) => recorder.revert(reason),
        }
    }
}

/// Contract emitting [`Something`] on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitter {
    address: Address,
}

impl Emitter {
    /// Emitter deployed at `address`.
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Deployment address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Emits a single [`Something`].
    pub fn emit_event(
        &self,
        rec: &mut CallRecorder,
        topic1: U256,
        topic2: U256,
        topic3: U256,
        data: U256,
    ) {
        rec.call(CallKind::Mutating, |rec| {
            rec.emit(
                self.address,
                &Something {
                    topic1,
                    topic2,
                    topic3,
                    data,
                },
            )
        });
    }

    /// Emits one event per element, in a single call.
    pub fn emit_multiple(&self, rec: &mut CallRecorder, events: &[[U256; 4]]) {
        rec.call(CallKind::Mutating, |rec| {
            for &[topic1, topic2, topic3, data] in events {
                rec.emit(
                    self.address,
                    &Something {
                        topic1,
                        topic2,
                        topic3,
                        data,
                    },
                );
            }
        });
    }

    /// Calls `inner` which emits the event.
    pub fn emit_nested(
        &self,
        rec: &mut CallRecorder,
        inner: &Emitter,
        topic1: U256,
        topic2: U256,
        topic3: U256,
        data: U256,
    ) {
        rec.call(CallKind::Mutating, |rec| inner.emit_event(rec, topic1, topic2, topic3, data));
    }

    /// View function, never emits.
    pub fn address_of(&self, rec: &mut CallRecorder) -> Address {
        rec.call(CallKind::Static, |_| self.address)
    }
}

/// Contract keeping the last greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeter {
    address: Address,
    greeting: String,
}

impl Greeter {
    /// Greeter deployed at `address` holding `greeting`.
    pub fn new(address: Address, greeting: impl Into<String>) -> Self {
        Self {
            address,
            greeting: greeting.into(),
        }
    }

    /// Deployment address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Stores `greeting` and emits [`Greeted`]. Reverts on an empty greeting.
    pub fn greet(
        &mut self,
        rec: &mut CallRecorder,
        by: Address,
        greeting: &str,
    ) -> Result<(), String> {
        rec.call(CallKind::Mutating, |rec| {
            if greeting.is_empty() {
                return Err("empty greeting".to_string());
            }

            self.greeting = greeting.into();
            rec.emit(
                self.address,
                &Greeted {
                    by,
                    greeting: greeting.into(),
                },
            );

            Ok(())
        })
    }

    /// View function returning the last greeting.
    pub fn greeting(&self, rec: &mut CallRecorder) -> String {
        rec.call(CallKind::Static, |_| self.greeting.clone())
    }
}

/// Fresh contracts for a single test invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreeterFixture {
    /// Greeter at [`GreeterFixture::GREETER`].
    pub greeter: Greeter,
    /// Emitter at [`GreeterFixture::EMITTER`].
    pub emitter: Emitter,
    /// Emitter at [`GreeterFixture::RELAY`], calling into `emitter`.
    pub relay: Emitter,
    /// Externally owned caller.
    pub user: Address,
}

impl GreeterFixture {
    /// Address of [`GreeterFixture::greeter`].
    pub const GREETER: Address = Address::new([0x01; 20]);
    /// Address of [`GreeterFixture::emitter`].
    pub const EMITTER: Address = Address::new([0x02; 20]);
    /// Address of [`GreeterFixture::relay`].
    pub const RELAY: Address = Address::new([0x03; 20]);
    /// Address of [`GreeterFixture::user`].
    pub const USER: Address = Address::new([0x42; 20]);

    /// Deploys fresh contracts.
    pub fn set_up() -> Self {
        Self {
            greeter: Greeter::new(Self::GREETER, "hello"),
            emitter: Emitter::new(Self::EMITTER),
            relay: Emitter::new(Self::RELAY),
            user: Self::USER,
        }
    }
}

/// Target function of a [`StatefulMockExecutor`]; `Err` reverts with its
/// message and discards the state changes.
pub type TargetFn<T> =
    Box<dyn FnMut(&mut T, &mut CallRecorder, Address, &[U256]) -> Result<(), String>>;

/// Invariant of a [`StatefulMockExecutor`]; `Err` breaks it.
pub type InvariantFn<T> = Box<dyn Fn(&T, &mut CallRecorder) -> Result<(), String>>;

/// [`StatefulExecutor`] over a plain state value.
///
/// [`Executor::invoke`] runs a registered invariant by name and falls back
/// to calling a target from [`Address::ZERO`].
pub struct StatefulMockExecutor<T> {
    initial: T,
    state: T,
    targets: BTreeMap<String, TargetFn<T>>,
    invariants: BTreeMap<String, InvariantFn<T>>,
    calls: u32,
}

impl<T: Clone> StatefulMockExecutor<T> {
    /// Executor whose post-set-up state is `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            state: initial.clone(),
            initial,
            targets: BTreeMap::new(),
            invariants: BTreeMap::new(),
            calls: 0,
        }
    }

    /// Registers target `name`, replacing any previous one.
    pub fn with_target<F>(mut self, name: impl Into<String>, target: F) -> Self
    where
        F: FnMut(&mut T, &mut CallRecorder, Address, &[U256]) -> Result<(), String> + 'static,
    {
        self.targets.insert(name.into(), Box::new(target));
        self
    }

    /// Registers invariant `name`, replacing any previous one.
    pub fn with_invariant<F>(mut self, name: impl Into<String>, invariant: F) -> Self
    where
        F: Fn(&T, &mut CallRecorder) -> Result<(), String> + 'static,
    {
        self.invariants.insert(name.into(), Box::new(invariant));
        self
    }

    /// Current state.
    pub fn state(&self) -> &T {
        &self.state
    }

    /// Total number of target calls, including reverted ones.
    pub fn calls(&self) -> u32 {
        self.calls
    }
}

impl<T: Clone> Executor for StatefulMockExecutor<T> {
    fn invoke(&mut self, test: &str, args: &[U256]) -> ExecutionTrace {
        let Some(invariant) = self.invariants.get(test) else {
            return self.call(Address::ZERO, test, args);
        };

        let mut recorder = CallRecorder::new();
        match invariant(&self.state, &mut recorder) {
            Ok(()) => recorder.into_trace(),
            Err(reason) => recorder.revert(reason),
        }
    }
}

impl<T: Clone> StatefulExecutor for StatefulMockExecutor<T> {
    fn reset(&mut self) {
        self.state = self.initial.clone();
    }

    fn call(&mut self, sender: Address, target: &str, args: &[U256]) -> ExecutionTrace {
        self.calls += 1;

        let mut recorder = CallRecorder::new();
        let Some(f) = self.targets.get_mut(target) else {
            return recorder.revert(format!("unknown target `{target}`"));
        };

        let snapshot = self.state.clone();
        match f(&mut self.state, &mut recorder, sender, args) {
            Ok(()) => recorder.into_trace(),
            Err(reason) => {
                self.state = snapshot;
                recorder.revert(reason)
            }
        }
    }
}

/// Fungible token with `mint`, `burn` and `transfer` targets.
///
/// The `invariantTotalSupply` invariant requires the balances to add up to
/// the total supply. [`MockToken::with_burn_bug`] breaks it by leaving the
/// supply untouched on burns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockToken {
    balances: BTreeMap<Address, U256>,
    total_supply: U256,
    burn_bug: bool,
}

impl MockToken {
    /// Token contract address.
    pub const ADDRESS: Address = Address::new([0x70; 20]);
    /// Receiver of every `transfer`.
    pub const TREASURY: Address = Address::new([0x7e; 20]);
    /// Name of the supply invariant.
    pub const INVARIANT: &'static str = "invariantTotalSupply";

    /// Correct token with no holders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Token whose burns keep the total supply.
    pub fn with_burn_bug() -> Self {
        Self {
            burn_bug: true,
            ..Self::default()
        }
    }

    /// Balance of `holder`.
    pub fn balance_of(&self, holder: Address) -> U256 {
        self.balances.get(&holder).copied().unwrap_or_default()
    }

    /// Sum of all minted and not burned tokens.
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Mints `amount` to `to`.
    pub fn mint(
        &mut self,
        rec: &mut CallRecorder,
        to: Address,
        amount: U256,
    ) -> Result<(), String> {
        rec.call(CallKind::Mutating, |rec| -> Result<(), String> {
            self.total_supply = self
                .total_supply
                .checked_add(amount)
                .ok_or_else(|| "supply overflow".to_string())?;
            self.credit(to, amount)?;
            self.log_transfer(rec, Address::ZERO, to, amount);

            Ok(())
        })
    }

    /// Burns `amount` of `from`'s tokens.
    pub fn burn(
        &mut self,
        rec: &mut CallRecorder,
        from: Address,
        amount: U256,
    ) -> Result<(), String> {
        rec.call(CallKind::Mutating, |rec| -> Result<(), String> {
            self.debit(from, amount)?;
            if !self.burn_bug {
                self.total_supply -= amount;
            }
            self.log_transfer(rec, from, Address::ZERO, amount);

            Ok(())
        })
    }

    /// Moves `amount` from `from` to `to`.
    pub fn transfer(
        &mut self,
        rec: &mut CallRecorder,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), String> {
        rec.call(CallKind::Mutating, |rec| -> Result<(), String> {
            self.debit(from, amount)?;
            self.credit(to, amount)?;
            self.log_transfer(rec, from, to, amount);

            Ok(())
        })
    }

    /// View checking that the balances add up to the total supply.
    pub fn check_supply(&self, rec: &mut CallRecorder) -> Result<(), String> {
        rec.call(CallKind::Static, |_| {
            let held = self
                .balances
                .values()
                .fold(U256::ZERO, |sum, balance| sum.saturating_add(*balance));

            if held == self.total_supply {
                Ok(())
            } else {
                Err(format!("holders have {held}, total supply is {}", self.total_supply))
            }
        })
    }

    /// Executor exposing `mint`, `burn` and `transfer` of the caller's tokens
    /// as targets, each taking an amount, and [`MockToken::INVARIANT`].
    pub fn executor(self) -> StatefulMockExecutor<Self> {
        StatefulMockExecutor::new(self)
            .with_target("mint", |token, rec, sender, args| {
                token.mint(rec, sender, amount(args))
            })
            .with_target("burn", |token, rec, sender, args| {
                token.burn(rec, sender, amount(args))
            })
            .with_target("transfer", |token, rec, sender, args| {
                token.transfer(rec, sender, Self::TREASURY, amount(args))
            })
            .with_invariant(Self::INVARIANT, |token, rec| token.check_supply(rec))
    }

    fn credit(&mut self, holder: Address, amount: U256) -> Result<(), String> {
        let balance = self
            .balance_of(holder)
            .checked_add(amount)
            .ok_or_else(|| "balance overflow".to_string())?;
        self.balances.insert(holder, balance);
        Ok(())
    }

    fn debit(&mut self, holder: Address, amount: U256) -> Result<(), String> {
        let balance = self
            .balance_of(holder)
            .checked_sub(amount)
            .ok_or_else(|| "insufficient balance".to_string())?;
        self.balances.insert(holder, balance);
        Ok(())
    }

    fn log_transfer(&self, rec: &mut CallRecorder, from: Address, to: Address, value: U256) {
        rec.emit(Self::ADDRESS, &Transfer { from, to, value });
    }
}

fn amount(args: &[U256]) -> U256 {
    args.first().copied().unwrap_or_default()
}
