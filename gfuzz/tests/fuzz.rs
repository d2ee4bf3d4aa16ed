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

use alloy_sol_types::SolEvent;
use gfuzz::{
    BoundConfig, Error, ExpectedEmit, FuzzConfig, FuzzReport, FuzzRunner, MatchError, U256,
    mock::{CallRecorder, GreeterFixture, MockExecutor, Something},
};
use proptest::prelude::*;

const MAX_LIMIT: u64 = 1000;

fn range(min: u64, max: u64) -> BoundConfig {
    BoundConfig::uniform(U256::from(min), U256::from(max)).unwrap()
}

fn assert_at_most(limit: u64) -> impl FnMut(&mut CallRecorder, &[U256]) -> Result<(), String> {
    move |_, args| {
        if args[0] > U256::from(limit) {
            Err(format!("{} > {limit}", args[0]))
        } else {
            Ok(())
        }
    }
}

fn assert_within(
    min: u64,
    max: u64,
) -> impl FnMut(&mut CallRecorder, &[U256]) -> Result<(), String> {
    move |_, args| {
        if args[0] < U256::from(min) || args[0] > U256::from(max) {
            Err(format!("{} outside [{min}, {max}]", args[0]))
        } else {
            Ok(())
        }
    }
}

/// Echoes its arguments through the emitter and expects exactly them back.
fn echo(rec: &mut CallRecorder, args: &[U256]) -> Result<(), String> {
    let fixture = GreeterFixture::set_up();
    let [a, b, c, d] = [args[0], args[1], args[0], args[1]];

    rec.expect_emit(
        ExpectedEmit::new(
            Something {
                topic1: a,
                topic2: b,
                topic3: c,
                data: d,
            }
            .encode_log_data(),
        )
        .from_emitter(fixture.emitter.address()),
    );
    fixture.emitter.emit_event(rec, a, b, c, d);

    Ok(())
}

fn fuzz(config: FuzzConfig, limit: u64) -> FuzzReport {
    let executor = MockExecutor::new().with_test("testAtMost", assert_at_most(limit));
    FuzzRunner::new(executor, config)
        .run("testAtMost", &[range(0, MAX_LIMIT)])
        .unwrap()
}

#[test]
fn bounded_fuzz_passes() {
    gfuzz::mock::init_logger();

    let executor = MockExecutor::new().with_test("testAtMost", assert_at_most(3));
    let mut runner = FuzzRunner::new(executor, FuzzConfig::default());

    let report = runner.run("testAtMost", &[range(1, 3)]).unwrap();

    assert!(report.is_success());
    assert_eq!(report.runs, FuzzConfig::DEFAULT_RUNS);
    assert_eq!(runner.executor().invocations(), FuzzConfig::DEFAULT_RUNS);
}

#[test]
fn expectations_hold_for_every_input() {
    gfuzz::mock::init_logger();

    let executor = MockExecutor::new().with_test("testEcho", echo);
    let report = FuzzRunner::new(executor, FuzzConfig::default().with_runs(64))
        .run("testEcho", &[BoundConfig::full(), range(10, 20)])
        .unwrap();

    assert_eq!(report.into_result(), Ok(()));
}

#[test]
fn counterexample_is_shrunk() {
    gfuzz::mock::init_logger();

    let report = fuzz(FuzzConfig::default(), 100);
    let counterexample = report.counterexample.expect("x <= 100 is falsifiable");

    assert_eq!(counterexample.args, vec![U256::from(101)]);
    assert_eq!(counterexample.reason, Error::Reverted("101 > 100".into()));

    // seeds reproduce the original failure
    let original = range(0, MAX_LIMIT).bound(counterexample.seeds[0]).unwrap();
    assert!(original > U256::from(100));
}

#[test]
fn same_seed_same_report() {
    let config = FuzzConfig::default().with_seed(7);

    assert_eq!(fuzz(config.clone(), 500), fuzz(config, 500));
}

#[test]
fn unmet_expectation_is_a_counterexample() {
    let executor = MockExecutor::new().with_test("testMissing", |rec, _| {
        rec.expect_emit(ExpectedEmit::pending());
        Ok(())
    });

    let report = FuzzRunner::new(executor, FuzzConfig::default())
        .run("testMissing", &[])
        .unwrap();

    assert_eq!(report.runs, 1);
    assert_eq!(
        report.into_result(),
        Err(Error::Expectation(MatchError::UnmatchedExpectation { remaining: 1 }))
    );
}

#[test]
fn logarithmic_params_are_never_zero() {
    let executor = MockExecutor::new().with_test("testNonZero", |_, args| {
        if args[0].is_zero() {
            return Err("zero".into());
        }
        Ok(())
    });
    let log = BoundConfig::logarithmic(U256::from(1), U256::MAX).unwrap();

    let report = FuzzRunner::new(executor, FuzzConfig::default())
        .run("testNonZero", &[log])
        .unwrap();

    assert!(report.is_success());
}

#[test]
fn logarithmic_params_stay_within_range() {
    let executor = MockExecutor::new()
        .with_test("testNarrow", assert_within(5, 7))
        .with_test("testWide", assert_within(5, 500));
    let mut runner = FuzzRunner::new(executor, FuzzConfig::default());

    let narrow = BoundConfig::logarithmic(U256::from(5), U256::from(7)).unwrap();
    assert!(runner.run("testNarrow", &[narrow]).unwrap().is_success());

    let wide = BoundConfig::logarithmic(U256::from(5), U256::from(500)).unwrap();
    assert!(runner.run("testWide", &[wide]).unwrap().is_success());
}

#[test]
fn zero_runs_are_rejected() {
    let executor = MockExecutor::new();
    let res = FuzzRunner::new(executor, FuzzConfig::default().with_runs(0)).run("testAny", &[]);

    assert!(matches!(res, Err(Error::InvalidConfig(_))));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn shrinks_to_smallest_failing_value(limit in 0u64..MAX_LIMIT, seed in any::<u64>()) {
        let report = fuzz(FuzzConfig::default().with_seed(seed), limit);

        // 256 runs miss the failing tail only if it's tiny
        if let Some(counterexample) = report.counterexample {
            prop_assert_eq!(counterexample.args, vec![U256::from(limit + 1)]);
        } else {
            prop_assert!(limit + 50 >= MAX_LIMIT);
        }
    }
}
