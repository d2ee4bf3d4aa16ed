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

use crate::*;
use alloy_primitives::U256;
use alloy_sol_types::{SolEvent, sol};
use proptest::prelude::*;

sol! {
    event Something(
        uint256 indexed topic1,
        uint256 indexed topic2,
        uint256 indexed topic3,
        uint256 data
    );
    event SomethingElse(uint256 indexed topic1);
    event NonIndexedEvent(uint256 value);
    event Anon(uint256 indexed topic0, uint256 indexed topic1, uint256 data) anonymous;
    event AnonNoTopics(uint256 data) anonymous;
}

fn emitter() -> Address {
    Address::repeat_byte(0xee)
}

fn stranger() -> Address {
    Address::repeat_byte(0x51)
}

fn something(a: u64, b: u64, c: u64, d: u64) -> LogData {
    Something {
        topic1: U256::from(a),
        topic2: U256::from(b),
        topic3: U256::from(c),
        data: U256::from(d),
    }
    .encode_log_data()
}

fn non_indexed(value: u64) -> LogData {
    NonIndexedEvent {
        value: U256::from(value),
    }
    .encode_log_data()
}

fn anon(a: u64, b: u64, d: u64) -> LogData {
    Anon {
        topic0: U256::from(a),
        topic1: U256::from(b),
        data: U256::from(d),
    }
    .encode_log_data()
}

fn topic(value: u64) -> B256 {
    B256::from(U256::from(value).to_be_bytes::<32>())
}

fn record(data: LogData) -> EventRecord {
    EventRecord::from_log_data(emitter(), data)
}

/// Declares `expectations`, then runs one mutating call emitting `logs`.
fn run_call(
    matcher: &mut EmitMatcher,
    expectations: Vec<ExpectedEmit>,
    logs: Vec<EventRecord>,
) -> Result<(), MatchError> {
    for expected in expectations {
        matcher.declare(expected)?;
    }
    matcher.enter_call(CallKind::Mutating)?;
    for log in &logs {
        matcher.observe(log)?;
    }
    matcher.exit_call()?;
    matcher.finish()
}

#[test]
fn exact_match_satisfies_scope() {
    let mut matcher = EmitMatcher::default();

    run_call(
        &mut matcher,
        vec![ExpectedEmit::new(something(1, 2, 3, 4))],
        vec![record(something(1, 2, 3, 4))],
    )
    .unwrap();

    assert_eq!(matcher.state(), &MatchState::Satisfied);
}

#[test]
fn different_event_fails_strict_mode_immediately() {
    let mut matcher = EmitMatcher::new(MatchMode::Strict);
    matcher.declare(ExpectedEmit::new(something(1, 2, 3, 4))).unwrap();
    matcher.enter_call(CallKind::Mutating).unwrap();

    let err = matcher.observe(&record(non_indexed(1))).unwrap_err();
    assert_eq!(
        err,
        MatchError::TopicCountMismatch {
            expected: 4,
            actual: 1
        }
    );
    assert_eq!(matcher.state(), &MatchState::Failed(err.clone()));

    // sticky until reset
    assert_eq!(matcher.observe(&record(something(1, 2, 3, 4))), Err(err.clone()));
    assert_eq!(matcher.exit_call(), Err(err));

    matcher.reset();
    assert_eq!(matcher.state(), &MatchState::Idle);
}

#[test]
fn different_event_fails_ordered_mode_at_scope_end() {
    let mut matcher = EmitMatcher::default();

    let err = run_call(
        &mut matcher,
        vec![ExpectedEmit::new(something(1, 2, 3, 4))],
        vec![record(something(1, 2, 3, 5))],
    )
    .unwrap_err();

    assert_eq!(err, MatchError::UnmatchedExpectation { remaining: 1 });
    assert_eq!(matcher.last_mismatch(), Some(&MatchError::DataMismatch));
}

#[test]
fn interleaved_unrelated_logs_are_tolerated() {
    let mut matcher = EmitMatcher::default();

    run_call(
        &mut matcher,
        vec![
            ExpectedEmit::new(something(1, 2, 3, 4)),
            ExpectedEmit::new(something(1, 2, 3, 4)),
        ],
        vec![
            record(non_indexed(1)),
            record(something(1, 2, 3, 4)),
            record(something(1, 2, 3, 4)),
            record(something(1, 2, 3, 4)),
        ],
    )
    .unwrap();

    assert_eq!(matcher.state(), &MatchState::Satisfied);
}

#[test]
fn expectations_must_match_in_declared_order() {
    let mut matcher = EmitMatcher::default();

    let err = run_call(
        &mut matcher,
        vec![
            ExpectedEmit::new(something(1, 2, 3, 4)),
            ExpectedEmit::new(non_indexed(7)),
        ],
        vec![record(non_indexed(7)), record(something(1, 2, 3, 4))],
    )
    .unwrap_err();

    assert_eq!(err, MatchError::UnmatchedExpectation { remaining: 1 });
}

#[test]
fn unchecked_fields_are_ignored() {
    let mut matcher = EmitMatcher::default();

    run_call(
        &mut matcher,
        vec![ExpectedEmit::new(something(1, 2, 3, 4)).with_mask(true, false, true, false)],
        vec![record(something(1, 99, 3, 100))],
    )
    .unwrap();
}

#[test]
fn checked_topic_mismatch_is_reported() {
    let mut matcher = EmitMatcher::new(MatchMode::Strict);

    let err = run_call(
        &mut matcher,
        vec![ExpectedEmit::new(something(1, 2, 3, 4)).with_mask(true, true, true, false)],
        vec![record(something(1, 9, 3, 4))],
    )
    .unwrap_err();

    assert_eq!(
        err,
        MatchError::TopicMismatch {
            index: 2,
            expected: topic(2),
            actual: topic(9),
        }
    );
}

#[test]
fn selector_is_always_checked_for_named_events() {
    let mut matcher = EmitMatcher::default();

    let reference = SomethingElse {
        topic1: U256::from(1),
    }
    .encode_log_data();
    // same topic count, other selector
    let other = LogData::new_unchecked(
        vec![Something::SIGNATURE_HASH, topic(1)],
        Default::default(),
    );

    let err = run_call(
        &mut matcher,
        vec![ExpectedEmit::new(reference).with_mask(true, false, false, false)],
        vec![record(other)],
    )
    .unwrap_err();

    assert_eq!(err, MatchError::UnmatchedExpectation { remaining: 1 });
    assert!(matches!(
        matcher.last_mismatch(),
        Some(MatchError::TopicMismatch { index: 0, .. })
    ));
}

#[test]
fn emitter_is_checked_when_declared() {
    let expected = || ExpectedEmit::new(something(1, 2, 3, 4)).from_emitter(emitter());
    let from_stranger = EventRecord::from_log_data(stranger(), something(1, 2, 3, 4));

    // skipped in ordered mode, then matched
    let mut matcher = EmitMatcher::default();
    run_call(
        &mut matcher,
        vec![expected()],
        vec![from_stranger.clone(), record(something(1, 2, 3, 4))],
    )
    .unwrap();
    assert_eq!(
        matcher.last_mismatch(),
        Some(&MatchError::AddressMismatch {
            expected: emitter(),
            actual: stranger()
        })
    );

    // immediate failure in strict mode
    let mut matcher = EmitMatcher::new(MatchMode::Strict);
    let err = run_call(&mut matcher, vec![expected()], vec![from_stranger]).unwrap_err();
    assert_eq!(
        err,
        MatchError::AddressMismatch {
            expected: emitter(),
            actual: stranger()
        }
    );
}

#[test]
fn empty_mask_is_rejected() {
    let mut matcher = EmitMatcher::default();

    let dangling = ExpectedEmit::new(something(1, 2, 3, 4)).with_mask(false, false, false, false);
    assert_eq!(matcher.declare(dangling), Err(MatchError::EmptyMatchMask));

    // whatever happens next, the test fails
    assert_eq!(
        matcher.observe(&record(something(1, 2, 3, 4))),
        Err(MatchError::EmptyMatchMask)
    );
    assert_eq!(matcher.finish(), Err(MatchError::EmptyMatchMask));

    // anonymous expectation with only the topic 0 check isn't empty
    let mut matcher = EmitMatcher::default();
    let expected = ExpectedEmit::new(anon(1, 2, 3))
        .anonymous(true)
        .with_mask(false, false, false, false);
    assert_eq!(matcher.declare(expected), Ok(()));

    let mut matcher = EmitMatcher::default();
    let expected = ExpectedEmit::new(anon(1, 2, 3))
        .anonymous(false)
        .with_mask(false, false, false, false);
    assert_eq!(matcher.declare(expected), Err(MatchError::EmptyMatchMask));
}

#[test]
fn dangling_expectation_without_call_fails() {
    let mut matcher = EmitMatcher::default();
    matcher.declare(ExpectedEmit::new(something(1, 2, 3, 4))).unwrap();

    assert_eq!(
        matcher.finish(),
        Err(MatchError::UnmatchedExpectation { remaining: 1 })
    );
}

#[test]
fn anonymous_events_match_by_position() {
    let mut matcher = EmitMatcher::default();

    // topic 0 is a plain indexed value, not a selector
    run_call(
        &mut matcher,
        vec![
            ExpectedEmit::new(anon(1, 2, 3))
                .anonymous(false)
                .with_mask(true, false, false, true),
        ],
        vec![record(anon(42, 2, 3))],
    )
    .unwrap();

    let mut matcher = EmitMatcher::new(MatchMode::Strict);
    let err = run_call(
        &mut matcher,
        vec![ExpectedEmit::new(anon(1, 2, 3)).anonymous(true)],
        vec![record(anon(42, 2, 3))],
    )
    .unwrap_err();
    assert!(matches!(err, MatchError::TopicMismatch { index: 0, .. }));
}

#[test]
fn anonymous_topic_count_must_match() {
    let mut matcher = EmitMatcher::new(MatchMode::Strict);

    let no_topics = AnonNoTopics {
        data: U256::from(3),
    }
    .encode_log_data();

    let err = run_call(
        &mut matcher,
        vec![ExpectedEmit::new(anon(1, 2, 3)).anonymous(false)],
        vec![record(no_topics)],
    )
    .unwrap_err();

    assert_eq!(
        err,
        MatchError::TopicCountMismatch {
            expected: 2,
            actual: 0
        }
    );
}

#[test]
fn pending_expectation_is_filled_by_next_log() {
    let mut matcher = EmitMatcher::default();

    matcher.declare(ExpectedEmit::pending().from_emitter(emitter())).unwrap();
    // the test emits the reference event itself
    matcher
        .observe(&EventRecord::from_log_data(stranger(), something(1, 2, 3, 4)))
        .unwrap();
    assert_eq!(matcher.outstanding(), 1);

    matcher.enter_call(CallKind::Mutating).unwrap();
    matcher.observe(&record(something(1, 2, 3, 4))).unwrap();
    matcher.exit_call().unwrap();
    matcher.finish().unwrap();

    assert_eq!(matcher.state(), &MatchState::Satisfied);
}

#[test]
fn anonymous_log_cannot_fill_named_expectation() {
    let mut matcher = EmitMatcher::default();
    matcher.declare(ExpectedEmit::pending()).unwrap();

    let no_topics = AnonNoTopics {
        data: U256::from(3),
    }
    .encode_log_data();

    assert_eq!(
        matcher.observe(&record(no_topics.clone())),
        Err(MatchError::MissingEventSelector)
    );

    let mut matcher = EmitMatcher::default();
    matcher.declare(ExpectedEmit::pending().anonymous(true)).unwrap();
    assert_eq!(matcher.observe(&record(no_topics)), Ok(()));
}

#[test]
fn static_calls_do_not_close_the_scope() {
    let mut matcher = EmitMatcher::default();
    matcher.declare(ExpectedEmit::new(something(1, 2, 3, 4))).unwrap();

    matcher.enter_call(CallKind::Static).unwrap();
    matcher.exit_call().unwrap();
    assert_eq!(matcher.state(), &MatchState::Armed);

    matcher.enter_call(CallKind::Mutating).unwrap();
    matcher.observe(&record(something(1, 2, 3, 4))).unwrap();
    matcher.exit_call().unwrap();
    matcher.finish().unwrap();
}

#[test]
fn mutating_call_without_expected_log_fails() {
    let mut matcher = EmitMatcher::default();
    matcher.declare(ExpectedEmit::new(something(1, 2, 3, 4))).unwrap();

    matcher.enter_call(CallKind::Mutating).unwrap();
    assert_eq!(
        matcher.exit_call(),
        Err(MatchError::UnmatchedExpectation { remaining: 1 })
    );
}

#[test]
fn nested_calls_see_ancestor_expectations() {
    let mut matcher = EmitMatcher::default();
    matcher.declare(ExpectedEmit::new(something(1, 2, 3, 4))).unwrap();

    matcher.enter_call(CallKind::Mutating).unwrap();
    matcher.enter_call(CallKind::Mutating).unwrap();
    assert_eq!(matcher.depth(), 2);
    matcher.observe(&record(something(1, 2, 3, 4))).unwrap();
    matcher.exit_call().unwrap();
    matcher.exit_call().unwrap();
    matcher.finish().unwrap();
}

#[test]
fn nested_declarations_own_their_queue() {
    let mut matcher = EmitMatcher::default();

    matcher.enter_call(CallKind::Mutating).unwrap();
    matcher.declare(ExpectedEmit::new(non_indexed(5))).unwrap();
    matcher.enter_call(CallKind::Mutating).unwrap();
    matcher.observe(&record(non_indexed(5))).unwrap();
    matcher.exit_call().unwrap();
    assert_eq!(matcher.state(), &MatchState::Satisfied);
    matcher.exit_call().unwrap();
    matcher.finish().unwrap();
}

#[test]
fn queue_is_cleared_between_calls() {
    let mut matcher = EmitMatcher::default();

    matcher.declare(ExpectedEmit::new(non_indexed(1))).unwrap();
    matcher.enter_call(CallKind::Mutating).unwrap();
    matcher.observe(&record(non_indexed(1))).unwrap();
    matcher.exit_call().unwrap();

    // second call isn't covered by the first declaration
    matcher.enter_call(CallKind::Mutating).unwrap();
    matcher.exit_call().unwrap();

    matcher.declare(ExpectedEmit::new(non_indexed(2))).unwrap();
    assert_eq!(matcher.state(), &MatchState::Armed);
    matcher.enter_call(CallKind::Mutating).unwrap();
    matcher.observe(&record(non_indexed(2))).unwrap();
    matcher.exit_call().unwrap();
    matcher.finish().unwrap();
}

#[test]
fn closing_root_scope_is_an_error() {
    let mut matcher = EmitMatcher::default();
    assert_eq!(matcher.exit_call(), Err(MatchError::ScopeUnderflow));
}

#[test]
fn records_round_trip_through_alloy_logs() {
    let original = record(something(1, 2, 3, 4));
    let log: alloy_primitives::Log = original.clone().into();

    assert_eq!(log.address, emitter());
    assert_eq!(EventRecord::from(log), original);
    assert_eq!(original.selector(), Some(Something::SIGNATURE_HASH));
    assert_eq!(original.topics()[1], topic(1));
    assert!(EventRecord::new(emitter(), vec![B256::ZERO; 5], Bytes::new()).is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn extra_logs_after_match_are_allowed(extra in proptest::collection::vec(0u64..10, 0..8)) {
        let mut matcher = EmitMatcher::new(MatchMode::Strict);

        let mut logs = vec![record(something(1, 2, 3, 4))];
        logs.extend(extra.into_iter().map(|value| record(non_indexed(value))));

        let expected = vec![ExpectedEmit::new(something(1, 2, 3, 4))];
        prop_assert!(run_call(&mut matcher, expected, logs).is_ok());
    }

    #[test]
    fn ordered_mode_finds_expected_log_anywhere(before in 0usize..6, after in 0usize..6) {
        let mut matcher = EmitMatcher::default();

        let mut logs: Vec<_> = (0..before).map(|i| record(non_indexed(i as u64))).collect();
        logs.push(record(something(1, 2, 3, 4)));
        logs.extend((0..after).map(|i| record(non_indexed(i as u64))));

        let expected = vec![ExpectedEmit::new(something(1, 2, 3, 4))];
        prop_assert!(run_call(&mut matcher, expected, logs).is_ok());
    }
}
