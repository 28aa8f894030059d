use super::*;
use crate::catalog::koyaku_slots;

fn at(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(seconds)
}

fn fresh_state() -> CounterState {
    CounterState::new(
        CounterSet::new(koyaku_slots()),
        Duration::seconds(UNDO_WINDOW_SECONDS),
    )
}

#[test]
fn values_never_go_negative_over_mixed_sequences() {
    let mut state = fresh_state();
    let len = state.counters().len();
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;

    for step in 0..2_000u64 {
        seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let slot = SlotIndex((seed >> 33) as usize % len);
        if step % 7 == 0 {
            let raw = match (seed >> 20) % 4 {
                0 => "-12".to_string(),
                1 => "abc".to_string(),
                2 => format!("{}.9", (seed >> 40) % 50),
                _ => String::new(),
            };
            assert!(state.set_direct(slot, &raw));
        } else {
            let delta = ((seed >> 24) % 9) as i64 - 5;
            assert!(state.increment(slot, delta));
        }
        // Values are unsigned, so the check is that clamping never wrapped around.
        assert!(state.counters().values().iter().all(|v| *v < 1_000_000));
    }
}

#[test]
fn decrement_below_zero_clamps() {
    let mut state = fresh_state();
    state.increment(SlotIndex(2), 2);
    state.increment(SlotIndex(2), -5);
    assert_eq!(state.counters().value(SlotIndex(2)), Some(0));
    state.increment(SlotIndex(2), i64::MIN);
    assert_eq!(state.counters().value(SlotIndex(2)), Some(0));
}

#[test]
fn large_deltas_saturate() {
    let mut state = fresh_state();
    state.set_value(SlotIndex(0), u64::MAX - 1);
    state.increment(SlotIndex(0), i64::MAX);
    assert_eq!(state.counters().primary(), u64::MAX);
    assert_eq!(state.counters().total(), u64::MAX);
}

#[test]
fn reset_then_undo_restores_exact_values() {
    let mut state = fresh_state();
    for (idx, value) in [4u64, 0, 9, 1, 0, 2, 7].into_iter().enumerate() {
        state.set_value(SlotIndex(idx), value);
    }
    let before = state.counters().clone();

    let snapshot = state.reset(at(100)).clone();
    assert_eq!(snapshot.values(), before.values().as_slice());
    assert_eq!(snapshot.created_at(), at(100));
    assert_eq!(snapshot.expires_at(), at(110));
    assert_eq!(state.counters().total(), 0);

    assert!(state.undo(at(105)));
    assert_eq!(state.counters(), &before);
    assert!(state.pending_undo().is_none());
}

#[test]
fn undo_after_window_is_a_noop() {
    let mut state = fresh_state();
    state.increment(SlotIndex(0), 3);
    state.reset(at(0));

    assert!(state.can_undo(at(9)));
    assert!(!state.can_undo(at(10)));
    assert!(!state.undo(at(10)));
    assert_eq!(state.counters().values(), vec![0; 7]);
    assert!(state.pending_undo().is_none());
}

#[test]
fn mutation_after_reset_invalidates_undo() {
    let mut state = fresh_state();
    state.increment(SlotIndex(0), 3);
    state.reset(at(0));
    state.increment(SlotIndex(4), 1);

    assert!(state.pending_undo().is_none());
    assert!(!state.undo(at(1)));
    assert_eq!(state.counters().values(), vec![0, 0, 0, 0, 1, 0, 0]);

    state.reset(at(2));
    state.set_direct(SlotIndex(1), "8");
    assert!(!state.undo(at(3)));
    assert_eq!(state.counters().value(SlotIndex(1)), Some(8));
}

#[test]
fn second_reset_replaces_the_snapshot() {
    let mut state = fresh_state();
    state.increment(SlotIndex(0), 5);
    let first = state.reset(at(0)).generation();
    let second = state.reset(at(4)).generation();
    assert_ne!(first, second);

    assert!(!state.expire_undo(first));
    assert!(state.pending_undo().is_some());

    // The second snapshot captured the already-zeroed values.
    assert!(state.undo(at(12)));
    assert_eq!(state.counters().primary(), 0);
}

#[test]
fn expire_clears_the_current_snapshot() {
    let mut state = fresh_state();
    state.increment(SlotIndex(0), 5);
    let generation = state.reset(at(0)).generation();

    assert!(state.expire_undo(generation));
    assert!(!state.undo(at(1)));
    assert_eq!(state.counters().primary(), 0);
}

#[test]
fn hydration_isolates_corrupt_elements() {
    let state = CounterState::hydrate(
        koyaku_slots(),
        Some(r#"[3, -1, "bell", 2.5, 1e400]"#),
        Duration::seconds(UNDO_WINDOW_SECONDS),
    );
    assert_eq!(state.counters().values(), vec![0; 7]);

    let state = CounterState::hydrate(
        koyaku_slots(),
        Some(r#"[3, -1, "bell", 2.5, 6]"#),
        Duration::seconds(UNDO_WINDOW_SECONDS),
    );
    assert_eq!(state.counters().values(), vec![3, 0, 0, 2, 6, 0, 0]);
}

#[test]
fn scenario_tap_reset_undo_then_direct_input() {
    let mut state = fresh_state();
    for _ in 0..3 {
        state.increment(SlotIndex(0), 1);
    }
    assert_eq!(state.counters().values(), vec![3, 0, 0, 0, 0, 0, 0]);
    assert_eq!(state.counters().total(), 3);

    state.reset(at(0));
    assert_eq!(state.counters().total(), 0);
    assert_eq!(
        state.pending_undo().map(|s| s.values().to_vec()),
        Some(vec![3, 0, 0, 0, 0, 0, 0])
    );

    assert!(state.undo(at(5)));
    assert_eq!(state.counters().primary(), 3);

    state.set_direct(SlotIndex(1), "5.7");
    assert_eq!(state.counters().value(SlotIndex(1)), Some(5));
    assert!(!state.undo(at(6)));
    assert_eq!(state.counters().values(), vec![3, 5, 0, 0, 0, 0, 0]);
}

#[test]
fn slots_are_addressable_by_key() {
    let state = fresh_state();
    assert_eq!(state.counters().position("watermelon"), Some(SlotIndex(2)));
    assert_eq!(state.counters().position("missing"), None);
}

#[test]
fn out_of_range_slot_is_ignored() {
    let mut state = fresh_state();
    state.increment(SlotIndex(1), 2);
    state.reset(at(0));

    assert!(!state.increment(SlotIndex(99), 1));
    assert!(!state.set_direct(SlotIndex(7), "4"));

    // The ignored calls neither touched other slots nor discarded the undo.
    assert_eq!(state.counters().total(), 0);
    assert!(state.undo(at(1)));
    assert_eq!(state.counters().value(SlotIndex(1)), Some(2));
}

#[test]
fn reset_with_an_oversized_window_saturates_the_deadline() {
    let mut state = CounterState::new(
        CounterSet::new(koyaku_slots()),
        Duration::seconds(10_000_000_000_000),
    );
    state.increment(SlotIndex(0), 4);

    let snapshot = state.reset(at(0));
    assert_eq!(snapshot.expires_at(), DateTime::<Utc>::MAX_UTC);
    assert!(!snapshot.is_expired(at(86_400)));

    assert!(state.undo(at(86_400)));
    assert_eq!(state.counters().primary(), 4);
}
