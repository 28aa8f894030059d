use chrono::{DateTime, Duration, Utc};
use persistence::{decode_counts, parse_count_input};
use shared::{
    domain::{SlotIndex, SlotSpec},
    error::WidgetError,
};
use tracing::warn;

pub const UNDO_WINDOW_SECONDS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    spec: SlotSpec,
    value: u64,
}

impl Slot {
    pub fn spec(&self) -> &SlotSpec {
        &self.spec
    }

    pub fn key(&self) -> &str {
        &self.spec.key
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

/// Fixed, ordered set of named counters. Only the values ever change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSet {
    slots: Vec<Slot>,
}

impl CounterSet {
    pub fn new(specs: Vec<SlotSpec>) -> Self {
        Self::with_values(specs, &[])
    }

    /// Missing values default to 0; surplus values are dropped.
    pub fn with_values(specs: Vec<SlotSpec>, values: &[u64]) -> Self {
        let slots = specs
            .into_iter()
            .enumerate()
            .map(|(idx, spec)| Slot {
                spec,
                value: values.get(idx).copied().unwrap_or(0),
            })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn values(&self) -> Vec<u64> {
        self.slots.iter().map(Slot::value).collect()
    }

    pub fn value(&self, index: SlotIndex) -> Option<u64> {
        self.slots.get(index.0).map(Slot::value)
    }

    /// Value of the first slot, the one reported to the host as the primary count.
    pub fn primary(&self) -> u64 {
        self.slots.first().map(Slot::value).unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.slots
            .iter()
            .fold(0u64, |acc, slot| acc.saturating_add(slot.value))
    }

    pub fn position(&self, key: &str) -> Option<SlotIndex> {
        self.slots
            .iter()
            .position(|slot| slot.key() == key)
            .map(SlotIndex)
    }

    fn assign(&mut self, values: &[u64]) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            slot.value = values.get(idx).copied().unwrap_or(0);
        }
    }
}

/// Values captured right before a reset, restorable until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoSnapshot {
    values: Vec<u64>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    generation: u64,
}

impl UndoSnapshot {
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Distinguishes successive snapshots so a stale expiry cannot clear a newer one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// The counters plus the single-slot undo buffer. All mutation goes through here.
#[derive(Debug, Clone)]
pub struct CounterState {
    counters: CounterSet,
    undo: Option<UndoSnapshot>,
    undo_window: Duration,
    next_generation: u64,
}

impl CounterState {
    pub fn new(counters: CounterSet, undo_window: Duration) -> Self {
        Self {
            counters,
            undo: None,
            undo_window,
            next_generation: 1,
        }
    }

    /// Builds the starting state from a persisted document, isolating corruption per slot.
    pub fn hydrate(specs: Vec<SlotSpec>, raw: Option<&str>, undo_window: Duration) -> Self {
        let values = decode_counts(raw, specs.len());
        Self::new(CounterSet::with_values(specs, &values), undo_window)
    }

    pub fn counters(&self) -> &CounterSet {
        &self.counters
    }

    pub fn undo_window(&self) -> Duration {
        self.undo_window
    }

    pub fn pending_undo(&self) -> Option<&UndoSnapshot> {
        self.undo.as_ref()
    }

    pub fn can_undo(&self, now: DateTime<Utc>) -> bool {
        self.undo
            .as_ref()
            .is_some_and(|snapshot| !snapshot.is_expired(now))
    }

    /// Out-of-range indices are logged and ignored.
    fn checked_index(&self, index: SlotIndex) -> Option<usize> {
        let len = self.counters.len();
        if index.0 < len {
            return Some(index.0);
        }
        let err = WidgetError::SlotOutOfRange {
            index: index.0,
            len,
        };
        warn!(code = ?err.code(), error = %err, "ignoring counter mutation");
        None
    }

    /// Adds `delta`, clamping at 0. Returns `false` if the index was ignored.
    pub fn increment(&mut self, index: SlotIndex, delta: i64) -> bool {
        let Some(idx) = self.checked_index(index) else {
            return false;
        };
        self.undo = None;
        let slot = &mut self.counters.slots[idx];
        slot.value = if delta >= 0 {
            slot.value.saturating_add(delta.unsigned_abs())
        } else {
            slot.value.saturating_sub(delta.unsigned_abs())
        };
        true
    }

    /// Sets a slot from typed text: non-numeric, infinite or negative input becomes 0.
    pub fn set_direct(&mut self, index: SlotIndex, raw: &str) -> bool {
        self.set_value(index, parse_count_input(raw))
    }

    pub fn set_value(&mut self, index: SlotIndex, value: u64) -> bool {
        let Some(idx) = self.checked_index(index) else {
            return false;
        };
        self.undo = None;
        self.counters.slots[idx].value = value;
        true
    }

    /// Zeroes every slot and replaces any pending snapshot. Returns the new snapshot.
    pub fn reset(&mut self, now: DateTime<Utc>) -> &UndoSnapshot {
        let generation = self.next_generation;
        self.next_generation += 1;
        let snapshot = UndoSnapshot {
            values: self.counters.values(),
            created_at: now,
            expires_at: now
                .checked_add_signed(self.undo_window)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            generation,
        };
        self.counters.assign(&[]);
        self.undo.insert(snapshot)
    }

    /// Restores the last reset if it has not expired. Otherwise a no-op.
    pub fn undo(&mut self, now: DateTime<Utc>) -> bool {
        match self.undo.take() {
            Some(snapshot) if !snapshot.is_expired(now) => {
                self.counters.assign(&snapshot.values);
                true
            }
            _ => false,
        }
    }

    /// Drops the snapshot of `generation` if it is still the pending one.
    pub fn expire_undo(&mut self, generation: u64) -> bool {
        if self
            .undo
            .as_ref()
            .is_some_and(|snapshot| snapshot.generation == generation)
        {
            self.undo = None;
            return true;
        }
        false
    }

    /// Replaces every value at once, e.g. after switching storage keys.
    pub fn replace_values(&mut self, values: &[u64]) {
        self.undo = None;
        self.counters.assign(values);
    }
}

#[cfg(test)]
#[path = "tests/counter_set_tests.rs"]
mod tests;
