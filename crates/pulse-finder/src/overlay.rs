//! Per-item user state kept beside the source collection.
//!
//! The [`Overlay`] maps item ids to named flags (`liked`, `joined`,
//! `saved`, `watchlisted`) and counters (`likes`, `participants`). It never
//! writes to the items themselves; [`Finder`](crate::Finder) merges it over
//! each item when a query runs.
//!
//! An entry is created on the first change to an item and seeded from the
//! item's own fields, which stay the *baseline*. Paired counters are always
//! derived from the baseline and the current flag, so however many times a
//! toggle is dispatched the counter moves by at most one:
//!
//! ```
//! use pulse_finder::{Overlay, ToggleRule};
//! use serde_json::json;
//!
//! let recipe = json!({"id": 7, "liked": false, "likes": 5});
//! let rule = ToggleRule::paired("likes");
//! let mut overlay = Overlay::new();
//!
//! overlay.toggle(&recipe, "liked", &rule);
//! overlay.toggle(&recipe, "liked", &rule);
//! overlay.toggle(&recipe, "liked", &rule);
//!
//! assert_eq!(overlay.flag(&7.into(), "liked"), Some(true));
//! assert_eq!(overlay.counter(&7.into(), "likes"), Some(6));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::extract::{to_flag, to_number};
use crate::record::Record;
use crate::value::{ItemId, Number, Value};

/// How a flag change affects other state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleRule {
    paired_counter: Option<String>,
}

impl ToggleRule {
    /// A flag with no side effects (`saved`, `watchlisted`).
    pub fn plain() -> Self {
        ToggleRule::default()
    }

    /// A flag that moves a counter by one (`liked` and `likes`).
    pub fn paired(counter: impl Into<String>) -> Self {
        ToggleRule {
            paired_counter: Some(counter.into()),
        }
    }

    /// The counter moved by this flag, if any.
    pub fn paired_counter(&self) -> Option<&str> {
        self.paired_counter.as_deref()
    }
}

/// A flag and the value the item itself carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagState {
    pub baseline: bool,
    pub value: bool,
}

/// A counter and the value the item itself carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    pub baseline: i64,
    pub value: i64,
}

/// Overlay state of one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemState {
    pub flags: BTreeMap<String, FlagState>,
    pub counters: BTreeMap<String, CounterState>,
}

impl ItemState {
    /// Current value of a flag touched through the overlay.
    pub fn flag(&self, flag: &str) -> Option<bool> {
        self.flags.get(flag).map(|state| state.value)
    }

    /// Current value of a counter touched through the overlay.
    pub fn counter(&self, counter: &str) -> Option<i64> {
        self.counters.get(counter).map(|state| state.value)
    }

    /// The overlay value for a field, shadowing the item's own.
    pub fn field_value(&self, field: &str) -> Option<Value<'static>> {
        if let Some(value) = self.flag(field) {
            return Some(Value::Bool(value));
        }
        self.counter(field)
            .map(|value| Value::Number(Number::I64(value)))
    }
}

/// Side-table of per-item flags and counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<OverlayEntry>", from = "Vec<OverlayEntry>")]
pub struct Overlay {
    entries: BTreeMap<ItemId, ItemState>,
}

/// Serialized form of one overlay entry. Ids can be numbers, so entries
/// are written as a list rather than a JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayEntry {
    pub id: ItemId,
    #[serde(flatten)]
    pub state: ItemState,
}

impl From<Overlay> for Vec<OverlayEntry> {
    fn from(overlay: Overlay) -> Self {
        overlay
            .entries
            .into_iter()
            .map(|(id, state)| OverlayEntry { id, state })
            .collect()
    }
}

impl From<Vec<OverlayEntry>> for Overlay {
    fn from(entries: Vec<OverlayEntry>) -> Self {
        Overlay {
            entries: entries
                .into_iter()
                .map(|entry| (entry.id, entry.state))
                .collect(),
        }
    }
}

impl Overlay {
    /// Creates an empty overlay.
    pub fn new() -> Self {
        Overlay::default()
    }

    /// State of an item, if it was ever touched.
    pub fn get(&self, id: &ItemId) -> Option<&ItemState> {
        self.entries.get(id)
    }

    /// Overlay value of a flag, if it was ever set for this item.
    pub fn flag(&self, id: &ItemId, flag: &str) -> Option<bool> {
        self.get(id).and_then(|state| state.flag(flag))
    }

    /// Overlay value of a counter, if a paired flag ever moved it.
    pub fn counter(&self, id: &ItemId, counter: &str) -> Option<i64> {
        self.get(id).and_then(|state| state.counter(counter))
    }

    /// Returns `true` if the item has an entry.
    pub fn is_touched(&self, id: &ItemId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of touched items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no item was touched.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of items whose overlay flag is set, in id order. Feeds a
    /// "favorites" or "joined" tab.
    pub fn ids_with(&self, flag: &str) -> Vec<&ItemId> {
        self.entries
            .iter()
            .filter(|(_, state)| state.flag(flag) == Some(true))
            .map(|(id, _)| id)
            .collect()
    }

    /// Drops every entry.
    pub fn reset(&mut self) {
        trace!(entries = self.entries.len(), "overlay reset");
        self.entries.clear();
    }

    /// Drops one item's entry. Returns `true` if it existed.
    pub fn forget(&mut self, id: &ItemId) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Current value of a flag for an item: the overlay value, else the
    /// item's own field, else `false`.
    pub fn current_flag<T: Record + ?Sized>(&self, item: &T, flag: &str) -> bool {
        self.flag(&item.record_id(), flag)
            .unwrap_or_else(|| baseline_flag(item, flag))
    }

    /// Sets a flag to `value`, applying the rule's counter side effect.
    ///
    /// Returns `true` if the flag changed. Setting a flag to its current
    /// value is a no-op and does not create an entry.
    pub fn set<T: Record + ?Sized>(
        &mut self,
        item: &T,
        flag: &str,
        value: bool,
        rule: &ToggleRule,
    ) -> bool {
        if self.current_flag(item, flag) == value {
            return false;
        }

        let id = item.record_id();
        let state = self.entries.entry(id.clone()).or_default();

        let flag_state = state.flags.entry(flag.to_string()).or_insert_with(|| {
            let baseline = baseline_flag(item, flag);
            FlagState {
                baseline,
                value: baseline,
            }
        });
        flag_state.value = value;
        let flag_baseline = flag_state.baseline;

        if let Some(counter) = rule.paired_counter() {
            let counter_state = state.counters.entry(counter.to_string()).or_insert_with(|| {
                let baseline = baseline_counter(item, counter);
                CounterState {
                    baseline,
                    value: baseline,
                }
            });
            // Derived from the transition, clamped at the baseline.
            let derived =
                counter_state.baseline + i64::from(value) - i64::from(flag_baseline);
            counter_state.value = derived.max(counter_state.baseline);
            trace!(%id, flag, value, counter, count = counter_state.value, "overlay set");
        } else {
            trace!(%id, flag, value, "overlay set");
        }
        true
    }

    /// Flips a flag. Returns the new value.
    pub fn toggle<T: Record + ?Sized>(&mut self, item: &T, flag: &str, rule: &ToggleRule) -> bool {
        let next = !self.current_flag(item, flag);
        self.set(item, flag, next, rule);
        next
    }
}

/// Flips `flag` on `item` in `overlay`. Returns the new value.
pub fn toggle<T: Record + ?Sized>(
    overlay: &mut Overlay,
    item: &T,
    flag: &str,
    rule: &ToggleRule,
) -> bool {
    overlay.toggle(item, flag, rule)
}

fn baseline_flag<T: Record + ?Sized>(item: &T, flag: &str) -> bool {
    to_flag(&item.field_value(flag)).unwrap_or(false)
}

fn baseline_counter<T: Record + ?Sized>(item: &T, counter: &str) -> i64 {
    to_number(&item.field_value(counter)).map_or(0, Number::to_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_touch_seeds_from_item() {
        let session = json!({"id": "s-1", "joined": true, "participants": 12});
        let rule = ToggleRule::paired("participants");
        let mut overlay = Overlay::new();

        assert!(!overlay.is_touched(&"s-1".into()));
        assert!(!overlay.toggle(&session, "joined", &rule));

        let state = overlay.get(&"s-1".into()).unwrap();
        assert_eq!(
            state.flags["joined"],
            FlagState {
                baseline: true,
                value: false
            }
        );
        assert_eq!(state.counter("participants"), Some(12));
    }

    #[test]
    fn counter_never_drops_below_baseline_when_seeded_flagged() {
        let recipe = json!({"id": 1, "liked": true, "likes": 5});
        let rule = ToggleRule::paired("likes");
        let mut overlay = Overlay::new();

        assert!(!toggle(&mut overlay, &recipe, "liked", &rule));
        assert_eq!(overlay.counter(&1.into(), "likes"), Some(5));

        for _ in 0..5 {
            toggle(&mut overlay, &recipe, "liked", &rule);
            let likes = overlay.counter(&1.into(), "likes").unwrap();
            assert!(likes >= 5, "fell below baseline: {likes}");
        }
        assert_eq!(overlay.flag(&1.into(), "liked"), Some(true));
    }

    #[test]
    fn toggle_clamps_counter() {
        let recipe = json!({"id": 1, "likes": 5});
        let rule = ToggleRule::paired("likes");
        let mut overlay = Overlay::new();

        for _ in 0..3 {
            toggle(&mut overlay, &recipe, "liked", &rule);
        }
        assert_eq!(overlay.counter(&1.into(), "likes"), Some(6));

        toggle(&mut overlay, &recipe, "liked", &rule);
        assert_eq!(overlay.counter(&1.into(), "likes"), Some(5));
        assert_eq!(overlay.flag(&1.into(), "liked"), Some(false));
    }

    #[test]
    fn repeated_set_does_not_drift() {
        let recipe = json!({"id": 1, "likes": 5});
        let rule = ToggleRule::paired("likes");
        let mut overlay = Overlay::new();

        assert!(overlay.set(&recipe, "liked", true, &rule));
        assert!(!overlay.set(&recipe, "liked", true, &rule));
        assert!(!overlay.set(&recipe, "liked", true, &rule));
        assert_eq!(overlay.counter(&1.into(), "likes"), Some(6));
    }

    #[test]
    fn no_op_set_creates_no_entry() {
        let listing = json!({"id": 9, "saved": false});
        let mut overlay = Overlay::new();
        assert!(!overlay.set(&listing, "saved", false, &ToggleRule::plain()));
        assert!(overlay.is_empty());
    }

    #[test]
    fn plain_flags_touch_no_counters() {
        let listing = json!({"id": 9});
        let mut overlay = Overlay::new();
        overlay.toggle(&listing, "watchlisted", &ToggleRule::plain());
        assert!(overlay.get(&9.into()).unwrap().counters.is_empty());
    }

    #[test]
    fn ids_with_forget_and_reset() {
        let a = json!({"id": 1});
        let b = json!({"id": 2});
        let c = json!({"id": 3});
        let rule = ToggleRule::plain();
        let mut overlay = Overlay::new();

        overlay.toggle(&a, "saved", &rule);
        overlay.toggle(&b, "saved", &rule);
        overlay.toggle(&b, "saved", &rule);
        overlay.toggle(&c, "saved", &rule);

        let saved: Vec<&ItemId> = overlay.ids_with("saved");
        assert_eq!(saved, vec![&ItemId::Int(1), &ItemId::Int(3)]);
        assert_eq!(overlay.len(), 3);

        assert!(overlay.forget(&1.into()));
        assert!(!overlay.forget(&1.into()));
        assert_eq!(overlay.len(), 2);

        overlay.reset();
        assert!(overlay.is_empty());
    }

    #[test]
    fn overlay_values_shadow_fields() {
        let state = ItemState {
            flags: BTreeMap::from([(
                "liked".to_string(),
                FlagState {
                    baseline: false,
                    value: true,
                },
            )]),
            counters: BTreeMap::from([(
                "likes".to_string(),
                CounterState {
                    baseline: 5,
                    value: 6,
                },
            )]),
        };
        assert_eq!(state.field_value("liked"), Some(Value::Bool(true)));
        assert_eq!(
            state.field_value("likes"),
            Some(Value::Number(Number::I64(6)))
        );
        assert_eq!(state.field_value("title"), None);
    }

    #[test]
    fn serializes_as_entry_list() {
        let mut overlay = Overlay::new();
        overlay.toggle(&json!({"id": 4, "likes": 2}), "liked", &ToggleRule::paired("likes"));
        overlay.toggle(&json!({"id": "x"}), "saved", &ToggleRule::plain());

        let json = serde_json::to_value(&overlay).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], 4);
        assert_eq!(json[0]["counters"]["likes"]["value"], 3);

        let back: Overlay = serde_json::from_value(json).unwrap();
        assert_eq!(back, overlay);
    }
}
