//! Query execution: merge, filter, sort.
//!
//! A query runs in a fixed order over a borrowed collection:
//!
//! 1. the criteria are compiled into a [`Plan`] (all validation happens
//!    here, before any item is read);
//! 2. each item is paired with a snapshot of its overlay state as a
//!    [`Merged`] row;
//! 3. rows failing the predicate are dropped, keeping original order;
//! 4. the rest are stably sorted by the sort chain.
//!
//! The source collection is never mutated and the result is always a new
//! `Vec`, possibly empty.

use std::ops::Deref;

use serde::Serialize;
use tracing::debug;

use crate::criteria::Criteria;
use crate::error::Result;
use crate::field_spec::FieldSpec;
use crate::ordering::{compile_orderings, sort_by_orderings, OrderBy};
use crate::overlay::{ItemState, Overlay};
use crate::predicate::{compose, Predicate};
use crate::record::Record;
use crate::value::{ItemId, Value};

/// One result row: a borrowed item with its overlay state spread over it.
///
/// Overlay flags and counters shadow the item's own fields of the same
/// name, both for filtering and sorting and in [`Merged::to_json`].
#[derive(Debug)]
pub struct Merged<'a, T> {
    item: &'a T,
    state: Option<ItemState>,
}

impl<'a, T> Merged<'a, T> {
    /// Pairs an item with an overlay snapshot.
    pub fn new(item: &'a T, state: Option<ItemState>) -> Self {
        Merged { item, state }
    }

    /// The underlying item, as stored in the collection.
    pub fn item(&self) -> &'a T {
        self.item
    }

    /// The overlay snapshot, if the item was ever touched.
    pub fn state(&self) -> Option<&ItemState> {
        self.state.as_ref()
    }
}

impl<T: Record> Merged<'_, T> {
    /// The item's id.
    pub fn id(&self) -> ItemId {
        self.item.record_id()
    }

    /// A flag as seen by the screen: overlay first, then the item.
    pub fn flag(&self, flag: &str) -> bool {
        match self.field_value(flag) {
            Value::Bool(value) => value,
            Value::Number(n) => n.to_f64() != 0.0,
            _ => false,
        }
    }

    /// A counter as seen by the screen: overlay first, then the item.
    pub fn counter(&self, counter: &str) -> Option<i64> {
        crate::extract::to_number(&self.field_value(counter)).map(|n| n.to_i64())
    }
}

impl<T: Serialize> Merged<'_, T> {
    /// Serializes the item with overlay flags and counters written over
    /// its fields. Items that do not serialize to an object are returned
    /// as-is.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut json = serde_json::to_value(self.item)?;
        if let (Some(state), Some(object)) = (&self.state, json.as_object_mut()) {
            for (flag, value) in &state.flags {
                object.insert(flag.clone(), serde_json::Value::Bool(value.value));
            }
            for (counter, value) in &state.counters {
                object.insert(counter.clone(), serde_json::Value::from(value.value));
            }
        }
        Ok(json)
    }
}

impl<T: Record> Record for Merged<'_, T> {
    fn record_id(&self) -> ItemId {
        self.item.record_id()
    }

    fn field_value(&self, field: &str) -> Value<'_> {
        match self.state.as_ref().and_then(|state| state.field_value(field)) {
            Some(value) => value,
            None => self.item.field_value(field),
        }
    }
}

impl<T> Deref for Merged<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item
    }
}

impl<T> Clone for Merged<'_, T> {
    fn clone(&self) -> Self {
        Merged {
            item: self.item,
            state: self.state.clone(),
        }
    }
}

impl<T: PartialEq> PartialEq for Merged<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.item == other.item && self.state == other.state
    }
}

/// Validated criteria, ready to run against any collection of the entity
/// type it was compiled for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    predicate: Predicate,
    orderings: Vec<OrderBy>,
}

impl Plan {
    /// Compiles criteria against a field spec.
    ///
    /// Fails with the first validation error; no item is touched.
    pub fn compile(criteria: &Criteria, spec: &FieldSpec) -> Result<Plan> {
        let predicate = compose(criteria, spec)?;
        let orderings = compile_orderings(&criteria.sort, spec)?;
        Ok(Plan {
            predicate,
            orderings,
        })
    }

    /// The compiled predicate.
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// The compiled sort chain.
    pub fn orderings(&self) -> &[OrderBy] {
        &self.orderings
    }

    /// Runs the plan: merge, filter, stable sort.
    pub fn run<'a, T: Record>(&self, items: &'a [T], overlay: &Overlay) -> Vec<Merged<'a, T>> {
        let matched: Vec<Merged<'a, T>> = items
            .iter()
            .map(|item| merge(item, overlay))
            .filter(|row| self.predicate.matches(row))
            .collect();
        let total = matched.len();
        let sorted = sort_by_orderings(matched, &self.orderings);

        debug!(input = items.len(), output = total, "query");
        sorted
    }

    /// Counts matching items without sorting.
    pub fn count<T: Record>(&self, items: &[T], overlay: &Overlay) -> usize {
        items
            .iter()
            .filter(|item| self.predicate.matches(&merge(*item, overlay)))
            .count()
    }
}

fn merge<'a, T: Record>(item: &'a T, overlay: &Overlay) -> Merged<'a, T> {
    let state = if overlay.is_empty() {
        None
    } else {
        overlay.get(&item.record_id()).cloned()
    };
    Merged::new(item, state)
}

/// A query engine for one entity type.
///
/// # Example
///
/// ```
/// use pulse_finder::{Criteria, FieldSpec, Finder, FilterKind, Overlay, SortType};
/// use serde_json::json;
///
/// let finder = Finder::new(
///     FieldSpec::new()
///         .search("title")
///         .filter("category", FilterKind::Exact)
///         .sort("answers", SortType::Number),
/// );
///
/// let questions = vec![
///     json!({"id": 1, "title": "Pacing a 10k", "category": "training", "answers": 3}),
///     json!({"id": 2, "title": "Carb loading", "category": "nutrition", "answers": 9}),
///     json!({"id": 3, "title": "Tempo runs", "category": "training", "answers": 7}),
/// ];
///
/// let criteria = Criteria::new()
///     .filter_eq("category", "training")
///     .order_desc("answers");
///
/// let rows = finder.query(&questions, &criteria, &Overlay::new()).unwrap();
/// let ids: Vec<_> = rows.iter().map(|row| row["id"].as_i64().unwrap()).collect();
/// assert_eq!(ids, vec![3, 1]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Finder {
    spec: FieldSpec,
}

impl Finder {
    /// Creates a finder for the given field spec.
    pub fn new(spec: FieldSpec) -> Self {
        Finder { spec }
    }

    /// The field spec queries are validated against.
    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// Compiles criteria into a reusable [`Plan`].
    pub fn compile(&self, criteria: &Criteria) -> Result<Plan> {
        Plan::compile(criteria, &self.spec)
    }

    /// Runs a query over `items` with `overlay` merged in.
    pub fn query<'a, T: Record>(
        &self,
        items: &'a [T],
        criteria: &Criteria,
        overlay: &Overlay,
    ) -> Result<Vec<Merged<'a, T>>> {
        Ok(self.compile(criteria)?.run(items, overlay))
    }

    /// Number of items matching the criteria, for tab and chip badges.
    pub fn count<T: Record>(
        &self,
        items: &[T],
        criteria: &Criteria,
        overlay: &Overlay,
    ) -> Result<usize> {
        Ok(self.compile(criteria)?.count(items, overlay))
    }
}

/// Runs a one-off query without building a [`Finder`].
pub fn query<'a, T: Record>(
    items: &'a [T],
    criteria: &Criteria,
    spec: &FieldSpec,
    overlay: &Overlay,
) -> Result<Vec<Merged<'a, T>>> {
    Ok(Plan::compile(criteria, spec)?.run(items, overlay))
}
