//! Per-screen query state.
//!
//! A [`Session`] holds what one list screen owns between renders: the
//! current criteria, the overlay and the ids of the last valid result. The
//! collection itself is passed to every [`Session::refresh`] and never
//! stored.

use tracing::debug;

use crate::criteria::{Criteria, FilterValue, SortKey};
use crate::error::Result;
use crate::finder::{Finder, Merged};
use crate::overlay::Overlay;
use crate::record::Record;
use crate::value::ItemId;

/// Criteria, overlay and last result of one screen.
#[derive(Debug, Clone, Default)]
pub struct Session {
    finder: Finder,
    criteria: Criteria,
    overlay: Overlay,
    last: Option<Vec<ItemId>>,
}

impl Session {
    /// Creates a session with empty criteria and an empty overlay.
    pub fn new(finder: Finder) -> Self {
        Session {
            finder,
            criteria: Criteria::new(),
            overlay: Overlay::new(),
            last: None,
        }
    }

    /// Replaces the starting criteria, e.g. a screen's default sort.
    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn finder(&self) -> &Finder {
        &self.finder
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Mutable overlay access for callers that restore a saved overlay.
    pub fn overlay_mut(&mut self) -> &mut Overlay {
        &mut self.overlay
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.criteria.text = text.into();
    }

    pub fn set_filter(&mut self, field: &str, value: FilterValue) {
        self.criteria.filters.insert(field.to_string(), value);
    }

    /// Removes a filter. Returns `true` if it was set.
    pub fn clear_filter(&mut self, field: &str) -> bool {
        self.criteria.filters.remove(field).is_some()
    }

    pub fn set_sort(&mut self, sort: Vec<SortKey>) {
        self.criteria.sort = sort;
    }

    /// Clears text, filters and sort. The overlay is kept.
    pub fn reset_criteria(&mut self) {
        self.criteria = Criteria::new();
    }

    /// Clears the overlay. Criteria are kept.
    pub fn reset_overlay(&mut self) {
        self.overlay.reset();
    }

    /// Runs the current criteria over `items`.
    ///
    /// On success the result ids are remembered. On error the previous
    /// result is kept and the error is returned for the screen to show.
    pub fn refresh<'a, T: Record>(&mut self, items: &'a [T]) -> Result<Vec<Merged<'a, T>>> {
        match self.finder.query(items, &self.criteria, &self.overlay) {
            Ok(rows) => {
                self.last = Some(rows.iter().map(Merged::id).collect());
                Ok(rows)
            }
            Err(err) => {
                debug!(error = %err, "refresh failed, keeping previous result");
                Err(err)
            }
        }
    }

    /// Returns `true` once a query has succeeded, so an empty result can be
    /// told apart from "not loaded yet".
    pub fn has_queried(&self) -> bool {
        self.last.is_some()
    }

    /// Ids of the last successful result, in display order.
    pub fn last_ids(&self) -> Option<&[ItemId]> {
        self.last.as_deref()
    }

    /// Flips a flag on an item using the rule the field spec declares for
    /// it. Returns the new value; call [`refresh`](Session::refresh) to see
    /// it in the result.
    pub fn toggle<T: Record + ?Sized>(&mut self, item: &T, flag: &str) -> bool {
        let rule = self.finder.spec().toggle_rule(flag);
        self.overlay.toggle(item, flag, &rule)
    }

    /// Sets a flag explicitly. Returns `true` if it changed.
    pub fn set_flag<T: Record + ?Sized>(&mut self, item: &T, flag: &str, value: bool) -> bool {
        let rule = self.finder.spec().toggle_rule(flag);
        self.overlay.set(item, flag, value, &rule)
    }
}
