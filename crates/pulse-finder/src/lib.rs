//! Pulse Finder - faceted discovery over in-memory catalogs.
//!
//! Every list screen of the app (questions forum, recipe library, lessons,
//! group sessions, consultation listings, competitions, gear marketplace)
//! does the same thing: free-text search over a few fields, some chips and
//! range sliders, a sort order, and per-item user state such as `liked` or
//! `joined`. This crate does it once, driven by a declarative
//! [`FieldSpec`] per entity type:
//!
//! - Free-text search: case-insensitive substring, OR across fields
//! - Filters: exact match, set membership, numeric and date ranges
//! - Stable multi-key sort with missing values always last
//! - An [`Overlay`] of user flags merged into results without touching
//!   the source collection
//!
//! # Quick Start
//!
//! ```rust
//! use pulse_finder::{Criteria, FieldSpec, Finder, FilterKind, Overlay, SortType};
//! use serde_json::json;
//!
//! let recipes = vec![
//!     json!({"id": 1, "title": "Tofu scramble", "category": "breakfast",
//!            "dietary": ["vegan"], "reviews": 189, "featured": false, "likes": 5}),
//!     json!({"id": 2, "title": "Greek yogurt bowl", "category": "breakfast",
//!            "dietary": ["vegetarian"], "reviews": 240, "featured": true, "likes": 9}),
//!     json!({"id": 3, "title": "Lentil curry", "category": "dinner",
//!            "dietary": ["vegan", "gluten-free"], "reviews": 189, "featured": true, "likes": 2}),
//! ];
//!
//! let finder = Finder::new(
//!     FieldSpec::new()
//!         .search("title")
//!         .filter("category", FilterKind::Exact)
//!         .filter("dietary", FilterKind::SetMembership)
//!         .sort("featured", SortType::Number)
//!         .sort("reviews", SortType::Number)
//!         .pair("liked", "likes"),
//! );
//!
//! let criteria = Criteria::new()
//!     .filter_any("dietary", ["vegan"])
//!     .order_desc("featured")
//!     .order_desc("reviews");
//!
//! let mut overlay = Overlay::new();
//! overlay.toggle(&recipes[0], "liked", &finder.spec().toggle_rule("liked"));
//!
//! let rows = finder.query(&recipes, &criteria, &overlay).unwrap();
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[0]["title"], "Lentil curry");
//! assert_eq!(rows[1].counter("likes"), Some(6));
//! ```
//!
//! # Query Semantics
//!
//! ```text
//! match = (text is blank OR any searchable field contains text)
//!       ∧ (every active filter matches)
//! ```
//!
//! | Filter kind | Inactive when | Matches when |
//! |-------------|---------------|--------------|
//! | `exact` | absent, `"all"` | value equals the selection |
//! | `setMembership` | absent, `[]` | list shares an entry with the selection |
//! | `numericRange` | absent, no bounds | `min <= value <= max`, value present |
//! | `dateRange` | absent, no bounds | `min <= date <= max`, date present |
//!
//! Criteria are validated against the field spec before any item is read:
//! unknown fields, inverted ranges and bad sort directions are errors, not
//! empty results.

mod clause;
mod config;
mod criteria;
mod error;
mod extract;
mod field_spec;
mod finder;
mod ordering;
mod overlay;
mod predicate;
mod record;
mod session;
mod value;

// Re-export public API
pub use clause::{Clause, ClauseTest};
pub use config::SpecRegistry;
pub use criteria::{Criteria, FilterValue, Range, Scalar, SortKey};
pub use error::{FinderError, Result};
pub use extract::{extract, search_text, to_flag, to_number, to_timestamp};
pub use field_spec::{FieldSpec, FieldType, FilterKind, SortType};
pub use finder::{query, Finder, Merged, Plan};
pub use ordering::{
    compare_by_orderings, compare_values, compile_orderings, sort_by_orderings, Dir, OrderBy,
    SortValue,
};
pub use overlay::{toggle, CounterState, FlagState, ItemState, Overlay, OverlayEntry, ToggleRule};
pub use predicate::{compose, Predicate, TextMatch};
pub use record::{AsList, AsNumber, AsText, AsTimestamp, Record};
pub use session::Session;
pub use value::{ItemId, Number, Timestamp, Value};
