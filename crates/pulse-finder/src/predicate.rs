//! Predicate composition.
//!
//! Composes search text and filters into one [`Predicate`]:
//!
//! ```text
//! match = (text is blank OR any searchable field contains text)
//!       ∧ (every active filter matches)
//! ```
//!
//! Empty text and no active filters give the always-true predicate, which
//! is what an "All" tab shows.

use tracing::debug;

use crate::clause::Clause;
use crate::criteria::Criteria;
use crate::error::{FinderError, Result};
use crate::extract::{coerce, search_text};
use crate::field_spec::{FieldSpec, FieldType};
use crate::record::Record;

/// Case-insensitive substring search across the searchable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMatch {
    needle: String,
    fields: Vec<(String, FieldType)>,
}

impl TextMatch {
    /// The lower-cased, trimmed search text.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Returns `true` if any searchable field contains the needle.
    pub fn matches<T: Record + ?Sized>(&self, item: &T) -> bool {
        self.fields.iter().any(|(field, ty)| {
            let value = coerce(item.field_value(field), *ty);
            search_text(&value).to_lowercase().contains(&self.needle)
        })
    }
}

/// A validated, reusable filter over items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    text: Option<TextMatch>,
    clauses: Vec<Clause>,
}

impl Predicate {
    /// The predicate that accepts every item.
    pub fn always() -> Self {
        Predicate::default()
    }

    /// Returns `true` if this predicate accepts every item.
    pub fn is_always(&self) -> bool {
        self.text.is_none() && self.clauses.is_empty()
    }

    /// The text search part, if there is search text.
    pub fn text(&self) -> Option<&TextMatch> {
        self.text.as_ref()
    }

    /// The active filter clauses.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Tests a single item.
    pub fn matches<T: Record + ?Sized>(&self, item: &T) -> bool {
        if !self.clauses.iter().all(|clause| clause.matches(item)) {
            return false;
        }
        self.text.as_ref().map_or(true, |text| text.matches(item))
    }
}

/// Builds the predicate for `criteria` against `spec`.
///
/// Every filter is validated before any item is looked at:
/// - a filter on a field that is not filterable fails with
///   [`UnknownField`](FinderError::UnknownField);
/// - `min > max` fails with [`InvalidRange`](FinderError::InvalidRange);
/// - a value of the wrong shape fails with
///   [`FilterMismatch`](FinderError::FilterMismatch).
///
/// Inactive filter values are validated for field name only.
pub fn compose(criteria: &Criteria, spec: &FieldSpec) -> Result<Predicate> {
    let mut clauses = Vec::new();
    for (field, value) in &criteria.filters {
        let kind = spec
            .filter_kind(field)
            .ok_or_else(|| FinderError::unknown_field(field))?;
        if let Some(clause) = Clause::compile(field, kind, value)? {
            clauses.push(clause);
        }
    }

    let needle = criteria.text.trim().to_lowercase();
    let text = if needle.is_empty() {
        None
    } else {
        let fields = spec
            .searchable()
            .iter()
            .map(|field| Ok((field.clone(), spec.field_type(field)?)))
            .collect::<Result<Vec<_>>>()?;
        Some(TextMatch { needle, fields })
    };

    debug!(
        clauses = clauses.len(),
        text = ?text.as_ref().map(TextMatch::needle),
        "composed predicate"
    );

    Ok(Predicate { text, clauses })
}
