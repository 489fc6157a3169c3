//! Declarative description of an entity type's queryable fields.
//!
//! A [`FieldSpec`] is declared once per entity type (questions, recipes,
//! lessons, sessions, listings, competitions) and shared by every screen
//! that lists that entity. It is usually loaded from the YAML catalog (see
//! [`SpecRegistry`](crate::SpecRegistry)) but can be built in code:
//!
//! ```
//! use pulse_finder::{FieldSpec, FilterKind, SortType};
//!
//! let recipes = FieldSpec::new()
//!     .search("title")
//!     .search("tags")
//!     .filter("category", FilterKind::Exact)
//!     .filter("tags", FilterKind::SetMembership)
//!     .filter("calories", FilterKind::NumericRange)
//!     .sort("reviews", SortType::Number)
//!     .pair("liked", "likes");
//!
//! assert!(recipes.is_declared("calories"));
//! assert!(!recipes.is_declared("calroies"));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FinderError, Result};
use crate::overlay::ToggleRule;

/// How a filterable field is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    /// Equality against a single value; `"all"` disables the filter.
    Exact,
    /// Non-empty intersection between a list field and the chosen values.
    SetMembership,
    /// Inclusive numeric bounds.
    NumericRange,
    /// Inclusive date bounds.
    DateRange,
}

impl FilterKind {
    /// The value type a field of this kind is extracted as.
    pub fn field_type(self) -> FieldType {
        match self {
            FilterKind::Exact => FieldType::Text,
            FilterKind::SetMembership => FieldType::List,
            FilterKind::NumericRange => FieldType::Number,
            FilterKind::DateRange => FieldType::Date,
        }
    }

    /// Returns the display name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::Exact => "exact",
            FilterKind::SetMembership => "setMembership",
            FilterKind::NumericRange => "numericRange",
            FilterKind::DateRange => "dateRange",
        }
    }
}

/// Comparator used when sorting by a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortType {
    /// Numeric comparison, missing values last.
    Number,
    /// Case-insensitive string comparison.
    String,
    /// Chronological comparison, missing values last.
    Date,
}

impl SortType {
    /// The value type a field sorted this way is extracted as.
    pub fn field_type(self) -> FieldType {
        match self {
            SortType::Number => FieldType::Number,
            SortType::String => FieldType::Text,
            SortType::Date => FieldType::Date,
        }
    }
}

/// Resolved value type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Plain string, `""` when absent.
    Text,
    /// List of strings, empty when absent.
    List,
    /// Number, `None` when absent or malformed.
    Number,
    /// Timestamp, `None` when absent or malformed.
    Date,
}

impl FieldType {
    /// The comparator a field of this type sorts with by default.
    pub fn sort_type(self) -> SortType {
        match self {
            FieldType::Text | FieldType::List => SortType::String,
            FieldType::Number => SortType::Number,
            FieldType::Date => SortType::Date,
        }
    }
}

/// Searchable, filterable and sortable fields of one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldSpec {
    searchable: Vec<String>,
    filterable: BTreeMap<String, FilterKind>,
    sortable: BTreeMap<String, SortType>,
    paired_counters: BTreeMap<String, String>,
}

impl FieldSpec {
    /// Creates an empty spec. It declares no fields, so only the
    /// unfiltered, unsorted view can be queried against it.
    pub fn new() -> Self {
        FieldSpec::default()
    }

    /// Adds a field to free-text search. Order is preserved.
    pub fn search(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.searchable.contains(&field) {
            self.searchable.push(field);
        }
        self
    }

    /// Declares a filterable field.
    pub fn filter(mut self, field: impl Into<String>, kind: FilterKind) -> Self {
        self.filterable.insert(field.into(), kind);
        self
    }

    /// Declares a sortable field.
    pub fn sort(mut self, field: impl Into<String>, ty: SortType) -> Self {
        self.sortable.insert(field.into(), ty);
        self
    }

    /// Pairs a toggle flag with a counter, e.g. `liked` with `likes`.
    pub fn pair(mut self, flag: impl Into<String>, counter: impl Into<String>) -> Self {
        self.paired_counters.insert(flag.into(), counter.into());
        self
    }

    /// Fields searched by free text, in declaration order.
    pub fn searchable(&self) -> &[String] {
        &self.searchable
    }

    /// Filterable fields and their kinds.
    pub fn filterable(&self) -> &BTreeMap<String, FilterKind> {
        &self.filterable
    }

    /// Sortable fields and their comparators.
    pub fn sortable(&self) -> &BTreeMap<String, SortType> {
        &self.sortable
    }

    /// Filter kind of a field, if it is filterable.
    pub fn filter_kind(&self, field: &str) -> Option<FilterKind> {
        self.filterable.get(field).copied()
    }

    /// Returns `true` if the field appears anywhere in the spec.
    pub fn is_declared(&self, field: &str) -> bool {
        self.sortable.contains_key(field)
            || self.filterable.contains_key(field)
            || self.searchable.iter().any(|f| f == field)
    }

    /// Resolves the value type of a declared field.
    ///
    /// The sortable type wins over the filter kind, which wins over plain
    /// searchability.
    pub fn field_type(&self, field: &str) -> Result<FieldType> {
        if let Some(ty) = self.sortable.get(field) {
            return Ok(ty.field_type());
        }
        if let Some(kind) = self.filterable.get(field) {
            return Ok(kind.field_type());
        }
        if self.searchable.iter().any(|f| f == field) {
            return Ok(FieldType::Text);
        }
        Err(FinderError::unknown_field(field))
    }

    /// Comparator for a sort key on `field`, honouring an explicit hint.
    pub fn sort_type(&self, field: &str, hint: Option<SortType>) -> Result<SortType> {
        let declared = self.field_type(field)?;
        Ok(hint
            .or_else(|| self.sortable.get(field).copied())
            .unwrap_or_else(|| declared.sort_type()))
    }

    /// Toggle rule for a flag: paired with its counter when one is declared.
    pub fn toggle_rule(&self, flag: &str) -> ToggleRule {
        match self.paired_counters.get(flag) {
            Some(counter) => ToggleRule::paired(counter.clone()),
            None => ToggleRule::plain(),
        }
    }

    /// Parses a spec from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parses a spec from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
