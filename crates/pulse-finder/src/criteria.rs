//! Query criteria: the raw search, filter and sort choices coming from a
//! screen's controls.
//!
//! [`Criteria`] is deliberately loose: it holds what the UI produced,
//! including the `"all"` chip and direction strings. It is validated
//! against a [`FieldSpec`](crate::FieldSpec) when a query is compiled, not
//! when it is built.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::field_spec::SortType;
use crate::value::Number;

/// The value a categorical chip or dropdown selects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean selection.
    Bool(bool),
    /// Numeric selection.
    Number(Number),
    /// Text selection.
    Text(String),
}

impl Scalar {
    /// Returns `true` for the `"all"` sentinel (case-insensitive).
    pub fn is_all(&self) -> bool {
        matches!(self, Scalar::Text(s) if s.trim().eq_ignore_ascii_case("all"))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<Number> for Scalar {
    fn from(n: Number) -> Self {
        Scalar::Number(n)
    }
}

macro_rules! scalar_from_number {
    ($($source:ty),*) => {
        $(
            impl From<$source> for Scalar {
                fn from(n: $source) -> Self {
                    Scalar::Number(Number::from(n))
                }
            }
        )*
    };
}

scalar_from_number!(i32, i64, u32, u64, usize, f32, f64);

/// Inclusive bounds for a range filter. A missing bound is open.
///
/// Deserializes only from a `{min, max}` object. An array such as
/// `[1, 5]` is rejected rather than read as positional bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Range {
    /// Lower bound, inclusive.
    pub min: Option<Scalar>,
    /// Upper bound, inclusive.
    pub max: Option<Scalar>,
}

impl<'de> Deserialize<'de> for Range {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RangeVisitor)
    }
}

struct RangeVisitor;

impl<'de> Visitor<'de> for RangeVisitor {
    type Value = Range;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object with optional `min` and `max` bounds")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Range, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut range = Range::default();
        while let Some(key) = map.next_key::<String>()? {
            let bound = match key.as_str() {
                "min" => &mut range.min,
                "max" => &mut range.max,
                other => return Err(de::Error::unknown_field(other, &["min", "max"])),
            };
            *bound = map.next_value()?;
        }
        Ok(range)
    }
}

impl Range {
    /// Returns `true` when neither bound is set.
    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// The value selected for one filterable field.
///
/// In JSON: `null` is [`Unset`](FilterValue::Unset), an array of strings
/// is [`AnyOf`](FilterValue::AnyOf), an object with `min`/`max` is a
/// [`Range`](FilterValue::Range) and a scalar is
/// [`Exact`](FilterValue::Exact). Anything else, including an array of
/// numbers, fails to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// No selection; the filter is inactive.
    Unset,
    /// Any of these values (set membership).
    AnyOf(Vec<String>),
    /// Inclusive bounds.
    Range(Range),
    /// A single value (exact match); `"all"` is inactive.
    Exact(Scalar),
}

impl FilterValue {
    /// Returns `true` if this value selects everything.
    pub fn is_inactive(&self) -> bool {
        match self {
            FilterValue::Unset => true,
            FilterValue::AnyOf(values) => values.is_empty(),
            FilterValue::Range(range) => range.is_open(),
            FilterValue::Exact(scalar) => scalar.is_all(),
        }
    }
}

/// One entry of the sort chain.
///
/// `direction` stays a string until the query is compiled so that a bad
/// value from the UI surfaces as
/// [`InvalidSortDirection`](crate::FinderError::InvalidSortDirection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortKey {
    /// Field to sort by.
    pub field: String,
    /// `asc` or `desc`.
    #[serde(default = "default_direction")]
    pub direction: String,
    /// Comparator override; defaults to the field's declared type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<SortType>,
}

fn default_direction() -> String {
    "asc".to_string()
}

impl SortKey {
    /// Creates a sort key with the given direction string.
    pub fn new(field: impl Into<String>, direction: impl Into<String>) -> Self {
        SortKey {
            field: field.into(),
            direction: direction.into(),
            type_hint: None,
        }
    }

    /// Creates an ascending sort key.
    pub fn asc(field: impl Into<String>) -> Self {
        SortKey::new(field, "asc")
    }

    /// Creates a descending sort key.
    pub fn desc(field: impl Into<String>) -> Self {
        SortKey::new(field, "desc")
    }

    /// Overrides the comparator.
    pub fn typed(mut self, ty: SortType) -> Self {
        self.type_hint = Some(ty);
        self
    }
}

/// Search text, filters and sort chain for one query.
///
/// # Example
///
/// ```
/// use pulse_finder::Criteria;
///
/// let criteria = Criteria::new()
///     .text("protein")
///     .filter_eq("category", "breakfast")
///     .filter_any("dietary", ["vegan", "gluten-free"])
///     .filter_range("calories", 200, 500)
///     .order_desc("featured")
///     .order_desc("reviews")
///     .build();
///
/// assert_eq!(criteria.sort.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Criteria {
    /// Raw search text; empty or whitespace means no text filter.
    pub text: String,
    /// Selected filter values by field.
    pub filters: BTreeMap<String, FilterValue>,
    /// Sort chain, primary key first.
    pub sort: Vec<SortKey>,
}

impl Criteria {
    /// Creates empty criteria. Empty criteria select every item in its
    /// original order.
    pub fn new() -> Self {
        Criteria::default()
    }

    // ========================================================================
    // Text
    // ========================================================================

    /// Sets the search text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Sets a filter value.
    pub fn filter(mut self, field: &str, value: FilterValue) -> Self {
        self.filters.insert(field.to_string(), value);
        self
    }

    /// Sets an exact-match filter.
    pub fn filter_eq(self, field: &str, value: impl Into<Scalar>) -> Self {
        self.filter(field, FilterValue::Exact(value.into()))
    }

    /// Sets a set-membership filter.
    pub fn filter_any<I, S>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.filter(field, FilterValue::AnyOf(values))
    }

    /// Sets an inclusive range filter.
    pub fn filter_range(self, field: &str, min: impl Into<Scalar>, max: impl Into<Scalar>) -> Self {
        self.filter(
            field,
            FilterValue::Range(Range {
                min: Some(min.into()),
                max: Some(max.into()),
            }),
        )
    }

    /// Sets a range filter with only a lower bound.
    pub fn filter_min(self, field: &str, min: impl Into<Scalar>) -> Self {
        self.filter(
            field,
            FilterValue::Range(Range {
                min: Some(min.into()),
                max: None,
            }),
        )
    }

    /// Sets a range filter with only an upper bound.
    pub fn filter_max(self, field: &str, max: impl Into<Scalar>) -> Self {
        self.filter(
            field,
            FilterValue::Range(Range {
                min: None,
                max: Some(max.into()),
            }),
        )
    }

    /// Removes a filter.
    pub fn clear_filter(mut self, field: &str) -> Self {
        self.filters.remove(field);
        self
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Appends a sort key with a direction string.
    pub fn order_by(mut self, field: &str, direction: &str) -> Self {
        self.sort.push(SortKey::new(field, direction));
        self
    }

    /// Appends an ascending sort key.
    pub fn order_asc(self, field: &str) -> Self {
        self.order_by(field, "asc")
    }

    /// Appends a descending sort key.
    pub fn order_desc(self, field: &str) -> Self {
        self.order_by(field, "desc")
    }

    /// Finalizes the criteria. Validation happens when the query compiles.
    pub fn build(self) -> Self {
        self
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Returns `true` if there is search text after trimming.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Filters that actually narrow the result.
    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.filters
            .iter()
            .filter(|(_, value)| !value.is_inactive())
            .map(|(field, value)| (field.as_str(), value))
    }

    /// Returns `true` if these criteria select everything.
    pub fn is_unfiltered(&self) -> bool {
        !self.has_text() && self.active_filters().next().is_none()
    }

    /// Parses criteria as sent by a screen:
    /// `{"text": "...", "filters": {...}, "sort": [{"field": "...", "direction": "desc"}]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
