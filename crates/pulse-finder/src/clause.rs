//! Compiled filter clauses.
//!
//! A [`Clause`] is one active filter, already checked against the field
//! spec: a field name, the type it is extracted as, and the test applied
//! to the extracted value.

use std::cmp::Ordering;

use crate::criteria::{FilterValue, Range, Scalar};
use crate::error::{FinderError, Result};
use crate::extract::{coerce, to_number, to_timestamp};
use crate::field_spec::{FieldType, FilterKind};
use crate::record::Record;
use crate::value::{Number, Timestamp, Value};

/// The test a clause applies to an extracted value.
#[derive(Debug, Clone, PartialEq)]
pub enum ClauseTest {
    /// Value equals the scalar.
    Exact(Scalar),
    /// List value shares at least one entry with the set.
    AnyOf(Vec<String>),
    /// Number within inclusive bounds.
    NumberRange {
        min: Option<Number>,
        max: Option<Number>,
    },
    /// Timestamp within inclusive bounds.
    DateRange {
        min: Option<Timestamp>,
        max: Option<Timestamp>,
    },
}

impl ClauseTest {
    /// Evaluates this test against an extracted value.
    ///
    /// A missing value never satisfies a range: an item with an unknown
    /// price is not "under 50".
    pub fn matches(&self, value: &Value<'_>) -> bool {
        match self {
            ClauseTest::Exact(expected) => match (expected, value) {
                (Scalar::Text(e), Value::String(v)) => e == v,
                (Scalar::Number(e), Value::Number(v)) => {
                    v.compare(*e) == Some(Ordering::Equal)
                }
                (Scalar::Bool(e), Value::Bool(v)) => e == v,
                _ => false,
            },
            ClauseTest::AnyOf(wanted) => match value {
                Value::List(items) => items.iter().any(|item| wanted.iter().any(|w| w == item)),
                _ => false,
            },
            ClauseTest::NumberRange { min, max } => match to_number(value) {
                Some(n) => {
                    min.map_or(true, |min| n.compare(min).is_some_and(|o| o != Ordering::Less))
                        && max.map_or(true, |max| {
                            n.compare(max).is_some_and(|o| o != Ordering::Greater)
                        })
                }
                None => false,
            },
            ClauseTest::DateRange { min, max } => match to_timestamp(value) {
                Some(t) => min.map_or(true, |min| t >= min) && max.map_or(true, |max| t <= max),
                None => false,
            },
        }
    }
}

/// A single active filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    field: String,
    ty: FieldType,
    test: ClauseTest,
}

impl Clause {
    /// Compiles a filter value for a field of the given kind.
    ///
    /// Returns `Ok(None)` for inactive values (`"all"`, empty set, open
    /// range), so they never reach the per-item pass.
    pub fn compile(field: &str, kind: FilterKind, value: &FilterValue) -> Result<Option<Clause>> {
        if value.is_inactive() {
            return Ok(None);
        }

        let test = match (kind, value) {
            (FilterKind::Exact, FilterValue::Exact(scalar)) => ClauseTest::Exact(scalar.clone()),
            (FilterKind::Exact, _) => return Err(FinderError::mismatch(field, "a single value")),

            (FilterKind::SetMembership, FilterValue::AnyOf(values)) => {
                ClauseTest::AnyOf(values.clone())
            }
            // A single-select chip over a list field.
            (FilterKind::SetMembership, FilterValue::Exact(Scalar::Text(value))) => {
                ClauseTest::AnyOf(vec![value.clone()])
            }
            (FilterKind::SetMembership, _) => {
                return Err(FinderError::mismatch(field, "a list of values"))
            }

            (FilterKind::NumericRange, FilterValue::Range(range)) => number_range(field, range)?,
            (FilterKind::NumericRange, _) => {
                return Err(FinderError::mismatch(field, "a {min, max} numeric range"))
            }

            (FilterKind::DateRange, FilterValue::Range(range)) => date_range(field, range)?,
            (FilterKind::DateRange, _) => {
                return Err(FinderError::mismatch(field, "a {min, max} date range"))
            }
        };

        Ok(Some(Clause {
            field: field.to_string(),
            ty: kind.field_type(),
            test,
        }))
    }

    /// The filtered field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The test applied to the field.
    pub fn test(&self) -> &ClauseTest {
        &self.test
    }

    /// Evaluates this clause against an item.
    pub fn matches<T: Record + ?Sized>(&self, item: &T) -> bool {
        let value = coerce(item.field_value(&self.field), self.ty);
        self.test.matches(&value)
    }
}

fn number_bound(field: &str, bound: Option<&Scalar>) -> Result<Option<Number>> {
    let Some(bound) = bound else {
        return Ok(None);
    };
    let number = match bound {
        Scalar::Number(n) if !n.is_nan() => Some(*n),
        Scalar::Text(s) => Number::parse(s),
        _ => None,
    };
    number
        .map(Some)
        .ok_or_else(|| FinderError::mismatch(field, "numeric bounds"))
}

fn date_bound(field: &str, bound: Option<&Scalar>) -> Result<Option<Timestamp>> {
    let Some(bound) = bound else {
        return Ok(None);
    };
    let ts = match bound {
        Scalar::Text(s) => Timestamp::parse(s),
        Scalar::Number(n) if !n.is_nan() => Some(Timestamp::from_millis(n.to_i64())),
        _ => None,
    };
    ts.map(Some)
        .ok_or_else(|| FinderError::mismatch(field, "date bounds"))
}

fn invalid_range(field: &str, min: impl ToString, max: impl ToString) -> FinderError {
    FinderError::InvalidRange {
        field: field.to_string(),
        min: min.to_string(),
        max: max.to_string(),
    }
}

fn number_range(field: &str, range: &Range) -> Result<ClauseTest> {
    let min = number_bound(field, range.min.as_ref())?;
    let max = number_bound(field, range.max.as_ref())?;
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo.compare(hi) == Some(Ordering::Greater) {
            return Err(invalid_range(field, lo, hi));
        }
    }
    Ok(ClauseTest::NumberRange { min, max })
}

fn date_range(field: &str, range: &Range) -> Result<ClauseTest> {
    let min = date_bound(field, range.min.as_ref())?;
    let max = date_bound(field, range.max.as_ref())?;
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(invalid_range(field, lo, hi));
        }
    }
    Ok(ClauseTest::DateRange { min, max })
}
