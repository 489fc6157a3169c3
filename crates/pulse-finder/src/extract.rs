//! Field extraction: turns a record's raw field value into the comparable
//! value for its declared type.
//!
//! | Declared type | Absent | Malformed |
//! |---------------|--------|-----------|
//! | text | `""` | passed through |
//! | list | `[]` | a lone string becomes a one-item list |
//! | number | `None` | `None` |
//! | date | `None` | `None` |

use std::borrow::Cow;

use crate::error::Result;
use crate::field_spec::{FieldSpec, FieldType};
use crate::record::Record;
use crate::value::{Number, Timestamp, Value};

/// Extracts a declared field from an item.
///
/// Fails with [`UnknownField`](crate::FinderError::UnknownField) when the
/// field is not in the spec, so a misspelt name surfaces instead of
/// silently matching nothing.
pub fn extract<'a, T>(item: &'a T, spec: &FieldSpec, field: &str) -> Result<Value<'a>>
where
    T: Record + ?Sized,
{
    let ty = spec.field_type(field)?;
    Ok(coerce(item.field_value(field), ty))
}

/// Normalizes a raw value to the given field type.
pub(crate) fn coerce(raw: Value<'_>, ty: FieldType) -> Value<'_> {
    match ty {
        FieldType::Text => match raw {
            Value::None => Value::String(""),
            other => other,
        },
        FieldType::List => match raw {
            Value::List(items) => Value::List(items),
            Value::String(s) => Value::List(vec![s]),
            _ => Value::List(Vec::new()),
        },
        FieldType::Number => to_number(&raw).map_or(Value::None, Value::Number),
        FieldType::Date => to_timestamp(&raw).map_or(Value::None, Value::Timestamp),
    }
}

/// Reads a value as a number.
///
/// Numeric strings are parsed and booleans count as `1`/`0`, so a
/// `featured` flag can be sorted on. NaN is treated as missing.
pub fn to_number(value: &Value<'_>) -> Option<Number> {
    match value {
        Value::Number(n) if !n.is_nan() => Some(*n),
        Value::String(s) => Number::parse(s),
        Value::Bool(b) => Some(Number::I64(i64::from(*b))),
        Value::Timestamp(t) => Some(Number::I64(t.as_millis())),
        _ => None,
    }
}

/// Reads a value as a timestamp. Numbers are epoch milliseconds.
pub fn to_timestamp(value: &Value<'_>) -> Option<Timestamp> {
    match value {
        Value::Timestamp(t) => Some(*t),
        Value::String(s) => Timestamp::parse(s),
        Value::Number(n) if !n.is_nan() => Some(Timestamp::from_millis(n.to_i64())),
        _ => None,
    }
}

/// Reads a value as a flag: booleans as-is, non-zero numbers as set.
pub fn to_flag(value: &Value<'_>) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) if !n.is_nan() => Some(n.to_f64() != 0.0),
        _ => None,
    }
}

/// String form used by free-text search; lists are joined with a space.
pub fn search_text<'a>(value: &Value<'a>) -> Cow<'a, str> {
    match value {
        Value::String(s) => Cow::Borrowed(*s),
        Value::List(items) => Cow::Owned(items.join(" ")),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Timestamp(t) => Cow::Owned(t.to_string()),
        Value::None => Cow::Borrowed(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_spec::{FilterKind, SortType};
    use crate::FinderError;
    use serde_json::json;

    fn spec() -> FieldSpec {
        FieldSpec::new()
            .search("title")
            .search("notes")
            .filter("tags", FilterKind::SetMembership)
            .filter("startsAt", FilterKind::DateRange)
            .sort("rating", SortType::Number)
    }

    #[test]
    fn text_absent_is_empty_string() {
        let item = json!({"id": 1, "title": "Hill sprints"});
        assert_eq!(extract(&item, &spec(), "title").unwrap(), Value::String("Hill sprints"));
        assert_eq!(extract(&item, &spec(), "notes").unwrap(), Value::String(""));
    }

    #[test]
    fn list_passes_through_and_wraps_strings() {
        let tagged = json!({"id": 1, "tags": ["Yoga", "Core"]});
        let single = json!({"id": 2, "tags": "Yoga"});
        let bare = json!({"id": 3});

        assert_eq!(
            extract(&tagged, &spec(), "tags").unwrap(),
            Value::List(vec!["Yoga", "Core"])
        );
        assert_eq!(extract(&single, &spec(), "tags").unwrap(), Value::List(vec!["Yoga"]));
        assert_eq!(extract(&bare, &spec(), "tags").unwrap(), Value::List(vec![]));
    }

    #[test]
    fn number_missing_or_malformed_is_none() {
        let rated = json!({"id": 1, "rating": 4.5});
        let text = json!({"id": 2, "rating": "4"});
        let junk = json!({"id": 3, "rating": "n/a"});
        let bare = json!({"id": 4});

        assert_eq!(
            extract(&rated, &spec(), "rating").unwrap(),
            Value::Number(Number::F64(4.5))
        );
        assert_eq!(
            extract(&text, &spec(), "rating").unwrap(),
            Value::Number(Number::I64(4))
        );
        assert_eq!(extract(&junk, &spec(), "rating").unwrap(), Value::None);
        assert_eq!(extract(&bare, &spec(), "rating").unwrap(), Value::None);
    }

    #[test]
    fn dates_parse_or_none() {
        let dated = json!({"id": 1, "startsAt": "2024-06-01"});
        let junk = json!({"id": 2, "startsAt": "tomorrow"});

        assert_eq!(
            extract(&dated, &spec(), "startsAt").unwrap(),
            Value::Timestamp(Timestamp::parse("2024-06-01").unwrap())
        );
        assert_eq!(extract(&junk, &spec(), "startsAt").unwrap(), Value::None);
    }

    #[test]
    fn unknown_field_fails_fast() {
        let item = json!({"id": 1, "titel": "typo"});
        let err = extract(&item, &spec(), "titel").unwrap_err();
        assert!(matches!(err, FinderError::UnknownField { .. }));
    }

    #[test]
    fn booleans_read_as_numbers_and_flags() {
        assert_eq!(to_number(&Value::Bool(true)), Some(Number::I64(1)));
        assert_eq!(to_flag(&Value::Number(Number::I64(0))), Some(false));
        assert_eq!(to_flag(&Value::String("yes")), None);
    }

    #[test]
    fn search_text_joins_lists() {
        assert_eq!(search_text(&Value::List(vec!["Yoga", "Core"])), "Yoga Core");
        assert_eq!(search_text(&Value::Number(Number::I64(42))), "42");
        assert_eq!(search_text(&Value::None), "");
    }
}
