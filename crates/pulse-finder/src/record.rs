//! The [`Record`] trait and the conversion helpers used by
//! `#[derive(Record)]`.

use std::borrow::Cow;
use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use tracing::debug;

use crate::value::{ItemId, Number, Timestamp, Value};

/// An item that can be searched, filtered and sorted.
///
/// Usually derived with `#[derive(Record)]` from `pulse-macros`, but can be
/// implemented by hand:
///
/// ```
/// use pulse_finder::{ItemId, Number, Record, Value};
///
/// struct Question {
///     id: u32,
///     title: String,
///     answers: u32,
/// }
///
/// impl Record for Question {
///     fn record_id(&self) -> ItemId {
///         ItemId::from(self.id)
///     }
///
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "title" => Value::String(&self.title),
///             "answers" => Value::Number(Number::from(self.answers)),
///             _ => Value::None,
///         }
///     }
/// }
/// ```
///
/// `serde_json::Value` objects implement it too, with the `id` key as the
/// item id and dotted paths (`author.name`) reaching into nested objects.
/// Objects without a string or number `id` all get the empty id
/// `ItemId::Str("")`, so they share one [`Overlay`](crate::Overlay) entry:
/// toggling a flag on one of them shows it on all of them.
pub trait Record {
    /// The item's identifier, stable for the item's lifetime.
    fn record_id(&self) -> ItemId;

    /// Returns the value of a field, or [`Value::None`] if the record has
    /// no such field.
    fn field_value(&self, field: &str) -> Value<'_>;
}

impl<T: Record + ?Sized> Record for &T {
    fn record_id(&self) -> ItemId {
        (**self).record_id()
    }

    fn field_value(&self, field: &str) -> Value<'_> {
        (**self).field_value(field)
    }
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn record_id(&self) -> ItemId {
        (**self).record_id()
    }

    fn field_value(&self, field: &str) -> Value<'_> {
        (**self).field_value(field)
    }
}

impl Record for serde_json::Value {
    fn record_id(&self) -> ItemId {
        json_id(self.get("id"))
    }

    fn field_value(&self, field: &str) -> Value<'_> {
        json_value(lookup(self, field))
    }
}

impl Record for serde_json::Map<String, serde_json::Value> {
    fn record_id(&self) -> ItemId {
        json_id(self.get("id"))
    }

    fn field_value(&self, field: &str) -> Value<'_> {
        match self.get(field) {
            Some(value) => json_value(Some(value)),
            None => match field.split_once('.') {
                Some((head, rest)) => json_value(self.get(head).and_then(|v| lookup(v, rest))),
                None => Value::None,
            },
        }
    }
}

fn lookup<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    if let Some(found) = value.get(path) {
        return Some(found);
    }
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
}

fn json_id(value: Option<&serde_json::Value>) -> ItemId {
    match value {
        Some(serde_json::Value::Number(n)) => match n.as_i64() {
            Some(i) => ItemId::Int(i),
            None => ItemId::Str(n.to_string()),
        },
        Some(serde_json::Value::String(s)) => ItemId::Str(s.clone()),
        // Records without an id all share the empty id.
        _ => {
            debug!("json record has no usable id, using the shared empty id");
            ItemId::Str(String::new())
        }
    }
}

fn json_value(value: Option<&serde_json::Value>) -> Value<'_> {
    match value {
        Some(serde_json::Value::String(s)) => Value::String(s),
        Some(serde_json::Value::Bool(b)) => Value::Bool(*b),
        Some(serde_json::Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Value::Number(Number::I64(i))
            } else if let Some(u) = n.as_u64() {
                Value::Number(Number::U64(u))
            } else {
                n.as_f64().map_or(Value::None, |f| Value::Number(Number::F64(f)))
            }
        }
        Some(serde_json::Value::Array(items)) => {
            Value::List(items.iter().filter_map(serde_json::Value::as_str).collect())
        }
        _ => Value::None,
    }
}

// =============================================================================
// Conversions used by the derive macro
// =============================================================================

/// Borrows a text field. Implemented for string types and their `Option`s.
pub trait AsText {
    /// The text, or `None` when absent.
    fn as_text(&self) -> Option<&str>;
}

impl AsText for String {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl AsText for str {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl AsText for &str {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl AsText for Cow<'_, str> {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl<T: AsText> AsText for Option<T> {
    fn as_text(&self) -> Option<&str> {
        self.as_ref().and_then(AsText::as_text)
    }
}

/// Borrows a list-of-strings field (tags, labels, restrictions).
pub trait AsList {
    /// The list items; empty when absent.
    fn as_list(&self) -> Vec<&str>;
}

impl<T: AsText> AsList for [T] {
    fn as_list(&self) -> Vec<&str> {
        self.iter().filter_map(AsText::as_text).collect()
    }
}

impl<T: AsText> AsList for Vec<T> {
    fn as_list(&self) -> Vec<&str> {
        self.as_slice().as_list()
    }
}

impl<T: AsText> AsList for BTreeSet<T> {
    fn as_list(&self) -> Vec<&str> {
        self.iter().filter_map(AsText::as_text).collect()
    }
}

impl<T: AsList> AsList for Option<T> {
    fn as_list(&self) -> Vec<&str> {
        self.as_ref().map(AsList::as_list).unwrap_or_default()
    }
}

/// Converts a numeric field. Implemented for primitives and their `Option`s.
pub trait AsNumber {
    /// The number, or `None` when absent or NaN.
    fn to_number(&self) -> Option<Number>;
}

macro_rules! as_number {
    ($($source:ty),*) => {
        $(
            impl AsNumber for $source {
                fn to_number(&self) -> Option<Number> {
                    Some(Number::from(*self))
                }
            }
        )*
    };
}

as_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl AsNumber for f32 {
    fn to_number(&self) -> Option<Number> {
        (!self.is_nan()).then(|| Number::from(*self))
    }
}

impl AsNumber for f64 {
    fn to_number(&self) -> Option<Number> {
        (!self.is_nan()).then_some(Number::F64(*self))
    }
}

impl AsNumber for Number {
    fn to_number(&self) -> Option<Number> {
        (!self.is_nan()).then_some(*self)
    }
}

impl<T: AsNumber> AsNumber for Option<T> {
    fn to_number(&self) -> Option<Number> {
        self.as_ref().and_then(AsNumber::to_number)
    }
}

/// Converts a date field to a [`Timestamp`].
///
/// Integers are read as epoch milliseconds; strings are parsed with
/// [`Timestamp::parse`].
pub trait AsTimestamp {
    /// The timestamp, or `None` when absent or malformed.
    fn to_timestamp(&self) -> Option<Timestamp>;
}

impl AsTimestamp for Timestamp {
    fn to_timestamp(&self) -> Option<Timestamp> {
        Some(*self)
    }
}

impl AsTimestamp for i64 {
    fn to_timestamp(&self) -> Option<Timestamp> {
        Some(Timestamp::from_millis(*self))
    }
}

impl AsTimestamp for u64 {
    fn to_timestamp(&self) -> Option<Timestamp> {
        i64::try_from(*self).ok().map(Timestamp::from_millis)
    }
}

impl AsTimestamp for String {
    fn to_timestamp(&self) -> Option<Timestamp> {
        Timestamp::parse(self)
    }
}

impl AsTimestamp for &str {
    fn to_timestamp(&self) -> Option<Timestamp> {
        Timestamp::parse(self)
    }
}

impl<Tz: TimeZone> AsTimestamp for DateTime<Tz> {
    fn to_timestamp(&self) -> Option<Timestamp> {
        Some(Timestamp::from_millis(self.timestamp_millis()))
    }
}

impl AsTimestamp for NaiveDateTime {
    fn to_timestamp(&self) -> Option<Timestamp> {
        Some(Timestamp::from_millis(self.and_utc().timestamp_millis()))
    }
}

impl AsTimestamp for NaiveDate {
    fn to_timestamp(&self) -> Option<Timestamp> {
        self.and_hms_opt(0, 0, 0)
            .map(|dt| Timestamp::from_millis(dt.and_utc().timestamp_millis()))
    }
}

impl<T: AsTimestamp> AsTimestamp for Option<T> {
    fn to_timestamp(&self) -> Option<Timestamp> {
        self.as_ref().and_then(AsTimestamp::to_timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_record_fields() {
        let listing = json!({
            "id": 12,
            "title": "Carbon road bike",
            "price": 850.5,
            "tags": ["cycling", "road", 3],
            "negotiable": true,
            "seller": { "name": "Mara", "rating": 4.8 },
            "photo": null,
        });

        assert_eq!(listing.record_id(), ItemId::Int(12));
        assert_eq!(listing.field_value("title"), Value::String("Carbon road bike"));
        assert_eq!(
            listing.field_value("price"),
            Value::Number(Number::F64(850.5))
        );
        assert_eq!(
            listing.field_value("tags"),
            Value::List(vec!["cycling", "road"])
        );
        assert_eq!(listing.field_value("negotiable"), Value::Bool(true));
        assert_eq!(listing.field_value("seller.name"), Value::String("Mara"));
        assert_eq!(listing.field_value("photo"), Value::None);
        assert_eq!(listing.field_value("missing"), Value::None);
        assert_eq!(listing.field_value("seller"), Value::None);
    }

    #[test]
    fn json_records_without_ids_share_overlay_state() {
        use crate::overlay::{Overlay, ToggleRule};

        let first = json!({"title": "Hill sprints"});
        let second = json!({"title": "Tempo run", "id": null});
        assert_eq!(first.record_id(), second.record_id());

        let mut overlay = Overlay::new();
        overlay.toggle(&first, "saved", &ToggleRule::plain());
        assert!(overlay.current_flag(&second, "saved"));
        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn json_record_ids() {
        assert_eq!(json!({"id": "c-1"}).record_id(), ItemId::Str("c-1".into()));
        assert_eq!(json!({"name": "x"}).record_id(), ItemId::Str(String::new()));

        let map = json!({"id": 3, "coach": {"name": "Ines"}});
        let map = map.as_object().unwrap();
        assert_eq!(map.record_id(), ItemId::Int(3));
        assert_eq!(map.field_value("coach.name"), Value::String("Ines"));
    }

    #[test]
    fn text_conversions() {
        let present: Option<String> = Some("run".into());
        let absent: Option<String> = None;
        assert_eq!(present.as_text(), Some("run"));
        assert_eq!(absent.as_text(), None);
    }

    #[test]
    fn list_conversions() {
        let tags = vec!["Yoga".to_string(), "Mobility".to_string()];
        assert_eq!(tags.as_list(), vec!["Yoga", "Mobility"]);

        let none: Option<Vec<String>> = None;
        assert!(none.as_list().is_empty());
    }

    #[test]
    fn number_conversions() {
        assert_eq!(7u8.to_number(), Some(Number::U64(7)));
        assert_eq!(f64::NAN.to_number(), None);
        assert_eq!(Some(4.5f32).to_number(), Some(Number::F64(4.5)));
        assert_eq!(None::<i32>.to_number(), None);
    }

    #[test]
    fn timestamp_conversions() {
        assert_eq!(1_000i64.to_timestamp(), Some(Timestamp(1_000)));
        assert_eq!(
            "2024-01-01".to_string().to_timestamp(),
            Timestamp::parse("2024-01-01T00:00:00Z")
        );
        assert_eq!("soon".to_string().to_timestamp(), None);

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(date.to_timestamp(), "2024-01-01".to_timestamp());
    }
}
