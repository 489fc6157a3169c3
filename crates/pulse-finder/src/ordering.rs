//! Sort chain types and the stable multi-key sort.
//!
//! Provides [`Dir`] for sort direction, [`OrderBy`] for one compiled sort
//! key and [`sort_by_orderings`] for applying a whole chain.

use std::cmp::Ordering;

use tracing::debug;

use crate::criteria::SortKey;
use crate::error::{FinderError, Result};
use crate::extract::{coerce, search_text};
use crate::field_spec::{FieldSpec, SortType};
use crate::record::Record;
use crate::value::{Number, Timestamp, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Parses `asc` or `desc`, ignoring case and surrounding whitespace.
    pub fn parse(direction: &str) -> Option<Dir> {
        let direction = direction.trim();
        if direction.eq_ignore_ascii_case("asc") {
            Some(Dir::Asc)
        } else if direction.eq_ignore_ascii_case("desc") {
            Some(Dir::Desc)
        } else {
            None
        }
    }

    /// Returns `true` if this is ascending order.
    pub fn is_asc(self) -> bool {
        matches!(self, Dir::Asc)
    }

    /// Applies this direction to an ordering.
    ///
    /// For `Asc`, returns the ordering unchanged.
    /// For `Desc`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The comparable key of one item for one sort field.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    /// Lower-cased text.
    Text(String),
    /// A number.
    Number(Number),
    /// A point in time.
    Date(Timestamp),
    /// Missing or malformed; always sorts last.
    Null,
}

impl SortValue {
    /// Returns `true` for a missing value.
    pub fn is_null(&self) -> bool {
        matches!(self, SortValue::Null)
    }
}

/// A compiled sort key: field, direction and comparator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The field to sort by.
    pub field: String,
    /// The sort direction.
    pub dir: Dir,
    /// The comparator.
    pub ty: SortType,
}

impl OrderBy {
    /// Creates an ordering with an explicit comparator.
    pub fn new(field: impl Into<String>, dir: Dir, ty: SortType) -> Self {
        OrderBy {
            field: field.into(),
            dir,
            ty,
        }
    }

    /// Validates a [`SortKey`] against the field spec.
    ///
    /// Fails with [`InvalidSortDirection`](FinderError::InvalidSortDirection)
    /// for anything but `asc`/`desc` and with
    /// [`UnknownField`](FinderError::UnknownField) for a field the spec does
    /// not declare.
    pub fn compile(key: &SortKey, spec: &FieldSpec) -> Result<OrderBy> {
        let dir =
            Dir::parse(&key.direction).ok_or_else(|| FinderError::InvalidSortDirection {
                field: key.field.clone(),
                direction: key.direction.clone(),
            })?;
        let ty = spec.sort_type(&key.field, key.type_hint)?;
        Ok(OrderBy::new(key.field.clone(), dir, ty))
    }

    /// Reads the sort key of an item.
    pub fn key<T: Record + ?Sized>(&self, item: &T) -> SortValue {
        let value = coerce(item.field_value(&self.field), self.ty.field_type());
        match (self.ty, value) {
            (SortType::Number, Value::Number(n)) => SortValue::Number(n),
            (SortType::Date, Value::Timestamp(t)) => SortValue::Date(t),
            (SortType::String, value) => SortValue::Text(search_text(&value).to_lowercase()),
            _ => SortValue::Null,
        }
    }

    /// Compares two keys according to this ordering.
    pub fn compare(&self, a: &SortValue, b: &SortValue) -> Ordering {
        compare_values(a, b, self.dir)
    }
}

/// Compiles a whole sort chain, primary key first.
pub fn compile_orderings(keys: &[SortKey], spec: &FieldSpec) -> Result<Vec<OrderBy>> {
    let orderings = keys
        .iter()
        .map(|key| OrderBy::compile(key, spec))
        .collect::<Result<Vec<_>>>()?;
    debug!(
        keys = ?orderings
            .iter()
            .map(|o| format!("{}:{}", o.field, o.dir))
            .collect::<Vec<_>>(),
        "compiled sort chain"
    );
    Ok(orderings)
}

/// Compares two sort keys.
///
/// [`SortValue::Null`] goes after every present value whatever the
/// direction; only present values are reversed by `Desc`.
pub fn compare_values(a: &SortValue, b: &SortValue, dir: Dir) -> Ordering {
    let base = match (a, b) {
        (SortValue::Null, SortValue::Null) => return Ordering::Equal,
        (SortValue::Null, _) => return Ordering::Greater,
        (_, SortValue::Null) => return Ordering::Less,

        (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
        (SortValue::Number(a), SortValue::Number(b)) => a.compare(*b).unwrap_or(Ordering::Equal),
        (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),

        // Keys of one ordering share a comparator.
        _ => Ordering::Equal,
    };
    dir.apply(base)
}

/// Compares two items using a chain of orderings.
///
/// Uses the first ordering as the primary sort key, the second to break
/// ties, etc. If all orderings compare equal, returns `Equal`.
pub fn compare_by_orderings<T: Record + ?Sized>(a: &T, b: &T, orderings: &[OrderBy]) -> Ordering {
    for order_by in orderings {
        let ordering = order_by.compare(&order_by.key(a), &order_by.key(b));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Stably sorts items by a chain of orderings.
///
/// Keys are read once per item. Items that tie on every key keep their
/// incoming order.
pub fn sort_by_orderings<T: Record>(items: Vec<T>, orderings: &[OrderBy]) -> Vec<T> {
    if orderings.is_empty() || items.len() < 2 {
        return items;
    }

    let mut keyed: Vec<(Vec<SortValue>, T)> = items
        .into_iter()
        .map(|item| (orderings.iter().map(|o| o.key(&item)).collect(), item))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        orderings
            .iter()
            .zip(a.iter().zip(b.iter()))
            .map(|(order_by, (a, b))| order_by.compare(a, b))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });

    keyed.into_iter().map(|(_, item)| item).collect()
}
