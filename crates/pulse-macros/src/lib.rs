//! Proc macros for Pulse.
//!
//! # Available Macros
//!
//! - [`Record`] - Generate a `pulse_finder::Record` implementation and
//!   field name constants from struct field annotations

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod record;

/// Derives `pulse_finder::Record` for a struct with named fields.
///
/// # Field Attributes
///
/// | Attribute | Field types | Exposed as |
/// |-----------|-------------|------------|
/// | `id` | integers, `String`, `&str` | the record id |
/// | `text` | `String`, `&str`, `Cow<str>`, `Option<_>` | text |
/// | `list` | `Vec<String>`, `BTreeSet<String>`, `Option<_>` | list of strings |
/// | `number` | integer and float primitives, `Option<_>` | number (NaN is missing) |
/// | `date` | `Timestamp`, epoch millis, `chrono` dates, date strings | timestamp |
/// | `flag` | `bool` | boolean |
/// | `skip` | any | not exposed |
/// | `rename = "..."` | any | custom field name |
///
/// Exactly one field must carry `id`; it may also carry a kind to make the
/// id queryable. Fields without a kind are not exposed.
///
/// # Generated Code
///
/// 1. A constant per exposed field (e.g. `Recipe::TITLE`,
///    `Recipe::LIKE_COUNT`) and `Recipe::FIELDS` listing them all
/// 2. An implementation of `Record`
///
/// # Example
///
/// ```ignore
/// use pulse_finder::{Criteria, FieldSpec, Finder, FilterKind, Overlay, SortType};
/// use pulse_macros::Record;
///
/// #[derive(Record)]
/// struct Recipe {
///     #[record(id)]
///     id: u32,
///
///     #[record(text)]
///     title: String,
///
///     #[record(list)]
///     dietary: Vec<String>,
///
///     #[record(number)]
///     reviews: u32,
///
///     #[record(skip)]
///     image_url: String,
/// }
///
/// let finder = Finder::new(
///     FieldSpec::new()
///         .search(Recipe::TITLE)
///         .filter(Recipe::DIETARY, FilterKind::SetMembership)
///         .sort(Recipe::REVIEWS, SortType::Number),
/// );
///
/// let criteria = Criteria::new()
///     .filter_any(Recipe::DIETARY, ["vegan"])
///     .order_desc(Recipe::REVIEWS);
/// let rows = finder.query(&recipes, &criteria, &Overlay::new())?;
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
