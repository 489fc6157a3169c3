//! Attribute parsing for the Record derive macro.
//!
//! Parses the `#[record(...)]` field attributes.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Ident, Lit, Meta, Result, Token,
};

/// How a field is exposed to the finder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain text: `#[record(text)]`
    Text,
    /// List of strings (tags): `#[record(list)]`
    List,
    /// Number: `#[record(number)]`
    Number,
    /// Date or timestamp: `#[record(date)]`
    Date,
    /// Boolean flag: `#[record(flag)]`
    Flag,
}

impl FieldKind {
    /// Parses a field kind from its name.
    pub fn parse(name: &str, span: Span) -> Result<Self> {
        match name {
            "text" | "Text" | "string" | "String" => Ok(FieldKind::Text),
            "list" | "List" | "tags" => Ok(FieldKind::List),
            "number" | "Number" => Ok(FieldKind::Number),
            "date" | "Date" | "timestamp" | "Timestamp" => Ok(FieldKind::Date),
            "flag" | "Flag" | "boolean" | "Bool" => Ok(FieldKind::Flag),
            other => Err(Error::new(
                span,
                format!(
                    "unknown record field kind: '{}'. Expected one of: text, list, number, date, flag",
                    other
                ),
            )),
        }
    }

    fn from_ident(ident: &Ident) -> Result<Self> {
        FieldKind::parse(&ident.to_string(), ident.span())
    }
}

/// Field-level attributes from `#[record(...)]`.
#[derive(Debug, Clone)]
pub struct RecordAttr {
    /// How the field is exposed, if at all.
    pub kind: Option<FieldKind>,
    /// This field is the record id.
    pub id: bool,
    /// Exclude this field.
    pub skip: bool,
    /// Field name used in field specs and criteria (default: the Rust name).
    pub rename: Option<String>,
    /// The span for error reporting.
    pub span: Span,
}

impl Default for RecordAttr {
    fn default() -> Self {
        RecordAttr {
            kind: None,
            id: false,
            skip: false,
            rename: None,
            span: Span::call_site(),
        }
    }
}

fn string_literal(value: &syn::Expr, what: &str) -> Result<syn::LitStr> {
    match value {
        syn::Expr::Lit(syn::ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.clone()),
        other => Err(Error::new(
            other.span(),
            format!("{} must be a string literal", what),
        )),
    }
}

impl Parse for RecordAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = RecordAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                // record(id), record(skip), record(text), ...
                Meta::Path(p) => {
                    if p.is_ident("id") {
                        attr.id = true;
                        attr.span = p.span();
                    } else if p.is_ident("skip") {
                        attr.skip = true;
                    } else if let Some(ident) = p.get_ident() {
                        if attr.kind.is_some() {
                            return Err(Error::new(ident.span(), "field kind given twice"));
                        }
                        attr.kind = Some(FieldKind::from_ident(ident)?);
                        attr.span = ident.span();
                    } else {
                        return Err(Error::new(
                            p.span(),
                            "expected field kind: text, list, number, date, flag, id, or skip",
                        ));
                    }
                }

                // rename = "likeCount" or kind = "date"
                Meta::NameValue(nv) => {
                    if nv.path.is_ident("rename") {
                        attr.rename = Some(string_literal(&nv.value, "rename")?.value());
                    } else if nv.path.is_ident("kind") {
                        let s = string_literal(&nv.value, "kind")?;
                        attr.kind = Some(FieldKind::parse(&s.value(), s.span())?);
                        attr.span = s.span();
                    } else {
                        return Err(Error::new(
                            nv.path.span(),
                            "unknown attribute. Expected: rename or kind",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown record attribute. Expected: text, list, number, date, flag, id, skip, rename = \"...\", or kind = \"...\"",
                    ));
                }
            }
        }

        if attr.skip && (attr.id || attr.kind.is_some()) {
            return Err(Error::new(attr.span, "skip cannot be combined with other attributes"));
        }

        Ok(attr)
    }
}

/// Extract `#[record(...)]` attributes from a field's attributes.
pub fn parse_record_attrs(attrs: &[Attribute]) -> Result<RecordAttr> {
    for attr in attrs {
        if attr.path().is_ident("record") {
            return attr.parse_args::<RecordAttr>();
        }
    }
    Ok(RecordAttr::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_record(tokens: &str) -> Result<RecordAttr> {
        syn::parse_str::<RecordAttr>(tokens)
    }

    #[test]
    fn test_record_kinds() {
        assert_eq!(parse_record("text").unwrap().kind, Some(FieldKind::Text));
        assert_eq!(parse_record("list").unwrap().kind, Some(FieldKind::List));
        assert_eq!(parse_record("number").unwrap().kind, Some(FieldKind::Number));
        assert_eq!(parse_record("date").unwrap().kind, Some(FieldKind::Date));
        assert_eq!(parse_record("flag").unwrap().kind, Some(FieldKind::Flag));
    }

    #[test]
    fn test_record_id() {
        let attr = parse_record("id").unwrap();
        assert!(attr.id);
        assert_eq!(attr.kind, None);

        let attr = parse_record("id, number").unwrap();
        assert!(attr.id);
        assert_eq!(attr.kind, Some(FieldKind::Number));
    }

    #[test]
    fn test_record_skip() {
        let attr = parse_record("skip").unwrap();
        assert!(attr.skip);
        assert_eq!(attr.kind, None);
    }

    #[test]
    fn test_record_rename() {
        let attr = parse_record(r#"number, rename = "likeCount""#).unwrap();
        assert_eq!(attr.kind, Some(FieldKind::Number));
        assert_eq!(attr.rename, Some("likeCount".to_string()));
    }

    #[test]
    fn test_record_kind_literal() {
        let attr = parse_record(r#"kind = "timestamp""#).unwrap();
        assert_eq!(attr.kind, Some(FieldKind::Date));
    }

    #[test]
    fn test_record_invalid_kind() {
        let result = parse_record("fuzzy");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unknown record field kind"));
    }

    #[test]
    fn test_record_conflicts() {
        assert!(parse_record("text, number").is_err());
        assert!(parse_record("skip, text").is_err());
    }
}
