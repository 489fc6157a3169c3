//! Implementation of the `#[derive(Record)]` macro.
//!
//! Generates an implementation of `pulse_finder::Record` plus a field name
//! constant per exposed field, so field specs and criteria can be written
//! without string typos.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Result};

use super::attrs::{parse_record_attrs, FieldKind};

/// Main implementation of the Record derive macro.
pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Ensure we have a struct with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Record can only be derived for structs",
            ))
        }
    };

    let mut id_expr: Option<TokenStream> = None;
    let mut field_matches: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut field_names: Vec<String> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let attrs = parse_record_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        if attrs.id {
            if id_expr.is_some() {
                return Err(Error::new(attrs.span, "only one field can be #[record(id)]"));
            }
            id_expr = Some(quote! {
                ::pulse_finder::ItemId::from(::core::clone::Clone::clone(&self.#field_name))
            });
        }

        // Fields without a kind are not queryable
        let kind = match attrs.kind {
            Some(kind) => kind,
            None => continue,
        };

        let query_name = attrs.rename.unwrap_or_else(|| field_name.to_string());
        let const_name = format_ident!("{}", to_screaming_snake_case(&query_name));

        field_constants.push(quote! {
            /// Field name constant for field specs and criteria.
            pub const #const_name: &'static str = #query_name;
        });

        let value_expr = match kind {
            FieldKind::Text => quote! {
                match ::pulse_finder::AsText::as_text(&self.#field_name) {
                    ::core::option::Option::Some(text) => ::pulse_finder::Value::String(text),
                    ::core::option::Option::None => ::pulse_finder::Value::None,
                }
            },
            FieldKind::List => quote! {
                ::pulse_finder::Value::List(::pulse_finder::AsList::as_list(&self.#field_name))
            },
            FieldKind::Number => quote! {
                match ::pulse_finder::AsNumber::to_number(&self.#field_name) {
                    ::core::option::Option::Some(n) => ::pulse_finder::Value::Number(n),
                    ::core::option::Option::None => ::pulse_finder::Value::None,
                }
            },
            FieldKind::Date => quote! {
                match ::pulse_finder::AsTimestamp::to_timestamp(&self.#field_name) {
                    ::core::option::Option::Some(ts) => ::pulse_finder::Value::Timestamp(ts),
                    ::core::option::Option::None => ::pulse_finder::Value::None,
                }
            },
            FieldKind::Flag => quote! {
                ::pulse_finder::Value::Bool(self.#field_name)
            },
        };

        field_matches.push(quote! {
            #query_name => #value_expr,
        });
        field_names.push(query_name);
    }

    let id_expr = id_expr.ok_or_else(|| {
        Error::new(
            input.span(),
            "Record requires one field marked #[record(id)]",
        )
    })?;

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*

            /// Names of all queryable fields, in declaration order.
            pub const FIELDS: &'static [&'static str] = &[#(#field_names),*];
        }

        impl #impl_generics ::pulse_finder::Record for #struct_name #ty_generics #where_clause {
            fn record_id(&self) -> ::pulse_finder::ItemId {
                #id_expr
            }

            fn field_value(&self, field: &str) -> ::pulse_finder::Value<'_> {
                match field {
                    #(#field_matches)*
                    _ => ::pulse_finder::Value::None,
                }
            }
        }
    };

    Ok(expanded)
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' || c == '.' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = true;
        }
    }

    result
}
