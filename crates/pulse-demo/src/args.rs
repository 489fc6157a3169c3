//! Parsers for the query flags.
//!
//! Flags are compact strings so a whole screen state fits on one command
//! line: `--filter dietary=vegan,gluten-free`, `--range calories=..500`,
//! `--sort reviews:desc`, `--toggle 3:liked`.

use anyhow::{anyhow, bail, Result};
use pulse_finder::{FieldSpec, FilterKind, FilterValue, Number, Range, Scalar, SortKey};

/// Parses `field=value`. Set-membership fields split the value on commas.
pub fn parse_filter(spec: &FieldSpec, raw: &str) -> Result<(String, FilterValue)> {
    let (field, value) = split_pair(raw, '=')?;
    let filter = match spec.filter_kind(field) {
        Some(FilterKind::SetMembership) => FilterValue::AnyOf(
            value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => FilterValue::Exact(parse_scalar(value)),
    };
    Ok((field.to_string(), filter))
}

/// Parses `field=min..max`; either bound may be left out.
pub fn parse_range(raw: &str) -> Result<(String, FilterValue)> {
    let (field, value) = split_pair(raw, '=')?;
    let (min, max) = value
        .split_once("..")
        .ok_or_else(|| anyhow!("range '{raw}' must look like field=min..max"))?;
    let bound = |b: &str| {
        let b = b.trim();
        (!b.is_empty()).then(|| Scalar::Text(b.to_string()))
    };
    Ok((
        field.to_string(),
        FilterValue::Range(Range {
            min: bound(min),
            max: bound(max),
        }),
    ))
}

/// Parses `field` or `field:dir`.
pub fn parse_sort(raw: &str) -> Result<SortKey> {
    match raw.split_once(':') {
        Some((field, dir)) if !field.trim().is_empty() => Ok(SortKey::new(field.trim(), dir.trim())),
        Some(_) => bail!("sort '{raw}' has no field"),
        None if raw.trim().is_empty() => bail!("empty sort key"),
        None => Ok(SortKey::asc(raw.trim())),
    }
}

/// Parses `id:flag`.
pub fn parse_toggle(raw: &str) -> Result<(String, String)> {
    let (id, flag) = split_pair(raw, ':')?;
    Ok((id.to_string(), flag.to_string()))
}

fn parse_scalar(value: &str) -> Scalar {
    match value {
        "true" => Scalar::Bool(true),
        "false" => Scalar::Bool(false),
        _ => Number::parse(value)
            .map(Scalar::Number)
            .unwrap_or_else(|| Scalar::Text(value.to_string())),
    }
}

fn split_pair(raw: &str, sep: char) -> Result<(&str, &str)> {
    let (key, value) = raw
        .split_once(sep)
        .ok_or_else(|| anyhow!("expected '{sep}' in '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("missing name before '{sep}' in '{raw}'");
    }
    Ok((key, value.trim()))
}
