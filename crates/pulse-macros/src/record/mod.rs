//! Implementation of the `#[derive(Record)]` macro.
//!
//! Generates the `pulse_finder::Record` implementation and field name
//! constants from `#[record(...)]` field annotations.

mod attrs;
mod derive;

pub use derive::record_derive_impl;
