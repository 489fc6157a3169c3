//! Bundled sample data.
//!
//! Questions and recipes are typed structs with a derived `Record`; the
//! other screens query raw JSON objects.

use anyhow::{Context, Result};
use pulse_macros::Record;
use serde::{Deserialize, Serialize};

pub const CATALOG: &str = include_str!("../data/catalog.yaml");

pub const QUESTIONS: &str = include_str!("../data/questions.json");
pub const RECIPES: &str = include_str!("../data/recipes.json");
pub const LESSONS: &str = include_str!("../data/lessons.json");
pub const SESSIONS: &str = include_str!("../data/sessions.json");
pub const LISTINGS: &str = include_str!("../data/listings.json");
pub const COMPETITIONS: &str = include_str!("../data/competitions.json");

#[derive(Debug, Clone, Serialize, Deserialize, Record)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[record(id)]
    pub id: u32,

    #[record(text)]
    pub title: String,

    #[record(text)]
    pub body: String,

    #[record(text)]
    pub author: String,

    #[record(text)]
    pub category: String,

    #[record(list)]
    pub tags: Vec<String>,

    #[record(number)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<u32>,

    #[record(number)]
    pub likes: u32,

    #[record(date, rename = "postedAt")]
    pub posted_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Record)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[record(id)]
    pub id: u32,

    #[record(text)]
    pub title: String,

    #[record(text)]
    pub description: String,

    #[record(text)]
    pub category: String,

    #[record(list)]
    pub dietary: Vec<String>,

    #[record(list)]
    pub tags: Vec<String>,

    #[record(number)]
    pub calories: u32,

    #[record(number, rename = "prepMinutes")]
    pub prep_minutes: u32,

    #[record(number)]
    pub reviews: u32,

    #[record(number)]
    pub rating: f64,

    #[record(flag)]
    pub featured: bool,

    #[record(number)]
    pub likes: u32,
}

/// Parses one bundled data file.
pub fn load<T: for<'de> Deserialize<'de>>(name: &str, json: &str) -> Result<Vec<T>> {
    serde_json::from_str(json).with_context(|| format!("bundled {name} data is malformed"))
}
