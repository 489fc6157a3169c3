//! `pulse` - query the bundled screen catalogs from the command line.
//!
//! ```text
//! pulse entities
//! pulse fields recipes
//! pulse query recipes --filter dietary=vegan --sort featured:desc --sort reviews:desc
//! pulse query recipes --toggle 4:liked --filter liked=true
//! pulse -v query questions --text race --range postedAt=2024-05-01..
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pulse_finder::{Criteria, FieldSpec, Finder, Record, Session, SpecRegistry};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod args;
mod records;

use records::{Question, Recipe};

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Search, filter and sort the bundled screen catalogs")]
struct Cli {
    /// Log query planning to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Field spec catalog (YAML, or JSON by extension) to use instead of the bundled one
    #[arg(long, global = true, value_name = "PATH")]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entity types in the catalog
    Entities,
    /// Print the field spec of an entity type
    Fields {
        /// Entity type, e.g. recipes
        entity: String,
    },
    /// Run a query and print the matching items as JSON
    Query(QueryArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// Entity type, e.g. recipes
    entity: String,

    /// Full criteria as JSON; the other flags are applied on top
    #[arg(long, value_name = "JSON")]
    criteria: Option<String>,

    /// Free-text search
    #[arg(short, long)]
    text: Option<String>,

    /// Filter as field=value; set fields take comma-separated values
    #[arg(short, long = "filter", value_name = "FIELD=VALUE")]
    filters: Vec<String>,

    /// Range filter as field=min..max; either bound may be omitted
    #[arg(short, long = "range", value_name = "FIELD=MIN..MAX")]
    ranges: Vec<String>,

    /// Sort key as field[:asc|desc]; repeat for tie-breakers
    #[arg(short, long = "sort", value_name = "FIELD[:DIR]")]
    sorts: Vec<String>,

    /// Toggle a flag before querying, as id:flag
    #[arg(long = "toggle", value_name = "ID:FLAG")]
    toggles: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = match &cli.catalog {
        Some(path) => SpecRegistry::from_path(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => SpecRegistry::from_yaml(records::CATALOG).context("bundled catalog is malformed")?,
    };
    debug!(entities = registry.len(), "catalog loaded");

    match cli.command {
        Commands::Entities => {
            for entity in registry.entities() {
                println!("{entity}");
            }
        }
        Commands::Fields { entity } => {
            let spec = registry.get(&entity)?;
            println!("{}", serde_json::to_string_pretty(spec)?);
        }
        Commands::Query(query) => {
            let finder = registry.finder(&query.entity)?;
            let rows = run_entity(finder, &query)?;
            info!(entity = %query.entity, rows = rows.len(), "query finished");
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug and the default is warn.
fn init_tracing(verbose: bool) {
    let filter = std::env::var("RUST_LOG").map_or_else(
        |_| EnvFilter::new(if verbose { "debug" } else { "warn" }),
        EnvFilter::new,
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_entity(finder: Finder, query: &QueryArgs) -> Result<Vec<serde_json::Value>> {
    match query.entity.as_str() {
        "questions" => run(finder, &records::load::<Question>("questions", records::QUESTIONS)?, query),
        "recipes" => run(finder, &records::load::<Recipe>("recipes", records::RECIPES)?, query),
        "lessons" => run(finder, &raw("lessons", records::LESSONS)?, query),
        "sessions" => run(finder, &raw("sessions", records::SESSIONS)?, query),
        "listings" => run(finder, &raw("listings", records::LISTINGS)?, query),
        "competitions" => run(finder, &raw("competitions", records::COMPETITIONS)?, query),
        other => bail!("no bundled data for '{other}'"),
    }
}

fn raw(name: &str, json: &str) -> Result<Vec<serde_json::Value>> {
    records::load(name, json)
}

fn run<T: Record + Serialize>(
    finder: Finder,
    items: &[T],
    query: &QueryArgs,
) -> Result<Vec<serde_json::Value>> {
    let criteria = build_criteria(finder.spec(), query)?;
    let mut session = Session::new(finder).with_criteria(criteria);

    for raw in &query.toggles {
        let (id, flag) = args::parse_toggle(raw)?;
        let item = items
            .iter()
            .find(|item| item.record_id().to_string() == id)
            .with_context(|| format!("no item with id '{id}'"))?;
        let on = session.toggle(item, &flag);
        debug!(%id, %flag, on, "toggled");
    }

    let rows = session.refresh(items)?;
    rows.iter()
        .map(|row| row.to_json().map_err(Into::into))
        .collect()
}

fn build_criteria(spec: &FieldSpec, query: &QueryArgs) -> Result<Criteria> {
    let mut criteria = match &query.criteria {
        Some(json) => Criteria::from_json(json).context("invalid --criteria")?,
        None => Criteria::new(),
    };

    if let Some(text) = &query.text {
        criteria = criteria.text(text.as_str());
    }
    for raw in &query.filters {
        let (field, value) = args::parse_filter(spec, raw)?;
        criteria = criteria.filter(&field, value);
    }
    for raw in &query.ranges {
        let (field, value) = args::parse_range(raw)?;
        criteria = criteria.filter(&field, value);
    }
    for raw in &query.sorts {
        criteria.sort.push(args::parse_sort(raw)?);
    }

    Ok(criteria)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_args(line: &[&str]) -> QueryArgs {
        let cli = Cli::try_parse_from(line).unwrap();
        match cli.command {
            Commands::Query(query) => query,
            _ => panic!("expected a query command"),
        }
    }

    fn recipes_finder() -> Finder {
        SpecRegistry::from_yaml(records::CATALOG)
            .unwrap()
            .finder("recipes")
            .unwrap()
    }

    fn ids(rows: &[serde_json::Value]) -> Vec<u64> {
        rows.iter().filter_map(|row| row["id"].as_u64()).collect()
    }

    #[test]
    fn test_flags_build_criteria() {
        let query = query_args(&[
            "pulse",
            "query",
            "recipes",
            "--criteria",
            r#"{"text": "oat"}"#,
            "--filter",
            "dietary=vegan,vegetarian",
            "--range",
            "calories=..500",
            "--sort",
            "reviews:desc",
        ]);
        let finder = recipes_finder();
        let criteria = build_criteria(finder.spec(), &query).unwrap();
        assert_eq!(criteria.text, "oat");
        assert_eq!(criteria.filters.len(), 2);
        assert_eq!(criteria.sort.len(), 1);
    }

    #[test]
    fn test_featured_vegan_recipes() {
        let query = query_args(&[
            "pulse",
            "query",
            "recipes",
            "-f",
            "dietary=vegan",
            "-s",
            "featured:desc",
            "-s",
            "reviews:desc",
        ]);
        let rows = run_entity(recipes_finder(), &query).unwrap();
        assert_eq!(ids(&rows), vec![1, 5]);
    }

    #[test]
    fn test_toggle_then_filter_favorites() {
        let query = query_args(&[
            "pulse", "query", "recipes", "--toggle", "4:liked", "--toggle", "6:liked", "-f",
            "liked=true",
        ]);
        let rows = run_entity(recipes_finder(), &query).unwrap();
        assert_eq!(ids(&rows), vec![4, 6]);
        assert_eq!(rows[0]["likes"], 9);
        assert_eq!(rows[0]["liked"], true);
    }

    #[test]
    fn test_unknown_toggle_id() {
        let query = query_args(&["pulse", "query", "recipes", "--toggle", "99:liked"]);
        let err = run_entity(recipes_finder(), &query).unwrap_err();
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn test_json_screen_with_string_ids() {
        let finder = SpecRegistry::from_yaml(records::CATALOG)
            .unwrap()
            .finder("lessons")
            .unwrap();
        let query = query_args(&["pulse", "query", "lessons", "-t", "TACTICS", "-s", "title"]);
        let rows = run_entity(finder, &query).unwrap();
        let ids: Vec<&str> = rows.iter().filter_map(|row| row["id"].as_str()).collect();
        assert_eq!(ids, vec!["l-2", "l-3"]);
    }
}
