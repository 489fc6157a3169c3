//! End-to-end query behaviour over realistic screen catalogs.

use pulse_finder::{
    query, Criteria, FieldSpec, FilterKind, Finder, FinderError, ItemId, Merged, Overlay,
    Record, Session, SortType, ToggleRule,
};
use serde_json::{json, Value as Json};

fn ids<T: Record>(rows: &[Merged<'_, T>]) -> Vec<ItemId> {
    rows.iter().map(Merged::id).collect()
}

fn int_ids(ids: &[i64]) -> Vec<ItemId> {
    ids.iter().copied().map(ItemId::Int).collect()
}

// ============================================================================
// Catalogs
// ============================================================================

fn question_spec() -> FieldSpec {
    FieldSpec::new()
        .search("title")
        .search("body")
        .search("tags")
        .filter("category", FilterKind::Exact)
        .filter("tags", FilterKind::SetMembership)
        .filter("answers", FilterKind::NumericRange)
        .sort("answers", SortType::Number)
        .sort("postedAt", SortType::Date)
}

fn questions() -> Vec<Json> {
    vec![
        json!({"id": 1, "title": "Pre-race breakfast?", "category": "nutrition", "tags": ["race-day"], "answers": 4, "postedAt": "2024-05-01"}),
        json!({"id": 2, "title": "Tapering for a marathon", "category": "training", "tags": ["marathon"], "answers": 11, "postedAt": "2024-05-03"}),
        json!({"id": 3, "title": "Dealing with pre-race anxiety", "category": "psychology", "tags": ["race-day", "mindset"], "answers": 7, "postedAt": "2024-04-28"}),
        json!({"id": 4, "title": "Ice bath or sauna?", "category": "recovery", "tags": ["recovery"], "postedAt": "2024-05-02"}),
        json!({"id": 5, "title": "Interval session ideas", "category": "training", "tags": ["speed"], "answers": 2, "postedAt": "2024-05-04"}),
    ]
}

fn recipe_spec() -> FieldSpec {
    FieldSpec::new()
        .search("title")
        .search("tags")
        .filter("category", FilterKind::Exact)
        .filter("dietary", FilterKind::SetMembership)
        .filter("calories", FilterKind::NumericRange)
        .sort("reviews", SortType::Number)
        .sort("featured", SortType::Number)
        .pair("liked", "likes")
}

fn recipes() -> Vec<Json> {
    vec![
        json!({"id": 1, "title": "Green smoothie", "reviews": 234, "featured": true, "likes": 5}),
        json!({"id": 2, "title": "Chickpea salad", "reviews": 189, "featured": false, "likes": 12}),
        json!({"id": 3, "title": "Salmon bowl", "reviews": 456, "featured": false, "likes": 30}),
        json!({"id": 4, "title": "Oat pancakes", "reviews": 312, "featured": true, "likes": 8}),
        json!({"id": 5, "title": "Tofu stir fry", "reviews": 189, "featured": true, "likes": 3}),
        json!({"id": 6, "title": "Berry parfait", "reviews": 267, "featured": false, "likes": 9}),
    ]
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_category_filter_keeps_relative_order() {
    let items = questions();
    let rows = query(
        &items,
        &Criteria::new().filter_eq("category", "training"),
        &question_spec(),
        &Overlay::new(),
    )
    .unwrap();
    assert_eq!(ids(&rows), int_ids(&[2, 5]));
}

#[test]
fn scenario_reviews_descending_is_stable() {
    let items = recipes();
    let rows = query(
        &items,
        &Criteria::new().order_desc("reviews"),
        &recipe_spec(),
        &Overlay::new(),
    )
    .unwrap();
    // 456, 312, 267, 234, 189 (id 2), 189 (id 5)
    assert_eq!(ids(&rows), int_ids(&[3, 4, 6, 1, 2, 5]));
}

#[test]
fn scenario_tag_search_is_case_insensitive() {
    let lessons = vec![
        json!({"id": "l-1", "title": "Morning mobility", "tags": ["Yoga", "Stretching"]}),
        json!({"id": "l-2", "title": "Tempo run drills", "tags": ["Running"]}),
        json!({"id": "l-3", "title": "Core stability", "tags": ["Strength"]}),
    ];
    let spec = FieldSpec::new().search("title").search("tags");

    let rows = query(&lessons, &Criteria::new().text("yoga"), &spec, &Overlay::new()).unwrap();
    assert_eq!(ids(&rows), vec![ItemId::from("l-1")]);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn empty_criteria_is_identity() {
    let items = questions();
    let rows = query(&items, &Criteria::new(), &question_spec(), &Overlay::new()).unwrap();
    assert_eq!(ids(&rows), int_ids(&[1, 2, 3, 4, 5]));

    let all = Criteria::new()
        .text("   ")
        .filter_eq("category", "All")
        .filter_any("tags", Vec::<String>::new());
    let rows = query(&items, &all, &question_spec(), &Overlay::new()).unwrap();
    assert_eq!(rows.len(), items.len());
}

#[test]
fn filters_are_and_composed() {
    // "race-day" matches 1 and 3; at least 5 answers matches 2 and 3.
    let criteria = Criteria::new()
        .filter_any("tags", ["race-day"])
        .filter_min("answers", 5);
    let items = questions();
    let rows = query(&items, &criteria, &question_spec(), &Overlay::new()).unwrap();
    assert_eq!(ids(&rows), int_ids(&[3]));
}

#[test]
fn queries_are_deterministic() {
    let items = recipes();
    let finder = Finder::new(recipe_spec());
    let criteria = Criteria::new().order_desc("featured").order_desc("reviews");
    let mut overlay = Overlay::new();
    overlay.toggle(&items[2], "liked", &finder.spec().toggle_rule("liked"));

    let first = finder.query(&items, &criteria, &overlay).unwrap();
    let second = finder.query(&items, &criteria, &overlay).unwrap();
    assert_eq!(first, second);
}

#[test]
fn featured_first_then_reviews() {
    let rows = Finder::new(recipe_spec())
        .query(
            &recipes(),
            &Criteria::new().order_desc("featured").order_desc("reviews"),
            &Overlay::new(),
        )
        .map(|rows| ids(&rows));
    assert_eq!(rows.unwrap(), int_ids(&[4, 1, 5, 3, 6, 2]));
}

#[test]
fn ties_keep_pre_sort_order() {
    let items = vec![
        json!({"id": 1, "answers": 3}),
        json!({"id": 2, "answers": 9}),
        json!({"id": 3, "answers": 3}),
        json!({"id": 4, "answers": 3}),
    ];
    for dir in ["asc", "desc"] {
        let rows = query(
            &items,
            &Criteria::new().order_by("answers", dir),
            &question_spec(),
            &Overlay::new(),
        )
        .unwrap();
        let tied: Vec<ItemId> = ids(&rows)
            .into_iter()
            .filter(|id| *id != ItemId::Int(2))
            .collect();
        assert_eq!(tied, int_ids(&[1, 3, 4]), "direction {dir}");
    }
}

#[test]
fn nulls_sort_last_both_ways() {
    let items = questions();
    for (dir, expected) in [("asc", [5i64, 1, 3, 2, 4]), ("desc", [2, 3, 1, 5, 4])] {
        let rows = query(
            &items,
            &Criteria::new().order_by("answers", dir),
            &question_spec(),
            &Overlay::new(),
        )
        .unwrap();
        assert_eq!(ids(&rows), int_ids(&expected), "direction {dir}");
    }
}

#[test]
fn toggle_clamp_from_baseline_five() {
    let items = recipes();
    let rule = ToggleRule::paired("likes");
    let mut overlay = Overlay::new();
    for _ in 0..3 {
        overlay.toggle(&items[0], "liked", &rule);
    }

    let rows = query(&items, &Criteria::new(), &recipe_spec(), &overlay).unwrap();
    assert_eq!(rows[0].counter("likes"), Some(6));
    assert!(rows[0].flag("liked"));
    assert_eq!(items[0]["likes"], 5);
}

#[test]
fn toggle_clamp_when_already_liked() {
    let items = vec![json!({"id": 1, "title": "Green smoothie", "liked": true, "likes": 5})];
    let rule = ToggleRule::paired("likes");
    let mut overlay = Overlay::new();

    overlay.toggle(&items[0], "liked", &rule);
    let rows = query(&items, &Criteria::new(), &recipe_spec(), &overlay).unwrap();
    assert!(!rows[0].flag("liked"));
    assert!(rows[0].counter("likes").is_some_and(|likes| likes >= 5));

    overlay.toggle(&items[0], "liked", &rule);
    overlay.toggle(&items[0], "liked", &rule);
    let rows = query(&items, &Criteria::new(), &recipe_spec(), &overlay).unwrap();
    assert_eq!(rows[0].counter("likes"), Some(5));
}

#[test]
fn date_range_filters_and_sorts() {
    let spec = question_spec().filter("postedAt", FilterKind::DateRange);
    let criteria = Criteria::new()
        .filter_range("postedAt", "2024-05-01", "2024-05-03")
        .order_desc("postedAt");
    let items = questions();
    let rows = query(&items, &criteria, &spec, &Overlay::new()).unwrap();
    assert_eq!(ids(&rows), int_ids(&[2, 4, 1]));
}

#[test]
fn criteria_from_screen_json() {
    let criteria = Criteria::from_json(
        r#"{
            "text": "pancakes",
            "filters": {"category": "all", "calories": {"max": 600}},
            "sort": [{"field": "reviews", "direction": "DESC"}]
        }"#,
    )
    .unwrap();

    let items = vec![
        json!({"id": 1, "title": "Oat pancakes", "calories": 420, "reviews": 10}),
        json!({"id": 2, "title": "Banana pancakes", "calories": 380, "reviews": 50}),
        json!({"id": 3, "title": "Stack of pancakes", "calories": 900, "reviews": 99}),
    ];
    let rows = query(&items, &criteria, &recipe_spec(), &Overlay::new()).unwrap();
    assert_eq!(ids(&rows), int_ids(&[2, 1]));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn errors_surface_before_results() {
    let items = questions();
    let spec = question_spec();
    let overlay = Overlay::new();

    let err = query(&items, &Criteria::new().order_asc("votes"), &spec, &overlay).unwrap_err();
    assert!(matches!(err, FinderError::UnknownField { ref field } if field == "votes"));

    let err = query(
        &items,
        &Criteria::new().filter_range("answers", 9, 1),
        &spec,
        &overlay,
    )
    .unwrap_err();
    assert!(matches!(err, FinderError::InvalidRange { .. }));

    let err = query(&items, &Criteria::new().order_by("answers", "up"), &spec, &overlay)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid sort direction 'up' for 'answers', expected 'asc' or 'desc'"
    );
}

// ============================================================================
// Session
// ============================================================================

#[test]
fn favorites_tab_from_overlay() {
    let items = recipes();
    let spec = recipe_spec().filter("liked", FilterKind::Exact);
    let mut session = Session::new(Finder::new(spec));

    session.toggle(&items[3], "liked");
    session.toggle(&items[5], "liked");
    session.set_filter("liked", pulse_finder::FilterValue::Exact(true.into()));

    let rows = session.refresh(&items).unwrap();
    assert_eq!(ids(&rows), int_ids(&[4, 6]));
    assert_eq!(rows[0].to_json().unwrap()["likes"], 9);

    let liked: Vec<&ItemId> = session.overlay().ids_with("liked");
    assert_eq!(liked, vec![&ItemId::Int(4), &ItemId::Int(6)]);
}
