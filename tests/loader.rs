use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tabview::loader::{self, FileType, LoadOptions};
use tabview::{FilterKind, Value, ViewConfig, ViewEngine};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn loads_csv_into_rows_and_columns() {
    let table = loader::load(fixture("people.csv"), &LoadOptions::default()).unwrap();
    assert_eq!(table.name, "people.csv");
    assert_eq!(table.file_info.file_type, FileType::Csv);
    assert!(table.file_info.file_size > 0);
    assert_eq!(table.rows.len(), 5);

    let keys: Vec<&str> = table.columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["id", "name", "city", "age", "active"]);
    assert_eq!(table.columns[3].filter, Some(FilterKind::AtLeast));
    assert_eq!(table.columns[1].filter, Some(FilterKind::StartsWith));

    assert_eq!(table.rows[0].get("city"), &Value::from("Zürich"));
    assert_eq!(table.rows[2].get("age"), &Value::Number(25.0));
    assert_eq!(table.rows[3].get("age"), &Value::Undefined);
    assert_eq!(table.rows[1].get("active"), &Value::Bool(false));
}

#[test]
fn options_select_fuzzy_filters_and_hidden_columns() {
    let options = LoadOptions {
        fuzzy_text: true,
        hidden: vec!["active".to_string()],
    };
    let table = loader::load(fixture("people.csv"), &options).unwrap();
    let city = table.columns.iter().find(|c| c.key == "city").unwrap();
    assert_eq!(city.filter, Some(FilterKind::Fuzzy));
    assert!(table.columns.iter().find(|c| c.key == "active").unwrap().hidden);
}

#[test]
fn loaded_table_feeds_the_engine() {
    let table = loader::load(fixture("people.csv"), &LoadOptions::default()).unwrap();
    let mut engine = ViewEngine::with_data(ViewConfig::default(), table.rows, table.columns);

    engine.set_column_filter("city", "be");
    assert_eq!(engine.visible_row_count(), 2);

    engine.set_column_filter("city", Value::Undefined);
    engine.set_column_filter("age", 25);
    // Rows without an age are not excluded by a threshold.
    assert_eq!(engine.visible_row_count(), 4);

    engine.toggle_sort("age");
    let ages: Vec<Value> = engine
        .visible_page()
        .rows
        .iter()
        .map(|r| r.get("age").clone())
        .collect();
    assert_eq!(
        ages,
        vec![Value::from(25), Value::from(30), Value::from(41), Value::Undefined]
    );
}
