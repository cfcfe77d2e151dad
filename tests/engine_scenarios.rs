use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use tabview::{Action, Column, FilterKind, Row, Value, ViewConfig, ViewEngine, ViewError};

fn person(id: i64, age: i64) -> Row {
    Row::new().with("id", id).with("age", age)
}

fn ids(engine: &ViewEngine) -> Vec<Value> {
    engine
        .visible_page()
        .rows
        .iter()
        .map(|row| row.get("id").clone())
        .collect()
}

#[fixture]
fn people() -> ViewEngine {
    let config = ViewConfig {
        default_page_size: 2,
        ..ViewConfig::default()
    };
    ViewEngine::with_data(
        config,
        vec![person(1, 30), person(2, 20), person(3, 25)],
        vec![
            Column::new("id").filter(FilterKind::AtLeast),
            Column::new("age").filter(FilterKind::AtLeast),
        ],
    )
}

#[rstest]
fn sorted_by_age_then_next_page(mut people: ViewEngine) {
    people.update(Action::ToggleSort("age".into())).unwrap();
    assert_eq!(ids(&people), vec![Value::from(2), Value::from(3)]);
    assert!(people.can_go_next());

    people.update(Action::NextPage).unwrap();
    assert_eq!(ids(&people), vec![Value::from(1)]);
    assert!(!people.can_go_next());
    assert!(people.can_go_previous());
}

#[rstest]
fn age_threshold_keeps_older_rows_in_data_order(mut people: ViewEngine) {
    people
        .update(Action::SetColumnFilter {
            column: "age".into(),
            value: Value::from(24),
        })
        .unwrap();
    let view = people.visible_page();
    assert_eq!(ids(&people), vec![Value::from(1), Value::from(3)]);
    assert_eq!(view.page_count, 1);
    assert_eq!(view.visible_row_count, 2);
    assert_eq!(view.total_row_count, 3);
}

#[test]
fn page_index_clamps_when_a_filter_shrinks_the_data() {
    let rows = (0..10).map(|i| person(i, 20 + i)).collect();
    let mut engine = ViewEngine::with_data(
        ViewConfig {
            default_page_size: 2,
            ..ViewConfig::default()
        },
        rows,
        vec![Column::new("id"), Column::new("age").filter(FilterKind::AtLeast)],
    );
    engine.update(Action::GoToPage(3)).unwrap();
    assert_eq!(engine.page_index(), 3);

    engine.set_column_filter("age", 28);
    let view = engine.visible_page();
    assert_eq!(view.page_count, 1);
    assert_eq!(view.page_index, 0);
    assert_eq!(view.rows.len(), 2);
}

#[rstest]
fn zero_page_size_is_rejected(mut people: ViewEngine) {
    people.next_page();
    let before = people.visible_page();

    let result = people.update(Action::SetPageSize(0));
    assert!(matches!(result, Err(ViewError::InvalidPageSize(0))));
    assert_eq!(people.visible_page(), before);
}

#[rstest]
fn sort_cycles_back_to_data_order(mut people: ViewEngine) {
    people.set_page_size(3).unwrap();
    let original = ids(&people);

    people.toggle_sort("age");
    assert_eq!(ids(&people), vec![Value::from(2), Value::from(3), Value::from(1)]);
    people.toggle_sort("age");
    assert_eq!(ids(&people), vec![Value::from(1), Value::from(3), Value::from(2)]);
    people.toggle_sort("age");
    assert_eq!(ids(&people), original);
}

#[rstest]
fn reading_the_page_does_not_change_it(mut people: ViewEngine) {
    people.toggle_sort("id");
    assert_eq!(people.visible_page(), people.visible_page());
}

#[rstest]
fn same_filter_twice_is_a_no_op(mut people: ViewEngine) {
    people.set_column_filter("age", 21);
    let once = people.visible_page();
    people.set_column_filter("age", 21);
    assert_eq!(people.visible_page(), once);
}

#[test]
fn page_stays_in_bounds_through_mutations() {
    let rows = (0..23).map(|i| person(i, i % 7)).collect();
    let mut engine = ViewEngine::with_data(
        ViewConfig::default(),
        rows,
        vec![Column::new("id"), Column::new("age").filter(FilterKind::AtLeast)],
    );
    let actions = [
        Action::GoToPage(usize::MAX),
        Action::SetPageSize(5),
        Action::NextPage,
        Action::SetColumnFilter {
            column: "age".into(),
            value: Value::from(5),
        },
        Action::GoToPage(2),
        Action::ToggleSort("age".into()),
        Action::SetPageSize(1),
        Action::GoToPage(40),
        Action::SetColumnFilter {
            column: "age".into(),
            value: Value::from(100),
        },
        Action::PreviousPage,
        Action::SetColumnFilter {
            column: "age".into(),
            value: Value::Undefined,
        },
        Action::SetPageSize(100),
    ];
    for action in actions {
        engine.update(action).unwrap();
        let view = engine.visible_page();
        assert!(view.page_count >= 1);
        assert!(view.page_index < view.page_count);
        assert!(view.rows.len() <= view.page_size);
        assert_eq!(view.can_go_previous, view.page_index > 0);
        assert_eq!(view.can_go_next, view.page_index + 1 < view.page_count);
    }
    assert_eq!(engine.visible_row_count(), 23);
}

#[test]
fn reload_keeps_compatible_state() {
    let mut engine = ViewEngine::with_data(
        ViewConfig::default(),
        vec![person(1, 30), person(2, 20)],
        vec![Column::new("id"), Column::new("age").filter(FilterKind::AtLeast)],
    );
    engine.set_column_filter("age", 25);
    engine.toggle_sort("id");

    engine.update(Action::Reload {
        rows: vec![person(3, 40), person(4, 10), person(5, 50)],
        columns: vec![Column::new("age").filter(FilterKind::AtLeast)],
    })
    .unwrap();
    assert_eq!(engine.filter_value("age"), Some(&Value::from(25)));
    assert_eq!(engine.sort_direction_of("id"), None);
    assert_eq!(ids(&engine), vec![Value::from(3), Value::from(5)]);
}
