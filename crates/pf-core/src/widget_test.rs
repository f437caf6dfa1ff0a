use super::*;
use crate::bounds::{DateLimits, NumericRange};
use crate::option::OptionScope;

fn raw(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn colors() -> Vec<ParameterOption> {
    vec![
        ParameterOption::new("r", "Red"),
        ParameterOption::new("g", "Green").with_default(true),
        ParameterOption::new("b", "Blue").with_default(true),
    ]
}

#[test]
fn test_single_select_defaults_to_flagged_then_first() {
    let flagged = SingleSelect::new(colors()).unwrap();
    assert_eq!(flagged.selected_id(), Some("g"));

    let plain = SingleSelect::new(vec![
        ParameterOption::new("x", "X"),
        ParameterOption::new("y", "Y"),
    ])
    .unwrap();
    assert_eq!(plain.selected_id(), Some("x"));
}

#[test]
fn test_single_select_rejects_duplicate_ids() {
    let err = SingleSelect::new(vec![
        ParameterOption::new("x", "X"),
        ParameterOption::new("x", "Other X"),
    ])
    .unwrap_err();
    assert!(err.contains("\"x\""));
}

#[test]
fn test_single_select_with_selection_is_pure() {
    let base = SingleSelect::new(colors()).unwrap();
    let picked = base.with_selection(&raw(&["b"])).unwrap();

    assert_eq!(picked.selected_id(), Some("b"));
    assert_eq!(picked.selected_label(), Some("Blue"));
    assert_eq!(base.selected_id(), Some("g"));
}

#[test]
fn test_single_select_rejects_unknown_and_multiple() {
    let base = SingleSelect::new(colors()).unwrap();
    assert!(base.with_selection(&raw(&["purple"])).is_err());
    assert!(base.with_selection(&raw(&["r", "g"])).is_err());
}

#[test]
fn test_single_select_selected_field() {
    let base = SingleSelect::new(vec![
        ParameterOption::new("m", "Month").with_custom_field("trunc", "month"),
    ])
    .unwrap();
    assert_eq!(base.selected_field("trunc"), Some(Value::from("month")));
    assert_eq!(base.selected_field("label"), Some(Value::from("Month")));
    assert_eq!(base.selected_field("missing"), None);
}

#[test]
fn test_multi_select_default_and_canonical_order() {
    let base = MultiSelect::new(colors(), true, false).unwrap();
    assert_eq!(base.selected_ids(), ["g", "b"]);

    let picked = base.with_selection(&raw(&["b,r,b"])).unwrap();
    assert_eq!(picked.selected_ids(), ["r", "b"]);
}

#[test]
fn test_multi_select_order_matters_keeps_request_order() {
    let base = MultiSelect::new(colors(), true, true).unwrap();
    let picked = base.with_selection(&raw(&[r#"["b","r","b"]"#])).unwrap();
    assert_eq!(picked.selected_ids(), ["b", "r"]);
}

#[test]
fn test_multi_select_empty_list_clears() {
    let base = MultiSelect::new(colors(), false, false).unwrap();
    let cleared = base.with_selection(&raw(&["[]"])).unwrap();
    assert!(cleared.selected_ids().is_empty());
    assert!(cleared.selected_options().is_empty());

    let all = MultiSelect::new(colors(), true, false)
        .unwrap()
        .with_selection(&raw(&["[]"]))
        .unwrap();
    assert_eq!(all.effective_ids(), vec!["r", "g", "b"]);
}

#[test]
fn test_multi_select_corrected_keeps_known_ids() {
    let base = MultiSelect::new(colors(), true, false).unwrap();
    let corrected = base.corrected_from(&raw(&["r", "purple"]));
    assert_eq!(corrected.selected_ids(), ["r"]);

    let fallback = base.corrected_from(&raw(&["purple"]));
    assert_eq!(fallback.selected_ids(), ["g", "b"]);
}

#[test]
fn test_narrowed_by_parent_resets_selection() {
    let options = vec![
        ParameterOption::new("x", "X").with_parent_option_ids(["a"]),
        ParameterOption::new("y", "Y").with_parent_option_ids(["a"]),
        ParameterOption::new("z", "Z").with_parent_option_ids(["b"]),
    ];
    let base = SingleSelect::new(options).unwrap();
    let parent = BTreeSet::from(["b".to_string()]);
    let filter = OptionFilter {
        user_groups: None,
        parent_option_ids: Some(&parent),
    };

    let narrowed = base.narrowed(&filter).unwrap();
    assert_eq!(narrowed.options().len(), 1);
    assert_eq!(narrowed.selected_id(), Some("z"));

    let nothing = BTreeSet::from(["c".to_string()]);
    let filter = OptionFilter {
        user_groups: None,
        parent_option_ids: Some(&nothing),
    };
    assert!(base.narrowed(&filter).is_none());
}

#[test]
fn test_validate_detects_stale_selection() {
    let base = SingleSelect::new(colors()).unwrap();
    assert_eq!(base.validate(), Validation::Valid);

    let stale = SingleSelect {
        options: colors(),
        selected_id: Some("purple".into()),
    };
    assert!(matches!(
        stale.validate(),
        Validation::CorrectedToDefault { .. }
    ));
    assert_eq!(stale.with_default_selection().validate(), Validation::Valid);
}

#[test]
fn test_scalar_first_surviving_record_wins() {
    let small = NumberBounds::new(NumericRange::new(0.0, 10.0, 1.0).unwrap(), None).unwrap();
    let large = NumberBounds::new(NumericRange::new(0.0, 1000.0, 10.0).unwrap(), None).unwrap();
    let widget = NumberWidget::new(vec![
        ScopedBounds::new(
            OptionScope {
                parent_option_ids: BTreeSet::from(["small".to_string()]),
                ..Default::default()
            },
            small,
        ),
        ScopedBounds::unrestricted(large),
    ]);

    assert_eq!(widget.selected_value(), Some(5.0));
    assert!(widget.recognizes(&raw(&["500"])));
    assert!(widget.with_selection(&raw(&["500"])).is_err());

    let parent = BTreeSet::from(["large".to_string()]);
    let filter = OptionFilter {
        user_groups: None,
        parent_option_ids: Some(&parent),
    };
    let narrowed = widget.narrowed(&filter).unwrap();
    assert_eq!(narrowed.selected_value(), Some(500.0));
    let picked = narrowed.with_selection(&raw(&["750"])).unwrap();
    assert_eq!(picked.selected_value(), Some(750.0));
}

#[test]
fn test_date_range_accessors() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    let widget = DateRangeWidget::new(vec![ScopedBounds::unrestricted(
        DateRangeBounds::new(start, end, DateLimits::default()).unwrap(),
    )]);

    let picked = widget
        .with_selection(&raw(&["2024-02-01", "2024-02-29"]))
        .unwrap();
    assert_eq!(
        picked.selected_start_date(),
        NaiveDate::from_ymd_opt(2024, 2, 1)
    );
    assert_eq!(
        picked.selected_end_date(),
        NaiveDate::from_ymd_opt(2024, 2, 29)
    );
}

#[test]
fn test_empty_scalar_is_invalid() {
    let widget = TextWidget::new(Vec::new());
    assert!(matches!(widget.validate(), Validation::Invalid { .. }));
    assert!(widget.with_selection(&raw(&["hello"])).is_err());
}
