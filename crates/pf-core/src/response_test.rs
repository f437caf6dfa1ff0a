use super::*;
use crate::bounds::{DateLimits, DateRangeBounds, NumberBounds, ScopedBounds};
use crate::names::ParameterName;
use crate::parameter::ParameterInfo;
use crate::parameter_set::BaseParameterSet;
use crate::resolver::resolve;
use crate::user::UserAttributes;
use crate::widget::{DateRangeWidget, MultiSelect, NumberWidget, SingleSelect};

fn info(name: &str) -> ParameterInfo {
    ParameterInfo::new(ParameterName::new(name).unwrap(), name)
}

fn base() -> BaseParameterSet {
    let country = Parameter::new(
        info("country"),
        SingleSelect::new(vec![
            ParameterOption::new("ca", "Canada"),
            ParameterOption::new("us", "United States"),
        ])
        .unwrap(),
    );
    let cities = Parameter::new(
        info("cities").with_parent(ParameterName::new("country").unwrap()),
        MultiSelect::new(
            vec![
                ParameterOption::new("tor", "Toronto").with_parent_option_ids(["ca"]),
                ParameterOption::new("van", "Vancouver").with_parent_option_ids(["ca"]),
                ParameterOption::new("nyc", "New York").with_parent_option_ids(["us"]),
            ],
            true,
            true,
        )
        .unwrap(),
    );
    let period = Parameter::new(
        info("period"),
        DateRangeWidget::new(vec![ScopedBounds::unrestricted(
            DateRangeBounds::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
                DateLimits::default(),
            )
            .unwrap(),
        )]),
    );
    let ratio = Parameter::new(
        info("ratio"),
        NumberWidget::new(vec![ScopedBounds::unrestricted(
            NumberBounds::new(NumericRange::new(0.0, 1.0, 0.1).unwrap(), None).unwrap(),
        )]),
    );
    BaseParameterSet::new(vec![country, cities, period, ratio], 1).unwrap()
}

#[test]
fn test_model_tags_widget_type() {
    let base = base();
    let response = ParametersResponse::from_set(base.parameters());
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["parameters"][0]["widget_type"], "single_select");
    assert_eq!(json["parameters"][0]["trigger_refresh"], true);
    assert_eq!(json["parameters"][1]["widget_type"], "multi_select");
    assert_eq!(json["parameters"][2]["selected_start_date"], "2024-01-01");
    assert_eq!(json["parameters"][3]["increment"], 0.1);

    let back: ParametersResponse = serde_json::from_value(json).unwrap();
    assert_eq!(back, response);
}

#[test]
fn test_round_trip_reproduces_resolved_set() {
    let base = base();
    let user = UserAttributes::new();
    let raw = RawSelection::new()
        .with("country", "ca")
        .with("cities", "van,tor")
        .with("period", "2024-02-01,2024-03-15")
        .with("ratio", "0.3");

    let resolved = resolve(&base, &raw, &user).unwrap();
    let shown = ParametersResponse::from_set(&resolved);
    let again = resolve(&base, &shown.to_raw_selection(), &user).unwrap();

    assert_eq!(again, resolved);
    assert_eq!(ParametersResponse::from_set(&again), shown);
}

#[test]
fn test_round_trip_keeps_cleared_multi_select() {
    let base = base();
    let user = UserAttributes::new();
    let resolved = resolve(&base, &RawSelection::new().with("cities", "[]"), &user).unwrap();

    let raw = ParametersResponse::from_set(&resolved).to_raw_selection();
    assert_eq!(raw.get("cities"), Some(&["[]".to_string()][..]));
    assert_eq!(resolve(&base, &raw, &user).unwrap(), resolved);
}
