use super::*;
use crate::bounds::{NumberBounds, NumericRange};
use crate::option::{OptionScope, ParameterOption};
use crate::parameter::ParameterInfo;
use crate::widget::{NumberWidget, SingleSelect};
use std::collections::BTreeSet;

fn select(name: &str, parent: Option<&str>) -> Parameter {
    let mut info = ParameterInfo::new(ParameterName::new(name).unwrap(), name);
    if let Some(parent) = parent {
        info = info.with_parent(ParameterName::new(parent).unwrap());
    }
    Parameter::new(
        info,
        SingleSelect::new(vec![ParameterOption::new("a", "A")]).unwrap(),
    )
}

fn scoped_number(parent_id: &str, groups: &[&str]) -> ScopedBounds<NumberBounds> {
    ScopedBounds::new(
        OptionScope {
            user_groups: groups.iter().map(|g| g.to_string()).collect(),
            parent_option_ids: BTreeSet::from([parent_id.to_string()]),
        },
        NumberBounds::new(NumericRange::new(0.0, 10.0, 1.0).unwrap(), None).unwrap(),
    )
}

fn number_child(records: Vec<ScopedBounds<NumberBounds>>) -> Parameter {
    Parameter::new(
        ParameterInfo::new(ParameterName::new("limit").unwrap(), "Limit")
            .with_parent(ParameterName::new("mode").unwrap()),
        NumberWidget::new(records),
    )
}

#[test]
fn test_trigger_refresh_is_derived() {
    let base = BaseParameterSet::new(
        vec![
            select("country", None),
            select("city", Some("country")),
            select("other", None),
        ],
        1,
    )
    .unwrap();

    assert!(base.get("country").unwrap().trigger_refresh());
    assert!(!base.get("city").unwrap().trigger_refresh());
    assert!(!base.get("other").unwrap().trigger_refresh());
    assert_eq!(base.generation(), 1);
}

#[test]
fn test_declared_order_is_kept() {
    let base = BaseParameterSet::new(
        vec![select("city", Some("country")), select("country", None)],
        0,
    )
    .unwrap();

    let declared: Vec<&str> = base.parameters().names().map(|n| n.as_str()).collect();
    assert_eq!(declared, vec!["city", "country"]);
    assert_eq!(base.resolution_order()[0], "country");
}

#[test]
fn test_cycle_fails_base_set() {
    let err = BaseParameterSet::new(vec![select("a", Some("b")), select("b", Some("a"))], 0)
        .unwrap_err();
    assert!(matches!(err, CoreError::CircularDependency { .. }));
}

#[test]
fn test_scalar_parent_ids_unique_per_group() {
    let err = BaseParameterSet::new(
        vec![
            select("mode", None),
            number_child(vec![scoped_number("a", &[]), scoped_number("a", &[])]),
        ],
        0,
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));

    BaseParameterSet::new(
        vec![
            select("mode", None),
            number_child(vec![
                scoped_number("a", &["manager"]),
                scoped_number("a", &["employee"]),
            ]),
        ],
        0,
    )
    .unwrap();
}

#[test]
fn test_user_attributes_are_distinct() {
    let mut a = select("a", None);
    let mut b = select("b", None);
    a = Parameter::new(a.info().clone().with_user_attribute("role"), a.widget().clone());
    b = Parameter::new(b.info().clone().with_user_attribute("role"), b.widget().clone());
    let set = ParameterSet::new(vec![a, b, select("c", None)]).unwrap();
    assert_eq!(set.user_attributes(), vec!["role"]);
}
