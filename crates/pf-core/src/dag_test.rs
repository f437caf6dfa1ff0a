use super::*;

struct Decl {
    name: ParameterName,
    kind: WidgetKind,
    parent: Option<ParameterName>,
}

fn decl(name: &str, kind: WidgetKind, parent: Option<&str>) -> Decl {
    Decl {
        name: ParameterName::new(name).unwrap(),
        kind,
        parent: parent.map(|p| ParameterName::new(p).unwrap()),
    }
}

fn build(decls: &[Decl]) -> CoreResult<ParameterDag> {
    let nodes: Vec<DagNode<'_>> = decls
        .iter()
        .map(|d| DagNode {
            name: &d.name,
            kind: d.kind,
            parent: d.parent.as_ref(),
        })
        .collect();
    ParameterDag::build(&nodes)
}

#[test]
fn test_parents_come_first() {
    let dag = build(&[
        decl("city", WidgetKind::SingleSelect, Some("country")),
        decl("store", WidgetKind::MultiSelect, Some("city")),
        decl("country", WidgetKind::SingleSelect, None),
    ])
    .unwrap();

    let order: Vec<String> = dag
        .topological_order_names()
        .unwrap()
        .into_iter()
        .map(String::from)
        .collect();
    let pos = |n: &str| order.iter().position(|o| o == n).unwrap();
    assert!(pos("country") < pos("city"));
    assert!(pos("city") < pos("store"));
}

#[test]
fn test_two_node_cycle_is_rejected() {
    let err = build(&[
        decl("a", WidgetKind::SingleSelect, Some("b")),
        decl("b", WidgetKind::SingleSelect, Some("a")),
    ])
    .unwrap_err();

    match err {
        CoreError::CircularDependency { cycle } => {
            assert!(cycle.contains('a'));
            assert!(cycle.contains('b'));
        }
        other => panic!("expected CircularDependency, got {other}"),
    }
}

#[test]
fn test_self_parent_is_a_cycle() {
    let err = build(&[decl("a", WidgetKind::SingleSelect, Some("a"))]).unwrap_err();
    assert!(matches!(err, CoreError::CircularDependency { .. }));
}

#[test]
fn test_unknown_parent() {
    let err = build(&[decl("a", WidgetKind::SingleSelect, Some("ghost"))]).unwrap_err();
    assert!(matches!(err, CoreError::UnknownParent { ref parent, .. } if parent == "ghost"));
}

#[test]
fn test_duplicate_names() {
    let err = build(&[
        decl("a", WidgetKind::SingleSelect, None),
        decl("a", WidgetKind::Number, None),
    ])
    .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateParameter { .. }));
}

#[test]
fn test_scalar_parent_rejected() {
    let err = build(&[
        decl("limit", WidgetKind::Number, None),
        decl("child", WidgetKind::SingleSelect, Some("limit")),
    ])
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidParent { .. }));
}

#[test]
fn test_scalar_child_needs_single_select_parent() {
    let err = build(&[
        decl("regions", WidgetKind::MultiSelect, None),
        decl("as_of", WidgetKind::Date, Some("regions")),
    ])
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidParent { .. }));

    build(&[
        decl("regions", WidgetKind::MultiSelect, None),
        decl("stores", WidgetKind::MultiSelect, Some("regions")),
    ])
    .unwrap();
}

#[test]
fn test_dependents() {
    let dag = build(&[
        decl("country", WidgetKind::SingleSelect, None),
        decl("city", WidgetKind::SingleSelect, Some("country")),
        decl("limit", WidgetKind::Number, None),
    ])
    .unwrap();

    assert!(dag.has_dependents("country"));
    assert!(!dag.has_dependents("city"));
    assert!(!dag.has_dependents("missing"));
    assert!(!dag.has_dependents("limit"));
}
