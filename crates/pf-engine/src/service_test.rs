use super::*;
use pf_core::CoreError;
use pf_db::DuckDbConnections;

const MENU: &str = r#"
settings:
  selection_cache_size: 8
parameters:
  - type: single_select
    factory: create_with_options
    arguments:
      name: course
      label: Course
      options:
        - { id: starter, label: Starter, is_default: true }
        - { id: main, label: Main }

  - type: single_select
    factory: create_with_options
    arguments:
      name: dish
      label: Dish
      parent_name: course
      options:
        - { id: soup, label: Soup, parent_option_ids: starter }
        - { id: steak, label: Steak, parent_option_ids: main }
"#;

fn service() -> ParameterService {
    let config = ParametersConfig::from_yaml_str(MENU).unwrap();
    let service = ParameterService::new(&config.settings, Arc::new(DuckDbConnections::new()));
    service.register_project("menu", &config).unwrap();
    service
}

fn dish(set: &ParameterSet) -> Option<&str> {
    set.get("dish")
        .and_then(|p| p.as_single_select())
        .and_then(|s| s.selected_id())
}

#[tokio::test]
async fn test_unknown_project() {
    let err = service()
        .get_base_parameter_set("drinks")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownProject(ref id) if id == "drinks"));
}

#[tokio::test]
async fn test_base_set_is_shared_until_invalidated() {
    let service = service();
    let first = service.get_base_parameter_set("menu").await.unwrap();
    let second = service.get_base_parameter_set("menu").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.get("course").unwrap().trigger_refresh());

    assert!(service.invalidate_project("menu"));
    assert!(!service.invalidate_project("menu"));
    let rebuilt = service.get_base_parameter_set("menu").await.unwrap();
    assert!(rebuilt.generation() > first.generation());
}

#[tokio::test]
async fn test_resolve_cascades_and_leaves_base_untouched() {
    let service = service();
    let user = UserAttributes::new();

    let set = service
        .resolve("menu", &RawSelection::new().with("course", "main"), &user)
        .await
        .unwrap();
    assert_eq!(dish(&set), Some("steak"));

    let base = service.get_base_parameter_set("menu").await.unwrap();
    assert_eq!(dish(base.parameters()), Some("soup"));
}

#[tokio::test]
async fn test_identical_requests_share_a_resolution() {
    let service = service();
    let user = UserAttributes::new();
    let raw = RawSelection::new().with("course", "main").with("dish", "soup");

    let first = service.resolve_with_report("menu", &raw, &user).await.unwrap();
    let second = service.resolve_with_report("menu", &raw, &user).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.stale.len(), 1);
    assert_eq!(first.stale[0].parameter, "dish");
}

#[tokio::test]
async fn test_updates_only_returns_refreshed_children() {
    let service = service();
    let user = UserAttributes::new();
    let raw = RawSelection::new().with("course", "main");

    let updates = service
        .resolve_scoped("menu", &raw, &user, &ResolveScope::all().updates_only())
        .await
        .unwrap();
    let names: Vec<&str> = updates.parameters.names().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["course", "dish"]);
    assert_eq!(dish(&updates.parameters), Some("steak"));

    let dish_change = RawSelection::new().with("dish", "soup");
    let updates = service
        .resolve_scoped("menu", &dish_change, &user, &ResolveScope::all().updates_only())
        .await
        .unwrap();
    assert!(!updates.parameters.contains("course"));
    assert_eq!(dish(&updates.parameters), Some("soup"));

    let dish_only = service
        .resolve_scoped("menu", &raw, &user, &ResolveScope::only(["dish"]))
        .await
        .unwrap();
    assert!(!dish_only.parameters.contains("course"));
    assert_eq!(dish(&dish_only.parameters), Some("steak"));

    let full = service.resolve_with_report("menu", &raw, &user).await.unwrap();
    assert!(!Arc::ptr_eq(&full, &dish_only));
    assert_eq!(service.resolved.len(), 4);
}

#[tokio::test]
async fn test_invalid_value_is_client_error_and_not_cached() {
    let service = service();
    let user = UserAttributes::new();
    let raw = RawSelection::new().with("course", "dessert");

    for _ in 0..2 {
        let err = service.resolve("menu", &raw, &user).await.unwrap_err();
        assert!(err.is_client_error());
        assert!(!err.is_load_error());
    }
    assert!(service.resolved.is_empty());
}

#[test]
fn test_cycle_fails_registration() {
    let yaml = r#"
parameters:
  - type: single_select
    factory: create_with_options
    arguments:
      name: a
      parent_name: b
      options: [{ id: x, label: X }]
  - type: single_select
    factory: create_with_options
    arguments:
      name: b
      parent_name: a
      options: [{ id: y, label: Y }]
"#;
    let service = ParameterService::new(
        &CacheSettings::default(),
        Arc::new(DuckDbConnections::new()),
    );
    let config = ParametersConfig::from_yaml_str(yaml).unwrap();
    let err = service.register_project("loop", &config).unwrap_err();

    assert!(err.is_load_error());
    assert!(matches!(
        err,
        EngineError::Core(CoreError::CircularDependency { .. })
    ));
    assert!(!service.has_project("loop"));
}
