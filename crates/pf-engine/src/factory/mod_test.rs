use super::*;
use pf_core::{ParametersConfig, WidgetKind};
use pf_db::DuckDbConnections;
use serde_json::json;

const CONFIG: &str = r#"
parameters:
  - type: single_select
    factory: create_with_options
    arguments:
      name: country
      label: Country
      options:
        - { id: ca, label: Canada }
        - { id: us, label: United States, is_default: true }

  - type: multi_select
    factory: create_from_source
    arguments:
      name: city
      label: City
      parent_name: country
      user_attribute: role
      data_source:
        table_or_query: cities
        id_col: city_id
        options_col: city_name
        order_by_col: sort_order
        is_default_col: is_default
        user_group_col: role
        parent_id_col: country_id
        custom_cols:
          country: country_id

  - type: number
    factory: create_from_source
    arguments:
      name: top_n
      label: Top N
      parent_name: country
      data_source:
        table_or_query: SELECT * FROM limits
        parent_id_col: country_id
        min_value_col: lo
        max_value_col: hi
        increment_col: step

  - type: date
    factory: create_simple
    arguments:
      name: as_of
      label: As of
      default_date: "2024-03-01"
      min_date: "2024-01-01"

  - type: date_range
    factory: create_from_source
    arguments:
      name: period
      label: Period
      data_source:
        table_or_query: "SELECT '01/02/2024' AS start_text, DATE '2024-02-29' AS end_date"
        default_start_date_col: start_text
        default_end_date_col: end_date
        date_format: "%d/%m/%Y"
"#;

fn connections() -> DuckDbConnections {
    let mut conns = DuckDbConnections::new();
    conns.add_in_memory("default").unwrap();
    conns
        .execute_batch(
            "default",
            "CREATE TABLE cities (
                city_id VARCHAR, city_name VARCHAR, country_id VARCHAR,
                sort_order INTEGER, role VARCHAR, is_default INTEGER
            );
            INSERT INTO cities VALUES
                ('tor', 'Toronto', 'ca', 3, NULL, 0),
                ('van', 'Vancouver', 'ca', 2, 'manager', 0),
                ('van', 'Vancouver', 'ca', 2, 'admin', 0),
                ('nyc', 'New York', 'us', 1, NULL, 1);
            CREATE TABLE limits (country_id VARCHAR, lo DOUBLE, hi DOUBLE, step DOUBLE);
            INSERT INTO limits VALUES ('us', 0, 300, 10), ('ca', 1, 5, 1);",
        )
        .unwrap();
    conns
}

fn config(name: &str) -> ParameterConfig {
    ParametersConfig::from_yaml_str(CONFIG)
        .unwrap()
        .parameter_configs()
        .unwrap()
        .into_iter()
        .find(|c| c.name().as_str() == name)
        .unwrap()
}

#[tokio::test]
async fn test_literal_select_keeps_declared_options() {
    let param = build_parameter(&config("country"), &connections())
        .await
        .unwrap();
    let select = param.as_single_select().unwrap();
    assert_eq!(select.options().len(), 2);
    assert_eq!(select.selected_id(), Some("us"));
}

#[tokio::test]
async fn test_source_select_groups_and_orders_rows() {
    let param = build_parameter(&config("city"), &connections())
        .await
        .unwrap();
    assert_eq!(param.kind(), WidgetKind::MultiSelect);

    let select = param.as_multi_select().unwrap();
    let ids: Vec<&str> = select.options().iter().map(|o| o.id()).collect();
    assert_eq!(ids, vec!["nyc", "van", "tor"]);
    assert_eq!(select.selected_ids(), ["nyc"]);

    let van = &select.options()[1];
    assert_eq!(van.label(), "Vancouver");
    assert_eq!(
        van.scope().user_groups.iter().collect::<Vec<_>>(),
        vec!["admin", "manager"]
    );
    assert!(van.scope().parent_option_ids.contains("ca"));
    assert_eq!(van.field("country"), Some(json!("ca")));
    assert!(select.options()[2].scope().user_groups.is_empty());
}

#[tokio::test]
async fn test_source_number_keeps_one_record_per_row() {
    let param = build_parameter(&config("top_n"), &connections())
        .await
        .unwrap();
    let Widget::Number(widget) = param.widget() else {
        panic!("expected a number widget");
    };
    assert_eq!(widget.records().len(), 2);
    assert_eq!(widget.records()[0].bounds.range.max_value, 300.0);
    assert_eq!(widget.selected_value(), Some(150.0));
}

#[tokio::test]
async fn test_simple_date_needs_no_connection() {
    let param = build_parameter(&config("as_of"), &DuckDbConnections::new())
        .await
        .unwrap();
    let Widget::Date(widget) = param.widget() else {
        panic!("expected a date widget");
    };
    assert_eq!(
        widget.selected_date().map(|d| d.to_string()),
        Some("2024-03-01".to_string())
    );
}

#[tokio::test]
async fn test_source_dates_accept_text_and_date_columns() {
    let param = build_parameter(&config("period"), &connections())
        .await
        .unwrap();
    let Widget::DateRange(widget) = param.widget() else {
        panic!("expected a date range widget");
    };
    assert_eq!(
        widget.selected_start_date().map(|d| d.to_string()),
        Some("2024-02-01".to_string())
    );
    assert_eq!(
        widget.selected_end_date().map(|d| d.to_string()),
        Some("2024-02-29".to_string())
    );
}

#[tokio::test]
async fn test_unknown_connection_is_data_source_error() {
    let err = build_parameter(&config("city"), &DuckDbConnections::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DataSource { ref parameter, .. } if parameter == "city"));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn test_missing_column_is_reported() {
    let mut conns = DuckDbConnections::new();
    conns.add_in_memory("default").unwrap();
    conns
        .execute_batch(
            "default",
            "CREATE TABLE cities (city_id VARCHAR, city_name VARCHAR);",
        )
        .unwrap();

    let err = build_parameter(&config("city"), &conns).await.unwrap_err();
    assert!(matches!(err, EngineError::MissingColumn { .. }));
}

#[tokio::test]
async fn test_bad_source_bounds_are_source_errors() {
    let conns = connections();
    conns
        .execute_batch("default", "INSERT INTO limits VALUES ('mx', 10, 1, 1);")
        .unwrap();

    let err = build_parameter(&config("top_n"), &conns).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidSourceValue { .. }));
}
