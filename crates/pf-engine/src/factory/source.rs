//! Options loaded through a connection provider (`create_from_source`).
//!
//! One query runs per parameter. Rows are grouped by `id_col` into
//! records; the first row of a group supplies the values while user groups
//! and parent ids are collected from every row of the group.

use crate::error::{EngineError, EngineResult};
use pf_core::bounds::{parse_date, DATE_FORMAT};
use pf_core::config::{
    DateColumns, DateOptionArgs, DateRangeColumns, DateRangeOptionArgs, NumberColumns,
    NumberOptionArgs, NumberRangeColumns, NumberRangeOptionArgs, SelectColumns, TextColumns,
    TextOptionArgs,
};
use pf_core::{DataSourceConfig, OptionScope, ParameterOption, SourceSpec};
use pf_db::{ConnectionProvider, QueryResult};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Rows of one group, plus the scope collected across them
#[derive(Debug)]
struct SourceRecord {
    values: Vec<Value>,
    scope: OptionScope,
}

/// Query result of one parameter, grouped into records
#[derive(Debug)]
pub(crate) struct SourceTable<'a> {
    parameter: &'a str,
    result: QueryResult,
    id_col: Option<usize>,
    records: Vec<SourceRecord>,
}

/// Run the data source query and group its rows.
///
/// Every column in `required` (and every column the data source maps) must
/// be present in the result.
pub(crate) async fn load<'a>(
    parameter: &'a str,
    source: &DataSourceConfig,
    required: &[&str],
    provider: &dyn ConnectionProvider,
) -> EngineResult<SourceTable<'a>> {
    let query = source.query();
    let result = provider
        .execute(source.connection_name.as_str(), &query)
        .await
        .map_err(|e| EngineError::DataSource {
            parameter: parameter.to_string(),
            source: e,
        })?;

    let column = |name: &str| {
        result
            .column_index(name)
            .ok_or_else(|| EngineError::MissingColumn {
                parameter: parameter.to_string(),
                column: name.to_string(),
            })
    };
    for name in required.iter().copied() {
        column(name)?;
    }
    let id_col = source.id_col.as_deref().map(column).transpose()?;
    let group_col = source.user_group_col.as_deref().map(column).transpose()?;
    let parent_col = source.parent_id_col.as_deref().map(column).transpose()?;

    let mut records: Vec<SourceRecord> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    let width = result.columns.len();
    for (n, row) in result.rows.iter().enumerate() {
        if row.len() != width {
            return Err(EngineError::InvalidSourceValue {
                parameter: parameter.to_string(),
                message: format!(
                    "row {} has {} values but the result has {width} columns",
                    n + 1,
                    row.len()
                ),
            });
        }
        let slot = match id_col {
            Some(idx) => {
                let id = value_to_string(&row[idx]).ok_or_else(|| {
                    EngineError::InvalidSourceValue {
                        parameter: parameter.to_string(),
                        message: "id column contains a null value".to_string(),
                    }
                })?;
                match by_id.get(&id) {
                    Some(&slot) => slot,
                    None => {
                        by_id.insert(id, records.len());
                        records.push(SourceRecord {
                            values: row.clone(),
                            scope: OptionScope::unrestricted(),
                        });
                        records.len() - 1
                    }
                }
            }
            None => {
                records.push(SourceRecord {
                    values: row.clone(),
                    scope: OptionScope::unrestricted(),
                });
                records.len() - 1
            }
        };

        let scope = &mut records[slot].scope;
        if let Some(group) = group_col.and_then(|idx| value_to_string(&row[idx])) {
            scope.user_groups.insert(group);
        }
        if let Some(parent) = parent_col.and_then(|idx| value_to_string(&row[idx])) {
            scope.parent_option_ids.insert(parent);
        }
    }

    log::debug!(
        "Loaded {} rows into {} records for parameter '{parameter}'",
        result.len(),
        records.len()
    );

    Ok(SourceTable {
        parameter,
        result,
        id_col,
        records,
    })
}

impl SourceTable<'_> {
    fn invalid(&self, message: impl Into<String>) -> EngineError {
        EngineError::InvalidSourceValue {
            parameter: self.parameter.to_string(),
            message: message.into(),
        }
    }

    fn value<'r>(&self, record: &'r SourceRecord, column: &str) -> EngineResult<&'r Value> {
        let idx = self
            .result
            .column_index(column)
            .ok_or_else(|| EngineError::MissingColumn {
                parameter: self.parameter.to_string(),
                column: column.to_string(),
            })?;
        record
            .values
            .get(idx)
            .ok_or_else(|| self.invalid(format!("record has no value for column '{column}'")))
    }

    fn text(&self, record: &SourceRecord, column: &str) -> EngineResult<Option<String>> {
        Ok(value_to_string(self.value(record, column)?))
    }

    fn required_text(&self, record: &SourceRecord, column: &str) -> EngineResult<String> {
        self.text(record, column)?
            .ok_or_else(|| self.invalid(format!("column '{column}' contains a null value")))
    }

    fn number(&self, record: &SourceRecord, column: &str) -> EngineResult<Option<f64>> {
        match self.value(record, column)? {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.invalid(format!("\"{s}\" in column '{column}' is not a number"))),
            other => Err(self.invalid(format!("{other} in column '{column}' is not a number"))),
        }
    }

    fn required_number(&self, record: &SourceRecord, column: &str) -> EngineResult<f64> {
        self.number(record, column)?
            .ok_or_else(|| self.invalid(format!("column '{column}' contains a null value")))
    }

    fn optional_number(&self, record: &SourceRecord, column: Option<&str>) -> EngineResult<Option<f64>> {
        column.map_or(Ok(None), |c| self.number(record, c))
    }

    /// Read a date and render it in ISO form.
    ///
    /// DuckDB `DATE` columns already arrive as ISO strings; text columns are
    /// read with `format`.
    fn date(&self, record: &SourceRecord, column: &str, format: &str) -> EngineResult<Option<String>> {
        let Some(text) = self.text(record, column)? else {
            return Ok(None);
        };
        let date = parse_date(&text, format)
            .or_else(|_| parse_date(&text, DATE_FORMAT))
            .map_err(|e| self.invalid(format!("column '{column}': {e}")))?;
        Ok(Some(date.format(DATE_FORMAT).to_string()))
    }

    fn required_date(&self, record: &SourceRecord, column: &str, format: &str) -> EngineResult<String> {
        self.date(record, column, format)?
            .ok_or_else(|| self.invalid(format!("column '{column}' contains a null value")))
    }

    fn optional_date(
        &self,
        record: &SourceRecord,
        column: Option<&str>,
        format: &str,
    ) -> EngineResult<Option<String>> {
        column.map_or(Ok(None), |c| self.date(record, c, format))
    }

    /// Sort records by `column`, falling back to the id column
    fn sort_by(&mut self, column: Option<&str>) {
        let key = column
            .and_then(|c| self.result.column_index(c))
            .or(self.id_col);
        if let Some(idx) = key {
            self.records
                .sort_by(|a, b| compare_values(&a.values[idx], &b.values[idx]));
        }
    }
}

// ── Widget mappings ─────────────────────────────────────────────────────

pub(crate) async fn select_options(
    parameter: &str,
    spec: &SourceSpec<SelectColumns>,
    provider: &dyn ConnectionProvider,
) -> EngineResult<Vec<ParameterOption>> {
    let columns = &spec.columns;
    let mut required = vec![columns.options_col.as_str()];
    required.extend(columns.order_by_col.as_deref());
    required.extend(columns.is_default_col.as_deref());
    required.extend(columns.custom_cols.values().map(String::as_str));

    let mut table = load(parameter, &spec.data_source, &required, provider).await?;
    table.sort_by(columns.order_by_col.as_deref());

    let id_col = spec.data_source.id_col.as_deref().unwrap_or(&columns.options_col);
    let mut options = Vec::with_capacity(table.records.len());
    for record in &table.records {
        let id = table.required_text(record, id_col)?;
        let label = table
            .text(record, &columns.options_col)?
            .unwrap_or_else(|| id.clone());
        let is_default = match columns.is_default_col.as_deref() {
            Some(col) => is_truthy(table.value(record, col)?),
            None => false,
        };

        let mut option = ParameterOption::new(id, label)
            .with_default(is_default)
            .with_scope(record.scope.clone());
        for (field, col) in &columns.custom_cols {
            option = option.with_custom_field(field.clone(), table.value(record, col)?.clone());
        }
        options.push(option);
    }
    Ok(options)
}

pub(crate) async fn date_records(
    parameter: &str,
    spec: &SourceSpec<DateColumns>,
    provider: &dyn ConnectionProvider,
) -> EngineResult<Vec<DateOptionArgs>> {
    let c = &spec.columns;
    let mut required = vec![c.default_date_col.as_str()];
    required.extend(c.min_date_col.as_deref());
    required.extend(c.max_date_col.as_deref());

    let table = load(parameter, &spec.data_source, &required, provider).await?;
    let fmt = c.date_format.as_str();
    table
        .records
        .iter()
        .map(|r| {
            Ok(DateOptionArgs {
                default_date: table.required_date(r, &c.default_date_col, fmt)?,
                min_date: table.optional_date(r, c.min_date_col.as_deref(), fmt)?,
                max_date: table.optional_date(r, c.max_date_col.as_deref(), fmt)?,
                date_format: DATE_FORMAT.to_string(),
                scope: r.scope.clone(),
            })
        })
        .collect()
}

pub(crate) async fn date_range_records(
    parameter: &str,
    spec: &SourceSpec<DateRangeColumns>,
    provider: &dyn ConnectionProvider,
) -> EngineResult<Vec<DateRangeOptionArgs>> {
    let c = &spec.columns;
    let mut required = vec![
        c.default_start_date_col.as_str(),
        c.default_end_date_col.as_str(),
    ];
    required.extend(c.min_date_col.as_deref());
    required.extend(c.max_date_col.as_deref());

    let table = load(parameter, &spec.data_source, &required, provider).await?;
    let fmt = c.date_format.as_str();
    table
        .records
        .iter()
        .map(|r| {
            Ok(DateRangeOptionArgs {
                default_start_date: table.required_date(r, &c.default_start_date_col, fmt)?,
                default_end_date: table.required_date(r, &c.default_end_date_col, fmt)?,
                min_date: table.optional_date(r, c.min_date_col.as_deref(), fmt)?,
                max_date: table.optional_date(r, c.max_date_col.as_deref(), fmt)?,
                date_format: DATE_FORMAT.to_string(),
                scope: r.scope.clone(),
            })
        })
        .collect()
}

pub(crate) async fn number_records(
    parameter: &str,
    spec: &SourceSpec<NumberColumns>,
    provider: &dyn ConnectionProvider,
) -> EngineResult<Vec<NumberOptionArgs>> {
    let c = &spec.columns;
    let mut required = vec![c.min_value_col.as_str(), c.max_value_col.as_str()];
    required.extend(c.increment_col.as_deref());
    required.extend(c.default_value_col.as_deref());

    let table = load(parameter, &spec.data_source, &required, provider).await?;
    table
        .records
        .iter()
        .map(|r| {
            Ok(NumberOptionArgs {
                min_value: table.required_number(r, &c.min_value_col)?,
                max_value: table.required_number(r, &c.max_value_col)?,
                increment: table
                    .optional_number(r, c.increment_col.as_deref())?
                    .unwrap_or(1.0),
                default_value: table.optional_number(r, c.default_value_col.as_deref())?,
                scope: r.scope.clone(),
            })
        })
        .collect()
}

pub(crate) async fn number_range_records(
    parameter: &str,
    spec: &SourceSpec<NumberRangeColumns>,
    provider: &dyn ConnectionProvider,
) -> EngineResult<Vec<NumberRangeOptionArgs>> {
    let c = &spec.columns;
    let mut required = vec![c.min_value_col.as_str(), c.max_value_col.as_str()];
    required.extend(c.increment_col.as_deref());
    required.extend(c.default_lower_value_col.as_deref());
    required.extend(c.default_upper_value_col.as_deref());

    let table = load(parameter, &spec.data_source, &required, provider).await?;
    table
        .records
        .iter()
        .map(|r| {
            Ok(NumberRangeOptionArgs {
                min_value: table.required_number(r, &c.min_value_col)?,
                max_value: table.required_number(r, &c.max_value_col)?,
                increment: table
                    .optional_number(r, c.increment_col.as_deref())?
                    .unwrap_or(1.0),
                default_lower_value: table
                    .optional_number(r, c.default_lower_value_col.as_deref())?,
                default_upper_value: table
                    .optional_number(r, c.default_upper_value_col.as_deref())?,
                scope: r.scope.clone(),
            })
        })
        .collect()
}

pub(crate) async fn text_records(
    parameter: &str,
    spec: &SourceSpec<TextColumns>,
    provider: &dyn ConnectionProvider,
) -> EngineResult<Vec<TextOptionArgs>> {
    let c = &spec.columns;
    let required: Vec<&str> = c.default_text_col.as_deref().into_iter().collect();

    let table = load(parameter, &spec.data_source, &required, provider).await?;
    table
        .records
        .iter()
        .map(|r| {
            let default_text = match c.default_text_col.as_deref() {
                Some(col) => table.text(r, col)?.unwrap_or_default(),
                None => String::new(),
            };
            Ok(TextOptionArgs {
                default_text,
                scope: r.scope.clone(),
            })
        })
        .collect()
}

// ── Value helpers ───────────────────────────────────────────────────────

/// Render a cell as an option id, label or group; null is `None`
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Default flags accept `true`, `1`, `"1"` and `"true"`
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    }
}

/// Numbers compare numerically, everything else by text; nulls sort last
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => value_to_string(a).cmp(&value_to_string(b)),
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
