//! Parameter metadata as handed to a response-serialization layer.
//!
//! Each model carries what a client needs to render the widget plus the
//! `selected_*` fields; [`ParametersResponse::to_raw_selection`] turns those
//! fields back into a [`RawSelection`] reproducing the same state.

use crate::bounds::{Bounds, NumericRange, TextInputType, DATE_FORMAT};
use crate::option::ParameterOption;
use crate::parameter::{Parameter, Widget};
use crate::parameter_set::ParameterSet;
use crate::selection::RawSelection;
use crate::widget::ScalarWidget;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Metadata of every parameter in a resolved set, in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersResponse {
    pub parameters: Vec<ParameterModel>,
}

/// One parameter, tagged by `widget_type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "widget_type", rename_all = "snake_case")]
pub enum ParameterModel {
    SingleSelect(SingleSelectModel),
    MultiSelect(MultiSelectModel),
    Date(DateModel),
    DateRange(DateRangeModel),
    Number(NumberModel),
    NumberRange(NumberRangeModel),
    Text(TextModel),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionModel {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleSelectModel {
    pub name: String,
    pub label: String,
    pub description: String,
    pub trigger_refresh: bool,
    pub options: Vec<OptionModel>,
    pub selected_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiSelectModel {
    pub name: String,
    pub label: String,
    pub description: String,
    pub trigger_refresh: bool,
    pub options: Vec<OptionModel>,
    pub selected_ids: Vec<String>,
    pub include_all: bool,
    pub order_matters: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateModel {
    pub name: String,
    pub label: String,
    pub description: String,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub selected_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeModel {
    pub name: String,
    pub label: String,
    pub description: String,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub selected_start_date: Option<String>,
    pub selected_end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberModel {
    pub name: String,
    pub label: String,
    pub description: String,
    pub min_value: f64,
    pub max_value: f64,
    pub increment: f64,
    pub selected_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberRangeModel {
    pub name: String,
    pub label: String,
    pub description: String,
    pub min_value: f64,
    pub max_value: f64,
    pub increment: f64,
    pub selected_lower_value: Option<f64>,
    pub selected_upper_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextModel {
    pub name: String,
    pub label: String,
    pub description: String,
    pub input_type: TextInputType,
    pub entered_text: Option<String>,
}

fn options_of(options: &[ParameterOption]) -> Vec<OptionModel> {
    options
        .iter()
        .map(|o| OptionModel {
            id: o.id().to_string(),
            label: o.label().to_string(),
        })
        .collect()
}

fn date_str(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn numeric<B: Bounds>(
    widget: &ScalarWidget<B>,
    range: impl Fn(&B) -> NumericRange,
) -> (f64, f64, f64) {
    widget
        .current()
        .map(|b| {
            let r = range(b);
            (r.min_value, r.max_value, r.increment)
        })
        .unwrap_or((0.0, 0.0, 1.0))
}

impl ParameterModel {
    pub fn from_parameter(param: &Parameter) -> Self {
        let name = param.name().to_string();
        let label = param.label().to_string();
        let description = param.description().to_string();

        match param.widget() {
            Widget::SingleSelect(w) => ParameterModel::SingleSelect(SingleSelectModel {
                name,
                label,
                description,
                trigger_refresh: param.trigger_refresh(),
                options: options_of(w.options()),
                selected_id: w.selected_id().map(str::to_string),
            }),
            Widget::MultiSelect(w) => ParameterModel::MultiSelect(MultiSelectModel {
                name,
                label,
                description,
                trigger_refresh: param.trigger_refresh(),
                options: options_of(w.options()),
                selected_ids: w.selected_ids().to_vec(),
                include_all: w.include_all(),
                order_matters: w.order_matters(),
            }),
            Widget::Date(w) => {
                let limits = w.current().map(|b| b.limits).unwrap_or_default();
                ParameterModel::Date(DateModel {
                    name,
                    label,
                    description,
                    min_date: limits.min_date.map(date_str),
                    max_date: limits.max_date.map(date_str),
                    selected_date: w.selected_date().map(date_str),
                })
            }
            Widget::DateRange(w) => {
                let limits = w.current().map(|b| b.limits).unwrap_or_default();
                ParameterModel::DateRange(DateRangeModel {
                    name,
                    label,
                    description,
                    min_date: limits.min_date.map(date_str),
                    max_date: limits.max_date.map(date_str),
                    selected_start_date: w.selected_start_date().map(date_str),
                    selected_end_date: w.selected_end_date().map(date_str),
                })
            }
            Widget::Number(w) => {
                let (min_value, max_value, increment) = numeric(w, |b| b.range);
                ParameterModel::Number(NumberModel {
                    name,
                    label,
                    description,
                    min_value,
                    max_value,
                    increment,
                    selected_value: w.selected_value(),
                })
            }
            Widget::NumberRange(w) => {
                let (min_value, max_value, increment) = numeric(w, |b| b.range);
                ParameterModel::NumberRange(NumberRangeModel {
                    name,
                    label,
                    description,
                    min_value,
                    max_value,
                    increment,
                    selected_lower_value: w.selected_lower_value(),
                    selected_upper_value: w.selected_upper_value(),
                })
            }
            Widget::Text(w) => ParameterModel::Text(TextModel {
                name,
                label,
                description,
                input_type: w.current().map(|b| b.input_type).unwrap_or_default(),
                entered_text: w.selected_text().map(str::to_string),
            }),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ParameterModel::SingleSelect(m) => &m.name,
            ParameterModel::MultiSelect(m) => &m.name,
            ParameterModel::Date(m) => &m.name,
            ParameterModel::DateRange(m) => &m.name,
            ParameterModel::Number(m) => &m.name,
            ParameterModel::NumberRange(m) => &m.name,
            ParameterModel::Text(m) => &m.name,
        }
    }

    /// Raw values that would select what this model shows
    fn raw_values(&self) -> Vec<String> {
        match self {
            ParameterModel::SingleSelect(m) => m.selected_id.iter().cloned().collect(),
            // JSON array, so an empty selection stays `[]`
            ParameterModel::MultiSelect(m) => {
                vec![serde_json::Value::from(m.selected_ids.clone()).to_string()]
            }
            ParameterModel::Date(m) => m.selected_date.iter().cloned().collect(),
            ParameterModel::DateRange(m) => match (&m.selected_start_date, &m.selected_end_date) {
                (Some(start), Some(end)) => vec![start.clone(), end.clone()],
                _ => Vec::new(),
            },
            ParameterModel::Number(m) => m.selected_value.iter().map(f64::to_string).collect(),
            ParameterModel::NumberRange(m) => {
                match (m.selected_lower_value, m.selected_upper_value) {
                    (Some(lower), Some(upper)) => vec![lower.to_string(), upper.to_string()],
                    _ => Vec::new(),
                }
            }
            ParameterModel::Text(m) => m.entered_text.iter().cloned().collect(),
        }
    }
}

impl ParametersResponse {
    pub fn from_set(set: &ParameterSet) -> Self {
        Self {
            parameters: set.iter().map(ParameterModel::from_parameter).collect(),
        }
    }

    /// Selection that reproduces the displayed state when resolved again
    pub fn to_raw_selection(&self) -> RawSelection {
        let mut raw = RawSelection::new();
        for model in &self.parameters {
            for value in model.raw_values() {
                raw.push(model.name(), value);
            }
        }
        raw
    }
}

impl From<&ParameterSet> for ParametersResponse {
    fn from(set: &ParameterSet) -> Self {
        Self::from_set(set)
    }
}

#[cfg(test)]
#[path = "response_test.rs"]
mod tests;
