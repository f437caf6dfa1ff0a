//! The `Parameter` tagged union

use crate::error::{CoreError, CoreResult};
use crate::names::ParameterName;
use crate::option::{OptionFilter, ParameterOption};
use crate::user::UserAttributes;
use crate::widget::{
    id_set, DateRangeWidget, DateWidget, MultiSelect, NumberRangeWidget, NumberWidget,
    SingleSelect, TextWidget, Validation, WidgetOps,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Widget kind of a parameter, as named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    SingleSelect,
    MultiSelect,
    Date,
    DateRange,
    Number,
    NumberRange,
    Text,
}

impl WidgetKind {
    /// Single- and multi-select parameters hold options with ids
    pub fn is_select(&self) -> bool {
        matches!(self, WidgetKind::SingleSelect | WidgetKind::MultiSelect)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::SingleSelect => "single_select",
            WidgetKind::MultiSelect => "multi_select",
            WidgetKind::Date => "date",
            WidgetKind::DateRange => "date_range",
            WidgetKind::Number => "number",
            WidgetKind::NumberRange => "number_range",
            WidgetKind::Text => "text",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every parameter kind
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub name: ParameterName,
    pub label: String,
    pub description: String,
    pub parent_name: Option<ParameterName>,
    /// User attribute matched against option `user_groups`
    pub user_attribute: Option<String>,
    /// Whether dependents must be refreshed when this parameter changes.
    /// Derived when the parameter set is assembled.
    pub trigger_refresh: bool,
}

impl ParameterInfo {
    pub fn new(name: ParameterName, label: impl Into<String>) -> Self {
        Self {
            name,
            label: label.into(),
            description: String::new(),
            parent_name: None,
            user_attribute: None,
            trigger_refresh: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parent(mut self, parent_name: ParameterName) -> Self {
        self.parent_name = Some(parent_name);
        self
    }

    pub fn with_user_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.user_attribute = Some(attribute.into());
        self
    }
}

/// The widget-specific part of a parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    SingleSelect(SingleSelect),
    MultiSelect(MultiSelect),
    Date(DateWidget),
    DateRange(DateRangeWidget),
    Number(NumberWidget),
    NumberRange(NumberRangeWidget),
    Text(TextWidget),
}

macro_rules! widget_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Widget {
                fn from(widget: $ty) -> Self {
                    Widget::$variant(widget)
                }
            }
        )*
    };
}

widget_from!(
    SingleSelect(SingleSelect),
    MultiSelect(MultiSelect),
    Date(DateWidget),
    DateRange(DateRangeWidget),
    Number(NumberWidget),
    NumberRange(NumberRangeWidget),
    Text(TextWidget),
);

/// Run the same expression against whichever variant is held
macro_rules! each_widget {
    ($widget:expr, $w:ident => $body:expr) => {
        match $widget {
            Widget::SingleSelect($w) => $body,
            Widget::MultiSelect($w) => $body,
            Widget::Date($w) => $body,
            Widget::DateRange($w) => $body,
            Widget::Number($w) => $body,
            Widget::NumberRange($w) => $body,
            Widget::Text($w) => $body,
        }
    };
}

impl Widget {
    pub fn kind(&self) -> WidgetKind {
        match self {
            Widget::SingleSelect(_) => WidgetKind::SingleSelect,
            Widget::MultiSelect(_) => WidgetKind::MultiSelect,
            Widget::Date(_) => WidgetKind::Date,
            Widget::DateRange(_) => WidgetKind::DateRange,
            Widget::Number(_) => WidgetKind::Number,
            Widget::NumberRange(_) => WidgetKind::NumberRange,
            Widget::Text(_) => WidgetKind::Text,
        }
    }

    fn narrowed(&self, filter: &OptionFilter<'_>) -> Option<Widget> {
        each_widget!(self, w => w.narrowed(filter).map(Widget::from))
    }

    fn with_selection(&self, raw: &[String]) -> Result<Widget, String> {
        each_widget!(self, w => w.with_selection(raw).map(Widget::from))
    }

    fn recognizes(&self, raw: &[String]) -> bool {
        each_widget!(self, w => w.recognizes(raw))
    }

    fn corrected_from(&self, raw: &[String]) -> Widget {
        each_widget!(self, w => Widget::from(w.corrected_from(raw)))
    }

    fn with_default_selection(&self) -> Widget {
        each_widget!(self, w => Widget::from(w.with_default_selection()))
    }

    fn validate(&self) -> Validation {
        each_widget!(self, w => w.validate())
    }
}

/// A named, configured parameter with its current selection.
///
/// Instances are values: every selection change returns a new `Parameter`.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    info: ParameterInfo,
    widget: Widget,
}

impl Parameter {
    pub fn new(info: ParameterInfo, widget: impl Into<Widget>) -> Self {
        Self {
            info,
            widget: widget.into(),
        }
    }

    pub fn info(&self) -> &ParameterInfo {
        &self.info
    }

    pub fn name(&self) -> &ParameterName {
        &self.info.name
    }

    pub fn label(&self) -> &str {
        &self.info.label
    }

    pub fn description(&self) -> &str {
        &self.info.description
    }

    pub fn parent_name(&self) -> Option<&ParameterName> {
        self.info.parent_name.as_ref()
    }

    pub fn user_attribute(&self) -> Option<&str> {
        self.info.user_attribute.as_deref()
    }

    pub fn trigger_refresh(&self) -> bool {
        self.info.trigger_refresh
    }

    pub(crate) fn set_trigger_refresh(&mut self, trigger_refresh: bool) {
        self.info.trigger_refresh = trigger_refresh;
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    pub fn kind(&self) -> WidgetKind {
        self.widget.kind()
    }

    /// Group values of `user` relevant to this parameter, if it has a
    /// `user_attribute`
    pub fn user_groups(&self, user: &UserAttributes) -> Option<BTreeSet<String>> {
        self.user_attribute().map(|attr| user.group_values(attr))
    }

    /// Options of a select parameter visible to `user`; empty for scalars
    pub fn visible_options(&self, user: &UserAttributes) -> Vec<&ParameterOption> {
        let groups = self.user_groups(user);
        let options = match &self.widget {
            Widget::SingleSelect(w) => w.options(),
            Widget::MultiSelect(w) => w.options(),
            _ => return Vec::new(),
        };
        options
            .iter()
            .filter(|o| o.scope().is_visible_to(groups.as_ref()))
            .collect()
    }

    /// Copy of this parameter keeping only what passes `filter`, with the
    /// default selection. `None` when no option or bound record survives.
    pub fn narrowed(&self, filter: &OptionFilter<'_>) -> Option<Parameter> {
        self.widget.narrowed(filter).map(|widget| Parameter {
            info: self.info.clone(),
            widget,
        })
    }

    /// Apply raw values as a new selection.
    ///
    /// Blank or absent values select the default. Anything that does not
    /// parse or is not among the current options fails with
    /// [`CoreError::InvalidParameterValue`].
    pub fn with_selection(&self, raw: &[String]) -> CoreResult<Parameter> {
        if raw.iter().all(|v| v.trim().is_empty()) {
            return Ok(self.with_default_selection());
        }
        let widget = self
            .widget
            .with_selection(raw)
            .map_err(|reason| CoreError::InvalidParameterValue {
                name: self.info.name.to_string(),
                value: raw.join(","),
                reason,
            })?;
        Ok(Parameter {
            info: self.info.clone(),
            widget,
        })
    }

    /// Whether `raw` fits any option or bound record this parameter holds
    pub fn recognizes(&self, raw: &[String]) -> bool {
        self.widget.recognizes(raw)
    }

    /// Keep the still-valid part of `raw`, falling back to the default
    pub fn corrected_from(&self, raw: &[String]) -> Parameter {
        Parameter {
            info: self.info.clone(),
            widget: self.widget.corrected_from(raw),
        }
    }

    pub fn with_default_selection(&self) -> Parameter {
        Parameter {
            info: self.info.clone(),
            widget: self.widget.with_default_selection(),
        }
    }

    pub fn validate(&self) -> Validation {
        self.widget.validate()
    }

    /// Option ids this parameter contributes when filtering its children.
    ///
    /// `None` for scalar parameters.
    pub fn selected_option_ids(&self) -> Option<BTreeSet<String>> {
        match &self.widget {
            Widget::SingleSelect(w) => Some(id_set(w.selected_id())),
            Widget::MultiSelect(w) => Some(id_set(w.effective_ids())),
            _ => None,
        }
    }

    pub fn as_single_select(&self) -> Option<&SingleSelect> {
        match &self.widget {
            Widget::SingleSelect(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_multi_select(&self) -> Option<&MultiSelect> {
        match &self.widget {
            Widget::MultiSelect(w) => Some(w),
            _ => None,
        }
    }

    /// Field of the selected option of a single-select parameter
    pub fn selected_field(&self, field: &str) -> CoreResult<Value> {
        let option = self
            .as_single_select()
            .and_then(SingleSelect::selected_option)
            .ok_or_else(|| CoreError::UnknownOptionField {
                name: self.info.name.to_string(),
                option_id: String::new(),
                field: field.to_string(),
            })?;
        option.field(field).ok_or_else(|| CoreError::UnknownOptionField {
            name: self.info.name.to_string(),
            option_id: option.id().to_string(),
            field: field.to_string(),
        })
    }

    /// Selected ids of a multi-select, each quoted for SQL and joined by
    /// `", "`
    pub fn selected_ids_quoted_joined(&self) -> Option<String> {
        self.as_multi_select().map(|w| {
            w.effective_ids()
                .into_iter()
                .map(enquote)
                .collect::<Vec<_>>()
                .join(", ")
        })
    }
}

/// Quote a value as a SQL string literal
pub fn enquote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
#[path = "parameter_test.rs"]
mod tests;
