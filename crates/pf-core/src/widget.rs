//! Widget variants and the capability methods they share.
//!
//! Every method that changes a selection returns a new widget; nothing here
//! mutates in place, so a base parameter set can be shared across requests.

use crate::bounds::{
    Bounds, DateBounds, DateRangeBounds, NumberBounds, NumberRangeBounds, ScopedBounds, TextBounds,
};
use crate::option::{OptionFilter, ParameterOption};
use crate::selection::{parse_list, single_value};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

/// Outcome of checking a widget's current selection against its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The selection is valid
    Valid,
    /// The selection no longer fits; the widget's default applies instead
    CorrectedToDefault { reason: String },
    /// There is nothing valid to select at all
    Invalid { reason: String },
}

/// Capability set implemented by each widget variant.
pub(crate) trait WidgetOps: Sized {
    /// Keep only options or records passing `filter`, selection reset to the
    /// default. `None` when nothing survives.
    fn narrowed(&self, filter: &OptionFilter<'_>) -> Option<Self>;

    /// Parse and apply raw values against the current options or bounds
    fn with_selection(&self, raw: &[String]) -> Result<Self, String>;

    /// Whether raw values would be accepted by any option or record held
    fn recognizes(&self, raw: &[String]) -> bool;

    /// Keep what is still selectable from `raw`, default otherwise
    fn corrected_from(&self, raw: &[String]) -> Self;

    fn with_default_selection(&self) -> Self;

    fn validate(&self) -> Validation;
}

/// Reject option lists that reuse an id
pub fn check_unique_ids(options: &[ParameterOption]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for option in options {
        if !seen.insert(option.id()) {
            return Err(format!("option id \"{}\" is used more than once", option.id()));
        }
    }
    Ok(())
}

fn narrowed_options(
    options: &[ParameterOption],
    filter: &OptionFilter<'_>,
) -> Option<Vec<ParameterOption>> {
    let kept: Vec<ParameterOption> = options
        .iter()
        .filter(|o| o.scope().allows(filter))
        .cloned()
        .collect();
    (!kept.is_empty()).then_some(kept)
}

// ── Single select ──────────────────────────────────────────────────────

/// A parameter where exactly one option is selected.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleSelect {
    options: Vec<ParameterOption>,
    selected_id: Option<String>,
}

impl SingleSelect {
    pub fn new(options: Vec<ParameterOption>) -> Result<Self, String> {
        check_unique_ids(&options)?;
        Ok(Self::with_default(options))
    }

    fn with_default(options: Vec<ParameterOption>) -> Self {
        let selected_id = options
            .iter()
            .find(|o| o.is_default())
            .or_else(|| options.first())
            .map(|o| o.id().to_string());
        Self {
            options,
            selected_id,
        }
    }

    pub fn options(&self) -> &[ParameterOption] {
        &self.options
    }

    fn find(&self, id: &str) -> Option<&ParameterOption> {
        self.options.iter().find(|o| o.id() == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected_option(&self) -> Option<&ParameterOption> {
        self.selected_id.as_deref().and_then(|id| self.find(id))
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.selected_option().map(ParameterOption::label)
    }

    /// Field of the selected option, `None` if unselected or absent
    pub fn selected_field(&self, field: &str) -> Option<Value> {
        self.selected_option().and_then(|o| o.field(field))
    }
}

impl WidgetOps for SingleSelect {
    fn narrowed(&self, filter: &OptionFilter<'_>) -> Option<Self> {
        narrowed_options(&self.options, filter).map(Self::with_default)
    }

    fn with_selection(&self, raw: &[String]) -> Result<Self, String> {
        let id = single_value(raw)?;
        if self.find(id).is_none() {
            return Err(format!("\"{id}\" is not a valid option id"));
        }
        Ok(Self {
            options: self.options.clone(),
            selected_id: Some(id.to_string()),
        })
    }

    fn recognizes(&self, raw: &[String]) -> bool {
        self.with_selection(raw).is_ok()
    }

    fn corrected_from(&self, _raw: &[String]) -> Self {
        self.with_default_selection()
    }

    fn with_default_selection(&self) -> Self {
        Self::with_default(self.options.clone())
    }

    fn validate(&self) -> Validation {
        if self.options.is_empty() {
            return Validation::Invalid {
                reason: "no options are available".into(),
            };
        }
        match self.selected_id.as_deref() {
            None => Validation::CorrectedToDefault {
                reason: "no option is selected".into(),
            },
            Some(id) if self.find(id).is_none() => Validation::CorrectedToDefault {
                reason: format!("selected id \"{id}\" is not among the available options"),
            },
            Some(_) => Validation::Valid,
        }
    }
}

// ── Multi select ───────────────────────────────────────────────────────

/// A parameter where any number of options may be selected.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiSelect {
    options: Vec<ParameterOption>,
    selected_ids: Vec<String>,
    include_all: bool,
    order_matters: bool,
}

impl MultiSelect {
    pub fn new(
        options: Vec<ParameterOption>,
        include_all: bool,
        order_matters: bool,
    ) -> Result<Self, String> {
        check_unique_ids(&options)?;
        Ok(Self::with_default(options, include_all, order_matters))
    }

    fn with_default(options: Vec<ParameterOption>, include_all: bool, order_matters: bool) -> Self {
        let selected_ids = options
            .iter()
            .filter(|o| o.is_default())
            .map(|o| o.id().to_string())
            .collect();
        Self {
            options,
            selected_ids,
            include_all,
            order_matters,
        }
    }

    pub fn options(&self) -> &[ParameterOption] {
        &self.options
    }

    pub fn include_all(&self) -> bool {
        self.include_all
    }

    pub fn order_matters(&self) -> bool {
        self.order_matters
    }

    /// Ids as selected, possibly empty
    pub fn selected_ids(&self) -> &[String] {
        &self.selected_ids
    }

    /// Selected options; an empty selection with `include_all` means all
    pub fn selected_options(&self) -> Vec<&ParameterOption> {
        if self.selected_ids.is_empty() && self.include_all {
            return self.options.iter().collect();
        }
        self.selected_ids
            .iter()
            .filter_map(|id| self.options.iter().find(|o| o.id() == id))
            .collect()
    }

    /// Ids of [`selected_options`](Self::selected_options)
    pub fn effective_ids(&self) -> Vec<&str> {
        self.selected_options().into_iter().map(ParameterOption::id).collect()
    }

    fn known(&self, id: &str) -> bool {
        self.options.iter().any(|o| o.id() == id)
    }

    fn ordered(&self, mut ids: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        ids.retain(|id| seen.insert(id.clone()));
        if !self.order_matters {
            ids = self
                .options
                .iter()
                .map(|o| o.id().to_string())
                .filter(|id| seen.contains(id))
                .collect();
        }
        ids
    }

    fn selecting(&self, ids: Vec<String>) -> Self {
        Self {
            options: self.options.clone(),
            selected_ids: self.ordered(ids),
            include_all: self.include_all,
            order_matters: self.order_matters,
        }
    }
}

impl WidgetOps for MultiSelect {
    fn narrowed(&self, filter: &OptionFilter<'_>) -> Option<Self> {
        narrowed_options(&self.options, filter)
            .map(|options| Self::with_default(options, self.include_all, self.order_matters))
    }

    fn with_selection(&self, raw: &[String]) -> Result<Self, String> {
        let ids = parse_list(raw);
        if let Some(unknown) = ids.iter().find(|id| !self.known(id)) {
            return Err(format!("\"{unknown}\" is not a valid option id"));
        }
        Ok(self.selecting(ids))
    }

    fn recognizes(&self, raw: &[String]) -> bool {
        self.with_selection(raw).is_ok()
    }

    fn corrected_from(&self, raw: &[String]) -> Self {
        let kept: Vec<String> = parse_list(raw).into_iter().filter(|id| self.known(id)).collect();
        if kept.is_empty() {
            return self.with_default_selection();
        }
        self.selecting(kept)
    }

    fn with_default_selection(&self) -> Self {
        Self::with_default(self.options.clone(), self.include_all, self.order_matters)
    }

    fn validate(&self) -> Validation {
        if self.options.is_empty() {
            return Validation::Invalid {
                reason: "no options are available".into(),
            };
        }
        match self.selected_ids.iter().find(|id| !self.known(id)) {
            Some(id) => Validation::CorrectedToDefault {
                reason: format!("selected id \"{id}\" is not among the available options"),
            },
            None => Validation::Valid,
        }
    }
}

// ── Scalars ────────────────────────────────────────────────────────────

/// A date, number or text parameter whose bounds may vary by scope.
///
/// The first record is the one in effect; earlier narrowing removes the
/// records hidden from the user or not matching the parent selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarWidget<B: Bounds> {
    records: Vec<ScopedBounds<B>>,
    selected: Option<B::Value>,
}

pub type DateWidget = ScalarWidget<DateBounds>;
pub type DateRangeWidget = ScalarWidget<DateRangeBounds>;
pub type NumberWidget = ScalarWidget<NumberBounds>;
pub type NumberRangeWidget = ScalarWidget<NumberRangeBounds>;
pub type TextWidget = ScalarWidget<TextBounds>;

impl<B: Bounds> ScalarWidget<B> {
    pub fn new(records: Vec<ScopedBounds<B>>) -> Self {
        let selected = records.first().map(|r| r.bounds.default_value());
        Self { records, selected }
    }

    pub fn records(&self) -> &[ScopedBounds<B>] {
        &self.records
    }

    /// Bounds in effect
    pub fn current(&self) -> Option<&B> {
        self.records.first().map(|r| &r.bounds)
    }

    pub fn selected(&self) -> Option<&B::Value> {
        self.selected.as_ref()
    }
}

impl<B: Bounds> WidgetOps for ScalarWidget<B> {
    fn narrowed(&self, filter: &OptionFilter<'_>) -> Option<Self> {
        let kept: Vec<ScopedBounds<B>> = self
            .records
            .iter()
            .filter(|r| r.scope.allows(filter))
            .cloned()
            .collect();
        (!kept.is_empty()).then(|| Self::new(kept))
    }

    fn with_selection(&self, raw: &[String]) -> Result<Self, String> {
        let bounds = self
            .current()
            .ok_or_else(|| "no bounds are available".to_string())?;
        let value = bounds.parse(raw)?;
        Ok(Self {
            records: self.records.clone(),
            selected: Some(value),
        })
    }

    fn recognizes(&self, raw: &[String]) -> bool {
        self.records.iter().any(|r| r.bounds.parse(raw).is_ok())
    }

    fn corrected_from(&self, _raw: &[String]) -> Self {
        self.with_default_selection()
    }

    fn with_default_selection(&self) -> Self {
        Self::new(self.records.clone())
    }

    fn validate(&self) -> Validation {
        let Some(bounds) = self.current() else {
            return Validation::Invalid {
                reason: "no bounds are available".into(),
            };
        };
        match &self.selected {
            None => Validation::CorrectedToDefault {
                reason: "no value is selected".into(),
            },
            Some(value) => match bounds.check(value) {
                Ok(()) => Validation::Valid,
                Err(reason) => Validation::CorrectedToDefault { reason },
            },
        }
    }
}

impl DateWidget {
    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected
    }
}

impl DateRangeWidget {
    pub fn selected_start_date(&self) -> Option<NaiveDate> {
        self.selected.map(|(start, _)| start)
    }

    pub fn selected_end_date(&self) -> Option<NaiveDate> {
        self.selected.map(|(_, end)| end)
    }
}

impl NumberWidget {
    pub fn selected_value(&self) -> Option<f64> {
        self.selected
    }
}

impl NumberRangeWidget {
    pub fn selected_lower_value(&self) -> Option<f64> {
        self.selected.map(|(lower, _)| lower)
    }

    pub fn selected_upper_value(&self) -> Option<f64> {
        self.selected.map(|(_, upper)| upper)
    }
}

impl TextWidget {
    pub fn selected_text(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}

/// Ids a select widget contributes when filtering its children
pub(crate) fn id_set<'a>(ids: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    ids.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
#[path = "widget_test.rs"]
mod tests;
