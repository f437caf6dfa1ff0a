//! Parameter configuration of a project (parameters.yml)

use crate::bounds::{
    parse_date, DateBounds, DateLimits, DateRangeBounds, NumberBounds, NumberRangeBounds,
    NumericRange, ScopedBounds, TextBounds, TextInputType, DATE_FORMAT,
};
use crate::dag::{DagNode, ParameterDag};
use crate::error::{CoreError, CoreResult};
use crate::names::{ConnectionName, ParameterName};
use crate::option::{OptionScope, ParameterOption};
use crate::parameter::{ParameterInfo, WidgetKind};
use crate::serde_helpers::default_true;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Top-level parameters document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParametersConfig {
    /// Cache sizing for the service holding this project
    #[serde(default)]
    pub settings: CacheSettings,

    /// Parameter specifications in declaration order
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

/// Bounds and lifetimes of the base-set and selection caches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Max number of projects whose base set is held
    #[serde(default = "default_base_cache_size")]
    pub base_cache_size: usize,

    /// Base set lifetime; `None` keeps it for the process lifetime
    #[serde(default)]
    pub base_cache_ttl_minutes: Option<u64>,

    /// Max number of resolved sets held
    #[serde(default = "default_selection_cache_size")]
    pub selection_cache_size: usize,

    /// Resolved set lifetime
    #[serde(default = "default_selection_cache_ttl_minutes")]
    pub selection_cache_ttl_minutes: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            base_cache_size: default_base_cache_size(),
            base_cache_ttl_minutes: None,
            selection_cache_size: default_selection_cache_size(),
            selection_cache_ttl_minutes: default_selection_cache_ttl_minutes(),
        }
    }
}

impl CacheSettings {
    pub fn base_cache_ttl(&self) -> Option<Duration> {
        self.base_cache_ttl_minutes.map(minutes)
    }

    pub fn selection_cache_ttl(&self) -> Option<Duration> {
        self.selection_cache_ttl_minutes.map(minutes)
    }
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(60))
}

fn default_base_cache_size() -> usize {
    16
}

fn default_selection_cache_size() -> usize {
    1024
}

fn default_selection_cache_ttl_minutes() -> Option<u64> {
    Some(60)
}

fn default_date_format() -> String {
    DATE_FORMAT.to_string()
}

fn default_increment() -> f64 {
    1.0
}

/// How a parameter is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactoryKind {
    /// Literal bounds and defaults, no scoping
    CreateSimple,
    /// Literal list of options, each with an optional scope
    CreateWithOptions,
    /// Options fetched through a named connection
    CreateFromSource,
}

/// One entry under `parameters:` before typed parsing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub widget_type: WidgetKind,
    pub factory: FactoryKind,
    #[serde(default)]
    pub arguments: serde_yaml::Value,
}

/// Arguments every parameter carries
#[derive(Debug, Deserialize)]
struct CommonArgs {
    name: String,
    label: Option<String>,
    #[serde(default)]
    description: String,
    parent_name: Option<String>,
    user_attribute: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MultiSelectArgs {
    #[serde(default = "default_true")]
    include_all: bool,
    #[serde(default)]
    order_matters: bool,
}

#[derive(Debug, Deserialize)]
struct TextArgs {
    #[serde(default)]
    input_type: TextInputType,
}

/// Access to the scope of any literal option record
pub trait OptionArgs {
    fn scope(&self) -> &OptionScope;
}

impl OptionArgs for ParameterOption {
    fn scope(&self) -> &OptionScope {
        ParameterOption::scope(self)
    }
}

/// A date option record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateOptionArgs {
    pub default_date: String,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(flatten)]
    pub scope: OptionScope,
}

/// A date range option record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeOptionArgs {
    pub default_start_date: String,
    pub default_end_date: String,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(flatten)]
    pub scope: OptionScope,
}

/// A number option record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberOptionArgs {
    pub min_value: f64,
    pub max_value: f64,
    #[serde(default = "default_increment")]
    pub increment: f64,
    pub default_value: Option<f64>,
    #[serde(flatten)]
    pub scope: OptionScope,
}

/// A number range option record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberRangeOptionArgs {
    pub min_value: f64,
    pub max_value: f64,
    #[serde(default = "default_increment")]
    pub increment: f64,
    pub default_lower_value: Option<f64>,
    pub default_upper_value: Option<f64>,
    #[serde(flatten)]
    pub scope: OptionScope,
}

/// A text option record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextOptionArgs {
    #[serde(default)]
    pub default_text: String,
    #[serde(flatten)]
    pub scope: OptionScope,
}

macro_rules! impl_option_args {
    ($($ty:ty),*) => {
        $(
            impl OptionArgs for $ty {
                fn scope(&self) -> &OptionScope {
                    &self.scope
                }
            }
        )*
    };
}

impl_option_args!(
    DateOptionArgs,
    DateRangeOptionArgs,
    NumberOptionArgs,
    NumberRangeOptionArgs,
    TextOptionArgs
);

fn optional_date(value: Option<&str>, format: &str) -> Result<Option<chrono::NaiveDate>, String> {
    value.map(|v| parse_date(v, format)).transpose()
}

impl DateOptionArgs {
    pub fn to_bounds(&self) -> Result<ScopedBounds<DateBounds>, String> {
        let fmt = self.date_format.as_str();
        let limits = DateLimits::new(
            optional_date(self.min_date.as_deref(), fmt)?,
            optional_date(self.max_date.as_deref(), fmt)?,
        )?;
        let bounds = DateBounds::new(parse_date(&self.default_date, fmt)?, limits)?;
        Ok(ScopedBounds::new(self.scope.clone(), bounds))
    }
}

impl DateRangeOptionArgs {
    pub fn to_bounds(&self) -> Result<ScopedBounds<DateRangeBounds>, String> {
        let fmt = self.date_format.as_str();
        let limits = DateLimits::new(
            optional_date(self.min_date.as_deref(), fmt)?,
            optional_date(self.max_date.as_deref(), fmt)?,
        )?;
        let bounds = DateRangeBounds::new(
            parse_date(&self.default_start_date, fmt)?,
            parse_date(&self.default_end_date, fmt)?,
            limits,
        )?;
        Ok(ScopedBounds::new(self.scope.clone(), bounds))
    }
}

impl NumberOptionArgs {
    pub fn to_bounds(&self) -> Result<ScopedBounds<NumberBounds>, String> {
        let range = NumericRange::new(self.min_value, self.max_value, self.increment)?;
        let bounds = NumberBounds::new(range, self.default_value)?;
        Ok(ScopedBounds::new(self.scope.clone(), bounds))
    }
}

impl NumberRangeOptionArgs {
    pub fn to_bounds(&self) -> Result<ScopedBounds<NumberRangeBounds>, String> {
        let range = NumericRange::new(self.min_value, self.max_value, self.increment)?;
        let bounds =
            NumberRangeBounds::new(range, self.default_lower_value, self.default_upper_value)?;
        Ok(ScopedBounds::new(self.scope.clone(), bounds))
    }
}

impl TextOptionArgs {
    pub fn to_bounds(&self, input_type: TextInputType) -> Result<ScopedBounds<TextBounds>, String> {
        let bounds = TextBounds::new(input_type, self.default_text.clone())?;
        Ok(ScopedBounds::new(self.scope.clone(), bounds))
    }
}

/// Where and how a source-driven parameter reads its rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Table name, or a literal `SELECT` query
    pub table_or_query: String,

    #[serde(default)]
    pub connection_name: ConnectionName,

    /// Column grouping rows into one option; each row is an option when unset
    pub id_col: Option<String>,

    /// Column holding the user group allowed to see the row
    pub user_group_col: Option<String>,

    /// Column holding the parent option id the row belongs under
    pub parent_id_col: Option<String>,
}

impl DataSourceConfig {
    /// The SQL to run; a bare table name is selected in full
    pub fn query(&self) -> String {
        let trimmed = self.table_or_query.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("select") || lowered.starts_with("with") {
            trimmed.to_string()
        } else {
            format!("SELECT * FROM {trimmed}")
        }
    }
}

/// Column mapping of select options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectColumns {
    /// Label column
    pub options_col: String,
    pub order_by_col: Option<String>,
    pub is_default_col: Option<String>,
    /// Custom field name to source column
    #[serde(default)]
    pub custom_cols: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateColumns {
    pub default_date_col: String,
    pub min_date_col: Option<String>,
    pub max_date_col: Option<String>,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeColumns {
    pub default_start_date_col: String,
    pub default_end_date_col: String,
    pub min_date_col: Option<String>,
    pub max_date_col: Option<String>,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberColumns {
    pub min_value_col: String,
    pub max_value_col: String,
    pub increment_col: Option<String>,
    pub default_value_col: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberRangeColumns {
    pub min_value_col: String,
    pub max_value_col: String,
    pub increment_col: Option<String>,
    pub default_lower_value_col: Option<String>,
    pub default_upper_value_col: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextColumns {
    pub default_text_col: Option<String>,
}

/// Data source plus the widget's column mapping
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec<C> {
    pub data_source: DataSourceConfig,
    pub columns: C,
}

/// Literal option records, or a query producing them
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsSource<T, C> {
    Literal(Vec<T>),
    Source(SourceSpec<C>),
}

impl<T, C> OptionsSource<T, C> {
    pub fn data_source(&self) -> Option<&DataSourceConfig> {
        match self {
            OptionsSource::Literal(_) => None,
            OptionsSource::Source(spec) => Some(&spec.data_source),
        }
    }
}

/// Typed widget arguments
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetSpec {
    SingleSelect(OptionsSource<ParameterOption, SelectColumns>),
    MultiSelect {
        include_all: bool,
        order_matters: bool,
        options: OptionsSource<ParameterOption, SelectColumns>,
    },
    Date(OptionsSource<DateOptionArgs, DateColumns>),
    DateRange(OptionsSource<DateRangeOptionArgs, DateRangeColumns>),
    Number(OptionsSource<NumberOptionArgs, NumberColumns>),
    NumberRange(OptionsSource<NumberRangeOptionArgs, NumberRangeColumns>),
    Text {
        input_type: TextInputType,
        options: OptionsSource<TextOptionArgs, TextColumns>,
    },
}

impl WidgetSpec {
    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetSpec::SingleSelect(_) => WidgetKind::SingleSelect,
            WidgetSpec::MultiSelect { .. } => WidgetKind::MultiSelect,
            WidgetSpec::Date(_) => WidgetKind::Date,
            WidgetSpec::DateRange(_) => WidgetKind::DateRange,
            WidgetSpec::Number(_) => WidgetKind::Number,
            WidgetSpec::NumberRange(_) => WidgetKind::NumberRange,
            WidgetSpec::Text { .. } => WidgetKind::Text,
        }
    }

    /// Data source to query, for `create_from_source` parameters
    pub fn data_source(&self) -> Option<&DataSourceConfig> {
        match self {
            WidgetSpec::SingleSelect(o) => o.data_source(),
            WidgetSpec::MultiSelect { options, .. } => options.data_source(),
            WidgetSpec::Date(o) => o.data_source(),
            WidgetSpec::DateRange(o) => o.data_source(),
            WidgetSpec::Number(o) => o.data_source(),
            WidgetSpec::NumberRange(o) => o.data_source(),
            WidgetSpec::Text { options, .. } => options.data_source(),
        }
    }
}

/// A fully parsed parameter specification
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterConfig {
    pub info: ParameterInfo,
    pub factory: FactoryKind,
    pub widget: WidgetSpec,
}

impl ParameterConfig {
    pub fn name(&self) -> &ParameterName {
        &self.info.name
    }

    pub fn kind(&self) -> WidgetKind {
        self.widget.kind()
    }
}

/// Reads typed values out of one parameter's `arguments` mapping
struct ArgsReader<'a> {
    name: &'a str,
    factory: FactoryKind,
    args: &'a serde_yaml::Value,
}

impl<'a> ArgsReader<'a> {
    fn read<T: DeserializeOwned>(&self, value: &serde_yaml::Value) -> CoreResult<T> {
        serde_yaml::from_value(value.clone())
            .map_err(|e| CoreError::invalid_config(self.name, e.to_string()))
    }

    fn required(&self, key: &str) -> CoreResult<&'a serde_yaml::Value> {
        self.args.get(key).ok_or_else(|| {
            CoreError::invalid_config(self.name, format!("missing required argument '{key}'"))
        })
    }

    /// `single_record` is true for scalar widgets, whose `create_simple`
    /// arguments describe one record at the top level.
    fn options<T, C>(&self, single_record: bool) -> CoreResult<OptionsSource<T, C>>
    where
        T: OptionArgs + DeserializeOwned,
        C: DeserializeOwned,
    {
        let options: Vec<T> = match self.factory {
            FactoryKind::CreateFromSource => {
                let data_source = self.required("data_source")?;
                return Ok(OptionsSource::Source(SourceSpec {
                    data_source: self.read(data_source)?,
                    columns: self.read(data_source)?,
                }));
            }
            FactoryKind::CreateSimple if single_record => vec![self.read(self.args)?],
            FactoryKind::CreateSimple | FactoryKind::CreateWithOptions => {
                self.read(self.required("options")?)?
            }
        };

        if options.is_empty() {
            return Err(CoreError::invalid_config(
                self.name,
                "at least one option is required",
            ));
        }
        if self.factory == FactoryKind::CreateSimple
            && options.iter().any(|o| !o.scope().is_unrestricted())
        {
            return Err(CoreError::invalid_config(
                self.name,
                "create_simple options cannot have user_groups or parent_option_ids",
            ));
        }
        Ok(OptionsSource::Literal(options))
    }

    fn select_options(&self) -> CoreResult<OptionsSource<ParameterOption, SelectColumns>> {
        let options = self.options::<ParameterOption, SelectColumns>(false)?;
        if let Some(source) = options.data_source() {
            if source.id_col.is_none() {
                return Err(CoreError::invalid_config(
                    self.name,
                    "id_col is required for select parameters",
                ));
            }
        }
        Ok(options)
    }
}

impl ParameterSpec {
    /// Parse the `arguments` mapping into a typed configuration
    pub fn to_config(&self) -> CoreResult<ParameterConfig> {
        let common: CommonArgs =
            serde_yaml::from_value(self.arguments.clone()).map_err(|e| {
                CoreError::ConfigParseError {
                    message: format!("invalid {} parameter arguments: {e}", self.widget_type),
                }
            })?;
        let name = ParameterName::new(common.name)?;

        if self.factory == FactoryKind::CreateSimple
            && (common.parent_name.is_some() || common.user_attribute.is_some())
        {
            return Err(CoreError::invalid_config(
                &name,
                "create_simple parameters cannot have parent_name or user_attribute",
            ));
        }

        let parent_name = match common.parent_name {
            Some(parent) => Some(ParameterName::new(parent).map_err(|_| CoreError::EmptyName {
                context: format!("parent_name of '{name}'"),
            })?),
            None => None,
        };

        let reader = ArgsReader {
            name: name.as_str(),
            factory: self.factory,
            args: &self.arguments,
        };

        let widget = match self.widget_type {
            WidgetKind::SingleSelect => WidgetSpec::SingleSelect(reader.select_options()?),
            WidgetKind::MultiSelect => {
                let args: MultiSelectArgs = reader.read(&self.arguments)?;
                WidgetSpec::MultiSelect {
                    include_all: args.include_all,
                    order_matters: args.order_matters,
                    options: reader.select_options()?,
                }
            }
            WidgetKind::Date => WidgetSpec::Date(reader.options(true)?),
            WidgetKind::DateRange => WidgetSpec::DateRange(reader.options(true)?),
            WidgetKind::Number => WidgetSpec::Number(reader.options(true)?),
            WidgetKind::NumberRange => WidgetSpec::NumberRange(reader.options(true)?),
            WidgetKind::Text => {
                let args: TextArgs = reader.read(&self.arguments)?;
                WidgetSpec::Text {
                    input_type: args.input_type,
                    options: reader.options(true)?,
                }
            }
        };

        let label = common.label.unwrap_or_else(|| name.to_string());
        let mut info = ParameterInfo::new(name, label).with_description(common.description);
        info.parent_name = parent_name;
        info.user_attribute = common.user_attribute;

        Ok(ParameterConfig {
            info,
            factory: self.factory,
            widget,
        })
    }
}

impl ParametersConfig {
    /// Parse a parameters document
    pub fn from_yaml_str(content: &str) -> CoreResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a parameters document from disk
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse every parameter and check the relationships between them.
    ///
    /// Runs before any data source is queried, so duplicate names, unknown
    /// or ill-typed parents and cycles fail project load without I/O.
    pub fn parameter_configs(&self) -> CoreResult<Vec<ParameterConfig>> {
        let configs = self
            .parameters
            .iter()
            .map(ParameterSpec::to_config)
            .collect::<CoreResult<Vec<_>>>()?;

        let nodes: Vec<DagNode<'_>> = configs
            .iter()
            .map(|c| DagNode {
                name: c.name(),
                kind: c.kind(),
                parent: c.info.parent_name.as_ref(),
            })
            .collect();
        ParameterDag::build(&nodes)?;

        Ok(configs)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
