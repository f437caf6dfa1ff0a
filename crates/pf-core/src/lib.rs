//! pf-core - Core library for Paramflow
//!
//! This crate provides the parameter model (options, scalar bounds and the
//! `Parameter` tagged union), parameter configuration parsing, the
//! parent/child dependency DAG, and the pure cascading resolver that turns a
//! base parameter set plus a raw selection into a resolved set.

pub mod bounds;
pub mod config;
pub mod dag;
pub mod error;
pub mod names;
pub mod option;
pub mod parameter;
pub mod parameter_set;
pub mod resolver;
pub mod response;
pub mod selection;
pub(crate) mod serde_helpers;
pub mod user;
pub mod widget;

pub use bounds::{
    Bounds, DateBounds, DateLimits, DateRangeBounds, NumberBounds, NumberRangeBounds,
    NumericRange, ScopedBounds, TextBounds, TextInputType,
};
pub use config::{
    CacheSettings, DataSourceConfig, FactoryKind, OptionsSource, ParameterConfig, ParameterSpec,
    ParametersConfig, SourceSpec, WidgetSpec,
};
pub use dag::ParameterDag;
pub use error::{CoreError, CoreResult};
pub use names::{ConnectionName, ParameterName, DEFAULT_CONNECTION};
pub use option::{OptionFilter, OptionScope, ParameterOption};
pub use parameter::{enquote, Parameter, ParameterInfo, Widget, WidgetKind};
pub use parameter_set::{BaseParameterSet, ParameterSet};
pub use resolver::{
    resolve, resolve_scoped, resolve_with_report, Resolution, ResolveScope, StaleSelection,
};
pub use response::{ParameterModel, ParametersResponse};
pub use selection::RawSelection;
pub use user::UserAttributes;
pub use widget::{
    DateRangeWidget, DateWidget, MultiSelect, NumberRangeWidget, NumberWidget, ScalarWidget,
    SingleSelect, TextWidget, Validation,
};
