//! Parameter factory.
//!
//! `create_simple` and `create_with_options` parameters are built from their
//! literal configuration. `create_from_source` parameters run one query
//! through the connection provider and map its columns onto option records.

pub(crate) mod source;

use crate::error::{EngineError, EngineResult};
use pf_core::bounds::ScopedBounds;
use pf_core::{
    CoreError, DateRangeWidget, DateWidget, MultiSelect, NumberRangeWidget, NumberWidget,
    OptionsSource, Parameter, ParameterConfig, ParameterOption, SingleSelect, TextWidget, Widget,
    WidgetSpec,
};
use pf_db::ConnectionProvider;

/// Build one parameter with its default selection.
///
/// Literal options are validated as configuration; values read from a data
/// source are reported as [`EngineError::InvalidSourceValue`].
pub async fn build_parameter(
    config: &ParameterConfig,
    provider: &dyn ConnectionProvider,
) -> EngineResult<Parameter> {
    let name = config.name().as_str();
    let reject = |message: String| match config.widget.data_source() {
        Some(_) => EngineError::InvalidSourceValue {
            parameter: name.to_string(),
            message,
        },
        None => EngineError::Core(CoreError::ConfigInvalid {
            parameter: name.to_string(),
            message,
        }),
    };

    let widget: Widget = match &config.widget {
        WidgetSpec::SingleSelect(options) => {
            let options = select_options(name, options, provider).await?;
            SingleSelect::new(options).map_err(reject)?.into()
        }
        WidgetSpec::MultiSelect {
            include_all,
            order_matters,
            options,
        } => {
            let options = select_options(name, options, provider).await?;
            MultiSelect::new(options, *include_all, *order_matters)
                .map_err(reject)?
                .into()
        }
        WidgetSpec::Date(options) => {
            let records = match options {
                OptionsSource::Literal(records) => records.clone(),
                OptionsSource::Source(spec) => source::date_records(name, spec, provider).await?,
            };
            DateWidget::new(to_bounds(&records, |r| r.to_bounds()).map_err(reject)?).into()
        }
        WidgetSpec::DateRange(options) => {
            let records = match options {
                OptionsSource::Literal(records) => records.clone(),
                OptionsSource::Source(spec) => {
                    source::date_range_records(name, spec, provider).await?
                }
            };
            DateRangeWidget::new(to_bounds(&records, |r| r.to_bounds()).map_err(reject)?).into()
        }
        WidgetSpec::Number(options) => {
            let records = match options {
                OptionsSource::Literal(records) => records.clone(),
                OptionsSource::Source(spec) => source::number_records(name, spec, provider).await?,
            };
            NumberWidget::new(to_bounds(&records, |r| r.to_bounds()).map_err(reject)?).into()
        }
        WidgetSpec::NumberRange(options) => {
            let records = match options {
                OptionsSource::Literal(records) => records.clone(),
                OptionsSource::Source(spec) => {
                    source::number_range_records(name, spec, provider).await?
                }
            };
            NumberRangeWidget::new(to_bounds(&records, |r| r.to_bounds()).map_err(reject)?).into()
        }
        WidgetSpec::Text {
            input_type,
            options,
        } => {
            let records = match options {
                OptionsSource::Literal(records) => records.clone(),
                OptionsSource::Source(spec) => source::text_records(name, spec, provider).await?,
            };
            TextWidget::new(to_bounds(&records, |r| r.to_bounds(*input_type)).map_err(reject)?)
                .into()
        }
    };

    Ok(Parameter::new(config.info.clone(), widget))
}

async fn select_options(
    name: &str,
    options: &OptionsSource<ParameterOption, pf_core::config::SelectColumns>,
    provider: &dyn ConnectionProvider,
) -> EngineResult<Vec<ParameterOption>> {
    match options {
        OptionsSource::Literal(options) => Ok(options.clone()),
        OptionsSource::Source(spec) => source::select_options(name, spec, provider).await,
    }
}

fn to_bounds<T, B>(
    records: &[T],
    convert: impl Fn(&T) -> Result<ScopedBounds<B>, String>,
) -> Result<Vec<ScopedBounds<B>>, String> {
    records.iter().map(convert).collect()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
