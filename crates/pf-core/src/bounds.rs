//! Bounds and defaults of scalar parameters (dates, numbers, text).
//!
//! A scalar parameter holds a list of [`ScopedBounds`]; the first record
//! that survives user-group and parent filtering is the one in effect.

use crate::option::OptionScope;
use crate::selection::{pair_values, single_value, untrimmed_single_value};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::OnceLock;

/// ISO format accepted for raw date selections
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Tolerance used when checking increment alignment of numbers
const EPSILON: f64 = 1e-9;

/// Shared behaviour of the scalar bound records.
pub trait Bounds: Clone + PartialEq + Debug {
    /// Selected value type
    type Value: Clone + PartialEq + Debug;

    /// Value selected when the request does not choose one
    fn default_value(&self) -> Self::Value;

    /// Parse and check raw values, returning the reason on failure
    fn parse(&self, raw: &[String]) -> Result<Self::Value, String>;

    /// Whether an already-typed value fits these bounds
    fn check(&self, value: &Self::Value) -> Result<(), String>;
}

/// A bound record together with the scope that gates it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedBounds<B> {
    pub scope: OptionScope,
    pub bounds: B,
}

impl<B> ScopedBounds<B> {
    pub fn new(scope: OptionScope, bounds: B) -> Self {
        Self { scope, bounds }
    }

    /// A record visible to everyone regardless of parent selection
    pub fn unrestricted(bounds: B) -> Self {
        Self::new(OptionScope::unrestricted(), bounds)
    }
}

/// Parse a date using a strftime-style format
pub fn parse_date(value: &str, format: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), format)
        .map_err(|_| format!("\"{value}\" is not a date in format {format}"))
}

fn parse_number(value: &str) -> Result<f64, String> {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(format!("\"{value}\" is not a number")),
    }
}

// ── Dates ──────────────────────────────────────────────────────────────

/// Optional lower and upper date limits
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DateLimits {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

impl DateLimits {
    pub fn new(min_date: Option<NaiveDate>, max_date: Option<NaiveDate>) -> Result<Self, String> {
        if let (Some(min), Some(max)) = (min_date, max_date) {
            if min > max {
                return Err(format!(
                    "min_date \"{min}\" must be less than or equal to max_date \"{max}\""
                ));
            }
        }
        Ok(Self { min_date, max_date })
    }

    fn check(&self, date: NaiveDate) -> Result<(), String> {
        if let Some(min) = self.min_date {
            if date < min {
                return Err(format!("date \"{date}\" is before the min date \"{min}\""));
            }
        }
        if let Some(max) = self.max_date {
            if date > max {
                return Err(format!("date \"{date}\" is after the max date \"{max}\""));
            }
        }
        Ok(())
    }
}

/// Bounds of a single date parameter
#[derive(Debug, Clone, PartialEq)]
pub struct DateBounds {
    pub limits: DateLimits,
    pub default_date: NaiveDate,
}

impl DateBounds {
    pub fn new(default_date: NaiveDate, limits: DateLimits) -> Result<Self, String> {
        limits.check(default_date)?;
        Ok(Self {
            limits,
            default_date,
        })
    }
}

impl Bounds for DateBounds {
    type Value = NaiveDate;

    fn default_value(&self) -> NaiveDate {
        self.default_date
    }

    fn parse(&self, raw: &[String]) -> Result<NaiveDate, String> {
        let date = parse_date(single_value(raw)?, DATE_FORMAT)?;
        self.check(&date)?;
        Ok(date)
    }

    fn check(&self, value: &NaiveDate) -> Result<(), String> {
        self.limits.check(*value)
    }
}

/// Bounds of a date range parameter
#[derive(Debug, Clone, PartialEq)]
pub struct DateRangeBounds {
    pub limits: DateLimits,
    pub default_start_date: NaiveDate,
    pub default_end_date: NaiveDate,
}

impl DateRangeBounds {
    pub fn new(
        default_start_date: NaiveDate,
        default_end_date: NaiveDate,
        limits: DateLimits,
    ) -> Result<Self, String> {
        let bounds = Self {
            limits,
            default_start_date,
            default_end_date,
        };
        bounds.check(&(default_start_date, default_end_date))?;
        Ok(bounds)
    }
}

impl Bounds for DateRangeBounds {
    type Value = (NaiveDate, NaiveDate);

    fn default_value(&self) -> Self::Value {
        (self.default_start_date, self.default_end_date)
    }

    fn parse(&self, raw: &[String]) -> Result<Self::Value, String> {
        let (start, end) = pair_values(raw)?;
        let value = (parse_date(&start, DATE_FORMAT)?, parse_date(&end, DATE_FORMAT)?);
        self.check(&value)?;
        Ok(value)
    }

    fn check(&self, (start, end): &Self::Value) -> Result<(), String> {
        if start > end {
            return Err(format!(
                "start date \"{start}\" must be less than or equal to end date \"{end}\""
            ));
        }
        self.limits.check(*start)?;
        self.limits.check(*end)
    }
}

// ── Numbers ────────────────────────────────────────────────────────────

/// Closed numeric interval stepped by `increment`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min_value: f64,
    pub max_value: f64,
    pub increment: f64,
}

impl NumericRange {
    pub fn new(min_value: f64, max_value: f64, increment: f64) -> Result<Self, String> {
        if !(min_value.is_finite() && max_value.is_finite() && increment.is_finite()) {
            return Err("min_value, max_value and increment must be finite numbers".into());
        }
        if increment <= 0.0 {
            return Err(format!("increment \"{increment}\" must be positive"));
        }
        if min_value > max_value {
            return Err(format!(
                "min_value \"{min_value}\" must be less than or equal to max_value \"{max_value}\""
            ));
        }
        let range = Self {
            min_value,
            max_value,
            increment,
        };
        if !range.is_aligned(max_value) {
            return Err(format!(
                "increment \"{increment}\" must fit evenly between min_value \"{min_value}\" and max_value \"{max_value}\""
            ));
        }
        Ok(range)
    }

    fn is_aligned(&self, value: f64) -> bool {
        let steps = (value - self.min_value) / self.increment;
        let tolerance = EPSILON * self.increment.abs().max(1.0);
        steps >= -EPSILON && ((steps.round() * self.increment) - (value - self.min_value)).abs() <= tolerance
    }

    /// Reject values outside `[min, max]` or off the increment grid
    pub fn check(&self, value: f64) -> Result<(), String> {
        if value < self.min_value || value > self.max_value {
            return Err(format!(
                "value \"{value}\" is outside of bounds \"{}\" and \"{}\"",
                self.min_value, self.max_value
            ));
        }
        if !self.is_aligned(value) {
            return Err(format!(
                "difference between value \"{value}\" and min_value \"{}\" must be a multiple of increment \"{}\"",
                self.min_value, self.increment
            ));
        }
        Ok(())
    }

    /// Midpoint of the range, snapped down onto the increment grid
    pub fn midpoint(&self) -> f64 {
        let half_steps = ((self.max_value - self.min_value) / 2.0 / self.increment).floor();
        self.min_value + half_steps * self.increment
    }
}

/// Bounds of a number parameter
#[derive(Debug, Clone, PartialEq)]
pub struct NumberBounds {
    pub range: NumericRange,
    pub default_value: f64,
}

impl NumberBounds {
    /// Without an explicit default the snapped midpoint is used
    pub fn new(range: NumericRange, default_value: Option<f64>) -> Result<Self, String> {
        let default_value = default_value.unwrap_or_else(|| range.midpoint());
        range.check(default_value)?;
        Ok(Self {
            range,
            default_value,
        })
    }
}

impl Bounds for NumberBounds {
    type Value = f64;

    fn default_value(&self) -> f64 {
        self.default_value
    }

    fn parse(&self, raw: &[String]) -> Result<f64, String> {
        let value = parse_number(single_value(raw)?)?;
        self.check(&value)?;
        Ok(value)
    }

    fn check(&self, value: &f64) -> Result<(), String> {
        self.range.check(*value)
    }
}

/// Bounds of a number range parameter
#[derive(Debug, Clone, PartialEq)]
pub struct NumberRangeBounds {
    pub range: NumericRange,
    pub default_lower_value: f64,
    pub default_upper_value: f64,
}

impl NumberRangeBounds {
    /// Missing defaults span the whole range
    pub fn new(
        range: NumericRange,
        default_lower_value: Option<f64>,
        default_upper_value: Option<f64>,
    ) -> Result<Self, String> {
        let bounds = Self {
            range,
            default_lower_value: default_lower_value.unwrap_or(range.min_value),
            default_upper_value: default_upper_value.unwrap_or(range.max_value),
        };
        bounds.check(&bounds.default_value())?;
        Ok(bounds)
    }
}

impl Bounds for NumberRangeBounds {
    type Value = (f64, f64);

    fn default_value(&self) -> (f64, f64) {
        (self.default_lower_value, self.default_upper_value)
    }

    fn parse(&self, raw: &[String]) -> Result<(f64, f64), String> {
        let (lower, upper) = pair_values(raw)?;
        let value = (parse_number(&lower)?, parse_number(&upper)?);
        self.check(&value)?;
        Ok(value)
    }

    fn check(&self, (lower, upper): &(f64, f64)) -> Result<(), String> {
        if lower > upper {
            return Err(format!(
                "lower value \"{lower}\" must be less than or equal to upper value \"{upper}\""
            ));
        }
        self.range.check(*lower)?;
        self.range.check(*upper)
    }
}

// ── Text ───────────────────────────────────────────────────────────────

/// HTML input type used to render and validate a text parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextInputType {
    #[default]
    Text,
    Textarea,
    Number,
    Date,
    DatetimeLocal,
    Month,
    Time,
    Color,
    Password,
}

static COLOR_RE: OnceLock<Regex> = OnceLock::new();

fn color_regex() -> &'static Regex {
    COLOR_RE.get_or_init(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid regex"))
}

impl TextInputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextInputType::Text => "text",
            TextInputType::Textarea => "textarea",
            TextInputType::Number => "number",
            TextInputType::Date => "date",
            TextInputType::DatetimeLocal => "datetime-local",
            TextInputType::Month => "month",
            TextInputType::Time => "time",
            TextInputType::Color => "color",
            TextInputType::Password => "password",
        }
    }

    /// Check that entered text fits the input type
    /// Free-form input is kept exactly as entered
    pub fn is_free_form(&self) -> bool {
        matches!(
            self,
            TextInputType::Text | TextInputType::Textarea | TextInputType::Password
        )
    }

    pub fn validate(&self, text: &str) -> Result<(), String> {
        let ok = match self {
            TextInputType::Text | TextInputType::Textarea | TextInputType::Password => true,
            TextInputType::Number => parse_number(text).is_ok(),
            TextInputType::Date => NaiveDate::parse_from_str(text, DATE_FORMAT).is_ok(),
            TextInputType::DatetimeLocal => {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M").is_ok()
            }
            TextInputType::Month => {
                NaiveDate::parse_from_str(&format!("{text}-01"), DATE_FORMAT).is_ok()
            }
            TextInputType::Time => NaiveTime::parse_from_str(text, "%H:%M").is_ok(),
            TextInputType::Color => color_regex().is_match(text),
        };
        if ok {
            Ok(())
        } else {
            Err(format!("text \"{text}\" is not a valid {} input", self.as_str()))
        }
    }
}

/// Default text of a text parameter
#[derive(Debug, Clone, PartialEq)]
pub struct TextBounds {
    pub input_type: TextInputType,
    pub default_text: String,
}

impl TextBounds {
    pub fn new(input_type: TextInputType, default_text: impl Into<String>) -> Result<Self, String> {
        let default_text = default_text.into();
        if !default_text.is_empty() {
            input_type.validate(&default_text)?;
        }
        Ok(Self {
            input_type,
            default_text,
        })
    }
}

impl Bounds for TextBounds {
    type Value = String;

    fn default_value(&self) -> String {
        self.default_text.clone()
    }

    fn parse(&self, raw: &[String]) -> Result<String, String> {
        let text = if self.input_type.is_free_form() {
            untrimmed_single_value(raw)?
        } else {
            single_value(raw)?
        };
        let text = text.to_string();
        self.check(&text)?;
        Ok(text)
    }

    fn check(&self, value: &String) -> Result<(), String> {
        if value.is_empty() {
            return Ok(());
        }
        self.input_type.validate(value)
    }
}

#[cfg(test)]
#[path = "bounds_test.rs"]
mod tests;
