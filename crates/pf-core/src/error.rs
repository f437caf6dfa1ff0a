//! Error types for pf-core

use thiserror::Error;

/// Core error type for Paramflow
#[derive(Error, Debug)]
pub enum CoreError {
    /// P001: Failed to parse the parameters configuration
    #[error("[P001] Failed to parse parameters config: {message}")]
    ConfigParseError { message: String },

    /// P002: Invalid parameter configuration
    #[error("[P002] Invalid config for parameter '{parameter}': {message}")]
    ConfigInvalid { parameter: String, message: String },

    /// P003: Two parameters share a name
    #[error("[P003] Duplicate parameter name: {name}")]
    DuplicateParameter { name: String },

    /// P004: Parent parameter does not exist
    #[error("[P004] Parameter '{name}' references unknown parent '{parent}'")]
    UnknownParent { name: String, parent: String },

    /// P005: Parent parameter has the wrong widget type
    #[error("[P005] Parameter '{parent}' cannot be the parent of '{name}': {reason}")]
    InvalidParent {
        name: String,
        parent: String,
        reason: String,
    },

    /// P006: Circular dependency between parameters
    #[error("[P006] Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// P007: Selected value rejected for a parameter
    #[error("[P007] Selected value \"{value}\" is not valid for parameter '{name}': {reason}")]
    InvalidParameterValue {
        name: String,
        value: String,
        reason: String,
    },

    /// P008: Custom field missing on a selected option
    #[error("[P008] Field '{field}' does not exist on option '{option_id}' of parameter '{name}'")]
    UnknownOptionField {
        name: String,
        option_id: String,
        field: String,
    },

    /// P009: Empty parameter name
    #[error("[P009] Empty name not allowed: {context}")]
    EmptyName { context: String },

    /// P010: IO error with file path context
    #[error("[P010] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// P011: YAML parse error
    #[error("[P011] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

impl CoreError {
    /// Whether the caller sent a bad request (4xx-class) rather than the
    /// project being misconfigured.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CoreError::InvalidParameterValue { .. })
    }

    pub(crate) fn invalid_config(parameter: &str, message: impl Into<String>) -> Self {
        CoreError::ConfigInvalid {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
