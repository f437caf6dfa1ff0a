//! Error types for pf-engine

use pf_core::CoreError;
use pf_db::DbError;
use thiserror::Error;

/// Errors raised while building or resolving parameter sets
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration, dependency or selection error from the model
    #[error(transparent)]
    Core(#[from] CoreError),

    /// S001: Query or connection failure while loading options
    #[error("[S001] Failed to load options for parameter '{parameter}': {source}")]
    DataSource { parameter: String, source: DbError },

    /// S002: A mapped column is absent from the query result
    #[error("[S002] Column '{column}' not found in data source of parameter '{parameter}'")]
    MissingColumn { parameter: String, column: String },

    /// S003: A source row holds a value that cannot be used
    #[error("[S003] Invalid value in data source of parameter '{parameter}': {message}")]
    InvalidSourceValue { parameter: String, message: String },

    /// S004: No project registered under the id
    #[error("[S004] Unknown project: {0}")]
    UnknownProject(String),
}

impl EngineError {
    /// Bad request (4xx-class): the raw selection was rejected
    pub fn is_client_error(&self) -> bool {
        matches!(self, EngineError::Core(e) if e.is_client_error())
    }

    /// Project failed to load because its configuration is wrong
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            EngineError::Core(
                CoreError::ConfigParseError { .. }
                    | CoreError::ConfigInvalid { .. }
                    | CoreError::DuplicateParameter { .. }
                    | CoreError::UnknownParent { .. }
                    | CoreError::InvalidParent { .. }
                    | CoreError::CircularDependency { .. }
                    | CoreError::EmptyName { .. }
                    | CoreError::IoWithPath { .. }
                    | CoreError::YamlParse(_)
            )
        )
    }
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;
