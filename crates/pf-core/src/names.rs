//! Strongly-typed names for parameters and data source connections.
//!
//! Both are non-empty strings; an empty name is rejected at construction
//! and during deserialization.

use crate::error::{CoreError, CoreResult};
use std::fmt;

macro_rules! name_type {
    ($(#[$meta:meta])* $Name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $Name(String);

        impl $Name {
            pub fn new(name: impl Into<String>) -> CoreResult<Self> {
                let name = name.into();
                if name.is_empty() {
                    return Err(CoreError::EmptyName { context: $what.into() });
                }
                Ok(Self(name))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $Name {
            type Error = CoreError;

            fn try_from(name: String) -> CoreResult<Self> {
                Self::new(name)
            }
        }

        impl From<$Name> for String {
            fn from(name: $Name) -> String {
                name.0
            }
        }

        impl fmt::Display for $Name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::ops::Deref for $Name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $Name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $Name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

name_type! {
    /// Unique key of a parameter within a parameter set
    ParameterName, "parameter name"
}

name_type! {
    /// Name of a configured data source connection
    ConnectionName, "connection name"
}

impl Default for ConnectionName {
    fn default() -> Self {
        Self(DEFAULT_CONNECTION.to_string())
    }
}

/// Connection used by `create_from_source` parameters that do not name one.
pub const DEFAULT_CONNECTION: &str = "default";

#[cfg(test)]
#[path = "names_test.rs"]
mod tests;
