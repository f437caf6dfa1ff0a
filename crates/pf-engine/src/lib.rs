//! pf-engine - Parameter service for Paramflow
//!
//! Builds base parameter sets from project configuration (querying data
//! sources where needed), caches them per project, and caches resolved sets
//! per request fingerprint. Every cache miss runs exactly one build per key,
//! however many requests are waiting on it.

pub mod cache;
pub mod error;
pub mod factory;
pub mod fingerprint;
pub mod service;

pub use cache::SingleFlightCache;
pub use error::{EngineError, EngineResult};
pub use factory::build_parameter;
pub use fingerprint::Fingerprint;
pub use service::ParameterService;
