//! Process-scoped parameter service.
//!
//! Holds the registered projects, the base-set cache (one entry per
//! project) and the resolved-set cache (one entry per request fingerprint).

use crate::cache::SingleFlightCache;
use crate::error::{EngineError, EngineResult};
use crate::factory::build_parameter;
use crate::fingerprint::Fingerprint;
use futures::future::try_join_all;
use parking_lot::RwLock;
use pf_core::{
    BaseParameterSet, CacheSettings, ParameterConfig, ParameterSet, ParametersConfig,
    RawSelection, Resolution, ResolveScope, UserAttributes,
};
use pf_db::ConnectionProvider;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Builds, caches and resolves the parameter sets of registered projects.
pub struct ParameterService {
    projects: RwLock<HashMap<String, Arc<Vec<ParameterConfig>>>>,
    provider: Arc<dyn ConnectionProvider>,
    base_sets: SingleFlightCache<String, Arc<BaseParameterSet>>,
    resolved: SingleFlightCache<Fingerprint, Arc<Resolution>>,
    generation: AtomicU64,
}

impl ParameterService {
    pub fn new(settings: &CacheSettings, provider: Arc<dyn ConnectionProvider>) -> Self {
        log::debug!(
            "Creating parameter service with {} provider",
            provider.provider_type()
        );
        Self {
            projects: RwLock::new(HashMap::new()),
            provider,
            base_sets: SingleFlightCache::new(
                "base set",
                settings.base_cache_size,
                settings.base_cache_ttl(),
            ),
            resolved: SingleFlightCache::new(
                "resolved set",
                settings.selection_cache_size,
                settings.selection_cache_ttl(),
            ),
            generation: AtomicU64::new(0),
        }
    }

    /// Register or replace a project.
    ///
    /// Configuration, parent relationships and cycles are checked here, so
    /// a broken project fails at load rather than on its first request.
    pub fn register_project(
        &self,
        project_id: impl Into<String>,
        config: &ParametersConfig,
    ) -> EngineResult<()> {
        let project_id = project_id.into();
        let configs = config.parameter_configs()?;
        log::info!(
            "Registered project '{project_id}' with {} parameters",
            configs.len()
        );
        self.projects
            .write()
            .insert(project_id.clone(), Arc::new(configs));
        self.base_sets.invalidate(&project_id);
        Ok(())
    }

    pub fn has_project(&self, project_id: &str) -> bool {
        self.projects.read().contains_key(project_id)
    }

    fn project(&self, project_id: &str) -> EngineResult<Arc<Vec<ParameterConfig>>> {
        self.projects
            .read()
            .get(project_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownProject(project_id.to_string()))
    }

    /// The project's parameters with no selection applied, built on first
    /// access and shared by every request until invalidated or expired.
    pub async fn get_base_parameter_set(
        &self,
        project_id: &str,
    ) -> EngineResult<Arc<BaseParameterSet>> {
        let configs = self.project(project_id)?;
        self.base_sets
            .get_or_build(project_id.to_string(), || {
                self.build_base_set(project_id, configs)
            })
            .await
    }

    async fn build_base_set(
        &self,
        project_id: &str,
        configs: Arc<Vec<ParameterConfig>>,
    ) -> EngineResult<Arc<BaseParameterSet>> {
        let start = Instant::now();
        let provider = self.provider.as_ref();
        let parameters =
            try_join_all(configs.iter().map(|config| build_parameter(config, provider))).await?;

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let base = BaseParameterSet::new(parameters, generation)?;
        log::info!(
            "Built base parameter set for project '{project_id}' ({} parameters, generation {generation}) in {:?}",
            base.parameters().len(),
            start.elapsed()
        );
        Ok(Arc::new(base))
    }

    /// Resolve a request into a parameter set owned by the caller
    pub async fn resolve(
        &self,
        project_id: &str,
        raw: &RawSelection,
        user: &UserAttributes,
    ) -> EngineResult<ParameterSet> {
        let resolution = self.resolve_with_report(project_id, raw, user).await?;
        Ok(resolution.parameters.clone())
    }

    /// Resolve a request, including the selections corrected on the way.
    ///
    /// Identical requests (same fingerprint) share one cached resolution.
    pub async fn resolve_with_report(
        &self,
        project_id: &str,
        raw: &RawSelection,
        user: &UserAttributes,
    ) -> EngineResult<Arc<Resolution>> {
        self.resolve_scoped(project_id, raw, user, &ResolveScope::all())
            .await
    }

    /// Resolve a request, returning only the parameters in `scope`
    pub async fn resolve_scoped(
        &self,
        project_id: &str,
        raw: &RawSelection,
        user: &UserAttributes,
        scope: &ResolveScope,
    ) -> EngineResult<Arc<Resolution>> {
        let base = self.get_base_parameter_set(project_id).await?;
        let key = Fingerprint::of_request(project_id, &base, raw, user, scope);
        self.resolved
            .get_or_build(key, || async {
                pf_core::resolve_scoped(&base, raw, user, scope)
                    .map(Arc::new)
                    .map_err(EngineError::from)
            })
            .await
    }

    /// Drop the project's cached base set; the next request rebuilds it
    pub fn invalidate_project(&self, project_id: &str) -> bool {
        let removed = self.base_sets.invalidate(&project_id.to_string());
        if removed {
            log::info!("Invalidated base parameter set for project '{project_id}'");
        }
        removed
    }

    /// Drop every cached base and resolved set
    pub fn clear_caches(&self) {
        self.base_sets.clear();
        self.resolved.clear();
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
