//! Factor catalog: target candidates, admin/user factors and saved models.

use aimm_core::{Error, Factor, ModelLevel, ModelSummary, Result};
use tracing::{error, info, warn};

use crate::client::ApiClient;

/// Read-only view of what the backend offers.
#[derive(Debug, Clone, Default)]
pub struct FactorCatalog {
    pub targets: Vec<Factor>,
    pub admin_factors: Vec<Factor>,
    pub user_factors: Vec<Factor>,
    pub model_levels: Vec<ModelLevel>,
}

impl FactorCatalog {
    /// Fetch targets, factors and models concurrently.
    ///
    /// Each load fills its own fields; a failed load is logged and leaves its
    /// part empty without affecting the others.
    pub async fn load(client: &ApiClient) -> Self {
        let (targets, factors, models) =
            tokio::join!(client.targets(), client.factors(), client.models());

        let mut catalog = Self::default();

        match targets {
            Ok(t) => catalog.targets = t,
            Err(e) => error!("Error loading target variables: {}", e),
        }
        match factors {
            Ok(f) => catalog.set_factors(f),
            Err(e) => error!("Error loading factors: {}", e),
        }
        match models.and_then(|v| parse_model_levels(&v)) {
            Ok(levels) => catalog.model_levels = levels,
            Err(e) => error!("Error loading models: {}", e),
        }

        info!(
            "Catalog loaded: {} targets, {} admin factors, {} user factors, {} model levels",
            catalog.targets.len(),
            catalog.admin_factors.len(),
            catalog.user_factors.len(),
            catalog.model_levels.len()
        );
        catalog
    }

    /// Split factors by creator: `"admin"` versus everyone else.
    pub fn set_factors(&mut self, factors: Vec<Factor>) {
        let (admin, user): (Vec<_>, Vec<_>) = factors.into_iter().partition(|f| f.is_admin());
        self.admin_factors = admin;
        self.user_factors = user;
    }

    pub fn all_factors(&self) -> impl Iterator<Item = &Factor> {
        self.admin_factors.iter().chain(self.user_factors.iter())
    }

    /// Case-insensitive substring search over all factors. An empty term
    /// matches nothing.
    pub fn search(&self, term: &str) -> Vec<&Factor> {
        if term.is_empty() {
            return Vec::new();
        }
        let needle = term.to_lowercase();
        self.all_factors()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Exact-name lookup over factors, then target candidates.
    pub fn find_factor(&self, name: &str) -> Option<&Factor> {
        self.all_factors()
            .chain(self.targets.iter())
            .find(|f| f.name == name)
    }

    pub fn is_target_candidate(&self, name: &str) -> bool {
        self.targets.iter().any(|t| t.name == name)
    }

    pub fn find_model(&self, name: &str) -> Option<&ModelSummary> {
        self.model_levels
            .iter()
            .flat_map(|l| l.models.iter())
            .find(|m| m.name == name)
    }
}

/// Parse the `{level: [model, ...]}` listing. Keys that are integers sort
/// first, in numeric order; anything else ("Unknown") follows by name.
/// Entries that do not parse are logged and skipped.
pub fn parse_model_levels(value: &serde_json::Value) -> Result<Vec<ModelLevel>> {
    let object = value.as_object().ok_or_else(|| {
        Error::MalformedResponse(format!("expected an object of model levels, got {}", value))
    })?;

    let mut levels = Vec::with_capacity(object.len());
    for (key, entries) in object {
        let Some(entries) = entries.as_array() else {
            warn!("Skipping model level {}: expected a list, got {}", key, entries);
            continue;
        };
        let mut models = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<ModelSummary>(entry.clone()) {
                Ok(model) => models.push(model),
                Err(e) => warn!("Skipping malformed model in level {}: {}", key, e),
            }
        }
        levels.push(ModelLevel {
            key: key.clone(),
            level: key.trim().parse().ok(),
            models,
        });
    }
    levels.sort_by(|a, b| match (a.level, b.level) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.key.cmp(&b.key),
    });
    Ok(levels)
}
