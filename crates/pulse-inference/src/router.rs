//! Backend selection policy.
//!
//! Routing is a pure function of the per-query route metadata, so the
//! policy is exhaustively testable without any live backend. Privacy is
//! evaluated before every other signal: a sensitive query routes to the
//! local backend no matter how complex it is, and never escalates remotely
//! even when the local backend is down.

use tracing::debug;

use pulse_core::{
    defaults, BackendId, PrivacySensitivity, QueryComplexity, RouteMetadata,
};

/// Router configuration knobs.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// When true, medium-complexity queries stay on the free local backend
    /// instead of spending on the validation backend.
    pub cost_constrained: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cost_constrained: true,
        }
    }
}

/// Pure backend-selection policy.
#[derive(Debug, Clone, Default)]
pub struct ModelRouter {
    config: RouterConfig,
}

impl ModelRouter {
    /// Create a router with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router with a custom configuration.
    pub fn with_config(config: RouterConfig) -> Self {
        Self { config }
    }

    /// Select the backend for a query. Rules apply in order; the first
    /// match wins.
    pub fn select(&self, meta: &RouteMetadata) -> BackendId {
        let backend = if meta.privacy == PrivacySensitivity::Sensitive {
            BackendId::Local
        } else if meta.requires_structured_output {
            BackendId::Validation
        } else {
            match meta.complexity {
                QueryComplexity::High => BackendId::Reasoning,
                QueryComplexity::Medium => {
                    if self.config.cost_constrained {
                        BackendId::Local
                    } else {
                        BackendId::Validation
                    }
                }
                QueryComplexity::Low => BackendId::Local,
            }
        };

        debug!(
            subsystem = "inference",
            op = "route",
            backend = %backend,
            "Backend selected"
        );
        backend
    }

    /// The backend to try when `primary` fails or is unavailable.
    ///
    /// Degradation runs reasoning, then validation, then local. Sensitive
    /// queries get no fallback at all: if the local backend cannot serve
    /// them, the query fails closed rather than leaving the machine.
    pub fn fallback(
        &self,
        primary: BackendId,
        privacy: PrivacySensitivity,
    ) -> Option<BackendId> {
        if privacy == PrivacySensitivity::Sensitive {
            return None;
        }
        match primary {
            BackendId::Reasoning => Some(BackendId::Validation),
            BackendId::Validation => Some(BackendId::Local),
            BackendId::Local => None,
        }
    }

    /// Coarse cost estimate for serving `total_tokens` on a backend, USD.
    pub fn cost_estimate(&self, backend: BackendId, total_tokens: i64) -> f64 {
        let per_token = match backend {
            BackendId::Reasoning => defaults::REASONING_COST_PER_TOKEN,
            BackendId::Validation => defaults::VALIDATION_COST_PER_TOKEN,
            BackendId::Local => defaults::LOCAL_COST_PER_TOKEN,
        };
        per_token * total_tokens.max(0) as f64
    }
}
