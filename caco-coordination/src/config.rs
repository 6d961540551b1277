//! Environment-driven configuration for an external process that wires
//! the three agents together (the HTTP server/CLI entry itself is out of
//! scope; this struct is what such an entry would read).
//!
//! Ported in spirit from `knhk-config`'s `env.rs`/`config.rs` split, traded
//! down to manual `std::env::var` reads: there is no config-file layer or
//! merge hierarchy here because there is no deployable binary target in
//! this crate beyond an in-process demo harness.

/// Runtime configuration read from `CACO_*` environment variables.
///
/// Every field has a default so a missing environment is never a startup
/// error (`spec.md` §7's "no exceptions cross the RPC boundary" extends
/// to configuration loading too).
#[derive(Debug, Clone, PartialEq)]
pub struct CacoConfig {
    /// Informational in this in-process core; consumed by an external
    /// process-per-agent deployment (spec.md §9 design note).
    pub coordination_agent_url: String,
    pub compute_agent_url: String,
    pub grid_agent_url: String,
    /// Forwarded as `x-api-key` to the BMRS price client.
    pub bmrs_api_key: Option<String>,
    /// Identify an optional external weight oracle; absent means the
    /// coordination agent falls back to [`crate::oracle::NullOracle`].
    pub oracle_provider: Option<String>,
    pub oracle_model: Option<String>,
    /// Optional JSON file of `{"jobs": [...]}` to preload the compute
    /// ledger at startup.
    pub compute_bootstrap_path: Option<String>,
}

impl Default for CacoConfig {
    fn default() -> Self {
        Self {
            coordination_agent_url: "http://localhost:9001".to_string(),
            compute_agent_url: "http://localhost:9002".to_string(),
            grid_agent_url: "http://localhost:9003".to_string(),
            bmrs_api_key: None,
            oracle_provider: None,
            oracle_model: None,
            compute_bootstrap_path: None,
        }
    }
}

impl CacoConfig {
    /// Read configuration from the process environment, falling back to
    /// defaults for any variable that isn't set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            coordination_agent_url: std::env::var("CACO_COORDINATION_AGENT_URL")
                .unwrap_or(defaults.coordination_agent_url),
            compute_agent_url: std::env::var("CACO_COMPUTE_AGENT_URL")
                .unwrap_or(defaults.compute_agent_url),
            grid_agent_url: std::env::var("CACO_GRID_AGENT_URL").unwrap_or(defaults.grid_agent_url),
            bmrs_api_key: std::env::var("CACO_BMRS_API_KEY").ok(),
            oracle_provider: std::env::var("CACO_ORACLE_PROVIDER").ok(),
            oracle_model: std::env::var("CACO_ORACLE_MODEL").ok(),
            compute_bootstrap_path: std::env::var("CACO_COMPUTE_BOOTSTRAP_PATH").ok(),
        }
    }

    /// True when enough identifying information is present for an
    /// external collaborator to construct a real (non-null) weight
    /// oracle. The oracle implementation itself is out of scope here.
    pub fn has_oracle_configured(&self) -> bool {
        self.oracle_provider.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field_without_panicking() {
        let config = CacoConfig::default();
        assert_eq!(config.coordination_agent_url, "http://localhost:9001");
        assert_eq!(config.compute_agent_url, "http://localhost:9002");
        assert_eq!(config.grid_agent_url, "http://localhost:9003");
        assert!(config.bmrs_api_key.is_none());
        assert!(!config.has_oracle_configured());
    }

    #[test]
    fn from_env_overrides_individual_vars() {
        std::env::set_var("CACO_GRID_AGENT_URL", "http://grid.example:9100");
        std::env::set_var("CACO_ORACLE_PROVIDER", "openai");
        let config = CacoConfig::from_env();
        assert_eq!(config.grid_agent_url, "http://grid.example:9100");
        assert!(config.has_oracle_configured());
        std::env::remove_var("CACO_GRID_AGENT_URL");
        std::env::remove_var("CACO_ORACLE_PROVIDER");
    }
}
