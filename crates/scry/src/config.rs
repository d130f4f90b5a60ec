//! Runtime configuration for the scry driver.
//!
//! Configuration can be loaded from environment variables or constructed
//! programmatically.

use std::env;

/// Runtime configuration for the scry driver.
#[derive(Clone, Debug, Default)]
pub struct ScryConfig {
    /// Pretty-print the final result instead of emitting compact JSON.
    pub pretty: bool,
    /// Emit the resulting graph as a URL parameter after the run.
    pub emit_graph_param: bool,
}

impl ScryConfig {
    /// Load configuration from environment variables.
    ///
    /// * `SCRY_PRETTY` - pretty-print the final result (`1`/`true`)
    /// * `SCRY_GRAPH_PARAM` - also print the graph encoded for a URL
    pub fn from_env() -> Self {
        Self {
            pretty: env_flag("SCRY_PRETTY"),
            emit_graph_param: env_flag("SCRY_GRAPH_PARAM"),
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).is_ok_and(|value| parse_flag(&value))
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    value == "1" || value == "true" || value == "yes"
}
