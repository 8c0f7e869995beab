//! Environment-driven runtime configuration.

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend REST API.
    pub api_base: String,
    /// Directory holding persisted console state (bearer token).
    pub state_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self { api_base: "http://127.0.0.1:8080".to_string(), state_dir: ".shopadmin".to_string() }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Config::default();
        Self {
            api_base: std::env::var("SHOPADMIN_API_BASE").unwrap_or(d.api_base),
            state_dir: std::env::var("SHOPADMIN_STATE_DIR").unwrap_or(d.state_dir),
        }
    }
}
