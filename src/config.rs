//! Configuration management for the MangaDex facade.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables (a `.env` file is loaded by the binary first)
//! - Defaults matching the public MangaDex deployment
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use mangadex_facade::config::Config;
//!
//! let config = Config::parse();
//! config.validate()?;
//! println!("Listening on {}", config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `FACADE_HOST` - Server bind address (default: 0.0.0.0)
//! - `FACADE_PORT` - Server port (default: 5000)
//! - `MFA_TEST_CLIENT_ID` - Personal API client id
//! - `MFA_TEST_CLIENT_SECRET` - Personal API client secret
//! - `MFA_TEST_USERNAME` - Service account username
//! - `MFA_TEST_PASSWORD` - Service account password
//! - `FACADE_API_URL` - Upstream API base URL
//! - `FACADE_AUTH_URL` - Upstream token endpoint
//! - `FACADE_UPSTREAM_TIMEOUT` - Per-call upstream timeout in seconds (unset: none)
//! - `FACADE_COMPACT_JSON` - Write compact instead of indented JSON

use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::catalog::{DEFAULT_API_URL, DEFAULT_AUTH_URL};
use crate::server::{JsonFormat, RouterConfig};
use crate::session::AccountCredentials;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

// =============================================================================
// CLI Arguments
// =============================================================================

/// MangaDex facade - a read-only JSON gateway over the MangaDex catalog.
///
/// Logs in once as a service account at startup and forwards every request
/// to the upstream API under that identity.
#[derive(Parser, Debug, Clone)]
#[command(name = "mangadex-facade")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "FACADE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "FACADE_PORT")]
    pub port: u16,

    // =========================================================================
    // Account Configuration
    // =========================================================================
    /// Personal API client id.
    #[arg(long, default_value = "", env = "MFA_TEST_CLIENT_ID", hide_env_values = true)]
    pub client_id: String,

    /// Personal API client secret.
    #[arg(long, default_value = "", env = "MFA_TEST_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Service account username.
    #[arg(long, default_value = "", env = "MFA_TEST_USERNAME")]
    pub username: String,

    /// Service account password.
    #[arg(long, default_value = "", env = "MFA_TEST_PASSWORD", hide_env_values = true)]
    pub password: String,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Upstream API base URL.
    #[arg(long, default_value = DEFAULT_API_URL, env = "FACADE_API_URL")]
    pub api_url: String,

    /// Upstream token endpoint used for the startup login.
    #[arg(long, default_value = DEFAULT_AUTH_URL, env = "FACADE_AUTH_URL")]
    pub auth_url: String,

    /// Per-call upstream timeout in seconds.
    ///
    /// If not specified, upstream calls are not bounded.
    #[arg(long, env = "FACADE_UPSTREAM_TIMEOUT")]
    pub upstream_timeout: Option<u64>,

    // =========================================================================
    // Output Configuration
    // =========================================================================
    /// Write compact JSON instead of two-space indented JSON.
    #[arg(long, default_value_t = false, env = "FACADE_COMPACT_JSON")]
    pub compact_json: bool,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    ///
    /// Empty credentials are accepted; see [`Config::missing_credentials`].
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }

        validate_http_url("api_url", &self.api_url)?;
        validate_http_url("auth_url", &self.auth_url)?;

        if self.upstream_timeout == Some(0) {
            return Err("upstream_timeout must be greater than 0 when set".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The service account used for the startup login.
    pub fn credentials(&self) -> AccountCredentials {
        AccountCredentials::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            self.username.clone(),
            self.password.clone(),
        )
    }

    /// Names of the credential settings left empty.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        self.credentials().missing_fields()
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout.map(Duration::from_secs)
    }

    pub fn json_format(&self) -> JsonFormat {
        if self.compact_json {
            JsonFormat::Compact
        } else {
            JsonFormat::Pretty
        }
    }

    /// Build the router configuration.
    pub fn router_config(&self) -> RouterConfig {
        RouterConfig::new()
            .with_json_format(self.json_format())
            .with_tracing(!self.no_tracing)
    }
}

fn validate_http_url(name: &str, value: &str) -> Result<(), String> {
    let url = Url::parse(value)
        .map_err(|e| format!("{} is not a valid URL ({}): {}", name, e, value))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!(
            "{} must use http or https, got '{}': {}",
            name, scheme, value
        )),
    }
}

// =============================================================================
// Tests
// =============================================================================
