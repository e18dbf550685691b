//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The configuration file path defaults to `config.yaml` but can
//! be specified via `-f` flag or `CAMPUSD_CONFIG` environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources
//! override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `CAMPUSD_` override
//!    YAML values
//!
//! For nested config values, use double underscores in environment variables.
//! For example, `CAMPUSD_DATABASE__URL=sqlite:///data/campus.db` sets the
//! `database.url` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! CAMPUSD_PORT=8080
//!
//! # Token signing secret (required to issue or verify sessions)
//! CAMPUSD_SECRET_KEY="change-me"
//!
//! # Override nested values
//! CAMPUSD_AUTH__TOKEN_EXPIRY=30m
//! CAMPUSD_RECOMMENDATIONS__API_KEY=sk-...
//! ```

use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "CAMPUSD_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment
/// variables. All fields have sensible defaults defined in the `Default`
/// implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Secret key for signing session tokens (required for production)
    pub secret_key: Option<String>,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Course-recommendation passthrough configuration
    pub recommendations: RecommendationsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            database: DatabaseConfig::default(),
            secret_key: None,
            auth: AuthConfig::default(),
            recommendations: RecommendationsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the YAML file and environment overrides
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("CAMPUSD_").split("__"))
            .extract()
    }

    /// The address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite connection string for the entity store
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://campusd.db".to_string(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// How long a minted session token stays valid
    #[serde(with = "humantime_serde")]
    pub token_expiry: Duration,
    /// Secret length bounds enforced at registration and profile update
    pub password: PasswordConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_expiry: Duration::from_secs(60 * 60), // 1 hour
            password: PasswordConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// Secret length bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 128,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins; "*" allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Course-recommendation passthrough configuration.
///
/// The upstream is any OpenAI-compatible chat-completions API. Requests fail
/// with a validation error when no API key is configured.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecommendationsConfig {
    /// Base URL of the chat-completions API
    pub api_base: Url,
    /// API key for the upstream service
    pub api_key: Option<String>,
    /// Model name to request
    pub model: String,
    /// Completion token budget per request
    pub max_tokens: u32,
}

impl Default for RecommendationsConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse("https://api.openai.com/v1").expect("default api_base is valid"),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "0.0.0.0:4000");
        assert_eq!(config.auth.token_expiry, Duration::from_secs(3600));
        assert_eq!(config.auth.password.min_length, 6);
        assert!(config.secret_key.is_none());
        assert!(config.recommendations.api_key.is_none());
    }

    #[test]
    fn test_env_overrides_yaml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                "port: 5000\nsecret_key: from-yaml\nauth:\n  token_expiry: 30m\n",
            )?;
            jail.set_env("CAMPUSD_PORT", "8080");
            jail.set_env("CAMPUSD_AUTH__PASSWORD__MIN_LENGTH", "10");

            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let config = Config::load(&args).expect("config should load");

            assert_eq!(config.port, 8080); // env wins
            assert_eq!(config.secret_key.as_deref(), Some("from-yaml"));
            assert_eq!(config.auth.token_expiry, Duration::from_secs(30 * 60));
            assert_eq!(config.auth.password.min_length, 10);
            Ok(())
        });
    }
}
