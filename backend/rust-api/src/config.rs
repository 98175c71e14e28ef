use serde::Deserialize;
use std::env;

const DEV_SECRET_KEY: &str = "dev-insecure-secret-key";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app_env: String,
    pub bind_addr: String,
    pub secret_key: String,
    pub session: SessionConfig,
    /// Session records go to Redis when set, otherwise they stay in process memory.
    pub redis_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_seconds: u64,
    pub cookie_secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "quiz_session".to_string(),
            ttl_seconds: 3600,
            cookie_secure: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let secret_key = match settings
            .get_string("session.secret_key")
            .or_else(|_| env::var("SECRET_KEY"))
        {
            Ok(secret) if !secret.is_empty() => secret,
            _ if app_env == "prod" => {
                return Err(config::ConfigError::Message(
                    "SECRET_KEY must be set in production".to_string(),
                ));
            }
            _ => {
                eprintln!("WARNING: Using default SECRET_KEY (dev mode only!)");
                DEV_SECRET_KEY.to_string()
            }
        };

        let defaults = SessionConfig::default();

        let ttl_seconds = settings
            .get_int("session.ttl_seconds")
            .ok()
            .map(|v| v.to_string())
            .or_else(|| env::var("SESSION_DURATION_SECONDS").ok())
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.ttl_seconds);

        let cookie_secure = settings
            .get_bool("session.cookie_secure")
            .ok()
            .or_else(|| {
                env::var("COOKIE_SECURE")
                    .ok()
                    .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            })
            .unwrap_or(app_env == "prod");

        let cookie_name = settings
            .get_string("session.cookie_name")
            .unwrap_or(defaults.cookie_name);

        let redis_uri = settings
            .get_string("redis.uri")
            .or_else(|_| env::var("REDIS_URI"))
            .ok()
            .filter(|uri| !uri.is_empty());

        Ok(Config {
            app_env,
            bind_addr,
            secret_key,
            session: SessionConfig {
                cookie_name,
                ttl_seconds,
                cookie_secure,
            },
            redis_uri,
        })
    }
}
