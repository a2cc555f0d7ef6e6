use std::env;
use std::time::Duration;

use crate::error::ProxyError;
use crate::provider::ProviderKind;

/// Runtime configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub bind_address: String,
    /// Redis connection URL; an empty value selects the in-memory store.
    pub redis_url: String,
    /// Which provider API shape to target.
    pub provider: ProviderKind,
    /// API key for the selected provider.
    pub api_key: String,
    /// Model name sent to the provider.
    pub model: String,
    /// Outbound provider call timeout in seconds. A timed-out attempt is
    /// treated as transient.
    pub request_timeout_secs: u64,
    /// Default tracing filter level.
    pub log_level: String,
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Which environment variable holds the API key for a provider.
pub fn api_key_var(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::Gemini => "GEMINI_API_KEY",
        ProviderKind::OpenAi => "OPENAI_API_KEY",
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ProxyError> {
        let bind_address = env_or("BIND_ADDRESS", "0.0.0.0:8080");
        let redis_url = env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let provider_name = env_or("PROVIDER", "gemini");
        let provider = ProviderKind::from_name(&provider_name).ok_or_else(|| {
            ProxyError::Configuration(format!(
                "unknown provider '{}', expected 'gemini' or 'openai'",
                provider_name
            ))
        })?;

        let key_var = api_key_var(provider);
        let api_key = env::var(key_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ProxyError::Configuration(format!("{} must be set", key_var)))?;

        let model = env_or("MODEL", provider.default_model());

        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", "45")
            .parse::<u64>()
            .map_err(|_| {
                ProxyError::Configuration("REQUEST_TIMEOUT_SECS must be an integer".to_string())
            })?;

        Ok(Self {
            bind_address,
            redis_url,
            provider,
            api_key,
            model,
            request_timeout_secs,
            log_level: env_or("LOG_LEVEL", "info"),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_var_per_provider() {
        assert_eq!(api_key_var(ProviderKind::Gemini), "GEMINI_API_KEY");
        assert_eq!(api_key_var(ProviderKind::OpenAi), "OPENAI_API_KEY");
    }

    #[test]
    fn test_request_timeout_duration() {
        let config = Config {
            bind_address: "0.0.0.0:8080".to_string(),
            redis_url: String::new(),
            provider: ProviderKind::Gemini,
            api_key: "k".to_string(),
            model: "gemini-2.5-flash".to_string(),
            request_timeout_secs: 45,
            log_level: "info".to_string(),
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(45));
    }
}
