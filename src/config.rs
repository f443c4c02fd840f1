/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, Auth 設定, HTTP 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - Auth 系の設定は AuthConfig にまとめ、パイプライン構築時に注入する
 */
use std::net::SocketAddr;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use secrecy::SecretString;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// What to do with a token whose `exp` claim is absent or not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingExpiryPolicy {
    /// Treat the token as non-expiring.
    #[default]
    Allow,
    /// Fail verification with `MissingExpiry`.
    Reject,
}

/// Key material and policy for the request-authorization pipeline.
///
/// Secrets are `SecretString`, so `Debug` output is redacted.
#[derive(Debug)]
pub struct AuthConfig {
    pub token_secret: SecretString,
    pub token_algorithm: Algorithm,
    pub missing_expiry: MissingExpiryPolicy,
    // Empty or unset means misconfigured; requests fail with a system fault.
    pub api_secret: SecretString,
}

impl AuthConfig {
    /// HMAC family only; the pipeline trusts a single symmetric algorithm.
    pub fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
        let alg = Algorithm::from_str(raw.trim())
            .map_err(|_| ConfigError::Invalid("AUTH_TOKEN_ALGORITHM"))?;

        match alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
            _ => Err(ConfigError::Invalid("AUTH_TOKEN_ALGORITHM")),
        }
    }

    /// Unset means "no value"; anything else is read from the returned string.
    pub fn parse_missing_expiry(raw: Option<&str>) -> Result<MissingExpiryPolicy, ConfigError> {
        match raw.unwrap_or_default().trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(MissingExpiryPolicy::Reject),
            "" | "0" | "false" | "no" => Ok(MissingExpiryPolicy::Allow),
            _ => Err(ConfigError::Invalid("AUTH_REQUIRE_EXP")),
        }
    }

    /// Build from any key lookup. `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token_secret =
            lookup("AUTH_TOKEN_SECRET").ok_or(ConfigError::Missing("AUTH_TOKEN_SECRET"))?;
        if token_secret.is_empty() {
            return Err(ConfigError::Invalid("AUTH_TOKEN_SECRET"));
        }

        let token_algorithm = match lookup("AUTH_TOKEN_ALGORITHM") {
            Some(raw) => Self::parse_algorithm(&raw)?,
            None => Algorithm::HS256,
        };

        let missing_expiry = Self::parse_missing_expiry(lookup("AUTH_REQUIRE_EXP").as_deref())?;

        // Unset stays empty; SharedSecretCheck reports it per request.
        let api_secret = lookup("BACKEND_API_SECRET").unwrap_or_default();

        Ok(Self {
            token_secret: SecretString::from(token_secret),
            token_algorithm,
            missing_expiry,
            api_secret: SecretString::from(api_secret),
        })
    }

    fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub database_url: String,
    pub database_max_connections: u32,

    pub request_timeout_seconds: u64,
    pub body_limit_bytes: usize,

    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let request_timeout_seconds = std::env::var("HTTP_REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let body_limit_bytes = std::env::var("HTTP_BODY_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        let auth = AuthConfig::from_env()?;

        Ok(Self {
            addr,
            app_env,
            database_url,
            database_max_connections,
            request_timeout_seconds,
            body_limit_bytes,
            auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::shared_secret::{SecretError, SharedSecretCheck};
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn accepts_hmac_algorithms_only() {
        assert_eq!(
            AuthConfig::parse_algorithm("HS256").unwrap(),
            Algorithm::HS256
        );
        assert_eq!(
            AuthConfig::parse_algorithm(" HS512 ").unwrap(),
            Algorithm::HS512
        );
        assert!(AuthConfig::parse_algorithm("RS256").is_err());
        assert!(AuthConfig::parse_algorithm("EdDSA").is_err());
        assert!(AuthConfig::parse_algorithm("none").is_err());
    }

    #[test]
    fn missing_expiry_defaults_to_allow() {
        assert_eq!(MissingExpiryPolicy::default(), MissingExpiryPolicy::Allow);
    }

    #[test]
    fn token_secret_is_required_and_non_empty() {
        assert_eq!(
            AuthConfig::from_lookup(lookup_from(&[])).unwrap_err(),
            ConfigError::Missing("AUTH_TOKEN_SECRET")
        );
        assert_eq!(
            AuthConfig::from_lookup(lookup_from(&[("AUTH_TOKEN_SECRET", "")])).unwrap_err(),
            ConfigError::Invalid("AUTH_TOKEN_SECRET")
        );
    }

    #[test]
    fn defaults_with_only_the_signing_key() {
        let cfg = AuthConfig::from_lookup(lookup_from(&[("AUTH_TOKEN_SECRET", "k")])).unwrap();

        assert_eq!(cfg.token_secret.expose_secret(), "k");
        assert_eq!(cfg.token_algorithm, Algorithm::HS256);
        assert_eq!(cfg.missing_expiry, MissingExpiryPolicy::Allow);
        assert_eq!(cfg.api_secret.expose_secret(), "");
    }

    #[test]
    fn unset_api_secret_leads_to_secret_not_configured() {
        let cfg = AuthConfig::from_lookup(lookup_from(&[("AUTH_TOKEN_SECRET", "k")])).unwrap();
        let check = SharedSecretCheck::new(cfg.api_secret);

        assert_eq!(check.check(""), Err(SecretError::NotConfigured));
    }

    #[test]
    fn require_exp_values_map_to_policy() {
        for raw in ["1", "true", "TRUE", "yes", " Yes "] {
            assert_eq!(
                AuthConfig::parse_missing_expiry(Some(raw)),
                Ok(MissingExpiryPolicy::Reject),
                "value {raw:?}"
            );
        }
        for raw in [None, Some(""), Some("0"), Some("false"), Some("No")] {
            assert_eq!(
                AuthConfig::parse_missing_expiry(raw),
                Ok(MissingExpiryPolicy::Allow),
                "value {raw:?}"
            );
        }
        for raw in ["maybe", "2", "on"] {
            assert_eq!(
                AuthConfig::parse_missing_expiry(Some(raw)),
                Err(ConfigError::Invalid("AUTH_REQUIRE_EXP"))
            );
        }
    }

    #[test]
    fn lookup_wires_every_auth_key() {
        let cfg = AuthConfig::from_lookup(lookup_from(&[
            ("AUTH_TOKEN_SECRET", "k"),
            ("AUTH_TOKEN_ALGORITHM", "HS384"),
            ("AUTH_REQUIRE_EXP", "true"),
            ("BACKEND_API_SECRET", "shared"),
        ]))
        .unwrap();

        assert_eq!(cfg.token_algorithm, Algorithm::HS384);
        assert_eq!(cfg.missing_expiry, MissingExpiryPolicy::Reject);
        assert_eq!(cfg.api_secret.expose_secret(), "shared");

        assert_eq!(
            AuthConfig::from_lookup(lookup_from(&[
                ("AUTH_TOKEN_SECRET", "k"),
                ("AUTH_TOKEN_ALGORITHM", "RS256"),
            ]))
            .unwrap_err(),
            ConfigError::Invalid("AUTH_TOKEN_ALGORITHM")
        );
        assert_eq!(
            AuthConfig::from_lookup(lookup_from(&[
                ("AUTH_TOKEN_SECRET", "k"),
                ("AUTH_REQUIRE_EXP", "sometimes"),
            ]))
            .unwrap_err(),
            ConfigError::Invalid("AUTH_REQUIRE_EXP")
        );
    }
}
