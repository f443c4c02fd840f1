//! Bearer token (HMAC-signed JWT) verification.
//!
//! The codec does not know about users or HTTP. It answers one question:
//! is this compact JWS signed by us, with the algorithm we trust, and not
//! expired at `now`?

use base64::Engine as _;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{AuthConfig, MissingExpiryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("unsupported token algorithm")]
    UnsupportedAlgorithm,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token has no numeric 'exp' claim")]
    MissingExpiry,
}

impl TokenError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
            Self::MissingExpiry => "missing_expiry",
        }
    }
}

/// Decoded token payload.
///
/// Only `username` and `exp` carry meaning here; every other claim is kept
/// as-is for downstream consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// `username` when present and a string.
    pub fn username(&self) -> Option<&str> {
        self.0.get("username").and_then(Value::as_str)
    }

    /// `exp` as whole seconds since epoch. Floating point values round up, so a
    /// token is never cut short by its fractional second; anything non-numeric
    /// reads as absent.
    pub fn expires_at(&self) -> Option<i64> {
        let exp = self.0.get("exp")?;
        exp.as_i64().or_else(|| exp.as_f64().map(|f| f.ceil() as i64))
    }
}

/// Verifies tokens against one symmetric key and one algorithm.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    decoding_key: DecodingKey,
    validation: Validation,
    missing_expiry: MissingExpiryPolicy,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("missing_expiry", &self.missing_expiry)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        let decoding_key =
            DecodingKey::from_secret(config.token_secret.expose_secret().as_bytes());

        // Signature and algorithm only. `exp` is checked by hand so that the clock
        // is injectable and a non-numeric `exp` is not a decode failure.
        let mut validation = Validation::new(config.token_algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            algorithm: config.token_algorithm,
            decoding_key,
            validation,
            missing_expiry: config.missing_expiry,
        }
    }

    /// Verify against the current wall clock.
    pub fn verify(&self, token: &str) -> Result<ClaimSet, TokenError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify with an explicit `now` (seconds since epoch).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<ClaimSet, TokenError> {
        // 1) alg gate, before any key is touched. jsonwebtoken cannot even parse a
        //    header with `alg: none`, which would otherwise surface as Malformed.
        let alg = header_alg(token)?;
        match alg.parse::<Algorithm>() {
            Ok(alg) if alg == self.algorithm => {}
            _ => {
                debug!(alg = %alg, expected = ?self.algorithm, "rejecting token algorithm");
                return Err(TokenError::UnsupportedAlgorithm);
            }
        }

        // 2) signature, then payload
        let data = jsonwebtoken::decode::<Map<String, Value>>(
            token,
            &self.decoding_key,
            &self.validation,
        )
        .map_err(|e| {
            debug!(error = %e, "token decode failed");
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => TokenError::UnsupportedAlgorithm,
                _ => TokenError::Malformed,
            }
        })?;

        let claims = ClaimSet::new(data.claims);

        // 3) expiry; `exp == now` counts as expired
        match claims.expires_at() {
            Some(exp) if now >= exp => Err(TokenError::Expired),
            Some(_) => Ok(claims),
            None => match self.missing_expiry {
                MissingExpiryPolicy::Allow => Ok(claims),
                MissingExpiryPolicy::Reject => Err(TokenError::MissingExpiry),
            },
        }
    }
}

fn header_alg(token: &str) -> Result<String, TokenError> {
    let mut segments = token.split('.');
    let header = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(h), Some(_), Some(_), None) if !h.is_empty() => h,
        _ => return Err(TokenError::Malformed),
    };

    let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| TokenError::Malformed)?;

    let header: Value = serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;

    header
        .get("alg")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use secrecy::SecretString;
    use serde_json::json;

    const KEY: &str = "exam-portal-test-key";
    const NOW: i64 = 1_700_000_000;

    fn config(policy: MissingExpiryPolicy) -> AuthConfig {
        AuthConfig {
            token_secret: SecretString::from(KEY),
            token_algorithm: Algorithm::HS256,
            missing_expiry: policy,
            api_secret: SecretString::from("api-secret"),
        }
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(&config(MissingExpiryPolicy::Allow))
    }

    fn sign(alg: Algorithm, key: &str, claims: &Value) -> String {
        jsonwebtoken::encode(
            &Header::new(alg),
            claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .unwrap()
    }

    fn b64(value: &Value) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(value.to_string())
    }

    #[test]
    fn accepts_valid_token() {
        let token = sign(
            Algorithm::HS256,
            KEY,
            &json!({"username": "alice", "exp": NOW + 60, "role": "student"}),
        );

        let claims = codec().verify_at(&token, NOW).unwrap();
        assert_eq!(claims.username(), Some("alice"));
        assert_eq!(claims.expires_at(), Some(NOW + 60));
        assert_eq!(claims.get("role"), Some(&json!("student")));
    }

    #[test]
    fn rejects_foreign_key() {
        for key in ["token", "another-key", "exam-portal-test-key2"] {
            let token = sign(
                Algorithm::HS256,
                key,
                &json!({"username": "alice", "exp": NOW + 60}),
            );
            assert_eq!(
                codec().verify_at(&token, NOW),
                Err(TokenError::InvalidSignature)
            );
        }
    }

    #[test]
    fn rejects_other_hmac_algorithms_even_with_the_right_key() {
        for alg in [Algorithm::HS384, Algorithm::HS512] {
            let token = sign(alg, KEY, &json!({"username": "alice", "exp": NOW + 60}));
            assert_eq!(
                codec().verify_at(&token, NOW),
                Err(TokenError::UnsupportedAlgorithm)
            );
        }
    }

    #[test]
    fn rejects_alg_none() {
        let header = b64(&json!({"alg": "none", "typ": "JWT"}));
        let payload = b64(&json!({"username": "alice", "exp": NOW + 60}));
        let token = format!("{header}.{payload}.");

        assert_eq!(
            codec().verify_at(&token, NOW),
            Err(TokenError::UnsupportedAlgorithm)
        );
    }

    #[test]
    fn rejects_asymmetric_and_unknown_algorithms() {
        let payload = b64(&json!({"username": "alice"}));
        for alg in ["RS256", "EdDSA", "ES256", "hs256", "HS1024"] {
            let header = b64(&json!({"alg": alg, "typ": "JWT"}));
            let token = format!("{header}.{payload}.c2lnbmF0dXJl");
            assert_eq!(
                codec().verify_at(&token, NOW),
                Err(TokenError::UnsupportedAlgorithm),
                "alg {alg}"
            );
        }
    }

    #[test]
    fn trusts_only_the_configured_algorithm() {
        let mut cfg = config(MissingExpiryPolicy::Allow);
        cfg.token_algorithm = Algorithm::HS512;
        let codec = TokenCodec::new(&cfg);

        let hs512 = sign(Algorithm::HS512, KEY, &json!({"username": "alice"}));
        let hs256 = sign(Algorithm::HS256, KEY, &json!({"username": "alice"}));

        assert!(codec.verify_at(&hs512, NOW).is_ok());
        assert_eq!(
            codec.verify_at(&hs256, NOW),
            Err(TokenError::UnsupportedAlgorithm)
        );
    }

    #[test]
    fn structural_garbage_is_malformed() {
        let not_an_object = sign(Algorithm::HS256, KEY, &json!(["not", "an", "object"]));
        let no_alg = b64(&json!({"typ": "JWT"}));

        for token in [
            String::new(),
            "not-a-token".to_string(),
            "a.b".to_string(),
            "a.b.c.d".to_string(),
            "!!!.e30.sig".to_string(),
            format!("{no_alg}.e30.sig"),
            not_an_object,
        ] {
            assert_eq!(
                codec().verify_at(&token, NOW),
                Err(TokenError::Malformed),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn expiry_boundaries() {
        let codec = codec();
        let past = sign(Algorithm::HS256, KEY, &json!({"username": "a", "exp": NOW - 1}));
        let equal = sign(Algorithm::HS256, KEY, &json!({"username": "a", "exp": NOW}));
        let future = sign(Algorithm::HS256, KEY, &json!({"username": "a", "exp": NOW + 1}));

        assert_eq!(codec.verify_at(&past, NOW), Err(TokenError::Expired));
        assert_eq!(codec.verify_at(&equal, NOW), Err(TokenError::Expired));
        assert!(codec.verify_at(&future, NOW).is_ok());
    }

    #[test]
    fn fractional_exp_still_valid_within_its_last_second() {
        let token = sign(
            Algorithm::HS256,
            KEY,
            &json!({"username": "a", "exp": (NOW as f64) + 0.9}),
        );
        assert!(codec().verify_at(&token, NOW).is_ok());
        assert_eq!(
            codec().verify_at(&token, NOW + 1),
            Err(TokenError::Expired)
        );

        // whole-valued float keeps the `exp == now` rule
        let whole = sign(
            Algorithm::HS256,
            KEY,
            &json!({"username": "a", "exp": NOW as f64}),
        );
        assert_eq!(codec().verify_at(&whole, NOW), Err(TokenError::Expired));
        assert!(codec().verify_at(&whole, NOW - 1).is_ok());
    }

    #[test]
    fn absent_or_non_numeric_exp_follows_policy() {
        let absent = sign(Algorithm::HS256, KEY, &json!({"username": "a"}));
        let text = sign(
            Algorithm::HS256,
            KEY,
            &json!({"username": "a", "exp": "tomorrow"}),
        );

        let allow = codec();
        assert!(allow.verify_at(&absent, NOW).is_ok());
        assert!(allow.verify_at(&text, NOW).is_ok());

        let reject = TokenCodec::new(&config(MissingExpiryPolicy::Reject));
        assert_eq!(
            reject.verify_at(&absent, NOW),
            Err(TokenError::MissingExpiry)
        );
        assert_eq!(reject.verify_at(&text, NOW), Err(TokenError::MissingExpiry));
    }

    #[test]
    fn signature_is_checked_before_expiry() {
        let token = sign(
            Algorithm::HS256,
            "wrong",
            &json!({"username": "a", "exp": NOW - 100}),
        );
        assert_eq!(
            codec().verify_at(&token, NOW),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn debug_does_not_leak_key() {
        let out = format!("{:?}", codec());
        assert!(!out.contains(KEY));
    }
}
