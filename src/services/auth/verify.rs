//! Access-token (JWT) verification against the provider's JWKS.
//!
//! Verification is staged so each failure mode maps to a distinct error:
//! structural parse → algorithm allow-list → key lookup → signature →
//! standard claims. The allow-list check runs before any key material is
//! touched, which kills the classic downgrade where a token is re-signed
//! with `none` or an HMAC algorithm keyed with the public key.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;
use tracing::{error, warn};

use super::error::AuthError;
use super::jwks::JwksCache;

const ALLOWED_ALG: &str = "RS256";

/// Decoded, fully verified token payload.
///
/// Standard claims are typed; everything else the token carried is kept in
/// `extra` so handlers receive the complete claim set.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub iss: Option<String>,
    // String or array on the wire; kept raw and matched below.
    #[serde(default)]
    pub aud: serde_json::Value,
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: u64,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// The part of the token header we act on. Parsed by hand (not through
// `jsonwebtoken`) so that an unknown algorithm name is still readable and
// can be rejected as unsupported instead of failing as unparseable.
#[derive(Debug, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

/// RS256 access-token verifier backed by a [`JwksCache`].
pub struct AuthService {
    jwks: JwksCache,
    issuer: String,
    audience: String,
    leeway_seconds: u64,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl AuthService {
    pub fn new(jwks: JwksCache, issuer: String, audience: String, leeway_seconds: u64) -> Self {
        Self {
            jwks,
            issuer,
            audience,
            leeway_seconds,
        }
    }

    /// Verify a bearer token and return its decoded claims.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        // 1) Structural: three segments, decodable header.
        let header = decode_token_header(token)?;

        // 2) Algorithm allow-list, before any key lookup or signature work.
        if header.alg != ALLOWED_ALG {
            warn!(alg = %header.alg, "rejected token with disallowed algorithm");
            return Err(AuthError::UnsupportedAlgorithm);
        }

        let kid = header.kid.ok_or(AuthError::TokenMalformed)?;

        // 3) Key lookup; one refresh on miss to pick up provider rotation.
        let (keys, generation) = self.jwks.get().await?;
        let jwk = match keys.find(&kid) {
            Some(jwk) => jwk.clone(),
            None => {
                let (keys, _) = self.jwks.refresh(generation).await?;
                match keys.find(&kid) {
                    Some(jwk) => jwk.clone(),
                    None => {
                        warn!(%kid, "no matching signing key after refresh");
                        return Err(AuthError::UnknownSigningKey);
                    }
                }
            }
        };

        // 4) Rebuild the verification key from the JWK components.
        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| {
            // The provider published a key we cannot use: a service fault,
            // not a statement about this caller's token.
            error!(error = %e, kid = %jwk.kid, "unusable RSA components in JWKS entry");
            AuthError::JwksUnavailable
        })?;

        // 5) Signature over header + payload. Claim checks are done by hand
        // below, so only the signature (and payload shape) can fail here.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.remove("exp");

        let data = jsonwebtoken::decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => {
                    warn!(error = %e, "token payload rejected");
                    AuthError::TokenMalformed
                }
            })?;
        let claims = data.claims;

        // 6) Standard claims, in order: expiry, audience, issuer.
        let now = current_timestamp();
        if claims.exp.saturating_add(self.leeway_seconds) <= now {
            return Err(AuthError::TokenExpired);
        }

        if !audience_matches(&claims.aud, &self.audience) {
            warn!("token audience does not include the expected audience");
            return Err(AuthError::ClaimValidationFailed);
        }

        if claims.iss.as_deref() != Some(self.issuer.as_str()) {
            warn!("token issuer does not match the expected issuer");
            return Err(AuthError::ClaimValidationFailed);
        }

        Ok(claims)
    }
}

fn decode_token_header(token: &str) -> Result<TokenHeader, AuthError> {
    let mut segments = token.split('.');
    let header = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(header), Some(_), Some(_), None) => header,
        _ => return Err(AuthError::TokenMalformed),
    };

    let raw = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::TokenMalformed)?;

    serde_json::from_slice(&raw).map_err(|_| AuthError::TokenMalformed)
}

// `aud` is a string for single-audience tokens, an array otherwise.
fn audience_matches(aud: &serde_json::Value, expected: &str) -> bool {
    match aud {
        serde_json::Value::String(s) => s == expected,
        serde_json::Value::Array(items) => {
            items.iter().any(|item| item.as_str() == Some(expected))
        }
        _ => false,
    }
}

fn current_timestamp() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn encode_segment(value: &serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(value.to_string())
    }

    #[test]
    fn header_decoding_requires_three_segments() {
        for token in ["", "abc", "a.b", "a.b.c.d"] {
            assert_eq!(
                decode_token_header(token).unwrap_err(),
                AuthError::TokenMalformed,
                "token: {token:?}"
            );
        }
    }

    #[test]
    fn header_decoding_rejects_garbage_segments() {
        assert_eq!(
            decode_token_header("!!!.payload.sig").unwrap_err(),
            AuthError::TokenMalformed
        );

        let not_json = URL_SAFE_NO_PAD.encode("not json");
        assert_eq!(
            decode_token_header(&format!("{not_json}.payload.sig")).unwrap_err(),
            AuthError::TokenMalformed
        );
    }

    #[test]
    fn header_decoding_reads_alg_and_kid() {
        let segment = encode_segment(&json!({"alg": "RS256", "kid": "key-1", "typ": "JWT"}));
        let header = decode_token_header(&format!("{segment}.payload.sig")).unwrap();

        assert_eq!(header.alg, "RS256");
        assert_eq!(header.kid.as_deref(), Some("key-1"));
    }

    #[test]
    fn header_decoding_accepts_unknown_algorithm_names() {
        // `none` must surface as a readable algorithm so the verifier can
        // reject it as unsupported rather than unparseable.
        let segment = encode_segment(&json!({"alg": "none"}));
        let header = decode_token_header(&format!("{segment}.payload.")).unwrap();

        assert_eq!(header.alg, "none");
        assert!(header.kid.is_none());
    }

    #[test]
    fn audience_matching_covers_string_and_array_forms() {
        assert!(audience_matches(&json!("drinks"), "drinks"));
        assert!(audience_matches(&json!(["other", "drinks"]), "drinks"));
        assert!(!audience_matches(&json!("other"), "drinks"));
        assert!(!audience_matches(&json!(["other"]), "drinks"));
        assert!(!audience_matches(&json!(null), "drinks"));
        assert!(!audience_matches(&json!(42), "drinks"));
    }
}
