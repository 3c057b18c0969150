//! JWKS (JSON Web Key Set) fetch + cache.
//!
//! The identity provider publishes its public signing keys as a JSON
//! document. We fetch it lazily on the first verification, keep it for the
//! process lifetime (optionally bounded by a TTL), and replace the whole set
//! on refresh. A refresh is triggered when a verification lookup cannot find
//! the token's `kid` (key rotation), at most once per failed lookup.
//!
//! Concurrency:
//! - readers always see a complete set (the cache slot holds an `Arc` that
//!   is swapped under a write lock)
//! - simultaneous misses share one in-flight fetch: refreshes queue on an
//!   async mutex and re-check the generation counter after acquiring it

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error};
use url::Url;

use super::error::AuthError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One usable verification key. Only RSA entries carrying the components we
/// can rebuild an RS256 key from are kept; everything else in the provider's
/// document is dropped at parse time.
#[derive(Debug, Clone)]
pub struct Jwk {
    pub kid: String,
    pub n: String,
    pub e: String,
}

#[derive(Debug, Default)]
pub struct KeySet {
    keys: Vec<Jwk>,
}

impl KeySet {
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid == kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// Raw wire shape. Unrecognized fields are ignored; entries missing what we
// need (or of a non-RSA key type) are filtered out rather than failing the
// whole document.
#[derive(Debug, Deserialize)]
struct RawJwk {
    #[serde(default)]
    kid: Option<String>,
    #[serde(default)]
    kty: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<RawJwk>,
}

impl From<JwksDocument> for KeySet {
    fn from(document: JwksDocument) -> Self {
        let keys = document
            .keys
            .into_iter()
            .filter_map(|raw| match raw {
                RawJwk {
                    kid: Some(kid),
                    kty: Some(kty),
                    n: Some(n),
                    e: Some(e),
                } if kty == "RSA" => Some(Jwk { kid, n, e }),
                _ => None,
            })
            .collect();

        Self { keys }
    }
}

#[derive(Default)]
struct CacheSlot {
    keys: Option<Arc<KeySet>>,
    fetched_at: Option<Instant>,
    // Bumped on every replace. Lets a caller that observed a miss ask for
    // "a set newer than the one I saw" without racing other refreshers.
    generation: u64,
}

/// Process-wide cache of the provider's key set.
///
/// Constructed once at startup and shared by reference across all in-flight
/// requests (`AppState` holds it behind an `Arc`).
pub struct JwksCache {
    url: Url,
    client: reqwest::Client,
    ttl: Option<Duration>,
    slot: RwLock<CacheSlot>,
    refresh_gate: Mutex<()>,
}

impl std::fmt::Debug for JwksCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksCache")
            .field("url", &self.url.as_str())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwksCache {
    /// `ttl` of `None` keeps a fetched set for the process lifetime;
    /// rotation is still picked up through refresh-on-miss.
    pub fn new(url: Url, ttl: Option<Duration>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;

        Ok(Self {
            url,
            client,
            ttl,
            slot: RwLock::new(CacheSlot::default()),
            refresh_gate: Mutex::new(()),
        })
    }

    /// Current key set plus the generation it belongs to. Fetches when the
    /// cache is cold or past its TTL.
    pub async fn get(&self) -> Result<(Arc<KeySet>, u64), AuthError> {
        let seen = {
            let slot = self.slot.read().await;
            if let Some(keys) = &slot.keys {
                if !self.is_stale(&slot) {
                    return Ok((Arc::clone(keys), slot.generation));
                }
            }
            slot.generation
        };

        self.refresh(seen).await
    }

    /// Replace the cached set, coalescing concurrent callers.
    ///
    /// `seen` is the generation the caller last observed. If another task
    /// already replaced the set by the time the gate is acquired, the cached
    /// set is returned without touching the network, which bounds
    /// refresh-on-miss to a single fetch per failed lookup.
    pub async fn refresh(&self, seen: u64) -> Result<(Arc<KeySet>, u64), AuthError> {
        let _gate = self.refresh_gate.lock().await;

        {
            let slot = self.slot.read().await;
            if slot.generation != seen {
                if let Some(keys) = &slot.keys {
                    return Ok((Arc::clone(keys), slot.generation));
                }
            }
        }

        let keys = Arc::new(self.fetch().await?);
        debug!(count = keys.len(), "replaced cached JWKS");

        let mut slot = self.slot.write().await;
        slot.keys = Some(Arc::clone(&keys));
        slot.fetched_at = Some(Instant::now());
        slot.generation += 1;

        Ok((keys, slot.generation))
    }

    fn is_stale(&self, slot: &CacheSlot) -> bool {
        match (self.ttl, slot.fetched_at) {
            (Some(ttl), Some(fetched_at)) => fetched_at.elapsed() > ttl,
            _ => false,
        }
    }

    async fn fetch(&self) -> Result<KeySet, AuthError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "failed to reach JWKS endpoint");
                AuthError::JwksUnavailable
            })?;

        if !response.status().is_success() {
            error!(status = %response.status(), "JWKS endpoint returned an error status");
            return Err(AuthError::JwksUnavailable);
        }

        let document: JwksDocument = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse JWKS document");
            AuthError::JwksUnavailable
        })?;

        Ok(KeySet::from(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> KeySet {
        let document: JwksDocument = serde_json::from_str(json).unwrap();
        KeySet::from(document)
    }

    #[test]
    fn keeps_rsa_entries_and_ignores_extra_fields() {
        let set = parse(
            r#"{"keys": [
                {"kid": "a", "kty": "RSA", "n": "nn", "e": "AQAB", "use": "sig", "x5c": ["zzz"]},
                {"kid": "b", "kty": "RSA", "n": "mm", "e": "AQAB"}
            ]}"#,
        );

        assert_eq!(set.len(), 2);
        assert_eq!(set.find("a").unwrap().n, "nn");
        assert_eq!(set.find("b").unwrap().e, "AQAB");
    }

    #[test]
    fn drops_non_rsa_and_incomplete_entries() {
        let set = parse(
            r#"{"keys": [
                {"kid": "ec", "kty": "EC", "crv": "P-256", "x": "x", "y": "y"},
                {"kid": "no-components", "kty": "RSA"},
                {"kty": "RSA", "n": "nn", "e": "AQAB"}
            ]}"#,
        );

        assert!(set.is_empty());
    }

    #[test]
    fn find_matches_kid_exactly() {
        let set = parse(r#"{"keys": [{"kid": "key-1", "kty": "RSA", "n": "nn", "e": "AQAB"}]}"#);

        assert!(set.find("key-1").is_some());
        assert!(set.find("key-2").is_none());
        assert!(set.find("KEY-1").is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_service_fault() {
        // Nothing listens on this port.
        let url = Url::parse("http://127.0.0.1:1/.well-known/jwks.json").unwrap();
        let cache = JwksCache::new(url, None).unwrap();

        assert_eq!(cache.get().await.unwrap_err(), AuthError::JwksUnavailable);
    }
}
