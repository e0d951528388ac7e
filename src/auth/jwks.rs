use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

/// Timeout for a single key set request
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum spacing between refetches triggered by an unknown `kid`
pub const DEFAULT_MIN_REFRESH: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("key set request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Where the issuer's public signing keys come from
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, KeySetError>;
}

/// Fetches a JWKS document over HTTP(S)
pub struct HttpKeySetSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpKeySetSource {
    pub fn new(url: Url) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        let keys = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;
        info!("Fetched {} signing keys from {}", keys.keys.len(), self.url);
        Ok(keys)
    }
}

/// A fixed key set for unit tests
#[cfg(test)]
pub struct StaticKeySet(pub JwkSet);

#[cfg(test)]
#[async_trait]
impl KeySetSource for StaticKeySet {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        Ok(self.0.clone())
    }
}

struct CachedKeySet {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Caches the issuer key set for `ttl`, refetching when a `kid` is not found
pub struct KeyCache {
    source: Arc<dyn KeySetSource>,
    ttl: Duration,
    min_refresh: Duration,
    cached: RwLock<Option<CachedKeySet>>,
}

impl KeyCache {
    pub fn new(source: Arc<dyn KeySetSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            min_refresh: DEFAULT_MIN_REFRESH,
            cached: RwLock::new(None),
        }
    }

    pub fn with_min_refresh(mut self, min_refresh: Duration) -> Self {
        self.min_refresh = min_refresh;
        self
    }

    /// Look up a signing key by id.
    ///
    /// A fresh cached set answers directly. An expired or missing set is
    /// refetched. A `kid` miss on a fresh set refetches at most once per
    /// `min_refresh` so rotated keys are picked up without a restart.
    pub async fn find(&self, kid: &str) -> Result<Option<Jwk>, KeySetError> {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref() {
                let age = entry.fetched_at.elapsed();
                if age < self.ttl {
                    if let Some(jwk) = entry.keys.find(kid) {
                        return Ok(Some(jwk.clone()));
                    }
                    if age < self.min_refresh {
                        return Ok(None);
                    }
                    debug!("Key id '{}' not in cached key set; refetching", kid);
                }
            }
        }

        let keys = self.refresh().await?;
        Ok(keys.find(kid).cloned())
    }

    async fn refresh(&self) -> Result<JwkSet, KeySetError> {
        let keys = self.source.fetch().await?;
        let mut cached = self.cached.write().await;
        *cached = Some(CachedKeySet {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn key_set(kids: &[&str]) -> JwkSet {
        let keys: Vec<serde_json::Value> = kids
            .iter()
            .map(|kid| {
                serde_json::json!({
                    "kty": "RSA",
                    "kid": kid,
                    "use": "sig",
                    "alg": "RS256",
                    "n": "sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1WlUzewbgBHod5pcM9H95GQRV3JDXboIRROSBigeC5yjU1hGzHHyXss8UDprecbAYxknTcQkhslANGRUZmdTOQ5qTRsLAt6BTYuyvVRdhS8exSZEy_c4gs_7svlJJQ4H9_NxsiIoLwAEk7-Q3UXERGYw_75IDrGA84-lA_-Ct4eTlXHBIY2EaV7t7LjJaynVJCpkv4LKjTTAumiGUIuQhrNhZLuF_RJLqHpM2kgWFLU7-VTdL1VbC2tejvcI2BlMkEpk1BzBZI0KQB0GaDWFLN-aEAw3vRw",
                    "e": "AQAB"
                })
            })
            .collect();
        serde_json::from_value(serde_json::json!({ "keys": keys })).unwrap()
    }

    struct CountingSource {
        keys: Mutex<JwkSet>,
        fetches: AtomicUsize,
    }

    impl CountingSource {
        fn new(keys: JwkSet) -> Self {
            Self {
                keys: Mutex::new(keys),
                fetches: AtomicUsize::new(0),
            }
        }

        fn rotate(&self, keys: JwkSet) {
            *self.keys.lock().unwrap() = keys;
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KeySetSource for CountingSource {
        async fn fetch(&self) -> Result<JwkSet, KeySetError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.keys.lock().unwrap().clone())
        }
    }

    #[tokio::test]
    async fn serves_hits_from_cache() {
        let source = Arc::new(CountingSource::new(key_set(&["a"])));
        let cache = KeyCache::new(source.clone(), Duration::from_secs(600));

        assert!(cache.find("a").await.unwrap().is_some());
        assert!(cache.find("a").await.unwrap().is_some());
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn refetches_on_kid_miss_after_rotation() {
        let source = Arc::new(CountingSource::new(key_set(&["old"])));
        let cache =
            KeyCache::new(source.clone(), Duration::from_secs(600)).with_min_refresh(Duration::ZERO);

        assert!(cache.find("old").await.unwrap().is_some());
        source.rotate(key_set(&["new"]));

        assert!(cache.find("new").await.unwrap().is_some());
        assert_eq!(source.fetches(), 2);
        assert!(cache.find("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn kid_misses_are_throttled() {
        let source = Arc::new(CountingSource::new(key_set(&["a"])));
        let cache = KeyCache::new(source.clone(), Duration::from_secs(600));

        assert!(cache.find("a").await.unwrap().is_some());
        assert!(cache.find("unknown").await.unwrap().is_none());
        assert!(cache.find("unknown").await.unwrap().is_none());
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn expired_set_is_refetched() {
        let source = Arc::new(CountingSource::new(key_set(&["a"])));
        let cache = KeyCache::new(source.clone(), Duration::ZERO);

        cache.find("a").await.unwrap();
        cache.find("a").await.unwrap();
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn static_key_set_never_fails() {
        let source = StaticKeySet(key_set(&["a", "b"]));
        assert_eq!(source.fetch().await.unwrap().keys.len(), 2);
    }
}
