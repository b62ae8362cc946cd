// Response Cache - memoized read responses with write-side invalidation
//
// The cache is an accelerator only: every backend failure is logged and
// treated as a miss, and a disabled cache turns every call into a no-op.

use async_trait::async_trait;
use axum::http::Method;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::{CacheBackendKind, CacheConfig};
use crate::core::generate_id;
use crate::error::{AppError, AppResult};
use crate::infrastructure::cache::Cache;

const RESPONSE_PREFIX: &str = "resp:";
const GENERATION_PREFIX: &str = "gen:";
/// Generation shared by every scope; admin writes replace it.
const GLOBAL_GENERATION: &str = "__all";
const REDIS_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
/// Path scope whose reads are never cached and whose writes touch every scope.
const ADMIN_SCOPE: &str = "admin";

/// Key-value store behind the response cache.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;
    async fn set_with_expiration(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()>;
}

/// In-process backend over a bounded LRU map.
pub struct MemoryCacheBackend {
    entries: Mutex<Cache<String, Vec<u8>>>,
}

impl MemoryCacheBackend {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Cache::new(capacity)),
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let mut entries = self.entries.lock().await;
        Ok(entries.get(&key.to_string()).cloned())
    }

    async fn set_with_expiration(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value, ttl);
        Ok(())
    }
}

/// Redis backend. The connection manager reconnects on its own after a drop.
pub struct RedisCacheBackend {
    connection: ConnectionManager,
}

impl RedisCacheBackend {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| AppError::CacheUnavailable(format!("invalid redis url: {}", e)))?;
        let config = ConnectionManagerConfig::new().set_number_of_retries(1);
        let connection = tokio::time::timeout(
            REDIS_CONNECT_TIMEOUT,
            client.get_connection_manager_with_config(config),
        )
        .await
        .map_err(|_| AppError::CacheUnavailable(format!("redis connect to {} timed out", url)))?
        .map_err(|e| AppError::CacheUnavailable(format!("redis connect failed: {}", e)))?;
        info!("Connected to Redis at {}", url);
        Ok(Self { connection })
    }
}

fn redis_error(e: redis::RedisError) -> AppError {
    AppError::CacheUnavailable(e.to_string())
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        conn.get::<_, Option<Vec<u8>>>(key).await.map_err(redis_error)
    }

    async fn set_with_expiration(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(redis_error)
    }
}

/// A stored response: status plus the raw JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Clone)]
pub struct ResponseCache {
    backend: Option<Arc<dyn CacheBackend>>,
    ttl: Duration,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("enabled", &self.backend.is_some())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ResponseCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend: Some(backend),
            ttl,
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            ttl: Duration::ZERO,
        }
    }

    /// Build the cache named by the configuration. An unreachable Redis
    /// disables caching instead of failing startup.
    pub async fn from_config(config: &CacheConfig) -> Self {
        let ttl = Duration::from_secs(config.ttl_secs);
        match config.backend {
            CacheBackendKind::Memory => {
                info!("Response cache: in-memory, capacity {}", config.capacity);
                Self::new(Arc::new(MemoryCacheBackend::new(config.capacity)), ttl)
            }
            CacheBackendKind::Redis => match RedisCacheBackend::connect(&config.redis_url).await {
                Ok(backend) => Self::new(Arc::new(backend), ttl),
                Err(e) => {
                    warn!("Response cache disabled: {}", e);
                    Self::disabled()
                }
            },
            CacheBackendKind::Disabled => {
                info!("Response cache disabled by configuration");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Content hash of method, URI and, for non-idempotent methods, the body.
    pub fn derive_key(method: &Method, uri: &str, body: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(method.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(uri.as_bytes());
        if !is_read_method(method) {
            hasher.update(b"\n");
            hasher.update(body);
        }
        format!("{}{}", RESPONSE_PREFIX, hex::encode(hasher.finalize()))
    }

    /// The key a GET of `uri` would be stored under.
    pub fn read_key(uri: &str) -> String {
        Self::derive_key(&Method::GET, uri, &[])
    }

    /// Whether GETs of this path may be served from or stored in the cache.
    pub fn is_cacheable_path(path: &str) -> bool {
        matches!(scope_of(path), Some(scope) if scope != ADMIN_SCOPE)
    }

    /// Storage slot for a read of `path` under `key`: the key qualified by the
    /// current global and scope generations.
    ///
    /// `None` means the read must bypass the cache: the cache is disabled, the
    /// path is not cacheable, or a generation could not be read.
    #[instrument(skip(self, key))]
    pub async fn slot(&self, path: &str, key: &str) -> Option<String> {
        if self.backend.is_none() || !Self::is_cacheable_path(path) {
            return None;
        }
        let scope = scope_of(path)?;
        let global = self.generation(GLOBAL_GENERATION).await?;
        let scoped = self.generation(&scope).await?;
        Some(format!("{}:{}:{}", key, global, scoped))
    }

    #[instrument(skip(self))]
    pub async fn lookup(&self, slot: &str) -> Option<CachedResponse> {
        let backend = self.backend.as_ref()?;
        match backend.get(slot).await {
            Ok(Some(bytes)) => match bincode::deserialize::<CachedResponse>(&bytes) {
                Ok(cached) => {
                    debug!("cache hit");
                    Some(cached)
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry: {}", e);
                    None
                }
            },
            Ok(None) => {
                debug!("cache miss");
                None
            }
            Err(e) => {
                warn!("Cache lookup failed: {}", e);
                None
            }
        }
    }

    /// Store a successful read response in a slot obtained from [`ResponseCache::slot`].
    #[instrument(skip(self, response))]
    pub async fn store(&self, slot: &str, response: &CachedResponse) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };

        let bytes = match bincode::serialize(response) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode response for caching: {}", e);
                return;
            }
        };

        if let Err(e) = backend.set_with_expiration(slot, bytes, self.ttl).await {
            warn!("Cache store failed, response not cached: {}", e);
        }
    }

    /// Make every read a write to `uri` can make stale unreachable. Runs before
    /// the write's handler.
    ///
    /// A write replaces the generation of its scope (the first path segment
    /// after `/api`), which orphans every slot stored under the old one,
    /// including the read of `uri` itself. Admin writes reach across scopes,
    /// so they replace the global generation instead.
    #[instrument(skip(self))]
    pub async fn invalidate_for_write(&self, uri: &str) {
        if self.backend.is_none() {
            return;
        }

        let path = uri.split('?').next().unwrap_or(uri);
        match scope_of(path) {
            Some(scope) if scope == ADMIN_SCOPE => self.bump(GLOBAL_GENERATION).await,
            Some(scope) => self.bump(&scope).await,
            None => {}
        }
    }

    /// Current generation token for `name`. A missing token is replaced by a
    /// fresh one, never by a default, so an evicted or expired generation can
    /// not bring old slots back.
    async fn generation(&self, name: &str) -> Option<String> {
        let backend = self.backend.as_ref()?;
        let key = format!("{}{}", GENERATION_PREFIX, name);
        match backend.get(&key).await {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(token) => Some(token),
                Err(_) => {
                    warn!("Replacing undecodable cache generation {}", key);
                    self.bump(name).await;
                    None
                }
            },
            Ok(None) => {
                let token = generate_id();
                match backend
                    .set_with_expiration(&key, token.clone().into_bytes(), self.ttl)
                    .await
                {
                    Ok(()) => Some(token),
                    Err(e) => {
                        warn!("Cache generation {} could not be created: {}", key, e);
                        None
                    }
                }
            }
            Err(e) => {
                warn!("Cache generation {} unreadable: {}", key, e);
                None
            }
        }
    }

    async fn bump(&self, name: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let key = format!("{}{}", GENERATION_PREFIX, name);
        let token = generate_id();
        debug!(generation = %key, "invalidating");
        if let Err(e) = backend
            .set_with_expiration(&key, token.into_bytes(), self.ttl)
            .await
        {
            warn!("Cache invalidation failed for {}: {}", key, e);
        }
    }
}

pub fn is_read_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// First path segment after an optional leading `api` segment.
fn scope_of(path: &str) -> Option<String> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let first = segments.next()?;
    let scope = if first == "api" { segments.next()? } else { first };
    Some(scope.to_string())
}
