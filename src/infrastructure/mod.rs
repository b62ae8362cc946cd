// Infrastructure: document store, response cache, identity and request middleware
pub mod cache;                 // TTL-aware LRU map
pub mod cache_layer;           // Response cache and its backends
pub mod database;              // Entity store interface and typed repository
pub mod middleware;            // Identity and response-cache middleware
pub mod sqlite_database;       // SQLite entity store
pub mod viewer;                // Viewer context

pub use cache_layer::{CacheBackend, CachedResponse, MemoryCacheBackend, RedisCacheBackend, ResponseCache};
pub use database::{Document, DocumentFilter, DocumentRepository, EntityStore, PageRequest};
pub use sqlite_database::SqliteEntityStore;
pub use viewer::ViewerContext;
