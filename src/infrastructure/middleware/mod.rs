// Request middleware: identity first, then the response cache.

pub mod response_cache_middleware;
pub mod viewer_context_extractor;
pub mod viewer_context_middleware;

pub use response_cache_middleware::response_cache_middleware;
pub use viewer_context_extractor::Vc;
pub use viewer_context_middleware::viewer_context_middleware;
