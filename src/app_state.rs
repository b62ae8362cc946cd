use std::sync::Arc;
use tracing::info;

use crate::{
    config::Config,
    infrastructure::{
        cache_layer::ResponseCache,
        database::{DocumentRepository, EntityStore},
        sqlite_database::SqliteEntityStore,
    },
    moderation::{ModerationWorkflow, ReportLedger},
    services::{AdminService, CourseService, PostService, ProfessorService},
};

/// Everything a request handler can reach. Built once from `Config` and
/// cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn EntityStore>,
    pub cache: ResponseCache,
    pub posts: PostService,
    pub courses: CourseService,
    pub professors: ProfessorService,
    pub admin: AdminService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize entity store
        let store: Arc<dyn EntityStore> = if config.database.url.contains(":memory:") {
            Arc::new(SqliteEntityStore::new_in_memory().await?)
        } else {
            Arc::new(
                SqliteEntityStore::new(&config.database.url, config.database.max_connections)
                    .await?,
            )
        };

        // Initialize response cache; an unreachable backend leaves it disabled
        let cache = ResponseCache::from_config(&config.cache).await;

        Ok(Self::from_parts(config, store, cache))
    }

    pub fn from_parts(config: Config, store: Arc<dyn EntityStore>, cache: ResponseCache) -> Self {
        let ledger = ReportLedger::new(config.moderation.report_threshold);
        let workflow = ModerationWorkflow::new(DocumentRepository::new(store.clone()), ledger);

        Self {
            posts: PostService::new(workflow.clone()),
            courses: CourseService::new(workflow.clone()),
            professors: ProfessorService::new(workflow.clone()),
            admin: AdminService::new(workflow),
            config,
            store,
            cache,
        }
    }

    /// Release the store's connections. Called after the server stops accepting requests.
    pub async fn shutdown(&self) {
        self.store.close().await;
        info!("Application state shut down");
    }
}
