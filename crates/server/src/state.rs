use std::path::PathBuf;
use std::sync::Arc;

use db::DBService;
use services::services::{
    auth::AdminTokens,
    config::Config,
    dispatch::WebhookDispatcher,
    storage::{ObjectStore, StorageError},
    upload::UploadService,
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Shared handle threaded through every route.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    config: Arc<RwLock<Config>>,
    store: ObjectStore,
    uploads: UploadService,
    dispatcher: WebhookDispatcher,
    admin_tokens: Arc<AdminTokens>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        db: DBService,
        config: Config,
        storage_root: PathBuf,
    ) -> Result<Self, StorageError> {
        let store = ObjectStore::new(storage_root)?;
        let uploads = UploadService::new(store.clone(), config.upload.clone());
        let dispatcher = WebhookDispatcher::new(db.conn.clone(), config.webhook.clone());
        Ok(Self {
            db,
            config: Arc::new(RwLock::new(config)),
            store,
            uploads,
            dispatcher,
            admin_tokens: Arc::new(AdminTokens::new()),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn uploads(&self) -> &UploadService {
        &self.uploads
    }

    pub fn dispatcher(&self) -> &WebhookDispatcher {
        &self.dispatcher
    }

    pub fn admin_tokens(&self) -> &AdminTokens {
        &self.admin_tokens
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
