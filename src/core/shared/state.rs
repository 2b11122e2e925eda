use crate::core::config::AppConfig;
use crate::core::shared::utils::DbPool;
use crate::llm::ReasoningBackend;
use std::sync::Arc;

pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub backend: Arc<dyn ReasoningBackend>,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            config: self.config.clone(),
            backend: Arc::clone(&self.backend),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("conn", &"DbPool")
            .field("config", &self.config)
            .field("backend", &"Arc<dyn ReasoningBackend>")
            .finish()
    }
}
