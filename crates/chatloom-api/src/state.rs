//! Application state wiring the session manager together.
//!
//! AppState holds the concrete instances used by both CLI and REST API.
//! The session manager is generic over its store traits; AppState pins it to
//! the configured checkpoint backend and the SQLite metadata repository.

use std::path::PathBuf;
use std::sync::Arc;

use chatloom_core::llm::box_provider::BoxLlmProvider;
use chatloom_core::llm::generator::{GeneratorSettings, ResponseGenerator};
use chatloom_core::session::manager::SessionManager;
use chatloom_infra::backend::ConfiguredCheckpointStore;
use chatloom_infra::config::{load_config, resolve_data_dir};
use chatloom_infra::llm::create_provider_or_unconfigured;
use chatloom_infra::sqlite::metadata::SqliteMetadataRepository;
use chatloom_infra::sqlite::pool::DatabasePool;
use chatloom_types::config::AppConfig;

/// Session manager pinned to the infra implementations.
pub type ConcreteSessionManager =
    SessionManager<ConfiguredCheckpointStore, SqliteMetadataRepository>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<ConcreteSessionManager>,
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire the
    /// session manager.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("chatloom.db").display()
        );
        let pool = DatabasePool::new(&db_url).await?;

        let provider = create_provider_or_unconfigured(&config.llm);

        Self::build(data_dir, config, pool, provider)
    }

    /// Wire the session manager from already-opened parts.
    pub fn build(
        data_dir: PathBuf,
        config: AppConfig,
        pool: DatabasePool,
        provider: BoxLlmProvider,
    ) -> anyhow::Result<Self> {
        let checkpoints = ConfiguredCheckpointStore::open(config.checkpoint_backend, pool.clone());
        let metadata = SqliteMetadataRepository::new(pool);
        let generator = ResponseGenerator::new(provider, GeneratorSettings::from(&config.llm));

        tracing::debug!(
            backend = ?config.checkpoint_backend,
            provider = generator.provider().name(),
            model = %config.llm.model,
            "Session manager configured"
        );

        let sessions = SessionManager::new(checkpoints, metadata, generator)?;

        Ok(Self {
            sessions: Arc::new(sessions),
            config: Arc::new(config),
            data_dir,
        })
    }

    /// The user id to act as when a caller does not name one.
    pub fn user_or_default(&self, user: Option<String>) -> String {
        user.unwrap_or_else(|| self.config.default_user_id.clone())
    }
}
