pub mod app_config;
pub mod redis_repo;

use std::sync::Arc;

use seatline_core::{MemorySeatRepository, SeatRepository};

pub use redis_repo::RedisSeatRepository;
pub use app_config::{Config, StorageBackend};

#[derive(Debug, thiserror::Error)]
pub enum StoreSetupError {
    #[error("storage.redis_url is required for the redis backend")]
    MissingRedisUrl,

    #[error("Redis connection failed: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Build the seat repository selected by `storage.backend`.
pub async fn open_repository(
    storage: &app_config::StorageConfig,
) -> Result<Arc<dyn SeatRepository>, StoreSetupError> {
    match storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory seat store");
            Ok(Arc::new(MemorySeatRepository::new()))
        }
        StorageBackend::Redis => {
            let url = storage
                .redis_url
                .as_deref()
                .ok_or(StoreSetupError::MissingRedisUrl)?;
            Ok(Arc::new(RedisSeatRepository::new(url).await?))
        }
    }
}
