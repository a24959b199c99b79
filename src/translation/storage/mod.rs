//! 存储模块
//!
//! 提供翻译缓存：内存、LRU 和磁盘三种后端，共享 `CacheStore` 接口。

pub mod cache;
#[cfg(feature = "disk-cache")]
pub mod disk;

use std::sync::Arc;

pub use cache::{
    BoundedCacheStore, CacheEntry, CacheKey, CacheStats, CacheStore, MemoryCacheStore,
};
#[cfg(feature = "disk-cache")]
pub use disk::DiskCacheStore;

use crate::translation::config::{CacheBackend, TranslationConfig};
use crate::translation::error::TranslationResult;

/// 按配置创建缓存
pub fn create_cache(config: &TranslationConfig) -> TranslationResult<Arc<dyn CacheStore>> {
    match config.cache_backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryCacheStore::new())),
        CacheBackend::Bounded => Ok(Arc::new(BoundedCacheStore::new(config.cache_capacity))),
        #[cfg(feature = "disk-cache")]
        CacheBackend::Disk => Ok(Arc::new(DiskCacheStore::open(config.expanded_cache_path())?)),
        #[cfg(not(feature = "disk-cache"))]
        CacheBackend::Disk => Err(crate::translation::error::helpers::config_error(
            "磁盘缓存需要启用 disk-cache 特性",
        )),
    }
}
