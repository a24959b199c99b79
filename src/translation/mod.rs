//! 翻译模块
//!
//! 按行缓存、批量发送、失败回退原文的翻译层：
//! - **core**: 翻译服务、调度器和结果交付
//! - **provider**: 服务商适配（百度、微软）
//! - **net**: 网络边界和 HTTP 实现
//! - **sign**: 请求签名
//! - **storage**: 翻译缓存
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use line_translator::translation::{HttpNetwork, TranslationConfig, TranslationService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TranslationConfig::default_with_lang("fr");
//! let net = HttpNetwork::from_config(&config)?;
//! let service = TranslationService::from_config(&config, Arc::new(net))?;
//!
//! let translated = service.translate(vec!["Hello".into(), "World".into()]).await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块 - 配置文件、环境变量和默认值
pub mod config;

/// 核心模块 - 翻译服务、调度器、结果句柄
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 网络边界模块
pub mod net;

/// 服务商适配模块
pub mod provider;

/// 请求签名
pub mod sign;

/// 存储管理模块 - 翻译结果缓存
pub mod storage;

// ============================================================================
// 公共接口重新导出
// ============================================================================

pub use config::{
    constants::BATCH_DELIMITER, CacheBackend, ConfigManager, ProviderKind, TranslationConfig,
};
pub use core::{
    DispatcherStatsSnapshot, HealthLevel, HealthStatus, TranslationDispatcher, TranslationHandle,
    TranslationService,
};
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};
#[cfg(feature = "http")]
pub use net::HttpNetwork;
pub use net::{ApiArgs, ApiResponse, Endpoint, Endpoints, NetworkBoundary, UrlId};
pub use provider::{
    create_provider, join_lines, split_lines, AdapterStats, BaiduProvider, MicrosoftProvider,
    ProviderAdapter, TranslationOutcome, TranslationProvider,
};
pub use sign::{generate_salt, BaiduSigner, SignatureCodec};
#[cfg(feature = "disk-cache")]
pub use storage::DiskCacheStore;
pub use storage::{
    create_cache, BoundedCacheStore, CacheEntry, CacheKey, CacheStats, CacheStore,
    MemoryCacheStore,
};
