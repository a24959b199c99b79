//! 翻译系统核心模块
//!
//! 调度缓存和服务商，向上层提供统一的翻译接口。
//!
//! ## 架构设计
//!
//! - **服务层** (`service.rs`): 按配置组装各组件，提供统一的翻译服务接口
//! - **调度层** (`dispatcher.rs`): 缓存查找、未命中行的服务商调用和按序合并
//! - **交付层** (`handle.rs`): 后台任务与只完成一次的结果句柄
//!
//! ## 模块依赖关系
//!
//! ```text
//! TranslationService (service.rs)
//!     └── TranslationDispatcher (dispatcher.rs)
//!             ├── CacheStore (storage/)
//!             └── ProviderAdapter (provider/)
//!                     └── NetworkBoundary (net/)
//! ```

pub mod dispatcher;
pub mod handle;
pub mod service;

// 重新导出核心类型和接口

/// 统一翻译服务 - 主要的对外接口
pub use service::TranslationService;

/// 翻译调度器
pub use dispatcher::{DispatcherStatsSnapshot, TranslationDispatcher};

/// 只完成一次的结果句柄
pub use handle::TranslationHandle;

/// 系统健康状态检查结果
pub use service::{HealthLevel, HealthStatus};
