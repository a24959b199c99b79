//! # line-translator
//!
//! 面向短文本行（聊天消息、物品名称、界面字符串）的机器翻译层：
//! 按行缓存、批量请求、任何失败都回退原文，结果异步且只交付一次。
//!
//! ## 模块组织
//!
//! - `translation` - 翻译服务、服务商适配、缓存和配置
//! - `env` - 类型安全的环境变量

pub mod env;
pub mod translation;

// Re-export commonly used items for convenience
pub use translation::{
    HealthLevel, HealthStatus, ProviderAdapter, TranslationConfig, TranslationDispatcher,
    TranslationError, TranslationHandle, TranslationResult, TranslationService,
};
