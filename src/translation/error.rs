//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。翻译路径上的所有错误最终都在
//! `ProviderAdapter` 这一层被转换为"返回原文"，不会传递给调用方。

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误（传输层失败）
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 服务商明确返回的错误码
    #[error("{provider} 返回错误 {code}: {message}")]
    ProviderError {
        provider: String,
        code: String,
        message: String,
    },

    /// 响应结构与预期不符
    #[error("响应格式异常: {0}")]
    MalformedResponse(String),

    /// 分隔符切分后的段数与请求不一致
    #[error("分段数量不匹配: 期望 {expected}, 实际 {actual}")]
    SegmentMismatch { expected: usize, actual: usize },

    /// 本地签名失败
    #[error("签名失败: {0}")]
    SignatureError(String),

    /// 缓存错误
    #[error("缓存错误: {0}")]
    CacheError(String),

    /// 没有可用的翻译服务商
    #[error("翻译服务商不可用: {0}")]
    ProviderUnavailable(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl TranslationError {
    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::ProviderError { .. } => ErrorSeverity::Warning,
            TranslationError::MalformedResponse(_) => ErrorSeverity::Warning,
            TranslationError::SegmentMismatch { .. } => ErrorSeverity::Warning,
            TranslationError::SignatureError(_) => ErrorSeverity::Warning,
            TranslationError::CacheError(_) => ErrorSeverity::Warning,
            TranslationError::ProviderUnavailable(_) => ErrorSeverity::Info,
            TranslationError::InternalError(_) => ErrorSeverity::Error,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::NetworkError(_) => ErrorCategory::Network,
            TranslationError::ProviderError { .. } => ErrorCategory::Provider,
            TranslationError::MalformedResponse(_) => ErrorCategory::Malformed,
            TranslationError::SegmentMismatch { .. } => ErrorCategory::Malformed,
            TranslationError::SignatureError(_) => ErrorCategory::Signature,
            TranslationError::CacheError(_) => ErrorCategory::Cache,
            TranslationError::ProviderUnavailable(_) => ErrorCategory::Configuration,
            TranslationError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// 服务商错误码（仅 `ProviderError` 有）
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            TranslationError::ProviderError { code, .. } => Some(code),
            _ => None,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let new_msg = format!("{} (上下文: {})", self, context);

        match self {
            TranslationError::ConfigError(_) => TranslationError::ConfigError(new_msg),
            TranslationError::NetworkError(_) => TranslationError::NetworkError(new_msg),
            TranslationError::MalformedResponse(_) => TranslationError::MalformedResponse(new_msg),
            TranslationError::SignatureError(_) => TranslationError::SignatureError(new_msg),
            TranslationError::CacheError(_) => TranslationError::CacheError(new_msg),
            TranslationError::ProviderUnavailable(_) => {
                TranslationError::ProviderUnavailable(new_msg)
            }
            TranslationError::InternalError(_) => TranslationError::InternalError(new_msg),
            // 结构化变体保留原字段
            other @ (TranslationError::ProviderError { .. }
            | TranslationError::SegmentMismatch { .. }) => other,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别，对应网络失败、服务商错误、响应异常、签名失败四类回退原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Provider,
    Malformed,
    Signature,
    Cache,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Network => "network",
            ErrorCategory::Provider => "provider",
            ErrorCategory::Malformed => "malformed",
            ErrorCategory::Signature => "signature",
            ErrorCategory::Cache => "cache",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// 标准错误转换
impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::NetworkError(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::MalformedResponse(format!("JSON解析错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<toml::ser::Error> for TranslationError {
    fn from(error: toml::ser::Error) -> Self {
        TranslationError::ConfigError(format!("TOML序列化错误: {}", error))
    }
}

impl From<config::ConfigError> for TranslationError {
    fn from(error: config::ConfigError) -> Self {
        TranslationError::ConfigError(format!("配置错误: {}", error))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            TranslationError::MalformedResponse(format!("响应解码失败: {}", error))
        } else {
            TranslationError::NetworkError(error.to_string())
        }
    }
}

#[cfg(feature = "disk-cache")]
impl From<redb::Error> for TranslationError {
    fn from(error: redb::Error) -> Self {
        TranslationError::CacheError(format!("磁盘缓存错误: {}", error))
    }
}

/// redb 各阶段的错误都归入缓存错误
#[cfg(feature = "disk-cache")]
macro_rules! impl_from_redb {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for TranslationError {
                fn from(error: $ty) -> Self {
                    TranslationError::from(redb::Error::from(error))
                }
            }
        )*
    };
}

#[cfg(feature = "disk-cache")]
impl_from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }
    }

    /// 创建网络错误
    pub fn network_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::NetworkError(msg.to_string())
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }

    /// 创建响应格式错误
    pub fn malformed<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::MalformedResponse(msg.to_string())
    }

    /// 创建服务商错误
    pub fn provider_error(provider: &str, code: impl Into<String>, message: impl Into<String>) -> TranslationError {
        TranslationError::ProviderError {
            provider: provider.to_string(),
            code: code.into(),
            message: message.into(),
        }
    }
}
