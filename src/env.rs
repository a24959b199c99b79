//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量管理。所有变量以 `LINE_TRANSLATOR_` 为前缀，
//! 在配置文件之后应用，覆盖文件中的同名设置。

use std::env;
use std::fmt;
use std::time::Duration;

use crate::translation::config::{CacheBackend, ProviderKind};

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }

    /// 仅当变量被显式设置且合法时返回值，非法值记录警告后忽略
    fn overridden() -> Option<T> {
        let value = env::var(Self::NAME).ok()?;
        match Self::parse(&value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("忽略无效的环境变量: {}", e);
                None
            }
        }
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志过滤器（tracing-subscriber EnvFilter 语法）
    pub struct Log;
    impl EnvVar<String> for Log {
        const NAME: &'static str = "LINE_TRANSLATOR_LOG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str =
            "Log filter, e.g. 'info' or 'line_translator=debug' (falls back to RUST_LOG, then 'warn')";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("warn".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let filter = value.trim();
            if filter.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Log filter cannot be empty".to_string(),
                });
            }
            Ok(filter.to_string())
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 翻译功能启用状态
    pub struct Enabled;
    impl EnvVar<bool> for Enabled {
        const NAME: &'static str = "LINE_TRANSLATOR_ENABLED";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Enable translation; when disabled every line is returned as-is";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 目标语言
    pub struct TargetLang;
    impl EnvVar<String> for TargetLang {
        const NAME: &'static str = "LINE_TRANSLATOR_TARGET_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Target language code, e.g. 'fr', 'zh', 'zh-TW'";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("en".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let lang = value.trim();
            let valid = lang
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !valid || lang.len() > 16 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid language code '{}'", value),
                });
            }
            Ok(lang.to_string())
        }
    }

    /// 翻译服务商
    pub struct Provider;
    impl EnvVar<ProviderKind> for Provider {
        const NAME: &'static str = "LINE_TRANSLATOR_PROVIDER";
        const DEFAULT: Option<ProviderKind> = Some(ProviderKind::Microsoft);
        const DESCRIPTION: &'static str = "Translation provider: baidu, microsoft, none";

        fn parse(value: &str) -> EnvResult<ProviderKind> {
            value.parse().map_err(|e| EnvError {
                variable: Self::NAME.to_string(),
                message: format!("{}", e),
            })
        }
    }

    /// 请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "LINE_TRANSLATOR_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(10));
        const DESCRIPTION: &'static str = "Provider request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;

            if seconds == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout must be greater than 0".to_string(),
                });
            }

            if seconds > 300 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout too long (max 300 seconds)".to_string(),
                });
            }

            Ok(Duration::from_secs(seconds))
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 缓存后端
    pub struct Backend;
    impl EnvVar<CacheBackend> for Backend {
        const NAME: &'static str = "LINE_TRANSLATOR_CACHE_BACKEND";
        const DEFAULT: Option<CacheBackend> = Some(CacheBackend::Memory);
        const DESCRIPTION: &'static str = "Cache backend: memory, bounded, disk";

        fn parse(value: &str) -> EnvResult<CacheBackend> {
            value.parse().map_err(|e| EnvError {
                variable: Self::NAME.to_string(),
                message: format!("{}", e),
            })
        }
    }

    /// LRU 缓存容量
    pub struct Capacity;
    impl EnvVar<usize> for Capacity {
        const NAME: &'static str = "LINE_TRANSLATOR_CACHE_CAPACITY";
        const DEFAULT: Option<usize> = Some(10_000);
        const DESCRIPTION: &'static str = "Bounded cache capacity (number of lines)";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 10_000_000)
        }
    }

    /// 磁盘缓存文件
    pub struct Path;
    impl EnvVar<String> for Path {
        const NAME: &'static str = "LINE_TRANSLATOR_CACHE_PATH";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Disk cache database file";

        fn parse(value: &str) -> EnvResult<String> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Cache path cannot be empty".to_string(),
                });
            }
            Ok(path.to_string())
        }
    }
}

/// 服务商凭据
pub mod providers {
    use super::*;

    /// 百度 appid
    pub struct BaiduAppId;
    impl EnvVar<String> for BaiduAppId {
        const NAME: &'static str = "LINE_TRANSLATOR_BAIDU_APP_ID";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Baidu translation app id";

        fn parse(value: &str) -> EnvResult<String> {
            parse_credential(value, Self::NAME)
        }
    }

    /// 百度密钥
    pub struct BaiduSecret;
    impl EnvVar<String> for BaiduSecret {
        const NAME: &'static str = "LINE_TRANSLATOR_BAIDU_SECRET";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Baidu translation secret key";

        fn parse(value: &str) -> EnvResult<String> {
            parse_credential(value, Self::NAME)
        }
    }

    /// 微软订阅密钥
    pub struct MicrosoftKey;
    impl EnvVar<String> for MicrosoftKey {
        const NAME: &'static str = "LINE_TRANSLATOR_MICROSOFT_KEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Microsoft translator subscription key";

        fn parse(value: &str) -> EnvResult<String> {
            parse_credential(value, Self::NAME)
        }
    }

    /// 微软资源区域
    pub struct MicrosoftRegion;
    impl EnvVar<String> for MicrosoftRegion {
        const NAME: &'static str = "LINE_TRANSLATOR_MICROSOFT_REGION";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Microsoft translator resource region";

        fn parse(value: &str) -> EnvResult<String> {
            parse_credential(value, Self::NAME)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_credential(value: &str, var_name: &str) -> EnvResult<String> {
    let credential = value.trim();
    if credential.is_empty() {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "Value cannot be empty".to_string(),
        });
    }
    Ok(credential.to_string())
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");

    let mut entry = |name: &str, description: &str| {
        docs.push_str(&format!("- `{}`: {}\n", name, description));
    };

    entry(core::Log::NAME, core::Log::DESCRIPTION);
    entry(translation::Enabled::NAME, translation::Enabled::DESCRIPTION);
    entry(translation::TargetLang::NAME, translation::TargetLang::DESCRIPTION);
    entry(translation::Provider::NAME, translation::Provider::DESCRIPTION);
    entry(translation::RequestTimeout::NAME, translation::RequestTimeout::DESCRIPTION);
    entry(cache::Backend::NAME, cache::Backend::DESCRIPTION);
    entry(cache::Capacity::NAME, cache::Capacity::DESCRIPTION);
    entry(cache::Path::NAME, cache::Path::DESCRIPTION);
    entry(providers::BaiduAppId::NAME, providers::BaiduAppId::DESCRIPTION);
    entry(providers::BaiduSecret::NAME, providers::BaiduSecret::DESCRIPTION);
    entry(providers::MicrosoftKey::NAME, providers::MicrosoftKey::DESCRIPTION);
    entry(providers::MicrosoftRegion::NAME, providers::MicrosoftRegion::DESCRIPTION);

    docs
}
