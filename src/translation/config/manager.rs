//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值。
//! 加载顺序：默认值 → 第一个存在的配置文件 → `LINE_TRANSLATOR_*` 环境变量。

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use config::{Config, File};
use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::net::{BodyKind, Endpoint, Endpoints, UrlId};

/// 翻译服务商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ProviderKind {
    Baidu,
    #[default]
    Microsoft,
    /// 不翻译，所有未命中缓存的行返回原文
    None,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Baidu => f.write_str("baidu"),
            ProviderKind::Microsoft => f.write_str("microsoft"),
            ProviderKind::None => f.write_str("none"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = TranslationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "baidu" => Ok(ProviderKind::Baidu),
            "microsoft" | "azure" => Ok(ProviderKind::Microsoft),
            "none" | "off" => Ok(ProviderKind::None),
            other => Err(TranslationError::ConfigError(format!(
                "未知的翻译服务商 '{}'，可选: baidu, microsoft, none",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ProviderKind {
    type Error = TranslationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 缓存后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum CacheBackend {
    /// 无界内存缓存
    #[default]
    Memory,
    /// 固定容量的 LRU 缓存
    Bounded,
    /// redb 磁盘缓存
    Disk,
}

impl FromStr for CacheBackend {
    type Err = TranslationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "bounded" | "lru" => Ok(CacheBackend::Bounded),
            "disk" => Ok(CacheBackend::Disk),
            other => Err(TranslationError::ConfigError(format!(
                "未知的缓存后端 '{}'，可选: memory, bounded, disk",
                other
            ))),
        }
    }
}

impl TryFrom<String> for CacheBackend {
    type Error = TranslationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 百度翻译配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BaiduConfig {
    pub app_id: String,
    pub secret: String,
    pub endpoint: Endpoint,
}

impl Default for BaiduConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            secret: String::new(),
            endpoint: Endpoint::get(constants::BAIDU_API_URL),
        }
    }
}

/// 微软翻译配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MicrosoftConfig {
    pub subscription_key: Option<String>,
    pub region: Option<String>,
    pub endpoint: Endpoint,
}

impl Default for MicrosoftConfig {
    fn default() -> Self {
        Self {
            subscription_key: None,
            region: None,
            endpoint: Endpoint::post(constants::MICROSOFT_API_URL, BodyKind::JsonArray),
        }
    }
}

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 基础配置
    pub enabled: bool,
    pub target_lang: String,
    pub provider: ProviderKind,

    // 缓存配置
    pub cache_backend: CacheBackend,
    pub cache_capacity: usize,
    pub cache_path: String,

    // 网络配置
    pub request_timeout_secs: u64,

    // 服务商配置
    pub baidu: BaiduConfig,
    pub microsoft: MicrosoftConfig,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_lang: constants::DEFAULT_TARGET_LANG.to_string(),
            provider: ProviderKind::default(),

            cache_backend: CacheBackend::default(),
            cache_capacity: constants::DEFAULT_CACHE_CAPACITY,
            cache_path: constants::DEFAULT_CACHE_PATH.to_string(),

            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),

            baidu: BaiduConfig::default(),
            microsoft: MicrosoftConfig::default(),
        }
    }
}

impl TranslationConfig {
    /// 创建带指定语言的默认配置
    pub fn default_with_lang(target_lang: &str) -> Self {
        Self {
            target_lang: target_lang.to_string(),
            ..Self::default()
        }
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时不能为0".to_string()));
        }

        if self.cache_backend == CacheBackend::Bounded && self.cache_capacity == 0 {
            return Err(TranslationError::ConfigError(
                "LRU缓存容量不能为0".to_string(),
            ));
        }

        if self.cache_backend == CacheBackend::Disk && self.cache_path.trim().is_empty() {
            return Err(TranslationError::ConfigError(
                "磁盘缓存路径不能为空".to_string(),
            ));
        }

        self.endpoints().validate()?;

        // 缺少凭据时请求仍会发出，由远端拒绝后回退原文
        if self.provider == ProviderKind::Baidu
            && (self.baidu.app_id.is_empty() || self.baidu.secret.is_empty())
        {
            tracing::warn!("百度翻译未配置 appid 或密钥，所有请求都会被远端拒绝");
        }

        Ok(())
    }

    /// 应用环境变量覆盖（类型安全的环境变量系统）
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{cache, providers, translation, EnvVar};

        if let Some(enabled) = translation::Enabled::overridden() {
            self.enabled = enabled;
        }

        if let Some(target_lang) = translation::TargetLang::overridden() {
            self.target_lang = target_lang;
        }

        if let Some(provider) = translation::Provider::overridden() {
            self.provider = provider;
        }

        if let Some(timeout) = translation::RequestTimeout::overridden() {
            self.request_timeout_secs = timeout.as_secs();
        }

        if let Some(backend) = cache::Backend::overridden() {
            self.cache_backend = backend;
        }

        if let Some(capacity) = cache::Capacity::overridden() {
            self.cache_capacity = capacity;
        }

        if let Some(path) = cache::Path::overridden() {
            self.cache_path = path;
        }

        if let Some(app_id) = providers::BaiduAppId::overridden() {
            self.baidu.app_id = app_id;
        }

        if let Some(secret) = providers::BaiduSecret::overridden() {
            self.baidu.secret = secret;
        }

        if let Some(key) = providers::MicrosoftKey::overridden() {
            self.microsoft.subscription_key = Some(key);
        }

        if let Some(region) = providers::MicrosoftRegion::overridden() {
            self.microsoft.region = Some(region);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 磁盘缓存路径（展开 `~`）
    pub fn expanded_cache_path(&self) -> String {
        shellexpand::tilde(&self.cache_path).into_owned()
    }

    /// 构建端点注册表，微软的订阅密钥和区域作为请求头附加
    pub fn endpoints(&self) -> Endpoints {
        let mut endpoints = Endpoints::new();
        endpoints.insert(UrlId::BaiduTranslation, self.baidu.endpoint.clone());

        let mut microsoft = self.microsoft.endpoint.clone();
        if let Some(key) = &self.microsoft.subscription_key {
            microsoft = microsoft.with_header(constants::MICROSOFT_KEY_HEADER, key);
        }
        if let Some(region) = &self.microsoft.region {
            microsoft = microsoft.with_header(constants::MICROSOFT_REGION_HEADER, region);
        }
        endpoints.insert(UrlId::MicrosoftTranslation, microsoft);

        endpoints
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
    source: Option<String>,
}

impl ConfigManager {
    /// 创建新的配置管理器，按默认搜索路径查找配置文件
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();

        let source = constants::CONFIG_PATHS
            .iter()
            .map(|path| shellexpand::tilde(path).into_owned())
            .find(|path| Path::new(path).exists());

        Self::build(source)
    }

    /// 从指定文件加载
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();

        let expanded = shellexpand::tilde(path).into_owned();
        if !Path::new(&expanded).exists() {
            return Err(TranslationError::ConfigError(format!(
                "配置文件不存在: {}",
                expanded
            )));
        }

        Self::build(Some(expanded))
    }

    fn build(source: Option<String>) -> TranslationResult<Self> {
        let mut builder =
            Config::builder().add_source(Config::try_from(&TranslationConfig::default())?);

        match &source {
            Some(path) => {
                tracing::info!("加载配置文件: {}", path);
                builder = builder.add_source(File::with_name(path));
            }
            None => tracing::info!("未找到配置文件，使用默认配置"),
        }

        // 环境变量只经由类型化的覆盖处理，无效值告警后忽略
        let mut config: TranslationConfig = builder.build()?.try_deserialize()?;
        config.apply_env_overrides();
        config.validate()?;

        tracing::info!(
            "翻译配置 - 服务商: {}, 目标语言: {}, 缓存: {:?}",
            config.provider,
            config.target_lang,
            config.cache_backend
        );

        Ok(Self { config, source })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 实际加载的配置文件
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() {
                match dotenv::from_filename(env_file) {
                    Ok(_) => {
                        tracing::info!("已加载环境变量文件: {}", env_file);
                        break;
                    }
                    Err(e) => tracing::warn!("无法加载环境变量文件 {}: {}", env_file, e),
                }
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let content = toml::to_string_pretty(&TranslationConfig::default())?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TranslationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider, ProviderKind::Microsoft);
        assert_eq!(config.cache_backend, CacheBackend::Memory);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = TranslationConfig::default();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = TranslationConfig::default();
        config.cache_backend = CacheBackend::Bounded;
        config.cache_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = TranslationConfig::default();
        config.baidu.endpoint = Endpoint::get("ftp://example.com/{0}");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_baidu_credentials_is_not_fatal() {
        let mut config = TranslationConfig::default();
        config.provider = ProviderKind::Baidu;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_microsoft_headers_follow_credentials() {
        let mut config = TranslationConfig::default();
        config.microsoft.subscription_key = Some("secret-key".to_string());
        config.microsoft.region = Some("eastasia".to_string());

        let endpoints = config.endpoints();
        let endpoint = endpoints.get(UrlId::MicrosoftTranslation).unwrap();
        assert_eq!(
            endpoint.headers.get(constants::MICROSOFT_KEY_HEADER).map(String::as_str),
            Some("secret-key")
        );
        assert_eq!(
            endpoint.headers.get(constants::MICROSOFT_REGION_HEADER).map(String::as_str),
            Some("eastasia")
        );
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!("Baidu".parse::<ProviderKind>().unwrap(), ProviderKind::Baidu);
        assert_eq!("off".parse::<ProviderKind>().unwrap(), ProviderKind::None);
        assert!("google".parse::<ProviderKind>().is_err());
        assert_eq!("lru".parse::<CacheBackend>().unwrap(), CacheBackend::Bounded);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TranslationConfig = toml::from_str(
            r#"
            target_lang = "fr"
            provider = "baidu"

            [baidu]
            app_id = "2015063000000001"
            secret = "12345678"
            "#,
        )
        .unwrap();

        assert_eq!(config.target_lang, "fr");
        assert_eq!(config.provider, ProviderKind::Baidu);
        assert_eq!(config.baidu.endpoint.url, constants::BAIDU_API_URL);
        assert_eq!(config.cache_capacity, constants::DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn test_example_config_can_be_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line-translator.toml");
        let path = path.to_str().unwrap();

        ConfigManager::generate_example_config(path).unwrap();
        let manager = ConfigManager::from_file(path).unwrap();
        assert_eq!(manager.source(), Some(path));
        assert!(manager.get_config().enabled);
    }

    #[test]
    fn test_env_overrides_are_typed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bounded.toml");
        std::fs::write(&path, "cache_backend = \"bounded\"\ncache_capacity = 256\n").unwrap();
        let path = path.to_str().unwrap();

        // 无效值告警后忽略，保留文件中的值
        std::env::set_var("LINE_TRANSLATOR_CACHE_CAPACITY", "lots");
        let loaded = ConfigManager::from_file(path).map(|m| m.get_config().cache_capacity);
        std::env::remove_var("LINE_TRANSLATOR_CACHE_CAPACITY");
        assert_eq!(loaded.unwrap(), 256);

        // 字段名形式的变量不参与配置
        std::env::set_var("LINE_TRANSLATOR_REQUEST_TIMEOUT_SECS", "soon");
        let loaded = ConfigManager::from_file(path).map(|m| m.get_config().request_timeout_secs);
        std::env::remove_var("LINE_TRANSLATOR_REQUEST_TIMEOUT_SECS");
        assert_eq!(loaded.unwrap(), constants::DEFAULT_REQUEST_TIMEOUT.as_secs());

        // 有效值覆盖文件
        std::env::set_var("LINE_TRANSLATOR_TIMEOUT", "42");
        let loaded = ConfigManager::from_file(path);
        std::env::remove_var("LINE_TRANSLATOR_TIMEOUT");
        let manager = loaded.unwrap();
        assert_eq!(manager.get_config().request_timeout_secs, 42);
        assert_eq!(manager.get_config().cache_capacity, 256);
    }
}
