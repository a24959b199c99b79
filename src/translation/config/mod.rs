//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{
    BaiduConfig, CacheBackend, ConfigManager, MicrosoftConfig, ProviderKind, TranslationConfig,
};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    /// 批量请求中连接/切分各行的分隔符，已持久化的缓存和服务商约定都依赖这个字面值
    pub const BATCH_DELIMITER: &str = "{NL}";

    // 默认翻译设置
    pub const DEFAULT_TARGET_LANG: &str = "en";
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    // 缓存设置
    pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;
    pub const DEFAULT_CACHE_PATH: &str = "~/.cache/line-translator/translations.redb";

    // 签名盐值范围 [0, SALT_BOUND)
    pub const SALT_BOUND: u32 = 100_000;

    // 服务商端点
    pub const BAIDU_API_URL: &str = "https://fanyi-api.baidu.com/api/trans/vip/translate?q={0}&from=auto&to={1}&appid={2}&salt={3}&sign={4}";
    pub const MICROSOFT_API_URL: &str =
        "https://api.cognitive.microsofttranslator.com/translate?api-version=3.0&to={to}";
    pub const MICROSOFT_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
    pub const MICROSOFT_REGION_HEADER: &str = "Ocp-Apim-Subscription-Region";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "line-translator.toml",
        ".line-translator.toml",
        "~/.config/line-translator/config.toml",
        "/etc/line-translator/config.toml",
    ];
}
