//! 翻译服务核心实现
//!
//! 本模块提供统一的翻译服务接口，按配置组装缓存、网络访问、服务商和调度器。
//! 这是翻译系统的主要入口点。
//!
//! ## 主要组件
//!
//! - `TranslationService`: 对外的翻译服务，持有配置和调度器
//! - `HealthStatus`: 服务健康状态监控
//!
//! ## 使用示例
//!
//! ```no_run
//! use line_translator::TranslationService;
//!
//! # async fn demo() -> line_translator::TranslationResult<()> {
//! let service = TranslationService::from_env()?;
//!
//! let lines = vec!["Hello".to_string(), "World".to_string()];
//! let translated = service.translate_to(lines, Some("fr")).await;
//! println!("{:?}", translated);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::translation::{
    config::{ProviderKind, TranslationConfig},
    core::dispatcher::{DispatcherStatsSnapshot, TranslationDispatcher},
    core::handle::TranslationHandle,
    error::TranslationResult,
    net::NetworkBoundary,
    provider::{create_provider_of, ProviderAdapter},
    storage::{create_cache, CacheStats, CacheStore},
};

/// 统一的翻译服务
///
/// 服务本身不持有可变状态：缓存和服务商槽位由调度器共享，统计使用原子计数，
/// 因此可以放进 `Arc` 在多个任务间共享。
///
/// - **配置**: 决定默认目标语言、服务商和缓存后端
/// - **网络边界**: 所有服务商共用，切换服务商时复用
/// - **调度器**: 缓存查找、服务商调用和结果合并
pub struct TranslationService {
    /// 创建服务时使用的配置
    config: TranslationConfig,

    /// 网络访问，切换服务商时传给新的服务商
    net: Arc<dyn NetworkBoundary>,

    /// 翻译调度器
    dispatcher: TranslationDispatcher,
}

impl TranslationService {
    /// 按配置创建翻译服务
    ///
    /// # 错误
    ///
    /// 以下情况返回错误：
    /// - 配置校验失败
    /// - 磁盘缓存无法打开
    ///
    /// 服务商的凭据问题不会在这里报错，请求发出后由远端拒绝并回退原文。
    pub fn from_config(
        config: &TranslationConfig,
        net: Arc<dyn NetworkBoundary>,
    ) -> TranslationResult<Self> {
        config.validate()?;

        let cache = create_cache(config)?;
        let provider = if config.enabled {
            create_provider_of(config.provider, config, net.clone())
                .map(|provider| ProviderAdapter::new(provider, cache.clone()))
        } else {
            tracing::info!("翻译功能已禁用");
            None
        };

        tracing::info!(
            "翻译服务已创建 - 服务商: {}, 目标语言: {}, 缓存: {} 条",
            provider.as_ref().map(ProviderAdapter::name).unwrap_or("none"),
            config.target_lang,
            cache.len()
        );

        Ok(Self {
            config: config.clone(),
            net,
            dispatcher: TranslationDispatcher::new(cache, provider),
        })
    }

    /// 从配置文件和环境变量创建，使用 HTTP 网络访问
    #[cfg(feature = "http")]
    pub fn from_env() -> TranslationResult<Self> {
        let manager = crate::translation::config::ConfigManager::new()?;
        let config = manager.get_config();
        let net = crate::translation::net::HttpNetwork::from_config(config)?;
        Self::from_config(config, Arc::new(net))
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &TranslationDispatcher {
        &self.dispatcher
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        self.dispatcher.cache()
    }

    /// 配置的默认目标语言，翻译功能禁用时为 `None`
    pub fn default_language(&self) -> Option<&str> {
        self.config
            .enabled
            .then_some(self.config.target_lang.as_str())
    }

    /// 翻译为配置的目标语言
    pub fn translate(&self, lines: Vec<String>) -> TranslationHandle {
        self.dispatcher.translate(lines, self.default_language())
    }

    /// 翻译为指定语言
    pub fn translate_to(&self, lines: Vec<String>, target_lang: Option<&str>) -> TranslationHandle {
        self.dispatcher.translate(lines, target_lang)
    }

    /// 翻译为配置的目标语言，完成后调用一次 `on_complete`
    pub fn translate_with<F>(&self, lines: Vec<String>, on_complete: F)
    where
        F: FnOnce(Vec<String>) + Send + 'static,
    {
        self.dispatcher
            .translate_with(lines, self.default_language(), on_complete)
    }

    /// 在当前任务中翻译为配置的目标语言
    pub async fn translate_now(&self, lines: &[String]) -> Vec<String> {
        self.dispatcher
            .translate_now(lines, self.default_language())
            .await
    }

    /// 切换服务商，缓存保持不变
    pub fn switch_provider(&self, kind: ProviderKind) {
        let provider = create_provider_of(kind, &self.config, self.net.clone())
            .map(|provider| ProviderAdapter::new(provider, self.cache().clone()));
        self.dispatcher.set_provider(provider);
    }

    /// 获取调度统计
    pub fn get_stats(&self) -> DispatcherStatsSnapshot {
        self.dispatcher.stats()
    }

    /// 获取缓存统计
    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }

    /// 检查服务健康状态
    ///
    /// - 没有可用服务商时 `provider` 为降级：缓存仍然可用，未命中的行返回原文
    /// - 翻译功能被禁用时 `translation` 为降级
    /// - 当前服务商的回退次数超过其调用次数的一半时 `provider` 为不健康，
    ///   切换服务商后重新计数
    ///
    /// # 示例
    ///
    /// ```no_run
    /// # use line_translator::{HealthLevel, TranslationService};
    /// # fn demo(service: &TranslationService) {
    /// let health = service.health();
    /// match health.overall {
    ///     HealthLevel::Healthy => println!("服务运行正常"),
    ///     HealthLevel::Degraded => println!("服务功能受限"),
    ///     HealthLevel::Unhealthy => println!("服务不可用"),
    /// }
    /// # }
    /// ```
    pub fn health(&self) -> HealthStatus {
        let mut components = HashMap::new();

        let provider = match self.dispatcher.provider_stats() {
            None => HealthLevel::Degraded,
            Some(stats) if stats.calls > 0 && stats.fallbacks * 2 > stats.calls => {
                HealthLevel::Unhealthy
            }
            Some(_) => HealthLevel::Healthy,
        };
        components.insert("provider".to_string(), provider);
        components.insert("cache".to_string(), HealthLevel::Healthy);
        components.insert(
            "translation".to_string(),
            if self.config.enabled {
                HealthLevel::Healthy
            } else {
                HealthLevel::Degraded
            },
        );

        // 根据各组件状态确定整体健康状态
        let overall = if components.values().any(|&level| level == HealthLevel::Unhealthy) {
            HealthLevel::Unhealthy
        } else if components.values().all(|&level| level == HealthLevel::Healthy) {
            HealthLevel::Healthy
        } else {
            HealthLevel::Degraded
        };

        HealthStatus {
            overall,
            components,
            provider: self.dispatcher.active_provider_name(),
            cached_lines: self.cache().len(),
        }
    }
}

/// 翻译服务的健康状态报告
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// 整体健康级别
    pub overall: HealthLevel,

    /// 各组件的健康状态，键为组件名称（"provider"、"cache"、"translation"）
    pub components: HashMap<String, HealthLevel>,

    /// 当前服务商名称
    pub provider: Option<&'static str>,

    /// 缓存条目数量
    pub cached_lines: usize,
}

/// 健康状态级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthLevel {
    /// 健康状态 - 组件运行正常
    Healthy,

    /// 降级状态 - 组件功能受限但仍可用
    Degraded,

    /// 不健康状态 - 组件无法正常工作
    Unhealthy,
}
