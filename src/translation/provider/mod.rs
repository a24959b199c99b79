//! 翻译服务商适配层
//!
//! 内层 [`TranslationProvider`] 负责某个服务商的请求构造和响应解析，可以失败；
//! 外层 [`ProviderAdapter`] 把所有失败统一转换为"返回原文"，成功时先写缓存再交付结果。
//!
//! 新增服务商只需要实现 `TranslationProvider` 并在 [`create_provider`] 中注册。

pub mod baidu;
pub mod microsoft;

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;

pub use baidu::BaiduProvider;
pub use microsoft::MicrosoftProvider;

use crate::translation::config::constants::BATCH_DELIMITER;
use crate::translation::config::{ProviderKind, TranslationConfig};
use crate::translation::core::handle::{spawn_translation, spawn_with_callback, TranslationHandle};
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::net::NetworkBoundary;
use crate::translation::sign::BaiduSigner;
use crate::translation::storage::CacheStore;

/// 翻译服务商
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// 翻译一批行，成功时返回与输入等长、顺序一致的译文
    fn request<'a>(
        &'a self,
        lines: &'a [String],
        target_lang: &'a str,
    ) -> BoxFuture<'a, TranslationResult<Vec<String>>>;
}

/// 用批量分隔符连接各行
pub fn join_lines(lines: &[String]) -> String {
    lines.join(BATCH_DELIMITER)
}

/// 按批量分隔符切分响应，段数必须等于 `expected`
pub fn split_lines(text: &str, expected: usize) -> TranslationResult<Vec<String>> {
    let segments: Vec<String> = text.split(BATCH_DELIMITER).map(str::to_string).collect();
    if segments.len() != expected {
        return Err(TranslationError::SegmentMismatch {
            expected,
            actual: segments.len(),
        });
    }
    Ok(segments)
}

/// 空或缺失的目标语言表示不需要翻译
pub(crate) fn requested_language(target_lang: Option<&str>) -> Option<&str> {
    target_lang.filter(|lang| !lang.trim().is_empty())
}

/// 一次翻译的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    /// 服务商返回了完整译文，已写入缓存
    Translated(Vec<String>),
    /// 没有请求翻译（目标语言为空或输入为空），原样返回
    Skipped(Vec<String>),
    /// 翻译失败，返回原文
    Fallback(Vec<String>),
}

impl TranslationOutcome {
    pub fn is_translated(&self) -> bool {
        matches!(self, TranslationOutcome::Translated(_))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TranslationOutcome::Fallback(_))
    }

    pub fn into_lines(self) -> Vec<String> {
        match self {
            TranslationOutcome::Translated(lines)
            | TranslationOutcome::Skipped(lines)
            | TranslationOutcome::Fallback(lines) => lines,
        }
    }
}

/// 单个适配器发出的请求次数和其中失败回退的次数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdapterStats {
    pub calls: u64,
    pub fallbacks: u64,
}

#[derive(Debug, Default)]
struct AdapterCounters {
    calls: AtomicU64,
    fallbacks: AtomicU64,
}

/// 服务商适配器
///
/// 对调用方永不失败：任何错误（包括服务商内部 panic）都以原文交付，且只交付一次。
/// 克隆共享同一组统计，切换服务商时新适配器从零开始计数。
#[derive(Clone)]
pub struct ProviderAdapter {
    provider: Arc<dyn TranslationProvider>,
    cache: Arc<dyn CacheStore>,
    counters: Arc<AdapterCounters>,
}

impl ProviderAdapter {
    pub fn new(provider: Arc<dyn TranslationProvider>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            provider,
            cache,
            counters: Arc::new(AdapterCounters::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    pub fn stats(&self) -> AdapterStats {
        AdapterStats {
            calls: self.counters.calls.load(Ordering::Relaxed),
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
        }
    }

    /// 翻译并报告结果类型
    pub async fn translate_outcome(
        &self,
        lines: &[String],
        target_lang: Option<&str>,
    ) -> TranslationOutcome {
        let Some(lang) = requested_language(target_lang) else {
            return TranslationOutcome::Skipped(lines.to_vec());
        };
        if lines.is_empty() {
            return TranslationOutcome::Skipped(Vec::new());
        }

        tracing::debug!("{} 翻译 {} 行 -> {}", self.name(), lines.len(), lang);
        self.counters.calls.fetch_add(1, Ordering::Relaxed);

        let result = AssertUnwindSafe(self.provider.request(lines, lang))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(TranslationError::InternalError(format!(
                    "服务商内部 panic: {}",
                    panic_message(panic.as_ref())
                )))
            })
            .and_then(|translated| {
                if translated.len() == lines.len() {
                    Ok(translated)
                } else {
                    Err(TranslationError::SegmentMismatch {
                        expected: lines.len(),
                        actual: translated.len(),
                    })
                }
            });

        match result {
            Ok(translated) => {
                self.cache.save(lang, lines, &translated);
                TranslationOutcome::Translated(translated)
            }
            Err(error) => {
                self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    provider = self.name(),
                    category = %error.category(),
                    code = error.provider_code().unwrap_or("-"),
                    lines = lines.len(),
                    "翻译失败，返回原文: {}",
                    error
                );
                TranslationOutcome::Fallback(lines.to_vec())
            }
        }
    }

    /// 在当前任务中翻译
    pub async fn translate_now(&self, lines: &[String], target_lang: Option<&str>) -> Vec<String> {
        self.translate_outcome(lines, target_lang).await.into_lines()
    }

    /// 在后台翻译，返回只完成一次的句柄
    pub fn translate(&self, lines: Vec<String>, target_lang: Option<&str>) -> TranslationHandle {
        let Some(lang) = requested_language(target_lang) else {
            return TranslationHandle::ready(lines);
        };

        let adapter = self.clone();
        let lang = lang.to_string();
        let fallback = lines.clone();
        spawn_translation(
            async move { adapter.translate_now(&lines, Some(&lang)).await }.boxed(),
            fallback,
        )
    }

    /// 在后台翻译，完成后在工作线程上调用一次 `on_complete`
    pub fn translate_with<F>(&self, lines: Vec<String>, target_lang: Option<&str>, on_complete: F)
    where
        F: FnOnce(Vec<String>) + Send + 'static,
    {
        let adapter = self.clone();
        let lang = target_lang.map(str::to_string);
        let fallback = lines.clone();
        spawn_with_callback(
            async move { adapter.translate_now(&lines, lang.as_deref()).await }.boxed(),
            fallback,
            on_complete,
        );
    }
}

impl std::fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("provider", &self.name())
            .field("cached_lines", &self.cache.len())
            .finish()
    }
}

/// 错误码可能是字符串也可能是数字
pub(crate) fn code_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(code) => code.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "未知原因".to_string()
    }
}

/// 按配置创建服务商，`ProviderKind::None` 返回 `None`
pub fn create_provider(
    config: &TranslationConfig,
    net: Arc<dyn NetworkBoundary>,
) -> Option<Arc<dyn TranslationProvider>> {
    create_provider_of(config.provider, config, net)
}

/// 创建指定类型的服务商
pub fn create_provider_of(
    kind: ProviderKind,
    config: &TranslationConfig,
    net: Arc<dyn NetworkBoundary>,
) -> Option<Arc<dyn TranslationProvider>> {
    tracing::info!("初始化翻译服务商: {}", kind);

    match kind {
        ProviderKind::Baidu => {
            let signer = BaiduSigner::new(config.baidu.app_id.clone(), config.baidu.secret.clone());
            Some(Arc::new(BaiduProvider::new(net, signer)))
        }
        ProviderKind::Microsoft => Some(Arc::new(MicrosoftProvider::new(net))),
        ProviderKind::None => None,
    }
}
