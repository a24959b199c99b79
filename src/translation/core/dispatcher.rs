//! 翻译调度器
//!
//! 先逐行查缓存，把未命中的行按原顺序交给当前服务商，再按下标合并回完整结果。
//! 没有可用服务商时，未命中的行直接返回原文，计入 `unrouted`，不算作服务商回退。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use futures::FutureExt;
use serde::Serialize;

use crate::translation::core::handle::{spawn_translation, spawn_with_callback, TranslationHandle};
use crate::translation::error::{helpers, TranslationError};
use crate::translation::provider::{
    requested_language, AdapterStats, ProviderAdapter, TranslationProvider,
};
use crate::translation::storage::CacheStore;

/// 缓存查找后的中间结果
struct Partition {
    /// 每个位置的译文，未命中为 `None`
    resolved: Vec<Option<String>>,
    /// 未命中的 (下标, 原文)，保持输入顺序
    misses: Vec<(usize, String)>,
}

impl Partition {
    fn finish(self, lines: &[String]) -> Vec<String> {
        self.resolved
            .into_iter()
            .zip(lines)
            .map(|(resolved, original)| resolved.unwrap_or_else(|| original.clone()))
            .collect()
    }
}

/// 翻译调度器
///
/// 克隆后共享同一缓存、服务商和统计。
#[derive(Clone)]
pub struct TranslationDispatcher {
    cache: Arc<dyn CacheStore>,
    provider: Arc<RwLock<Option<ProviderAdapter>>>,
    stats: Arc<DispatcherStats>,
}

impl TranslationDispatcher {
    pub fn new(cache: Arc<dyn CacheStore>, provider: Option<ProviderAdapter>) -> Self {
        Self {
            cache,
            provider: Arc::new(RwLock::new(provider)),
            stats: Arc::new(DispatcherStats::default()),
        }
    }

    /// 用调度器自己的缓存包装服务商
    pub fn with_provider(cache: Arc<dyn CacheStore>, provider: Arc<dyn TranslationProvider>) -> Self {
        let adapter = ProviderAdapter::new(provider, cache.clone());
        Self::new(cache, Some(adapter))
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// 替换当前服务商，`None` 表示停用翻译
    pub fn set_provider(&self, provider: Option<ProviderAdapter>) {
        let name = provider.as_ref().map(ProviderAdapter::name).unwrap_or("none");
        *self.provider.write().unwrap_or_else(PoisonError::into_inner) = provider;
        tracing::info!("翻译服务商已切换为: {}", name);
    }

    pub fn active_provider_name(&self) -> Option<&'static str> {
        self.active_provider().map(|adapter| adapter.name())
    }

    fn active_provider(&self) -> Option<ProviderAdapter> {
        self.provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// 当前服务商自切换以来的请求统计
    pub fn provider_stats(&self) -> Option<AdapterStats> {
        self.active_provider().map(|adapter| adapter.stats())
    }

    /// 查缓存并划分命中/未命中
    fn partition(&self, lines: &[String], lang: &str) -> Partition {
        self.stats.requests.fetch_add(1, Ordering::Relaxed);
        self.stats.lines.fetch_add(lines.len() as u64, Ordering::Relaxed);

        let mut resolved = Vec::with_capacity(lines.len());
        let mut misses = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            let hit = self.cache.lookup(lang, line);
            if hit.is_none() {
                misses.push((index, line.clone()));
            }
            resolved.push(hit);
        }

        let hits = lines.len() - misses.len();
        self.stats.cache_hits.fetch_add(hits as u64, Ordering::Relaxed);
        self.stats.cache_misses.fetch_add(misses.len() as u64, Ordering::Relaxed);
        tracing::debug!("缓存命中 {}/{} 行 ({})", hits, lines.len(), lang);

        Partition { resolved, misses }
    }

    /// 翻译未命中的行并合并
    async fn resolve(&self, mut partition: Partition, lines: &[String], lang: &str) -> Vec<String> {
        if partition.misses.is_empty() {
            return partition.finish(lines);
        }

        let Some(adapter) = self.active_provider() else {
            self.stats.unrouted.fetch_add(1, Ordering::Relaxed);
            helpers::log_error(&TranslationError::ProviderUnavailable(format!(
                "{} 行返回原文",
                partition.misses.len()
            )));
            return partition.finish(lines);
        };

        let sources: Vec<String> = partition.misses.iter().map(|(_, line)| line.clone()).collect();
        self.stats.provider_calls.fetch_add(1, Ordering::Relaxed);
        let outcome = adapter.translate_outcome(&sources, Some(lang)).await;
        if outcome.is_fallback() {
            self.stats.fallbacks.fetch_add(1, Ordering::Relaxed);
        }

        for ((index, _), translated) in partition.misses.iter().zip(outcome.into_lines()) {
            partition.resolved[*index] = Some(translated);
        }
        partition.finish(lines)
    }

    /// 在当前任务中翻译
    pub async fn translate_now(&self, lines: &[String], target_lang: Option<&str>) -> Vec<String> {
        let Some(lang) = requested_language(target_lang) else {
            return lines.to_vec();
        };

        let partition = self.partition(lines, lang);
        self.resolve(partition, lines, lang).await
    }

    /// 翻译一批行，返回只完成一次的句柄
    ///
    /// 目标语言为空或全部命中缓存时句柄立即就绪，不会访问网络。
    pub fn translate(&self, lines: Vec<String>, target_lang: Option<&str>) -> TranslationHandle {
        let Some(lang) = requested_language(target_lang) else {
            return TranslationHandle::ready(lines);
        };

        let partition = self.partition(&lines, lang);
        if partition.misses.is_empty() {
            return TranslationHandle::ready(partition.finish(&lines));
        }

        let dispatcher = self.clone();
        let lang = lang.to_string();
        let fallback = lines.clone();
        spawn_translation(
            async move { dispatcher.resolve(partition, &lines, &lang).await }.boxed(),
            fallback,
        )
    }

    /// 翻译一批行，完成后在工作线程上调用一次 `on_complete`
    pub fn translate_with<F>(&self, lines: Vec<String>, target_lang: Option<&str>, on_complete: F)
    where
        F: FnOnce(Vec<String>) + Send + 'static,
    {
        let dispatcher = self.clone();
        let lang = target_lang.map(str::to_string);
        let fallback = lines.clone();
        spawn_with_callback(
            async move { dispatcher.translate_now(&lines, lang.as_deref()).await }.boxed(),
            fallback,
            on_complete,
        );
    }
}

/// 调度统计
#[derive(Debug, Default)]
pub struct DispatcherStats {
    pub requests: AtomicU64,
    pub lines: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub provider_calls: AtomicU64,
    pub fallbacks: AtomicU64,
    /// 没有服务商可用而直接返回原文的请求
    pub unrouted: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            lines: self.lines.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            provider_calls: self.provider_calls.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            unrouted: self.unrouted.load(Ordering::Relaxed),
        }
    }
}

/// 调度统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub requests: u64,
    pub lines: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub provider_calls: u64,
    pub fallbacks: u64,
    pub unrouted: u64,
}
