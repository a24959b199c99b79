//! 翻译缓存模块
//!
//! 按行缓存翻译结果，键为 (目标语言, 原文)。批量请求中的每一行单独成条，
//! 不同批次里相同的行会命中同一条缓存。

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lru::LruCache;
use serde::{Deserialize, Serialize};

// ============================================================================
// 核心类型
// ============================================================================

/// 缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub target_lang: String,
    pub source: String,
}

impl CacheKey {
    pub fn new(target_lang: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            target_lang: target_lang.into(),
            source: source.into(),
        }
    }

    /// 持久化存储中使用的稳定摘要
    ///
    /// 各字段带长度前缀，`("ab", "c")` 与 `("a", "bc")` 不会冲突。
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in [&self.target_lang, &self.source] {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// 缓存条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub target_lang: String,
    pub source: String,
    pub translated: String,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// 创建新的缓存条目
    pub fn new(
        target_lang: impl Into<String>,
        source: impl Into<String>,
        translated: impl Into<String>,
    ) -> Self {
        Self {
            target_lang: target_lang.into(),
            source: source.into(),
            translated: translated.into(),
            created_at: Utc::now(),
        }
    }

    /// 生成缓存键
    pub fn key(&self) -> CacheKey {
        CacheKey::new(self.target_lang.clone(), self.source.clone())
    }
}

/// 缓存统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub rejected_saves: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    /// 计算缓存命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// 缓存存储
///
/// `lookup` 是纯读取，不会失败；`save` 要求两个序列等长，否则记录警告、不写入。
pub trait CacheStore: Send + Sync {
    /// 查找单行的翻译
    fn lookup(&self, language: &str, line: &str) -> Option<String>;

    /// 按下标逐行写入翻译结果
    fn save(&self, language: &str, source_lines: &[String], translated_lines: &[String]);

    /// 条目数量
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 获取统计信息
    fn stats(&self) -> CacheStats;

    /// 清空缓存
    fn clear(&self);
}

// ============================================================================
// 统计计数
// ============================================================================

/// 各缓存实现共用的原子计数器
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    rejected_saves: AtomicU64,
    evictions: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn record_lookup(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("line_translator_cache_hits_total").increment(1);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("line_translator_cache_misses_total").increment(1);
        }
    }

    pub(crate) fn record_writes(&self, count: usize) {
        self.writes.fetch_add(count as u64, Ordering::Relaxed);
        metrics::counter!("line_translator_cache_writes_total").increment(count as u64);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            rejected_saves: self.rejected_saves.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries,
        }
    }

    /// 校验 `save` 的输入，长度不一致时记录警告并返回 `None`
    pub(crate) fn entries_to_save(
        &self,
        language: &str,
        source_lines: &[String],
        translated_lines: &[String],
    ) -> Option<Vec<CacheEntry>> {
        if source_lines.len() != translated_lines.len() {
            self.rejected_saves.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "缓存写入被拒绝: 原文 {} 行，译文 {} 行 (语言: {})",
                source_lines.len(),
                translated_lines.len(),
                language
            );
            return None;
        }

        Some(
            source_lines
                .iter()
                .zip(translated_lines)
                .map(|(source, translated)| CacheEntry::new(language, source.as_str(), translated.as_str()))
                .collect(),
        )
    }
}

// ============================================================================
// 实现
// ============================================================================

/// 无界内存缓存
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<CacheKey, CacheEntry>,
    counters: CacheCounters,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取完整条目
    pub fn entry(&self, language: &str, line: &str) -> Option<CacheEntry> {
        self.entries
            .get(&CacheKey::new(language, line))
            .map(|entry| entry.clone())
    }

    pub(crate) fn insert(&self, entry: CacheEntry) {
        self.entries.insert(entry.key(), entry);
    }
}

impl CacheStore for MemoryCacheStore {
    fn lookup(&self, language: &str, line: &str) -> Option<String> {
        let found = self
            .entries
            .get(&CacheKey::new(language, line))
            .map(|entry| entry.translated.clone());
        self.counters.record_lookup(found.is_some());
        found
    }

    fn save(&self, language: &str, source_lines: &[String], translated_lines: &[String]) {
        let Some(entries) = self
            .counters
            .entries_to_save(language, source_lines, translated_lines)
        else {
            return;
        };

        self.counters.record_writes(entries.len());
        for entry in entries {
            self.insert(entry);
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.entries.len())
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

/// 固定容量的 LRU 缓存
pub struct BoundedCacheStore {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    counters: CacheCounters,
}

impl BoundedCacheStore {
    /// 创建缓存，容量为 0 时按 1 处理
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            counters: CacheCounters::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for BoundedCacheStore {
    fn lookup(&self, language: &str, line: &str) -> Option<String> {
        let found = self
            .lock()
            .get(&CacheKey::new(language, line))
            .map(|entry| entry.translated.clone());
        self.counters.record_lookup(found.is_some());
        found
    }

    fn save(&self, language: &str, source_lines: &[String], translated_lines: &[String]) {
        let Some(entries) = self
            .counters
            .entries_to_save(language, source_lines, translated_lines)
        else {
            return;
        };

        self.counters.record_writes(entries.len());
        let mut cache = self.lock();
        for entry in entries {
            let key = entry.key();
            // push 在替换同键时也会返回旧值，只有键不同才算驱逐
            if let Some((evicted, _)) = cache.push(key.clone(), entry) {
                if evicted != key {
                    self.counters.record_eviction();
                    tracing::debug!("驱逐缓存条目: {}", evicted.source);
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn stats(&self) -> CacheStats {
        let entries = self.lock().len();
        self.counters.snapshot(entries)
    }

    fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cache_basic_operations() {
        let cache = MemoryCacheStore::new();

        cache.save("fr", &lines(&["Hello", "World"]), &lines(&["Bonjour", "Monde"]));
        assert_eq!(cache.lookup("fr", "Hello"), Some("Bonjour".to_string()));
        assert_eq!(cache.lookup("fr", "World"), Some("Monde".to_string()));
        assert_eq!(cache.lookup("de", "Hello"), None);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.lookup("fr", "Hello"), None);
    }

    #[test]
    fn test_length_mismatch_writes_nothing() {
        let cache = MemoryCacheStore::new();

        cache.save("fr", &lines(&["a", "b"]), &lines(&["x"]));
        assert!(cache.is_empty());
        assert_eq!(cache.stats().rejected_saves, 1);
        assert_eq!(cache.stats().writes, 0);
    }

    #[test]
    fn test_newer_translation_overwrites() {
        let cache = MemoryCacheStore::new();

        cache.save("fr", &lines(&["Hello"]), &lines(&["Salut"]));
        cache.save("fr", &lines(&["Hello"]), &lines(&["Bonjour"]));
        assert_eq!(cache.lookup("fr", "Hello"), Some("Bonjour".to_string()));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.entry("fr", "Hello").unwrap().source, "Hello");
    }

    #[test]
    fn test_cache_stats() {
        let cache = MemoryCacheStore::new();
        cache.save("fr", &lines(&["hello"]), &lines(&["bonjour"]));

        // 命中
        cache.lookup("fr", "hello");
        // 未命中
        cache.lookup("fr", "world");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = BoundedCacheStore::new(2);

        cache.save("zh", &lines(&["1", "2"]), &lines(&["一", "二"]));
        assert_eq!(cache.len(), 2);

        // 访问第一个，使其成为最近使用的
        cache.lookup("zh", "1");

        // 插入第三个，应该驱逐第二个
        cache.save("zh", &lines(&["3"]), &lines(&["三"]));
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.lookup("zh", "1"), Some("一".to_string()));
        assert_eq!(cache.lookup("zh", "2"), None); // 应该被驱逐
        assert_eq!(cache.lookup("zh", "3"), Some("三".to_string()));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_replacing_is_not_eviction() {
        let cache = BoundedCacheStore::new(2);
        cache.save("zh", &lines(&["1"]), &lines(&["一"]));
        cache.save("zh", &lines(&["1"]), &lines(&["壹"]));
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.lookup("zh", "1"), Some("壹".to_string()));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        assert_eq!(BoundedCacheStore::new(0).capacity(), 1);
    }

    #[test]
    fn test_digest_is_stable_and_unambiguous() {
        let a = CacheKey::new("ab", "c");
        let b = CacheKey::new("a", "bc");
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest(), CacheKey::new("ab", "c").digest());
        assert_eq!(a.digest().len(), 64);
    }
}
