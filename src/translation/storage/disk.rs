//! 基于 redb 的磁盘缓存
//!
//! 打开时把全部条目载入内存，查找只读内存；写入先更新内存，再在一个写事务里提交到磁盘。
//! 磁盘错误只记录日志，不影响翻译结果。
//!
//! 提交事务会同步刷盘。在多线程 tokio 运行时的工作线程上，提交通过 `block_in_place`
//! 执行，同一工作线程上的其他任务会被迁走；在单线程运行时里提交会阻塞整个运行时，
//! 每批未命中的翻译阻塞一次。

use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition};
use tokio::runtime::{Handle, RuntimeFlavor};

use super::cache::{CacheCounters, CacheEntry, CacheStats, CacheStore, MemoryCacheStore};
use crate::translation::error::{helpers, TranslationResult};

/// 键为 `CacheKey::digest()`，值为 `CacheEntry` 的 JSON
const TRANSLATIONS: TableDefinition<&str, &str> = TableDefinition::new("translations");

/// 写穿式磁盘缓存
pub struct DiskCacheStore {
    db: Database,
    path: PathBuf,
    memory: MemoryCacheStore,
    counters: CacheCounters,
}

impl DiskCacheStore {
    /// 打开（或创建）缓存文件
    pub fn open(path: impl AsRef<Path>) -> TranslationResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| helpers::config_error(format!("无法创建缓存目录 {}: {}", parent.display(), e)))?;
        }

        let db = Database::create(&path)?;

        // 确保表存在，新文件上的读事务才能打开它
        let txn = db.begin_write()?;
        txn.open_table(TRANSLATIONS)?;
        txn.commit()?;

        let store = Self {
            db,
            path,
            memory: MemoryCacheStore::new(),
            counters: CacheCounters::default(),
        };
        let loaded = store.load()?;
        tracing::info!("磁盘缓存已打开: {} ({} 条)", store.path.display(), loaded);

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> TranslationResult<usize> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(TRANSLATIONS)?;

        let mut loaded = 0;
        for row in table.iter()? {
            let (key, value) = row?;
            match serde_json::from_str::<CacheEntry>(value.value()) {
                Ok(entry) => {
                    self.memory.insert(entry);
                    loaded += 1;
                }
                Err(e) => tracing::warn!("跳过损坏的缓存条目 {}: {}", key.value(), e),
            }
        }

        Ok(loaded)
    }

    fn persist(&self, entries: &[CacheEntry]) -> TranslationResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TRANSLATIONS)?;
            for entry in entries {
                let value = serde_json::to_string(entry)?;
                table.insert(entry.key().digest().as_str(), value.as_str())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    fn truncate(&self) -> TranslationResult<()> {
        let txn = self.db.begin_write()?;
        txn.delete_table(TRANSLATIONS)?;
        txn.open_table(TRANSLATIONS)?;
        txn.commit()?;
        Ok(())
    }
}

/// 在多线程运行时内执行阻塞的磁盘操作
fn run_blocking<R>(op: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(op)
        }
        _ => op(),
    }
}

impl CacheStore for DiskCacheStore {
    fn lookup(&self, language: &str, line: &str) -> Option<String> {
        let found = self.memory.entry(language, line).map(|entry| entry.translated);
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
        for entry in &entries {
            self.memory.insert(entry.clone());
        }

        if let Err(e) = run_blocking(|| self.persist(&entries)) {
            tracing::warn!("写入磁盘缓存失败 {}: {}", self.path.display(), e);
        }
    }

    fn len(&self) -> usize {
        self.memory.len()
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.memory.len())
    }

    fn clear(&self) {
        self.memory.clear();
        if let Err(e) = run_blocking(|| self.truncate()) {
            tracing::warn!("清空磁盘缓存失败 {}: {}", self.path.display(), e);
        }
    }
}
