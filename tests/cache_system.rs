//! 缓存系统集成测试
//!
//! 三种缓存后端在调度器下的行为和持久化

use std::sync::Arc;

use line_translator::translation::{
    BoundedCacheStore, CacheBackend, CacheKey, CacheStore, DiskCacheStore, MemoryCacheStore,
    TranslationConfig, TranslationDispatcher, TranslationService,
};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{lines, microsoft_provider, MockNetwork};

const GERMAN: &[(&str, &str)] = &[("one", "eins"), ("two", "zwei"), ("three", "drei")];

fn disk_config(path: &std::path::Path) -> TranslationConfig {
    TranslationConfig {
        cache_backend: CacheBackend::Disk,
        cache_path: path.to_string_lossy().into_owned(),
        ..TranslationConfig::default_with_lang("de")
    }
}

/// 基本缓存操作
#[tokio::test]
async fn test_basic_cache_operations() {
    let cache = MemoryCacheStore::new();

    assert!(cache.lookup("de", "one").is_none());
    cache.save("de", &lines(&["one", "two"]), &lines(&["eins", "zwei"]));

    assert_eq!(cache.lookup("de", "one").as_deref(), Some("eins"));
    assert_eq!(cache.lookup("de", "two").as_deref(), Some("zwei"));
    assert!(cache.lookup("fr", "one").is_none());

    let entry = cache.entry("de", "one").unwrap();
    assert_eq!(entry.key(), CacheKey::new("de", "one"));
    assert_eq!(entry.translated, "eins");

    let stats = cache.stats();
    assert_eq!(stats.writes, 2);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.entries, 2);

    cache.clear();
    assert!(cache.is_empty());

    println!("✅ 基本缓存操作测试通过");
}

/// 长度不一致的保存被拒绝
#[tokio::test]
async fn test_mismatched_save_is_rejected() {
    let stores: Vec<Arc<dyn CacheStore>> = vec![
        Arc::new(MemoryCacheStore::new()),
        Arc::new(BoundedCacheStore::new(10)),
    ];

    for cache in stores {
        cache.save("de", &lines(&["one", "two"]), &lines(&["eins"]));
        assert!(cache.is_empty());
        assert_eq!(cache.stats().rejected_saves, 1);
    }
}

/// LRU 缓存淘汰后会重新请求
#[tokio::test]
async fn test_bounded_cache_eviction_through_dispatcher() {
    let net = Arc::new(MockNetwork::microsoft_dictionary(GERMAN));
    let cache = Arc::new(BoundedCacheStore::new(2));
    let dispatcher =
        TranslationDispatcher::with_provider(cache.clone(), microsoft_provider(net.clone()));

    dispatcher.translate(lines(&["one"]), Some("de")).await;
    dispatcher.translate(lines(&["two"]), Some("de")).await;
    // 访问 one，使 two 成为最久未用
    dispatcher.translate(lines(&["one"]), Some("de")).await;
    dispatcher.translate(lines(&["three"]), Some("de")).await;
    assert_eq!(net.call_count(), 3);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats().evictions, 1);

    let result = dispatcher.translate(lines(&["one", "two"]), Some("de")).await;
    assert_eq!(result, lines(&["eins", "zwei"]));
    assert_eq!(net.call_count(), 4);
    assert_eq!(net.calls()[3].1.get("text"), Some("two"));

    println!("✅ LRU 淘汰测试通过");
}

/// 磁盘缓存跨实例保留
#[tokio::test]
async fn test_disk_cache_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("translations.redb");

    {
        let cache = DiskCacheStore::open(&path).unwrap();
        cache.save("de", &lines(&["one", "two"]), &lines(&["eins", "zwei"]));
        assert_eq!(cache.len(), 2);
    }

    let cache = DiskCacheStore::open(&path).unwrap();
    assert_eq!(cache.path(), path.as_path());
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.lookup("de", "two").as_deref(), Some("zwei"));

    println!("✅ 磁盘持久化测试通过");
}

/// 服务重建后磁盘缓存命中，不再访问网络
#[tokio::test]
async fn test_disk_cache_across_services() {
    let dir = tempfile::tempdir().unwrap();
    let config = disk_config(&dir.path().join("cache.redb"));
    let net = Arc::new(MockNetwork::microsoft_dictionary(GERMAN));

    {
        let service = TranslationService::from_config(&config, net.clone()).unwrap();
        let result = service.translate_now(&lines(&["one", "two"])).await;
        assert_eq!(result, lines(&["eins", "zwei"]));
    }

    let service = TranslationService::from_config(&config, net.clone()).unwrap();
    assert_eq!(service.cache().len(), 2);

    let result = service.translate_now(&lines(&["two", "three", "one"])).await;
    assert_eq!(result, lines(&["zwei", "drei", "eins"]));
    assert_eq!(net.call_count(), 2);
    assert_eq!(net.calls()[1].1.get("text"), Some("three"));

    println!("✅ 跨服务磁盘缓存测试通过");
}

/// 多线程运行时的工作线程上写入磁盘缓存
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_disk_cache_on_runtime_workers() {
    let dir = tempfile::tempdir().unwrap();
    let config = disk_config(&dir.path().join("workers.redb"));
    let net = Arc::new(MockNetwork::microsoft_dictionary(GERMAN));

    {
        let service = Arc::new(TranslationService::from_config(&config, net.clone()).unwrap());
        let tasks: Vec<_> = ["one", "two", "three"]
            .into_iter()
            .map(|line| {
                let service = service.clone();
                tokio::spawn(async move { service.translate_now(&lines(&[line])).await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().len(), 1);
        }
        assert_eq!(service.cache().len(), 3);
    }

    let reopened = DiskCacheStore::open(dir.path().join("workers.redb")).unwrap();
    assert_eq!(reopened.len(), 3);
    assert_eq!(reopened.lookup("de", "three").as_deref(), Some("drei"));

    println!("✅ 工作线程磁盘写入测试通过");
}

/// 清空磁盘缓存后重新打开仍为空
#[tokio::test]
async fn test_disk_cache_clear() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.redb");

    {
        let cache = DiskCacheStore::open(&path).unwrap();
        cache.save("de", &lines(&["one"]), &lines(&["eins"]));
        cache.clear();
        assert!(cache.is_empty());
    }

    let cache = DiskCacheStore::open(&path).unwrap();
    assert!(cache.is_empty());
}

/// 多任务并发写入同一缓存
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves() {
    let cache = Arc::new(MemoryCacheStore::new());

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let source = vec![format!("line {}", i)];
                let translated = vec![format!("Zeile {}", i)];
                cache.save("de", &source, &translated);
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(cache.len(), 16);
    assert_eq!(cache.lookup("de", "line 7").as_deref(), Some("Zeile 7"));
}

/// 服务统计反映缓存命中率
#[tokio::test]
async fn test_service_cache_stats() {
    let net = Arc::new(MockNetwork::microsoft_dictionary(GERMAN));
    let config = TranslationConfig {
        cache_backend: CacheBackend::Bounded,
        cache_capacity: 100,
        ..TranslationConfig::default_with_lang("de")
    };
    let service = TranslationService::from_config(&config, net.clone()).unwrap();

    service.translate(lines(&["one", "two"])).await;
    service.translate(lines(&["one", "two"])).await;

    let cache = service.cache_stats();
    assert_eq!(cache.entries, 2);
    assert_eq!(cache.hits, 2);
    assert_eq!(cache.misses, 2);
    assert!((cache.hit_rate() - 0.5).abs() < f64::EPSILON);

    let dispatch = service.get_stats();
    assert_eq!(dispatch.requests, 2);
    assert_eq!(dispatch.lines, 4);
    assert_eq!(dispatch.provider_calls, 1);

    println!("✅ 缓存统计测试通过");
}
