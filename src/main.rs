//! 命令行入口：翻译参数或标准输入中的各行

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use line_translator::env::{core::Log, generate_env_docs, EnvVar};
use line_translator::translation::{
    CacheBackend, ConfigManager, HttpNetwork, ProviderKind, TranslationService,
};

#[derive(Parser)]
#[command(name = "line-translator")]
#[command(about = "Translate short text lines with caching and provider fallback", long_about = None)]
struct Cli {
    /// Lines to translate; read from stdin when omitted
    #[arg(value_name = "LINE")]
    lines: Vec<String>,

    /// Target language (overrides the configured one)
    #[arg(short, long, value_name = "LANG")]
    to: Option<String>,

    /// Translation provider: baidu, microsoft, none
    #[arg(short, long, value_name = "PROVIDER")]
    provider: Option<String>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Cache backend: memory, bounded, disk
    #[arg(long, value_name = "BACKEND")]
    cache: Option<String>,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "FILE", conflicts_with_all = ["lines", "to", "provider", "config", "cache"])]
    write_example_config: Option<String>,

    /// Print the supported environment variables and exit
    #[arg(long, conflicts_with_all = ["lines", "to", "provider", "config", "cache", "write_example_config"])]
    env_docs: bool,

    /// Print cache and dispatch statistics to stderr
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.env_docs {
        print!("{}", generate_env_docs());
        return Ok(());
    }

    if let Some(path) = &cli.write_example_config {
        ConfigManager::generate_example_config(path)?;
        eprintln!("Example configuration written to {}", path);
        return Ok(());
    }

    let manager = match &cli.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };

    let mut config = manager.get_config().clone();
    if let Some(lang) = &cli.to {
        config.target_lang = lang.clone();
    }
    if let Some(provider) = &cli.provider {
        config.provider = provider.parse::<ProviderKind>()?;
    }
    if let Some(cache) = &cli.cache {
        config.cache_backend = cache.parse::<CacheBackend>()?;
    }

    let lines = if cli.lines.is_empty() {
        read_stdin_lines().await?
    } else {
        cli.lines
    };

    let net = HttpNetwork::from_config(&config)?;
    let service = TranslationService::from_config(&config, Arc::new(net))?;

    for line in service.translate(lines).await {
        println!("{}", line);
    }

    if cli.stats {
        let dispatch = service.get_stats();
        let cache = service.cache_stats();
        eprintln!(
            "requests: {}, lines: {}, cache hits: {}, misses: {}, provider calls: {}, fallbacks: {}, unrouted: {}",
            dispatch.requests,
            dispatch.lines,
            dispatch.cache_hits,
            dispatch.cache_misses,
            dispatch.provider_calls,
            dispatch.fallbacks,
            dispatch.unrouted
        );
        eprintln!(
            "cache entries: {}, hit rate: {:.1}%",
            cache.entries,
            cache.hit_rate() * 100.0
        );
    }

    Ok(())
}

/// 日志过滤器：LINE_TRANSLATOR_LOG，其次 RUST_LOG，最后 warn
fn log_filter() -> EnvFilter {
    Log::overridden()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

async fn read_stdin_lines() -> std::io::Result<Vec<String>> {
    let mut reader = BufReader::new(tokio::io::stdin()).lines();
    let mut lines = Vec::new();
    while let Some(line) = reader.next_line().await? {
        lines.push(line);
    }
    Ok(lines)
}
