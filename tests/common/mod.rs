// 集成测试公共模块
//
// 提供可编程的网络边界、响应构造和常用装配

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::json;

use line_translator::translation::{
    ApiArgs, ApiResponse, BaiduProvider, BaiduSigner, MemoryCacheStore, MicrosoftProvider,
    NetworkBoundary, TranslationDispatcher, TranslationError, TranslationProvider,
    TranslationResult, UrlId, BATCH_DELIMITER,
};

/// 测试用的百度凭据
pub const BAIDU_APP_ID: &str = "2015063000000001";
pub const BAIDU_SECRET: &str = "12345678";

type Responder = Box<dyn Fn(UrlId, &ApiArgs) -> TranslationResult<ApiResponse> + Send + Sync>;

/// 可编程的网络边界，记录每次调用
pub struct MockNetwork {
    responder: Responder,
    calls: Mutex<Vec<(UrlId, ApiArgs)>>,
}

impl MockNetwork {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(UrlId, &ApiArgs) -> TranslationResult<ApiResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 总是返回同一响应体
    pub fn ok(body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(move |_, _| Ok(ApiResponse::ok(body.clone())))
    }

    /// 总是传输失败
    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_, _| Err(TranslationError::NetworkError(message.clone())))
    }

    /// 按词典翻译的微软接口，未知行原样返回
    pub fn microsoft_dictionary(entries: &[(&str, &str)]) -> Self {
        let dictionary = to_dictionary(entries);
        Self::new(move |_, args| {
            let text = args.get("text").unwrap_or_default();
            Ok(ApiResponse::ok(microsoft_body(&translate_joined(&dictionary, text))))
        })
    }

    /// 按词典翻译的百度接口，未知行原样返回
    pub fn baidu_dictionary(entries: &[(&str, &str)]) -> Self {
        let dictionary = to_dictionary(entries);
        Self::new(move |_, args| {
            let query = args.get("0").unwrap_or_default();
            Ok(ApiResponse::ok(baidu_body(&translate_joined(&dictionary, query))))
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(UrlId, ApiArgs)> {
        self.calls.lock().unwrap().clone()
    }
}

impl NetworkBoundary for MockNetwork {
    fn call_api(&self, id: UrlId, args: ApiArgs) -> BoxFuture<'_, TranslationResult<ApiResponse>> {
        let response = (self.responder)(id, &args);
        self.calls.lock().unwrap().push((id, args));
        async move { response }.boxed()
    }
}

fn to_dictionary(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(source, translated)| (source.to_string(), translated.to_string()))
        .collect()
}

fn translate_joined(dictionary: &HashMap<String, String>, joined: &str) -> String {
    joined
        .split(BATCH_DELIMITER)
        .map(|line| dictionary.get(line).map(String::as_str).unwrap_or(line))
        .collect::<Vec<_>>()
        .join(BATCH_DELIMITER)
}

/// 构造字符串列表
pub fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// 微软成功响应
pub fn microsoft_body(text: &str) -> String {
    json!([{ "translations": [{ "text": text, "to": "fr" }] }]).to_string()
}

/// 百度成功响应
pub fn baidu_body(text: &str) -> String {
    json!({ "from": "en", "to": "fra", "trans_result": [{ "src": "", "dst": text }] }).to_string()
}

/// 百度错误响应
pub fn baidu_error(code: &str, message: &str) -> String {
    json!({ "error_code": code, "error_msg": message }).to_string()
}

pub fn microsoft_provider(net: Arc<MockNetwork>) -> Arc<dyn TranslationProvider> {
    Arc::new(MicrosoftProvider::new(net))
}

pub fn baidu_provider(net: Arc<MockNetwork>) -> Arc<dyn TranslationProvider> {
    Arc::new(BaiduProvider::new(net, BaiduSigner::new(BAIDU_APP_ID, BAIDU_SECRET)))
}

/// 内存缓存 + 指定服务商的调度器
pub fn dispatcher_with(
    provider: Arc<dyn TranslationProvider>,
) -> (TranslationDispatcher, Arc<MemoryCacheStore>) {
    let cache = Arc::new(MemoryCacheStore::new());
    (TranslationDispatcher::with_provider(cache.clone(), provider), cache)
}

/// 本地 HTTP 服务：对每个连接返回同一 JSON 响应体，返回基础 URL
pub fn spawn_http_server(body: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let body = body.to_string();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{}", address)
}

/// 读完请求头和 Content-Length 指定的请求体
fn read_request(stream: &mut std::net::TcpStream) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let Ok(n) = stream.read(&mut chunk) else { return };
        if n == 0 {
            return;
        }
        buffer.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buffer);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buffer.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }
}
