//! 网络边界
//!
//! 翻译服务商只通过 [`NetworkBoundary`] 访问网络：给定端点标识和参数，
//! 异步返回原始响应。响应体可以按原文、JSON 对象或 JSON 数组读取。
//!
//! - `Endpoint` / `Endpoints`: 端点注册表，URL 模板支持 `{0}` 位置参数和 `{name}` 命名参数
//! - `HttpNetwork`: 基于 reqwest 的实现（`http` 特性）

#[cfg(feature = "http")]
pub mod http;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use futures::future::BoxFuture;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::translation::error::{helpers, TranslationResult};

#[cfg(feature = "http")]
pub use http::HttpNetwork;

/// URL 组件编码集合（保留 RFC 3986 非保留字符）
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// 端点标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlId {
    BaiduTranslation,
    MicrosoftTranslation,
}

impl fmt::Display for UrlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlId::BaiduTranslation => f.write_str("api.baidu.translation"),
            UrlId::MicrosoftTranslation => f.write_str("api.microsoft.translation"),
        }
    }
}

/// 调用参数：位置参数填充模板，或键值对
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiArgs {
    Positional(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl ApiArgs {
    /// 按名称取参数，位置参数的名称是下标
    pub fn get(&self, name: &str) -> Option<&str> {
        match self {
            ApiArgs::Positional(values) => name
                .parse::<usize>()
                .ok()
                .and_then(|index| values.get(index))
                .map(String::as_str),
            ApiArgs::Map(values) => values.get(name).map(String::as_str),
        }
    }
}

/// HTTP 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

/// 未被模板消耗的键值参数如何发送
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// GET 追加为查询参数，POST 作为表单
    #[default]
    Form,
    /// 单个 JSON 对象
    Json,
    /// 包在单元素数组里的 JSON 对象
    JsonArray,
}

/// 端点定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub body: BodyKind,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// 渲染后的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRequest {
    pub url: String,
    /// 模板未使用的键值参数
    pub remaining: BTreeMap<String, String>,
}

impl Endpoint {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            body: BodyKind::Form,
            headers: BTreeMap::new(),
        }
    }

    pub fn post(url: impl Into<String>, body: BodyKind) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            body,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// 检查模板本身是否是合法的 http(s) URL
    pub fn validate(&self) -> TranslationResult<()> {
        let probe = fill_template(&self.url, |_| Some(String::new()))?;
        let parsed = url::Url::parse(&probe)
            .map_err(|e| helpers::config_error(format!("端点URL无效 {}: {}", self.url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(helpers::config_error(format!("端点URL协议不受支持: {}", other))),
        }
    }

    /// 用参数填充 URL 模板，占位符的值会做百分号编码
    pub fn render(&self, args: &ApiArgs) -> TranslationResult<RenderedRequest> {
        let mut used = Vec::new();
        let url = fill_template(&self.url, |name| {
            let value = args.get(name)?;
            used.push(name.to_string());
            Some(value.to_string())
        })?;

        let remaining = match args {
            ApiArgs::Positional(_) => BTreeMap::new(),
            ApiArgs::Map(values) => values
                .iter()
                .filter(|(key, _)| !used.iter().any(|name| name == *key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        };

        Ok(RenderedRequest { url, remaining })
    }
}

/// 替换模板中的 `{name}` 占位符
fn fill_template(
    template: &str,
    mut lookup: impl FnMut(&str) -> Option<String>,
) -> TranslationResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| helpers::config_error(format!("URL模板占位符未闭合: {}", template)))?;
        let name = &after[..end];
        let value = lookup(name)
            .ok_or_else(|| helpers::config_error(format!("URL模板缺少参数 {{{}}}", name)))?;
        out.extend(utf8_percent_encode(&value, COMPONENT));
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// 端点注册表
#[derive(Debug, Clone, Default)]
pub struct Endpoints {
    entries: HashMap<UrlId, Endpoint>,
}

impl Endpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: UrlId, endpoint: Endpoint) {
        self.entries.insert(id, endpoint);
    }

    pub fn get(&self, id: UrlId) -> TranslationResult<&Endpoint> {
        self.entries
            .get(&id)
            .ok_or_else(|| helpers::config_error(format!("未注册的端点: {}", id)))
    }

    pub fn validate(&self) -> TranslationResult<()> {
        for (id, endpoint) in &self.entries {
            endpoint.validate().map_err(|e| e.with_context(id))?;
        }
        Ok(())
    }
}

/// 网络响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    status: u16,
    body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200 响应
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json(&self) -> TranslationResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn json_object(&self) -> TranslationResult<Map<String, Value>> {
        match self.json()? {
            Value::Object(map) => Ok(map),
            other => Err(helpers::malformed(format!(
                "期望JSON对象，实际为 {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn json_array(&self) -> TranslationResult<Vec<Value>> {
        match self.json()? {
            Value::Array(items) => Ok(items),
            other => Err(helpers::malformed(format!(
                "期望JSON数组，实际为 {}",
                json_kind(&other)
            ))),
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 网络边界
///
/// 每次调用只完成一次：成功时给出响应，传输失败时给出 `NetworkError`。
pub trait NetworkBoundary: Send + Sync {
    fn call_api(&self, id: UrlId, args: ApiArgs) -> BoxFuture<'_, TranslationResult<ApiResponse>>;
}
