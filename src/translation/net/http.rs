//! 基于 reqwest 的网络边界实现

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::CONTENT_TYPE;

use super::{ApiArgs, ApiResponse, BodyKind, Endpoints, HttpMethod, NetworkBoundary, UrlId};
use crate::translation::config::TranslationConfig;
use crate::translation::error::{TranslationError, TranslationResult};

/// HTTP 网络访问
pub struct HttpNetwork {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl HttpNetwork {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> TranslationResult<Self> {
        endpoints.validate()?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self { client, endpoints })
    }

    /// 按配置构建端点和超时
    pub fn from_config(config: &TranslationConfig) -> TranslationResult<Self> {
        Self::new(config.endpoints(), config.request_timeout())
    }

    async fn execute(&self, id: UrlId, args: ApiArgs) -> TranslationResult<ApiResponse> {
        let endpoint = self.endpoints.get(id)?;
        let rendered = endpoint.render(&args)?;

        let mut request = match endpoint.method {
            HttpMethod::Get => self.client.get(&rendered.url).query(&rendered.remaining),
            HttpMethod::Post => {
                let builder = self.client.post(&rendered.url);
                match endpoint.body {
                    BodyKind::Form => builder.form(&rendered.remaining),
                    BodyKind::Json => builder
                        .header(CONTENT_TYPE, "application/json")
                        .body(serde_json::to_string(&rendered.remaining)?),
                    BodyKind::JsonArray => builder
                        .header(CONTENT_TYPE, "application/json")
                        .body(serde_json::to_string(&[&rendered.remaining])?),
                }
            }
        };

        for (name, value) in &endpoint.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        tracing::debug!("发送翻译请求: {} ({:?})", id, endpoint.method);
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!("收到响应: {} 状态 {}，{} 字节", id, status, body.len());

        Ok(ApiResponse::new(status, body))
    }
}

impl NetworkBoundary for HttpNetwork {
    fn call_api(&self, id: UrlId, args: ApiArgs) -> BoxFuture<'_, TranslationResult<ApiResponse>> {
        self.execute(id, args).boxed()
    }
}
