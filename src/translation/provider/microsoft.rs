//! 微软翻译
//!
//! 请求参数为键值对 `{to, text}`，响应是 JSON 数组，译文位于 `[0].translations[0].text`。
//! 出错时服务端返回 `{"error": {"code", "message"}}` 对象。

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use super::{code_string, join_lines, split_lines, TranslationProvider};
use crate::translation::error::{helpers, TranslationResult};
use crate::translation::net::{json_kind, ApiArgs, ApiResponse, NetworkBoundary, UrlId};

const PROVIDER: &str = "microsoft";

pub struct MicrosoftProvider {
    net: Arc<dyn NetworkBoundary>,
}

impl MicrosoftProvider {
    pub fn new(net: Arc<dyn NetworkBoundary>) -> Self {
        Self { net }
    }

    async fn translate_batch(
        &self,
        lines: &[String],
        target_lang: &str,
    ) -> TranslationResult<Vec<String>> {
        let mut args = BTreeMap::new();
        args.insert("to".to_string(), microsoft_language(target_lang).to_string());
        args.insert("text".to_string(), join_lines(lines));

        let response = self
            .net
            .call_api(UrlId::MicrosoftTranslation, ApiArgs::Map(args))
            .await?;
        let text = parse_response(&response)?;
        split_lines(&text, lines.len())
    }
}

impl TranslationProvider for MicrosoftProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn request<'a>(
        &'a self,
        lines: &'a [String],
        target_lang: &'a str,
    ) -> BoxFuture<'a, TranslationResult<Vec<String>>> {
        self.translate_batch(lines, target_lang).boxed()
    }
}

fn parse_response(response: &ApiResponse) -> TranslationResult<String> {
    let body = match response.json() {
        Ok(body) => body,
        Err(_) if !response.is_success() => {
            return Err(helpers::network_error(format!("HTTP {}", response.status())));
        }
        Err(e) => return Err(e),
    };

    let items = match body {
        Value::Array(items) => items,
        Value::Object(object) => {
            let error = object
                .get("error")
                .ok_or_else(|| helpers::malformed("期望JSON数组，实际为 object"))?;
            let code = error.get("code").map(code_string).unwrap_or_default();
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            return Err(helpers::provider_error(PROVIDER, code, message));
        }
        other => {
            return Err(helpers::malformed(format!(
                "期望JSON数组，实际为 {}",
                json_kind(&other)
            )))
        }
    };

    let text = items
        .first()
        .and_then(|item| item.get("translations"))
        .and_then(Value::as_array)
        .and_then(|translations| translations.first())
        .and_then(|translation| translation.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    if text.is_empty() {
        return Err(helpers::malformed("响应中没有译文"));
    }

    Ok(text.to_string())
}

/// 通用语言代码转换为微软语言代码
fn microsoft_language(lang: &str) -> &str {
    match lang {
        "zh" | "zh-CN" => "zh-Hans",
        "zh-TW" | "zh-HK" => "zh-Hant",
        "no" => "nb",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::error::TranslationError;
    use crate::translation::net::testing::StaticNetwork;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_request_arguments() {
        let net = Arc::new(StaticNetwork::ok(
            r#"[{"detectedLanguage":{"language":"en","score":1.0},"translations":[{"text":"你好{NL}世界","to":"zh-Hans"}]}]"#,
        ));
        let result = MicrosoftProvider::new(net.clone())
            .request(&lines(&["Hello", "World"]), "zh")
            .await
            .unwrap();
        assert_eq!(result, lines(&["你好", "世界"]));

        let (id, args) = net.last_args.lock().unwrap().clone().unwrap();
        assert_eq!(id, UrlId::MicrosoftTranslation);
        assert_eq!(args.get("to"), Some("zh-Hans"));
        assert_eq!(args.get("text"), Some("Hello{NL}World"));
    }

    #[tokio::test]
    async fn test_error_object_is_provider_error() {
        let net = Arc::new(StaticNetwork::new(Ok(ApiResponse::new(
            401,
            r#"{"error":{"code":401000,"message":"The request is not authorized"}}"#,
        ))));
        let error = MicrosoftProvider::new(net)
            .request(&lines(&["Hello"]), "fr")
            .await
            .unwrap_err();
        assert_eq!(error.provider_code(), Some("401000"));
    }

    #[tokio::test]
    async fn test_segment_mismatch() {
        let net = Arc::new(StaticNetwork::ok(r#"[{"translations":[{"text":"Bonjour Monde"}]}]"#));
        let error = MicrosoftProvider::new(net)
            .request(&lines(&["Hello", "World"]), "fr")
            .await
            .unwrap_err();
        assert_eq!(error, TranslationError::SegmentMismatch { expected: 2, actual: 1 });
    }

    #[tokio::test]
    async fn test_missing_text_is_malformed() {
        for body in [
            "[]",
            r#"[{"translations":[]}]"#,
            r#"[{"translations":[{"text":""}]}]"#,
            r#"{"translations":[{"text":"Bonjour"}]}"#,
            "\"Bonjour\"",
        ] {
            let net = Arc::new(StaticNetwork::ok(body));
            let error = MicrosoftProvider::new(net)
                .request(&lines(&["Hello"]), "fr")
                .await
                .unwrap_err();
            assert!(
                matches!(error, TranslationError::MalformedResponse(_)),
                "{} -> {:?}",
                body,
                error
            );
        }
    }

    #[test]
    fn test_language_mapping() {
        assert_eq!(microsoft_language("zh"), "zh-Hans");
        assert_eq!(microsoft_language("zh-TW"), "zh-Hant");
        assert_eq!(microsoft_language("fr"), "fr");
    }
}
