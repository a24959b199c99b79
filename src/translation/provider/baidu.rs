//! 百度翻译
//!
//! 请求参数按位置填入端点模板：`q, to, appid, salt, sign`。
//! 响应是 JSON 对象，失败时带 `error_code`/`error_msg`，成功时带 `trans_result: [{dst}]`。

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use super::{code_string, join_lines, split_lines, TranslationProvider};
use crate::translation::error::{helpers, TranslationResult};
use crate::translation::net::{json_kind, ApiArgs, ApiResponse, NetworkBoundary, UrlId};
use crate::translation::sign::{generate_salt, BaiduSigner, SignatureCodec};

const PROVIDER: &str = "baidu";

/// 表示成功的错误码，部分接口会随结果一起返回
const SUCCESS_CODE: &str = "52000";

pub struct BaiduProvider {
    net: Arc<dyn NetworkBoundary>,
    signer: BaiduSigner,
}

impl BaiduProvider {
    pub fn new(net: Arc<dyn NetworkBoundary>, signer: BaiduSigner) -> Self {
        Self { net, signer }
    }

    async fn translate_batch(
        &self,
        lines: &[String],
        target_lang: &str,
    ) -> TranslationResult<Vec<String>> {
        let query = join_lines(lines);
        let salt = generate_salt();
        let sign = self.signer.sign(&query, &salt);

        let args = ApiArgs::Positional(vec![
            query,
            baidu_language(target_lang).to_string(),
            self.signer.app_id().to_string(),
            salt,
            sign,
        ]);

        let response = self.net.call_api(UrlId::BaiduTranslation, args).await?;
        let text = parse_response(&response)?;
        split_lines(&text, lines.len())
    }
}

impl TranslationProvider for BaiduProvider {
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

/// 从响应中取出译文，多段结果以换行连接
fn parse_response(response: &ApiResponse) -> TranslationResult<String> {
    let body = match response.json_object() {
        Ok(body) => body,
        Err(_) if !response.is_success() => {
            return Err(helpers::network_error(format!("HTTP {}", response.status())));
        }
        Err(e) => return Err(e),
    };

    if let Some(code) = body.get("error_code").map(code_string) {
        if code != SUCCESS_CODE {
            let message = body
                .get("error_msg")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            return Err(helpers::provider_error(PROVIDER, code, message));
        }
    }

    let results = match body.get("trans_result") {
        Some(Value::Array(results)) if !results.is_empty() => results,
        Some(Value::Array(_)) => return Err(helpers::malformed("trans_result 为空")),
        Some(other) => {
            return Err(helpers::malformed(format!(
                "trans_result 应为数组，实际为 {}",
                json_kind(other)
            )))
        }
        None => return Err(helpers::malformed("响应缺少 trans_result")),
    };

    let segments = results
        .iter()
        .map(|item| {
            item.get("dst")
                .and_then(Value::as_str)
                .ok_or_else(|| helpers::malformed("trans_result 条目缺少 dst"))
        })
        .collect::<TranslationResult<Vec<&str>>>()?;

    Ok(segments.join("\n"))
}

/// 通用语言代码转换为百度语言代码
fn baidu_language(lang: &str) -> &str {
    match lang {
        "zh-CN" | "zh-Hans" => "zh",
        "zh-TW" | "zh-HK" | "zh-Hant" => "cht",
        "ja" => "jp",
        "ko" => "kor",
        "fr" => "fra",
        "es" => "spa",
        "ar" => "ara",
        "bg" => "bul",
        "et" => "est",
        "da" => "dan",
        "fi" => "fin",
        "ro" => "rom",
        "sl" => "slo",
        "sv" => "swe",
        "vi" => "vie",
        other => other,
    }
}
