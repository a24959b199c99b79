//! 请求签名
//!
//! 需要签名的服务商（目前只有百度）在发出请求前计算签名。签名失败不会中断请求：
//! `sign` 记录警告并返回空串，请求照常发出，由远端拒绝后回退原文。

use md5::{Digest, Md5};
use rand::Rng;

use crate::translation::config::constants::SALT_BOUND;
use crate::translation::error::{TranslationError, TranslationResult};

/// 签名编解码器
pub trait SignatureCodec: Send + Sync {
    /// 计算签名，失败时返回 `SignatureError`
    fn try_sign(&self, query: &str, salt: &str) -> TranslationResult<String>;

    /// 计算签名，失败时返回空串
    fn sign(&self, query: &str, salt: &str) -> String {
        match self.try_sign(query, salt) {
            Ok(signature) => signature,
            Err(e) => {
                tracing::warn!("请求签名失败，使用空签名继续: {}", e);
                String::new()
            }
        }
    }
}

/// 百度翻译签名：`md5(appid + q + salt + secret)` 的小写十六进制
#[derive(Clone)]
pub struct BaiduSigner {
    app_id: String,
    secret: String,
}

impl BaiduSigner {
    pub fn new(app_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            secret: secret.into(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

impl std::fmt::Debug for BaiduSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaiduSigner")
            .field("app_id", &self.app_id)
            .field("secret", &"***")
            .finish()
    }
}

impl SignatureCodec for BaiduSigner {
    fn try_sign(&self, query: &str, salt: &str) -> TranslationResult<String> {
        if self.app_id.is_empty() {
            return Err(TranslationError::SignatureError("缺少百度 appid".to_string()));
        }
        if self.secret.is_empty() {
            return Err(TranslationError::SignatureError("缺少百度密钥".to_string()));
        }

        let mut hasher = Md5::new();
        hasher.update(self.app_id.as_bytes());
        hasher.update(query.as_bytes());
        hasher.update(salt.as_bytes());
        hasher.update(self.secret.as_bytes());

        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// 生成签名盐值（十进制随机数）
pub fn generate_salt() -> String {
    rand::rng().random_range(0..SALT_BOUND).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baidu_documented_vector() {
        let signer = BaiduSigner::new("2015063000000001", "12345678");
        assert_eq!(
            signer.sign("apple", "1435660288"),
            "f89f9594663708c1605f3d736d01d2d4"
        );
    }

    #[test]
    fn test_concatenation_order() {
        // md5("abc")
        let signer = BaiduSigner::new("a", "c");
        assert_eq!(signer.sign("b", ""), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_missing_credentials_yield_empty_signature() {
        let signer = BaiduSigner::new("", "secret");
        assert!(matches!(
            signer.try_sign("q", "1"),
            Err(TranslationError::SignatureError(_))
        ));
        assert_eq!(signer.sign("q", "1"), "");
        assert_eq!(BaiduSigner::new("appid", "").sign("q", "1"), "");
    }

    #[test]
    fn test_salt_range() {
        for _ in 0..100 {
            let salt: u32 = generate_salt().parse().unwrap();
            assert!(salt < SALT_BOUND);
        }
    }

    #[test]
    fn test_debug_hides_secret() {
        let signer = BaiduSigner::new("appid", "top-secret");
        assert!(!format!("{:?}", signer).contains("top-secret"));
    }
}
