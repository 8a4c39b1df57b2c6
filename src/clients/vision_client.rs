//! Google Vision API 客户端
//!
//! 封装 document text detection 调用：图片字节进，整页识别文本出

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::OcrError;
use crate::utils::logging::truncate_text;

/// Vision 客户端
pub struct VisionClient {
    client: reqwest::Client,
    base_url: String,
    credentials_path: String,
}

impl VisionClient {
    /// 创建新的 Vision 客户端
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.vision_api_base_url.trim_end_matches('/').to_string(),
            credentials_path: config.vision_credentials_path.clone(),
        }
    }

    /// 识别图片中的文字
    ///
    /// # 参数
    /// - `image_bytes`: 图片原始字节，大小限制交给服务端
    ///
    /// # 返回
    /// 返回第一个（整页）文本标注的内容，原样不做修剪。
    /// 单次尝试，不重试，不额外设置超时。
    pub async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        let api_key = self.load_api_key()?;

        let body = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image_bytes) },
                "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }]
            }]
        });

        debug!("调用 Vision API，图片大小: {} 字节", image_bytes.len());
        let url = format!("{}/v1/images:annotate?key={}", self.base_url, api_key);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| OcrError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OcrError::Request(format!(
                "HTTP {}: {}",
                status,
                truncate_text(&text, 200)
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| OcrError::BadResponse(e.to_string()))?;

        let first = payload
            .pointer("/responses/0")
            .cloned()
            .unwrap_or(Value::Null);

        // 服务在响应体内嵌入的错误优先于一切
        if let Some(message) = first.pointer("/error/message").and_then(Value::as_str) {
            return Err(OcrError::Service(message.to_string()));
        }

        match first.pointer("/textAnnotations/0") {
            Some(annotation) => {
                let text = annotation
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                debug!("Vision API 返回 {} 字符", text.chars().count());
                Ok(text)
            }
            None => Err(OcrError::NoResult),
        }
    }

    /// 从凭证文件读取 API 密钥
    ///
    /// 支持带 `api_key` 字段的 JSON 文件；否则把整个文件内容当作密钥本身。
    fn load_api_key(&self) -> Result<String, OcrError> {
        let content = std::fs::read_to_string(&self.credentials_path).map_err(|e| {
            OcrError::Credentials {
                path: self.credentials_path.clone(),
                message: e.to_string(),
            }
        })?;

        if let Ok(value) = serde_json::from_str::<Value>(&content) {
            if let Some(key) = value.get("api_key").and_then(Value::as_str) {
                return Ok(key.to_string());
            }
        }

        Ok(content.trim().to_string())
    }
}
