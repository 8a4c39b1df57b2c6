//! Groq API 客户端（OpenAI 兼容的聊天补全接口）
//!
//! 封装所有与聊天补全端点相关的调用逻辑

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;
use crate::utils::logging::truncate_text;

/// LLM 客户端
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model_name: String,
    timeout_secs: u64,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.groq_api_key.clone(),
            api_base_url: config.llm_api_base_url.trim_end_matches('/').to_string(),
            model_name: config.llm_model_name.clone(),
            timeout_secs: config.llm_timeout_secs,
        }
    }

    /// 发送聊天请求
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（`choices[0].message.content`，两侧空白去除）。
    /// 密钥为空时不发起任何网络调用，直接返回 [`LlmError::KeyNotConfigured`]。
    pub async fn chat(
        &self,
        user_message: &str,
        system_message: &str,
    ) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            warn!("⚠️ GROQ_API_KEY 未配置，跳过 LLM 调用");
            return Err(LlmError::KeyNotConfigured);
        }

        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let payload = json!({
            "model": self.model_name,
            "messages": [
                { "role": "system", "content": system_message },
                { "role": "user", "content": user_message }
            ],
            "temperature": 0.1,
            "max_tokens": 1024,
            "top_p": 0.9,
            "stream": false
        });

        let url = format!("{}/chat/completions", self.api_base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Request(format!(
                "HTTP {}: {}",
                status,
                truncate_text(&text, 200)
            )));
        }

        let body: Value = response.json().await.map_err(|e| self.classify_error(e))?;

        let content = body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                LlmError::Unexpected("API 响应中没有预期的 choices 结构".to_string())
            })?;

        debug!("LLM API 调用成功");
        Ok(content.trim().to_string())
    }

    /// 把 reqwest 错误归入三类之一：超时、请求错误、未预期错误
    fn classify_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout_secs)
        } else if e.is_decode() {
            LlmError::Unexpected(format!("响应不是合法 JSON: {}", e))
        } else {
            LlmError::Request(e.to_string())
        }
    }
}
