//! 名片信息分类服务
//!
//! 负责构建提示词、调用 LLM，并从自由文本回复中提取 JSON 解析为 [`CardRecord`]。
//! 本层的所有失败都折叠进 [`ClassificationOutcome`]，不向外抛错。

use serde_json::Value;
use tracing::{debug, warn};

use crate::clients::LlmClient;
use crate::config::Config;
use crate::models::{CardRecord, ClassificationOutcome};

/// 系统提示词：列出六个目标字段和期望的 JSON 结构，
/// 要求缺失信息用 null，禁止 JSON 之外的任何文本
const SYSTEM_PROMPT: &str = r#"你是名片信息提取专家。请从 OCR 识别出的文本中找出以下信息，并以准确的 JSON 格式返回。

必须提取的字段：
- name: 人名（中文、英文、韩文、汉字均可）
- contact: 电话号码（010-1234-5678、02-123-4567、+82-10-1234-5678 等所有形式）
- email: 电子邮箱（包含 @ 的邮箱地址）
- organization: 公司名、机构名、团体名（包括株式会社、财团法人、协会等）
- position: 职务、职级、角色（代表理事、部长、组长、研究员、CEO、CTO 等）
- sns_links: SNS 账号信息（KakaoTalk ID、Instagram、Facebook、Twitter 等）

响应必须严格符合以下 JSON 格式：
{
  "name": "提取到的姓名",
  "contact": "提取到的电话号码",
  "email": "提取到的邮箱",
  "organization": "提取到的组织名",
  "position": "提取到的职务",
  "sns_links": "提取到的SNS信息"
}

找不到的信息请使用 null。JSON 结果之外绝对不要包含任何其他文本。"#;

/// 名片分类服务
pub struct CardService {
    llm: LlmClient,
}

impl CardService {
    /// 创建新的分类服务
    pub fn new(config: &Config) -> Self {
        Self {
            llm: LlmClient::new(config),
        }
    }

    /// 对 OCR 文本进行字段分类
    ///
    /// # 参数
    /// - `text`: OCR 识别出的文本，可能为空或乱码，原样嵌入用户消息
    pub async fn classify(&self, text: &str) -> ClassificationOutcome {
        let user_message = format!("请从下面的名片文本中提取信息：\n\n{}", text);

        let reply = match self.llm.chat(&user_message, SYSTEM_PROMPT).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("LLM 调用失败: {}", e);
                return ClassificationOutcome::Error {
                    message: e.to_string(),
                    raw_response: None,
                };
            }
        };

        parse_reply(&reply)
    }
}

/// 解析 LLM 回复
///
/// 提取出的子串必须是一个 JSON 对象；解析失败时六个字段全部置空，
/// 并逐字保留原始回复用于诊断。
pub fn parse_reply(reply: &str) -> ClassificationOutcome {
    let json_str = extract_json_block(reply);
    debug!("提取到的 JSON 子串长度: {} 字符", json_str.chars().count());

    match serde_json::from_str::<Value>(json_str) {
        Ok(value) if value.is_object() => {
            ClassificationOutcome::Card(CardRecord::from_json(&value))
        }
        _ => {
            warn!("LLM 回复无法解析为 JSON 对象");
            ClassificationOutcome::Error {
                message: "JSON 解析错误".to_string(),
                raw_response: Some(reply.to_string()),
            }
        }
    }
}

/// 从 LLM 的自由文本回复中提取 JSON 子串
///
/// 回退顺序是对外契约，顺序不可改变：
/// 1. 带 ```json 标记的围栏块（到下一个 ``` 为止，未闭合时取到结尾）
/// 2. 任意 ``` 围栏块（第一对围栏之间）
/// 3. 第一个 `{` 到最后一个 `}`（含两端，不做括号配对）
/// 4. 原文全文
pub fn extract_json_block(reply: &str) -> &str {
    if let Some((_, rest)) = reply.split_once("```json") {
        return match rest.split_once("```") {
            Some((inner, _)) => inner.trim(),
            None => rest.trim(),
        };
    }

    if let Some((_, rest)) = reply.split_once("```") {
        return match rest.split_once("```") {
            Some((inner, _)) => inner.trim(),
            None => rest.trim(),
        };
    }

    if let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) {
        if start <= end {
            return &reply[start..=end];
        }
    }

    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fenced_json_block() {
        let reply = "```json\n{\"name\":\"Kim\",\"contact\":null,\"email\":null,\"organization\":null,\"position\":null,\"sns_links\":null}\n```";
        assert_eq!(
            extract_json_block(reply),
            "{\"name\":\"Kim\",\"contact\":null,\"email\":null,\"organization\":null,\"position\":null,\"sns_links\":null}"
        );
    }

    #[test]
    fn test_extract_fenced_json_with_surrounding_prose() {
        let reply = "好的，结果如下：\n```json\n{\"name\": \"Kim\"}\n```\n希望有帮助！";
        assert_eq!(extract_json_block(reply), "{\"name\": \"Kim\"}");
    }

    #[test]
    fn test_extract_unclosed_json_fence_takes_rest() {
        let reply = "```json\n{\"name\": \"Kim\"}";
        assert_eq!(extract_json_block(reply), "{\"name\": \"Kim\"}");
    }

    #[test]
    fn test_extract_plain_fence() {
        let reply = "说明文字\n```\n{\"name\": \"Lee\"}\n```\n结束";
        assert_eq!(extract_json_block(reply), "{\"name\": \"Lee\"}");
    }

    #[test]
    fn test_json_fence_takes_priority_over_plain_fence() {
        let reply = "```\n忽略这个\n```\n```json\n{\"name\": \"A\"}\n```";
        // 即使 ```json 出现在普通围栏之后，规则 1 仍然先生效
        assert_eq!(extract_json_block(reply), "{\"name\": \"A\"}");
    }

    #[test]
    fn test_extract_first_brace_to_last_brace() {
        let reply = "这是提取结果 {\"name\":\"A\"} done.";
        assert_eq!(extract_json_block(reply), "{\"name\":\"A\"}");
    }

    #[test]
    fn test_brace_like_prose_before_first_brace_is_ignored() {
        // 第一个 `{` 之前的 `}` 字符不影响起点
        let reply = "符号} 噪音 {\"name\":\"A\"} 以及 {\"x\":1} done.";
        assert_eq!(extract_json_block(reply), "{\"name\":\"A\"} 以及 {\"x\":1}");
    }

    #[test]
    fn test_no_braces_returns_whole_reply() {
        let reply = "完全没有 JSON 的回复";
        assert_eq!(extract_json_block(reply), reply);
    }

    #[test]
    fn test_reversed_braces_fall_through_to_raw() {
        let reply = "} 只有反向括号 {";
        assert_eq!(extract_json_block(reply), reply);
    }

    #[test]
    fn test_parse_reply_success() {
        let reply = "```json\n{\"name\":\"Kim\",\"contact\":\"010-1234-5678\",\"email\":null,\"organization\":null,\"position\":null,\"sns_links\":null}\n```";
        match parse_reply(reply) {
            ClassificationOutcome::Card(card) => {
                assert_eq!(card.name.as_deref(), Some("Kim"));
                assert_eq!(card.contact.as_deref(), Some("010-1234-5678"));
                assert_eq!(card.email, None);
            }
            other => panic!("期望分类成功，实际: {:?}", other),
        }
    }

    #[test]
    fn test_parse_reply_unbalanced_braces() {
        let reply = "结果是 {\"name\": \"Kim\", \"contact\": } 完";
        match parse_reply(reply) {
            ClassificationOutcome::Error {
                message,
                raw_response,
            } => {
                assert_eq!(message, "JSON 解析错误");
                // 原文逐字保留
                assert_eq!(raw_response.as_deref(), Some(reply));
            }
            other => panic!("期望解析失败，实际: {:?}", other),
        }
    }

    #[test]
    fn test_parse_reply_non_object_json_is_error() {
        // 能解析但不是对象，同样按解析失败处理
        match parse_reply("[1, 2, 3]") {
            ClassificationOutcome::Error { raw_response, .. } => {
                assert_eq!(raw_response.as_deref(), Some("[1, 2, 3]"));
            }
            other => panic!("期望解析失败，实际: {:?}", other),
        }
    }

    #[test]
    fn test_parse_reply_ignores_extra_keys() {
        let reply = "{\"name\":\"Kim\",\"confidence\":0.9}";
        match parse_reply(reply) {
            ClassificationOutcome::Card(card) => {
                assert_eq!(card.name.as_deref(), Some("Kim"));
                assert_eq!(card.sns_links, None);
            }
            other => panic!("期望分类成功，实际: {:?}", other),
        }
    }
}
