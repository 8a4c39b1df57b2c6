use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 名片记录
///
/// 六个可选字段，未找到的信息为 `None`（序列化为 `null`）。
/// 每次运行时重新创建，组装完成后不再修改。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    /// 人名
    pub name: Option<String>,
    /// 电话号码
    pub contact: Option<String>,
    /// 电子邮箱
    pub email: Option<String>,
    /// 公司 / 机构名
    pub organization: Option<String>,
    /// 职务 / 职级
    pub position: Option<String>,
    /// SNS 账号信息
    pub sns_links: Option<String>,
}

impl CardRecord {
    /// 从解析后的 JSON 对象读取六个已知字段
    ///
    /// 缺失和 `null` 视为未找到，多余的键忽略。
    /// 非字符串值按其紧凑 JSON 形式保留为字符串（LLM 偶尔会返回数字等）。
    pub fn from_json(value: &Value) -> Self {
        Self {
            name: field_as_string(value, "name"),
            contact: field_as_string(value, "contact"),
            email: field_as_string(value, "email"),
            organization: field_as_string(value, "organization"),
            position: field_as_string(value, "position"),
            sns_links: field_as_string(value, "sns_links"),
        }
    }
}

fn field_as_string(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// 分类结果
///
/// 成功时是一个填充好的 [`CardRecord`]；失败时携带人类可读的错误消息，
/// JSON 解析失败时额外保留原始回复全文用于诊断。
/// 调用方必须先检查判别式，再信任其中的字段。
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationOutcome {
    /// 分类成功
    Card(CardRecord),
    /// 分类失败
    Error {
        /// 错误消息
        message: String,
        /// 解析失败时的原始回复（逐字保留）
        raw_response: Option<String>,
    },
}

/// 流程最终结果
///
/// 程序唯一对外可见的产物，序列化为一行 JSON 输出。
/// 成功形态包含全部六个字段（值或 `null`）加 `"success": true`；
/// 失败形态只包含 `"error"`、`"success": false` 和可选的诊断字段。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PipelineResult {
    /// 成功：六个字段与 success 标志平铺在同一个对象里
    Success {
        #[serde(flatten)]
        card: CardRecord,
        success: bool,
    },
    /// 失败：错误消息加 success 标志，六个字段一律不出现
    Failure {
        error: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        raw_response: Option<String>,
    },
}

impl PipelineResult {
    /// 构建成功结果
    pub fn success(card: CardRecord) -> Self {
        Self::Success {
            card,
            success: true,
        }
    }

    /// 构建失败结果
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
            success: false,
            raw_response: None,
        }
    }

    /// 构建带原始回复的失败结果
    pub fn failure_with_raw(error: impl Into<String>, raw_response: Option<String>) -> Self {
        Self::Failure {
            error: error.into(),
            success: false,
            raw_response,
        }
    }

    /// 是否成功
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
