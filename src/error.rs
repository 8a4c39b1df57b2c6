//! 错误类型定义
//!
//! 每个阶段的失败都会被转换为结构化结果，不允许任何错误以未处理的方式
//! 终止进程；只有参数 / 凭证预检查会提前以非零状态码退出。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置错误（凭证缺失等），在任何网络调用之前报告
    #[error("配置错误: {0}")]
    Config(String),

    /// 图片文件读取失败
    #[error("无法读取图片文件: {0}")]
    ImageRead(String),

    /// OCR 服务错误
    #[error(transparent)]
    Ocr(#[from] OcrError),

    /// LLM 服务错误
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// OCR 服务错误
#[derive(Error, Debug)]
pub enum OcrError {
    /// 无法读取凭证文件
    #[error("无法读取 Vision 凭证文件 ({path}): {message}")]
    Credentials { path: String, message: String },

    /// Vision API 在响应体内返回的错误
    #[error("Google Vision API 错误: {0}")]
    Service(String),

    /// 识别成功但没有任何文本标注
    #[error("OCR 没有识别结果")]
    NoResult,

    /// 网络请求失败或 HTTP 状态异常
    #[error("OCR 请求失败: {0}")]
    Request(String),

    /// 响应体不是预期的 JSON 结构
    #[error("OCR 响应格式异常: {0}")]
    BadResponse(String),
}

/// LLM 服务错误
///
/// 超时、请求错误和未预期错误是三种互相区分的错误类别，
/// 调用方可以依赖各自的错误消息。
#[derive(Error, Debug)]
pub enum LlmError {
    /// API 密钥为空，不会发起任何网络调用
    #[error("GROQ_API_KEY 未配置")]
    KeyNotConfigured,

    /// 请求超过固定的超时上限
    #[error("API 请求超时 ({0}秒)")]
    Timeout(u64),

    /// 网络层请求错误
    #[error("API 请求错误: {0}")]
    Request(String),

    /// 预期之外的错误（兜底分类）
    #[error("预期之外的错误: {0}")]
    Unexpected(String),
}

/// 应用程序结果类型
pub type Result<T> = std::result::Result<T, AppError>;
