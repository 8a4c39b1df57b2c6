//! # Namecard OCR
//!
//! 名片识别流水线：Google Vision OCR + LLM 字段分类
//!
//! 一次运行处理一张名片图片，最终向 stdout 输出一行 JSON。
//!
//! ## 架构设计
//!
//! - `config` —— env 文件加载与显式配置对象（业务逻辑不读环境变量）
//! - `clients/` —— 外部服务客户端（Vision、Groq），只暴露能力
//! - `services/` —— 业务能力层（提示词构建、回复 JSON 提取）
//! - `pipeline` —— 流程编排（读图 → OCR → 分类 → 组装结果）
//! - `models` —— CardRecord / ClassificationOutcome / PipelineResult

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use clients::{LlmClient, VisionClient};
pub use config::Config;
pub use error::{AppError, LlmError, OcrError};
pub use models::{CardRecord, ClassificationOutcome, PipelineResult};
pub use pipeline::Pipeline;
pub use services::CardService;
