//! 外部服务客户端
//!
//! 封装与 Google Vision 和 Groq API 的所有交互

pub mod llm_client;
pub mod vision_client;

pub use llm_client::LlmClient;
pub use vision_client::VisionClient;
