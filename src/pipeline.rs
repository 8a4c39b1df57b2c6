//! 流程编排层
//!
//! 按 读取图片 → OCR 识别 → LLM 分类 → 组装结果 的顺序执行一次完整流程。
//! 完全串行，没有重试，也没有任何跨阶段的共享可变状态。

use std::path::Path;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::clients::VisionClient;
use crate::config::Config;
use crate::error::AppError;
use crate::models::{ClassificationOutcome, PipelineResult};
use crate::services::CardService;
use crate::utils::logging::truncate_text;

/// 名片处理流水线
pub struct Pipeline {
    vision: VisionClient,
    card_service: CardService,
}

impl Pipeline {
    /// 创建流水线
    pub fn new(config: &Config) -> Self {
        Self {
            vision: VisionClient::new(config),
            card_service: CardService::new(config),
        }
    }

    /// 处理一张名片图片
    ///
    /// 任一阶段失败都会短路并返回失败形态的结果；本函数不会 panic，
    /// 也不会让任何错误越过自身边界。
    pub async fn run(&self, image_path: &Path) -> PipelineResult {
        let text = match self.recognize_stage(image_path).await {
            Ok(text) => text,
            Err(e) => {
                warn!("OCR 阶段失败: {}", e);
                return PipelineResult::failure(e.to_string());
            }
        };

        info!("🤖 开始 LLM 字段分类");
        match self.card_service.classify(&text).await {
            ClassificationOutcome::Card(card) => {
                info!("✅ 分类完成");
                PipelineResult::success(card)
            }
            ClassificationOutcome::Error {
                message,
                raw_response,
            } => {
                warn!("分类阶段失败: {}", message);
                PipelineResult::failure_with_raw(message, raw_response)
            }
        }
    }

    /// OCR 阶段：读取图片文件并调用 Vision API
    async fn recognize_stage(&self, image_path: &Path) -> Result<String, AppError> {
        let image_bytes = fs::read(image_path)
            .await
            .map_err(|e| AppError::ImageRead(format!("{}: {}", image_path.display(), e)))?;

        info!("📷 开始 OCR 识别: {}", image_path.display());
        let text = self.vision.recognize(&image_bytes).await?;

        info!("✓ OCR 完成，识别文本 {} 字符", text.chars().count());
        debug!("OCR 文本: {}", truncate_text(&text, 200));
        Ok(text)
    }
}
