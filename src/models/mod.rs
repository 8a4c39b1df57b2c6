//! 数据模型
//!
//! 一次流程运行只产生一个 [`PipelineResult`]，没有持久化，也没有生命周期。

pub mod card;

pub use card::{CardRecord, ClassificationOutcome, PipelineResult};
