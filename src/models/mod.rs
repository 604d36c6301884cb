//! 检测器统一接口
//!
//! 开放词表检测模型是外部协作者: 对 (图像, 提示词子集, 置信度阈值)
//! 返回零或多个 (绝对像素框, 置信度, 子集内标签偏移). 核心流水线只
//! 依赖这个固定形状的接口, 不关心检测器内部表示.
//!
//! 实现:
//! - `HttpDetector`: 经HTTP调用旁路推理服务, 文件: `http.rs`

pub mod http;

pub use http::HttpDetector;

use anyhow::Result;
use image::DynamicImage;

use crate::Bbox;

/// 单块检测结果: 框为绝对像素坐标, 标签为块内偏移 (非全局索引)
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDetection {
    pub bbox: Bbox,
    pub score: f32,
    pub label_offset: usize,
}

/// 开放词表检测能力
///
/// 调用可能阻塞或超时; 错误由调用方按"该块零检测"处理, 绝不致命.
pub trait PromptDetector: Send + Sync {
    fn detect(
        &self,
        image: &DynamicImage,
        prompts: &[String],
        confidence: f32,
    ) -> Result<Vec<ChunkDetection>>;
}
