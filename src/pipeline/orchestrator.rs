//! 分块推理编排 (Chunked Inference)
//!
//! 大词表按目录顺序切为固定大小的块, 逐块调用检测器, 把块内标签
//! 偏移换算为全局索引后聚合为单张图的扁平检测列表. 列表故意不定序:
//! 后续NMS按分数重排, 块间到达顺序不影响最终输出.

use image::DynamicImage;

use crate::models::PromptDetector;
use crate::prompts::PromptCatalog;
use crate::RawDetection;

/// 单张图的聚合结果
#[derive(Debug, Default)]
pub struct ChunkRun {
    pub detections: Vec<RawDetection>,
    /// 调用失败或超时的块数 (按零检测处理, 绝不中止图像)
    pub failed_chunks: usize,
}

/// 对一张图跑完整个词表
pub fn run_chunks(
    detector: &dyn PromptDetector,
    image: &DynamicImage,
    catalog: &PromptCatalog,
    chunk_size: usize,
    confidence: f32,
) -> ChunkRun {
    let mut run = ChunkRun::default();

    for (start, texts) in catalog.chunks(chunk_size) {
        match detector.detect(image, &texts, confidence) {
            Ok(found) => {
                for d in found {
                    run.detections.push(RawDetection {
                        bbox: d.bbox,
                        score: d.score,
                        // 块内偏移 → 全局索引
                        label: start + d.label_offset,
                    });
                }
            }
            Err(e) => {
                eprintln!("⚠️  检测块失败 (offset {}): {:#}", start, e);
                run.failed_chunks += 1;
            }
        }
    }

    run
}
