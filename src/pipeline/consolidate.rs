//! 检测合并 (Detection Consolidation)
//!
//! 对单张图聚合后的原始检测做贪心NMS、几何合理性过滤与标签回查.
//! 整个过程确定性: 相同输入与参数必得相同输出, 几何判定不依赖
//! 任何哈希迭代顺序.

use crate::prompts::PromptCatalog;
use crate::{non_max_suppression, ConsolidatedDetection, RawDetection};

/// 合并参数
#[derive(Debug, Clone, Copy)]
pub struct ConsolidateParams {
    /// NMS IoU抑制阈值
    pub iou: f32,
    /// 最小归一化面积 (恰好等于保留)
    pub min_area: f32,
    /// 最大长宽比 (恰好等于保留)
    pub max_aspect: f32,
}

impl Default for ConsolidateParams {
    fn default() -> Self {
        Self {
            iou: 0.5,
            min_area: 0.004,
            max_aspect: 6.0,
        }
    }
}

/// 单张图的检测合并
///
/// 1. 贪心class-agnostic NMS (按分数降序, 同分保持聚合顺序)
/// 2. 几何过滤: 归一化面积 < min_area 或长宽比 > max_aspect 则丢弃
/// 3. 标签回查: 越界索引丢弃, 重复文本重映射到最后一次出现
///
/// 输出按NMS保留顺序 (即分数降序), 可能为空.
pub fn consolidate(
    mut raw: Vec<RawDetection>,
    image_w: u32,
    image_h: u32,
    params: &ConsolidateParams,
    catalog: &PromptCatalog,
) -> Vec<ConsolidatedDetection> {
    non_max_suppression(&mut raw, params.iou);

    let image_area = (image_w as f32) * (image_h as f32);
    let mut kept = Vec::with_capacity(raw.len());
    for det in raw {
        let bw = det.bbox.width();
        let bh = det.bbox.height();

        let area = (bw * bh) / image_area;
        // 任一边长约为0时长宽比视为无穷大
        let aspect = if bw > 0.0 && bh > 0.0 {
            bw.max(bh) / bw.min(bh).max(1e-6)
        } else {
            1e6
        };
        if area < params.min_area || aspect > params.max_aspect {
            continue;
        }

        // 防御性标签回查: 越界丢弃而非失败
        let Some(label) = catalog.canonical_id(det.label) else {
            continue;
        };

        kept.push(ConsolidatedDetection {
            bbox: det.bbox,
            score: det.score,
            label,
        });
    }
    kept
}
