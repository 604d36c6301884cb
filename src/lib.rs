pub mod config; // 运行参数
pub mod models; // 检测器接口与HTTP实现
pub mod pipeline; // 标注生成流水线
pub mod prompts; // 提示词目录

pub use crate::config::Args;
pub use crate::models::{ChunkDetection, HttpDetector, PromptDetector};
pub use crate::prompts::{Prompt, PromptCatalog};

/// 检测框 (axis-aligned, absolute pixel corners)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bbox {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl Bbox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn x1(&self) -> f32 {
        self.x1
    }

    pub fn y1(&self) -> f32 {
        self.y1
    }

    pub fn x2(&self) -> f32 {
        self.x2
    }

    pub fn y2(&self) -> f32 {
        self.y2
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn intersection_area(&self, another: &Bbox) -> f32 {
        let l = self.x1.max(another.x1);
        let r = self.x2.min(another.x2);
        let t = self.y1.max(another.y1);
        let b = self.y2.min(another.y2);
        (r - l).max(0.0) * (b - t).max(0.0)
    }

    pub fn union(&self, another: &Bbox) -> f32 {
        self.area() + another.area() - self.intersection_area(another)
    }

    /// IoU, 并集为0时定义为0
    pub fn iou(&self, another: &Bbox) -> f32 {
        let union = self.union(another);
        if union > 0.0 {
            self.intersection_area(another) / union
        } else {
            0.0
        }
    }
}

/// 原始检测 (单图聚合的逐块结果, 标签已换算为全局索引)
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub bbox: Bbox,
    pub score: f32,
    pub label: usize,
}

/// 合并后的检测 (NMS与几何过滤的幸存者, 仅属于单张图)
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedDetection {
    pub bbox: Bbox,
    pub score: f32,
    pub label: usize,
}

/// 贪心NMS (class-agnostic: 跨标签相互抑制, 这是既定行为)
///
/// 稳定排序按置信度降序, 同分保持聚合顺序; 与已保留框 IoU >= 阈值的候选被丢弃.
pub fn non_max_suppression(xs: &mut Vec<RawDetection>, iou_threshold: f32) {
    xs.sort_by(|d1, d2| {
        d2.score
            .partial_cmp(&d1.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            let iou = xs[prev_index].bbox.iou(&xs[index].bbox);
            if iou >= iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32, score: f32, label: usize) -> RawDetection {
        RawDetection {
            bbox: Bbox::new(x1, y1, x2, y2),
            score,
            label,
        }
    }

    #[test]
    fn test_iou_identity() {
        let a = Bbox::new(0.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_disjoint() {
        let a = Bbox::new(0.0, 0.0, 10.0, 10.0);
        let b = Bbox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_range() {
        let a = Bbox::new(0.0, 0.0, 10.0, 10.0);
        let b = Bbox::new(5.0, 5.0, 15.0, 15.0);
        let iou = a.iou(&b);
        assert!(iou > 0.0 && iou < 1.0);
    }

    #[test]
    fn test_iou_zero_union() {
        let a = Bbox::new(5.0, 5.0, 5.0, 5.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_nms_identical_boxes() {
        let mut xs = vec![
            det(0.0, 0.0, 10.0, 10.0, 0.8, 1),
            det(0.0, 0.0, 10.0, 10.0, 0.9, 0),
        ];
        non_max_suppression(&mut xs, 0.5);
        assert_eq!(xs.len(), 1);
        assert_eq!(xs[0].score, 0.9);
    }

    #[test]
    fn test_nms_output_not_larger_and_pairwise_below_threshold() {
        let mut xs = vec![
            det(0.0, 0.0, 10.0, 10.0, 0.9, 0),
            det(1.0, 1.0, 11.0, 11.0, 0.8, 1),
            det(50.0, 50.0, 60.0, 60.0, 0.7, 0),
            det(0.0, 0.0, 9.0, 9.0, 0.6, 2),
        ];
        let n = xs.len();
        non_max_suppression(&mut xs, 0.5);
        assert!(xs.len() <= n);
        for i in 0..xs.len() {
            for j in (i + 1)..xs.len() {
                assert!(xs[i].bbox.iou(&xs[j].bbox) < 0.5);
            }
        }
    }

    #[test]
    fn test_nms_suppresses_across_labels() {
        // 不同标签的高重叠框同样相互抑制
        let mut xs = vec![
            det(0.0, 0.0, 10.0, 10.0, 0.9, 3),
            det(0.0, 0.0, 10.0, 10.0, 0.8, 7),
        ];
        non_max_suppression(&mut xs, 0.5);
        assert_eq!(xs.len(), 1);
        assert_eq!(xs[0].label, 3);
    }

    #[test]
    fn test_nms_equal_scores_keep_insertion_order() {
        let mut xs = vec![
            det(0.0, 0.0, 10.0, 10.0, 0.5, 0),
            det(100.0, 100.0, 110.0, 110.0, 0.5, 1),
        ];
        non_max_suppression(&mut xs, 0.5);
        assert_eq!(xs.len(), 2);
        assert_eq!(xs[0].label, 0);
        assert_eq!(xs[1].label, 1);
    }
}
