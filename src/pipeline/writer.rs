//! 标注写出 (Annotation Writer)
//!
//! 幸存检测转为YOLO归一化中心框格式写入标签文件, 源图像镜像到输出
//! 目录. 标签文件先写临时文件再原子重命名发布, 读者不会看到半成品;
//! 零幸存者时不产生任何文件.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::{Bbox, ConsolidatedDetection};

/// 绝对像素角点框 → 归一化中心框 (cx, cy, w, h)
pub fn xyxy_to_yolo(bbox: &Bbox, image_w: u32, image_h: u32) -> (f32, f32, f32, f32) {
    let w = image_w as f32;
    let h = image_h as f32;
    let cx = ((bbox.x1() + bbox.x2()) / 2.0) / w;
    let cy = ((bbox.y1() + bbox.y2()) / 2.0) / h;
    let bw = (bbox.x2() - bbox.x1()) / w;
    let bh = (bbox.y2() - bbox.y1()) / h;
    (cx, cy, bw, bh)
}

/// 归一化中心框 → 绝对像素角点框
pub fn yolo_to_xyxy(cx: f32, cy: f32, bw: f32, bh: f32, image_w: u32, image_h: u32) -> Bbox {
    let w = image_w as f32;
    let h = image_h as f32;
    Bbox::new(
        (cx - bw / 2.0) * w,
        (cy - bh / 2.0) * h,
        (cx + bw / 2.0) * w,
        (cy + bh / 2.0) * h,
    )
}

/// 序列化为标签文件内容: 每行 `<label> <cx> <cy> <w> <h>`,
/// 固定6位小数, 换行连接, 无结尾空行.
pub fn format_label_lines(
    detections: &[ConsolidatedDetection],
    image_w: u32,
    image_h: u32,
) -> String {
    detections
        .iter()
        .map(|d| {
            let (cx, cy, bw, bh) = xyxy_to_yolo(&d.bbox, image_w, image_h);
            format!("{} {:.6} {:.6} {:.6} {:.6}", d.label, cx, cy, bw, bh)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 原子写文件: 同目录临时文件 + rename发布
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("txt.tmp");
    fs::write(&tmp, content).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to publish {}", path.display()))?;
    Ok(())
}

/// 写出单张图的标注产物
///
/// 返回是否产生了标注. 零幸存者 ⇒ 不写标签, 不镜像图像; 图像镜像
/// 幂等: 目标已存在则跳过.
pub fn write_annotation(
    labels_dir: &Path,
    images_dir: &Path,
    image_path: &Path,
    stem: &str,
    detections: &[ConsolidatedDetection],
    image_w: u32,
    image_h: u32,
) -> Result<bool> {
    if detections.is_empty() {
        return Ok(false);
    }

    let label_path = labels_dir.join(format!("{}.txt", stem));
    write_atomic(&label_path, &format_label_lines(detections, image_w, image_h))?;

    let file_name = image_path
        .file_name()
        .with_context(|| format!("image path has no file name: {}", image_path.display()))?;
    let dst_img = images_dir.join(file_name);
    if !dst_img.exists() {
        fs::copy(image_path, &dst_img)
            .with_context(|| format!("failed to mirror image to {}", dst_img.display()))?;
    }

    Ok(true)
}
