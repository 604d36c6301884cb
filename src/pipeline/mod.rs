//! 标注生成流水线 (Label Generation Pipeline)
//!
//! 单图流程: 续跑闸门 → 解码 → 分块推理 → 检测合并 → 标注写出.
//! 图像之间只读共享词表快照, 输出路径按文件名stem互不相交, 因此
//! 逐图并行无须任何锁; 图像之间随时中断不会破坏已完成的产物.
//!
//! - Orchestrator: 分块推理聚合
//! - Consolidator: NMS + 几何过滤
//! - Writer:       归一化写出
//! - Cleanup:      独立文本清理遍
pub mod cleanup;
pub mod consolidate;
pub mod orchestrator;
pub mod writer;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::GenericImageView;

use crate::models::PromptDetector;
use crate::prompts::PromptCatalog;
use consolidate::ConsolidateParams;

/// 识别的图像扩展名 (不区分大小写)
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// 生成配置
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub images_dir: PathBuf,
    pub out_dir: PathBuf,
    pub confidence: f32,
    pub chunk_size: usize,
    pub params: ConsolidateParams,
    pub resume: bool,
    pub workers: usize,
}

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// 实际处理的图像数 (不含续跑跳过)
    pub processed: usize,
    /// 续跑模式跳过
    pub skipped_resume: usize,
    /// 解码失败跳过
    pub skipped_decode: usize,
    /// 失败的检测块总数 (按零检测处理)
    pub failed_chunks: usize,
    /// 产生标注的图像数
    pub labeled: usize,
    /// 过滤后零幸存者的图像数
    pub empty: usize,
    /// 写出失败数 (记录并继续)
    pub write_errors: usize,
}

/// 单张图的处理结果
enum ImageOutcome {
    Labeled,
    Empty,
    DecodeFailed,
    WriteFailed,
}

/// 标注生成器
pub struct Generator {
    config: GeneratorConfig,
    catalog: PromptCatalog,
    labels_dir: PathBuf,
    images_dir: PathBuf,
}

impl Generator {
    /// 建输出目录并写出 classes.txt. 失败是配置错误.
    pub fn new(config: GeneratorConfig, catalog: PromptCatalog) -> Result<Self> {
        let labels_dir = config.out_dir.join("labels");
        let images_dir = config.out_dir.join("images");
        fs::create_dir_all(&labels_dir)
            .with_context(|| format!("failed to create {}", labels_dir.display()))?;
        fs::create_dir_all(&images_dir)
            .with_context(|| format!("failed to create {}", images_dir.display()))?;
        catalog.write_classes(&config.out_dir.join("classes.txt"))?;

        Ok(Self {
            config,
            catalog,
            labels_dir,
            images_dir,
        })
    }

    pub fn labels_dir(&self) -> &Path {
        &self.labels_dir
    }

    /// 递归收集图像路径, 排序保证处理顺序确定
    pub fn collect_images(&self) -> Result<Vec<PathBuf>> {
        let mut images = Vec::new();
        collect_images_recursive(&self.config.images_dir, &mut images).with_context(|| {
            format!(
                "failed to scan image dir {}",
                self.config.images_dir.display()
            )
        })?;
        images.sort();
        Ok(images)
    }

    /// 续跑模式: 启动时扫描一次已有标签的stem集合
    fn existing_stems(&self) -> HashSet<String> {
        if !self.config.resume {
            return HashSet::new();
        }
        let mut stems = HashSet::new();
        if let Ok(entries) = fs::read_dir(&self.labels_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "txt").unwrap_or(false) {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        stems.insert(stem.to_string());
                    }
                }
            }
        }
        stems
    }

    /// 处理单张图. 所有失败局部化: 解码失败跳过, 块失败计零检测,
    /// 写失败记录后继续.
    fn process_image(
        &self,
        detector: &dyn PromptDetector,
        path: &Path,
        stem: &str,
    ) -> (ImageOutcome, usize) {
        let image = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                eprintln!("⚠️  解码失败, 跳过 {}: {}", path.display(), e);
                return (ImageOutcome::DecodeFailed, 0);
            }
        };
        let (w, h) = (image.width(), image.height());

        let run = orchestrator::run_chunks(
            detector,
            &image,
            &self.catalog,
            self.config.chunk_size,
            self.config.confidence,
        );
        let failed_chunks = run.failed_chunks;

        let kept = consolidate::consolidate(run.detections, w, h, &self.config.params, &self.catalog);

        match writer::write_annotation(
            &self.labels_dir,
            &self.images_dir,
            path,
            stem,
            &kept,
            w,
            h,
        ) {
            Ok(true) => (ImageOutcome::Labeled, failed_chunks),
            Ok(false) => (ImageOutcome::Empty, failed_chunks),
            Err(e) => {
                eprintln!("❌ 写出失败 {}: {:#}", path.display(), e);
                (ImageOutcome::WriteFailed, failed_chunks)
            }
        }
    }

    /// 运行生成. 返回统计; 单图/单块失败不影响整体结果.
    pub fn run(&self, detector: &dyn PromptDetector) -> Result<RunStats> {
        let images = self.collect_images()?;
        let existing = self.existing_stems();

        let mut stats = RunStats::default();
        let mut pending: Vec<(PathBuf, String)> = Vec::new();
        for path in images {
            let stem = match path.file_stem().and_then(|s| s.to_str()) {
                Some(s) => s.to_string(),
                None => continue,
            };
            if existing.contains(&stem) {
                stats.skipped_resume += 1;
                continue;
            }
            pending.push((path, stem));
        }

        let outcomes = if self.config.workers <= 1 {
            pending
                .iter()
                .map(|(path, stem)| self.process_image(detector, path, stem))
                .collect()
        } else {
            self.run_parallel(detector, &pending)
        };

        for (outcome, failed_chunks) in outcomes {
            stats.failed_chunks += failed_chunks;
            match outcome {
                ImageOutcome::DecodeFailed => stats.skipped_decode += 1,
                ImageOutcome::Labeled => {
                    stats.processed += 1;
                    stats.labeled += 1;
                }
                ImageOutcome::Empty => {
                    stats.processed += 1;
                    stats.empty += 1;
                }
                ImageOutcome::WriteFailed => {
                    stats.processed += 1;
                    stats.write_errors += 1;
                }
            }
        }

        Ok(stats)
    }

    /// 逐图并行: 每张图拥有互不相交的输出路径, 无须跨图同步
    fn run_parallel(
        &self,
        detector: &dyn PromptDetector,
        pending: &[(PathBuf, String)],
    ) -> Vec<(ImageOutcome, usize)> {
        let (task_tx, task_rx) = crossbeam_channel::unbounded::<&(PathBuf, String)>();
        let (done_tx, done_rx) = crossbeam_channel::unbounded();

        std::thread::scope(|scope| {
            for _ in 0..self.config.workers {
                let task_rx = task_rx.clone();
                let done_tx = done_tx.clone();
                scope.spawn(move || {
                    for (path, stem) in task_rx.iter() {
                        let _ = done_tx.send(self.process_image(detector, path, stem));
                    }
                });
            }
            drop(done_tx);

            for task in pending {
                let _ = task_tx.send(task);
            }
            drop(task_tx);

            done_rx.iter().collect()
        })
    }
}

fn collect_images_recursive(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_images_recursive(&path, out)?;
        } else if is_image_path(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}
