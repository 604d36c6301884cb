//! 开放词表伪标签生成器
//!
//! 生成模式: 图像目录 → 分块推理 → NMS/几何过滤 → YOLO格式标注
//! 清理模式: 仅对既有输出目录做标签文件逐行去重

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Parser;

use ovd_labelgen::pipeline::consolidate::ConsolidateParams;
use ovd_labelgen::pipeline::{cleanup, Generator, GeneratorConfig};
use ovd_labelgen::{Args, HttpDetector, PromptCatalog};

fn main() -> Result<()> {
    let args = Args::parse();

    // 清理模式独立运行, 不碰几何
    if let Some(root) = &args.clean {
        let labels_dir = Path::new(root).join("labels");
        let updated = cleanup::clean_labels_dir(&labels_dir)?;
        println!("🧹 清理完成: 改写 {} 个标签文件", updated);
        return Ok(());
    }

    let Some(images) = &args.images else {
        bail!("--images is required when generating labels");
    };

    let catalog = PromptCatalog::load(Path::new(&args.prompts))?;
    println!(
        "🚀 伪标签生成启动 {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("📦 提示词: {} ({} 条)", args.prompts, catalog.len());
    println!("📹 图像目录: {}", images);
    println!("🌐 检测服务: {}", args.endpoint);
    println!(
        "⚙️  conf={} iou={} min-area={} max-aspect={} chunk={} workers={}{}",
        args.conf,
        args.iou,
        args.min_area,
        args.max_aspect,
        args.prompt_chunk,
        args.workers,
        if args.resume { " resume" } else { "" },
    );

    let config = GeneratorConfig {
        images_dir: PathBuf::from(images),
        out_dir: PathBuf::from(&args.out),
        confidence: args.conf,
        chunk_size: args.prompt_chunk.max(1),
        params: ConsolidateParams {
            iou: args.iou,
            min_area: args.min_area,
            max_aspect: args.max_aspect,
        },
        resume: args.resume,
        workers: args.workers.max(1),
    };

    let detector = HttpDetector::new(&args.endpoint, Duration::from_secs(args.timeout_secs));
    let generator = Generator::new(config, catalog)?;

    let t_start = Instant::now();
    // 单图/单块失败已在流水线内局部化, 不影响退出码
    let stats = generator.run(&detector)?;

    println!(
        "✅ 完成: 处理 {} 张, 产出标注 {} 张, 零幸存 {} 张",
        stats.processed, stats.labeled, stats.empty
    );
    if stats.skipped_resume > 0 {
        println!("⏭️  续跑跳过 {} 张", stats.skipped_resume);
    }
    if stats.skipped_decode > 0 {
        println!("⚠️  解码失败跳过 {} 张", stats.skipped_decode);
    }
    if stats.failed_chunks > 0 {
        println!("⚠️  检测块失败 {} 次 (按零检测处理)", stats.failed_chunks);
    }
    if stats.write_errors > 0 {
        println!("❌ 写出失败 {} 张", stats.write_errors);
    }
    println!("⏱️  耗时 {:.1?}", t_start.elapsed());

    Ok(())
}
