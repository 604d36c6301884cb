//! 运行参数 (CLI Arguments)

use clap::Parser;

/// 开放词表伪标签生成器 - 输出YOLO格式标注
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "开放词表伪标签生成器 (Open-vocabulary pseudo-label generator)", long_about = None)]
pub struct Args {
    /// 图像目录 (生成模式必需, 递归扫描)
    #[arg(long)]
    pub images: Option<String>,

    /// 提示词文件 (每行一个标签, `#` 开头为注释)
    #[arg(long, default_value = "prompts_en.txt")]
    pub prompts: String,

    /// 输出目录
    #[arg(long, default_value = "ovd-data")]
    pub out: String,

    /// 检测服务地址
    #[arg(long, default_value = "http://127.0.0.1:8008/detect")]
    pub endpoint: String,

    /// 置信度阈值
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// NMS IoU抑制阈值
    #[arg(long, default_value_t = 0.5)]
    pub iou: f32,

    /// 最小归一化面积 (低于则丢弃)
    #[arg(long, default_value_t = 0.004)]
    pub min_area: f32,

    /// 最大长宽比 (高于则丢弃)
    #[arg(long, default_value_t = 6.0)]
    pub max_aspect: f32,

    /// 每次推理的提示词块大小
    #[arg(long, default_value_t = 128)]
    pub prompt_chunk: usize,

    /// 单次检测调用超时 (秒)
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// 并行工作线程数 (逐图并行, 1为串行)
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// 跳过已有标注的图像
    #[arg(long, default_value_t = false)]
    pub resume: bool,

    /// 仅对既有输出目录运行文本清理
    #[arg(long)]
    pub clean: Option<String>,
}
