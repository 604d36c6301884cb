//! 提示词目录 (Prompt Catalog)
//!
//! 从文本文件加载标签词表: 每行一个标签, 空行与 `#` 开头的行忽略,
//! 加载顺序决定全局索引.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// 单个提示词: 文本 + 全局索引 (按加载顺序, 从0开始)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub index: usize,
}

/// 标签词表
///
/// 有序列表与 text→index 查找表是两个视图: 同一文本出现多次时,
/// 查找表按 last-write-wins 解析到最后一次出现的索引, 而有序列表
/// (以及写出的 classes.txt) 保留包括重复在内的每一条. 两个视图对
/// 重复文本会产生分歧, 这是既定契约.
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    prompts: Vec<Prompt>,
    name_to_id: HashMap<String, usize>,
}

impl PromptCatalog {
    /// 从文本文件加载. 文件不可读是配置错误; 可读但为空得到零长度目录.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read prompt file {}", path.display()))?;
        Ok(Self::from_lines(text.lines()))
    }

    pub fn from_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Self {
        let mut prompts = Vec::new();
        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            prompts.push(Prompt {
                text: line.to_string(),
                index: prompts.len(),
            });
        }

        // 重复文本解析到最后一次出现 (显式 last-write-wins)
        let mut name_to_id = HashMap::new();
        for p in &prompts {
            name_to_id.insert(p.text.clone(), p.index);
        }

        Self {
            prompts,
            name_to_id,
        }
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Prompt> {
        self.prompts.get(index)
    }

    pub fn id_of(&self, text: &str) -> Option<usize> {
        self.name_to_id.get(text).copied()
    }

    /// 按目录顺序切分为每块至多 `chunk_size` 个提示词的连续块,
    /// 返回 (块起始全局索引, 块内文本).
    pub fn chunks(&self, chunk_size: usize) -> impl Iterator<Item = (usize, Vec<String>)> + '_ {
        let chunk_size = chunk_size.max(1);
        self.prompts
            .chunks(chunk_size)
            .map(move |chunk| match chunk.first() {
                Some(first) => (
                    first.index,
                    chunk.iter().map(|p| p.text.clone()).collect(),
                ),
                None => (0, Vec::new()),
            })
    }

    /// 全局索引经文本回查得到规范索引.
    ///
    /// 重复文本会被重映射到最后一次出现的索引; 越界返回 None.
    pub fn canonical_id(&self, index: usize) -> Option<usize> {
        let prompt = self.prompts.get(index)?;
        self.id_of(&prompt.text)
    }

    /// 有序标签清单 (含重复项), 换行连接, 无结尾空行
    pub fn classes_listing(&self) -> String {
        self.prompts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 写出 classes.txt
    pub fn write_classes(&self, path: &Path) -> Result<()> {
        fs::write(path, self.classes_listing())
            .with_context(|| format!("failed to write {}", path.display()))
    }
}
