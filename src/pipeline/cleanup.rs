//! 文本清理遍 (Cleanup Pass)
//!
//! 独立于几何逻辑, 对已落盘的标签文件做逐行去重: 去掉空行, 行按
//! 不透明字符串比较, 保留首次出现顺序. 只有真正移除了重复行的文件
//! 才被改写. 这一遍不做任何IoU抑制.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// 去掉空行并按首次出现顺序去重
fn dedup_lines(text: &str) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !seen.contains(&line) {
            seen.push(line);
        }
    }
    seen
}

/// 清理单个标签文件, 返回是否改写
pub fn clean_label_file(path: &Path) -> Result<bool> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return Ok(false);
    }

    let uniq = dedup_lines(&text);
    if uniq == lines {
        return Ok(false);
    }

    fs::write(path, uniq.join("\n"))
        .with_context(|| format!("failed to rewrite {}", path.display()))?;
    Ok(true)
}

/// 清理标签目录下全部 `*.txt`, 返回改写的文件数
pub fn clean_labels_dir(labels_dir: &Path) -> Result<usize> {
    let mut updated = 0;
    let entries = fs::read_dir(labels_dir)
        .with_context(|| format!("failed to read labels dir {}", labels_dir.display()))?;

    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().map(|e| e == "txt").unwrap_or(false))
        .collect();
    paths.sort();

    for path in paths {
        if clean_label_file(&path)? {
            updated += 1;
        }
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("ovd-labelgen-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_duplicates_removed_in_first_occurrence_order() {
        let dir = temp_dir("clean-dup");
        let file = dir.join("x.txt");
        fs::write(&file, "A\nB\nA\nC").unwrap();

        let updated = clean_labels_dir(&dir).unwrap();
        assert_eq!(updated, 1);
        assert_eq!(fs::read_to_string(&file).unwrap(), "A\nB\nC");
    }

    #[test]
    fn test_file_without_duplicates_left_untouched() {
        let dir = temp_dir("clean-nodup");
        let file = dir.join("x.txt");
        fs::write(&file, "A\nB\nC").unwrap();

        let updated = clean_labels_dir(&dir).unwrap();
        assert_eq!(updated, 0);
        assert_eq!(fs::read_to_string(&file).unwrap(), "A\nB\nC");
    }

    #[test]
    fn test_blank_lines_trigger_rewrite_only_with_duplicates() {
        let dir = temp_dir("clean-blank");
        let file = dir.join("x.txt");
        // 空行被剔除, 但无重复 ⇒ 不算改写
        fs::write(&file, "A\n\nB").unwrap();

        let updated = clean_labels_dir(&dir).unwrap();
        assert_eq!(updated, 0);
    }

    #[test]
    fn test_empty_file_is_skipped() {
        let dir = temp_dir("clean-empty");
        let file = dir.join("x.txt");
        fs::write(&file, "\n\n").unwrap();

        let updated = clean_labels_dir(&dir).unwrap();
        assert_eq!(updated, 0);
        // 内容不变
        assert_eq!(fs::read_to_string(&file).unwrap(), "\n\n");
    }

    #[test]
    fn test_non_txt_files_ignored() {
        let dir = temp_dir("clean-ext");
        fs::write(dir.join("x.json"), "A\nA").unwrap();
        let updated = clean_labels_dir(&dir).unwrap();
        assert_eq!(updated, 0);
    }
}
