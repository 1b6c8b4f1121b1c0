use crate::error::{AppError, AppResult};
use crate::models::record::SentenceGroup;
use std::path::Path;
use tokio::fs;

/// 从爬虫输出的 JSON 文件加载页面文本
///
/// 文件格式：`[{"pageName": "...", "content": ["...", ...]}, ...]`
///
/// 文件不存在、无法读取或结构不合法都属于致命输入错误
pub async fn load_page_texts(json_file_path: &Path) -> AppResult<Vec<SentenceGroup>> {
    let path_str = json_file_path.display().to_string();

    let content = fs::read_to_string(json_file_path)
        .await
        .map_err(|e| AppError::input(&path_str, format!("无法读取文件: {}", e)))?;

    let groups = parse_page_texts(&content).map_err(|e| match e {
        AppError::Input { message, .. } => AppError::input(&path_str, message),
        other => other,
    })?;

    let total: usize = groups.iter().map(SentenceGroup::len).sum();
    tracing::info!(
        "✓ 已加载 {}: {} 个页面, {} 个句子",
        path_str,
        groups.len(),
        total
    );

    Ok(groups)
}

/// 解析页面文本 JSON
pub fn parse_page_texts(content: &str) -> AppResult<Vec<SentenceGroup>> {
    let groups: Vec<SentenceGroup> = serde_json::from_str(content)
        .map_err(|e| AppError::input("<memory>", format!("JSON 结构不合法: {}", e)))?;

    if let Some(index) = groups.iter().position(|g| g.page_name.trim().is_empty()) {
        return Err(AppError::input(
            "<memory>",
            format!("第 {} 个页面缺少 pageName", index + 1),
        ));
    }

    Ok(groups)
}
