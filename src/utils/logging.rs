/// 日志工具模块
///
/// 提供批次、统计信息的格式化输出；统一经过 `ProgressMonitor::log`，
/// 以便遵守配置的日志级别并与进度条协调
use crate::config::{Config, LogLevel};
use crate::services::{MetricsSummary, ProgressMonitor};

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    tracing::info!("{}", "=".repeat(60));
    tracing::info!("🚀 程序启动 - 批量语言检测模式");
    tracing::info!("📊 每批页面数: {}", config.batch_size);
    tracing::info!(
        "🚦 限流: {} 次 / {} ms，重试: {} 次",
        config.rate_limits.max_requests,
        config.rate_limits.time_window,
        config.retry.attempts
    );
    tracing::info!("🤖 模型: {}", config.llm.model_name);
    tracing::info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号
/// - `total_batches`: 批次总数
/// - `start`: 起始页面编号
/// - `end`: 结束页面编号
/// - `total`: 页面总数
pub fn log_batch_start(
    monitor: &ProgressMonitor,
    batch_num: usize,
    total_batches: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    monitor.log(
        LogLevel::Info,
        &format!(
            "📦 开始处理第 {}/{} 批，本批页面: {}-{} / 共 {} 个",
            batch_num, total_batches, start, end, total
        ),
    );
}

/// 记录批次完成信息
pub fn log_batch_complete(monitor: &ProgressMonitor, batch_num: usize, success: usize, total: usize) {
    monitor.log(
        LogLevel::Info,
        &format!("✓ 第 {} 批完成: 成功 {}/{}", batch_num, success, total),
    );
}

/// 记录累计进度
///
/// # 参数
/// - `completed`: 已完成的句子数
/// - `total`: 句子总数
/// - `cached`: 当前缓存条目数
pub fn log_progress(monitor: &ProgressMonitor, completed: usize, total: usize, cached: usize) {
    let summary = monitor.snapshot();
    monitor.log(
        LogLevel::Info,
        &format!(
            "📈 累计完成 {}/{} 句，失败 {}，缓存条目 {}",
            completed, total, summary.failed_requests, cached
        ),
    );
}

/// 打印最终统计信息
pub fn print_final_stats(monitor: &ProgressMonitor, summary: &MetricsSummary) {
    let percent = |rate: Option<f64>| match rate {
        Some(r) => format!("{:.1}%", r),
        None => "N/A".to_string(),
    };

    let lines = [
        "=".repeat(60),
        "📊 全部处理完成统计".to_string(),
        format!(
            "完成时间: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ),
        format!("⏱️ 耗时: {} ms", summary.duration.unwrap_or_default()),
        format!(
            "✅ 成功: {}/{} ({})",
            summary.successful_requests,
            summary.total_requests,
            percent(summary.success_rate)
        ),
        format!("❌ 失败: {}", summary.failed_requests),
        format!(
            "⚡ 缓存命中: {} / 未命中: {} ({})",
            summary.cache_hits,
            summary.cache_misses,
            percent(summary.cache_hit_rate)
        ),
        format!("📈 平均响应时间: {:.1} ms", summary.average_response_time),
        "=".repeat(60),
    ];

    for line in lines {
        monitor.log(LogLevel::Info, &line);
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
