//! 日志初始化

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

/// 初始化 tracing 订阅者
///
/// 设置了 `RUST_LOG` 时以环境变量为准，否则使用配置中的日志级别；
/// 依赖库只输出 warn 及以上
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,language_detection={}", level.as_str()))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
