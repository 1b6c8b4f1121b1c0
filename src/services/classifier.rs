//! 语言分类能力的抽象
//!
//! 编排层只依赖这个 trait，生产环境使用 `LlmService`，测试中可以注入桩实现

use std::future::Future;

use anyhow::Result;

/// 单句语言分类
///
/// 远程、可能失败、受限流约束；返回检测到的语言标签
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> impl Future<Output = Result<String>> + Send;
}
