//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 读取页面文本（Vec<SentenceGroup>）
//! - 输出全局统计信息和输出文件路径
//!
//! ### `batch_processor` - 批量处理器
//! - 按 batchSize 切分页面，批次之间串行
//! - 批内页面、页面内句子并发
//! - 创建并复用 SentenceFlow
//! - 按每种格式保存结果
//!
//! ## 层次关系
//!
//! ```text
//! app (加载输入、统计输出)
//!     ↓
//! batch_processor (处理 Vec<SentenceGroup>)
//!     ↓
//! workflow::SentenceFlow (处理单个句子)
//!     ↓
//! services (能力层：validation / llm / monitor / results)
//!     ↓
//! infrastructure (基础设施：限流、重试、缓存)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：app 管生命周期，batch_processor 管批量
//! 2. **资源隔离**：限流器、缓存、监控器只在一次运行内共享
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod app;
pub mod batch_processor;

// 重新导出主要类型
pub use app::App;
pub use batch_processor::{BatchOrchestrator, BatchReport, RunState, SavedArtifact};
