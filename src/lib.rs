//! # Language Detection
//!
//! 对爬虫抓取的页面文本逐句进行语言检测的批处理程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 与业务无关的通用能力
//! - `RateLimiter` - 滑动窗口限流
//! - `with_retry` - 指数退避重试
//! - `ResultCache` - 按 (页面, 句子) 缓存检测结果
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个句子或一组结果
//! - `SentenceValidator` - 清洗与校验
//! - `LlmService` - LLM 语言判断能力
//! - `ProgressMonitor` - 指标统计与进度条
//! - `ResultsManager` - JSON / XML / CSV 输出
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一句话"的完整处理流程
//! - `SentenceCtx` - 上下文封装（批次 + 页面 + 句子序号）
//! - `SentenceFlow` - 流程编排（校验 → 缓存 → 限流 → 检测）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，分批并发并输出结果
//! - `orchestrator/app` - 应用入口，加载输入并输出统计
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, LogLevel};
pub use error::{AppError, AppResult};
pub use models::{ClassificationRecord, OutputFormat, RecordField, SentenceGroup, DETECTION_ERROR};
pub use orchestrator::{App, BatchOrchestrator, BatchReport, RunState};
pub use services::{Classifier, LlmService, MetricsSummary, ResultsManager};
pub use workflow::{SentenceCtx, SentenceFlow};
