//! 应用入口 - 编排层
//!
//! 管理应用生命周期：初始化日志与 LLM 服务、加载输入、运行批量处理、输出统计

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::load_page_texts;
use crate::orchestrator::batch_processor::{BatchOrchestrator, BatchReport};
use crate::services::LlmService;
use crate::utils::logging::{log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    orchestrator: BatchOrchestrator<LlmService>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        if config.llm.api_key.is_empty() {
            warn!("⚠️ 未配置 LLM_API_KEY，远程调用可能会失败");
        }

        let llm = LlmService::new(&config.llm);
        let orchestrator =
            BatchOrchestrator::new(&config, llm).context("创建批量处理器失败")?;

        if config.clean_output_dir {
            orchestrator
                .results_manager()
                .clear_output_dir()
                .await
                .context("清理输出目录失败")?;
        }

        Ok(Self {
            config,
            orchestrator,
        })
    }

    /// 运行应用主逻辑
    ///
    /// # 返回
    /// 没有任何输入时返回 `None`
    pub async fn run(&self) -> Result<Option<BatchReport>> {
        info!("\n📁 正在读取页面文本: {}", self.config.input_path);
        let groups = load_page_texts(Path::new(&self.config.input_path))
            .await
            .with_context(|| format!("读取输入文件失败: {}", self.config.input_path))?;

        if groups.is_empty() {
            warn!("⚠️ 没有找到待处理的页面，程序结束");
            return Ok(None);
        }

        let report = self
            .orchestrator
            .process_all(&groups)
            .await
            .context("批量处理失败")?;

        debug!("运行状态: {:?}", self.orchestrator.state());
        print_final_stats(self.orchestrator.monitor(), &report.metrics);
        for path in report.saved_paths() {
            info!("📄 输出文件: {}", path.display());
        }

        Ok(Some(report))
    }
}
