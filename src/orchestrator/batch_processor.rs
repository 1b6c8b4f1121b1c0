//! 批量处理器 - 编排层
//!
//! ## 职责
//!
//! 把所有页面切成固定大小的批次，逐批调度句子流程，最后统一输出结果。
//!
//! ## 核心功能
//!
//! 1. **分批处理**：批次之间串行，每批完成后再开始下一批
//! 2. **批内并发**：同一批内的页面、同一页面内的句子并发执行（`join_all`）
//! 3. **顺序保证**：结果顺序与输入顺序一致
//! 4. **结果输出**：按配置的每种格式分别保存，单个格式失败不影响其它格式
//!
//! ## 设计特点
//!
//! - **一次性**：一个实例只负责一次运行（Idle → Running → Completed / Failed）
//! - **向下委托**：单句的校验、缓存、限流、重试全部交给 `SentenceFlow`

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use futures::future::join_all;
use tracing::{error, info};

use crate::config::{Config, LogLevel};
use crate::error::{AppError, AppResult};
use crate::models::{ClassificationRecord, OutputFormat, SentenceGroup};
use crate::services::{Classifier, MetricsSummary, ProgressMonitor, ResultsManager};
use crate::utils::logging::{log_batch_complete, log_batch_start, log_progress};
use crate::workflow::{SentenceCtx, SentenceFlow};

/// 一次运行的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// 单个输出格式的保存结果
#[derive(Debug)]
pub struct SavedArtifact {
    pub format: OutputFormat,
    pub result: AppResult<PathBuf>,
}

impl SavedArtifact {
    pub fn path(&self) -> Option<&PathBuf> {
        self.result.as_ref().ok()
    }
}

/// 一次运行的汇总
#[derive(Debug)]
pub struct BatchReport {
    /// 与输入顺序一致的全部结果
    pub records: Vec<ClassificationRecord>,
    pub metrics: MetricsSummary,
    pub artifacts: Vec<SavedArtifact>,
}

impl BatchReport {
    /// 成功写出的文件
    pub fn saved_paths(&self) -> Vec<&PathBuf> {
        self.artifacts.iter().filter_map(SavedArtifact::path).collect()
    }
}

/// 批量处理器
pub struct BatchOrchestrator<C: Classifier> {
    flow: SentenceFlow<C>,
    results_manager: ResultsManager,
    batch_size: usize,
    output_formats: Vec<OutputFormat>,
    state: Mutex<RunState>,
}

impl<C: Classifier> BatchOrchestrator<C> {
    /// 根据配置创建处理器
    pub fn new(config: &Config, classifier: C) -> AppResult<Self> {
        config.validate()?;

        Ok(Self {
            flow: SentenceFlow::new(config, classifier)?,
            results_manager: ResultsManager::from_config(config)?,
            batch_size: config.batch_size.max(1),
            output_formats: config.output_formats.clone(),
            state: Mutex::new(RunState::Idle),
        })
    }

    pub fn monitor(&self) -> &ProgressMonitor {
        self.flow.monitor()
    }

    pub fn results_manager(&self) -> &ResultsManager {
        &self.results_manager
    }

    pub fn classifier(&self) -> &C {
        self.flow.classifier()
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// 只有 Idle 状态才能开始运行
    fn begin(&self) -> AppResult<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != RunState::Idle {
            return Err(AppError::Orchestration(format!(
                "处理器只能运行一次，当前状态: {:?}",
                *state
            )));
        }
        *state = RunState::Running;
        Ok(())
    }

    /// 处理所有页面并保存结果
    ///
    /// 单句失败只会产生错误结果；只有所有输出格式都保存失败时才返回错误
    pub async fn process_all(&self, groups: &[SentenceGroup]) -> AppResult<BatchReport> {
        self.begin()?;

        let total_sentences: usize = groups.iter().map(SentenceGroup::len).sum();
        let total_pages = groups.len();
        let total_batches = total_pages.div_ceil(self.batch_size);

        self.monitor().log(
            LogLevel::Info,
            &format!(
                "✓ 共 {} 个页面，{} 个句子，将以每批 {} 个页面的方式处理",
                total_pages, total_sentences, self.batch_size
            ),
        );
        self.monitor().start_process(total_sentences);

        let mut records = Vec::with_capacity(total_sentences);

        for (idx, batch) in groups.chunks(self.batch_size).enumerate() {
            let batch_num = idx + 1;
            let batch_start = idx * self.batch_size;

            log_batch_start(
                self.monitor(),
                batch_num,
                total_batches,
                batch_start + 1,
                batch_start + batch.len(),
                total_pages,
            );

            let batch_records = self.process_batch(batch, batch_num).await;

            let success = batch_records.iter().filter(|r| !r.is_error()).count();
            log_batch_complete(self.monitor(), batch_num, success, batch_records.len());
            log_progress(
                self.monitor(),
                self.flow.completed(),
                total_sentences,
                self.flow.cache().len(),
            );

            records.extend(batch_records);
        }

        let metrics = self.monitor().end_process();
        let artifacts = self.save_all(&records).await;

        if artifacts.iter().all(|a| a.result.is_err()) {
            self.set_state(RunState::Failed);
            return Err(AppError::Orchestration("所有输出格式均保存失败".into()));
        }

        self.set_state(RunState::Completed);
        Ok(BatchReport {
            records,
            metrics,
            artifacts,
        })
    }

    /// 处理单个批次，批内页面并发
    async fn process_batch(
        &self,
        batch: &[SentenceGroup],
        batch_num: usize,
    ) -> Vec<ClassificationRecord> {
        let pages = batch
            .iter()
            .map(|group| self.process_page(group, batch_num));

        join_all(pages).await.into_iter().flatten().collect()
    }

    /// 处理单个页面，页面内句子并发
    async fn process_page(
        &self,
        group: &SentenceGroup,
        batch_num: usize,
    ) -> Vec<ClassificationRecord> {
        let sentences = group.sentences.iter().enumerate().map(|(idx, raw)| async move {
            let ctx = SentenceCtx::new(&group.page_name, batch_num, idx + 1);
            self.flow.run(&ctx, raw).await
        });

        join_all(sentences).await
    }

    /// 逐个格式保存，互不影响
    async fn save_all(&self, records: &[ClassificationRecord]) -> Vec<SavedArtifact> {
        let mut artifacts = Vec::with_capacity(self.output_formats.len());

        for &format in &self.output_formats {
            let result = self.results_manager.save_results(records, format).await;
            match &result {
                Ok(path) => info!("💾 {} 结果已保存至: {}", format, path.display()),
                Err(e) => error!("❌ {} 结果保存失败: {}", format, e),
            }
            artifacts.push(SavedArtifact { format, result });
        }

        artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DETECTION_ERROR;
    use crate::services::results_manager::timestamped_name;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// 按句子内容返回固定语言，"fail" 开头的句子总是失败
    struct EchoClassifier {
        calls: AtomicUsize,
    }

    impl EchoClassifier {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Classifier for EchoClassifier {
        async fn classify(&self, text: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.starts_with("fail") {
                anyhow::bail!("500 Internal Server Error")
            }
            Ok(format!("lang:{}", text))
        }
    }

    fn config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.batch_size = 2;
        config.output_dir = dir.path().to_string_lossy().into_owned();
        config.output_formats = vec![OutputFormat::Json, OutputFormat::Csv];
        config.monitoring.enable_progress_bar = false;
        config.rate_limits.max_requests = 100;
        config.retry.initial_delay = 1;
        config
    }

    fn groups() -> Vec<SentenceGroup> {
        vec![
            SentenceGroup::new("A", vec!["a1".into(), "a2".into()]),
            SentenceGroup::new("B", vec!["b1".into()]),
            SentenceGroup::new("C", vec!["fail c1".into(), "c2".into()]),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_follow_input_order() {
        let dir = TempDir::new().unwrap();
        let orchestrator = BatchOrchestrator::new(&config(&dir), EchoClassifier::new()).unwrap();

        let report = orchestrator.process_all(&groups()).await.unwrap();

        let sentences: Vec<_> = report.records.iter().map(|r| r.sentence.as_str()).collect();
        assert_eq!(sentences, ["a1", "a2", "b1", "fail c1", "c2"]);
        assert_eq!(report.records[0].language, "lang:a1");
        assert_eq!(report.records[3].language, DETECTION_ERROR);
        assert_eq!(report.records[3].page_name, "C");
        assert_eq!(orchestrator.state(), RunState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics_and_artifacts() {
        let dir = TempDir::new().unwrap();
        let orchestrator = BatchOrchestrator::new(&config(&dir), EchoClassifier::new()).unwrap();

        let report = orchestrator.process_all(&groups()).await.unwrap();

        assert_eq!(report.metrics.total_requests, 5);
        assert_eq!(report.metrics.successful_requests, 4);
        assert_eq!(report.metrics.failed_requests, 1);
        assert_eq!(report.metrics.cache_misses, 5);
        // 失败句子重试 3 次
        assert_eq!(orchestrator.classifier().calls.load(Ordering::SeqCst), 7);

        assert_eq!(report.artifacts.len(), 2);
        for path in report.saved_paths() {
            assert!(path.exists());
            assert!(path.starts_with(dir.path()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_input_still_saves() {
        let dir = TempDir::new().unwrap();
        let orchestrator = BatchOrchestrator::new(&config(&dir), EchoClassifier::new()).unwrap();

        let report = orchestrator.process_all(&[]).await.unwrap();
        assert!(report.records.is_empty());
        assert_eq!(report.metrics.total_requests, 0);
        assert_eq!(report.metrics.success_rate, None);
        assert_eq!(report.saved_paths().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_orchestrator_runs_only_once() {
        let dir = TempDir::new().unwrap();
        let orchestrator = BatchOrchestrator::new(&config(&dir), EchoClassifier::new()).unwrap();

        orchestrator.process_all(&groups()).await.unwrap();
        let second = orchestrator.process_all(&groups()).await;
        assert!(matches!(second, Err(AppError::Orchestration(_))));
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    /// 在目标文件名处放一个目录，让该格式写入失败
    fn block_format(dir: &TempDir, format: OutputFormat) {
        let name = format!("{}.{}", timestamped_name(fixed_clock()), format.extension());
        std::fs::create_dir(dir.path().join(name)).unwrap();
    }

    fn with_fixed_clock(mut orchestrator: BatchOrchestrator<EchoClassifier>) -> BatchOrchestrator<EchoClassifier> {
        orchestrator.results_manager = orchestrator.results_manager.with_clock(fixed_clock);
        orchestrator
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_format_does_not_block_others() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.output_formats = vec![OutputFormat::Json, OutputFormat::Xml, OutputFormat::Csv];
        let orchestrator =
            with_fixed_clock(BatchOrchestrator::new(&config, EchoClassifier::new()).unwrap());
        block_format(&dir, OutputFormat::Xml);

        let report = orchestrator.process_all(&groups()).await.unwrap();

        let formats: Vec<_> = report.artifacts.iter().map(|a| a.format).collect();
        assert_eq!(formats, [OutputFormat::Json, OutputFormat::Xml, OutputFormat::Csv]);
        assert!(matches!(report.artifacts[1].result, Err(AppError::Io(_))));
        assert_eq!(report.saved_paths().len(), 2);
        for path in report.saved_paths() {
            assert!(path.is_file());
        }
        assert_eq!(orchestrator.state(), RunState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_formats_failing_fails_the_run() {
        let dir = TempDir::new().unwrap();
        let orchestrator =
            with_fixed_clock(BatchOrchestrator::new(&config(&dir), EchoClassifier::new()).unwrap());
        block_format(&dir, OutputFormat::Json);
        block_format(&dir, OutputFormat::Csv);

        let result = orchestrator.process_all(&groups()).await;

        assert!(matches!(result, Err(AppError::Orchestration(_))));
        assert_eq!(orchestrator.state(), RunState::Failed);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.batch_size = 0;
        assert!(matches!(
            BatchOrchestrator::new(&config, EchoClassifier::new()),
            Err(AppError::Config(_))
        ));
    }
}
