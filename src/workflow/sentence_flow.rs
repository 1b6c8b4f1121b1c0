//! 句子处理流程 - 流程层
//!
//! 核心职责：定义"一句话"的完整处理流程
//!
//! 流程顺序：
//! 1. 清洗 → 校验（失败即写入错误结果）
//! 2. 查缓存（命中即返回；同一个键正在检测时等待其结果）
//! 3. 限流放行一次 → 带重试的远程检测
//! 4. 写缓存、记录指标

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::{Config, LogLevel};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{
    with_retry, CacheKey, Lookup, RateLimiter, ResultCache, RetryOptions,
};
use crate::models::ClassificationRecord;
use crate::services::{Classifier, ProgressMonitor, SentenceValidator};
use crate::utils::logging::truncate_text;
use crate::workflow::sentence_ctx::SentenceCtx;

/// 日志中句子预览的最大长度
const PREVIEW_LEN: usize = 40;

/// 句子处理流程
///
/// - 持有一次运行内共享的限流器、缓存、监控器
/// - 单句失败只会变成错误结果，不会向上传播
pub struct SentenceFlow<C: Classifier> {
    classifier: C,
    validator: SentenceValidator,
    cache: ResultCache,
    rate_limiter: RateLimiter,
    retry: RetryOptions,
    monitor: ProgressMonitor,
    completed: AtomicUsize,
}

impl<C: Classifier> SentenceFlow<C> {
    /// 根据配置创建流程
    pub fn new(config: &Config, classifier: C) -> AppResult<Self> {
        Ok(Self {
            classifier,
            validator: SentenceValidator::new(&config.validation)?,
            cache: ResultCache::new(),
            rate_limiter: RateLimiter::from_config(&config.rate_limits),
            retry: RetryOptions::from_config(&config.retry),
            monitor: ProgressMonitor::new(&config.monitoring),
            completed: AtomicUsize::new(0),
        })
    }

    pub fn monitor(&self) -> &ProgressMonitor {
        &self.monitor
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// 已完成（无论成败）的句子数
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// 处理一句话，总是返回一条结果
    pub async fn run(&self, ctx: &SentenceCtx, raw: &str) -> ClassificationRecord {
        let start = Instant::now();

        // ========== 1. 清洗 + 校验 ==========
        let (sentence, verdict) = self.validator.prepare(raw);
        if let Err(e) = verdict {
            self.monitor.log(
                LogLevel::Error,
                &format!(
                    "{} ❌ 句子校验失败 \"{}\": {}",
                    ctx,
                    truncate_text(&sentence, PREVIEW_LEN),
                    e
                ),
            );
            self.finish(false, start.elapsed(), false);
            return ClassificationRecord::detection_error(&ctx.page_name, sentence);
        }

        // ========== 2. 查缓存 + 3. 限流重试检测 ==========
        let key = CacheKey::new(&ctx.page_name, &sentence);
        let lookup = self
            .cache
            .get_or_detect(key, || self.detect(ctx, &sentence))
            .await;

        match lookup {
            Ok(Lookup::Hit(language)) => {
                self.monitor.log(
                    LogLevel::Debug,
                    &format!("{} ⚡ 命中缓存: {}", ctx, language),
                );
                self.finish(true, Duration::ZERO, true);
                ClassificationRecord::new(&ctx.page_name, sentence, language)
            }
            Ok(Lookup::Detected(language)) => {
                self.monitor.log(
                    LogLevel::Debug,
                    &format!(
                        "{} ✓ \"{}\" → {}",
                        ctx,
                        truncate_text(&sentence, PREVIEW_LEN),
                        language
                    ),
                );
                self.finish(true, start.elapsed(), false);
                ClassificationRecord::new(&ctx.page_name, sentence, language)
            }
            Err(e) => {
                self.monitor.log(
                    LogLevel::Error,
                    &format!(
                        "{} ❌ 语言检测失败 \"{}\": {}",
                        ctx,
                        truncate_text(&sentence, PREVIEW_LEN),
                        e
                    ),
                );
                self.finish(false, start.elapsed(), false);
                ClassificationRecord::detection_error(&ctx.page_name, sentence)
            }
        }
    }

    /// 先经过限流器放行一次，再带重试地调用分类器
    async fn detect(&self, ctx: &SentenceCtx, sentence: &str) -> AppResult<String> {
        self.rate_limiter.throttle().await;

        let classifier = &self.classifier;

        let observer = |e: &anyhow::Error, attempt: u32| {
            self.monitor.log(
                LogLevel::Warn,
                &format!(
                    "{} 🔁 Retrying language detection for \"{}\" (attempt {}): {}",
                    ctx,
                    truncate_text(sentence, PREVIEW_LEN),
                    attempt,
                    e
                ),
            );
        };

        with_retry(
            move || async move { classifier.classify(sentence).await },
            &self.retry,
            Some(&observer),
        )
        .await
        .map_err(|e| AppError::Remote(format!("{:#}", e)))
    }

    fn finish(&self, success: bool, response_time: Duration, cached: bool) {
        self.monitor.record_request(success, response_time, cached);
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.monitor.update_progress(completed);
    }
}
