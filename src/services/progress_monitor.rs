//! 进度监控 - 业务能力层
//!
//! 负责统计请求指标、驱动进度条、按阈值过滤日志

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{LogLevel, MonitoringConfig};

/// 运行中的原始计数
#[derive(Debug, Default, Clone)]
struct Metrics {
    start_time: Option<DateTime<Local>>,
    end_time: Option<DateTime<Local>>,
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    cache_hits: u64,
    cache_misses: u64,
    total_response_time: Duration,
}

/// 指标汇总（只读）
///
/// `success_rate` / `cache_hit_rate` 为百分比，没有任何请求时为 `None`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub start_time: Option<DateTime<Local>>,
    pub end_time: Option<DateTime<Local>>,
    /// 运行耗时（毫秒）
    pub duration: Option<i64>,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// 未命中缓存请求的累计耗时（毫秒）
    pub total_response_time: f64,
    /// 未命中缓存请求的平均耗时（毫秒）
    pub average_response_time: f64,
    pub success_rate: Option<f64>,
    pub cache_hit_rate: Option<f64>,
}

impl From<&Metrics> for MetricsSummary {
    fn from(m: &Metrics) -> Self {
        let percent = |part: u64| {
            (m.total_requests > 0).then(|| part as f64 / m.total_requests as f64 * 100.0)
        };
        let duration = match (m.start_time, m.end_time) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        };

        Self {
            start_time: m.start_time,
            end_time: m.end_time,
            duration,
            total_requests: m.total_requests,
            successful_requests: m.successful_requests,
            failed_requests: m.failed_requests,
            cache_hits: m.cache_hits,
            cache_misses: m.cache_misses,
            total_response_time: as_millis_f64(m.total_response_time),
            average_response_time: average_millis(m.total_response_time, m.cache_misses),
            success_rate: percent(m.successful_requests),
            cache_hit_rate: percent(m.cache_hits),
        }
    }
}

fn as_millis_f64(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

fn average_millis(total: Duration, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        as_millis_f64(total) / count as f64
    }
}

/// 进度监控器
///
/// 一次运行一个实例，由编排层持有
pub struct ProgressMonitor {
    metrics: Mutex<Metrics>,
    progress_bar: Mutex<Option<ProgressBar>>,
    enable_progress_bar: bool,
    log_level: LogLevel,
}

impl ProgressMonitor {
    pub fn new(config: &MonitoringConfig) -> Self {
        Self {
            metrics: Mutex::new(Metrics::default()),
            progress_bar: Mutex::new(None),
            enable_progress_bar: config.enable_progress_bar,
            log_level: config.log_level,
        }
    }

    fn metrics(&self) -> MutexGuard<'_, Metrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bar(&self) -> Option<ProgressBar> {
        self.progress_bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 开始计时并显示进度条
    pub fn start_process(&self, total: usize) {
        self.metrics().start_time = Some(Local::now());

        if self.enable_progress_bar {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            *self.progress_bar.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
        }
    }

    /// 更新已完成的句子数
    pub fn update_progress(&self, completed: usize) {
        if let Some(pb) = self.bar() {
            pb.set_position(completed as u64);
        }
    }

    /// 记录一次请求
    ///
    /// 命中缓存的请求不计入平均耗时
    pub fn record_request(&self, success: bool, response_time: Duration, cached: bool) {
        let mut m = self.metrics();
        m.total_requests += 1;
        if success {
            m.successful_requests += 1;
        } else {
            m.failed_requests += 1;
        }

        if cached {
            m.cache_hits += 1;
        } else {
            m.cache_misses += 1;
            m.total_response_time += response_time;
        }
    }

    /// 结束计时，关闭进度条，返回最终指标
    pub fn end_process(&self) -> MetricsSummary {
        let summary = {
            let mut m = self.metrics();
            m.end_time = Some(Local::now());
            MetricsSummary::from(&*m)
        };

        if let Some(pb) = self
            .progress_bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish();
        }

        summary
    }

    /// 当前指标快照
    pub fn snapshot(&self) -> MetricsSummary {
        MetricsSummary::from(&*self.metrics())
    }

    /// 是否会输出该级别的日志
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.log_level
    }

    /// 按阈值输出日志；进度条显示期间先挂起进度条，避免输出错位
    pub fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }

        let emit = || match level {
            LogLevel::Debug => debug!("{}", message),
            LogLevel::Info => info!("{}", message),
            LogLevel::Warn => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
        };

        match self.bar() {
            Some(pb) => pb.suspend(emit),
            None => emit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> ProgressMonitor {
        ProgressMonitor::new(&MonitoringConfig {
            enable_progress_bar: false,
            log_level: LogLevel::Warn,
        })
    }

    #[test]
    fn test_cached_requests_do_not_affect_latency() {
        let m = monitor();
        m.start_process(3);
        m.record_request(true, Duration::from_millis(100), false);
        m.record_request(true, Duration::from_millis(300), false);
        m.record_request(true, Duration::ZERO, true);

        let s = m.end_process();
        assert_eq!(s.total_requests, 3);
        assert_eq!(s.cache_hits, 1);
        assert_eq!(s.cache_misses, 2);
        assert_eq!(s.total_response_time, 400.0);
        assert_eq!(s.average_response_time, 200.0);
    }

    #[test]
    fn test_average_uses_full_miss_count() {
        assert_eq!(average_millis(Duration::ZERO, 0), 0.0);
        assert_eq!(average_millis(Duration::from_millis(500), 4), 125.0);

        // 超过 u32::MAX 次未命中时不能截断计数
        let misses = u64::from(u32::MAX) + 1;
        let total = Duration::from_millis(misses);
        assert_eq!(average_millis(total, misses), 1.0);
    }

    #[test]
    fn test_rates() {
        let m = monitor();
        m.start_process(4);
        m.record_request(true, Duration::from_millis(10), false);
        m.record_request(false, Duration::from_millis(10), false);
        m.record_request(true, Duration::ZERO, true);
        m.record_request(true, Duration::ZERO, true);

        let s = m.end_process();
        assert_eq!(s.successful_requests, 3);
        assert_eq!(s.failed_requests, 1);
        assert_eq!(s.success_rate, Some(75.0));
        assert_eq!(s.cache_hit_rate, Some(50.0));
        assert!(s.end_time.is_some());
        assert!(s.duration.unwrap() >= 0);
    }

    #[test]
    fn test_rates_absent_without_requests() {
        let m = monitor();
        m.start_process(0);
        let s = m.end_process();
        assert_eq!(s.total_requests, 0);
        assert_eq!(s.success_rate, None);
        assert_eq!(s.cache_hit_rate, None);
    }

    #[test]
    fn test_log_threshold() {
        let m = monitor();
        assert!(!m.enabled(LogLevel::Debug));
        assert!(!m.enabled(LogLevel::Info));
        assert!(m.enabled(LogLevel::Warn));
        assert!(m.enabled(LogLevel::Error));
    }

    #[test]
    fn test_progress_bar_lifecycle() {
        let m = ProgressMonitor::new(&MonitoringConfig {
            enable_progress_bar: true,
            log_level: LogLevel::Error,
        });
        m.start_process(2);
        m.update_progress(1);
        assert_eq!(m.bar().map(|pb| pb.position()), Some(1));
        m.log(LogLevel::Error, "进度条期间输出");
        m.end_process();
        assert!(m.bar().is_none());
    }
}
