//! 滑动窗口限流器 - 基础设施层
//!
//! 持有"最近一个窗口内的请求时间戳"，只暴露 throttle() 能力

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::RateLimitConfig;

/// 滑动窗口限流器
///
/// 职责：
/// - 保证任意长度为 `time_window` 的滚动窗口内放行数不超过 `max_requests`
/// - 等待者按 FIFO 顺序放行
/// - 不关心被放行的是什么请求
pub struct RateLimiter {
    max_requests: usize,
    time_window: Duration,
    requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// 创建新的限流器，`max_requests` 最小为 1
    pub fn new(max_requests: usize, time_window: Duration) -> Self {
        let max_requests = max_requests.max(1);
        Self {
            max_requests,
            time_window,
            requests: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_millis(config.time_window))
    }

    /// 等待直到可以再放行一个请求，然后记录本次放行
    ///
    /// 等待期间持有锁，后来的调用者排队，保证 FIFO
    pub async fn throttle(&self) {
        let mut requests = self.requests.lock().await;

        loop {
            let now = Instant::now();

            // 懒清理：丢弃已经滑出窗口的时间戳
            while let Some(&oldest) = requests.front() {
                if now.duration_since(oldest) >= self.time_window {
                    requests.pop_front();
                } else {
                    break;
                }
            }

            if requests.len() < self.max_requests {
                requests.push_back(now);
                return;
            }

            let Some(&oldest) = requests.front() else {
                continue;
            };
            let wait = self.time_window.saturating_sub(now.duration_since(oldest));
            debug!(
                "⏳ 已达到限流上限 ({}/{:?})，等待 {:?}",
                self.max_requests, self.time_window, wait
            );
            sleep(wait).await;
        }
    }

    /// 当前窗口内记录的请求数（不做清理）
    #[cfg(test)]
    pub(crate) async fn recorded(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;

    #[tokio::test(start_paused = true)]
    async fn test_admits_up_to_limit_without_waiting() {
        let limiter = RateLimiter::new(3, Duration::from_millis(1000));
        let start = Instant::now();

        for _ in 0..3 {
            limiter.throttle().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.recorded().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fourth_request_waits_for_window() {
        let limiter = RateLimiter::new(3, Duration::from_millis(1000));
        let start = Instant::now();

        for _ in 0..4 {
            limiter.throttle().await;
        }

        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rolling_window_never_exceeds_limit() {
        let max_requests = 3;
        let window = Duration::from_millis(500);
        let limiter = RateLimiter::new(max_requests, window);

        let admissions = join_all((0..20).map(|_| async {
            limiter.throttle().await;
            Instant::now()
        }))
        .await;

        let mut admissions = admissions;
        admissions.sort();
        for pair in admissions.windows(max_requests + 1) {
            let span = pair[max_requests].duration_since(pair[0]);
            assert!(
                span >= window,
                "{} 次放行落在 {:?} 内",
                max_requests + 1,
                span
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_max_requests_is_clamped() {
        let limiter = RateLimiter::new(0, Duration::from_millis(100));
        assert_eq!(limiter.max_requests, 1);
        limiter.throttle().await;
        limiter.throttle().await;
        assert_eq!(limiter.recorded().await, 1);
    }
}
