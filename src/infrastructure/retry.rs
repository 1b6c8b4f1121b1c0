//! 重试执行器 - 基础设施层
//!
//! 固定次数 + 确定性指数退避（无抖动）

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::config::RetryConfig;

/// 重试观察者：在每次等待前调用，参数为 (错误, 已失败的尝试序号)
pub type RetryObserver<'a, E> = &'a (dyn Fn(&E, u32) + Send + Sync);

/// 重试参数
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOptions {
    /// 总尝试次数（第一次也算）
    pub retries: u32,
    /// 基础退避时间
    pub delay: Duration,
    /// 退避倍数
    pub backoff: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryOptions {
    pub fn new(retries: u32, delay: Duration, backoff: f64) -> Self {
        Self {
            retries,
            delay,
            backoff,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.attempts,
            Duration::from_millis(config.initial_delay),
            config.backoff_factor,
        )
    }

    /// 第 `attempt` 次失败后的等待时间：`delay * backoff^(attempt-1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.delay.as_secs_f64() * self.backoff.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// 带重试地执行异步操作
///
/// 恰好尝试 `options.retries` 次（至少 1 次）；全部失败时返回最后一次的错误，
/// 不会吞掉错误
pub async fn with_retry<T, E, F, Fut>(
    mut operation: F,
    options: &RetryOptions,
    on_retry: Option<RetryObserver<'_, E>>,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = options.retries.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= attempts => return Err(err),
            Err(err) => {
                if let Some(observer) = on_retry {
                    observer(&err, attempt);
                }
                sleep(options.delay_for(attempt)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;
    use tokio_test::{assert_err, assert_ok};

    fn options(retries: u32) -> RetryOptions {
        RetryOptions::new(retries, Duration::from_millis(100), 2.0)
    }

    #[test]
    fn test_delay_is_exponential() {
        let opts = options(5);
        assert_eq!(opts.delay_for(1), Duration::from_millis(100));
        assert_eq!(opts.delay_for(2), Duration::from_millis(200));
        assert_eq!(opts.delay_for(3), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_k_failures() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let observed = Mutex::new(Vec::new());
        let observer = |_: &String, attempt: u32| observed.lock().unwrap().push(attempt);

        let start = Instant::now();
        let result = with_retry(
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= 2 {
                    Err(format!("failure {}", n))
                } else {
                    Ok("english")
                }
            },
            &options(3),
            Some(&observer),
        )
        .await;

        assert_eq!(assert_ok!(result), "english");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*observed.lock().unwrap(), vec![1, 2]);
        // 100ms + 200ms
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_makes_exact_attempts() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let observed = AtomicU32::new(0);
        let observer = |_: &String, _: u32| {
            observed.fetch_add(1, Ordering::SeqCst);
        };

        let result: Result<(), String> = with_retry(
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("failure {}", n))
            },
            &options(4),
            Some(&observer),
        )
        .await;

        assert_eq!(assert_err!(result), "failure 4");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(observed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_still_attempts_once() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<u8, &str> = with_retry(
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("nope")
            },
            &options(0),
            None,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
