//! 结果缓存 - 基础设施层
//!
//! 进程内的 (页面, 句子) → 语言 映射，无过期、无容量上限。
//! 同一个键同时只会有一次检测在进行，其余调用等待它的结果

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OnceCell;

/// 缓存键：`页面名:句子`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub const SEPARATOR: char = ':';

    /// 直接拼接，不做额外的规范化
    pub fn new(page_name: &str, sentence: &str) -> Self {
        let mut key = String::with_capacity(page_name.len() + sentence.len() + 1);
        key.push_str(page_name);
        key.push(Self::SEPARATOR);
        key.push_str(sentence);
        Self(key)
    }
}

/// 一次查询的来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// 已有结果，或等到了另一个调用的检测结果
    Hit(String),
    /// 由本次调用完成检测并写入缓存
    Detected(String),
}

type Slot = Arc<OnceCell<String>>;

/// 检测结果缓存
///
/// 检测失败不会写入，下一个调用会重新检测
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<CacheKey, Slot>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: CacheKey) -> Slot {
        self.entries().entry(key).or_default().clone()
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        self.entries().get(key).and_then(|slot| slot.get().cloned())
    }

    /// 查缓存，未命中时执行 `detect` 并写入结果
    ///
    /// 同一个键的并发调用只有一个会执行 `detect`，其余等待并得到 `Lookup::Hit`；
    /// `detect` 失败时错误只返回给执行它的调用，等待者接着自己检测
    pub async fn get_or_detect<F, Fut, E>(&self, key: CacheKey, detect: F) -> Result<Lookup, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let slot = self.slot(key);
        if let Some(language) = slot.get() {
            return Ok(Lookup::Hit(language.clone()));
        }

        let detected = AtomicBool::new(false);
        let language = slot
            .get_or_try_init(|| {
                detected.store(true, Ordering::SeqCst);
                detect()
            })
            .await?
            .clone();

        if detected.load(Ordering::SeqCst) {
            Ok(Lookup::Detected(language))
        } else {
            Ok(Lookup::Hit(language))
        }
    }

    pub fn len(&self) -> usize {
        self.entries()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
