//! 句子处理上下文
//!
//! 封装"我正在处理第几批、哪个页面的第几句"这一信息

use std::fmt::Display;

/// 句子处理上下文
#[derive(Debug, Clone)]
pub struct SentenceCtx {
    /// 页面名称（也是缓存键的一部分）
    pub page_name: String,

    /// 批次编号（从1开始，仅用于日志显示）
    pub batch_index: usize,

    /// 句子在页面中的索引（从1开始）
    pub sentence_index: usize,
}

impl SentenceCtx {
    /// 创建新的句子上下文
    pub fn new(page_name: impl Into<String>, batch_index: usize, sentence_index: usize) -> Self {
        Self {
            page_name: page_name.into(),
            batch_index,
            sentence_index,
        }
    }
}

impl Display for SentenceCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[批次 {} 页面 {} 句子#{}]",
            self.batch_index, self.page_name, self.sentence_index
        )
    }
}
