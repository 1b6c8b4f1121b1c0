//! 句子清洗与校验 - 业务能力层
//!
//! 只负责"这句话能不能送去检测"，不关心流程

use regex::Regex;

use crate::config::ValidationConfig;
use crate::error::{AppError, AppResult};

const CONTROL_CHARACTERS: &str = r"[\x00-\x1F\x7F-\x9F]";
const DISALLOWED_SYMBOLS: &str = r"[^\p{L}\p{N}\p{P}\s]";

/// 句子校验器
///
/// 清洗规则：
/// - 删除控制字符
/// - 只保留字母、数字、标点和空白
/// - 去掉首尾空白
///
/// 校验规则：长度（按字符计）在 `[min, max]` 内，且匹配 `allowed_characters`
#[derive(Debug, Clone)]
pub struct SentenceValidator {
    control_characters: Regex,
    disallowed_symbols: Regex,
    allowed_characters: Regex,
    min_length: usize,
    max_length: usize,
}

impl SentenceValidator {
    pub fn new(config: &ValidationConfig) -> AppResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                AppError::Config(format!("无法编译正则表达式 {}: {}", pattern, e))
            })
        };

        Ok(Self {
            control_characters: compile(CONTROL_CHARACTERS)?,
            disallowed_symbols: compile(DISALLOWED_SYMBOLS)?,
            allowed_characters: compile(&config.allowed_characters)?,
            min_length: config.min_sentence_length,
            max_length: config.max_sentence_length,
        })
    }

    /// 清洗输入，结果对再次清洗保持不变
    pub fn sanitize(&self, input: &str) -> String {
        let without_control = self.control_characters.replace_all(input, "");
        let kept = self.disallowed_symbols.replace_all(&without_control, "");
        kept.trim().to_string()
    }

    /// 校验清洗后的句子
    pub fn validate(&self, sentence: &str) -> AppResult<()> {
        let length = sentence.chars().count();

        if length > self.max_length {
            return Err(AppError::Validation(format!(
                "句子长度 {} 超过上限 {}",
                length, self.max_length
            )));
        }

        if length < self.min_length {
            return Err(AppError::Validation(format!(
                "句子长度 {} 低于下限 {}",
                length, self.min_length
            )));
        }

        if !self.allowed_characters.is_match(sentence) {
            return Err(AppError::Validation("句子包含不允许的字符".to_string()));
        }

        Ok(())
    }

    /// 清洗并校验，返回 (清洗后的句子, 校验结果)
    ///
    /// 校验失败时仍然返回清洗后的句子，用于生成错误结果
    pub fn prepare(&self, raw: &str) -> (String, AppResult<()>) {
        let sentence = self.sanitize(raw);
        let verdict = self.validate(&sentence);
        (sentence, verdict)
    }
}
