//! 统一错误类型
//!
//! 按照处理方式划分：
//! - `Validation` / `Remote`：单句级别错误，在流程层被吞掉并转换为错误结果
//! - `Input` / `Orchestration`：致命错误，直接终止本次运行
//! - `Serialization`：只影响单个输出格式，其它格式照常输出

use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 句子未通过长度或字符校验
    #[error("校验失败: {0}")]
    Validation(String),

    /// 远程分类调用失败（重试耗尽后仍失败）
    #[error("远程调用失败: {0}")]
    Remote(String),

    /// 上游输入无法读取或结构不合法
    #[error("输入错误 ({path}): {message}")]
    Input { path: String, message: String },

    /// 某个输出格式无法生成
    #[error("序列化 {format} 失败: {message}")]
    Serialization { format: String, message: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 编排流程本身出错
    #[error("编排错误: {0}")]
    Orchestration(String),

    /// 文件读写错误
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization {
            format: "json".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建输入读取错误
    pub fn input(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        AppError::Input {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// 创建序列化错误
    pub fn serialization(format: impl Into<String>, message: impl std::fmt::Display) -> Self {
        AppError::Serialization {
            format: format.into(),
            message: message.to_string(),
        }
    }

    /// 是否为致命错误（需要终止整个运行）
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Input { .. } | AppError::Orchestration(_))
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(AppError::input("data/pageTexts.json", "missing").is_fatal());
        assert!(AppError::Orchestration("boom".into()).is_fatal());
        assert!(!AppError::Validation("too long".into()).is_fatal());
        assert!(!AppError::Remote("503".into()).is_fatal());
        assert!(!AppError::serialization("xml", "bad").is_fatal());
    }

    #[test]
    fn test_display_contains_context() {
        let err = AppError::input("data/pageTexts.json", "not found");
        let msg = err.to_string();
        assert!(msg.contains("data/pageTexts.json"));
        assert!(msg.contains("not found"));
    }
}
