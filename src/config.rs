//! 程序配置
//!
//! 加载顺序：默认值 → TOML 文件（可选）→ 环境变量覆盖。
//! TOML 键名使用 camelCase，例如：
//!
//! ```toml
//! batchSize = 5
//! outputFormats = ["csv", "json", "xml"]
//!
//! [rateLimits]
//! maxRequests = 3
//! timeWindow = 1000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::OutputFormat;

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "LANGDETECT_CONFIG";
/// 未指定时尝试读取的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "settings.toml";

/// 日志级别（从低到高）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(AppError::Config(format!("未知的日志级别: {}", other))),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// 每批处理的页面数量（批次之间有同步屏障）
    pub batch_size: usize,
    pub rate_limits: RateLimitConfig,
    pub retry: RetryConfig,
    /// 需要输出的格式
    pub output_formats: Vec<OutputFormat>,
    /// 输出目录
    pub output_dir: String,
    /// 运行前是否清空输出目录
    pub clean_output_dir: bool,
    /// 爬虫产出的页面文本（JSON）
    pub input_path: String,
    pub compression: CompressionConfig,
    pub validation: ValidationConfig,
    pub monitoring: MonitoringConfig,
    pub llm: LlmConfig,
}

/// 滑动窗口限流配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitConfig {
    /// 窗口内允许的最大请求数
    pub max_requests: usize,
    /// 窗口大小（毫秒）
    pub time_window: u64,
}

/// 重试配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// 总尝试次数（包含第一次）
    pub attempts: u32,
    /// 首次退避时间（毫秒）
    pub initial_delay: u64,
    /// 退避倍数
    pub backoff_factor: f64,
}

/// 输出压缩配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressionConfig {
    pub enabled: bool,
    /// 超过该字节数才压缩
    pub threshold: usize,
}

/// 句子校验配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationConfig {
    pub max_sentence_length: usize,
    pub min_sentence_length: usize,
    /// 允许的字符（正则表达式）
    pub allowed_characters: String,
}

/// 进度与日志配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitoringConfig {
    pub enable_progress_bar: bool,
    pub log_level: LogLevel,
}

/// LLM 配置（兼容 OpenAI API 的服务）
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: 5,
            rate_limits: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            output_formats: vec![OutputFormat::Csv, OutputFormat::Json, OutputFormat::Xml],
            output_dir: "output".to_string(),
            clean_output_dir: false,
            input_path: "data/pageTexts.json".to_string(),
            compression: CompressionConfig::default(),
            validation: ValidationConfig::default(),
            monitoring: MonitoringConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 3,
            time_window: 1000,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay: 1000,
            backoff_factor: 2.0,
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 1024 * 1024,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_sentence_length: 1000,
            min_sentence_length: 1,
            allowed_characters: r"^[\p{L}\p{N}\p{P}\s]+$".to_string(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_progress_bar: true,
            log_level: LogLevel::Info,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://api.openai.com/v1".to_string(),
            model_name: "gpt-3.5-turbo".to_string(),
        }
    }
}

impl Config {
    /// 加载完整配置：默认值 → TOML 文件 → 环境变量
    pub fn load() -> AppResult<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            Err(_) => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载（缺失的键使用默认值）
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("无法读取配置文件 {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 使用外部键值来源覆盖配置，`lookup` 通常是环境变量
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
            value.and_then(|v| v.trim().parse().ok())
        }

        if let Some(v) = parse(lookup("BATCH_SIZE")) {
            self.batch_size = v;
        }
        if let Some(v) = parse(lookup("MAX_REQUESTS")) {
            self.rate_limits.max_requests = v;
        }
        if let Some(v) = parse(lookup("TIME_WINDOW_MS")) {
            self.rate_limits.time_window = v;
        }
        if let Some(v) = parse(lookup("RETRY_ATTEMPTS")) {
            self.retry.attempts = v;
        }
        if let Some(v) = parse(lookup("RETRY_INITIAL_DELAY_MS")) {
            self.retry.initial_delay = v;
        }
        if let Some(v) = parse(lookup("RETRY_BACKOFF_FACTOR")) {
            self.retry.backoff_factor = v;
        }
        if let Some(v) = lookup("OUTPUT_FORMATS") {
            let formats: Vec<OutputFormat> = v
                .split(',')
                .filter_map(|name| name.trim().parse().ok())
                .collect();
            if !formats.is_empty() {
                self.output_formats = formats;
            }
        }
        if let Some(v) = lookup("OUTPUT_DIR") {
            self.output_dir = v;
        }
        if let Some(v) = parse(lookup("CLEAN_OUTPUT_DIR")) {
            self.clean_output_dir = v;
        }
        if let Some(v) = lookup("INPUT_PATH") {
            self.input_path = v;
        }
        if let Some(v) = parse(lookup("COMPRESSION_ENABLED")) {
            self.compression.enabled = v;
        }
        if let Some(v) = parse(lookup("COMPRESSION_THRESHOLD")) {
            self.compression.threshold = v;
        }
        if let Some(v) = parse(lookup("ENABLE_PROGRESS_BAR")) {
            self.monitoring.enable_progress_bar = v;
        }
        if let Some(v) = parse(lookup("LOG_LEVEL")) {
            self.monitoring.log_level = v;
        }
        if let Some(v) = lookup("LLM_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.llm.api_key = v;
        }
        if let Some(v) = lookup("LLM_API_BASE_URL") {
            self.llm.api_base_url = v;
        }
        if let Some(v) = lookup("LLM_MODEL_NAME") {
            self.llm.model_name = v;
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> AppResult<()> {
        if self.batch_size == 0 {
            return Err(AppError::Config("batchSize 必须大于 0".into()));
        }
        if self.rate_limits.max_requests == 0 {
            return Err(AppError::Config("rateLimits.maxRequests 必须大于 0".into()));
        }
        if self.retry.attempts == 0 {
            return Err(AppError::Config("retry.attempts 必须大于 0".into()));
        }
        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 0.0 {
            return Err(AppError::Config("retry.backoffFactor 必须是非负数".into()));
        }
        if self.validation.min_sentence_length > self.validation.max_sentence_length {
            return Err(AppError::Config(format!(
                "validation.minSentenceLength ({}) 大于 maxSentenceLength ({})",
                self.validation.min_sentence_length, self.validation.max_sentence_length
            )));
        }
        if let Err(e) = regex::Regex::new(&self.validation.allowed_characters) {
            return Err(AppError::Config(format!(
                "validation.allowedCharacters 不是合法的正则表达式: {}",
                e
            )));
        }
        if self.output_formats.is_empty() {
            return Err(AppError::Config("outputFormats 不能为空".into()));
        }
        Ok(())
    }
}
