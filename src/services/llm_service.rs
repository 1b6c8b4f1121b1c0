//! LLM 服务 - 业务能力层
//!
//! 只负责"问 LLM 这句话是什么语言"，不关心限流、重试、缓存
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::services::classifier::Classifier;

/// LLM 没有返回内容时使用的语言标签
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 判断单句语言
/// - 提供通用的 LLM 调用接口
/// - 不出现 Vec<SentenceGroup>
/// - 不关心流程顺序
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &LlmConfig) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.model_name.clone(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（去掉首尾空白，可能为空）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(64u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API 调用失败: {}", e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }

    /// 判断单句中出现的语言
    pub async fn detect_language(&self, sentence: &str) -> Result<String> {
        let prompt = build_detection_prompt(sentence);
        let response = self.send_to_llm(&prompt, None).await?;
        Ok(normalize_response(&response))
    }
}

impl Classifier for LlmService {
    async fn classify(&self, text: &str) -> Result<String> {
        self.detect_language(text).await
    }
}

/// 构建语言检测提示词
fn build_detection_prompt(sentence: &str) -> String {
    format!(
        "You are an expert language detection assistant. Analyze the following sentence and \
         detect all languages present. Respond only with the detected languages separated by \
         commas. Here is the sentence: \"{}\"",
        sentence
    )
}

/// 整理 LLM 的回复：去掉包裹的引号和句末句号，空回复视为未知
fn normalize_response(response: &str) -> String {
    let cleaned = response
        .trim()
        .trim_end_matches('.')
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim_end_matches('.')
        .trim();

    if cleaned.is_empty() {
        UNKNOWN_LANGUAGE.to_string()
    } else {
        cleaned.to_string()
    }
}
