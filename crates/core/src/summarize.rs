//! README summarization through an OpenAI-compatible chat API.
//!
//! Sends the fetched README to a chat-completions endpoint with a prompt
//! that asks for a restructured Chinese article using a fixed section
//! vocabulary, so the routing stage downstream can classify every
//! heading the model emits.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{ReposcribeError, Result};

const SYSTEM_PROMPT: &str =
    "你是一个专业的技术文档作者，擅长分析开源项目并生成详细的介绍文章。你会保持原始文档的准确性，同时让内容更加结构化和易于理解。";

/// Configuration for the summarization client.
#[derive(Debug, Clone)]
pub struct SummarizeConfig {
    /// Base URL of the OpenAI-compatible API, e.g. `https://api.openai.com/v1`.
    pub api_base: String,
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Maximum README characters included in the prompt; longer input is
    /// truncated with a marker.
    pub max_input_chars: usize,
    /// Completion token budget.
    pub max_tokens: u32,
    /// Request timeout in seconds. Generation is slow, so this is much
    /// longer than the fetch timeout.
    pub timeout: u64,
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            max_input_chars: 4000,
            max_tokens: 3000,
            timeout: 120,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Summarizes README Markdown into a structured Chinese article.
///
/// The returned text is Markdown whose level-2 headings come from the
/// section vocabulary the prompt prescribes.
pub async fn summarize(readme: &str, config: &SummarizeConfig) -> Result<String> {
    if config.api_key.is_empty() {
        return Err(ReposcribeError::MissingConfig("OPENAI_API_KEY".to_string()));
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(ReposcribeError::HttpError)?;

    let prompt = build_prompt(readme, config.max_input_chars);
    let request = ChatRequest {
        model: &config.model,
        messages: vec![
            ChatMessage { role: "system", content: SYSTEM_PROMPT },
            ChatMessage { role: "user", content: &prompt },
        ],
        max_tokens: config.max_tokens,
        temperature: 0.7,
    };

    let url = format!("{}/chat/completions", config.api_base.trim_end_matches('/'));
    let response = client
        .post(&url)
        .bearer_auth(&config.api_key)
        .json(&request)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                ReposcribeError::Timeout { timeout: config.timeout }
            } else {
                ReposcribeError::HttpError(e)
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ReposcribeError::Summarize(format!("API returned {status}: {body}")));
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|e| ReposcribeError::Summarize(format!("unparseable response: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ReposcribeError::Summarize("empty completion".to_string()))
}

/// Builds the user prompt, truncating the README at `max_chars`
/// characters.
fn build_prompt(readme: &str, max_chars: usize) -> String {
    let mut content: String = readme.chars().take(max_chars).collect();
    if readme.chars().count() > max_chars {
        content.push_str("\n...(内容已截断)");
    }

    format!(
        "请分析以下GitHub项目的README文档，生成一篇详细的中文介绍文章。\n\
         \n\
         要求：\n\
         1. 文章以一个一级标题开头，作为文章标题\n\
         2. 正文分为若干章节，每个章节使用二级标题，标题从以下词汇中选取：\n\
            前言、项目介绍、功能亮点、技术特点、安装说明、使用说明、项目地址、结语\n\
         3. 保留README中的代码示例，使用Markdown代码块\n\
         4. 保留项目的图片引用和链接\n\
         5. 语言通俗易懂，适合技术类公众号读者\n\
         \n\
         README内容：\n\
         {content}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SummarizeConfig::default();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_input_chars, 4000);
        assert_eq!(config.max_tokens, 3000);
    }

    #[test]
    fn test_build_prompt_includes_vocabulary() {
        let prompt = build_prompt("# hello", 4000);
        assert!(prompt.contains("# hello"));
        assert!(prompt.contains("前言"));
        assert!(prompt.contains("结语"));
        assert!(!prompt.contains("内容已截断"));
    }

    #[test]
    fn test_build_prompt_truncates_long_input() {
        let readme = "很".repeat(5000);
        let prompt = build_prompt(&readme, 4000);
        assert!(prompt.contains("...(内容已截断)"));
        assert!(prompt.chars().filter(|c| *c == '很').count() == 4000);
    }

    #[test]
    fn test_response_parsing() {
        let body = r##"{"choices":[{"message":{"role":"assistant","content":"# 标题\n正文"}}]}"##;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("# 标题\n正文"));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let result = summarize("# x", &SummarizeConfig::default()).await;
        assert!(matches!(result, Err(ReposcribeError::MissingConfig(_))));
    }
}
