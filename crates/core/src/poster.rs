//! Cover poster copy extraction and generation.
//!
//! [`PosterCopy`] distills title, subtitle, and body text for a cover
//! poster from the summarized Markdown, with the length limits the
//! poster API enforces. The net-gated [`PosterClient`] drives the
//! asynchronous text-to-image task API: submit, then poll until the
//! render succeeds or fails.

use crate::block::{Block, segment};

#[cfg(feature = "net")]
use std::time::Duration;

#[cfg(feature = "net")]
use reqwest::Client;

#[cfg(feature = "net")]
use crate::{ReposcribeError, Result};

/// Poster style presets accepted by the generation API. Callers pick
/// one, usually at random.
pub const LORA_STYLES: &[&str] = &[
    "2D插画1",
    "2D插画2",
    "浩瀚星云",
    "浓郁色彩",
    "光线粒子",
    "透明玻璃",
    "剪纸工艺",
    "折纸工艺",
    "中国水墨",
    "中国刺绣",
    "真实场景",
    "2D卡通",
    "儿童水彩",
    "赛博背景",
    "浅蓝抽象",
    "深蓝抽象",
    "抽象点线",
    "童话油画",
];

const TITLE_MAX_CHARS: usize = 30;
const BODY_MAX_CHARS: usize = 50;

/// Text copy for a cover poster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterCopy {
    /// Main title, at most 30 characters.
    pub title: String,
    /// Subtitle from the first level-2-or-deeper heading; may be empty.
    pub subtitle: String,
    /// Body text from the first paragraph, at most 50 characters.
    pub body: String,
}

impl PosterCopy {
    /// Extracts poster copy from article Markdown.
    ///
    /// The first heading of any level becomes the title, the first
    /// heading at level 2 or deeper the subtitle, and the first
    /// paragraph (markup stripped) the body. Code fences never
    /// contribute.
    pub fn extract(markdown: &str) -> Self {
        let mut title = None;
        let mut subtitle = None;
        let mut body = None;

        for block in segment(markdown) {
            match block {
                Block::Heading { level, text } => {
                    if title.is_none() {
                        title = Some(text.clone());
                    }
                    if subtitle.is_none() && level >= 2 && title.as_deref() != Some(text.as_str()) {
                        subtitle = Some(text);
                    }
                }
                Block::Paragraph { text } if body.is_none() => {
                    let stripped = strip_markup(&text);
                    if !stripped.is_empty() {
                        body = Some(stripped);
                    }
                }
                _ => {}
            }
            if title.is_some() && subtitle.is_some() && body.is_some() {
                break;
            }
        }

        Self {
            title: clip(&title.unwrap_or_default(), TITLE_MAX_CHARS),
            subtitle: clip(&subtitle.unwrap_or_default(), TITLE_MAX_CHARS),
            body: clip(&body.unwrap_or_default(), BODY_MAX_CHARS),
        }
    }
}

/// Strip inline Markdown markup, keeping link text and dropping images,
/// and keep only the first line.
fn strip_markup(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("");
    let no_images = regex::Regex::new(r"!\[[^\]]*\]\([^)]*\)")
        .unwrap()
        .replace_all(first_line, "");
    let no_links = regex::Regex::new(r"\[([^\]]*)\]\([^)]*\)")
        .unwrap()
        .replace_all(&no_images, "$1");
    no_links.replace("**", "").replace('*', "").replace('`', "").trim().to_string()
}

/// Clip to `max` characters, replacing the tail with an ellipsis when
/// over budget. Counts characters, not bytes.
fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max - 3).collect();
    clipped.push_str("...");
    clipped
}

/// Configuration for the poster generation client.
#[cfg(feature = "net")]
#[derive(Debug, Clone)]
pub struct PosterConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// API base URL.
    pub api_base: String,
    /// Seconds between task status polls.
    pub poll_interval: u64,
    /// Maximum polls before giving up.
    pub max_polls: u32,
    /// Per-request timeout in seconds.
    pub timeout: u64,
}

#[cfg(feature = "net")]
impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://dashscope.aliyuncs.com".to_string(),
            poll_interval: 20,
            max_polls: 45,
            timeout: 60,
        }
    }
}

/// Parameters for one poster generation.
#[cfg(feature = "net")]
#[derive(Debug, Clone)]
pub struct PosterRequest {
    /// Text placed on the poster.
    pub copy: PosterCopy,
    /// Scene prompt for the background imagery.
    pub prompt: String,
    /// Aspect preset, "竖版" or "横版".
    pub wh_ratio: String,
    /// Style preset from [`LORA_STYLES`].
    pub lora_name: String,
}

/// Client for the asynchronous poster generation API.
#[cfg(feature = "net")]
pub struct PosterClient {
    config: PosterConfig,
    client: Client,
}

#[cfg(feature = "net")]
impl PosterClient {
    /// Creates a client. Fails when the API key is missing.
    pub fn new(config: PosterConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ReposcribeError::MissingConfig("DASHSCOPE_API_KEY".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(ReposcribeError::HttpError)?;
        Ok(Self { config, client })
    }

    /// Generates a poster and returns the rendered image URL.
    ///
    /// Submits the task, then polls at the configured interval until the
    /// task succeeds, fails, or the poll budget runs out.
    pub async fn generate(&self, request: &PosterRequest) -> Result<String> {
        let task_id = self.submit(request).await?;

        for _ in 0..self.config.max_polls {
            tokio::time::sleep(Duration::from_secs(self.config.poll_interval)).await;

            let status = self.task_status(&task_id).await?;
            let state = status
                .get("output")
                .and_then(|o| o.get("task_status"))
                .and_then(|s| s.as_str())
                .unwrap_or("");

            match state {
                "SUCCEEDED" => {
                    return status
                        .get("output")
                        .and_then(|o| o.get("render_urls"))
                        .and_then(|u| u.as_array())
                        .and_then(|urls| urls.first())
                        .and_then(|u| u.as_str())
                        .map(str::to_string)
                        .ok_or_else(|| {
                            ReposcribeError::Poster("succeeded task returned no render URL".to_string())
                        });
                }
                "FAILED" => {
                    let message = status
                        .get("output")
                        .and_then(|o| o.get("message"))
                        .and_then(|m| m.as_str())
                        .unwrap_or("task failed");
                    return Err(ReposcribeError::Poster(message.to_string()));
                }
                _ => {}
            }
        }

        Err(ReposcribeError::Poster(format!(
            "task {task_id} still pending after {} polls",
            self.config.max_polls
        )))
    }

    async fn submit(&self, request: &PosterRequest) -> Result<String> {
        let url = format!(
            "{}/api/v1/services/aigc/text2image/image-synthesis",
            self.config.api_base.trim_end_matches('/')
        );
        let body: serde_json::Value = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("X-DashScope-Async", "enable")
            .json(&build_request_body(request))
            .send()
            .await?
            .json()
            .await?;

        body.get("output")
            .and_then(|o| o.get("task_id"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                let message = body
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("submit response missing task_id");
                ReposcribeError::Poster(message.to_string())
            })
    }

    async fn task_status(&self, task_id: &str) -> Result<serde_json::Value> {
        let url = format!("{}/api/v1/tasks/{task_id}", self.config.api_base.trim_end_matches('/'));
        let body = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?
            .json()
            .await?;
        Ok(body)
    }
}

/// Builds the task submission body.
#[cfg(feature = "net")]
fn build_request_body(request: &PosterRequest) -> serde_json::Value {
    serde_json::json!({
        "model": "wanx-poster-generation-v1",
        "input": {
            "title": request.copy.title,
            "sub_title": request.copy.subtitle,
            "body_text": request.copy.body,
            "prompt_text_zh": request.prompt,
            "wh_ratios": request.wh_ratio,
            "lora_name": request.lora_name,
            "lora_weight": 0.8,
            "ctrl_ratio": 0.7,
            "ctrl_step": 0.7,
            "generate_mode": "generate",
            "generate_num": 1,
        },
        "parameters": {},
    })
}
