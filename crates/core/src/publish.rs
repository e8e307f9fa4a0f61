//! Draft publishing against the WeChat Official Account API.
//!
//! [`DraftPublisher`] wraps the platform endpoints the pipeline needs:
//! access-token retrieval with caching, permanent material upload (the
//! platform only renders images it hosts itself), draft creation, and
//! the freepublish submit/status pair. It also implements [`ImageHost`]
//! so the sanitizer can rewrite local image paths to platform URLs.

use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tokio::sync::Mutex;

use crate::sanitize::ImageHost;
use crate::{ReposcribeError, Result};

/// Tokens live for 7200 seconds; refresh this much earlier to avoid
/// racing the expiry.
const TOKEN_SLACK_SECS: u64 = 200;

/// Configuration for the publishing client.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Official account AppID.
    pub app_id: String,
    /// Official account AppSecret.
    pub app_secret: String,
    /// API base URL.
    pub api_base: String,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            api_base: "https://api.weixin.qq.com".to_string(),
            timeout: 30,
        }
    }
}

#[derive(Debug)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// A permanent material upload result.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Material id, usable as a draft thumbnail.
    pub media_id: String,
    /// Platform-hosted URL, usable as an `<img>` source in draft HTML.
    pub url: String,
}

/// Client for the draft and freepublish endpoints.
pub struct DraftPublisher {
    config: PublishConfig,
    client: Client,
    token: Mutex<Option<CachedToken>>,
}

impl DraftPublisher {
    /// Creates a publisher. Fails when credentials are missing.
    pub fn new(config: PublishConfig) -> Result<Self> {
        if config.app_id.is_empty() {
            return Err(ReposcribeError::MissingConfig("WEIXIN_APP_ID".to_string()));
        }
        if config.app_secret.is_empty() {
            return Err(ReposcribeError::MissingConfig("WEIXIN_APP_SECRET".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(ReposcribeError::HttpError)?;

        Ok(Self { config, client, token: Mutex::new(None) })
    }

    /// Returns a valid access token, fetching a fresh one when the cached
    /// token is absent or near expiry.
    pub async fn access_token(&self) -> Result<String> {
        let mut cache = self.token.lock().await;
        if let Some(cached) = cache.as_ref()
            && cached.is_valid()
        {
            return Ok(cached.token.clone());
        }

        let url = format!(
            "{}/cgi-bin/token?grant_type=client_credential&appid={}&secret={}",
            self.config.api_base, self.config.app_id, self.config.app_secret
        );
        let body: serde_json::Value = self.client.get(&url).send().await?.json().await?;

        if let Some(message) = api_error(&body) {
            return Err(ReposcribeError::Publish(message));
        }

        let token = body
            .get("access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| ReposcribeError::Publish("token response missing access_token".to_string()))?
            .to_string();
        let expires_in = body.get("expires_in").and_then(|e| e.as_u64()).unwrap_or(7200);

        *cache = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + Duration::from_secs(expires_in.saturating_sub(TOKEN_SLACK_SECS)),
        });
        Ok(token)
    }

    /// Uploads a local image file as permanent material.
    pub async fn upload_file(&self, path: &Path) -> Result<UploadedImage> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(fallback_filename);
        self.upload_bytes(bytes, filename).await
    }

    /// Downloads a remote image and re-uploads it as permanent material.
    /// Used for poster thumbnails, whose generated URLs expire.
    pub async fn upload_material(&self, image_url: &str) -> Result<UploadedImage> {
        let response = self.client.get(image_url).send().await?;
        if !response.status().is_success() {
            return Err(ReposcribeError::Upload(format!(
                "image download failed with {}: {image_url}",
                response.status()
            )));
        }
        let bytes = response.bytes().await?.to_vec();
        self.upload_bytes(bytes, fallback_filename()).await
    }

    async fn upload_bytes(&self, bytes: Vec<u8>, filename: String) -> Result<UploadedImage> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/cgi-bin/material/add_material?access_token={token}&type=image",
            self.config.api_base
        );

        let part = Part::bytes(bytes)
            .mime_str(mime_for(&filename))
            .map_err(|e| ReposcribeError::Upload(e.to_string()))?
            .file_name(filename);
        let form = Form::new().part("media", part);

        let body: serde_json::Value = self.client.post(&url).multipart(form).send().await?.json().await?;
        if let Some(message) = api_error(&body) {
            return Err(ReposcribeError::Upload(message));
        }

        let media_id = body
            .get("media_id")
            .and_then(|m| m.as_str())
            .ok_or_else(|| ReposcribeError::Upload("upload response missing media_id".to_string()))?
            .to_string();
        let url = body.get("url").and_then(|u| u.as_str()).unwrap_or_default().to_string();

        Ok(UploadedImage { media_id, url })
    }

    /// Creates a draft article and returns its media id.
    pub async fn create_draft(
        &self, title: &str, html: &str, author: &str, thumb_media_id: Option<&str>,
    ) -> Result<String> {
        let token = self.access_token().await?;
        let url = format!("{}/cgi-bin/draft/add?access_token={token}", self.config.api_base);
        let payload = build_draft_body(title, html, author, thumb_media_id);

        let body: serde_json::Value = self.client.post(&url).json(&payload).send().await?.json().await?;
        if let Some(message) = api_error(&body) {
            return Err(ReposcribeError::Publish(message));
        }

        body.get("media_id")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .ok_or_else(|| ReposcribeError::Publish("draft response missing media_id".to_string()))
    }

    /// Submits a draft for publication and returns the publish id.
    pub async fn publish_draft(&self, media_id: &str) -> Result<String> {
        let token = self.access_token().await?;
        let url = format!("{}/cgi-bin/freepublish/submit?access_token={token}", self.config.api_base);
        let payload = serde_json::json!({ "media_id": media_id });

        let body: serde_json::Value = self.client.post(&url).json(&payload).send().await?.json().await?;
        if let Some(message) = api_error(&body) {
            return Err(ReposcribeError::Publish(message));
        }

        body.get("publish_id")
            .and_then(|p| p.as_str().map(str::to_string).or_else(|| p.as_u64().map(|n| n.to_string())))
            .ok_or_else(|| ReposcribeError::Publish("submit response missing publish_id".to_string()))
    }

    /// Queries the status of a submitted publication.
    pub async fn publish_status(&self, publish_id: &str) -> Result<serde_json::Value> {
        let token = self.access_token().await?;
        let url = format!("{}/cgi-bin/freepublish/get?access_token={token}", self.config.api_base);
        let payload = serde_json::json!({ "publish_id": publish_id });

        let body: serde_json::Value = self.client.post(&url).json(&payload).send().await?.json().await?;
        if let Some(message) = api_error(&body) {
            return Err(ReposcribeError::Publish(message));
        }
        Ok(body)
    }
}

impl ImageHost for DraftPublisher {
    async fn host(&self, src: &str) -> Result<String> {
        let uploaded = self.upload_file(Path::new(src)).await?;
        if uploaded.url.is_empty() {
            return Err(ReposcribeError::Upload(format!("no hosted URL returned for {src}")));
        }
        Ok(uploaded.url)
    }
}

/// Maps an API error envelope to a message, or `None` for success.
/// Error code 40164 gets an actionable hint since it is by far the most
/// common first-run failure.
fn api_error(body: &serde_json::Value) -> Option<String> {
    let errcode = body.get("errcode").and_then(|c| c.as_i64()).unwrap_or(0);
    if errcode == 0 {
        return None;
    }

    let errmsg = body.get("errmsg").and_then(|m| m.as_str()).unwrap_or("unknown error");
    if errcode == 40164 {
        return Some(format!(
            "errcode 40164: 当前服务器IP不在公众号白名单中。请登录公众号后台，在「设置与开发 → 基本配置 → IP白名单」中添加本机出口IP。({errmsg})"
        ));
    }
    Some(format!("errcode {errcode}: {errmsg}"))
}

/// Builds the draft/add request body.
fn build_draft_body(title: &str, html: &str, author: &str, thumb_media_id: Option<&str>) -> serde_json::Value {
    let mut article = serde_json::json!({
        "title": title,
        "author": author,
        "content": html,
        "content_source_url": "",
        "digest": "",
        "need_open_comment": 0,
        "only_fans_can_comment": 0,
    });
    if let Some(thumb) = thumb_media_id {
        article["thumb_media_id"] = serde_json::json!(thumb);
    }
    serde_json::json!({ "articles": [article] })
}

fn fallback_filename() -> String {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    format!("image_{secs}.jpg")
}

fn mime_for(filename: &str) -> &'static str {
    let lower = filename.to_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PublishConfig {
        PublishConfig {
            app_id: "wx123".to_string(),
            app_secret: "secret".to_string(),
            ..PublishConfig::default()
        }
    }

    #[test]
    fn test_new_requires_credentials() {
        let missing_id = PublishConfig { app_secret: "s".to_string(), ..PublishConfig::default() };
        assert!(matches!(DraftPublisher::new(missing_id), Err(ReposcribeError::MissingConfig(_))));

        let missing_secret = PublishConfig { app_id: "wx".to_string(), ..PublishConfig::default() };
        assert!(matches!(DraftPublisher::new(missing_secret), Err(ReposcribeError::MissingConfig(_))));

        assert!(DraftPublisher::new(config()).is_ok());
    }

    #[test]
    fn test_cached_token_validity() {
        let valid = CachedToken {
            token: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(60),
        };
        assert!(valid.is_valid());

        let expired = CachedToken {
            token: "t".to_string(),
            expires_at: Instant::now() - Duration::from_secs(1),
        };
        assert!(!expired.is_valid());
    }

    #[test]
    fn test_api_error_success_envelope() {
        let ok = serde_json::json!({ "errcode": 0, "errmsg": "ok" });
        assert!(api_error(&ok).is_none());

        let no_code = serde_json::json!({ "media_id": "abc" });
        assert!(api_error(&no_code).is_none());
    }

    #[test]
    fn test_api_error_ip_whitelist_hint() {
        let body = serde_json::json!({ "errcode": 40164, "errmsg": "invalid ip 1.2.3.4" });
        let message = api_error(&body).unwrap();
        assert!(message.contains("40164"));
        assert!(message.contains("白名单"));
        assert!(message.contains("invalid ip 1.2.3.4"));
    }

    #[test]
    fn test_api_error_generic() {
        let body = serde_json::json!({ "errcode": 45009, "errmsg": "reach max api daily quota limit" });
        let message = api_error(&body).unwrap();
        assert!(message.contains("45009"));
        assert!(message.contains("quota"));
    }

    #[test]
    fn test_build_draft_body() {
        let body = build_draft_body("标题", "<p>正文</p>", "作者", Some("thumb1"));
        let article = &body["articles"][0];
        assert_eq!(article["title"], "标题");
        assert_eq!(article["author"], "作者");
        assert_eq!(article["content"], "<p>正文</p>");
        assert_eq!(article["thumb_media_id"], "thumb1");
        assert_eq!(article["need_open_comment"], 0);
    }

    #[test]
    fn test_build_draft_body_without_thumb() {
        let body = build_draft_body("t", "<p>c</p>", "a", None);
        assert!(body["articles"][0].get("thumb_media_id").is_none());
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for("a.png"), "image/png");
        assert_eq!(mime_for("A.GIF"), "image/gif");
        assert_eq!(mime_for("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_for("no_extension"), "image/jpeg");
    }
}
