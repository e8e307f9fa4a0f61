//! README fetching from repository URLs.
//!
//! This module locates and retrieves README-like Markdown from a GitHub
//! repository URL (probing branch and filename combinations), a GitHub
//! blob URL, or any direct URL serving raw Markdown. Relative image
//! references in the fetched Markdown can be mirrored into a local
//! directory so the sanitizer can re-host them at publish time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use url::Url;

use crate::sanitize::ImageReference;
use crate::{ReposcribeError, Result};

/// Branches probed for a README, after the repository's default branch.
const BRANCHES: &[&str] = &["main", "master", "dev", "develop"];

/// README filename candidates, probed in order per branch. Includes the
/// common Chinese variants and docs subdirectories.
const FILENAMES: &[&str] = &[
    "README.md",
    "README",
    "readme.md",
    "Readme.md",
    "README_CN.md",
    "README.zh-CN.md",
    "README_zh.md",
    "docs/README.md",
    "doc/README.md",
    "docs/zh/README.md",
    "docs/cn/README.md",
];

/// HTTP client configuration for README retrieval.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// Whether relative image references are downloaded locally and the
    /// Markdown rewritten to point at the mirror.
    pub mirror_images: bool,
    /// Directory for mirrored images.
    pub image_dir: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; Reposcribe/0.1; +https://github.com/reposcribe/reposcribe)"
                .to_string(),
            mirror_images: true,
            image_dir: PathBuf::from("images"),
        }
    }
}

/// The located README plus any mirrored image references.
#[derive(Debug, Clone)]
pub struct ReadmeContent {
    /// The README Markdown, possibly rewritten to local image paths.
    pub markdown: String,
    /// Images mirrored locally: alt text plus local path.
    pub images: Vec<ImageReference>,
}

/// Fetches README content for a repository or direct URL.
///
/// GitHub repository URLs are probed across branch and filename
/// candidates; the repository's default branch (queried best-effort from
/// the API) is tried first. Direct URLs must serve content that looks
/// like a README or [`ReposcribeError::NotReadme`] is returned.
pub async fn fetch_readme(input: &str, config: &FetchConfig) -> Result<ReadmeContent> {
    let parsed = Url::parse(input).map_err(|e| ReposcribeError::InvalidUrl(e.to_string()))?;
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(ReposcribeError::HttpError)?;

    if parsed.host_str() == Some("github.com") {
        if let Some(raw_url) = blob_to_raw(input) {
            let markdown = get_text(&client, &raw_url, config)
                .await?
                .ok_or_else(|| ReposcribeError::ReadmeNotFound(input.to_string()))?;
            return Ok(ReadmeContent { markdown, images: Vec::new() });
        }
        return fetch_repo_readme(&client, input, config).await;
    }

    let markdown = get_text(&client, input, config)
        .await?
        .ok_or_else(|| ReposcribeError::ReadmeNotFound(input.to_string()))?;
    if !looks_like_readme(&markdown) {
        return Err(ReposcribeError::NotReadme(input.to_string()));
    }
    Ok(ReadmeContent { markdown, images: Vec::new() })
}

/// Probe branch and filename combinations of a GitHub repository URL.
async fn fetch_repo_readme(client: &Client, repo_url: &str, config: &FetchConfig) -> Result<ReadmeContent> {
    let repo_url = repo_url.trim_end_matches('/').trim_end_matches(".git");
    let raw_base = repo_url.replace("github.com", "raw.githubusercontent.com");

    let mut branches: Vec<String> = Vec::new();
    if let Some(default_branch) = default_branch(client, repo_url, config).await {
        branches.push(default_branch);
    }
    for branch in BRANCHES {
        if !branches.iter().any(|b| b == branch) {
            branches.push((*branch).to_string());
        }
    }

    for branch in &branches {
        for filename in FILENAMES {
            let candidate = format!("{raw_base}/{branch}/{filename}");
            if let Some(markdown) = get_text(client, &candidate, config).await? {
                let mut base = format!("{raw_base}/{branch}");
                if let Some(subdir) = Path::new(filename).parent().filter(|p| !p.as_os_str().is_empty()) {
                    base = format!("{base}/{}", subdir.display());
                }

                if config.mirror_images {
                    let (markdown, images) = mirror_images(client, &markdown, &base, config).await;
                    return Ok(ReadmeContent { markdown, images });
                }
                return Ok(ReadmeContent { markdown, images: Vec::new() });
            }
        }
    }

    Err(ReposcribeError::ReadmeNotFound(repo_url.to_string()))
}

/// Query the GitHub API for the default branch. Failures are ignored;
/// the static branch list still gets probed.
async fn default_branch(client: &Client, repo_url: &str, config: &FetchConfig) -> Option<String> {
    let api_url = repo_url.replace("github.com", "api.github.com/repos");
    let response = client
        .get(&api_url)
        .header("User-Agent", &config.user_agent)
        .send()
        .await
        .ok()?;
    let info: serde_json::Value = response.json().await.ok()?;
    info.get("default_branch")?.as_str().map(str::to_string)
}

/// Download relative image references next to the README and rewrite the
/// Markdown to the mirrored paths. Download failures leave the original
/// reference untouched.
async fn mirror_images(
    client: &Client, markdown: &str, base: &str, config: &FetchConfig,
) -> (String, Vec<ImageReference>) {
    let re = Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap();
    let mut rewritten = markdown.to_string();
    let mut images = Vec::new();

    let references: Vec<(String, String)> = re
        .captures_iter(markdown)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect();

    for (alt, src) in references {
        let absolute = resolve_image_url(&src, base);
        let Some(filename) = image_filename(&absolute) else {
            continue;
        };

        let Ok(response) = client.get(&absolute).header("User-Agent", &config.user_agent).send().await else {
            continue;
        };
        if !response.status().is_success() {
            continue;
        }
        let Ok(bytes) = response.bytes().await else {
            continue;
        };

        if std::fs::create_dir_all(&config.image_dir).is_err() {
            continue;
        }
        let local_path = config.image_dir.join(&filename);
        if std::fs::write(&local_path, &bytes).is_err() {
            continue;
        }

        let local = local_path.display().to_string();
        rewritten = rewritten.replace(&src, &local);
        images.push(ImageReference { alt, src: local });
    }

    (rewritten, images)
}

/// GET a URL, returning `Ok(None)` for non-200 responses so probing can
/// continue to the next candidate.
async fn get_text(client: &Client, url: &str, config: &FetchConfig) -> Result<Option<String>> {
    let response = client
        .get(url)
        .header("User-Agent", &config.user_agent)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                ReposcribeError::Timeout { timeout: config.timeout }
            } else {
                ReposcribeError::HttpError(e)
            }
        })?;

    if !response.status().is_success() {
        return Ok(None);
    }
    Ok(Some(response.text().await?))
}

/// Rewrites a GitHub blob URL to its raw counterpart.
///
/// `https://github.com/o/r/blob/main/docs/README.md` becomes
/// `https://raw.githubusercontent.com/o/r/main/docs/README.md`.
fn blob_to_raw(url: &str) -> Option<String> {
    let (repo, branch_and_path) = url.split_once("/blob/")?;
    let raw_repo = repo.replace("github.com", "raw.githubusercontent.com");
    Some(format!("{raw_repo}/{branch_and_path}"))
}

/// Heuristic check that direct-URL content is actually a README.
fn looks_like_readme(content: &str) -> bool {
    let lower = content.to_lowercase();
    content.contains("# ") || content.contains("## ") || lower.contains("install") || lower.contains("usage")
}

/// Resolve a possibly relative image source against the README's base.
fn resolve_image_url(src: &str, base: &str) -> String {
    if src.starts_with("http://") || src.starts_with("https://") {
        src.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), src.trim_start_matches("./"))
    }
}

/// Extract a usable local filename from an image URL, dropping any query
/// string.
fn image_filename(url: &str) -> Option<String> {
    let path = url.split('?').next().unwrap_or(url);
    let name = path.rsplit('/').next()?;
    if name.is_empty() { None } else { Some(name.to_string()) }
}
