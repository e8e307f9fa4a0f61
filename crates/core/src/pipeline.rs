//! Main rendering API.
//!
//! This module provides the primary entry point for turning summarized
//! Markdown into a [`RenderedArticle`]. The main type is
//! [`ArticlePipeline`], along with the convenience function
//! [`render_article`].
//!
//! The pipeline is strictly staged and single-threaded: segmentation,
//! routing, per-section rendering, sanitization, then document assembly.
//! The only asynchronous point is the image-host collaborator used by
//! [`ArticlePipeline::render_with_host`]; the plain
//! [`ArticlePipeline::render`] path is pure and synchronous.
//!
//! # Example
//!
//! ```rust
//! use reposcribe_core::pipeline::render_article;
//!
//! let article = render_article("# 示例\n## 前言\n一个示例项目。\n").unwrap();
//! assert_eq!(article.title, "示例");
//! let html = article.to_html_document();
//! assert!(html.contains("一个示例项目"));
//! ```

use crate::article::{DEFAULT_TITLE, RenderedArticle};
use crate::block::segment;
use crate::render::{SectionHtml, render_section};
use crate::sanitize::{ImageHost, SanitizeConfig, sanitize_fragment, sanitize_html};
use crate::section::{SectionKind, route};
use crate::Result;

/// Configuration for the article pipeline.
///
/// # Example
///
/// ```rust
/// use reposcribe_core::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .author("晓明")
///     .timestamp("2024-06-01 09:30")
///     .capture_preface(false)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Author byline (default: "AI助手").
    pub author: String,

    /// Render timestamp stamped into the article metadata. Supplied by
    /// the caller; the pipeline never reads the clock (default: empty).
    pub timestamp: String,

    /// Whether content before the first level-2 heading is captured into
    /// an implicit preface section instead of dropped (default: true).
    pub capture_preface: bool,

    /// Sanitizer settings.
    pub sanitize: SanitizeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            author: "AI助手".to_string(),
            timestamp: String::new(),
            capture_preface: true,
            sanitize: SanitizeConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new builder for PipelineConfig.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }
}

/// Builder for PipelineConfig.
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: PipelineConfig::default() }
    }

    /// Sets the author byline.
    pub fn author(mut self, value: impl Into<String>) -> Self {
        self.config.author = value.into();
        self
    }

    /// Sets the render timestamp.
    pub fn timestamp(mut self, value: impl Into<String>) -> Self {
        self.config.timestamp = value.into();
        self
    }

    /// Sets whether leading content is captured as a preface.
    pub fn capture_preface(mut self, value: bool) -> Self {
        self.config.capture_preface = value;
        self
    }

    /// Sets the sanitizer configuration.
    pub fn sanitize(mut self, value: SanitizeConfig) -> Self {
        self.config.sanitize = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Main entry point for article rendering.
///
/// # Example
///
/// ```rust
/// use reposcribe_core::{ArticlePipeline, PipelineConfig};
///
/// let pipeline = ArticlePipeline::with_config(
///     PipelineConfig::builder().author("作者").build(),
/// );
/// let article = pipeline.render("# 标题\n## 结语\n完。\n").unwrap();
/// assert_eq!(article.author, "作者");
/// ```
pub struct ArticlePipeline {
    config: PipelineConfig,
}

impl ArticlePipeline {
    /// Creates a pipeline with default settings.
    pub fn new() -> Self {
        Self { config: PipelineConfig::default() }
    }

    /// Creates a pipeline with a custom configuration.
    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Renders summarized Markdown into an article without any network
    /// collaborator. Local image paths pass through unchanged.
    pub fn render(&self, markdown: &str) -> Result<RenderedArticle> {
        self.assemble(markdown, |html| sanitize_fragment(html, &self.config.sanitize))
    }

    /// Renders summarized Markdown, re-hosting local images through the
    /// supplied collaborator. Upload failures remove the affected image
    /// element and never fail the render.
    pub async fn render_with_host<H: ImageHost>(&self, markdown: &str, host: &H) -> Result<RenderedArticle> {
        let routed = route(&segment(markdown), self.config.capture_preface);

        let mut sections = SectionHtml::default();
        for section in &routed.sections {
            let fragment = sanitize_html(&render_section(section), &self.config.sanitize, host).await?;
            if section.kind == SectionKind::Unknown {
                sections.push_extra(section.title.clone(), fragment);
            } else {
                sections.set(section.kind, fragment);
            }
        }

        Ok(self.finish(routed.title, routed.subtitle, sections))
    }

    fn assemble(&self, markdown: &str, sanitize: impl Fn(&str) -> Result<String>) -> Result<RenderedArticle> {
        let routed = route(&segment(markdown), self.config.capture_preface);

        let mut sections = SectionHtml::default();
        for section in &routed.sections {
            let fragment = sanitize(&render_section(section))?;
            if section.kind == SectionKind::Unknown {
                sections.push_extra(section.title.clone(), fragment);
            } else {
                sections.set(section.kind, fragment);
            }
        }

        Ok(self.finish(routed.title, routed.subtitle, sections))
    }

    fn finish(&self, title: Option<String>, subtitle: Option<String>, sections: SectionHtml) -> RenderedArticle {
        RenderedArticle {
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            subtitle: subtitle.unwrap_or_default(),
            author: self.config.author.clone(),
            timestamp: self.config.timestamp.clone(),
            sections,
        }
    }
}

impl Default for ArticlePipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function for one-shot rendering with defaults.
pub fn render_article(markdown: &str) -> Result<RenderedArticle> {
    ArticlePipeline::new().render(markdown)
}
