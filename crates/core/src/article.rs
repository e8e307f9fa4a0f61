//! Article output type with metadata and document serialization.
//!
//! This module defines the [`RenderedArticle`] struct which represents
//! the complete result of the rendering pipeline: sanitized per-section
//! HTML fragments plus title, subtitle, author, and timestamp metadata.

use serde::Serialize;

use crate::render::{HtmlTemplate, SectionHtml};
use crate::{ReposcribeError, Result};

/// Fallback document title when the summarized Markdown carries no
/// level-1 heading. Mirrors the platform-facing default.
pub const DEFAULT_TITLE: &str = "项目分析报告";

/// The complete result of rendering a summarized README.
///
/// Immutable once constructed; written once to output (a file or the
/// publishing API) and not persisted further by the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedArticle {
    /// Document title from the first level-1 heading, or [`DEFAULT_TITLE`].
    pub title: String,

    /// The first level-2 heading text; empty when none was present.
    /// Feeds poster generation, not the document body.
    pub subtitle: String,

    /// Author byline.
    pub author: String,

    /// Human-readable render timestamp, supplied by the caller so the
    /// pipeline itself stays deterministic.
    pub timestamp: String,

    /// Sanitized per-kind HTML fragments, all eight known kinds present.
    pub sections: SectionHtml,
}

impl RenderedArticle {
    /// Serializes the article into the final templated HTML document.
    pub fn to_html_document(&self) -> String {
        HtmlTemplate::new().render(&self.sections, &self.title, &self.author, &self.timestamp)
    }

    /// Gets the article as structured JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| ReposcribeError::Sanitize(e.to_string()))
    }
}
