//! Per-section HTML assembly and the final document template.
//!
//! The publishing platform only honors inline styles, so every element
//! carries its presentation inline. Code fence bodies are emitted as
//! preformatted blocks and bypass the inline formatter entirely;
//! everything else runs through [`format_inline`].

use serde::Serialize;

use crate::block::Block;
use crate::inline::{escape_html, format_inline};
use crate::section::{Section, SectionKind};

const SECTION_STYLE: &str = "margin-bottom: 30px;";
const SECTION_TITLE_STYLE: &str = "font-size: 20px; font-weight: bold; color: #333; \
                                   margin-bottom: 15px; padding-bottom: 10px; border-bottom: 2px solid #f0f0f0;";
const SECTION_CONTENT_STYLE: &str = "font-size: 16px; line-height: 1.8; color: #444; margin-bottom: 15px;";
const CODE_CONTAINER_STYLE: &str = "background-color: #f6f8fa; border-radius: 6px; margin: 16px 0; \
                                    padding: 16px; overflow-x: auto; \
                                    font-family: Consolas, Monaco, 'Andale Mono', monospace;";
const CODE_HEADER_STYLE: &str = "color: #666; font-size: 12px; margin-bottom: 8px; \
                                 font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;";
const CODE_PRE_STYLE: &str = "margin: 0; font-size: 14px; line-height: 1.45; white-space: pre-wrap; \
                              word-wrap: break-word; color: #24292e;";
const LIST_STYLE: &str = "margin: 10px 0; padding-left: 20px;";
const LIST_ITEM_STYLE: &str = "margin: 8px 0; line-height: 1.6;";
const PARAGRAPH_STYLE: &str = "margin: 16px 0; line-height: 1.6;";
const HR_STYLE: &str = "border: none; border-top: 1px solid #e1e4e8; margin: 20px 0;";
const PROJECT_LINK_STYLE: &str = "color: #0366d6; text-decoration: none; word-break: break-all;";

/// Per-kind HTML fragments with all eight known kinds statically present.
///
/// Kinds without content hold an empty string, never an absent key; the
/// template can render every field unconditionally.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SectionHtml {
    pub preface: String,
    pub introduction: String,
    pub features: String,
    pub technical: String,
    pub installation: String,
    pub usage: String,
    pub repository: String,
    pub conclusion: String,
    /// Fragments for unrecognized sections, in document order, keyed by
    /// their free-form titles.
    pub extra: Vec<(String, String)>,
}

impl SectionHtml {
    /// The fragment for a known kind; empty string when absent.
    /// [`SectionKind::Unknown`] fragments live in `extra`.
    pub fn get(&self, kind: SectionKind) -> &str {
        match kind {
            SectionKind::Preface => &self.preface,
            SectionKind::Introduction => &self.introduction,
            SectionKind::Features => &self.features,
            SectionKind::Technical => &self.technical,
            SectionKind::Installation => &self.installation,
            SectionKind::Usage => &self.usage,
            SectionKind::Repository => &self.repository,
            SectionKind::Conclusion => &self.conclusion,
            SectionKind::Unknown => "",
        }
    }

    /// Stores a fragment for a known kind. Unknown fragments go through
    /// [`SectionHtml::push_extra`].
    pub fn set(&mut self, kind: SectionKind, html: String) {
        match kind {
            SectionKind::Preface => self.preface = html,
            SectionKind::Introduction => self.introduction = html,
            SectionKind::Features => self.features = html,
            SectionKind::Technical => self.technical = html,
            SectionKind::Installation => self.installation = html,
            SectionKind::Usage => self.usage = html,
            SectionKind::Repository => self.repository = html,
            SectionKind::Conclusion => self.conclusion = html,
            SectionKind::Unknown => {}
        }
    }

    /// Appends a fragment for an unrecognized section.
    pub fn push_extra(&mut self, title: String, html: String) {
        self.extra.push((title, html));
    }
}

/// Renders one routed section into an HTML fragment.
///
/// Repository sections get link-per-line treatment; all other kinds get
/// the general block rendering with code fences kept out of the inline
/// formatter.
pub fn render_section(section: &Section) -> String {
    let mut html = format!(r#"<div class="section" style="{SECTION_STYLE}">"#);
    html.push_str(&format!(
        r#"<div class="section-title" style="{SECTION_TITLE_STYLE}">{}</div>"#,
        escape_html(&section.title)
    ));

    let body = match section.kind {
        SectionKind::Repository => render_repository_blocks(&section.blocks),
        _ => render_blocks(&section.blocks),
    };
    html.push_str(&body);
    html.push_str("</div>");
    html
}

/// General block rendering. Inline-formatted content accumulates into a
/// buffer that is flushed as a `section-content` div whenever a code
/// fence interrupts it, so code blocks sit as siblings of the text runs.
fn render_blocks(blocks: &[Block]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut buffer = String::new();
    let mut idx = 0;

    while idx < blocks.len() {
        match &blocks[idx] {
            Block::CodeFence { language, body } => {
                flush_content(&mut buffer, &mut parts);
                parts.push(render_code_block(language, body));
                idx += 1;
            }
            Block::ListItem { ordered, .. } => {
                let ordered = *ordered;
                let mut items = Vec::new();
                while let Some(Block::ListItem { ordered: o, text }) = blocks.get(idx) {
                    if *o != ordered {
                        break;
                    }
                    items.push(text.as_str());
                    idx += 1;
                }
                buffer.push_str(&render_list(ordered, &items));
            }
            Block::Heading { level, text } => {
                buffer.push_str(&render_heading(*level, text));
                idx += 1;
            }
            Block::HorizontalRule => {
                buffer.push_str(&format!(r#"<hr style="{HR_STYLE}">"#));
                idx += 1;
            }
            Block::Paragraph { text } => {
                buffer.push_str(&render_paragraph(text));
                idx += 1;
            }
        }
    }

    flush_content(&mut buffer, &mut parts);
    parts.concat()
}

/// Repository sections list the project URLs, one per line, skipping
/// image references. Blocks that are not plain text fall back to the
/// general rendering.
fn render_repository_blocks(blocks: &[Block]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut rest: Vec<Block> = Vec::new();

    for block in blocks {
        match block {
            Block::Paragraph { text } => lines.extend(text.lines().map(str::to_string)),
            Block::ListItem { text, .. } => lines.push(text.clone()),
            other => rest.push(other.clone()),
        }
    }

    let mut body = format!(r#"<div class="section-content" style="{SECTION_CONTENT_STYLE}">"#);
    for line in &lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with("![") {
            continue;
        }
        body.push_str(&format!(
            r#"<a href="{line}" target="_blank" class="project-link" style="{PROJECT_LINK_STYLE}">{line}</a><br>"#
        ));
    }
    body.push_str("</div>");

    if !rest.is_empty() {
        body.push_str(&render_blocks(&rest));
    }
    body
}

fn flush_content(buffer: &mut String, parts: &mut Vec<String>) {
    if buffer.is_empty() {
        return;
    }
    parts.push(format!(
        r#"<div class="section-content" style="{SECTION_CONTENT_STYLE}">{}</div>"#,
        std::mem::take(buffer)
    ));
}

/// Code fences become a styled container with a language header; the
/// body is escaped verbatim and exempt from inline formatting.
fn render_code_block(language: &str, body: &[String]) -> String {
    let lang_display = if language.is_empty() { "CODE".to_string() } else { language.to_uppercase() };
    format!(
        r#"<div class="code-block" style="{CODE_CONTAINER_STYLE}"><div style="{CODE_HEADER_STYLE}">{}</div><pre style="{CODE_PRE_STYLE}">{}</pre></div>"#,
        escape_html(&lang_display),
        escape_html(&body.join("\n"))
    )
}

fn render_list(ordered: bool, items: &[&str]) -> String {
    let tag = if ordered { "ol" } else { "ul" };
    let mut html = format!(r#"<{tag} style="{LIST_STYLE}">"#);
    for item in items {
        html.push_str(&format!(r#"<li style="{LIST_ITEM_STYLE}">{}</li>"#, format_inline(item)));
    }
    html.push_str(&format!("</{tag}>"));
    html
}

/// In-section headings (levels 3-6; a stray duplicate level 1-2 renders
/// the same way). Font size steps down two pixels per level.
fn render_heading(level: u8, text: &str) -> String {
    let level = level.clamp(1, 6);
    let size = 28 - 2 * level as i32;
    format!(
        r#"<h{level} style="font-size: {size}px; margin: 20px 0 10px 0; font-weight: bold;">{}</h{level}>"#,
        format_inline(text)
    )
}

fn render_paragraph(text: &str) -> String {
    format!(
        r#"<p style="{PARAGRAPH_STYLE}">{}</p>"#,
        format_inline(text).replace('\n', "<br>")
    )
}

/// The fixed document template.
///
/// `render` tolerates every section being empty; missing kinds simply
/// contribute nothing between the title block and the footer.
#[derive(Debug, Clone, Default)]
pub struct HtmlTemplate;

impl HtmlTemplate {
    pub fn new() -> Self {
        Self
    }

    /// Composes the final HTML document from sanitized section fragments
    /// plus title, author, and timestamp metadata.
    pub fn render(&self, sections: &SectionHtml, title: &str, author: &str, timestamp: &str) -> String {
        let mut body = String::new();
        for kind in SectionKind::KNOWN {
            body.push_str(sections.get(kind));
        }
        for (_, html) in &sections.extra {
            body.push_str(html);
        }

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body style="margin: 0; background-color: #fff;">
<div class="article" style="max-width: 677px; margin: 0 auto; padding: 20px; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'PingFang SC', 'Hiragino Sans GB', 'Microsoft YaHei', sans-serif;">
<h1 class="article-title" style="font-size: 24px; font-weight: bold; text-align: center; margin: 20px 0 10px 0; color: #333;">{title}</h1>
<div class="article-meta" style="text-align: center; color: #999; font-size: 14px; margin-bottom: 30px;">{author} · {timestamp}</div>
{body}
</div>
</body>
</html>
"#,
            title = escape_html(title),
            author = escape_html(author),
            timestamp = escape_html(timestamp),
            body = body,
        )
    }
}
