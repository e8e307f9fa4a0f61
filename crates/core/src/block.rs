//! Block segmentation of LLM-generated Markdown.
//!
//! This module splits raw Markdown into an ordered sequence of [`Block`]
//! values: headings, code fences, list items, horizontal rules, and
//! paragraphs. Segmentation is line-based and tracks code-fence state so
//! that nothing inside a fence is ever classified as Markdown syntax.
//!
//! # Example
//!
//! ```rust
//! use reposcribe_core::block::{Block, segment};
//!
//! let blocks = segment("## 安装说明\n- step one\n- step two\n");
//! assert_eq!(blocks.len(), 3);
//! assert!(matches!(blocks[0], Block::Heading { level: 2, .. }));
//! ```

/// A single structurally classified unit of Markdown.
///
/// Blocks are produced once by [`segment`] and consumed read-only by the
/// section router and renderer. They are never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// An ATX heading: one to six `#` characters followed by a space.
    Heading { level: u8, text: String },

    /// A triple-backtick fenced code region.
    ///
    /// `language` is the identifier after the opening fence (may be empty);
    /// `body` holds the fenced lines verbatim, in order.
    CodeFence { language: String, body: Vec<String> },

    /// A single list item, `- ` (unordered) or `1. ` (ordered).
    ListItem { ordered: bool, text: String },

    /// A line of three or more `-` characters alone.
    HorizontalRule,

    /// A run of plain text lines, closed by a blank line or a new
    /// block-starting line.
    Paragraph { text: String },
}

/// Splits Markdown text into an ordered sequence of blocks.
///
/// The scanner maintains a single piece of state: whether it is inside a
/// code fence. While inside, every line is buffered verbatim into the
/// fence body regardless of what it contains; a `#` inside a code sample
/// must never become a heading. Outside a fence, lines are classified as
/// heading, horizontal rule, list item, or accumulated into the current
/// paragraph.
///
/// An unbalanced fence at end of input is not an error: the buffered
/// lines are flushed as a final [`Block::CodeFence`] rather than dropped.
pub fn segment(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut fence_body: Vec<String> = Vec::new();
    let mut fence_language = String::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            if in_fence {
                blocks.push(Block::CodeFence {
                    language: std::mem::take(&mut fence_language),
                    body: std::mem::take(&mut fence_body),
                });
            } else {
                close_paragraph(&mut paragraph, &mut blocks);
                fence_language = trimmed[3..].trim().to_string();
            }
            in_fence = !in_fence;
            continue;
        }

        if in_fence {
            fence_body.push(line.to_string());
            continue;
        }

        if let Some((level, text)) = parse_heading(trimmed) {
            close_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading { level, text });
        } else if is_horizontal_rule(trimmed) {
            close_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::HorizontalRule);
        } else if let Some(text) = trimmed.strip_prefix("- ") {
            close_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::ListItem { ordered: false, text: text.trim().to_string() });
        } else if let Some(text) = parse_ordered_item(trimmed) {
            close_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::ListItem { ordered: true, text });
        } else if trimmed.is_empty() {
            close_paragraph(&mut paragraph, &mut blocks);
        } else {
            paragraph.push(trimmed.to_string());
        }
    }

    // Unbalanced fence: flush rather than discard.
    if in_fence {
        blocks.push(Block::CodeFence { language: fence_language, body: fence_body });
    }
    close_paragraph(&mut paragraph, &mut blocks);

    blocks
}

/// Close the current paragraph buffer, emitting nothing when it is
/// whitespace-only.
fn close_paragraph(paragraph: &mut Vec<String>, blocks: &mut Vec<Block>) {
    if paragraph.iter().all(|l| l.trim().is_empty()) {
        paragraph.clear();
        return;
    }
    blocks.push(Block::Paragraph { text: paragraph.join("\n") });
    paragraph.clear();
}

/// Parse an ATX heading: 1-6 `#` characters followed by a space.
fn parse_heading(line: &str) -> Option<(u8, String)> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    rest.strip_prefix(' ').map(|text| (hashes as u8, text.trim().to_string()))
}

/// A horizontal rule is three or more `-` characters alone on a line.
fn is_horizontal_rule(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == '-')
}

/// Parse an ordered list item: `<digits>. ` prefix.
fn parse_ordered_item(line: &str) -> Option<String> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(". ").map(|text| text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_levels() {
        let blocks = segment("# One\n## Two\n###### Six\n");
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 1, text: "One".to_string() },
                Block::Heading { level: 2, text: "Two".to_string() },
                Block::Heading { level: 6, text: "Six".to_string() },
            ]
        );
    }

    #[test]
    fn test_heading_requires_space() {
        let blocks = segment("#NotAHeading\n");
        assert_eq!(blocks, vec![Block::Paragraph { text: "#NotAHeading".to_string() }]);
    }

    #[test]
    fn test_seven_hashes_is_paragraph() {
        let blocks = segment("####### Too deep\n");
        assert!(matches!(blocks[0], Block::Paragraph { .. }));
    }

    #[test]
    fn test_code_fence_shields_markdown_syntax() {
        let blocks = segment("```python\n# not a heading\nprint(1)\n```\n");
        assert_eq!(
            blocks,
            vec![Block::CodeFence {
                language: "python".to_string(),
                body: vec!["# not a heading".to_string(), "print(1)".to_string()],
            }]
        );
    }

    #[test]
    fn test_code_fence_shields_lists_and_emphasis() {
        let blocks = segment("```\n- item\n**bold**\n`tick`\n```\n");
        assert_eq!(blocks.len(), 1);
        let Block::CodeFence { body, .. } = &blocks[0] else {
            panic!("expected code fence");
        };
        assert_eq!(body, &["- item", "**bold**", "`tick`"]);
    }

    #[test]
    fn test_unbalanced_fence_is_flushed() {
        let blocks = segment("```rust\nlet x = 1;\n");
        assert_eq!(
            blocks,
            vec![Block::CodeFence { language: "rust".to_string(), body: vec!["let x = 1;".to_string()] }]
        );
    }

    #[test]
    fn test_unordered_list_items() {
        let blocks = segment("- one\n- two\n");
        assert_eq!(
            blocks,
            vec![
                Block::ListItem { ordered: false, text: "one".to_string() },
                Block::ListItem { ordered: false, text: "two".to_string() },
            ]
        );
    }

    #[test]
    fn test_ordered_list_items() {
        let blocks = segment("1. first\n2. second\n10. tenth\n");
        assert_eq!(blocks.len(), 3);
        assert!(blocks.iter().all(|b| matches!(b, Block::ListItem { ordered: true, .. })));
    }

    #[test]
    fn test_horizontal_rule() {
        let blocks = segment("---\n-----\n--\n");
        assert_eq!(
            blocks,
            vec![
                Block::HorizontalRule,
                Block::HorizontalRule,
                Block::Paragraph { text: "--".to_string() },
            ]
        );
    }

    #[test]
    fn test_paragraph_accumulation_and_blank_line() {
        let blocks = segment("line one\nline two\n\nline three\n");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph { text: "line one\nline two".to_string() },
                Block::Paragraph { text: "line three".to_string() },
            ]
        );
    }

    #[test]
    fn test_empty_paragraph_not_emitted() {
        let blocks = segment("\n\n   \n\n");
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_block_start_closes_paragraph() {
        let blocks = segment("text\n## Heading\n");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph { text: "text".to_string() },
                Block::Heading { level: 2, text: "Heading".to_string() },
            ]
        );
    }

    #[test]
    fn test_fence_language_defaults_to_empty() {
        let blocks = segment("```\ncode\n```\n");
        let Block::CodeFence { language, .. } = &blocks[0] else {
            panic!("expected code fence");
        };
        assert!(language.is_empty());
    }

    #[test]
    fn test_block_order_is_preserved() {
        let blocks = segment("## A\npara\n- item\n---\n## B\n");
        assert!(matches!(blocks[0], Block::Heading { .. }));
        assert!(matches!(blocks[1], Block::Paragraph { .. }));
        assert!(matches!(blocks[2], Block::ListItem { .. }));
        assert!(matches!(blocks[3], Block::HorizontalRule));
        assert!(matches!(blocks[4], Block::Heading { .. }));
    }
}
