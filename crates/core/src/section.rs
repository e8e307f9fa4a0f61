//! Section routing: grouping blocks under a fixed section taxonomy.
//!
//! The summarizer is prompted to produce a document with one level-1
//! title heading and level-2 headings drawn from a fixed vocabulary
//! (前言, 项目介绍, 功能亮点, and so on). This module classifies each
//! level-2 heading into a [`SectionKind`] and groups trailing content
//! under the most recent heading. Headings outside the vocabulary are
//! preserved as [`SectionKind::Unknown`] sections.

use serde::Serialize;

use crate::block::Block;

/// The fixed taxonomy of article sections.
///
/// Eight kinds are recognized by heading text; everything else routes to
/// [`SectionKind::Unknown`] with the heading text kept as a free-form
/// title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Opening summary of the project's core value.
    Preface,
    /// Background, goals, and the problem being solved.
    Introduction,
    /// Main capabilities, usually a list.
    Features,
    /// Architecture and performance notes.
    Technical,
    /// Installation steps, usually with code fences.
    Installation,
    /// Usage and configuration, usually with code fences.
    Usage,
    /// Source repository links.
    Repository,
    /// Closing summary and outlook.
    Conclusion,
    /// Any heading not matched by the vocabulary.
    Unknown,
}

impl SectionKind {
    /// The eight recognized kinds, in document order.
    pub const KNOWN: [SectionKind; 8] = [
        SectionKind::Preface,
        SectionKind::Introduction,
        SectionKind::Features,
        SectionKind::Technical,
        SectionKind::Installation,
        SectionKind::Usage,
        SectionKind::Repository,
        SectionKind::Conclusion,
    ];

    /// The canonical Chinese heading for this kind.
    pub fn canonical_title(&self) -> &'static str {
        match self {
            SectionKind::Preface => "前言",
            SectionKind::Introduction => "项目介绍",
            SectionKind::Features => "功能亮点",
            SectionKind::Technical => "技术特点",
            SectionKind::Installation => "安装说明",
            SectionKind::Usage => "使用说明",
            SectionKind::Repository => "项目地址",
            SectionKind::Conclusion => "结语",
            SectionKind::Unknown => "",
        }
    }
}

/// Heading vocabulary, checked in order. An entry matches when the
/// normalized heading text equals it or starts with it, so "安装说明（详细）"
/// still routes to Installation. Longer entries come before their
/// prefixes.
const VOCABULARY: &[(&str, SectionKind)] = &[
    ("前言", SectionKind::Preface),
    ("项目介绍", SectionKind::Introduction),
    ("项目简介", SectionKind::Introduction),
    ("功能亮点", SectionKind::Features),
    ("功能特点", SectionKind::Features),
    ("技术特点", SectionKind::Technical),
    ("技术架构", SectionKind::Technical),
    ("安装说明", SectionKind::Installation),
    ("安装", SectionKind::Installation),
    ("使用说明", SectionKind::Usage),
    ("使用方法", SectionKind::Usage),
    ("项目地址", SectionKind::Repository),
    ("结语", SectionKind::Conclusion),
    ("preface", SectionKind::Preface),
    ("introduction", SectionKind::Introduction),
    ("features", SectionKind::Features),
    ("technical", SectionKind::Technical),
    ("installation", SectionKind::Installation),
    ("install", SectionKind::Installation),
    ("usage", SectionKind::Usage),
    ("repository", SectionKind::Repository),
    ("project address", SectionKind::Repository),
    ("conclusion", SectionKind::Conclusion),
];

/// A named grouping of blocks under one level-2 heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// The heading text as written (canonical title for the implicit
    /// preface).
    pub title: String,
    /// The classified kind.
    pub kind: SectionKind,
    /// The section's content blocks, in document order.
    pub blocks: Vec<Block>,
}

/// The result of routing a block sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    /// Document title from the first level-1 heading, if present.
    pub title: Option<String>,
    /// Subtitle: the first level-2 heading text, if present.
    pub subtitle: Option<String>,
    /// Sections in order of first appearance.
    pub sections: Vec<Section>,
}

/// Classifies a heading against the fixed vocabulary.
///
/// Matching is exact-or-prefix on the trimmed, ASCII-lowercased heading.
/// Near-miss headings are not fuzzy-matched; they become
/// [`SectionKind::Unknown`].
pub fn classify_heading(text: &str) -> SectionKind {
    let normalized = text.trim().to_ascii_lowercase();
    for (name, kind) in VOCABULARY {
        if normalized == *name || normalized.starts_with(name) {
            return *kind;
        }
    }
    SectionKind::Unknown
}

/// Routes an ordered block sequence into ordered sections.
///
/// The first level-1 heading becomes the document title and is not a
/// section. Each level-2 heading opens a section; levels 3-6 stay as
/// content blocks inside the current section. Two headings that map to
/// the same kind merge: the later heading's blocks are appended after the
/// earlier ones, never replacing them. Unknown-kind sections only merge
/// when their titles are identical.
///
/// Content that appears before the first level-2 heading is routed into
/// an implicit Preface section when `capture_preface` is true, and
/// dropped otherwise. The original tool was inconsistent here; capturing
/// is the default.
pub fn route(blocks: &[Block], capture_preface: bool) -> Routed {
    let mut title = None;
    let mut subtitle = None;
    let mut sections: Vec<Section> = Vec::new();
    // Index into `sections` for the section currently receiving blocks.
    let mut current: Option<usize> = None;

    for block in blocks {
        match block {
            Block::Heading { level: 1, text } if title.is_none() => {
                title = Some(text.clone());
            }
            Block::Heading { level: 2, text } => {
                if subtitle.is_none() {
                    subtitle = Some(text.clone());
                }
                let kind = classify_heading(text);
                current = Some(open_section(&mut sections, kind, text));
            }
            _ => {
                let idx = match current {
                    Some(idx) => idx,
                    None if capture_preface => {
                        let idx = open_section(
                            &mut sections,
                            SectionKind::Preface,
                            SectionKind::Preface.canonical_title(),
                        );
                        current = Some(idx);
                        idx
                    }
                    // Leading content dropped by configuration.
                    None => continue,
                };
                sections[idx].blocks.push(block.clone());
            }
        }
    }

    Routed { title, subtitle, sections }
}

/// Find the section this heading merges into, or append a new one.
fn open_section(sections: &mut Vec<Section>, kind: SectionKind, heading: &str) -> usize {
    let existing = sections.iter().position(|s| {
        s.kind == kind && (kind != SectionKind::Unknown || s.title == heading.trim())
    });
    match existing {
        Some(idx) => idx,
        None => {
            sections.push(Section { title: heading.trim().to_string(), kind, blocks: Vec::new() });
            sections.len() - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::segment;

    #[test]
    fn test_classify_vocabulary() {
        assert_eq!(classify_heading("安装说明"), SectionKind::Installation);
        assert_eq!(classify_heading("功能亮点"), SectionKind::Features);
        assert_eq!(classify_heading("结语"), SectionKind::Conclusion);
        assert_eq!(classify_heading("Installation"), SectionKind::Installation);
        assert_eq!(classify_heading("USAGE"), SectionKind::Usage);
        assert_eq!(classify_heading("随便写的标题"), SectionKind::Unknown);
    }

    #[test]
    fn test_classify_prefix_match() {
        assert_eq!(classify_heading("安装说明（详细）"), SectionKind::Installation);
        assert_eq!(classify_heading("Installation Guide"), SectionKind::Installation);
    }

    #[test]
    fn test_title_is_not_a_section() {
        let routed = route(&segment("# Title\n## 安装说明\n- step one\n- step two\n"), true);
        assert_eq!(routed.title, Some("Title".to_string()));
        assert_eq!(routed.sections.len(), 1);
        assert_eq!(routed.sections[0].kind, SectionKind::Installation);
        assert_eq!(routed.sections[0].blocks.len(), 2);
    }

    #[test]
    fn test_subtitle_is_first_level_two_heading() {
        let routed = route(&segment("# T\n## 前言\ntext\n## 结语\nbye\n"), true);
        assert_eq!(routed.subtitle, Some("前言".to_string()));
    }

    #[test]
    fn test_duplicate_kind_merges_in_order() {
        let md = "## 结语\nfirst part\n## 功能亮点\n- a\n## 结语\nsecond part\n";
        let routed = route(&segment(md), true);
        assert_eq!(routed.sections.len(), 2);

        let conclusion = &routed.sections[0];
        assert_eq!(conclusion.kind, SectionKind::Conclusion);
        assert_eq!(
            conclusion.blocks,
            vec![
                Block::Paragraph { text: "first part".to_string() },
                Block::Paragraph { text: "second part".to_string() },
            ]
        );
    }

    #[test]
    fn test_unknown_sections_merge_only_on_same_title() {
        let md = "## 杂项甲\na\n## 杂项乙\nb\n## 杂项甲\nc\n";
        let routed = route(&segment(md), true);
        assert_eq!(routed.sections.len(), 2);
        assert_eq!(routed.sections[0].blocks.len(), 2);
        assert_eq!(routed.sections[1].blocks.len(), 1);
    }

    #[test]
    fn test_leading_content_captured_as_preface() {
        let routed = route(&segment("just some text\n## 结语\nbye\n"), true);
        assert_eq!(routed.sections[0].kind, SectionKind::Preface);
        assert_eq!(routed.sections[0].title, "前言");
        assert_eq!(routed.sections[0].blocks.len(), 1);
    }

    #[test]
    fn test_leading_content_dropped_when_configured() {
        let routed = route(&segment("just some text\n## 结语\nbye\n"), false);
        assert_eq!(routed.sections.len(), 1);
        assert_eq!(routed.sections[0].kind, SectionKind::Conclusion);
    }

    #[test]
    fn test_deep_headings_stay_in_section() {
        let md = "## 使用说明\n### 基本用法\ntext\n";
        let routed = route(&segment(md), true);
        assert_eq!(routed.sections.len(), 1);
        assert_eq!(
            routed.sections[0].blocks[0],
            Block::Heading { level: 3, text: "基本用法".to_string() }
        );
    }

    #[test]
    fn test_explicit_preface_merges_with_implicit() {
        let md = "lead-in\n## 前言\nmore\n";
        let routed = route(&segment(md), true);
        assert_eq!(routed.sections.len(), 1);
        assert_eq!(routed.sections[0].blocks.len(), 2);
    }

    #[test]
    fn test_kinds_unique_unless_merged() {
        let md = "## 前言\na\n## 项目介绍\nb\n## 技术特点\nc\n";
        let routed = route(&segment(md), true);
        let kinds: Vec<_> = routed.sections.iter().map(|s| s.kind).collect();
        let mut deduped = kinds.clone();
        deduped.dedup();
        assert_eq!(kinds, deduped);
        assert_eq!(kinds.len(), 3);
    }
}
