//! Inline Markdown formatting within a single text run.
//!
//! Converts emphasis, inline code, links, images, and bare URLs into
//! HTML. The conversion is an explicit ordered list of passes
//! ([`PASSES`]); ordering is load-bearing because the patterns overlap,
//! and each pass records why it sits where it does. Inline code spans are
//! extracted to placeholders before any pass runs and restored afterward,
//! so code content is never touched by the other rules.
//!
//! Running the formatter on its own output is a no-op: every pass
//! consumes the Markdown syntax it matches, and the autolink pass skips
//! URLs that already sit inside an attribute or an anchor body.

use regex::Regex;

/// One inline transformation pass.
pub struct Pass {
    /// Short rule name, used in tests and docs.
    pub name: &'static str,
    /// Why the pass holds this position in the order.
    pub precedence: &'static str,
    apply: fn(&str) -> String,
}

/// The ordered inline rule list. Applied top to bottom.
pub const PASSES: &[Pass] = &[
    Pass {
        name: "image",
        precedence: "before links: `![alt](url)` is a superset of the link syntax and \
                     would otherwise be half-consumed as a link",
        apply: pass_image,
    },
    Pass {
        name: "link",
        precedence: "before autolink: a Markdown link's URL must end up in the href, \
                     not wrapped a second time",
        apply: pass_link,
    },
    Pass {
        name: "autolink",
        precedence: "after links and images so only bare URLs remain; the boundary \
                     guard skips URLs inside attributes and anchor bodies",
        apply: pass_autolink,
    },
    Pass {
        name: "bold",
        precedence: "before italic: the italic pattern would otherwise consume half \
                     of a `**` marker pair",
        apply: pass_bold,
    },
    Pass {
        name: "italic",
        precedence: "last: by now every `**` pair is gone, so a single `*` pair is \
                     unambiguous",
        apply: pass_italic,
    },
];

const CODE_STYLE: &str = "background-color: #f6f8fa; padding: 2px 5px; border-radius: 3px; \
                          font-family: Consolas, Monaco, 'Andale Mono', monospace; font-size: 14px;";
const LINK_STYLE: &str = "color: #0366d6; text-decoration: none; word-break: break-all;";

// Private-use sentinels for extracted code spans. They cannot appear in
// the Markdown the upstream model produces.
const CODE_OPEN: char = '\u{e000}';
const CODE_CLOSE: char = '\u{e001}';

/// Formats a single text run (no block-level separators) into HTML.
///
/// Unmatched single markers (a lone `*` or backtick) are left as literal
/// characters; no input causes an error.
///
/// # Example
///
/// ```rust
/// use reposcribe_core::inline::format_inline;
///
/// let html = format_inline("**bold *and italic* text**");
/// assert_eq!(html, "<strong>bold <em>and italic</em> text</strong>");
/// ```
pub fn format_inline(text: &str) -> String {
    let (mut out, code_spans) = extract_code_spans(text);
    for pass in PASSES {
        out = (pass.apply)(&out);
    }
    restore_code_spans(&out, &code_spans)
}

/// Pull `` `code` `` spans out into sentinel-delimited indices so the
/// other passes cannot see their content.
fn extract_code_spans(text: &str) -> (String, Vec<String>) {
    let re = Regex::new(r"`([^`\n]+)`").unwrap();
    let mut spans = Vec::new();
    let replaced = re
        .replace_all(text, |caps: &regex::Captures| {
            spans.push(caps[1].to_string());
            format!("{}{}{}", CODE_OPEN, spans.len() - 1, CODE_CLOSE)
        })
        .to_string();
    (replaced, spans)
}

/// Re-insert extracted code spans as styled `<code>` elements.
fn restore_code_spans(text: &str, spans: &[String]) -> String {
    let re = Regex::new(&format!("{CODE_OPEN}(\\d+){CODE_CLOSE}")).unwrap();
    re.replace_all(text, |caps: &regex::Captures| {
        let idx: usize = caps[1].parse().unwrap_or(0);
        let content = spans.get(idx).map(String::as_str).unwrap_or("");
        format!(r#"<code style="{}">{}</code>"#, CODE_STYLE, escape_html(content))
    })
    .to_string()
}

/// `![alt](url)` becomes a centered image container with a caption
/// sourced from the alt text.
fn pass_image(text: &str) -> String {
    let re = Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap();
    re.replace_all(text, |caps: &regex::Captures| {
        let alt = &caps[1];
        let url = &caps[2];
        format!(
            r#"<div class="image-container" style="margin: 20px 0; text-align: center;"><img src="{url}" alt="{alt}" class="content-image" style="max-width: 100%; height: auto; margin-bottom: 10px;"><div class="image-caption" style="font-size: 14px; color: #666; text-align: center;">{alt}</div></div>"#
        )
    })
    .to_string()
}

/// `[text](url)` becomes an anchor opening in a new context.
fn pass_link(text: &str) -> String {
    let re = Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap();
    re.replace_all(text, |caps: &regex::Captures| {
        let label = &caps[1];
        let url = &caps[2];
        format!(r#"<a href="{url}" target="_blank" style="{LINK_STYLE}">{label}</a>"#)
    })
    .to_string()
}

/// Bare `http(s)://` URLs become anchors.
///
/// The leading boundary group rejects URLs preceded by `"`, `'`, `=`, `>`
/// or a word character, which is exactly the set of positions produced by
/// an earlier conversion (`href="..."`, `>url</a>`). This is what makes
/// the pass idempotent.
fn pass_autolink(text: &str) -> String {
    let re = Regex::new(r#"(?m)(^|[^"'=>\w])(https?://[^\s<>"']+)"#).unwrap();
    re.replace_all(text, |caps: &regex::Captures| {
        let pre = &caps[1];
        let url = &caps[2];
        format!(r#"{pre}<a href="{url}" target="_blank" style="{LINK_STYLE}">{url}</a>"#)
    })
    .to_string()
}

/// `**text**` becomes `<strong>`; non-greedy and single-line.
fn pass_bold(text: &str) -> String {
    let re = Regex::new(r"\*\*([^\n]+?)\*\*").unwrap();
    re.replace_all(text, "<strong>$1</strong>").to_string()
}

/// `*text*` becomes `<em>`. Content excludes `*` so a stray half of an
/// unmatched bold marker stays literal instead of being swallowed.
fn pass_italic(text: &str) -> String {
    let re = Regex::new(r"\*([^*\n]+?)\*").unwrap();
    re.replace_all(text, "<em>$1</em>").to_string()
}

/// Minimal HTML escaping for text placed inside code elements.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_bold_then_italic_nesting() {
        assert_eq!(
            format_inline("**bold *and italic* text**"),
            "<strong>bold <em>and italic</em> text</strong>"
        );
    }

    #[test]
    fn test_bold_does_not_cross_newlines() {
        let out = format_inline("**line\nbreak**");
        assert!(!out.contains("<strong>"));
        assert!(out.contains("**line"));
    }

    #[test]
    fn test_unmatched_markers_stay_literal() {
        assert_eq!(format_inline("a * b"), "a * b");
        assert_eq!(format_inline("tick ` alone"), "tick ` alone");
    }

    #[test]
    fn test_stray_bold_marker_not_swallowed_by_italic() {
        let out = format_inline("**x*");
        assert!(out.starts_with('*'));
        assert!(out.contains("<em>x</em>"));
    }

    #[test]
    fn test_link_conversion() {
        let out = format_inline("see [docs](https://example.com/docs)");
        assert!(out.contains(r#"<a href="https://example.com/docs" target="_blank""#));
        assert!(out.contains(">docs</a>"));
    }

    #[test]
    fn test_image_conversion_with_caption() {
        let out = format_inline("![架构图](images/arch.png)");
        assert!(out.contains(r#"<img src="images/arch.png" alt="架构图""#));
        assert!(out.contains(r#"<div class="image-caption""#));
        assert!(out.contains("架构图</div>"));
    }

    #[test]
    fn test_image_not_consumed_as_link() {
        let out = format_inline("![alt](u.png)");
        assert!(!out.contains("target=\"_blank\">alt</a>"));
        assert!(out.contains("<img"));
    }

    #[test]
    fn test_autolink_bare_url() {
        let out = format_inline("repo: https://github.com/a/b");
        assert!(out.contains(r#"<a href="https://github.com/a/b""#));
    }

    #[test]
    fn test_autolink_at_line_start() {
        let out = format_inline("https://github.com/a/b");
        assert!(out.starts_with("<a href="));
    }

    #[test]
    fn test_markdown_link_not_double_wrapped() {
        let out = format_inline("[here](https://example.com)");
        assert_eq!(out.matches("<a ").count(), 1);
    }

    #[test]
    fn test_inline_code_protected_from_all_passes() {
        let out = format_inline("run `cargo build --release` and `**not bold**`");
        assert!(out.contains("cargo build --release"));
        assert!(out.contains("**not bold**"));
        assert!(!out.contains("<strong>"));
        assert_eq!(out.matches("<code").count(), 2);
    }

    #[test]
    fn test_inline_code_content_escaped() {
        let out = format_inline("`a < b && c > d`");
        assert!(out.contains("a &lt; b &amp;&amp; c &gt; d"));
    }

    #[rstest]
    #[case("**bold** and *italic*")]
    #[case("see [docs](https://example.com) or https://github.com/a/b")]
    #[case("![img](images/x.png) with `code < span`")]
    #[case("**bold *nested* text** plus https://a.cn/p?q=1")]
    fn test_double_application_is_idempotent(#[case] input: &str) {
        let once = format_inline(input);
        let twice = format_inline(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_pass_order_is_documented() {
        let names: Vec<_> = PASSES.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["image", "link", "autolink", "bold", "italic"]);
        assert!(PASSES.iter().all(|p| !p.precedence.is_empty()));
    }
}
