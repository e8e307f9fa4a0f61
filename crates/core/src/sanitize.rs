//! HTML sanitization for the publishing platform's tag whitelist.
//!
//! The draft API rejects scripts, styles, frames, form controls, `<link>`
//! elements, and HTML comments; this module strips all of them with a
//! streaming rewriter. It also rewrites `<img>` elements whose `src` is a
//! local or relative path through an injected [`ImageHost`] capability,
//! removing the element outright when hosting fails so no broken
//! reference survives, and inserting a caption paragraph after any image
//! that carries alt text.
//!
//! Output is deterministic: identical input plus identical host responses
//! yields byte-identical HTML.

use std::collections::HashMap;

use lol_html::html_content::ContentType;
use lol_html::{HtmlRewriter, Settings, doc_comments, element};

use crate::inline::escape_html;
use crate::{ReposcribeError, Result};

/// Capability for hosting a local image and returning a public URL.
///
/// Implemented by the draft publisher (platform media upload) and by
/// [`NoopImageHost`] for the pure, network-free render path.
pub trait ImageHost {
    /// Hosts the image at `src` and returns a publicly resolvable URL.
    async fn host(&self, src: &str) -> Result<String>;
}

/// Host that leaves every source untouched.
///
/// Used when rendering locally without a publishing platform; local
/// image paths pass through unchanged.
pub struct NoopImageHost;

impl ImageHost for NoopImageHost {
    async fn host(&self, src: &str) -> Result<String> {
        Ok(src.to_string())
    }
}

/// Configuration for HTML sanitization.
#[derive(Debug, Clone)]
pub struct SanitizeConfig {
    /// Whether to remove script tags.
    pub remove_scripts: bool,
    /// Whether to remove style tags.
    pub remove_styles: bool,
    /// Whether to remove iframe tags.
    pub remove_iframes: bool,
    /// Whether to remove form, input, and button tags.
    pub remove_forms: bool,
    /// Whether to remove link tags.
    pub remove_links: bool,
    /// Whether to remove HTML comments.
    pub remove_comments: bool,
    /// Whether to rewrite local image paths through the image host.
    pub rehost_local_images: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            remove_scripts: true,
            remove_styles: true,
            remove_iframes: true,
            remove_forms: true,
            remove_links: true,
            remove_comments: true,
            rehost_local_images: true,
        }
    }
}

/// A discovered image reference: alt text plus source path or URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Alt text, possibly empty.
    pub alt: String,
    /// The `src` attribute as found.
    pub src: String,
}

impl ImageReference {
    /// A source is local when it is not an absolute `http(s)` URL.
    pub fn is_local(&self) -> bool {
        !self.src.starts_with("http://") && !self.src.starts_with("https://")
    }
}

/// Sanitizes an HTML fragment for the publishing platform.
///
/// Local images are hosted through `host` sequentially, in document
/// order; a failed upload removes the image element. Every image with
/// non-empty alt text gets a caption paragraph inserted after it,
/// whether or not the upload succeeded.
pub async fn sanitize_html<H: ImageHost>(html: &str, config: &SanitizeConfig, host: &H) -> Result<String> {
    let images = collect_images(html)?;

    // Resolve hosting once per distinct source, in first-appearance
    // order. None marks a failed upload.
    let mut hosted: HashMap<String, Option<String>> = HashMap::new();
    if config.rehost_local_images {
        for image in &images {
            if image.is_local() && !hosted.contains_key(&image.src) {
                let result = host.host(&image.src).await.ok();
                hosted.insert(image.src.clone(), result);
            }
        }
    }

    rewrite(html, config, &hosted)
}

/// Synchronous sanitization without image hosting.
///
/// Disallowed tags and comments are stripped; image sources are left
/// untouched. This is the pure path used when rendering locally with no
/// publishing platform in play.
pub fn sanitize_fragment(html: &str, config: &SanitizeConfig) -> Result<String> {
    rewrite(html, config, &HashMap::new())
}

/// Scan pass: collect every `<img>` alt/src pair without producing output.
pub fn collect_images(html: &str) -> Result<Vec<ImageReference>> {
    let mut images = Vec::new();
    {
        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![element!("img", |el| {
                    images.push(ImageReference {
                        alt: el.get_attribute("alt").unwrap_or_default(),
                        src: el.get_attribute("src").unwrap_or_default(),
                    });
                    Ok(())
                })],
                ..Settings::default()
            },
            |_: &[u8]| {},
        );

        rewriter
            .write(html.as_bytes())
            .and_then(|_| rewriter.end())
            .map_err(|e| ReposcribeError::Sanitize(e.to_string()))?;
    }
    Ok(images)
}

/// Rewrite pass: strip disallowed content and apply the hosting map.
fn rewrite(html: &str, config: &SanitizeConfig, hosted: &HashMap<String, Option<String>>) -> Result<String> {
    let mut output = String::new();
    {
        let mut handlers = vec![
            if config.remove_scripts {
                Some(element!("script", |el| {
                    el.remove();
                    Ok(())
                }))
            } else {
                None
            },
            if config.remove_styles {
                Some(element!("style", |el| {
                    el.remove();
                    Ok(())
                }))
            } else {
                None
            },
            if config.remove_iframes {
                Some(element!("iframe", |el| {
                    el.remove();
                    Ok(())
                }))
            } else {
                None
            },
            if config.remove_links {
                Some(element!("link", |el| {
                    el.remove();
                    Ok(())
                }))
            } else {
                None
            },
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

        if config.remove_forms {
            for tag in ["form", "input", "button"] {
                handlers.push(element!(tag, |el| {
                    el.remove();
                    Ok(())
                }));
            }
        }

        handlers.push(element!("img", |el| {
            let alt = el.get_attribute("alt").unwrap_or_default();
            let src = el.get_attribute("src").unwrap_or_default();

            if !alt.is_empty() {
                el.after(
                    &format!(
                        r#"<p style="text-align: center; color: #666; font-size: 14px;">{}</p>"#,
                        escape_html(&alt)
                    ),
                    ContentType::Html,
                );
            }

            match hosted.get(&src) {
                Some(Some(url)) => {
                    el.set_attribute("src", url).ok();
                }
                Some(None) => el.remove(),
                // Remote image, or rehosting disabled.
                None => {}
            }
            Ok(())
        }));

        let mut rewriter = HtmlRewriter::new(
            Settings {
                document_content_handlers: if config.remove_comments {
                    vec![doc_comments!(|c| {
                        c.remove();
                        Ok(())
                    })]
                } else {
                    vec![]
                },
                element_content_handlers: handlers,
                ..Settings::default()
            },
            |c: &[u8]| {
                output.push_str(&String::from_utf8_lossy(c));
            },
        );

        rewriter
            .write(html.as_bytes())
            .and_then(|_| rewriter.end())
            .map_err(|e| ReposcribeError::Sanitize(e.to_string()))?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Host that maps any local path to a fixed remote URL.
    struct FixedHost;

    impl ImageHost for FixedHost {
        async fn host(&self, src: &str) -> Result<String> {
            Ok(format!("https://cdn.example.com/{src}"))
        }
    }

    /// Host that always fails.
    struct FailingHost;

    impl ImageHost for FailingHost {
        async fn host(&self, _src: &str) -> Result<String> {
            Err(ReposcribeError::Upload("unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_removes_disallowed_tags() {
        let html = r#"<p>keep</p><script>alert(1)</script><style>p{}</style><iframe src="x"></iframe><form><input><button>b</button></form><link rel="stylesheet">"#;
        let out = sanitize_html(html, &SanitizeConfig::default(), &NoopImageHost).await.unwrap();
        assert!(out.contains("<p>keep</p>"));
        assert!(!out.contains("<script"));
        assert!(!out.contains("<style"));
        assert!(!out.contains("<iframe"));
        assert!(!out.contains("<form"));
        assert!(!out.contains("<input"));
        assert!(!out.contains("<button"));
        assert!(!out.contains("<link"));
        assert!(!out.contains("alert"));
    }

    #[tokio::test]
    async fn test_removes_comments() {
        let html = "<p>a</p><!-- secret --><p>b</p>";
        let out = sanitize_html(html, &SanitizeConfig::default(), &NoopImageHost).await.unwrap();
        assert!(!out.contains("<!--"));
        assert!(!out.contains("secret"));
        assert!(out.contains("<p>a</p><p>b</p>"));
    }

    #[tokio::test]
    async fn test_local_image_rehosted() {
        let html = r#"<img src="images/foo.png" alt="">"#;
        let out = sanitize_html(html, &SanitizeConfig::default(), &FixedHost).await.unwrap();
        assert!(out.contains(r#"src="https://cdn.example.com/images/foo.png""#));
    }

    #[tokio::test]
    async fn test_failed_upload_removes_image() {
        let html = r#"<p>before</p><img src="images/foo.png" alt=""><p>after</p>"#;
        let out = sanitize_html(html, &SanitizeConfig::default(), &FailingHost).await.unwrap();
        assert!(!out.contains("<img"));
        assert!(!out.contains("images/foo.png"));
        assert!(out.contains("before"));
        assert!(out.contains("after"));
    }

    #[tokio::test]
    async fn test_caption_inserted_even_when_upload_fails() {
        let html = r#"<img src="images/foo.png" alt="架构图">"#;
        let out = sanitize_html(html, &SanitizeConfig::default(), &FailingHost).await.unwrap();
        assert!(!out.contains("<img"));
        assert!(out.contains("架构图</p>"));
    }

    #[tokio::test]
    async fn test_caption_inserted_for_remote_image() {
        let html = r#"<img src="https://example.com/a.png" alt="diagram">"#;
        let out = sanitize_html(html, &SanitizeConfig::default(), &NoopImageHost).await.unwrap();
        assert!(out.contains("<img"));
        assert!(out.contains("diagram</p>"));
    }

    #[tokio::test]
    async fn test_remote_image_untouched() {
        let html = r#"<img src="https://example.com/a.png" alt="">"#;
        let out = sanitize_html(html, &SanitizeConfig::default(), &FixedHost).await.unwrap();
        assert!(out.contains(r#"src="https://example.com/a.png""#));
    }

    #[tokio::test]
    async fn test_deterministic_output() {
        let html = r#"<img src="images/a.png" alt="x"><img src="images/b.png" alt="y"><!-- c -->"#;
        let first = sanitize_html(html, &SanitizeConfig::default(), &FixedHost).await.unwrap();
        let second = sanitize_html(html, &SanitizeConfig::default(), &FixedHost).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_collect_images_order() {
        let html = r#"<img src="a.png" alt="one"><p>x</p><img src="https://h/b.png" alt="two">"#;
        let images = collect_images(html).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].src, "a.png");
        assert!(images[0].is_local());
        assert!(!images[1].is_local());
    }

    #[test]
    fn test_image_reference_locality() {
        let local = ImageReference { alt: String::new(), src: "images/foo.png".to_string() };
        let rooted = ImageReference { alt: String::new(), src: "/var/img.png".to_string() };
        let remote = ImageReference { alt: String::new(), src: "https://e.com/i.png".to_string() };
        assert!(local.is_local());
        assert!(rooted.is_local());
        assert!(!remote.is_local());
    }
}
