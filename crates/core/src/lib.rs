pub mod article;
pub mod block;
pub mod error;
#[cfg(feature = "net")]
pub mod fetch;
pub mod inline;
pub mod pipeline;
pub mod poster;
#[cfg(feature = "net")]
pub mod publish;
pub mod render;
pub mod sanitize;
pub mod section;
#[cfg(feature = "net")]
pub mod summarize;

pub use article::{DEFAULT_TITLE, RenderedArticle};
pub use block::{Block, segment};
pub use error::{ReposcribeError, Result};
#[cfg(feature = "net")]
pub use fetch::{FetchConfig, ReadmeContent, fetch_readme};
pub use inline::{escape_html, format_inline};
pub use pipeline::{ArticlePipeline, PipelineConfig, PipelineConfigBuilder, render_article};
pub use poster::{LORA_STYLES, PosterCopy};
#[cfg(feature = "net")]
pub use poster::{PosterClient, PosterConfig, PosterRequest};
#[cfg(feature = "net")]
pub use publish::{DraftPublisher, PublishConfig, UploadedImage};
pub use render::{HtmlTemplate, SectionHtml, render_section};
pub use sanitize::{ImageHost, ImageReference, NoopImageHost, SanitizeConfig, sanitize_fragment, sanitize_html};
pub use section::{Routed, Section, SectionKind, route};
#[cfg(feature = "net")]
pub use summarize::{SummarizeConfig, summarize};
