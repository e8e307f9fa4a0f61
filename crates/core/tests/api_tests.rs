//! Library API integration tests
use reposcribe_core::*;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn fixture_article() -> String {
    std::fs::read_to_string(get_fixture_path("article.md")).unwrap()
}

#[test]
fn test_render_article_api() {
    let article = render_article(&fixture_article()).expect("should render");
    assert_eq!(article.title, "ripgrep：更快的代码搜索工具");
    assert_eq!(article.subtitle, "前言");
    assert!(!article.sections.preface.is_empty());
    assert!(!article.sections.introduction.is_empty());
    assert!(!article.sections.features.is_empty());
    assert!(!article.sections.technical.is_empty());
    assert!(!article.sections.installation.is_empty());
    assert!(!article.sections.usage.is_empty());
    assert!(!article.sections.repository.is_empty());
    assert!(!article.sections.conclusion.is_empty());
}

#[test]
fn test_code_fences_survive_untouched() {
    let article = render_article(&fixture_article()).expect("should render");
    assert!(article.sections.installation.contains("cargo install ripgrep"));
    assert!(article.sections.usage.contains(r#"rg "fn main" src/"#));
    // Fence content is never run through inline formatting.
    assert!(!article.sections.usage.contains("<strong>fn main</strong>"));
}

#[test]
fn test_inline_formatting_applied() {
    let article = render_article(&fixture_article()).expect("should render");
    assert!(article.sections.preface.contains("<strong>ripgrep</strong>"));
    assert!(article.sections.features.contains("<em>.gitignore</em>"));
    assert!(article.sections.technical.contains("grep-regex"));
    assert!(article.sections.technical.contains("<code"));
}

#[test]
fn test_repository_section_links() {
    let article = render_article(&fixture_article()).expect("should render");
    assert!(
        article
            .sections
            .repository
            .contains(r#"<a href="https://github.com/BurntSushi/ripgrep""#)
    );
    assert!(article.sections.repository.contains("官方文档"));
}

#[test]
fn test_image_rendered_with_caption() {
    let article = render_article(&fixture_article()).expect("should render");
    assert!(article.sections.introduction.contains("images/architecture.png"));
    assert!(article.sections.introduction.contains("架构示意"));
}

#[test]
fn test_document_template() {
    let article = render_article(&fixture_article()).expect("should render");
    let doc = article.to_html_document();
    assert!(doc.starts_with("<!DOCTYPE html>"));
    assert!(doc.contains("<title>ripgrep：更快的代码搜索工具</title>"));
    assert!(doc.contains("</html>"));
    // Section order in the document follows the fixed kind order.
    let preface = doc.find("高频操作").unwrap();
    let conclusion = doc.find("最常用的工具").unwrap();
    assert!(preface < conclusion);
}

#[test]
fn test_article_json() {
    let article = render_article(&fixture_article()).expect("should render");
    let json = article.to_json().unwrap();
    assert!(json.is_object());
    assert_eq!(json["title"], "ripgrep：更快的代码搜索工具");
    assert!(json["sections"]["preface"].as_str().is_some());
}

#[test]
fn test_pipeline_with_custom_config() {
    let pipeline = ArticlePipeline::with_config(
        PipelineConfig::builder()
            .author("测试作者")
            .timestamp("2024-05-01 12:00")
            .build(),
    );
    let article = pipeline.render(&fixture_article()).expect("should render");
    assert_eq!(article.author, "测试作者");
    assert_eq!(article.timestamp, "2024-05-01 12:00");
    assert!(article.to_html_document().contains("测试作者 · 2024-05-01 12:00"));
}

#[test]
fn test_poster_copy_from_fixture() {
    let copy = PosterCopy::extract(&fixture_article());
    assert_eq!(copy.title, "ripgrep：更快的代码搜索工具");
    assert_eq!(copy.subtitle, "前言");
    assert!(copy.body.chars().count() <= 50);
    assert!(copy.body.contains("搜索代码"));
}

#[tokio::test]
async fn test_render_with_host_api() {
    struct PrefixHost;
    impl ImageHost for PrefixHost {
        async fn host(&self, src: &str) -> Result<String> {
            Ok(format!("https://mmbiz.example.com/{src}"))
        }
    }

    let article = ArticlePipeline::new()
        .render_with_host(&fixture_article(), &PrefixHost)
        .await
        .expect("should render");
    assert!(
        article
            .sections
            .introduction
            .contains("https://mmbiz.example.com/images/architecture.png")
    );
}

#[test]
fn test_segment_and_route_api() {
    let blocks = segment(&fixture_article());
    assert!(!blocks.is_empty());
    let routed = route(&blocks, true);
    assert_eq!(routed.title.as_deref(), Some("ripgrep：更快的代码搜索工具"));
    assert_eq!(routed.sections.len(), 8);
    assert!(routed.sections.iter().all(|s| s.kind != SectionKind::Unknown));
}
