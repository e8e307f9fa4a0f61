use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use reposcribe_core::{
    ArticlePipeline, DraftPublisher, FetchConfig, LORA_STYLES, PipelineConfig, PosterClient, PosterConfig,
    PosterCopy, PosterRequest, PublishConfig, RenderedArticle, SummarizeConfig, fetch_readme, summarize,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Turn a project README into a published article
#[derive(Parser, Debug)]
#[command(name = "reposcribe")]
#[command(author = "Reposcribe Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Turn a project README into a publish-ready article", long_about = None)]
struct Args {
    /// Repository URL, raw README URL, local Markdown file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output HTML file
    #[arg(short, long, default_value = "output.html", value_name = "FILE")]
    output: PathBuf,

    /// Treat the input as an already-summarized article, skipping fetch
    /// and summarization
    #[arg(long)]
    from_article: bool,

    /// Skip publishing to the official account
    #[arg(long)]
    no_publish: bool,

    /// Skip cover poster generation
    #[arg(long)]
    no_poster: bool,

    /// Create the draft but do not submit it for publication
    #[arg(long)]
    test: bool,

    /// Author byline (overrides AUTHOR_NAME)
    #[arg(long, value_name = "NAME")]
    author: Option<String>,

    /// HTTP timeout in seconds for README fetching
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Enable progress output
    #[arg(short, long)]
    verbose: bool,
}

/// Print a styled banner for verbose mode
fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Reposcribe".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Turn a project README into a publish-ready article".dimmed());
    eprintln!();
}

/// Print a styled step message
fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Current local time as "YYYY-MM-DD HH:MM", falling back to UTC when
/// the local offset cannot be determined.
fn render_timestamp() -> String {
    let format = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]");
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(&format).unwrap_or_default()
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_flag_disabled(key: &str) -> bool {
    matches!(
        std::env::var(key).unwrap_or_default().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// Obtain article Markdown: from a file or stdin when `--from-article`,
/// otherwise fetch the README and summarize it.
async fn obtain_article(args: &Args, total: usize) -> anyhow::Result<String> {
    if args.from_article {
        if args.verbose {
            print_step(1, total, "Reading article Markdown");
        }
        let content = if args.input == "-" {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            buffer
        } else {
            fs::read_to_string(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?
        };
        return Ok(content);
    }

    if args.verbose {
        print_step(1, total, &format!("Fetching README from {}", args.input.bright_white().underline()));
    }
    let readme = if args.input.starts_with("http://") || args.input.starts_with("https://") {
        let config = FetchConfig { timeout: args.timeout, ..FetchConfig::default() };
        fetch_readme(&args.input, &config)
            .await
            .context("Failed to fetch README")?
            .markdown
    } else {
        fs::read_to_string(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?
    };

    if args.verbose {
        print_step(2, total, "Summarizing README");
    }
    let config = SummarizeConfig {
        api_base: env_nonempty("OPENAI_API_BASE").unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
        api_key: env_nonempty("OPENAI_API_KEY").unwrap_or_default(),
        model: env_nonempty("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
        ..SummarizeConfig::default()
    };
    summarize(&readme, &config).await.context("Failed to summarize README")
}

/// Generate a cover poster and upload it as the draft thumbnail,
/// returning the material id. Poster failures degrade to no thumbnail.
async fn poster_thumbnail(markdown: &str, publisher: &DraftPublisher, verbose: bool) -> Option<String> {
    let api_key = env_nonempty("DASHSCOPE_API_KEY")?;

    let client = match PosterClient::new(PosterConfig { api_key, ..PosterConfig::default() }) {
        Ok(client) => client,
        Err(e) => {
            print_warning(&format!("Poster client unavailable: {e}"));
            return None;
        }
    };

    let copy = PosterCopy::extract(markdown);
    let lora_name = env_nonempty("POSTER_LORA_NAME").unwrap_or_else(|| {
        use rand::seq::IndexedRandom;
        LORA_STYLES
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or("2D插画1")
            .to_string()
    });
    let request = PosterRequest {
        prompt: format!("科技感插画，主题：{}", copy.title),
        copy,
        wh_ratio: env_nonempty("POSTER_WH_RATIOS").unwrap_or_else(|| "竖版".to_string()),
        lora_name,
    };

    if verbose {
        print_info(&format!("Poster style: {}", request.lora_name));
    }

    let poster_url = match client.generate(&request).await {
        Ok(url) => url,
        Err(e) => {
            print_warning(&format!("Poster generation failed: {e}"));
            return None;
        }
    };

    match publisher.upload_material(&poster_url).await {
        Ok(uploaded) => Some(uploaded.media_id),
        Err(e) => {
            print_warning(&format!("Poster upload failed: {e}"));
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        print_banner();
    }

    let publishing = !args.no_publish && !env_flag_disabled("PUBLISH_TO_WEIXIN");
    let total = if args.from_article { 3 } else { 4 };

    let markdown = obtain_article(&args, total).await?;

    let author = args
        .author
        .clone()
        .or_else(|| env_nonempty("AUTHOR_NAME"))
        .unwrap_or_else(|| "AI助手".to_string());
    let pipeline = ArticlePipeline::with_config(
        PipelineConfig::builder()
            .author(author)
            .timestamp(render_timestamp())
            .build(),
    );

    if args.verbose {
        print_step(total - 1, total, "Rendering article HTML");
    }

    let publisher = if publishing {
        let config = PublishConfig {
            app_id: env_nonempty("WEIXIN_APP_ID").unwrap_or_default(),
            app_secret: env_nonempty("WEIXIN_APP_SECRET").unwrap_or_default(),
            ..PublishConfig::default()
        };
        match DraftPublisher::new(config) {
            Ok(publisher) => Some(publisher),
            Err(e) => {
                print_warning(&format!("Publishing disabled: {e}"));
                None
            }
        }
    } else {
        None
    };

    let article: RenderedArticle = match &publisher {
        Some(publisher) => pipeline
            .render_with_host(&markdown, publisher)
            .await
            .context("Failed to render article")?,
        None => pipeline.render(&markdown).context("Failed to render article")?,
    };
    let html = article.to_html_document();

    fs::write(&args.output, &html)
        .with_context(|| format!("Failed to write to file: {}", args.output.display()))?;
    print_success(&format!("Article written to {}", args.output.display().bright_white()));

    let Some(publisher) = publisher else {
        return Ok(());
    };

    if args.verbose {
        print_step(total, total, "Publishing draft");
    }

    let thumb = if args.no_poster {
        None
    } else {
        poster_thumbnail(&markdown, &publisher, args.verbose).await
    };

    let media_id = publisher
        .create_draft(&article.title, &html, &article.author, thumb.as_deref())
        .await
        .context("Failed to create draft")?;
    print_success(&format!("Draft created: {}", media_id.bright_white()));

    if args.test {
        print_info("Test mode: draft left unsubmitted");
        return Ok(());
    }

    let publish_id = publisher.publish_draft(&media_id).await.context("Failed to submit draft")?;
    print_success(&format!("Submitted for publication: {}", publish_id.bright_white()));

    Ok(())
}
