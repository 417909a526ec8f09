//! Embedded markdown card detection and HTML to Markdown conversion.

use std::sync::LazyLock;

use htmd::element_handler::{HandlerResult, Handlers};
use htmd::options::{CodeBlockStyle, HeadingStyle, Options};
use htmd::{Element, HtmlToMarkdown};
use regex::Regex;

use crate::lint::{self, LintConfig};
use crate::OutputFormat;

pub const MARKDOWN_CARD_BEGIN: &str = "<!--kg-card-begin: markdown-->";
pub const MARKDOWN_CARD_END: &str = "<!--kg-card-end: markdown-->";

static MARKDOWN_CARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "(?s){}(.+?){}",
        regex::escape(MARKDOWN_CARD_BEGIN),
        regex::escape(MARKDOWN_CARD_END)
    ))
    .expect("markdown card pattern is valid")
});

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][^>]*>").expect("html tag pattern is valid"));

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("html to markdown conversion failed: {0}")]
    Html(#[from] std::io::Error),
}

pub trait Converter {
    fn to_markdown(&self, html: &str) -> Result<String, ConversionError>;
}

/// htmd with ATX headings, fenced code and GFM strikethrough/task items,
/// followed by the lint fix pass.
pub struct HtmdConverter {
    inner: HtmlToMarkdown,
    lint: LintConfig,
}

impl HtmdConverter {
    pub fn new() -> Self {
        Self::with_lint_config(LintConfig::default())
    }

    pub fn with_lint_config(lint: LintConfig) -> Self {
        let inner = HtmlToMarkdown::builder()
            .options(Options {
                heading_style: HeadingStyle::Atx,
                code_block_style: CodeBlockStyle::Fenced,
                ..Default::default()
            })
            .add_handler(vec!["del", "s", "strike"], strikethrough_handler)
            .add_handler(vec!["input"], task_checkbox_handler)
            .build();
        Self { inner, lint }
    }
}

impl Default for HtmdConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for HtmdConverter {
    fn to_markdown(&self, html: &str) -> Result<String, ConversionError> {
        let markdown = self.inner.convert(html)?;
        Ok(lint::fix(&markdown, &self.lint).trim().to_string())
    }
}

fn strikethrough_handler(handlers: &dyn Handlers, element: Element) -> Option<HandlerResult> {
    let content = handlers.walk_children(element.node).content;
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    Some(HandlerResult::from(format!("~~{content}~~")))
}

fn task_checkbox_handler(_handlers: &dyn Handlers, element: Element) -> Option<HandlerResult> {
    let is_checkbox = element.attrs.iter().any(|attr| {
        &*attr.name.local == "type" && attr.value.trim().eq_ignore_ascii_case("checkbox")
    });
    if !is_checkbox {
        return Some(HandlerResult::from(String::new()));
    }
    let checked = element.attrs.iter().any(|attr| &*attr.name.local == "checked");
    let marker = if checked { "[x] " } else { "[ ] " };
    Some(HandlerResult::from(marker.to_string()))
}

/// True when the body carries a markdown card opening sentinel.
pub fn contains_markdown_card(html: &str) -> bool {
    html.contains(MARKDOWN_CARD_BEGIN)
}

/// Markdown when the body carries a markdown card or the slug is listed.
pub fn decide_output_format(html: &str, slug: &str, markdown_slugs: &[String]) -> OutputFormat {
    if contains_markdown_card(html) || markdown_slugs.iter().any(|s| s == slug) {
        OutputFormat::Markdown
    } else {
        OutputFormat::Html
    }
}

/// Converts each markdown card on its own and splices the result back into
/// the surrounding HTML. Card content without any element markup is already
/// Markdown and is kept verbatim.
pub fn convert_markdown_cards(
    html: &str,
    converter: &dyn Converter,
) -> Result<String, ConversionError> {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for caps in MARKDOWN_CARD.captures_iter(html) {
        let (Some(card), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&html[last..card.start()]);
        let inner = inner.as_str();
        let markdown = if HTML_TAG.is_match(inner) {
            converter.to_markdown(inner)?
        } else {
            inner.trim().to_string()
        };
        out.push_str("\n\n");
        out.push_str(&markdown);
        out.push_str("\n\n");
        last = card.end();
    }
    out.push_str(&html[last..]);
    Ok(out.trim().to_string())
}
