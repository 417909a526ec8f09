use std::sync::LazyLock;

use ego_tree::NodeRef;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use scraper::node::Node;
use scraper::Html;

use crate::OutputFormat;

/// Excerpts longer than this many characters are pruned at a word boundary.
pub const EXCERPT_LENGTH: usize = 140;
const ELLIPSIS: &str = "…";

static MORE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*<!--\s*more\s*-->").expect("more marker pattern is valid")
});

/// Plain-text description of the final body, safe inside a double-quoted
/// frontmatter value. Markdown bodies are rendered first so no Markdown
/// syntax leaks into the text.
pub fn build_excerpt(body: &str, format: OutputFormat) -> String {
    let excerpt = match format {
        OutputFormat::Markdown => excerpt_from_html(&render_markdown(body)),
        OutputFormat::Html => excerpt_from_html(body),
    };
    escape_quotes(&excerpt)
}

pub fn render_markdown(markdown: &str) -> String {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Text before a `<!-- more -->` marker, or the pruned text of the whole
/// fragment when there is none.
pub fn excerpt_from_html(html: &str) -> String {
    if let Some(marker) = MORE_MARKER.find(html) {
        return plain_text(&html[..marker.start()]);
    }
    prune(&plain_text(html), EXCERPT_LENGTH)
}

/// Visible text of an HTML fragment with whitespace collapsed.
pub fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::new();
    for child in fragment.root_element().children() {
        collect_text(child, &mut text);
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escapes `text` for a double-quoted YAML scalar. Backslashes go first so a
/// trailing `\` cannot swallow the closing quote.
pub fn escape_quotes(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => {
            let name = element.name();
            if matches!(name, "script" | "style" | "noscript" | "template") {
                return;
            }
            let block = is_block(name);
            if block {
                out.push(' ');
            }
            for child in node.children() {
                collect_text(child, out);
            }
            if block {
                out.push(' ');
            }
        }
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "br"
            | "li"
            | "ul"
            | "ol"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "blockquote"
            | "pre"
            | "figure"
            | "figcaption"
            | "table"
            | "tr"
            | "td"
            | "th"
            | "section"
            | "article"
            | "hr"
    )
}

fn prune(text: &str, length: usize) -> String {
    if text.chars().count() <= length {
        return text.to_string();
    }
    let head: String = text.chars().take(length + 1).collect();
    let cut = match head.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => &head[..idx],
        _ => {
            let end = head
                .char_indices()
                .nth(length)
                .map_or(head.len(), |(idx, _)| idx);
            &head[..end]
        }
    };
    let cut = cut.trim_end_matches(|c: char| !c.is_alphanumeric());
    format!("{cut}{ELLIPSIS}")
}
