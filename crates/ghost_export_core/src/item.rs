use chrono::{DateTime, Utc};

/// Which backend collection an item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Page,
    Post,
}

impl ContentKind {
    /// Value of the `tags` frontmatter field.
    pub fn tag(self) -> &'static str {
        match self {
            ContentKind::Page => "page",
            ContentKind::Post => "posts",
        }
    }

    /// Layout name referenced as `layouts/<name>.njk`.
    pub fn layout(self) -> &'static str {
        match self {
            ContentKind::Page => "page",
            ContentKind::Post => "post",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Markdown,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
        }
    }
}

/// A page or post as handed to the transformation stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub html: String,
    pub feature_image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub kind: ContentKind,
}

impl ContentItem {
    /// `<slug>.<md|html>`, relative to the output directory.
    pub fn output_filename(&self, format: OutputFormat) -> String {
        format!("{}.{}", self.slug, format.extension())
    }
}
