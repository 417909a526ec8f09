use std::sync::LazyLock;

use regex::Regex;

use crate::OutputFormat;

static LEADING_MARKDOWN_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^!\[[^\]]*\]\(\s*([^)\s]*)(?:\s+"[^"]*")?\s*\)"#)
        .expect("leading image pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub body: String,
    pub feature_image: Option<String>,
}

/// Moves a leading Markdown image into the featured image slot.
///
/// Only Markdown output without an existing featured image is touched.
pub fn promote_leading_image(
    format: OutputFormat,
    body: String,
    feature_image: Option<String>,
) -> Promotion {
    let has_feature = feature_image.as_deref().is_some_and(|url| !url.is_empty());
    if format != OutputFormat::Markdown || has_feature {
        return Promotion {
            body,
            feature_image,
        };
    }

    let leading = LEADING_MARKDOWN_IMAGE
        .captures(&body)
        .map(|caps| (caps[1].to_string(), caps[0].len()));
    match leading {
        Some((url, markup_len)) => Promotion {
            body: body[markup_len..].trim().to_string(),
            feature_image: Some(url),
        },
        None => Promotion {
            body,
            feature_image,
        },
    }
}
