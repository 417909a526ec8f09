//! Named per-item stages. Each stage consumes the previous stage's value and
//! returns a new one; nothing is mutated in place.

use std::collections::HashSet;

use crate::document::build_document;
use crate::excerpt::build_excerpt;
use crate::featured::{promote_leading_image, Promotion};
use crate::images::{ImagePlanner, ImageReference};
use crate::markdown::{
    contains_markdown_card, convert_markdown_cards, decide_output_format, ConversionError,
    Converter,
};
use crate::{ContentItem, OutputFormat};

/// Body and feature image with every image URL rewritten to its local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedContent {
    pub html: String,
    pub feature_image: Option<String>,
}

/// Rewritten content plus the downloads needed to back it.
#[derive(Debug, Clone)]
pub struct LocalizationPlan {
    pub content: LocalizedContent,
    pub downloads: Vec<ImageReference>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub filename: String,
    pub format: OutputFormat,
    pub feature_image: Option<String>,
    pub text: String,
}

/// Plans body and feature image localization for one item.
pub fn plan_localization(planner: &ImagePlanner, item: &ContentItem) -> LocalizationPlan {
    let body_refs = planner.plan(&item.html, &item.slug);
    let html = planner.rewrite(&item.html, &body_refs);

    let feature_ref = item
        .feature_image
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(|url| planner.classify(url, &item.slug));
    let feature_image = match &feature_ref {
        Some(reference) => Some(reference.local_path.clone()),
        None => item.feature_image.clone(),
    };

    let mut seen = HashSet::new();
    let downloads = body_refs
        .into_iter()
        .chain(feature_ref)
        .filter(|reference| seen.insert(reference.matched_text.clone()))
        .collect();

    LocalizationPlan {
        content: LocalizedContent {
            html,
            feature_image,
        },
        downloads,
    }
}

/// Whole-document conversion for listed slugs, then splicing of any
/// embedded markdown cards still present in the result.
pub fn convert_body(
    slug: &str,
    html: String,
    markdown_slugs: &[String],
    converter: &dyn Converter,
) -> Result<String, ConversionError> {
    let body = if markdown_slugs.iter().any(|s| s == slug) {
        converter.to_markdown(&html)?.trim().to_string()
    } else {
        html
    };
    if contains_markdown_card(&body) {
        convert_markdown_cards(&body, converter)
    } else {
        Ok(body)
    }
}

/// Runs format decision, conversion, promotion, excerpt and rendering over
/// already localized content.
pub fn transform_localized(
    item: &ContentItem,
    localized: LocalizedContent,
    markdown_slugs: &[String],
    converter: &dyn Converter,
) -> Result<RenderedDocument, ConversionError> {
    let format = decide_output_format(&localized.html, &item.slug, markdown_slugs);
    let body = convert_body(&item.slug, localized.html, markdown_slugs, converter)?;
    let Promotion {
        body,
        feature_image,
    } = promote_leading_image(format, body, localized.feature_image);
    let description = build_excerpt(&body, format);
    let text = build_document(item, feature_image.as_deref(), &description, &body);

    Ok(RenderedDocument {
        filename: item.output_filename(format),
        format,
        feature_image,
        text,
    })
}
