//! Ghost export core: pure transformation stages for one content item.
mod date;
mod document;
mod excerpt;
mod featured;
mod images;
mod item;
pub mod lint;
mod markdown;
mod pipeline;

pub use date::format_date;
pub use document::build_document;
pub use excerpt::{
    build_excerpt, escape_quotes, excerpt_from_html, plain_text, render_markdown, EXCERPT_LENGTH,
};
pub use featured::{promote_leading_image, Promotion};
pub use images::{ImagePlanner, ImageReference, LOCAL_IMAGE_PREFIX};
pub use item::{ContentItem, ContentKind, OutputFormat};
pub use lint::{LintConfig, Rule};
pub use markdown::{
    contains_markdown_card, convert_markdown_cards, decide_output_format, ConversionError,
    Converter, HtmdConverter, MARKDOWN_CARD_BEGIN, MARKDOWN_CARD_END,
};
pub use pipeline::{
    convert_body, plan_localization, transform_localized, LocalizationPlan, LocalizedContent,
    RenderedDocument,
};
