use crate::date::format_date;
use crate::excerpt::escape_quotes;
use crate::ContentItem;

/// Frontmatter header followed by the body.
///
/// `description` is expected to be escaped already; the title is escaped here.
pub fn build_document(
    item: &ContentItem,
    feature_image: Option<&str>,
    description: &str,
    body: &str,
) -> String {
    let date = item
        .published_at
        .as_ref()
        .map(format_date)
        .unwrap_or_default();
    let frontmatter = format!(
        "---\nid: {id}\ntitle: \"{title}\"\nfeature_image: {feature_image}\ndescription: \"{description}\"\ndate: {date}\ntags: {tags}\nslug: {slug}\nlayout: layouts/{layout}.njk\n---\n\n",
        id = item.id,
        title = escape_quotes(&item.title),
        feature_image = feature_image.unwrap_or_default(),
        description = description,
        date = date,
        tags = item.kind.tag(),
        slug = item.slug,
        layout = item.kind.layout(),
    );
    format!("{frontmatter}{body}\n")
}
