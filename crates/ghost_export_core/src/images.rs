//! Image reference scanning and local path planning.
//!
//! Detection is a textual heuristic over the raw HTML, not a parse: any
//! URL-shaped substring ending in an image extension is picked up, whether it
//! sits in a `src` attribute, a `srcset` list or an inline style.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

/// Root-relative prefix every localized image path starts with.
pub const LOCAL_IMAGE_PREFIX: &str = "/content/images/";

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:https?:)?//[^"'\s<>()]*\.(?:png|jpe?g|gif|svg)\b"#)
        .expect("image url pattern is valid")
});

/// Sentence punctuation that may follow a bare URL in running text.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// One image URL found in an item and the root-relative path it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub matched_text: String,
    pub is_site_hosted: bool,
    pub local_path: String,
}

impl ImageReference {
    /// Where the downloaded bytes belong, relative to the output directory.
    pub fn destination(&self) -> PathBuf {
        self.local_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect()
    }

    /// Absolute URL to download from. Protocol-relative references use https.
    pub fn download_url(&self) -> String {
        if self.matched_text.starts_with("//") {
            format!("https:{}", self.matched_text)
        } else {
            self.matched_text.clone()
        }
    }
}

/// Classifies image URLs against the backend base URL and plans their rewrite.
#[derive(Debug, Clone)]
pub struct ImagePlanner {
    base_url: String,
    site_images: Option<Regex>,
}

impl ImagePlanner {
    pub fn new(base_url: &str) -> Result<Self, regex::Error> {
        let base_url = base_url.trim_end_matches('/').to_string();
        // Catches site-hosted images whose extension the generic pattern misses.
        // `&` and `;` end the match so entities such as `&quot;` stay outside.
        let site_images = if base_url.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(
                r#"{}{}[^"'\s<>()&;]+"#,
                regex::escape(&base_url),
                regex::escape(LOCAL_IMAGE_PREFIX)
            ))?)
        };
        Ok(Self {
            base_url,
            site_images,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Distinct image URLs in `html`, in first-occurrence order.
    ///
    /// Any URL ending in a known image extension counts, as does anything
    /// under the site's `/content/images/` whatever its extension.
    pub fn scan<'a>(&self, html: &'a str) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        self.spans(html)
            .into_iter()
            .map(|span| &html[span])
            .filter(|url| seen.insert(*url))
            .collect()
    }

    /// Unique image references of `html`, in first-occurrence order.
    pub fn plan(&self, html: &str, slug: &str) -> Vec<ImageReference> {
        self.scan(html)
            .into_iter()
            .map(|url| self.classify(url, slug))
            .collect()
    }

    /// Replaces every occurrence of each planned URL with its local path.
    pub fn rewrite(&self, html: &str, references: &[ImageReference]) -> String {
        let targets: HashMap<&str, &str> = references
            .iter()
            .map(|r| (r.matched_text.as_str(), r.local_path.as_str()))
            .collect();

        let mut out = String::with_capacity(html.len());
        let mut last = 0;
        for span in self.spans(html) {
            if let Some(target) = targets.get(&html[span.clone()]) {
                out.push_str(&html[last..span.start]);
                out.push_str(target);
                last = span.end;
            }
        }
        out.push_str(&html[last..]);
        out
    }

    /// Site-hosted URLs keep their path with the base URL stripped; external
    /// ones move under `/content/images/<slug>/`.
    pub fn classify(&self, url: &str, slug: &str) -> ImageReference {
        match self.site_relative(url) {
            Some(path) => ImageReference {
                matched_text: url.to_string(),
                is_site_hosted: true,
                local_path: path.to_string(),
            },
            None => ImageReference {
                matched_text: url.to_string(),
                is_site_hosted: false,
                local_path: format!("{LOCAL_IMAGE_PREFIX}{slug}/{}", basename(url)),
            },
        }
    }

    /// Site logo, icon and cover: external assets land directly under
    /// `/content/images/`.
    pub fn site_asset(&self, url: &str) -> ImageReference {
        match self.site_relative(url) {
            Some(path) => ImageReference {
                matched_text: url.to_string(),
                is_site_hosted: true,
                local_path: path.to_string(),
            },
            None => ImageReference {
                matched_text: url.to_string(),
                is_site_hosted: false,
                local_path: format!("{LOCAL_IMAGE_PREFIX}{}", basename(url)),
            },
        }
    }

    fn site_relative<'a>(&self, url: &'a str) -> Option<&'a str> {
        if self.base_url.is_empty() {
            return None;
        }
        let rest = url.strip_prefix(self.base_url.as_str())?;
        rest.starts_with('/').then(|| strip_query(rest))
    }

    fn spans(&self, html: &str) -> Vec<Range<usize>> {
        let mut spans: Vec<Range<usize>> = IMAGE_URL.find_iter(html).map(|m| m.range()).collect();
        if let Some(site) = &self.site_images {
            spans.extend(site.find_iter(html).filter_map(|m| {
                let url = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
                (!url.is_empty()).then(|| m.start()..m.start() + url.len())
            }));
        }
        // Longest match wins where the two patterns overlap.
        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last() {
                Some(last) if span.start < last.end => {}
                _ => merged.push(span),
            }
        }
        merged
    }
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

fn basename(url: &str) -> &str {
    let path = strip_query(url);
    path.rsplit('/').next().unwrap_or(path)
}
