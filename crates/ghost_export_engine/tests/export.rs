use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use bytes::Bytes;
use futures_util::{stream, StreamExt};
use ghost_export_core::{ConversionError, Converter};
use ghost_export_engine::{
    prepare_output_dir, run_export, run_with, ByteStream, ContentExporter, ContentSource,
    DownloadError, DownloadFailureKind, Downloader, ExportConfig, ExportError, RawContent,
    SiteSettings, SourceError,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

struct FakeSource {
    settings: SiteSettings,
    pages: Vec<RawContent>,
    posts: Vec<RawContent>,
    fail_posts: bool,
}

#[async_trait::async_trait]
impl ContentSource for FakeSource {
    async fn settings(&self) -> Result<SiteSettings, SourceError> {
        Ok(self.settings.clone())
    }

    async fn pages(&self) -> Result<Vec<RawContent>, SourceError> {
        Ok(self.pages.clone())
    }

    async fn posts(&self) -> Result<Vec<RawContent>, SourceError> {
        if self.fail_posts {
            return Err(SourceError::HttpStatus {
                resource: "posts",
                status: 500,
            });
        }
        Ok(self.posts.clone())
    }
}

/// Answers every URL with `img`, or with a 503 when `fail` is set.
#[derive(Default)]
struct FakeDownloader {
    requested: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait::async_trait]
impl Downloader for FakeDownloader {
    async fn fetch(&self, url: &str) -> Result<ByteStream, DownloadError> {
        self.requested.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(DownloadError {
                kind: DownloadFailureKind::HttpStatus(503),
                message: "unavailable".to_string(),
            });
        }
        Ok(stream::iter(vec![Ok::<_, io::Error>(Bytes::from_static(b"img"))]).boxed())
    }
}

struct BrokenConverter;

impl Converter for BrokenConverter {
    fn to_markdown(&self, _html: &str) -> Result<String, ConversionError> {
        Err(ConversionError::Html(io::Error::other("unbalanced markup")))
    }
}

fn raw(value: serde_json::Value) -> RawContent {
    serde_json::from_value(value).unwrap()
}

fn source() -> FakeSource {
    FakeSource {
        settings: serde_json::from_value(json!({
            "title": "Blog",
            "url": "https://ghost.example.com/",
            "logo": "https://ghost.example.com/content/images/2019/logo.png",
            "icon": "https://cdn.example.net/brand/icon.png"
        }))
        .unwrap(),
        pages: vec![raw(json!({
            "id": "p1",
            "slug": "about",
            "title": "About \"us\"",
            "html": "<p>Team</p><img src=\"https://ghost.example.com/content/images/2021/team.jpg\">",
            "published_at": "2020-01-02T10:00:00.000Z",
            "url": "https://ghost.example.com/about/"
        }))],
        posts: vec![
            raw(json!({
                "id": "a1",
                "slug": "hello",
                "title": "Hello",
                "html": "<p>Intro</p><!--kg-card-begin: markdown--><p><strong>x</strong></p><!--kg-card-end: markdown-->",
                "feature_image": "https://cdn.example.net/cover.png",
                "published_at": "2021-03-05T09:00:00.000Z",
                "url": "https://ghost.example.com/hello/"
            })),
            raw(json!({
                "id": "a2",
                "slug": "notes",
                "title": "Notes",
                "html": "<img src=\"https://cdn.example.net/n.png\" alt=\"n\"><p>Body text</p>",
                "published_at": "2021-11-30T23:59:59.000Z"
            })),
            raw(json!({
                "id": "a3",
                "slug": "draft",
                "title": "Draft",
                "html": "<p>not yet</p>"
            })),
        ],
        fail_posts: false,
    }
}

fn config(out: &Path) -> ExportConfig {
    ExportConfig {
        output_dir: out.to_path_buf(),
        backend_base_url: "https://ghost.example.com/".to_string(),
        backend_api_key: "key".to_string(),
        explicit_markdown_slugs: vec!["notes".to_string()],
        skip_slugs: vec!["draft".to_string()],
        public_site_url: Some("https://blog.example.org".to_string()),
        ..ExportConfig::default()
    }
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn full_run_exports_items_images_and_settings() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("site");
    let downloader = Arc::new(FakeDownloader::default());

    let summary = run_export(config(&out), &source(), downloader.clone()).await.unwrap();
    assert_eq!((summary.exported, summary.skipped, summary.failed), (3, 1, 0));

    let about = read(out.join("about.html"));
    assert!(about.starts_with("---\nid: p1\ntitle: \"About \\\"us\\\"\"\n"));
    assert!(about.contains("\ndate: 2020-01-02\ntags: page\nslug: about\nlayout: layouts/page.njk\n"));
    assert!(about.contains(r#"<img src="/content/images/2021/team.jpg">"#));
    assert!(!about.contains("https://ghost.example.com/content/images/"));

    let hello = read(out.join("hello.md"));
    assert!(hello.contains("\nfeature_image: /content/images/hello/cover.png\n"));
    assert!(hello.contains("**x**"));
    assert!(hello.contains("\ntags: posts\n"));
    assert!(hello.contains("\nlayout: layouts/post.njk\n"));

    let notes = read(out.join("notes.md"));
    assert!(notes.contains("\nfeature_image: /content/images/notes/n.png\n"));
    assert!(notes.contains("\ndescription: \"Body text\"\n"));
    assert!(notes.contains("\ndate: 2021-11-30\n"));
    assert!(notes.ends_with("---\n\nBody text\n"));

    assert!(!out.join("draft.html").exists());
    assert!(!out.join("hello.json").exists());

    for image in [
        "content/images/2021/team.jpg",
        "content/images/hello/cover.png",
        "content/images/notes/n.png",
        "content/images/2019/logo.png",
        "content/images/icon.png",
    ] {
        assert_eq!(fs::read(out.join(image)).unwrap(), b"img", "{image}");
    }

    let site: serde_json::Value = serde_json::from_str(&read(out.join("site.json"))).unwrap();
    assert_eq!(site["url"], json!("https://blog.example.org"));
    assert_eq!(site["title"], json!("Blog"));
}

#[tokio::test]
async fn debug_mode_dumps_raw_items_with_relative_urls() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("site");
    let config = ExportConfig {
        debug: true,
        skip_posts: true,
        ..config(&out)
    };

    run_export(config, &source(), Arc::new(FakeDownloader::default()))
        .await
        .unwrap();

    let dump: serde_json::Value = serde_json::from_str(&read(out.join("about.json"))).unwrap();
    assert_eq!(dump["url"], json!("/about/"));
    assert_eq!(dump["slug"], json!("about"));
    assert!(!out.join("hello.md").exists());
}

#[tokio::test]
async fn failed_downloads_still_rewrite_references() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("site");
    let downloader = Arc::new(FakeDownloader {
        fail: true,
        ..Default::default()
    });

    let summary = run_export(config(&out), &source(), downloader.clone()).await.unwrap();
    assert_eq!(summary.failed, 0);
    assert!(read(out.join("about.html")).contains(r#"src="/content/images/2021/team.jpg""#));
    assert!(!out.join("content/images/2021/team.jpg").exists());
    assert!(!downloader.requested.lock().unwrap().is_empty());
}

#[tokio::test]
async fn skip_images_never_downloads() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("site");
    let downloader = Arc::new(FakeDownloader::default());
    let config = ExportConfig {
        skip_images: true,
        ..config(&out)
    };

    run_export(config, &source(), downloader.clone()).await.unwrap();
    assert!(downloader.requested.lock().unwrap().is_empty());
    assert!(read(out.join("hello.md")).contains("feature_image: /content/images/hello/cover.png"));
    assert_eq!(fs::read_dir(out.join("content/images")).unwrap().count(), 0);
}

#[tokio::test]
async fn write_failures_skip_only_the_item() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("site");
    let mut source = source();
    source
        .pages
        .push(raw(json!({"id": "p2", "slug": "bad/slug", "html": "<p>x</p>"})));

    let summary = run_export(config(&out), &source, Arc::new(FakeDownloader::default()))
        .await
        .unwrap();
    assert_eq!((summary.exported, summary.failed), (3, 1));
    assert!(out.join("hello.md").exists());
}

#[tokio::test]
async fn source_failures_abort_but_keep_earlier_output() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("site");
    let source = FakeSource {
        fail_posts: true,
        ..source()
    };

    let err = run_export(config(&out), &source, Arc::new(FakeDownloader::default()))
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, ExportError::Source(_)));
    assert!(out.join("about.html").exists());
    assert!(out.join("site.json").exists());
}

#[tokio::test]
async fn conversion_failures_are_fatal() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("site");
    prepare_output_dir(&out).unwrap();
    let exporter = ContentExporter::new(config(&out), Arc::new(FakeDownloader::default()))
        .unwrap()
        .with_converter(Box::new(BrokenConverter));

    let err = run_with(&exporter, &source()).await.unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, ExportError::Conversion { ref slug, .. } if slug == "hello"));
    assert!(out.join("about.html").exists());
}

#[tokio::test]
async fn rerunning_produces_identical_files() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("site");

    run_export(config(&out), &source(), Arc::new(FakeDownloader::default()))
        .await
        .unwrap();
    let first: Vec<String> = ["about.html", "hello.md", "notes.md", "site.json"]
        .iter()
        .map(|name| read(out.join(name)))
        .collect();

    run_export(config(&out), &source(), Arc::new(FakeDownloader::default()))
        .await
        .unwrap();
    let second: Vec<String> = ["about.html", "hello.md", "notes.md", "site.json"]
        .iter()
        .map(|name| read(out.join(name)))
        .collect();

    assert_eq!(first, second);
}
