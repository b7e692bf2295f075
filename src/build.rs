//! Exports the [`build_site`] function which stitches together the
//! high-level steps of building the site:
//!
//! 1. Clearing the output directory ([`crate::write::clean`])
//! 2. Hashing and copying assets ([`crate::assets`]) while loading the
//!    stylesheets ([`crate::data::Styles`])
//! 3. Parsing the posts ([`crate::parser`])
//! 4. Rendering every registered template ([`crate::template`]) and writing
//!    its pages ([`crate::write`])
//!
//! Templates render concurrently against one shared [`SiteData`]. A template
//! that fails (or panics) is logged and skipped; the others still publish.
//! Anything that breaks shared setup, or a page that can't be written,
//! aborts the build.

use crate::assets::{self, Hasher};
use crate::config::Config;
use crate::data::{self, SiteData, Styles};
use crate::parser::{self, Parser};
use crate::template::{render_template, Registry, Template};
use crate::write::{self, write_page};
use futures::future::join_all;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};

/// What a build did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    /// Pages written, across all templates.
    pub pages: usize,

    /// Templates that failed to render and published nothing.
    pub failed_templates: usize,

    /// Content files that couldn't be parsed.
    pub skipped_posts: usize,

    pub elapsed: Duration,
}

/// Builds the site described by `config` from the templates in `registry`,
/// replacing whatever the output directory held before.
pub async fn build_site(config: &Config, registry: &Registry) -> Result<Summary> {
    let start = Instant::now();
    write::clean(&config.output_directory).await?;

    let hasher = Hasher {
        source_directory: &config.assets_directory,
        output_directory: &config.output_directory,
        mount: &config.assets_mount,
    };
    let (assets, styles) = tokio::try_join!(
        async { hasher.hash_assets().await.map_err(Error::from) },
        async { Styles::load(&config.styles_directory).await.map_err(Error::from) },
    )?;

    let content = Parser::new(&assets)
        .parse_posts(&config.content_directory)
        .await?;
    let mut summary = Summary {
        skipped_posts: content.failures.len(),
        ..Summary::default()
    };

    let data = Arc::new(SiteData {
        site: config.site.clone(),
        posts: content.posts,
        tags: content.tags,
        assets,
        styles,
    });
    let output_directory = Arc::new(config.output_directory.clone());

    let mut tasks = JoinSet::new();
    for template in registry.iter() {
        tasks.spawn(publish(
            Arc::clone(template),
            Arc::clone(&data),
            Arc::clone(&output_directory),
        ));
    }
    while let Some(joined) = tasks.join_next().await {
        match joined?? {
            Some(pages) => summary.pages += pages,
            None => summary.failed_templates += 1,
        }
    }

    summary.elapsed = start.elapsed();
    if summary.skipped_posts > 0 {
        warn!("skipped {} unparseable posts", summary.skipped_posts);
    }
    if summary.failed_templates > 0 {
        warn!("{} templates failed", summary.failed_templates);
    }
    info!("wrote {} pages in {:.2?}", summary.pages, summary.elapsed);
    Ok(summary)
}

/// Renders one template and writes its pages. Returns the number of pages
/// written, or `None` if the template failed to render.
async fn publish(
    template: Arc<dyn Template>,
    data: Arc<SiteData>,
    output_directory: Arc<PathBuf>,
) -> Result<Option<usize>> {
    let path = template.path().to_owned();

    // rendering is synchronous; a panic there stays inside this template
    let renderer = Arc::clone(&template);
    let rendered =
        tokio::task::spawn_blocking(move || render_template(&*renderer, &data)).await;
    let pages = match rendered {
        Ok(Ok(pages)) => pages,
        Ok(Err(err)) => {
            error!("template `{}` failed: {}", path, err);
            return Ok(None);
        }
        Err(err) => {
            error!("template `{}` panicked: {}", path, err);
            return Ok(None);
        }
    };

    let written = join_all(
        pages
            .iter()
            .map(|page| write_page(&output_directory, &path, page)),
    )
    .await;
    for result in written {
        result?;
    }
    Ok(Some(pages.len()))
}

/// The result of a build.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a fatal build error. Failures local to one post or one
/// template are logged instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the output can't be cleared or a page can't be written.
    #[error(transparent)]
    Write(#[from] write::Error),

    /// Returned when an asset can't be hashed or copied.
    #[error(transparent)]
    Assets(#[from] assets::Error),

    /// Returned when the stylesheets can't be loaded.
    #[error(transparent)]
    Styles(#[from] data::Error),

    /// Returned when the content directory can't be read.
    #[error(transparent)]
    Content(#[from] parser::Error),

    /// Returned when a publishing task panics.
    #[error("build task failed: {0}")]
    Join(#[from] JoinError),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::{Author, Site};
    use crate::node::Node;
    use crate::pages::registry;
    use crate::template::{self, Output, Props};
    use std::collections::BTreeMap;
    use std::path::Path;
    use tempfile::TempDir;
    use url::Url;
    use walkdir::WalkDir;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn project(root: &Path) -> std::io::Result<Config> {
        let write = |path: &str, contents: &str| -> std::io::Result<()> {
            let path = root.join(path);
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(path, contents)
        };
        write(
            "content/hello.md",
            "---\ntitle: Hello\ndate: 2023-06-01\ntags: [rust]\n---\nHello ![me](avatar.jpg)\n",
        )?;
        write(
            "content/thought.md",
            "---\nkind: note\ndate: 2023-05-01\ntags: [rust, web]\n---\nA passing thought.\n",
        )?;
        write("content/broken.md", "no frontmatter here\n")?;
        write("assets/avatar.jpg", "not really a jpeg")?;
        write("assets/sprite.svg", "<svg></svg>")?;
        write("assets/favicon.svg", "<svg></svg>")?;
        write("styles/main.css", "body{margin:0}")?;
        write("styles/article.css", "h1{}")?;

        Ok(Config {
            site: Site {
                title: String::from("example.org"),
                subtitle: String::from("a test site"),
                url: Url::parse("https://example.org").map_err(std::io::Error::other)?,
                author: Author {
                    name: String::from("Ada"),
                    email: None,
                },
                params: BTreeMap::new(),
            },
            content_directory: root.join("content"),
            assets_directory: root.join("assets"),
            styles_directory: root.join("styles"),
            output_directory: root.join("_site"),
            assets_mount: String::from("assets"),
        })
    }

    fn tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                let relative = entry.path().strip_prefix(root).unwrap().to_owned();
                (relative, std::fs::read(entry.path()).unwrap())
            })
            .collect()
    }

    #[tokio::test]
    async fn test_build_site() -> TestResult {
        let dir = TempDir::new()?;
        let config = project(dir.path())?;
        std::fs::create_dir_all(config.output_directory.join("stale"))?;
        std::fs::write(config.output_directory.join("stale/old.html"), "old")?;

        let summary = build_site(&config, &registry()).await?;
        assert_eq!(1, summary.skipped_posts);
        assert_eq!(0, summary.failed_templates);
        // index, articles, notes, 1 article, 1 note, 2 tags, tags, 404, feed, xsl
        assert_eq!(11, summary.pages);

        let out = &config.output_directory;
        assert!(!out.join("stale").exists());
        for page in [
            "index.html",
            "articles.html",
            "notes.html",
            "articles/hello.html",
            "notes/thought.html",
            "tags/rust.html",
            "tags/web.html",
            "tags.html",
            "404.html",
            "feed.xml",
            "rss.xsl",
        ] {
            assert!(out.join(page).is_file(), "missing {}", page);
        }

        let article = std::fs::read_to_string(out.join("articles/hello.html"))?;
        assert!(article.starts_with("<!doctype html>\n<html lang=\"en\">"));
        let avatar = crate::hash::hash_content(b"not really a jpeg");
        let avatar_url = format!("/assets/avatar.{}.jpg", avatar);
        assert!(out.join(avatar_url.trim_start_matches('/')).is_file());
        assert!(article.contains(&format!(r#"<img src="{}" alt="me">"#, avatar_url)));

        let feed = std::fs::read_to_string(out.join("feed.xml"))?;
        assert!(feed.starts_with("<?xml"));
        assert_eq!(2, feed.matches("<entry>").count());
        Ok(())
    }

    #[tokio::test]
    async fn test_build_is_idempotent() -> TestResult {
        let dir = TempDir::new()?;
        let config = project(dir.path())?;

        build_site(&config, &registry()).await?;
        let first = tree(&config.output_directory);
        build_site(&config, &registry()).await?;
        let second = tree(&config.output_directory);

        assert!(!first.is_empty());
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_tag_spellings_publish_one_archive() -> TestResult {
        let dir = TempDir::new()?;
        let config = project(dir.path())?;
        std::fs::write(
            config.content_directory.join("a.md"),
            "---\ntitle: A\ndate: 2023-07-02\ntags: [Rust]\n---\nA.\n",
        )?;
        std::fs::write(
            config.content_directory.join("b.md"),
            "---\ntitle: B\ndate: 2023-07-01\ntags: [rust]\n---\nB.\n",
        )?;

        let summary = build_site(&config, &registry()).await?;
        // index, articles, notes, 3 articles, 1 note, 2 tags, tags, 404, feed, xsl
        assert_eq!(13, summary.pages);

        let tags = config.output_directory.join("tags");
        let mut archives: Vec<String> = std::fs::read_dir(&tags)?
            .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<_>>()?;
        archives.sort();
        assert_eq!(vec!["rust.html", "web.html"], archives);

        let rust = std::fs::read_to_string(tags.join("rust.html"))?;
        assert!(rust.contains("‘Rust’ archive"));
        for slug in ["a", "b", "hello"] {
            assert!(rust.contains(&format!("href=\"/articles/{}\"", slug)), "missing {}", slug);
        }
        Ok(())
    }

    struct Panics;

    impl Template for Panics {
        fn path(&self) -> &str {
            "panics"
        }

        fn render(&self, _props: &Props) -> template::Result<Output> {
            panic!("boom")
        }
    }

    struct Fails;

    impl Template for Fails {
        fn path(&self) -> &str {
            "fails"
        }

        fn render(&self, _props: &Props) -> template::Result<Output> {
            Err(template::Error::MissingData(String::from("nothing")))
        }
    }

    struct Works;

    impl Template for Works {
        fn path(&self) -> &str {
            "nested/works"
        }

        fn render(&self, _props: &Props) -> template::Result<Output> {
            Ok(Output::Page(Node::from("ok")))
        }
    }

    #[tokio::test]
    async fn test_failing_templates_are_isolated() -> TestResult {
        let dir = TempDir::new()?;
        let config = project(dir.path())?;
        let mut registry = Registry::new();
        registry.register(Panics).register(Fails).register(Works);

        let summary = build_site(&config, &registry).await?;
        assert_eq!(2, summary.failed_templates);
        assert_eq!(1, summary.pages);
        assert_eq!(
            "<!doctype html>\nok",
            std::fs::read_to_string(config.output_directory.join("nested/works.html"))?,
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_content_is_fatal() -> TestResult {
        let dir = TempDir::new()?;
        let mut config = project(dir.path())?;
        config.content_directory = dir.path().join("nowhere");
        assert!(matches!(
            build_site(&config, &registry()).await,
            Err(Error::Content(_))
        ));
        Ok(())
    }
}
