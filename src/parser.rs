//! Defines the [`Parser`], [`Content`], and [`Error`] types: the logic for
//! loading a directory of markdown posts into memory.

use crate::assets::AssetMap;
use crate::markdown;
use crate::post::{deserialize_date, reading_time, Kind, Media, Post};
use crate::tag::TagIndex;
use chrono::NaiveDate;
use futures::future::join_all;
use log::{debug, error};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;

const MARKDOWN_EXTENSION: &str = "md";

/// Everything loaded from the content directory.
#[derive(Debug, Default)]
pub struct Content {
    /// Published posts, newest first. Posts sharing a date keep the order
    /// of their file names.
    pub posts: Vec<Arc<Post>>,

    /// The tag index built from `posts`.
    pub tags: TagIndex,

    /// The content files that couldn't be loaded. Each was logged and left
    /// out of `posts`.
    pub failures: Vec<Failure>,
}

/// A content file that couldn't be loaded.
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: Error,
}

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// Used to resolve images referenced from markdown bodies.
    assets: &'a AssetMap,
}

impl<'a> Parser<'a> {
    pub fn new(assets: &'a AssetMap) -> Parser<'a> {
        Parser { assets }
    }

    /// Loads every post file (extension = `.md`) in `source_directory`. Files
    /// are read concurrently and parsed in file-name order. Each post file
    /// must be structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`) on its own line
    /// 2. YAML frontmatter with `date` and optionally `title`, `kind`,
    ///    `tags`, `intro`, `draft` and `media`
    /// 3. Terminal frontmatter fence (`---`) on its own line
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2021-04-16
    /// tags: [greet]
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    ///
    /// A file that can't be read or parsed is logged and reported in
    /// [`Content::failures`]; it never fails the whole load. Only a missing
    /// or unreadable `source_directory` does. Drafts are dropped, the rest
    /// are sorted newest first and indexed by tag.
    pub async fn parse_posts(&self, source_directory: &Path) -> Result<Content> {
        let paths = list_posts(source_directory).await.map_err(|err| {
            Error::Annotated(
                format!("reading content directory {:?}", source_directory),
                Box::new(err),
            )
        })?;
        let sources = join_all(paths.iter().map(fs::read_to_string)).await;

        let mut content = Content::default();
        let mut posts = Vec::with_capacity(paths.len());
        for (path, source) in paths.into_iter().zip(sources) {
            let parsed = source
                .map_err(Error::from)
                .and_then(|input| self.parse_post(&slug_of(&path)?, &input));
            match parsed {
                Ok(post) if post.draft => debug!("skipping draft {:?}", path),
                Ok(post) => posts.push(Arc::new(post)),
                Err(err) => {
                    error!("parsing post {:?}: {}", path, err);
                    content.failures.push(Failure { path, error: err });
                }
            }
        }

        posts.sort_by(|a, b| b.date.cmp(&a.date));
        content.tags = TagIndex::from_posts(&posts);
        content.posts = posts;
        Ok(content)
    }

    /// Parses a single [`Post`] from its `slug` (the source file name less
    /// its extension) and the file's contents.
    pub fn parse_post(&self, slug: &str, input: &str) -> Result<Post> {
        let (yaml, body) = split_frontmatter(input)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(yaml)?;

        let mut content = String::new();
        markdown::to_html(&mut content, body, self.assets);

        Ok(Post {
            slug: slug.to_owned(),
            title: frontmatter.title,
            date: frontmatter.date,
            kind: frontmatter.kind,
            tags: frontmatter.tags,
            intro: frontmatter.intro,
            time: reading_time(&content),
            content,
            raw: body.trim().to_owned(),
            draft: frontmatter.draft,
            media: frontmatter.media,
        })
    }
}

async fn list_posts(source_directory: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let mut entries = fs::read_dir(source_directory).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        // symlinks are read through; a dangling one fails like an unreadable file
        let file_type = entry.file_type().await?;
        if (file_type.is_file() || file_type.is_symlink())
            && path.extension().is_some_and(|ext| ext == MARKDOWN_EXTENSION)
        {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

fn slug_of(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned)
        .ok_or_else(|| Error::InvalidFileName(path.to_owned()))
}

/// Splits `input` into its YAML frontmatter and its body. The first line
/// must be exactly `---`; the frontmatter runs until the next line that is
/// exactly `---`.
fn split_frontmatter(input: &str) -> Result<(&str, &str)> {
    const FENCE: &str = "---";
    let is_fence = |line: &str| line.trim_end_matches(['\n', '\r']) == FENCE;

    let mut lines = input.split_inclusive('\n');
    let yaml_start = match lines.next() {
        Some(first) if is_fence(first) => first.len(),
        _ => return Err(Error::FrontmatterMissingStartFence),
    };
    let mut offset = yaml_start;
    for line in lines {
        if is_fence(line) {
            return Ok((&input[yaml_start..offset], &input[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(Error::FrontmatterMissingEndFence)
}

#[derive(Deserialize)]
struct Frontmatter {
    #[serde(default)]
    title: Option<String>,

    #[serde(deserialize_with = "deserialize_date")]
    date: NaiveDate,

    #[serde(default)]
    kind: Kind,

    #[serde(default)]
    tags: Vec<String>,

    #[serde(default)]
    intro: Option<String>,

    #[serde(default)]
    draft: bool,

    #[serde(default)]
    media: Vec<Media>,
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    #[error("post must begin with `---`")]
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    #[error("missing closing `---`")]
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    #[error("invalid frontmatter: {0}")]
    DeserializeYaml(#[from] serde_yaml::Error),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Returned when a source file name isn't valid UTF-8.
    #[error("invalid file name: {0:?}")]
    InvalidFileName(PathBuf),

    /// An error with an annotation.
    #[error("{0}: {1}")]
    Annotated(String, #[source] Box<Error>),
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> io::Result<()> {
        std::fs::write(dir.join(name), content)
    }

    #[test]
    fn test_split_frontmatter() -> Result<()> {
        let (yaml, body) = split_frontmatter("---\ntitle: x\n---\n# Body\n---\nmore")?;
        assert_eq!("title: x\n", yaml);
        assert_eq!("# Body\n---\nmore", body);

        let (yaml, body) = split_frontmatter("---\r\ndate: 2020-01-01\r\n---\r\n")?;
        assert_eq!("date: 2020-01-01\r\n", yaml);
        assert_eq!("", body);
        Ok(())
    }

    #[test]
    fn test_split_frontmatter_fences() {
        assert!(matches!(
            split_frontmatter("title: x\n---\n"),
            Err(Error::FrontmatterMissingStartFence)
        ));
        assert!(matches!(
            split_frontmatter("----\ntitle: x\n---\n"),
            Err(Error::FrontmatterMissingStartFence)
        ));
        assert!(matches!(
            split_frontmatter("---\ntitle: x\n--- \nbody"),
            Err(Error::FrontmatterMissingEndFence)
        ));
    }

    #[test]
    fn test_parse_post() -> Result<()> {
        let assets = AssetMap::default();
        let post = Parser::new(&assets).parse_post(
            "hello",
            "---\ntitle: Hello\ndate: 2021-04-16\nkind: note\ntags: [greet]\n\
             intro: Hi.\n---\n\nWorld\n",
        )?;
        assert_eq!("hello", post.slug);
        assert_eq!(Some("Hello"), post.title.as_deref());
        assert_eq!(NaiveDate::from_ymd_opt(2021, 4, 16), Some(post.date));
        assert_eq!(Kind::Note, post.kind);
        assert_eq!(vec![String::from("greet")], post.tags);
        assert_eq!(Some("Hi."), post.intro.as_deref());
        assert_eq!("<p>World</p>\n", post.content);
        assert_eq!("World", post.raw);
        assert!(!post.draft);
        assert!(post.time > 0.0);
        Ok(())
    }

    #[test]
    fn test_parse_post_requires_date() {
        let assets = AssetMap::default();
        let parsed = Parser::new(&assets).parse_post("x", "---\ntitle: No date\n---\nbody");
        assert!(matches!(parsed, Err(Error::DeserializeYaml(_))));
    }

    #[tokio::test]
    async fn test_parse_posts() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        write(dir.path(), "a.md", "---\ndate: 2023-01-01\ntags: [x]\n---\nA")?;
        write(dir.path(), "b.md", "---\ndate: 2023-06-01\ntags: [x, y]\n---\nB")?;
        write(dir.path(), "c.md", "---\ndate: 2022-01-01\ntags: [x]\n---\nC")?;
        write(dir.path(), "d.md", "---\ndate: 2023-01-01\n---\nD")?;
        write(dir.path(), "e.md", "---\ndate: [not a date\n---\nE")?;
        write(dir.path(), "notes.txt", "not a post")?;

        let assets = AssetMap::default();
        let content = Parser::new(&assets).parse_posts(dir.path()).await?;

        let slugs: Vec<&str> = content.posts.iter().map(|p| p.slug.as_str()).collect();
        // a and d share a date and keep file-name order
        assert_eq!(vec!["b", "a", "d", "c"], slugs);

        assert_eq!(1, content.failures.len());
        assert_eq!(dir.path().join("e.md"), content.failures[0].path);

        let x: Vec<&str> = content.tags.get("x").unwrap_or_default().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(vec!["b", "a", "c"], x);
        assert_eq!(2, content.tags.len());
        Ok(())
    }

    #[tokio::test]
    async fn test_parse_posts_skips_drafts() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        write(dir.path(), "live.md", "---\ndate: 2023-01-01\ntags: [x]\n---\nLive")?;
        write(dir.path(), "wip.md", "---\ndate: 2023-02-01\ndraft: true\ntags: [wip]\n---\nWIP")?;

        let assets = AssetMap::default();
        let content = Parser::new(&assets).parse_posts(dir.path()).await?;
        assert_eq!(1, content.posts.len());
        assert_eq!("live", content.posts[0].slug);
        assert!(content.tags.get("wip").is_none());
        assert!(content.failures.is_empty());
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_parse_posts_follows_symlinks() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let elsewhere = TempDir::new()?;
        write(elsewhere.path(), "draft.md", "---\ndate: 2023-01-01\n---\nLinked")?;
        std::os::unix::fs::symlink(elsewhere.path().join("draft.md"), dir.path().join("linked.md"))?;
        std::os::unix::fs::symlink(dir.path().join("gone.md"), dir.path().join("broken.md"))?;

        let assets = AssetMap::default();
        let content = Parser::new(&assets).parse_posts(dir.path()).await?;
        assert_eq!(1, content.posts.len());
        assert_eq!("linked", content.posts[0].slug);
        assert_eq!(1, content.failures.len());
        assert_eq!(dir.path().join("broken.md"), content.failures[0].path);
        Ok(())
    }

    #[tokio::test]
    async fn test_parse_posts_missing_directory() {
        let assets = AssetMap::default();
        let parsed = Parser::new(&assets)
            .parse_posts(Path::new("./does/not/exist"))
            .await;
        assert!(matches!(parsed, Err(Error::Annotated(_, _))));
    }
}
