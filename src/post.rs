//! Defines the [`Post`] type, along with its [`Kind`] and attached
//! [`Media`], and the reading-time estimate computed for every post.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::LazyLock;

/// Distinguishes long-form articles from short notes. Each kind has its own
/// listing page and its own URL prefix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    #[default]
    Article,
    Note,
}

impl Kind {
    /// The singular, lowercase name (`article` or `note`).
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Article => "article",
            Kind::Note => "note",
        }
    }

    /// The URL segment under which posts of this kind live (`articles` or
    /// `notes`).
    pub fn plural(self) -> &'static str {
        match self {
            Kind::Article => "articles",
            Kind::Note => "notes",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of media attached to a post via its frontmatter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Media {
    /// The media type. Only `photo` is rendered.
    #[serde(rename = "type")]
    pub kind: String,

    /// The media's URL.
    pub url: String,

    /// Alternative text.
    #[serde(default)]
    pub alt: Option<String>,
}

/// Represents a blog post. Constructed once per build by
/// [`crate::parser::Parser`] and shared (behind an `Arc`) with every page
/// that lists it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Post {
    /// The source file's name without its `.md` extension. Unique per site.
    pub slug: String,

    /// The title of the post. Notes usually don't have one.
    pub title: Option<String>,

    /// The publication date.
    pub date: NaiveDate,

    pub kind: Kind,

    /// The post's tags, in frontmatter order.
    pub tags: Vec<String>,

    /// An optional summary shown in feeds instead of the full body.
    pub intro: Option<String>,

    /// The rendered HTML body.
    pub content: String,

    /// The markdown body, as written.
    pub raw: String,

    /// Estimated reading time in seconds. See [`reading_time`].
    pub time: f64,

    /// Drafts are dropped by the parser and never published.
    pub draft: bool,

    pub media: Vec<Media>,
}

impl Post {
    /// The site-root-relative path of the post's page, without an extension
    /// (e.g. `/articles/hello-world`).
    pub fn path(&self) -> String {
        format!("/{}/{}", self.kind.plural(), self.slug)
    }

    /// The title, or the slug for untitled posts.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.slug)
    }
}

/// Words read per minute.
pub const READING_RATE: f64 = 200.0;

static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{0400}-\x{04FF}]+|\S+\s*").unwrap());

/// Estimates how long `html` takes to read, in seconds. Markup is stripped
/// first; every run of non-whitespace (or of Cyrillic letters) counts as a
/// word.
pub fn reading_time(html: &str) -> f64 {
    let text = TAGS.replace_all(html, "");
    let words = WORDS.find_iter(&text).count();
    words as f64 / (READING_RATE / 60.0)
}

/// Deserializes a frontmatter date. Accepts `YYYY-MM-DD` and anything that
/// starts with it, such as a full RFC 3339 timestamp.
pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let s = String::deserialize(deserializer)?;
    let date = s.get(..10).unwrap_or(&s);
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| D::Error::custom(format!("invalid date `{}`: {}", s, e)))
}
