//! Defines [`SiteData`], the bundle of global data every template renders
//! against, and [`Styles`], the site's stylesheets keyed by file name.

use crate::assets::AssetMap;
use crate::post::{Kind, Post};
use crate::tag::TagIndex;
use futures::future::join_all;
use log::warn;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::task::JoinError;
use url::Url;
use walkdir::WalkDir;

/// Site-wide settings taken from the project configuration.
#[derive(Clone, Debug)]
pub struct Site {
    pub title: String,
    pub subtitle: String,

    /// The absolute URL the site is published at. Used for feed links.
    pub url: Url,

    pub author: Author,

    /// Free-form values every template receives as default parameters.
    pub params: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

/// Everything a template needs to render: the site settings, the posts and
/// tags loaded from content, the hashed asset map, and the stylesheets.
/// Built once per build and shared read-only between templates.
#[derive(Clone, Debug)]
pub struct SiteData {
    pub site: Site,
    pub posts: Vec<Arc<Post>>,
    pub tags: TagIndex,
    pub assets: AssetMap,
    pub styles: Styles,
}

impl SiteData {
    /// The posts of the given kind, newest first.
    pub fn posts_of_kind(&self, kind: Kind) -> impl Iterator<Item = &Arc<Post>> {
        self.posts.iter().filter(move |post| post.kind == kind)
    }

    /// Joins a site-root-relative path onto the site URL.
    pub fn absolute_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.site.url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/'),
        )
    }
}

const STYLESHEET_EXTENSION: &str = "css";

/// Stylesheet contents keyed by file name (e.g. `main.css`). Cheap to clone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Styles(Arc<BTreeMap<String, String>>);

impl Styles {
    /// Reads every `*.css` file below `directory`. Later files with the same
    /// name replace earlier ones. A missing directory yields no styles.
    pub async fn load(directory: &Path) -> Result<Styles> {
        if !fs::try_exists(directory).await.unwrap_or(false) {
            warn!("styles directory {:?} does not exist", directory);
            return Ok(Styles::default());
        }

        let root = directory.to_owned();
        let paths = tokio::task::spawn_blocking(move || stylesheets(&root)).await??;
        let contents = join_all(paths.iter().map(fs::read_to_string)).await;

        let mut styles = BTreeMap::new();
        for (path, content) in paths.into_iter().zip(contents) {
            let content = content.map_err(|err| Error::Read {
                path: path.clone(),
                err,
            })?;
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                styles.insert(name.to_owned(), content);
            }
        }
        Ok(Styles(Arc::new(styles)))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

impl FromIterator<(String, String)> for Styles {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Styles {
        Styles(Arc::new(iter.into_iter().collect()))
    }
}

fn stylesheets(root: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for result in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = result?;
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == STYLESHEET_EXTENSION)
        {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading stylesheets.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the styles directory can't be walked.
    #[error("walking styles directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Returned when a stylesheet can't be read.
    #[error("reading stylesheet {path:?}: {err}")]
    Read {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when the directory walk panics.
    #[error("styles task failed: {0}")]
    Join(#[from] JoinError),
}
