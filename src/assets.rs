//! Copies static assets into the output directory under content-addressed
//! file names and records where each one ended up.
//!
//! An asset at `{source_directory}/img/me.jpg` whose content hashes to
//! `1a2b3c4d` is copied to `{output_directory}/{mount}/img/me.1a2b3c4d.jpg`
//! and recorded in the [`AssetMap`] as `img/me.jpg` →
//! `/{mount}/img/me.1a2b3c4d.jpg`. Because the name only changes when the
//! content does, the output can be cached forever, but it also means every
//! reference to an asset has to be looked up in the map.

use crate::hash::hash_content;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::fs;
use tokio::task::{JoinError, JoinSet};
use walkdir::WalkDir;

/// Maps logical asset paths (relative to the asset directory, `/`-separated,
/// unhashed) to site-root-relative URLs of the hashed copies.
#[derive(Clone, Debug, Default)]
pub struct AssetMap {
    urls: BTreeMap<String, String>,

    /// References that resolved to nothing, each warned about once.
    unresolved: Arc<Mutex<BTreeSet<String>>>,
}

impl AssetMap {
    /// Looks up the hashed URL for a logical path.
    pub fn get(&self, logical: &str) -> Option<&str> {
        self.urls.get(logical.trim_start_matches('/')).map(String::as_str)
    }

    /// Resolves a reference found in content or a template. External URLs
    /// are returned unchanged; known assets resolve to their hashed URL;
    /// anything else is returned unchanged with a warning (the first time
    /// it is seen), since it will probably 404 once published.
    pub fn resolve<'a>(&'a self, reference: &'a str) -> &'a str {
        if is_external(reference) {
            return reference;
        }
        match self.get(reference) {
            Some(url) => url,
            None => {
                let mut unresolved = self.unresolved.lock().unwrap_or_else(PoisonError::into_inner);
                if unresolved.insert(reference.to_owned()) {
                    warn!("no asset found for reference `{}`", reference);
                }
                reference
            }
        }
    }

    /// The references [`AssetMap::resolve`] couldn't find, in order.
    pub fn unresolved(&self) -> Vec<String> {
        let unresolved = self.unresolved.lock().unwrap_or_else(PoisonError::into_inner);
        unresolved.iter().cloned().collect()
    }

    /// Records a logical path → URL mapping.
    pub fn insert(&mut self, logical: String, url: String) {
        self.urls.insert(logical, url);
    }

    /// Iterates the mappings in logical-path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.urls.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl PartialEq for AssetMap {
    fn eq(&self, other: &AssetMap) -> bool {
        self.urls == other.urls
    }
}

impl Eq for AssetMap {}

fn is_external(reference: &str) -> bool {
    reference.starts_with("http://")
        || reference.starts_with("https://")
        || reference.starts_with("//")
        || reference.starts_with("data:")
        || reference.starts_with('#')
}

/// A single asset after it has been hashed and copied.
#[derive(Debug)]
pub struct HashedAsset {
    /// The logical path, e.g. `img/me.jpg`.
    pub logical: String,

    /// The site-root-relative URL, e.g. `/assets/img/me.1a2b3c4d.jpg`.
    pub url: String,

    /// Where the copy was written.
    pub output: PathBuf,
}

/// Hashes and copies every file below `source_directory`.
pub struct Hasher<'a> {
    /// The directory holding the source assets. Walked recursively.
    pub source_directory: &'a Path,

    /// The root output directory of the site.
    pub output_directory: &'a Path,

    /// The URL and output segment under which hashed assets are published
    /// (e.g. `assets`). May be empty to publish at the site root.
    pub mount: &'a str,
}

impl Hasher<'_> {
    /// Hashes every asset concurrently and returns the resulting
    /// [`AssetMap`]. Any unreadable or unwritable asset fails the whole
    /// operation. A missing source directory yields an empty map.
    pub async fn hash_assets(&self) -> Result<AssetMap> {
        if !fs::try_exists(self.source_directory).await.unwrap_or(false) {
            warn!(
                "asset directory `{}` does not exist; no assets will be published",
                self.source_directory.display()
            );
            return Ok(AssetMap::default());
        }

        let root = self.source_directory.to_owned();
        let files = tokio::task::spawn_blocking(move || collect_files(&root)).await??;

        let output_root = self.output_directory.join(self.mount);
        let mut tasks = JoinSet::new();
        for relative in files {
            let source = self.source_directory.join(&relative);
            let output_root = output_root.clone();
            let mount = self.mount.to_owned();
            tasks.spawn(hash_asset(source, relative, output_root, mount));
        }

        let mut assets = AssetMap::default();
        while let Some(joined) = tasks.join_next().await {
            let asset = joined??;
            debug!("asset {} -> {}", asset.logical, asset.url);
            assets.insert(asset.logical, asset.url);
        }
        Ok(assets)
    }
}

/// Lists the files below `root` as paths relative to `root`. Symlinks are
/// followed; a dangling one is an error.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for result in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = result?;
        if entry.file_type().is_file() {
            // strip_prefix can't fail; every entry is below `root`
            if let Ok(relative) = entry.path().strip_prefix(root) {
                files.push(relative.to_owned());
            }
        }
    }
    Ok(files)
}

async fn hash_asset(
    source: PathBuf,
    relative: PathBuf,
    output_root: PathBuf,
    mount: String,
) -> Result<HashedAsset> {
    let content = fs::read(&source).await.map_err(|err| Error::Read {
        path: source.clone(),
        err,
    })?;
    let hash = hash_content(&content);

    let invalid = || Error::InvalidFileName(relative.clone());
    let hashed = hashed_file_name(&relative, &hash).ok_or_else(invalid)?;
    let logical = logical_path(&relative).ok_or_else(invalid)?;
    let parent = relative.parent().unwrap_or_else(|| Path::new(""));
    let parent_segments = segments(parent).ok_or_else(invalid)?;

    let output = output_root.join(parent).join(&hashed);
    if let Some(dir) = output.parent() {
        fs::create_dir_all(dir).await.map_err(|err| Error::Write {
            path: dir.to_owned(),
            err,
        })?;
    }
    fs::write(&output, &content)
        .await
        .map_err(|err| Error::Write {
            path: output.clone(),
            err,
        })?;

    let mut url_segments: Vec<&str> = Vec::new();
    if !mount.is_empty() {
        url_segments.push(&mount);
    }
    url_segments.extend(parent_segments);
    url_segments.push(&hashed);

    Ok(HashedAsset {
        logical,
        url: format!("/{}", url_segments.join("/")),
        output,
    })
}

/// `img/me.jpg` + `1a2b3c4d` → `me.1a2b3c4d.jpg`.
fn hashed_file_name(relative: &Path, hash: &str) -> Option<String> {
    let stem = relative.file_stem()?.to_str()?;
    Some(match relative.extension() {
        Some(extension) => format!("{}.{}.{}", stem, hash, extension.to_str()?),
        None => format!("{}.{}", stem, hash),
    })
}

fn logical_path(relative: &Path) -> Option<String> {
    Some(segments(relative)?.join("/"))
}

fn segments(path: &Path) -> Option<Vec<&str>> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_str()),
            _ => None,
        })
        .collect()
}

/// The result of a fallible asset operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem hashing or copying assets. Every variant is fatal
/// to the build.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the asset directory can't be walked.
    #[error("walking asset directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Returned when an asset can't be read.
    #[error("reading asset {path:?}: {err}")]
    Read {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when an asset copy (or its directory) can't be written.
    #[error("writing asset {path:?}: {err}")]
    Write {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when an asset's path isn't valid UTF-8.
    #[error("invalid asset file name: {0:?}")]
    InvalidFileName(PathBuf),

    /// Returned when a hashing task panics or is cancelled.
    #[error("asset task failed: {0}")]
    Join(#[from] JoinError),
}
