//! Writes rendered [`Page`]s to the output directory.
//!
//! A page lands at the output root, joined with the directory of the
//! template that produced it, joined with the page URL: the page `/x.html`
//! of the template `gym/plan` is written to `{out}/gym/x.html`. HTML pages
//! are prefixed with [`DOCTYPE`].

use crate::template::Page;
use log::debug;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Written before the markup of every `.html` page.
pub const DOCTYPE: &str = "<!doctype html>\n";

/// Returns where the page at `url` of the template at `template_path` is
/// written below `out_root`.
pub fn output_path(out_root: &Path, template_path: &str, url: &str) -> PathBuf {
    let mut path = out_root.to_owned();
    if let Some((dir, _)) = template_path.rsplit_once('/') {
        path.push(dir);
    }
    path.push(url.trim_start_matches('/'));
    path
}

/// Writes `page`, creating any missing parent directories, and returns the
/// path it was written to.
pub async fn write_page(out_root: &Path, template_path: &str, page: &Page) -> Result<PathBuf> {
    let path = output_path(out_root, template_path, &page.url);
    let write_err = |err| Error::Write {
        path: path.clone(),
        err,
    };

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await.map_err(write_err)?;
    }
    let contents = match page.url.ends_with(".html") {
        true => format!("{}{}", DOCTYPE, page.html),
        false => page.html.clone(),
    };
    fs::write(&path, contents).await.map_err(write_err)?;
    debug!("wrote {:?}", path);
    Ok(path)
}

/// Removes `dir` and everything in it, then recreates it empty. A missing
/// directory is simply created.
pub async fn clean(dir: &Path) -> Result<()> {
    let clean_err = |err| Error::Clean {
        path: dir.to_owned(),
        err,
    };
    match fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(clean_err(err)),
    }
    fs::create_dir_all(dir).await.map_err(clean_err)
}

/// The result of a page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing output files.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the output directory can't be cleared or recreated.
    #[error("cleaning directory {path:?}: {err}")]
    Clean {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when a page (or its directory) can't be written.
    #[error("writing {path:?}: {err}")]
    Write {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_path() {
        let out = Path::new("/out");
        assert_eq!(PathBuf::from("/out/index.html"), output_path(out, "index", "/index.html"));
        assert_eq!(
            PathBuf::from("/out/tags/rust.html"),
            output_path(out, "$tag", "/tags/rust.html"),
        );
        assert_eq!(PathBuf::from("/out/gym/plan.html"), output_path(out, "gym/plan", "/plan.html"));
        assert_eq!(PathBuf::from("/out/feed.xml"), output_path(out, "feed", "feed.xml"));
    }

    #[tokio::test]
    async fn test_write_page_prefixes_html() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let html = Page {
            url: String::from("/articles/hello.html"),
            html: String::from("<p>hi</p>"),
        };
        let path = write_page(dir.path(), "$article", &html).await?;
        assert_eq!(dir.path().join("articles/hello.html"), path);
        assert_eq!("<!doctype html>\n<p>hi</p>", std::fs::read_to_string(&path)?);

        let xml = Page {
            url: String::from("feed.xml"),
            html: String::from("<?xml?>"),
        };
        let path = write_page(dir.path(), "feed", &xml).await?;
        assert_eq!("<?xml?>", std::fs::read_to_string(&path)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_clean() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let out = dir.path().join("_site");
        clean(&out).await?;
        assert!(out.is_dir());

        std::fs::create_dir_all(out.join("stale"))?;
        std::fs::write(out.join("stale/page.html"), "old")?;
        clean(&out).await?;
        assert!(out.is_dir());
        assert_eq!(0, std::fs::read_dir(&out)?.count());
        Ok(())
    }
}
