//! Loads the project configuration file, `statik.yaml`.
//!
//! ```yaml
//! title: example.org
//! subtitle: Notes and articles
//! site_url: https://example.org
//! author:
//!   name: Ada
//!   email: ada@example.org
//! directories:      # optional, relative to this file
//!   content: content
//!   assets: assets
//!   styles: styles
//!   output: _site
//! assets_mount: assets
//! params:
//!   lang: en
//! ```

use crate::data::{Author, Site};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file looked up by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "statik.yaml";

#[derive(Deserialize)]
struct Project {
    title: String,

    #[serde(default)]
    subtitle: String,

    site_url: Url,
    author: Author,

    #[serde(default)]
    directories: Directories,

    #[serde(default = "default_mount")]
    assets_mount: String,

    #[serde(default)]
    params: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(default)]
struct Directories {
    content: PathBuf,
    assets: PathBuf,
    styles: PathBuf,
    output: PathBuf,
}

impl Default for Directories {
    fn default() -> Self {
        Directories {
            content: PathBuf::from("content"),
            assets: PathBuf::from("assets"),
            styles: PathBuf::from("styles"),
            output: PathBuf::from("_site"),
        }
    }
}

fn default_mount() -> String {
    String::from("assets")
}

/// A resolved project: the site settings and the absolute directories a
/// build reads from and writes to.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: Site,
    pub content_directory: PathBuf,
    pub assets_directory: PathBuf,
    pub styles_directory: PathBuf,
    pub output_directory: PathBuf,

    /// The URL and output segment hashed assets are published under.
    pub assets_mount: String,
}

impl Config {
    /// Looks for [`PROJECT_FILE`] in `dir`, then in each of its ancestors,
    /// and loads the first one found. `output_directory` replaces the
    /// configured output directory if given.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        for ancestor in dir.ancestors() {
            let path = ancestor.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path, output_directory);
            }
        }
        Err(anyhow!(
            "could not find `{}` in `{}` or any parent directory",
            PROJECT_FILE,
            dir.display()
        ))
    }

    /// Loads the project file at `path`. Relative directories are resolved
    /// against the file's directory.
    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_str(&source)
            .with_context(|| format!("loading project file `{}`", path.display()))?;
        let root = path.parent().ok_or_else(|| {
            anyhow!("can't get parent directory for project file `{}`", path.display())
        })?;

        Ok(Config {
            site: Site {
                title: project.title,
                subtitle: project.subtitle,
                url: project.site_url,
                author: project.author,
                params: project.params,
            },
            content_directory: root.join(project.directories.content),
            assets_directory: root.join(project.directories.assets),
            styles_directory: root.join(project.directories.styles),
            output_directory: match output_directory {
                Some(output) => output.to_owned(),
                None => root.join(project.directories.output),
            },
            assets_mount: project.assets_mount.trim_matches('/').to_owned(),
        })
    }

    /// The directories whose changes require a rebuild.
    pub fn source_directories(&self) -> [&Path; 3] {
        [
            &self.content_directory,
            &self.assets_directory,
            &self.styles_directory,
        ]
    }
}
