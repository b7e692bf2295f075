//! Defines the [`Template`] trait implemented by every page of the site, the
//! [`Registry`] the build runs, and [`render_template`], which turns one
//! template into rendered pages.
//!
//! A template renders either a single page ([`Output::Page`]), published at
//! `/{name}.html` unless the template exports a `url`, or many pages
//! ([`Output::Pages`]), each at its own URL. Every page is passed through
//! the template's [`Template::layout`] before it is rendered.

use crate::data::SiteData;
use crate::feed;
use crate::node::Node;
use crate::render::render;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Named string values handed to templates and layouts (e.g. `title`,
/// `page_style`).
pub type Params = BTreeMap<String, String>;

/// Template-level data merged over the site's defaults before rendering.
#[derive(Clone, Debug, Default)]
pub struct Exports {
    /// Overrides the default `/{name}.html` URL of a single-page template.
    pub url: Option<String>,

    /// Parameters that take precedence over the site-wide `params`.
    pub params: Params,
}

/// What a template (and its layout) renders against.
#[derive(Debug)]
pub struct Props<'a> {
    pub data: &'a SiteData,

    /// The URL of the page being rendered, relative to the template's
    /// directory.
    pub url: String,

    /// Site params, overridden by template exports, overridden by the
    /// page's own params.
    pub params: Params,
}

impl Props<'_> {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// One page of a fanned-out template.
#[derive(Debug)]
pub struct Entry {
    pub url: String,
    pub component: Node,
    pub params: Params,
}

impl Entry {
    pub fn new(url: impl Into<String>, component: impl Into<Node>) -> Entry {
        Entry {
            url: url.into(),
            component: component.into(),
            params: Params::new(),
        }
    }

    /// Adds a parameter visible to the layout for this page only.
    pub fn param(mut self, key: &str, value: impl Into<String>) -> Entry {
        self.params.insert(key.to_owned(), value.into());
        self
    }
}

/// The result of rendering a template.
#[derive(Debug)]
pub enum Output {
    Page(Node),
    Pages(Vec<Entry>),
}

/// A page template. Implementations are registered statically in a
/// [`Registry`].
pub trait Template: Send + Sync {
    /// The template's path relative to the template root, without an
    /// extension (e.g. `articles`, `$tag`, `gym/plan`). Its directory is
    /// where the pages are written; its last segment names the default URL.
    fn path(&self) -> &str;

    fn exports(&self) -> Exports {
        Exports::default()
    }

    fn render(&self, props: &Props) -> Result<Output>;

    /// Wraps every page the template renders. Defaults to the identity.
    fn layout(&self, _props: &Props, page: Node) -> Node {
        page
    }
}

/// The templates a build renders, in registration order.
#[derive(Clone, Default)]
pub struct Registry {
    templates: Vec<Arc<dyn Template>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn register(&mut self, template: impl Template + 'static) -> &mut Registry {
        self.templates.push(Arc::new(template));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Template>> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// A rendered page, ready to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    /// Relative to the template's directory in the output root.
    pub url: String,
    pub html: String,
}

/// Renders every page of `template` against `data`. Two pages of one
/// template may not share a URL, since only one of them could be written.
pub fn render_template(template: &dyn Template, data: &SiteData) -> Result<Vec<Page>> {
    let exports = template.exports();
    let mut params = data.site.params.clone();
    params.extend(exports.params);
    let props = Props {
        data,
        url: exports.url.unwrap_or_else(|| default_url(template.path())),
        params,
    };

    Ok(match template.render(&props)? {
        Output::Page(component) => {
            let html = render(&template.layout(&props, component));
            vec![Page {
                url: props.url,
                html,
            }]
        }
        Output::Pages(entries) => {
            let mut urls = HashSet::new();
            if let Some(entry) = entries.iter().find(|entry| !urls.insert(entry.url.as_str())) {
                return Err(Error::DuplicateUrl(entry.url.clone()));
            }
            entries
                .into_iter()
                .map(|entry| {
                    let mut params = props.params.clone();
                    params.extend(entry.params);
                    let props = Props {
                        data,
                        url: entry.url,
                        params,
                    };
                    let html = render(&template.layout(&props, entry.component));
                    Page {
                        url: props.url,
                        html,
                    }
                })
                .collect()
        }
    })
}

/// `blog/index` → `/index.html`.
pub fn default_url(template_path: &str) -> String {
    let name = template_path.rsplit('/').next().unwrap_or(template_path);
    format!("/{}.html", name)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a template failing to render. Fails that template only.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a template needs data the site doesn't have.
    #[error("missing data: {0}")]
    MissingData(String),

    /// Returned when two pages of one template resolve to the same URL.
    #[error("more than one page at `{0}`")]
    DuplicateUrl(String),

    /// Returned when the feed document can't be written.
    #[error("generating feed: {0}")]
    Feed(#[from] feed::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::test::site_data;
    use crate::node::{el, fragment};

    struct Single;

    impl Template for Single {
        fn path(&self) -> &str {
            "gym/plan"
        }

        fn render(&self, props: &Props) -> Result<Output> {
            Ok(Output::Page(el("p").child(props.url.as_str()).into()))
        }
    }

    struct Exported;

    impl Template for Exported {
        fn path(&self) -> &str {
            "feed"
        }

        fn exports(&self) -> Exports {
            Exports {
                url: Some(String::from("feed.xml")),
                params: Params::from([(String::from("title"), String::from("exported"))]),
            }
        }

        fn render(&self, props: &Props) -> Result<Output> {
            Ok(Output::Page(props.param("title").into()))
        }
    }

    struct Many;

    impl Template for Many {
        fn path(&self) -> &str {
            "$item"
        }

        fn exports(&self) -> Exports {
            Exports {
                url: None,
                params: Params::from([
                    (String::from("title"), String::from("exported")),
                    (String::from("kind"), String::from("item")),
                ]),
            }
        }

        fn render(&self, _props: &Props) -> Result<Output> {
            Ok(Output::Pages(vec![
                Entry::new("/items/a.html", "A").param("title", "first"),
                Entry::new("/items/b.html", "B"),
            ]))
        }

        fn layout(&self, props: &Props, page: Node) -> Node {
            el("main")
                .attr("data-title", props.param("title"))
                .attr("data-kind", props.param("kind"))
                .attr("data-owner", props.param("owner"))
                .child(fragment(vec![page, Node::from(props.url.as_str())]))
                .into()
        }
    }

    struct Broken;

    impl Template for Broken {
        fn path(&self) -> &str {
            "broken"
        }

        fn render(&self, _props: &Props) -> Result<Output> {
            Err(Error::MissingData(String::from("nothing here")))
        }
    }

    #[test]
    fn test_default_url() {
        assert_eq!("/plan.html", default_url("gym/plan"));
        assert_eq!("/$tag.html", default_url("$tag"));
        assert_eq!("/404.html", default_url("404"));
    }

    #[test]
    fn test_single_page_uses_default_url() -> Result<()> {
        let data = site_data(vec![]);
        let pages = render_template(&Single, &data)?;
        assert_eq!(
            vec![Page {
                url: String::from("/plan.html"),
                html: String::from("<p>/plan.html</p>"),
            }],
            pages,
        );
        Ok(())
    }

    #[test]
    fn test_exports_override_url_and_params() -> Result<()> {
        let mut data = site_data(vec![]);
        data.site
            .params
            .insert(String::from("title"), String::from("global"));
        let pages = render_template(&Exported, &data)?;
        assert_eq!(1, pages.len());
        assert_eq!("feed.xml", pages[0].url);
        assert_eq!("exported", pages[0].html);
        Ok(())
    }

    #[test]
    fn test_fan_out_merges_params_and_applies_layout() -> Result<()> {
        let mut data = site_data(vec![]);
        data.site
            .params
            .insert(String::from("owner"), String::from("ada"));
        let pages = render_template(&Many, &data)?;
        assert_eq!(
            vec![
                Page {
                    url: String::from("/items/a.html"),
                    html: String::from(
                        r#"<main data-title="first" data-kind="item" data-owner="ada">A/items/a.html</main>"#
                    ),
                },
                Page {
                    url: String::from("/items/b.html"),
                    html: String::from(
                        r#"<main data-title="exported" data-kind="item" data-owner="ada">B/items/b.html</main>"#
                    ),
                },
            ],
            pages,
        );
        Ok(())
    }

    #[test]
    fn test_render_error_propagates() {
        let data = site_data(vec![]);
        assert!(matches!(
            render_template(&Broken, &data),
            Err(Error::MissingData(_))
        ));
    }

    struct Clashing;

    impl Template for Clashing {
        fn path(&self) -> &str {
            "$clash"
        }

        fn render(&self, _props: &Props) -> Result<Output> {
            Ok(Output::Pages(vec![
                Entry::new("/tags/rust.html", "Rust"),
                Entry::new("/tags/web.html", "web"),
                Entry::new("/tags/rust.html", "rust"),
            ]))
        }
    }

    #[test]
    fn test_duplicate_urls_fail_the_template() {
        let data = site_data(vec![]);
        match render_template(&Clashing, &data) {
            Err(Error::DuplicateUrl(url)) => assert_eq!("/tags/rust.html", url),
            other => panic!("expected a duplicate url error, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_keeps_order() {
        let mut registry = Registry::new();
        registry.register(Single).register(Many).register(Broken);
        let paths: Vec<&str> = registry.iter().map(|t| t.path()).collect();
        assert_eq!(vec!["gym/plan", "$item", "broken"], paths);
    }
}
