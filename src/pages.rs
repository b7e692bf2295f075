//! The site's page templates. [`registry`] lists every one of them; the
//! build renders them all.
//!
//! | Template      | Output                                  |
//! |---------------|-----------------------------------------|
//! | `index`       | `/index.html`                           |
//! | `articles`    | `/articles.html`                        |
//! | `notes`       | `/notes.html`                           |
//! | `$article`    | `/articles/{slug}.html` per article     |
//! | `$note`       | `/notes/{slug}.html` per note           |
//! | `$tag`        | `/tags/{slug}.html` per tag             |
//! | `tags`        | `/tags.html`                            |
//! | `404`         | `/404.html`                             |
//! | `feed`        | `feed.xml`                              |
//! | `feed-style`  | `rss.xsl`                               |

use crate::components::{
    avatar, document, feed as feed_list, icon, profile, AvatarSize, Entry as FeedEntry, LinkSize,
    PostLink, ReadableDate, SiteAssets,
};
use crate::data::SiteData;
use crate::feed::{self, FEED_PATH, FEED_STYLESHEET, STYLESHEET_PATH};
use crate::node::{el, raw, Node};
use crate::post::{Kind, Post};
use crate::related::related;
use crate::template::{Entry, Exports, Output, Params, Props, Registry, Result, Template};
use std::sync::Arc;

/// The longest note excerpt used as a note page's title.
const NOTE_TITLE_LENGTH: usize = 140;

/// Returns a registry holding every page of the site.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(Index)
        .register(KindFeed(Kind::Article))
        .register(KindFeed(Kind::Note))
        .register(ArticlePages)
        .register(NotePages)
        .register(TagPages)
        .register(TagList)
        .register(NotFound)
        .register(Feed)
        .register(FeedStyle);
    registry
}

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|&(key, value)| (key.to_owned(), value.to_owned()))
        .collect()
}

/// Wraps a page in the document shell, titled by the `title` param and
/// with the stylesheet named by `page_style`.
fn shell(props: &Props, page: Node) -> Node {
    document(
        props.data,
        props.param("title").unwrap_or_default(),
        props.param("page_style"),
        page,
    )
}

/// A centred page with a large heading, used for archives.
fn list_layout(title: &str, children: impl Into<Node>) -> Node {
    el("div")
        .class("max-w-content mx-auto grid gap-7 gutter")
        .child(el("h1").class("font-5-8 text-center").child(title))
        .child(children)
        .into()
}

fn entries<'a>(posts: impl Iterator<Item = &'a Arc<Post>>, data: &SiteData) -> Vec<Node> {
    posts
        .map(|post| Node::component(FeedEntry::new(post, data)))
        .collect()
}

struct Index;

impl Template for Index {
    fn path(&self) -> &str {
        "index"
    }

    fn exports(&self) -> Exports {
        Exports {
            url: None,
            params: params(&[("title", "Home")]),
        }
    }

    fn render(&self, props: &Props) -> Result<Output> {
        let data = props.data;
        let header = vec![
            el("h1").child(&data.site.title),
            el("p").child(&data.site.subtitle),
        ];
        Ok(Output::Page(profile(
            data,
            &props.url,
            AvatarSize::Large,
            header,
            feed_list(entries(data.posts.iter(), data)),
        )))
    }

    fn layout(&self, props: &Props, page: Node) -> Node {
        shell(props, page)
    }
}

/// The feed of every post of one kind (`/articles.html`, `/notes.html`).
struct KindFeed(Kind);

impl KindFeed {
    fn title(&self) -> &'static str {
        match self.0 {
            Kind::Article => "Articles",
            Kind::Note => "Notes",
        }
    }
}

impl Template for KindFeed {
    fn path(&self) -> &str {
        self.0.plural()
    }

    fn exports(&self) -> Exports {
        Exports {
            url: None,
            params: params(&[("title", self.title())]),
        }
    }

    fn render(&self, props: &Props) -> Result<Output> {
        let data = props.data;
        Ok(Output::Page(profile(
            data,
            &props.url,
            AvatarSize::Large,
            el("h1").child(self.title()),
            feed_list(entries(data.posts_of_kind(self.0), data)),
        )))
    }

    fn layout(&self, props: &Props, page: Node) -> Node {
        shell(props, page)
    }
}

/// One page per article, with its neighbours and related posts.
struct ArticlePages;

impl Template for ArticlePages {
    fn path(&self) -> &str {
        "$article"
    }

    fn render(&self, props: &Props) -> Result<Output> {
        let data = props.data;
        let articles: Vec<&Arc<Post>> = data.posts_of_kind(Kind::Article).collect();
        let pages = articles
            .iter()
            .enumerate()
            .map(|(i, post)| {
                // posts are newest first: the previous post is the older one
                let prev = articles.get(i + 1).copied();
                let next = i.checked_sub(1).and_then(|j| articles.get(j)).copied();
                let url = format!("/{}/{}.html", Kind::Article.plural(), post.slug);
                Entry::new(url, article(data, post, prev, next))
                    .param("title", post.display_title())
                    .param("page_style", "article.css")
            })
            .collect();
        Ok(Output::Pages(pages))
    }

    fn layout(&self, props: &Props, page: Node) -> Node {
        shell(props, page)
    }
}

fn article(
    data: &SiteData,
    post: &Arc<Post>,
    prev: Option<&Arc<Post>>,
    next: Option<&Arc<Post>>,
) -> Node {
    let assets = SiteAssets::new(data);
    let sprite = assets.sprite.as_str();
    let link = |post: &Arc<Post>, rel: Option<&'static str>| {
        Node::component(PostLink {
            post: Arc::clone(post),
            rel,
            size: LinkSize::Small,
            sprite: sprite.to_owned(),
        })
    };
    let neighbour = |heading: &str, post: Option<&Arc<Post>>, rel: &'static str| {
        post.map(|post| {
            el("div")
                .class("grid gap-3")
                .child(el("h3").class("font-3").child(heading))
                .child(link(post, Some(rel)))
        })
    };
    let related = related(post, &data.tags, prev.map(|p| &**p), next.map(|p| &**p));

    let meta = el("div")
        .class("flex items-center gap-3 font-2 color-bright font-sans")
        .child(
            el("a")
                .attr("href", "/articles")
                .class("flex items-center gap-1")
                .child(icon(sprite, "article", 16))
                .child(el("span").class("p-kind").child("Article")),
        )
        .child(
            el("span")
                .class("flex items-center gap-1")
                .child(icon(sprite, "calendar", 16))
                .child(Node::component(ReadableDate(post.date))),
        )
        .child(
            el("span")
                .class("flex items-center gap-1")
                .child(icon(sprite, "clock", 16))
                .child(el("span").child(format!("{:.1} minute read", post.time / 60.0))),
        );
    let tags = el("ul")
        .class("flex wrap gap-2 color-bright font-sans")
        .children(post.tags.iter().map(|tag| {
            el("li").child(
                el("a")
                    .attr("href", format!("/tags/{}", slug::slugify(tag)))
                    .child("#")
                    .child(el("span").class("p-category").child(tag)),
            )
        }));

    el("div")
        .class("Profile font-serif")
        .child(
            el("article")
                .class("BorderBetween h-entry")
                .child(
                    el("header")
                        .class("ProfileHeader")
                        .child(avatar(&assets, AvatarSize::Medium))
                        .child(
                            el("div")
                                .class("grid gap-2")
                                .child(meta)
                                .child(el("h1").class("p-name font-5-8").child(post.display_title()))
                                .child(tags),
                        ),
                )
                .child(
                    el("div")
                        .class("e-content BorderBetween")
                        .child(
                            post.intro
                                .as_ref()
                                .map(|intro| el("p").class("py-8 gutter font-4").child(intro)),
                        )
                        .child(el("div").class("ArticleContent py-8").child(raw(&post.content))),
                ),
        )
        .child(
            el("div")
                .class("bg-dim grid gap-5 py-8 gutter")
                .attr("style", "border-top: var(--space-1) solid var(--contrast)")
                .child(neighbour("Previous", prev, "prev"))
                .child(neighbour("Next", next, "next"))
                .child((!related.is_empty()).then(|| {
                    el("div")
                        .class("grid gap-3")
                        .child(el("h3").class("font-3").child("Related"))
                        .child(
                            el("ul")
                                .class("grid gap-3")
                                .children(related.iter().map(|post| el("li").child(link(post, None)))),
                        )
                })),
        )
        .into()
}

/// One page per note. Notes are untitled, so the page title is the start of
/// the note itself.
struct NotePages;

impl Template for NotePages {
    fn path(&self) -> &str {
        "$note"
    }

    fn render(&self, props: &Props) -> Result<Output> {
        let data = props.data;
        let pages = data
            .posts_of_kind(Kind::Note)
            .map(|post| {
                let url = format!("/{}/{}.html", Kind::Note.plural(), post.slug);
                let page = profile(
                    data,
                    &url,
                    AvatarSize::Medium,
                    Node::Empty,
                    feed_list([Node::component(FeedEntry::new(post, data))]),
                );
                Entry::new(url, page)
                    .param("title", note_title(post))
                    .param("page_style", "article.css")
            })
            .collect();
        Ok(Output::Pages(pages))
    }

    fn layout(&self, props: &Props, page: Node) -> Node {
        shell(props, page)
    }
}

fn note_title(post: &Post) -> String {
    match post.title.as_ref() {
        Some(title) => title.clone(),
        None if post.raw.chars().count() <= NOTE_TITLE_LENGTH => post.raw.clone(),
        None => post.raw.chars().take(NOTE_TITLE_LENGTH).collect::<String>() + "...",
    }
}

/// One archive page per tag.
struct TagPages;

impl Template for TagPages {
    fn path(&self) -> &str {
        "$tag"
    }

    fn render(&self, props: &Props) -> Result<Output> {
        let data = props.data;
        let assets = SiteAssets::new(data);
        let pages = data
            .tags
            .iter()
            .map(|tag| {
                let title = format!("‘{}’ archive", tag.name);
                let list = el("ul").class("grid gap-5").children(tag.posts.iter().map(|post| {
                    el("li").child(Node::component(PostLink {
                        post: Arc::clone(post),
                        rel: None,
                        size: LinkSize::Medium,
                        sprite: assets.sprite.clone(),
                    }))
                }));
                Entry::new(
                    format!("/tags/{}.html", tag.slug),
                    list_layout(&title, list),
                )
                .param("title", title)
            })
            .collect();
        Ok(Output::Pages(pages))
    }

    fn layout(&self, props: &Props, page: Node) -> Node {
        shell(props, page)
    }
}

/// Every tag with its number of posts.
struct TagList;

impl Template for TagList {
    fn path(&self) -> &str {
        "tags"
    }

    fn exports(&self) -> Exports {
        Exports {
            url: None,
            params: params(&[("title", "Tags")]),
        }
    }

    fn render(&self, props: &Props) -> Result<Output> {
        let list = el("ul").class("grid gap-3").children(props.data.tags.iter().map(|tag| {
            el("li").child(
                el("a")
                    .attr("href", format!("/tags/{}", tag.slug))
                    .child(el("b").child(&tag.name))
                    .child(format!(" {}", tag.posts.len())),
            )
        }));
        Ok(Output::Page(list_layout("Tags", list)))
    }

    fn layout(&self, props: &Props, page: Node) -> Node {
        shell(props, page)
    }
}

struct NotFound;

const NOT_FOUND_STYLE: &str = "
.pile { display: grid; place-items: center; }
.pile > * { grid-area: 1 / 1 / 1 / 1; }
@keyframes spin { to { transform: rotate(1turn); } }
.pile > svg { max-width: 100%; animation: spin 12s infinite linear; }
.pile > b { color: white; z-index: 10; }
";

const PUZZLE_PATH: &str = "M11 4a2 2 0 114 0v1a1 1 0 001 1h3a1 1 0 011 1v3a1 1 0 01-1 1h-1a2 2 0 100 4h1a1 1 0 011 1v3a1 1 0 01-1 1h-3a1 1 0 01-1-1v-1a2 2 0 10-4 0v1a1 1 0 01-1 1H7a1 1 0 01-1-1v-3a1 1 0 00-1-1H4a2 2 0 110-4h1a1 1 0 001-1V7a1 1 0 011-1h3a1 1 0 001-1V4z";

impl Template for NotFound {
    fn path(&self) -> &str {
        "404"
    }

    fn exports(&self) -> Exports {
        Exports {
            url: None,
            params: params(&[("title", "Page not found")]),
        }
    }

    fn render(&self, _props: &Props) -> Result<Output> {
        Ok(Output::Page(
            el("div")
                .class("mx-auto pile")
                .child(el("style").child(raw(NOT_FOUND_STYLE)))
                .child(
                    el("svg")
                        .attr("width", 500)
                        .attr("height", 500)
                        .attr("fill", "var(--contrast)")
                        .attr("viewBox", "0 0 24 24")
                        .attr("stroke", "var(--contrast)")
                        .attr("stroke-width", "1.25")
                        .attr("aria-hidden", "true")
                        .child(
                            el("path")
                                .attr("stroke-linecap", "round")
                                .attr("stroke-linejoin", "round")
                                .attr("d", PUZZLE_PATH),
                        ),
                )
                .child(
                    el("b")
                        .class("font-7")
                        .attr("aria-hidden", "true")
                        .child("404"),
                )
                .into(),
        ))
    }

    fn layout(&self, props: &Props, page: Node) -> Node {
        shell(props, page)
    }
}

/// The Atom feed of every post.
struct Feed;

impl Template for Feed {
    fn path(&self) -> &str {
        "feed"
    }

    fn exports(&self) -> Exports {
        Exports {
            url: Some(FEED_PATH.to_owned()),
            params: Params::new(),
        }
    }

    fn render(&self, props: &Props) -> Result<Output> {
        let xml = feed::feed(props.data, &props.data.posts)?;
        Ok(Output::Page(raw(xml)))
    }
}

/// The XSL stylesheet referenced by the feed.
struct FeedStyle;

impl Template for FeedStyle {
    fn path(&self) -> &str {
        "feed-style"
    }

    fn exports(&self) -> Exports {
        Exports {
            url: Some(STYLESHEET_PATH.to_owned()),
            params: Params::new(),
        }
    }

    fn render(&self, _props: &Props) -> Result<Output> {
        Ok(Output::Page(raw(FEED_STYLESHEET)))
    }
}
