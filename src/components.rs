//! The pieces pages are built from.
//!
//! Pieces that wrap other markup (the [`document`] shell, the [`profile`]
//! layout, [`feed`] lists) are plain functions taking their children.
//! Self-contained pieces that only need data ([`Entry`], [`PostLink`],
//! [`ReadableDate`]) are [`Component`]s that own that data, so they can be
//! dropped anywhere in a tree and rendered later.

use crate::data::SiteData;
use crate::dates;
use crate::node::{el, fragment, raw, Component, Element, Node};
use crate::post::Post;
use chrono::NaiveDate;
use std::sync::Arc;

/// Logical asset paths of the files every page refers to.
pub const SPRITE: &str = "sprite.svg";
pub const AVATAR: &str = "avatar.jpg";
pub const FAVICON: &str = "favicon.svg";

/// The stylesheet inlined into every page.
pub const MAIN_STYLE: &str = "main.css";

/// Hashed URLs (and the author name) that components need, resolved once so
/// components can own them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteAssets {
    pub sprite: String,
    pub avatar: String,
    pub favicon: String,
    pub author: String,
}

impl SiteAssets {
    pub fn new(data: &SiteData) -> SiteAssets {
        SiteAssets {
            sprite: data.assets.resolve(SPRITE).to_owned(),
            avatar: data.assets.resolve(AVATAR).to_owned(),
            favicon: data.assets.resolve(FAVICON).to_owned(),
            author: data.site.author.name.clone(),
        }
    }
}

/// An icon from the SVG sprite.
pub fn icon(sprite: &str, name: &str, size: u32) -> Element {
    el("svg")
        .attr("width", size)
        .attr("height", size)
        .attr("aria-hidden", "true")
        .child(el("use").attr("href", format!("{}#{}", sprite, name)))
}

/// The full HTML document: head with the title, favicon and inlined
/// stylesheets, and a body holding `children` in `<main>`. `page_style`
/// names an extra stylesheet to inline; unknown names are ignored.
pub fn document(
    data: &SiteData,
    title: &str,
    page_style: Option<&str>,
    children: impl Into<Node>,
) -> Node {
    let style = |name: &str| data.styles.get(name).map(|css| el("style").child(raw(css)));
    let title = match title {
        "" => data.site.title.clone(),
        title => format!("{} | {}", title, data.site.title),
    };

    el("html")
        .attr("lang", "en")
        .child(
            el("head")
                .child(el("meta").attr("charset", "utf-8"))
                .child(el("title").child(title))
                .child(
                    el("link")
                        .attr("rel", "icon")
                        .attr("href", data.assets.resolve(FAVICON)),
                )
                .child(
                    el("meta")
                        .attr("name", "viewport")
                        .attr("content", "width=device-width, initial-scale=1.0"),
                )
                .child(style(MAIN_STYLE))
                .child(page_style.and_then(|name| style(name))),
        )
        .child(
            el("body")
                .child(
                    el("a")
                        .class("skip")
                        .attr("href", "#main")
                        .child("Skip to content"),
                )
                .child(el("main").child(children)),
        )
        .into()
}

/// Size of the avatar at the top of the profile layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AvatarSize {
    Medium,
    Large,
}

impl AvatarSize {
    pub fn pixels(self) -> u32 {
        match self {
            AvatarSize::Medium => 96,
            AvatarSize::Large => 128,
        }
    }
}

/// The profile layout shared by the home page and the feeds: a header with
/// the avatar, the search box, the navigation, then `children`.
pub fn profile(
    data: &SiteData,
    url: &str,
    size: AvatarSize,
    header: impl Into<Node>,
    children: impl Into<Node>,
) -> Node {
    let assets = SiteAssets::new(data);
    el("div")
        .class("Profile BorderBetween")
        .child(
            el("div")
                .class("ProfileHeader")
                .child(avatar(&assets, size))
                .child(header),
        )
        .child(search(data, &assets.sprite))
        .child(nav(&assets.sprite, url))
        .child(children)
        .into()
}

/// The cover strip and round avatar linking home.
pub fn avatar(assets: &SiteAssets, size: AvatarSize) -> Node {
    let px = size.pixels();
    fragment(vec![
        el("div")
            .class("ProfileCover")
            .attr("style", format!("--overlap: -{}px", px / 2)),
        el("a")
            .attr("href", "/")
            .attr("aria-label", "Home")
            .class("ProfileAvatar")
            .child(
                el("img")
                    .attr("src", &assets.avatar)
                    .attr("alt", format!("{}'s profile picture", assets.author))
                    .attr("width", px)
                    .attr("height", px),
            ),
    ])
}

/// A search form handing the query to DuckDuckGo, restricted to this site.
fn search(data: &SiteData, sprite: &str) -> Element {
    let host = data.site.url.host_str().unwrap_or_default();
    // ko: no header, k1: no ads, kz: no instant answers, km: centred results
    let hidden: [(&'static str, &str); 5] = [
        ("ko", "-2"),
        ("k1", "-1"),
        ("kz", "-1"),
        ("km", "m"),
        ("sites", host),
    ];
    el("form")
        .class("Search")
        .attr("action", "https://duckduckgo.com")
        .attr("target", "_blank")
        .attr("rel", "noopener")
        .children(hidden.into_iter().map(|(name, value)| {
            el("input")
                .attr("type", "hidden")
                .attr("name", name)
                .attr("value", value)
        }))
        .child(
            el("div")
                .class("grid pile items-center")
                .child(
                    el("input")
                        .attr("type", "search")
                        .attr("name", "q")
                        .attr("aria-label", "Search via DuckDuckGo")
                        .attr("placeholder", "Search")
                        .class("SearchInput"),
                )
                .child(icon(sprite, "search", 20)),
        )
}

const NAV_LINKS: &[(&str, &str, &str)] = &[
    ("/articles", "article", "Articles"),
    ("/notes", "note", "Notes"),
    ("/tags", "tag", "Tags"),
];

fn nav(sprite: &str, url: &str) -> Element {
    el("nav")
        .class("ProfileNav Sticky")
        .children(NAV_LINKS.iter().map(|&(target, icon_name, label)| {
            let (href, current) = nav_state(url, target);
            el("a")
                .class("ProfileNavLink")
                .attr("href", href)
                .attr("aria-current", current)
                .child(icon(sprite, icon_name, 16))
                .child(label)
        }))
}

/// Returns the `href` and `aria-current` of a navigation link to `target`
/// on the page at `current`. The link to the current page jumps to the
/// main content instead.
fn nav_state<'a>(current: &str, target: &'a str) -> (&'a str, &'static str) {
    let current = current.replacen(".html", "", 1).replacen("index", "", 1);
    if current == target {
        ("#main", "page")
    } else if target != "/" && current.contains(target) {
        (target, "true")
    } else {
        (target, "false")
    }
}

/// A list of feed items, each wrapped in an `<li>`.
pub fn feed<I, T>(items: I) -> Element
where
    I: IntoIterator<Item = T>,
    T: Into<Node>,
{
    el("ul")
        .class("Feed BorderBetween h-feed")
        .attr("id", "main")
        .children(items.into_iter().map(|item| el("li").child(item)))
}

/// A link to a tag's archive page.
pub fn tag_link(tag: &str) -> Element {
    el("a")
        .attr("href", format!("/tags/{}", slug::slugify(tag)))
        .child(format!("#{}", tag))
}

/// Trims an intro and marks it as cut short: a final `.` becomes `…`,
/// otherwise `…` is appended.
pub fn ellipsis(intro: &str) -> String {
    let trimmed = intro.trim();
    match trimmed.strip_suffix('.') {
        Some(stripped) => format!("{}…", stripped),
        None => format!("{}…", trimmed),
    }
}

/// A reading time in seconds as minutes, e.g. `1.5 mins`.
pub fn reading_minutes(seconds: f64) -> String {
    format!("{:.1} mins", seconds / 60.0)
}

/// A `<time>` element showing a date in a readable form, with the ISO form
/// as its `datetime`.
pub struct ReadableDate(pub NaiveDate);

impl Component for ReadableDate {
    fn render(&self) -> Node {
        el("time")
            .attr("datetime", dates::iso(self.0))
            .attr("title", dates::locale(self.0))
            .class("dt-published")
            .child(dates::readable(self.0))
            .into()
    }
}

/// A post as it appears in a feed: avatar, kind, date, title, then the
/// intro (cut short) or the full body with any photos.
pub struct Entry {
    post: Arc<Post>,
    assets: SiteAssets,

    /// Resolved URL and alt text of each photo.
    photos: Vec<(String, String)>,
}

impl Entry {
    pub fn new(post: &Arc<Post>, data: &SiteData) -> Entry {
        Entry {
            post: Arc::clone(post),
            assets: SiteAssets::new(data),
            photos: post
                .media
                .iter()
                .filter(|media| media.kind == "photo")
                .map(|media| {
                    (
                        data.assets.resolve(&media.url).to_owned(),
                        media.alt.clone().unwrap_or_default(),
                    )
                })
                .collect(),
        }
    }

    fn avatar(&self) -> Element {
        el("div").class("EntryAvatar h-card p-author").child(
            el("a")
                .class("u-url")
                .attr("href", "/")
                .attr("tabindex", "-1")
                .child(
                    el("img")
                        .class("u-photo p-name")
                        .attr("src", &self.assets.avatar)
                        .attr("alt", &self.assets.author)
                        .attr("width", 48)
                        .attr("height", 48)
                        .attr("loading", "lazy"),
                ),
        )
    }

    fn body(&self) -> Element {
        if let Some(intro) = &self.post.intro {
            return el("div")
                .class("EntryContent p-summary")
                .child(ellipsis(intro));
        }
        let media = (!self.photos.is_empty()).then(|| {
            el("div")
                .class("EntryMedia")
                .children(self.photos.iter().map(|(src, alt)| {
                    el("img")
                        .attr("src", src)
                        .attr("alt", alt)
                        .attr("loading", "lazy")
                }))
        });
        el("div")
            .class("EntryContent e-content")
            .child(raw(&self.post.content))
            .child(media)
    }
}

impl Component for Entry {
    fn render(&self) -> Node {
        let post = &self.post;
        let href = post.path();
        let tags = (!post.tags.is_empty()).then(|| {
            el("ul")
                .class("EntryTags")
                .children(post.tags.iter().map(|tag| el("li").child(tag_link(tag))))
        });

        el("article")
            .class("Entry h-entry")
            .child(self.avatar())
            .child(icon(&self.assets.sprite, post.kind.as_str(), 14).class("EntryIcon"))
            .child(
                el("div")
                    .class("EntryMeta")
                    .child(
                        el("a").attr("href", format!("/{}", post.kind.plural())).child(
                            el("span")
                                .class("EntryKind p-kind")
                                .child(post.kind.as_str()),
                        ),
                    )
                    .child(el("span").attr("aria-hidden", "true").child("•"))
                    .child(
                        el("a")
                            .class("EntryLink u-uid u-url")
                            .attr("href", &href)
                            .child(Node::component(ReadableDate(post.date))),
                    ),
            )
            .child(post.title.as_ref().map(|title| {
                el("h2").class("EntryTitle").child(
                    el("a")
                        .class("p-name u-url")
                        .attr("href", &href)
                        .attr("tabindex", "-1")
                        .child(title),
                )
            }))
            .child(self.body())
            .child(tags)
            .into()
    }
}

/// Text size of a [`PostLink`] title.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkSize {
    #[default]
    Small,
    Medium,
}

impl LinkSize {
    fn class(self) -> &'static str {
        match self {
            LinkSize::Small => "font-3",
            LinkSize::Medium => "font-4",
        }
    }
}

/// A compact link to a post with its date and reading time. Used for
/// previous/next/related links and tag archives.
pub struct PostLink {
    pub post: Arc<Post>,
    pub rel: Option<&'static str>,
    pub size: LinkSize,
    pub sprite: String,
}

impl Component for PostLink {
    fn render(&self) -> Node {
        let post = &self.post;
        el("div")
            .class("grid gap-2 lh-1")
            .child(
                el("a")
                    .attr("href", post.path())
                    .attr("rel", self.rel)
                    .class(self.size.class())
                    .child(post.display_title()),
            )
            .child(
                el("div")
                    .class("flex gap-2")
                    .child(
                        el("span")
                            .class("flex items-center gap-1 font-2")
                            .child(icon(&self.sprite, "calendar", 16).class("color-bright"))
                            .child(Node::component(ReadableDate(post.date))),
                    )
                    .child(
                        el("span")
                            .class("flex items-center gap-1 font-2")
                            .child(icon(&self.sprite, "clock", 16).class("color-bright"))
                            .child(el("span").child(reading_minutes(post.time))),
                    ),
            )
            .into()
    }
}
