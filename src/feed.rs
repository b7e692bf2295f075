//! Support for creating an Atom feed from a list of posts, plus the XSL
//! stylesheet browsers use to display it.

use crate::data::SiteData;
use crate::dates;
use crate::post::Post;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io;
use std::string::FromUtf8Error;
use std::sync::Arc;
use thiserror::Error;

/// Where the feed is published, relative to the site root.
pub const FEED_PATH: &str = "feed.xml";

/// Where [`FEED_STYLESHEET`] is published, relative to the site root.
pub const STYLESHEET_PATH: &str = "rss.xsl";

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

type XmlWriter = Writer<Vec<u8>>;

/// Renders an Atom feed of `posts` (newest first). The feed's `updated`
/// timestamp is the newest post's date, so unchanged content always yields
/// the same document. An empty list of posts is an error.
pub fn feed(data: &SiteData, posts: &[Arc<Post>]) -> Result<String> {
    let newest = posts.first().ok_or(Error::NoPosts)?;
    let site = &data.site;
    let site_url = data.absolute_url("");
    let site_url = site_url.trim_end_matches('/');

    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    w.write_event(Event::PI(BytesPI::new(format!(
        r#"xml-stylesheet href="/{}" type="text/xsl""#,
        STYLESHEET_PATH
    ))))?;
    w.write_event(Event::Start(
        BytesStart::new("feed").with_attributes([("xmlns", ATOM_NAMESPACE)]),
    ))?;

    text_element(&mut w, "title", &site.title)?;
    text_element(&mut w, "subtitle", &site.subtitle)?;
    link(&mut w, &data.absolute_url(FEED_PATH), Some("self"))?;
    link(&mut w, site_url, None)?;
    text_element(&mut w, "updated", &dates::iso(newest.date))?;
    text_element(&mut w, "id", site_url)?;

    w.write_event(Event::Start(BytesStart::new("author")))?;
    text_element(&mut w, "name", &site.author.name)?;
    if let Some(email) = &site.author.email {
        text_element(&mut w, "email", email)?;
    }
    w.write_event(Event::End(BytesEnd::new("author")))?;

    for post in posts {
        entry(&mut w, data, post)?;
    }

    w.write_event(Event::End(BytesEnd::new("feed")))?;
    Ok(String::from_utf8(w.into_inner())?)
}

fn entry(w: &mut XmlWriter, data: &SiteData, post: &Post) -> Result<()> {
    let url = data.absolute_url(&post.path());
    w.write_event(Event::Start(BytesStart::new("entry")))?;
    text_element(w, "title", post.display_title())?;
    link(w, &url, None)?;
    text_element(w, "updated", &dates::iso(post.date))?;
    text_element(w, "id", &url)?;
    w.write_event(Event::Start(
        BytesStart::new("content").with_attributes([("type", "html")]),
    ))?;
    // a CDATA section can't contain its own terminator, so split around it
    let content = post.content.replace("]]>", "]]]]><![CDATA[>");
    w.write_event(Event::CData(BytesCData::new(content)))?;
    w.write_event(Event::End(BytesEnd::new("content")))?;
    w.write_event(Event::End(BytesEnd::new("entry")))?;
    Ok(())
}

fn text_element(w: &mut XmlWriter, tag: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(tag)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn link(w: &mut XmlWriter, href: &str, rel: Option<&str>) -> Result<()> {
    let mut elem = BytesStart::new("link");
    elem.push_attribute(("href", href));
    if let Some(rel) = rel {
        elem.push_attribute(("rel", rel));
    }
    w.write_event(Event::Empty(elem))?;
    Ok(())
}

/// Renders the feed as a readable page when it is opened in a browser.
pub const FEED_STYLESHEET: &str = r#"<xsl:stylesheet
  version="3.0"
  xmlns:xsl="http://www.w3.org/1999/XSL/Transform"
  xmlns:atom="http://www.w3.org/2005/Atom"
  exclude-result-prefixes="atom"
>
  <xsl:output method="html" version="1.0" encoding="UTF-8" indent="yes" />
  <xsl:template match="/">
    <html xmlns="http://www.w3.org/1999/xhtml">
      <head>
        <title><xsl:value-of select="atom:feed/atom:title" /> web feed</title>
        <meta http-equiv="Content-Type" content="text/html; charset=utf-8" />
        <meta name="viewport" content="width=device-width, initial-scale=1" />
      </head>
      <body>
        <header>
          <h1><xsl:value-of select="atom:feed/atom:title" /></h1>
          <p><xsl:value-of select="atom:feed/atom:subtitle" /></p>
        </header>
        <h2>Posts</h2>
        <xsl:for-each select="atom:feed/atom:entry">
          <div>
            <h3>
              <a target="_blank">
                <xsl:attribute name="href">
                  <xsl:value-of select="atom:link/@href" />
                </xsl:attribute>
                <xsl:value-of select="atom:title" />
              </a>
            </h3>
            <small>Published: <xsl:value-of select="atom:updated" /></small>
          </div>
        </xsl:for-each>
      </body>
    </html>
  </xsl:template>
</xsl:stylesheet>
"#;

/// The result of a feed operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error generating a feed.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when there are no posts to date the feed by.
    #[error("a feed needs at least one post")]
    NoPosts,

    /// Returned when writing the document fails.
    #[error("writing feed: {0}")]
    Io(#[from] io::Error),

    /// Returned when the XML writer rejects an event.
    #[error("writing feed: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Returned if the document isn't valid UTF-8.
    #[error("feed is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}
