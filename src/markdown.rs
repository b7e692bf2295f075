//! Converts post bodies from markdown to HTML.
//!
//! Most events go straight through [`pulldown_cmark::html`]. Three are
//! intercepted and replaced with hand-written HTML:
//!
//! * Headings get a slug `id` and a leading `.hash` anchor linking to it.
//! * Fenced code blocks are highlighted with [`syntect`] (CSS classes, no
//!   inline styles) when the info string names a known language. A second
//!   word in the info string (e.g. ```` ```rust src/main.rs ````) is shown
//!   as a file caption.
//! * Images are resolved through the [`AssetMap`]; `.mp4` sources become an
//!   autoplaying, muted, looping `<video>`.

use crate::assets::AssetMap;
use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};
use std::sync::LazyLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Converts `markdown` to HTML, appending the result onto `w`. Image sources
/// and the code-caption icon are looked up in `assets`.
pub fn to_html(w: &mut String, markdown: &str, assets: &AssetMap) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut events = Parser::new_ext(markdown, options);
    let mut converted = Vec::new();
    while let Some(ev) = events.next() {
        converted.push(match ev {
            Event::Start(Tag::Heading { level, .. }) => heading(level, &mut events),
            Event::Start(Tag::CodeBlock(kind)) => code_block(&kind, &mut events, assets),
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => image(&dest_url, &title, &mut events, assets),
            ev => ev,
        });
    }
    html::push_html(w, converted.into_iter());
}

fn heading<'a>(
    level: HeadingLevel,
    events: &mut impl Iterator<Item = Event<'a>>,
) -> Event<'a> {
    let mut text = String::new();
    let mut inner = Vec::new();
    for ev in events.by_ref() {
        if let Event::End(TagEnd::Heading(_)) = ev {
            break;
        }
        if let Event::Text(t) | Event::Code(t) = &ev {
            text.push_str(t);
        }
        inner.push(ev);
    }

    let mut body = String::new();
    html::push_html(&mut body, inner.into_iter());

    let n = heading_number(level);
    let slug = slug::slugify(&text);
    let html = format!(
        r##"<h{n} id="{slug}"><a class="hash" href="#{slug}" aria-label="Link to heading"></a>{body}</h{n}>"##
    );
    Event::Html(CowStr::from(html + "\n"))
}

fn heading_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn code_block<'a>(
    kind: &CodeBlockKind,
    events: &mut impl Iterator<Item = Event<'a>>,
    assets: &AssetMap,
) -> Event<'a> {
    let mut code = String::new();
    for ev in events.by_ref() {
        match ev {
            Event::End(TagEnd::CodeBlock) => break,
            Event::Text(text) => code.push_str(&text),
            _ => {}
        }
    }

    let info = match kind {
        CodeBlockKind::Fenced(info) => info.as_ref(),
        CodeBlockKind::Indented => "",
    };
    let mut words = info.split_whitespace();
    let lang = words.next();
    let file = words.next();

    let mut out = String::from(r#"<div class="Code">"#);
    if let Some(file) = file {
        out.push_str(&format!(
            r##"<p class="CodeFile"><svg width="12" height="12" aria-hidden="true"><use href="{}#file"/></svg>{}</p>"##,
            html_escape::encode_double_quoted_attribute(assets.resolve("sprite.svg")),
            html_escape::encode_text(file),
        ));
    }
    out.push_str(r#"<pre><code class="CodeSyntax">"#);
    out.push_str(&highlight(&code, lang));
    out.push_str("</code></pre></div>\n");
    Event::Html(CowStr::from(out))
}

/// Highlights `code` as `lang`, falling back to plain escaped text when the
/// language is missing or unknown.
fn highlight(code: &str, lang: Option<&str>) -> String {
    let highlighted = lang
        .and_then(|lang| SYNTAX_SET.find_syntax_by_token(lang))
        .map(|syntax| highlight_with(code, syntax));
    match highlighted {
        Some(Ok(html)) => html,
        _ => html_escape::encode_text(code).into_owned(),
    }
}

fn highlight_with(code: &str, syntax: &SyntaxReference) -> Result<String, syntect::Error> {
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(generator.finalize())
}

fn image<'a>(
    dest: &str,
    title: &str,
    events: &mut impl Iterator<Item = Event<'a>>,
    assets: &AssetMap,
) -> Event<'a> {
    // alt text is the image's inline content flattened to text
    let mut alt = String::new();
    let mut depth = 0usize;
    for ev in events.by_ref() {
        match ev {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth > 0 => depth -= 1,
            Event::End(_) => break,
            Event::Text(text) | Event::Code(text) => alt.push_str(&text),
            _ => {}
        }
    }

    let src = html_escape::encode_double_quoted_attribute(assets.resolve(dest));
    let html = if dest.ends_with(".mp4") {
        format!(r#"<video src="{}" controls autoplay muted loop playsinline></video>"#, src)
    } else {
        let mut img = format!(r#"<img src="{}""#, src);
        if !alt.is_empty() {
            img.push_str(&format!(
                r#" alt="{}""#,
                html_escape::encode_double_quoted_attribute(&alt)
            ));
        }
        if !title.is_empty() {
            img.push_str(&format!(
                r#" title="{}""#,
                html_escape::encode_double_quoted_attribute(title)
            ));
        }
        img.push('>');
        img
    };
    Event::InlineHtml(CowStr::from(html))
}
