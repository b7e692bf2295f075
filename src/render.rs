//! Serializes a [`Node`] tree into an HTML string.
//!
//! Rendering is a pure, recursive walk over the tree: components are invoked
//! and their output rendered in their place, fragments are concatenated with
//! no separator, text and attribute values are escaped, and [`Node::Raw`] is
//! written verbatim. Void elements (see [`VOID_ELEMENTS`]) are written as a
//! bare open tag without a slash, and any children they were given are
//! dropped.

use crate::node::{Attr, Element, Node};

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Renders `node` to a new [`String`].
pub fn render(node: &Node) -> String {
    let mut out = String::new();
    render_into(&mut out, node);
    out
}

/// Renders `node`, appending the result onto `out`.
pub fn render_into(out: &mut String, node: &Node) {
    match node {
        Node::Empty => {}
        Node::Text(text) => out.push_str(&html_escape::encode_text(text)),
        Node::Raw(html) => out.push_str(html),
        Node::Fragment(nodes) => {
            for node in nodes {
                render_into(out, node);
            }
        }
        Node::Element(element) => render_element(out, element),
        Node::Component(component) => render_into(out, &component.render()),
    }
}

fn render_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attrs {
        match value {
            Attr::Flag(true) => {
                out.push(' ');
                out.push_str(name);
            }
            Attr::Flag(false) | Attr::Absent => {}
            Attr::Value(value) => {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(value));
                out.push('"');
            }
        }
    }
    out.push('>');

    if is_void(&element.name) {
        return;
    }

    for child in &element.children {
        render_into(out, child);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::node::{el, fragment, raw, Component};

    #[test]
    fn test_render_element() {
        let content = el("h1").class("test").child("Hello");
        assert_eq!(r#"<h1 class="test">Hello</h1>"#, render(&content.into()));
    }

    #[test]
    fn test_render_void_element() {
        let content = el("input").attr("type", "number");
        assert_eq!(r#"<input type="number">"#, render(&content.into()));
    }

    #[test]
    fn test_render_void_element_drops_children() {
        let content = el("br").child("ignored");
        assert_eq!("<br>", render(&content.into()));
    }

    #[test]
    fn test_render_boolean_attribute_set() {
        let content = el("details")
            .attr("open", true)
            .child(el("summary").child("Toggle"));
        assert_eq!(
            "<details open><summary>Toggle</summary></details>",
            render(&content.into()),
        );
    }

    #[test]
    fn test_render_boolean_attribute_removed() {
        let content = el("details")
            .attr("open", false)
            .attr("title", None::<String>)
            .child(el("summary").child("Toggle"));
        assert_eq!(
            "<details><summary>Toggle</summary></details>",
            render(&content.into()),
        );
    }

    #[test]
    fn test_render_nothing() {
        assert_eq!("", render(&Node::from(false)));
        assert_eq!("", render(&Node::Empty));
        assert_eq!("", render(&Node::from(None::<&str>)));
    }

    #[test]
    fn test_render_primitives() {
        assert_eq!("test", render(&Node::from("test")));
        assert_eq!("true", render(&Node::from(true)));
        assert_eq!("999", render(&Node::from(999)));
    }

    #[test]
    fn test_render_array_matches_fragment() {
        let array = Node::from(vec![el("p").child("test"), el("b").child("2")]);
        let wrapped = fragment(vec![el("p").child("test"), el("b").child("2")]);
        assert_eq!("<p>test</p><b>2</b>", render(&array));
        assert_eq!(render(&array), render(&wrapped));
    }

    #[test]
    fn test_render_multiple_children() {
        let content = el("section")
            .child(el("h2").attr("id", "title").child("Title"))
            .child(el("p").child("test"));
        assert_eq!(
            r#"<section><h2 id="title">Title</h2><p>test</p></section>"#,
            render(&content.into()),
        );
    }

    struct Title {
        children: String,
    }

    impl Component for Title {
        fn render(&self) -> Node {
            el("h2")
                .attr("id", self.children.to_lowercase())
                .child(&self.children)
                .into()
        }
    }

    #[test]
    fn test_render_component() {
        let content = el("section")
            .child(Node::component(Title {
                children: String::from("Title"),
            }))
            .child(el("p").child("test"));
        assert_eq!(
            r#"<section><h2 id="title">Title</h2><p>test</p></section>"#,
            render(&content.into()),
        );
    }

    #[test]
    fn test_render_closure_component() {
        let content = Node::component(|| -> Node { el("em").child("hi").into() });
        assert_eq!("<em>hi</em>", render(&content));
    }

    #[test]
    fn test_render_escapes_text_and_attributes() {
        let content = el("a")
            .attr("title", r#"say "hi" & bye"#)
            .child("1 < 2 & 3 > 2");
        assert_eq!(
            r#"<a title="say &quot;hi&quot; &amp; bye">1 &lt; 2 &amp; 3 &gt; 2</a>"#,
            render(&content.into()),
        );
    }

    #[test]
    fn test_render_raw_verbatim() {
        let content = el("div").child(raw("<p>trusted & raw</p>"));
        assert_eq!("<div><p>trusted & raw</p></div>", render(&content.into()));
    }

    #[test]
    fn test_render_is_pure() {
        let build = || {
            Node::from(
                el("ul")
                    .child(el("li").attr("hidden", true).child(1))
                    .child(el("li").child(Node::component(|| Node::from("x")))),
            )
        };
        let tree = build();
        assert_eq!(render(&tree), render(&tree));
        assert_eq!(render(&tree), render(&build()));
    }
}
