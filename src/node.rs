//! Defines the [`Node`] type, the in-memory tree that page templates and
//! [`crate::components`] build and that [`crate::render`] serializes to HTML.
//!
//! A tree is made of leaves (text, trusted raw HTML, nothing at all),
//! [`Element`]s with a tag name, ordered attributes and children, fragments
//! (ordered sequences of nodes) and [`Component`]s. A component is anything
//! that can produce another [`Node`] when invoked; the renderer resolves it by
//! calling [`Component::render`] and rendering whatever comes back. Trees own
//! all of their data and have no back-references, so every page builds a
//! fresh one.

use std::borrow::Cow;
use std::fmt;

/// The name of an element or attribute. Almost always a `&'static str`
/// literal, but owned names are accepted too.
pub type Name = Cow<'static, str>;

/// A composable piece of markup. Implemented by the structs in
/// [`crate::components`] and by any `Fn() -> Node` closure.
pub trait Component: Send + Sync {
    /// Produces the subtree this component stands for.
    fn render(&self) -> Node;
}

impl<F> Component for F
where
    F: Fn() -> Node + Send + Sync,
{
    fn render(&self) -> Node {
        self()
    }
}

/// The value of an [`Element`] attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attr {
    /// A boolean attribute. `true` renders the bare attribute name (e.g.
    /// `<details open>`), `false` omits the attribute.
    Flag(bool),

    /// Renders as `name="value"`.
    Value(String),

    /// Omitted entirely. This is what `None` converts into.
    Absent,
}

impl From<bool> for Attr {
    fn from(flag: bool) -> Attr {
        Attr::Flag(flag)
    }
}

impl From<&str> for Attr {
    fn from(value: &str) -> Attr {
        Attr::Value(value.to_owned())
    }
}

impl From<String> for Attr {
    fn from(value: String) -> Attr {
        Attr::Value(value)
    }
}

impl From<&String> for Attr {
    fn from(value: &String) -> Attr {
        Attr::Value(value.clone())
    }
}

impl<T: Into<Attr>> From<Option<T>> for Attr {
    fn from(value: Option<T>) -> Attr {
        match value {
            Some(value) => value.into(),
            None => Attr::Absent,
        }
    }
}

macro_rules! numeric_conversions {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Attr {
                fn from(value: $t) -> Attr {
                    Attr::Value(value.to_string())
                }
            }

            impl From<$t> for Node {
                fn from(value: $t) -> Node {
                    Node::Text(value.to_string())
                }
            }
        )*
    };
}

numeric_conversions!(i32, i64, u16, u32, u64, usize, f64);

/// An element with a tag name, attributes in insertion order, and children.
#[derive(Debug)]
pub struct Element {
    /// The tag name, e.g. `div`.
    pub name: Name,

    /// The attributes, rendered in this order.
    pub attrs: Vec<(Name, Attr)>,

    /// The children, rendered in this order. Ignored for void elements.
    pub children: Vec<Node>,
}

impl Element {
    /// Sets an attribute. Setting an attribute that is already present
    /// replaces its value but keeps its original position.
    pub fn attr(mut self, name: impl Into<Name>, value: impl Into<Attr>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
        self
    }

    /// Shorthand for `attr("class", value)`.
    pub fn class(self, value: impl Into<Attr>) -> Self {
        self.attr("class", value)
    }

    /// Appends a child.
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends every item of `children`.
    pub fn children<I, T>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

/// A node in the component tree.
pub enum Node {
    /// Renders to nothing. `false` and `None` convert into this.
    Empty,

    /// Text content. Escaped when rendered.
    Text(String),

    /// Trusted HTML, written verbatim. Used for markdown output, highlighted
    /// code, inline stylesheets and generated XML.
    Raw(String),

    /// An ordered sequence of nodes rendered back to back.
    Fragment(Vec<Node>),

    /// An element.
    Element(Element),

    /// A component, resolved by invocation at render time.
    Component(Box<dyn Component>),
}

impl Node {
    /// Wraps a [`Component`] in a node.
    pub fn component(component: impl Component + 'static) -> Node {
        Node::Component(Box::new(component))
    }

    /// Returns `true` if this node is [`Node::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }
}

impl Default for Node {
    fn default() -> Node {
        Node::Empty
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Empty => f.write_str("Empty"),
            Node::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Node::Raw(html) => f.debug_tuple("Raw").field(html).finish(),
            Node::Fragment(nodes) => f.debug_tuple("Fragment").field(nodes).finish(),
            Node::Element(element) => element.fmt(f),
            Node::Component(_) => f.write_str("Component(..)"),
        }
    }
}

/// Creates an element with the given tag name and no attributes or children.
pub fn el(name: impl Into<Name>) -> Element {
    Element {
        name: name.into(),
        attrs: Vec::new(),
        children: Vec::new(),
    }
}

/// Creates a fragment from a sequence of nodes.
pub fn fragment<I, T>(nodes: I) -> Node
where
    I: IntoIterator<Item = T>,
    T: Into<Node>,
{
    Node::Fragment(nodes.into_iter().map(Into::into).collect())
}

/// Creates a trusted raw HTML node.
pub fn raw(html: impl Into<String>) -> Node {
    Node::Raw(html.into())
}

impl From<Element> for Node {
    fn from(element: Element) -> Node {
        Node::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Node {
        Node::Text(text.to_owned())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Node {
        Node::Text(text)
    }
}

impl From<&String> for Node {
    fn from(text: &String) -> Node {
        Node::Text(text.clone())
    }
}

impl From<bool> for Node {
    /// `true` renders as the text `true`; `false` renders as nothing.
    fn from(value: bool) -> Node {
        match value {
            true => Node::Text(String::from("true")),
            false => Node::Empty,
        }
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Node {
        match value {
            Some(value) => value.into(),
            None => Node::Empty,
        }
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(nodes: Vec<T>) -> Node {
        fragment(nodes)
    }
}
