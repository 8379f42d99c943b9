//! Element Model - Immutable descriptions of what the UI should look like.
//!
//! Elements are rebuilt on every render pass and never mutated. An element is
//! a type (host tag, text, or component function) plus a [`Props`] record
//! whose children are themselves elements.
//!
//! # Children
//!
//! [`create_element`] accepts anything convertible into a [`Child`]:
//!
//! ```ignore
//! create_element("ul", Props::new(), children![
//!     create_element("li", Props::new(), children!["first"]),
//!     show_second.then(|| create_element("li", Props::new(), children!["second"])),
//!     false,               // dropped
//!     "   ",               // dropped (blank)
//!     vec!["a", "b"],      // flattened into two text children
//!     42,                  // text "42"
//! ]);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::error::Rendered;
use crate::state::Scope;
use crate::types::{NODE_VALUE, Props};

// =============================================================================
// Component
// =============================================================================

/// Render function of a component.
pub type ComponentFn = fn(&mut Scope<'_>, &Props) -> Rendered;

/// A named function component.
///
/// Two components are the same type when they wrap the same function and
/// carry the same name.
#[derive(Clone, Copy)]
pub struct Component {
    name: &'static str,
    render: ComponentFn,
}

impl Component {
    pub const fn new(name: &'static str, render: ComponentFn) -> Self {
        Self { name, render }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn call(&self, scope: &mut Scope<'_>, props: &Props) -> Rendered {
        (self.render)(scope, props)
    }

    fn address(&self) -> usize {
        self.render as usize
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address() && self.name == other.name
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name)
    }
}

// =============================================================================
// Element Type
// =============================================================================

/// What kind of node an element (or fiber) describes.
#[derive(Clone, PartialEq, Eq)]
pub enum ElementType {
    /// Host tag such as `"div"`.
    Host(Rc<str>),
    /// Text leaf; the string lives in the `nodeValue` prop.
    Text,
    /// Function component.
    Component(Component),
}

impl ElementType {
    pub fn is_component(&self) -> bool {
        matches!(self, ElementType::Component(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ElementType::Text)
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            ElementType::Host(tag) => Some(tag),
            _ => None,
        }
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Host(tag) => write!(f, "{tag}"),
            ElementType::Text => write!(f, "#text"),
            ElementType::Component(c) => write!(f, "{c:?}"),
        }
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        ElementType::Host(Rc::from(tag))
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        ElementType::Host(Rc::from(tag))
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        ElementType::Component(component)
    }
}

// =============================================================================
// Element
// =============================================================================

struct ElementData {
    ty: ElementType,
    props: Props,
}

/// Immutable element description. Cloning is cheap (shared).
#[derive(Clone)]
pub struct Element(Rc<ElementData>);

impl Element {
    fn from_parts(ty: ElementType, props: Props) -> Self {
        Element(Rc::new(ElementData { ty, props }))
    }

    pub fn ty(&self) -> &ElementType {
        &self.0.ty
    }

    pub fn props(&self) -> &Props {
        &self.0.props
    }

    pub fn children(&self) -> &[Element] {
        self.0.props.children()
    }

    /// String value when this is a text element.
    pub fn text_value(&self) -> Option<&str> {
        match self.0.ty {
            ElementType::Text => self.0.props.get_str(NODE_VALUE),
            _ => None,
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || (self.0.ty == other.0.ty && self.0.props == other.0.props)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = self.text_value() {
            return write!(f, "{value:?}");
        }
        f.debug_struct("Element")
            .field("type", &self.0.ty)
            .field("props", &self.0.props)
            .finish()
    }
}

// =============================================================================
// Children
// =============================================================================

/// Anything that can appear in a children list.
#[derive(Debug, Clone)]
pub enum Child {
    Element(Element),
    Text(String),
    Group(Vec<Child>),
    /// `None` / `false`: renders nothing.
    Empty,
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Element(element)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<&String> for Child {
    fn from(text: &String) -> Self {
        Child::Text(text.clone())
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        if value {
            Child::Text(value.to_string())
        } else {
            Child::Empty
        }
    }
}

macro_rules! child_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Child::Text(value.to_string())
                }
            }
        )*
    };
}

child_from_number!(i32, i64, u32, u64, usize, f64);

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Child::Empty, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(values: Vec<T>) -> Self {
        Child::Group(values.into_iter().map(Into::into).collect())
    }
}

/// Build a `Vec<Child>` from heterogeneous values.
#[macro_export]
macro_rules! children {
    () => { ::std::vec::Vec::<$crate::element::Child>::new() };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$($crate::element::Child::from($child)),+]
    };
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

fn collect_children(child: Child, out: &mut Vec<Element>) {
    match child {
        Child::Element(element) => out.push(element),
        Child::Text(text) if is_blank(&text) => {}
        Child::Text(text) => out.push(text_element(text)),
        Child::Group(group) => {
            for child in group {
                collect_children(child, out);
            }
        }
        Child::Empty => {}
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Create an element.
///
/// Children are flattened, filtered (empty values and blank strings are
/// dropped) and anything that is not already an element becomes a text
/// element. The cleaned children replace any `children` in `props`.
pub fn create_element(
    ty: impl Into<ElementType>,
    props: Props,
    children: impl IntoIterator<Item = Child>,
) -> Element {
    let mut cleaned = Vec::new();
    for child in children {
        collect_children(child, &mut cleaned);
    }
    Element::from_parts(ty.into(), props.with_children(cleaned))
}

/// Create a text element carrying `value`.
pub fn text_element(value: impl Into<String>) -> Element {
    let props = Props::new().with(NODE_VALUE, value.into());
    Element::from_parts(ElementType::Text, props)
}

/// Shorthand for a component element without children.
pub fn component(component: Component, props: Props) -> Element {
    create_element(component, props, [])
}
