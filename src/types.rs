//! Core types for spark-fiber.
//!
//! These types flow from element descriptions through the fiber tree and
//! end up applied to host nodes by the commit engine.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::element::Element;

/// Prop key holding the string value of a text element.
pub const NODE_VALUE: &str = "nodeValue";

// =============================================================================
// Events
// =============================================================================

/// Event delivered by the host to a bound handler.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    /// Host-level event kind (`"click"`, `"change"`, ...).
    pub kind: String,
    /// Value carried by change-style events.
    pub value: Option<String>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: None,
        }
    }

    /// Attach a value (e.g. the new contents of an input).
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Event handler callback.
///
/// Rc so handlers can be cloned into host nodes and compared by identity.
pub type EventHandler = Rc<dyn Fn(&Event)>;

// =============================================================================
// Prop Value
// =============================================================================

/// A single prop value.
///
/// Scalars compare by value. Handlers and opaque data compare by pointer
/// identity, so a closure recreated on every render counts as a change.
#[derive(Clone)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(EventHandler),
    Data(Rc<dyn Any>),
}

impl PropValue {
    /// Wrap a closure as an event handler value.
    pub fn handler(f: impl Fn(&Event) + 'static) -> Self {
        PropValue::Handler(Rc::new(f))
    }

    /// Wrap arbitrary data (shared, compared by identity).
    pub fn data<T: Any>(value: T) -> Self {
        PropValue::Data(Rc::new(value))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(h) => Some(h),
            _ => None,
        }
    }

    pub fn is_handler(&self) -> bool {
        matches!(self, PropValue::Handler(_))
    }

    /// String form used when the value is written as an attribute.
    pub fn to_attribute(&self) -> String {
        match self {
            PropValue::Str(s) => s.clone(),
            PropValue::Int(n) => n.to_string(),
            PropValue::Float(n) => n.to_string(),
            PropValue::Bool(b) => b.to_string(),
            PropValue::Handler(_) => "[handler]".to_string(),
            PropValue::Data(_) => "[data]".to_string(),
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a.to_bits() == b.to_bits(),
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => {
                Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
            }
            (PropValue::Data(a), PropValue::Data(b)) => {
                Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(s) => write!(f, "{s:?}"),
            PropValue::Int(n) => write!(f, "{n}"),
            PropValue::Float(n) => write!(f, "{n}"),
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Handler(h) => write!(f, "Handler({:p})", Rc::as_ptr(h).cast::<()>()),
            PropValue::Data(d) => write!(f, "Data({:p})", Rc::as_ptr(d).cast::<()>()),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value.into())
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

// =============================================================================
// Props
// =============================================================================

/// Immutable-by-convention prop record: named values plus the children
/// sequence.
///
/// Insertion order is preserved so host mutations happen in the order the
/// props were written.
#[derive(Clone, Default, PartialEq)]
pub struct Props {
    values: IndexMap<String, PropValue>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a prop.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Builder: add an event handler prop.
    pub fn on(self, name: impl Into<String>, handler: impl Fn(&Event) + 'static) -> Self {
        self.with(name, PropValue::handler(handler))
    }

    /// Builder: add an opaque data prop.
    pub fn with_data<T: Any>(self, name: impl Into<String>, value: T) -> Self {
        self.with(name, PropValue::data(value))
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    /// Downcast a `Data` prop.
    pub fn get_data<T: Any>(&self, name: &str) -> Option<Rc<T>> {
        match self.get(name)? {
            PropValue::Data(data) => Rc::clone(data).downcast::<T>().ok(),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Named props in insertion order (children excluded).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub(crate) fn with_children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        map.entries(self.values.iter());
        if !self.children.is_empty() {
            map.entry(&"children", &self.children);
        }
        map.finish()
    }
}

// =============================================================================
// Effect Tags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// What the commit phase has to do for a fiber.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EffectTag: u8 {
        const NONE = 0;
        /// New fiber without an alternate; its host node is created fresh.
        const PLACEMENT = 1 << 0;
        /// Fiber reusing its alternate's host node.
        const UPDATE = 1 << 1;
        /// Committed fiber scheduled for removal.
        const DELETION = 1 << 2;
    }
}

// =============================================================================
// Tests
// =============================================================================
