//! The declarative tree model.
//!
//! [`Node`] trees are immutable once built. Each render cycle builds a new tree, which the
//! [`Reconciler`](`crate::diff::Reconciler`) compares against the previous one.

use core::{
	fmt::{self, Debug, Formatter},
	hash::{Hash, Hasher},
};
use std::rc::Rc;
use tracing::{trace, warn};

/// Attribute names starting with this prefix bind event listeners when given a [`Handler`].
///
/// The event name is the remainder, lower-cased: `onClick` listens for `click`.
pub const EVENT_PREFIX: &str = "on";

/// Alias for the `class` attribute.
pub const CLASS_ALIAS: &str = "className";

/// An event delivered to a [`Handler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
	pub name: String,
	/// The current value of the event target, for form controls.
	pub value: Option<String>,
}
impl Event {
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), value: None }
	}

	#[must_use]
	pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: Some(value.into()),
		}
	}
}

/// A shared event handler.
///
/// Equality and hashing are by reference: two clones of the same [`Handler`] are equal,
/// two separately created ones never are.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);
impl Handler {
	pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &Event) {
		(self.0)(event)
	}

	/// The address identifying this handler.
	#[must_use]
	pub fn addr(&self) -> usize {
		Rc::as_ptr(&self.0).cast::<()>() as usize
	}
}
impl PartialEq for Handler {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}
impl Eq for Handler {}
impl Hash for Handler {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr().hash(state)
	}
}
impl Debug for Handler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Handler({:#x})", self.addr())
	}
}
impl<F: Fn(&Event) + 'static> From<F> for Handler {
	fn from(handler: F) -> Self {
		Self::new(handler)
	}
}

/// The value of an [`Attribute`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
	Text(String),
	/// Present without value when `true`, omitted when `false`.
	Bool(bool),
	Handler(Handler),
	/// Inline style properties, applied individually.
	Style(Vec<(String, String)>),
}
impl AttrValue {
	#[must_use]
	pub fn as_text(&self) -> Option<&str> {
		match self {
			AttrValue::Text(text) => Some(text),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_handler(&self) -> Option<&Handler> {
		match self {
			AttrValue::Handler(handler) => Some(handler),
			_ => None,
		}
	}
}
impl From<&str> for AttrValue {
	fn from(text: &str) -> Self {
		AttrValue::Text(text.to_owned())
	}
}
impl From<String> for AttrValue {
	fn from(text: String) -> Self {
		AttrValue::Text(text)
	}
}
impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		AttrValue::Bool(value)
	}
}
impl From<Handler> for AttrValue {
	fn from(handler: Handler) -> Self {
		AttrValue::Handler(handler)
	}
}
impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for AttrValue {
	fn from(properties: Vec<(K, V)>) -> Self {
		AttrValue::Style(properties.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
macro_rules! attr_value_from_display {
	($($t:ty),*$(,)?) => {$(
		impl From<$t> for AttrValue {
			fn from(value: $t) -> Self {
				AttrValue::Text(value.to_string())
			}
		}
	)*};
}
attr_value_from_display!(i32, i64, u32, u64, usize, f64);

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
	pub name: String,
	pub value: AttrValue,
}
impl Attribute {
	pub fn new(name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
		}
	}

	/// The event name this attribute listens for, if it is an event binding.
	#[must_use]
	pub fn event_name(&self) -> Option<String> {
		match self.value {
			AttrValue::Handler(_) => self.name.strip_prefix(EVENT_PREFIX).filter(|suffix| !suffix.is_empty()).map(str::to_lowercase),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
	pub tag: String,
	pub attributes: Vec<Attribute>,
	pub children: Vec<Node>,
}
impl Element {
	#[must_use]
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			attributes: Vec::new(),
			children: Vec::new(),
		}
	}

	/// Sets `name`, replacing an earlier attribute of the same name.
	#[must_use]
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		set_attribute(&mut self.attributes, Attribute::new(name, value));
		self
	}

	/// Binds `handler` to `event` (`"click"` becomes `onClick`).
	#[must_use]
	pub fn on(self, event: &str, handler: impl Into<Handler>) -> Self {
		let mut name = String::from(EVENT_PREFIX);
		let mut chars = event.chars();
		if let Some(first) = chars.next() {
			name.extend(first.to_uppercase());
			name.push_str(chars.as_str());
		}
		self.attr(name, handler.into())
	}

	/// Appends `child` with the same normalisation as [`h`].
	#[must_use]
	pub fn child(mut self, child: impl Into<Child>) -> Self {
		self.children.extend(normalize_children(vec![child.into()]));
		self
	}

	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
		self.attributes.iter().find(|a| a.name == name).map(|a| &a.value)
	}
}

/// A node of the declarative tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
	Element(Element),
	Text(String),
	/// Absent output. Renders nothing and occupies no DOM slot.
	Empty,
}
impl Node {
	/// The element tag, or [`None`] for text and empty nodes.
	#[must_use]
	pub fn tag(&self) -> Option<&str> {
		match self {
			Node::Element(element) => Some(&element.tag),
			Node::Text(_) | Node::Empty => None,
		}
	}

	/// Whether `self` can be patched into `other` in place.
	#[must_use]
	pub fn same_kind(&self, other: &Node) -> bool {
		match (self, other) {
			(Node::Element(a), Node::Element(b)) => a.tag == b.tag,
			(Node::Text(_), Node::Text(_)) | (Node::Empty, Node::Empty) => true,
			_ => false,
		}
	}

	/// How many live DOM nodes this node renders to at its own level.
	#[must_use]
	pub fn dom_len(&self) -> usize {
		match self {
			Node::Element(_) | Node::Text(_) => 1,
			Node::Empty => 0,
		}
	}

	#[must_use]
	pub fn as_element(&self) -> Option<&Element> {
		match self {
			Node::Element(element) => Some(element),
			_ => None,
		}
	}

	#[must_use]
	pub fn text(value: impl Into<String>) -> Self {
		Node::Text(value.into())
	}
}
impl From<Element> for Node {
	fn from(element: Element) -> Self {
		Node::Element(element)
	}
}

/// Constructor argument for children, before normalisation.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
	/// Dropped (`None`, `false`).
	Skip,
	Node(Node),
	Text(String),
	/// Spliced into the parent's children.
	List(Vec<Child>),
}
impl From<Node> for Child {
	fn from(node: Node) -> Self {
		Child::Node(node)
	}
}
impl From<Element> for Child {
	fn from(element: Element) -> Self {
		Child::Node(Node::Element(element))
	}
}
impl From<&str> for Child {
	fn from(text: &str) -> Self {
		Child::Text(text.to_owned())
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
	/// `false` is dropped. `true` is kept, but renders nothing.
	fn from(value: bool) -> Self {
		if value {
			Child::Node(Node::Empty)
		} else {
			Child::Skip
		}
	}
}
impl<T: Into<Child>> From<Option<T>> for Child {
	fn from(value: Option<T>) -> Self {
		value.map_or(Child::Skip, Into::into)
	}
}
impl<T: Into<Child>> From<Vec<T>> for Child {
	fn from(items: Vec<T>) -> Self {
		Child::List(items.into_iter().map(Into::into).collect())
	}
}
macro_rules! child_from_display {
	($($t:ty),*$(,)?) => {$(
		impl From<$t> for Child {
			fn from(value: $t) -> Self {
				Child::Text(value.to_string())
			}
		}
	)*};
}
child_from_display!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

/// Builds an element node.
///
/// Attribute names are unique: a later attribute replaces an earlier one of the same name, in its position.
/// `children` are flattened one level deep, `None`/`false` entries are dropped and
/// strings/numbers become [`Node::Text`]. An empty `tag` yields [`Node::Empty`].
#[must_use]
pub fn h(tag: impl Into<String>, attributes: Vec<Attribute>, children: Vec<Child>) -> Node {
	let tag = tag.into();
	if tag.is_empty() {
		return Node::Empty;
	}
	let mut unique = Vec::with_capacity(attributes.len());
	for attribute in attributes {
		set_attribute(&mut unique, attribute)
	}
	Node::Element(Element {
		tag,
		attributes: unique,
		children: normalize_children(children),
	})
}

fn set_attribute(attributes: &mut Vec<Attribute>, attribute: Attribute) {
	match attributes.iter_mut().find(|a| a.name == attribute.name) {
		Some(existing) => {
			trace!(name = %attribute.name, "Replacing duplicate attribute.");
			*existing = attribute
		}
		None => attributes.push(attribute),
	}
}

fn normalize_children(children: Vec<Child>) -> Vec<Node> {
	let mut nodes = Vec::with_capacity(children.len());
	for child in children {
		match child {
			Child::List(items) => {
				for item in items {
					push_leaf(&mut nodes, item)
				}
			}
			leaf => push_leaf(&mut nodes, leaf),
		}
	}
	nodes
}

fn push_leaf(nodes: &mut Vec<Node>, child: Child) {
	match child {
		Child::Skip => (),
		Child::Node(node) => nodes.push(node),
		Child::Text(text) => nodes.push(Node::Text(text)),
		Child::List(items) => warn!("Dropping child list nested more than one level deep ({} item(s)).", items.len()),
	}
}

/// Builds a `Vec<Child>` from heterogeneous values.
///
/// ```
/// use xylem::{children, node::Child};
///
/// let children: Vec<Child> = children!["count: ", 3, None::<&str>, vec!["a", "b"]];
/// assert_eq!(children.len(), 4);
/// ```
#[macro_export]
macro_rules! children {
	($($child:expr),*$(,)?) => {
		::std::vec![$($crate::node::Child::from($child)),*]
	};
}

/// Builds a `Vec<Attribute>` from `name => value` pairs.
///
/// ```
/// use xylem::{attrs, node::{AttrValue, Attribute}};
///
/// let attributes: Vec<Attribute> = attrs! { "id" => "main", "hidden" => false };
/// assert_eq!(attributes[1].value, AttrValue::Bool(false));
/// ```
#[macro_export]
macro_rules! attrs {
	($($name:expr => $value:expr),*$(,)?) => {
		::std::vec![$($crate::node::Attribute::new($name, $value)),*]
	};
}
