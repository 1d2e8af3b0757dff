//! The host DOM capability set the renderer and reconciler drive.
//!
//! Any host providing these operations is sufficient.
//! [`MemoryDom`](`memory::MemoryDom`) is a complete in-memory host,
//! [`WebDom`](`crate::web::WebDom`) drives a browser document.

use crate::{error::DomError, node::Handler};
use core::fmt::Debug;

pub mod memory;

pub trait Dom {
	/// A handle to a live element or text node. Equality is identity.
	type Node: Clone + PartialEq + Debug;

	/// # Errors
	///
	/// Iff the host rejects `tag`.
	fn create_element(&self, tag: &str) -> Result<Self::Node, DomError>;

	/// # Errors
	///
	/// Iff the host fails to create the node.
	fn create_text_node(&self, text: &str) -> Result<Self::Node, DomError>;

	/// Creates a detached element to render into before a node is attached elsewhere.
	///
	/// # Errors
	///
	/// Iff the host fails to create the element.
	fn create_container(&self) -> Result<Self::Node, DomError> {
		self.create_element("div")
	}

	fn get_element_by_id(&self, id: &str) -> Option<Self::Node>;

	fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;

	fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

	/// Inserts `child` before `reference`, or appends it if `reference` is [`None`].
	/// `child` is detached from its current parent first.
	///
	/// # Errors
	///
	/// Iff `reference` is not a child of `parent` or the host rejects the insertion.
	fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>) -> Result<(), DomError>;

	/// # Errors
	///
	/// Iff the host rejects the insertion.
	fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError> {
		self.insert_before(parent, child, None)
	}

	/// # Errors
	///
	/// Iff `child` is not a child of `parent`.
	fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

	/// Puts `new` in the place of `old`, detaching `new` from its current parent first.
	///
	/// # Errors
	///
	/// Iff `old` is not a child of `parent`.
	fn replace_child(&self, parent: &Self::Node, new: &Self::Node, old: &Self::Node) -> Result<(), DomError>;

	/// Removes all children of `node`.
	///
	/// # Errors
	///
	/// Iff removing any child fails.
	fn clear_children(&self, node: &Self::Node) -> Result<(), DomError> {
		for child in self.child_nodes(node) {
			self.remove_child(node, &child)?
		}
		Ok(())
	}

	/// The element tag, or [`None`] for text nodes.
	fn tag_name(&self, node: &Self::Node) -> Option<String>;

	/// The text content of a text node, or [`None`] for elements.
	fn text(&self, node: &Self::Node) -> Option<String>;

	/// # Errors
	///
	/// Iff `node` is not a text node.
	fn set_text(&self, node: &Self::Node, text: &str) -> Result<(), DomError>;

	/// All attributes of an element, in document order.
	fn attributes(&self, node: &Self::Node) -> Vec<(String, String)>;

	/// # Errors
	///
	/// Iff the host rejects the attribute name.
	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;

	/// Removing an absent attribute is not an error.
	///
	/// # Errors
	///
	/// Iff the host fails to remove the attribute.
	fn remove_attribute(&self, node: &Self::Node, name: &str) -> Result<(), DomError>;

	/// # Errors
	///
	/// Iff `node` has no inline style.
	fn set_style_property(&self, node: &Self::Node, property: &str, value: &str) -> Result<(), DomError>;

	/// # Errors
	///
	/// Iff the host fails to register the listener.
	fn add_event_listener(&self, node: &Self::Node, event: &str, handler: &Handler) -> Result<(), DomError>;

	/// # Errors
	///
	/// Iff the host fails to deregister the listener.
	fn remove_event_listener(&self, node: &Self::Node, event: &str, handler: &Handler) -> Result<(), DomError>;
}

macro_rules! forward_dom {
	(impl<$t:ident> Dom for $ty:ty) => {
		impl<$t: Dom + ?Sized> Dom for $ty {
			type Node = <$t as Dom>::Node;

			fn create_element(&self, tag: &str) -> Result<Self::Node, DomError> {
				(**self).create_element(tag)
			}
			fn create_text_node(&self, text: &str) -> Result<Self::Node, DomError> {
				(**self).create_text_node(text)
			}
			fn create_container(&self) -> Result<Self::Node, DomError> {
				(**self).create_container()
			}
			fn get_element_by_id(&self, id: &str) -> Option<Self::Node> {
				(**self).get_element_by_id(id)
			}
			fn parent_node(&self, node: &Self::Node) -> Option<Self::Node> {
				(**self).parent_node(node)
			}
			fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node> {
				(**self).child_nodes(node)
			}
			fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>) -> Result<(), DomError> {
				(**self).insert_before(parent, child, reference)
			}
			fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError> {
				(**self).append_child(parent, child)
			}
			fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError> {
				(**self).remove_child(parent, child)
			}
			fn replace_child(&self, parent: &Self::Node, new: &Self::Node, old: &Self::Node) -> Result<(), DomError> {
				(**self).replace_child(parent, new, old)
			}
			fn clear_children(&self, node: &Self::Node) -> Result<(), DomError> {
				(**self).clear_children(node)
			}
			fn tag_name(&self, node: &Self::Node) -> Option<String> {
				(**self).tag_name(node)
			}
			fn text(&self, node: &Self::Node) -> Option<String> {
				(**self).text(node)
			}
			fn set_text(&self, node: &Self::Node, text: &str) -> Result<(), DomError> {
				(**self).set_text(node, text)
			}
			fn attributes(&self, node: &Self::Node) -> Vec<(String, String)> {
				(**self).attributes(node)
			}
			fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError> {
				(**self).set_attribute(node, name, value)
			}
			fn remove_attribute(&self, node: &Self::Node, name: &str) -> Result<(), DomError> {
				(**self).remove_attribute(node, name)
			}
			fn set_style_property(&self, node: &Self::Node, property: &str, value: &str) -> Result<(), DomError> {
				(**self).set_style_property(node, property, value)
			}
			fn add_event_listener(&self, node: &Self::Node, event: &str, handler: &Handler) -> Result<(), DomError> {
				(**self).add_event_listener(node, event, handler)
			}
			fn remove_event_listener(&self, node: &Self::Node, event: &str, handler: &Handler) -> Result<(), DomError> {
				(**self).remove_event_listener(node, event, handler)
			}
		}
	};
}

forward_dom!(impl<T> Dom for &T);
forward_dom!(impl<T> Dom for std::rc::Rc<T>);
