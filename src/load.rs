//! Reading existing live DOM back into [`Node`] trees.
//!
//! Event listeners can't be read back, so loaded elements carry attributes and children only.

use crate::{
	dom::Dom,
	node::{Attribute, AttrValue, Element, Node},
};
use tracing::trace;

pub fn load_node<D: Dom + ?Sized>(dom: &D, node: &D::Node) -> Node {
	match dom.tag_name(node) {
		Some(tag) => Node::Element(load_element(dom, node, tag)),
		None => Node::Text(dom.text(node).unwrap_or_default()),
	}
}

/// Loads the children of `node`, for example to adopt server-rendered container content.
pub fn load_child_nodes<D: Dom + ?Sized>(dom: &D, node: &D::Node) -> Vec<Node> {
	dom.child_nodes(node).iter().map(|child| load_node(dom, child)).collect()
}

fn load_element<D: Dom + ?Sized>(dom: &D, node: &D::Node, tag: String) -> Element {
	trace!(%tag, "Loading element.");
	Element {
		// Browsers report HTML tag names in upper case.
		tag: tag.to_lowercase(),
		attributes: load_attributes(dom, node),
		children: load_child_nodes(dom, node),
	}
}

pub fn load_attributes<D: Dom + ?Sized>(dom: &D, node: &D::Node) -> Vec<Attribute> {
	dom.attributes(node)
		.into_iter()
		.map(|(name, value)| Attribute {
			name,
			value: AttrValue::Text(value),
		})
		.collect()
}
