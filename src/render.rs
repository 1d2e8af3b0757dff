//! Initial rendering of [`Node`] trees into live DOM.

use crate::{
	dom::Dom,
	error::DomError,
	loggable,
	node::{AttrValue, Attribute, Node, CLASS_ALIAS},
};
use tracing::{trace, trace_span, warn};

/// Renders `node` and appends the result to `container`.
///
/// Returns the created live node, or [`None`] for [`Node::Empty`].
/// `container` is not cleared first.
///
/// # Errors
///
/// Iff a host DOM call fails. Nodes created up to that point may be left detached.
pub fn render<D: Dom + ?Sized>(dom: &D, node: &Node, container: &D::Node) -> Result<Option<D::Node>, DomError> {
	let created = match create(dom, node)? {
		Some(created) => created,
		None => return Ok(None),
	};
	dom.append_child(container, &created)?;
	Ok(Some(created))
}

/// Renders `node` without attaching it anywhere.
///
/// # Errors
///
/// Iff a host DOM call fails.
pub fn create<D: Dom + ?Sized>(dom: &D, node: &Node) -> Result<Option<D::Node>, DomError> {
	match node {
		Node::Empty => {
			trace!("Nothing to create for empty node.");
			Ok(None)
		}
		Node::Text(text) => {
			let span = trace_span!("Creating text node", text = loggable(text));
			let _enter = span.enter();
			dom.create_text_node(text).map(Some)
		}
		Node::Element(element) => {
			let span = trace_span!("Creating element", tag = %element.tag);
			let _enter = span.enter();
			let created = dom.create_element(&element.tag)?;
			for attribute in &element.attributes {
				apply_attribute(dom, &created, attribute)?
			}
			for child in &element.children {
				render(dom, child, &created)?;
			}
			Ok(Some(created))
		}
	}
}

/// The DOM attribute name for `name`.
pub(crate) fn dom_name(name: &str) -> &str {
	if name == CLASS_ALIAS {
		"class"
	} else {
		name
	}
}

/// Serialises style properties for attributes other than `style`.
pub(crate) fn style_text(properties: &[(String, String)]) -> String {
	properties.iter().map(|(property, value)| format!("{}: {};", property, value)).collect::<Vec<_>>().join(" ")
}

/// Applies a single attribute to a freshly created element.
pub(crate) fn apply_attribute<D: Dom + ?Sized>(dom: &D, element: &D::Node, attribute: &Attribute) -> Result<(), DomError> {
	let Attribute { name, value } = attribute;
	match value {
		AttrValue::Handler(handler) => match attribute.event_name() {
			Some(event) => {
				trace!(%event, ?handler, "Adding event listener.");
				dom.add_event_listener(element, &event, handler)
			}
			None => {
				warn!("Ignoring handler under non-event attribute {:?}.", name);
				Ok(())
			}
		},
		AttrValue::Style(properties) if name == "style" => {
			for (property, value) in properties {
				trace!(%property, value = loggable(value), "Setting style property.");
				dom.set_style_property(element, property, value)?
			}
			Ok(())
		}
		AttrValue::Style(properties) => dom.set_attribute(element, dom_name(name), &style_text(properties)),
		AttrValue::Bool(true) => dom.set_attribute(element, dom_name(name), ""),
		AttrValue::Bool(false) => Ok(()),
		AttrValue::Text(text) => {
			trace!(attribute = %dom_name(name), value = loggable(text), "Setting attribute.");
			dom.set_attribute(element, dom_name(name), text)
		}
	}
}
