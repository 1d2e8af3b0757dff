//! An in-memory [`Dom`] host.
//!
//! Records every mutation, which makes it useful to check how much work a patch did.

use super::Dom;
use crate::{
	error::DomError,
	node::{Event, Handler},
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter, Write as _},
};
use std::rc::{Rc, Weak};
use tracing::trace;

/// A mutation applied through [`Dom`], identified by [`MemoryNode::id`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	CreateElement(String),
	CreateText,
	Insert { parent: usize, child: usize },
	Remove { parent: usize, child: usize },
	Replace { parent: usize, new: usize, old: usize },
	SetText(usize),
	SetAttribute(usize, String),
	RemoveAttribute(usize, String),
	SetStyle(usize, String),
	AddListener(usize, String),
	RemoveListener(usize, String),
}

struct NodeData {
	tag: Option<String>,
	text: String,
	attributes: Vec<(String, String)>,
	style: Vec<(String, String)>,
	listeners: Vec<(String, Handler)>,
	children: Vec<MemoryNode>,
}

struct NodeCell {
	id: usize,
	data: RefCell<NodeData>,
	parent: RefCell<Weak<NodeCell>>,
}

/// A live node of a [`MemoryDom`].
#[derive(Clone)]
pub struct MemoryNode(Rc<NodeCell>);
impl MemoryNode {
	/// Unique within the owning [`MemoryDom`].
	#[must_use]
	pub fn id(&self) -> usize {
		self.0.id
	}

	fn parent(&self) -> Option<MemoryNode> {
		self.0.parent.borrow().upgrade().map(MemoryNode)
	}

	fn detach(&self) {
		if let Some(parent) = self.parent() {
			parent.0.data.borrow_mut().children.retain(|c| c != self);
		}
		*self.0.parent.borrow_mut() = Weak::new();
	}

	fn index_in(&self, parent: &MemoryNode) -> Option<usize> {
		parent.0.data.borrow().children.iter().position(|c| c == self)
	}
}
impl PartialEq for MemoryNode {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
impl Eq for MemoryNode {}
impl Debug for MemoryNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.0.data.borrow().tag {
			Some(tag) => write!(f, "#{}<{}>", self.0.id, tag),
			None => write!(f, "#{}(text)", self.0.id),
		}
	}
}

/// An in-memory document with a `<body>` root.
pub struct MemoryDom {
	body: MemoryNode,
	next_id: Cell<usize>,
	log: RefCell<Vec<Mutation>>,
}
impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for MemoryDom {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryDom").field("body", &self.outer_html(&self.body)).finish()
	}
}
impl MemoryDom {
	#[must_use]
	pub fn new() -> Self {
		Self {
			body: MemoryNode(Rc::new(NodeCell {
				id: 0,
				data: RefCell::new(NodeData::element("body")),
				parent: RefCell::new(Weak::new()),
			})),
			next_id: Cell::new(1),
			log: RefCell::new(Vec::new()),
		}
	}

	#[must_use]
	pub fn body(&self) -> MemoryNode {
		self.body.clone()
	}

	/// Takes the mutation log, leaving it empty.
	pub fn take_mutations(&self) -> Vec<Mutation> {
		self.log.take()
	}

	#[must_use]
	pub fn mutations(&self) -> Vec<Mutation> {
		self.log.borrow().clone()
	}

	pub fn clear_mutations(&self) {
		self.log.borrow_mut().clear()
	}

	/// Delivers `event` to matching listeners on `target` and then its ancestors.
	///
	/// Returns the number of handlers called.
	pub fn dispatch(&self, target: &MemoryNode, event: &Event) -> usize {
		let mut handlers = Vec::new();
		let mut current = Some(target.clone());
		while let Some(node) = current {
			handlers.extend(node.0.data.borrow().listeners.iter().filter(|(name, _)| *name == event.name).map(|(_, handler)| handler.clone()));
			current = node.parent();
		}
		trace!(event = %event.name, count = handlers.len(), "Dispatching.");
		for handler in &handlers {
			handler.call(event)
		}
		handlers.len()
	}

	/// The names of events with listeners on `node`, one entry per listener.
	#[must_use]
	pub fn listeners(&self, node: &MemoryNode) -> Vec<String> {
		node.0.data.borrow().listeners.iter().map(|(name, _)| name.clone()).collect()
	}

	/// Inline style properties of `node`.
	#[must_use]
	pub fn style(&self, node: &MemoryNode) -> Vec<(String, String)> {
		node.0.data.borrow().style.clone()
	}

	/// Serialises `node` and its descendants as HTML.
	#[must_use]
	pub fn outer_html(&self, node: &MemoryNode) -> String {
		let mut html = String::new();
		write_html(&mut html, node);
		html
	}

	/// Serialises the children of `node` as HTML.
	#[must_use]
	pub fn inner_html(&self, node: &MemoryNode) -> String {
		let mut html = String::new();
		for child in &node.0.data.borrow().children {
			write_html(&mut html, child)
		}
		html
	}

	fn allocate(&self, data: NodeData) -> MemoryNode {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		MemoryNode(Rc::new(NodeCell {
			id,
			data: RefCell::new(data),
			parent: RefCell::new(Weak::new()),
		}))
	}

	fn record(&self, mutation: Mutation) {
		trace!(?mutation, "Recorded.");
		self.log.borrow_mut().push(mutation)
	}
}

impl NodeData {
	fn element(tag: &str) -> Self {
		Self {
			tag: Some(tag.to_owned()),
			text: String::new(),
			attributes: Vec::new(),
			style: Vec::new(),
			listeners: Vec::new(),
			children: Vec::new(),
		}
	}

	fn text(text: &str) -> Self {
		Self {
			tag: None,
			text: text.to_owned(),
			..Self::element("")
		}
	}
}

fn escape(text: &str) -> String {
	text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn write_html(html: &mut String, node: &MemoryNode) {
	let data = node.0.data.borrow();
	let tag = match &data.tag {
		Some(tag) => tag,
		None => return html.push_str(&escape(&data.text)),
	};
	html.push('<');
	html.push_str(tag);
	for (name, value) in &data.attributes {
		let _ = write!(html, " {}=\"{}\"", name, escape(value));
	}
	if !data.style.is_empty() {
		let style: String = data.style.iter().map(|(k, v)| format!("{}: {};", k, v)).collect::<Vec<_>>().join(" ");
		let _ = write!(html, " style=\"{}\"", escape(&style));
	}
	html.push('>');
	for child in &data.children {
		write_html(html, child)
	}
	let _ = write!(html, "</{}>", tag);
}

fn find_by_id(node: &MemoryNode, id: &str) -> Option<MemoryNode> {
	let data = node.0.data.borrow();
	if data.attributes.iter().any(|(name, value)| name == "id" && value == id) {
		return Some(node.clone());
	}
	data.children.iter().find_map(|child| find_by_id(child, id))
}

impl Dom for MemoryDom {
	type Node = MemoryNode;

	fn create_element(&self, tag: &str) -> Result<MemoryNode, DomError> {
		if tag.is_empty() || tag.contains(|c: char| c.is_whitespace() || c == '<' || c == '>') {
			return Err(DomError::new("create_element", format!("Invalid tag name {:?}", tag)));
		}
		self.record(Mutation::CreateElement(tag.to_owned()));
		Ok(self.allocate(NodeData::element(tag)))
	}

	fn create_text_node(&self, text: &str) -> Result<MemoryNode, DomError> {
		self.record(Mutation::CreateText);
		Ok(self.allocate(NodeData::text(text)))
	}

	fn get_element_by_id(&self, id: &str) -> Option<MemoryNode> {
		find_by_id(&self.body, id)
	}

	fn parent_node(&self, node: &MemoryNode) -> Option<MemoryNode> {
		node.parent()
	}

	fn child_nodes(&self, node: &MemoryNode) -> Vec<MemoryNode> {
		node.0.data.borrow().children.clone()
	}

	fn insert_before(&self, parent: &MemoryNode, child: &MemoryNode, reference: Option<&MemoryNode>) -> Result<(), DomError> {
		if parent.0.data.borrow().tag.is_none() {
			return Err(DomError::new("insert_before", "Text nodes can't have children"));
		}
		if reference == Some(child) {
			return Ok(());
		}
		child.detach();
		let index = match reference {
			None => parent.0.data.borrow().children.len(),
			Some(reference) => reference
				.index_in(parent)
				.ok_or_else(|| DomError::new("insert_before", format!("{:?} is not a child of {:?}", reference, parent)))?,
		};
		parent.0.data.borrow_mut().children.insert(index, child.clone());
		*child.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
		self.record(Mutation::Insert {
			parent: parent.id(),
			child: child.id(),
		});
		Ok(())
	}

	fn remove_child(&self, parent: &MemoryNode, child: &MemoryNode) -> Result<(), DomError> {
		if child.index_in(parent).is_none() {
			return Err(DomError::new("remove_child", format!("{:?} is not a child of {:?}", child, parent)));
		}
		child.detach();
		self.record(Mutation::Remove {
			parent: parent.id(),
			child: child.id(),
		});
		Ok(())
	}

	fn replace_child(&self, parent: &MemoryNode, new: &MemoryNode, old: &MemoryNode) -> Result<(), DomError> {
		if old.index_in(parent).is_none() {
			return Err(DomError::new("replace_child", format!("{:?} is not a child of {:?}", old, parent)));
		}
		new.detach();
		let index = old
			.index_in(parent)
			.ok_or_else(|| DomError::new("replace_child", "Replaced node moved during detachment"))?;
		parent.0.data.borrow_mut().children[index] = new.clone();
		*old.0.parent.borrow_mut() = Weak::new();
		*new.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
		self.record(Mutation::Replace {
			parent: parent.id(),
			new: new.id(),
			old: old.id(),
		});
		Ok(())
	}

	fn tag_name(&self, node: &MemoryNode) -> Option<String> {
		node.0.data.borrow().tag.clone()
	}

	fn text(&self, node: &MemoryNode) -> Option<String> {
		let data = node.0.data.borrow();
		match data.tag {
			None => Some(data.text.clone()),
			Some(_) => None,
		}
	}

	fn set_text(&self, node: &MemoryNode, text: &str) -> Result<(), DomError> {
		if node.0.data.borrow().tag.is_some() {
			return Err(DomError::new("set_text", format!("{:?} is not a text node", node)));
		}
		node.0.data.borrow_mut().text = text.to_owned();
		self.record(Mutation::SetText(node.id()));
		Ok(())
	}

	fn attributes(&self, node: &MemoryNode) -> Vec<(String, String)> {
		node.0.data.borrow().attributes.clone()
	}

	fn set_attribute(&self, node: &MemoryNode, name: &str, value: &str) -> Result<(), DomError> {
		if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == '=' || c == '"') {
			return Err(DomError::new("set_attribute", format!("Invalid attribute name {:?}", name)));
		}
		{
			let mut data = node.0.data.borrow_mut();
			match data.attributes.iter_mut().find(|(n, _)| n == name) {
				Some((_, existing)) => *existing = value.to_owned(),
				None => data.attributes.push((name.to_owned(), value.to_owned())),
			}
		}
		self.record(Mutation::SetAttribute(node.id(), name.to_owned()));
		Ok(())
	}

	fn remove_attribute(&self, node: &MemoryNode, name: &str) -> Result<(), DomError> {
		{
			let mut data = node.0.data.borrow_mut();
			data.attributes.retain(|(n, _)| n != name);
			if name == "style" {
				data.style.clear()
			}
		}
		self.record(Mutation::RemoveAttribute(node.id(), name.to_owned()));
		Ok(())
	}

	fn set_style_property(&self, node: &MemoryNode, property: &str, value: &str) -> Result<(), DomError> {
		if node.0.data.borrow().tag.is_none() {
			return Err(DomError::new("set_style_property", format!("{:?} is not an element", node)));
		}
		{
			let mut data = node.0.data.borrow_mut();
			match data.style.iter_mut().find(|(p, _)| p == property) {
				Some((_, existing)) => *existing = value.to_owned(),
				None => data.style.push((property.to_owned(), value.to_owned())),
			}
		}
		self.record(Mutation::SetStyle(node.id(), property.to_owned()));
		Ok(())
	}

	fn add_event_listener(&self, node: &MemoryNode, event: &str, handler: &Handler) -> Result<(), DomError> {
		{
			let mut data = node.0.data.borrow_mut();
			// Like the browser, identical registrations are collapsed.
			if !data.listeners.iter().any(|(e, h)| e == event && h == handler) {
				data.listeners.push((event.to_owned(), handler.clone()))
			}
		}
		self.record(Mutation::AddListener(node.id(), event.to_owned()));
		Ok(())
	}

	fn remove_event_listener(&self, node: &MemoryNode, event: &str, handler: &Handler) -> Result<(), DomError> {
		node.0.data.borrow_mut().listeners.retain(|(e, h)| !(e == event && h == handler));
		self.record(Mutation::RemoveListener(node.id(), event.to_owned()));
		Ok(())
	}
}
