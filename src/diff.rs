//! Reconciliation of live DOM against a new [`Node`] tree.

use crate::{
	dom::Dom,
	error::DomError,
	loggable,
	node::{AttrValue, Attribute, Node},
	render::{self, apply_attribute, dom_name, style_text},
};
use tracing::{error, instrument, trace, trace_span, warn};

/// Default limit for [`Reconciler::with_depth_limit`].
pub const DEFAULT_DEPTH_LIMIT: usize = 512;

/// Patches live DOM produced from one [`Node`] tree so that it reflects another.
///
/// # Correct Use
///
/// The live node passed to [`Reconciler::patch`] must be the one rendered (or last patched) for
/// `old`, and its subtree must not have been modified outside of this [`Reconciler`] since.
/// Divergence is logged and worked around where possible, but may cause redundant DOM churn.
#[derive(Debug)]
pub struct Reconciler<D: Dom, S = Positional> {
	dom: D,
	strategy: S,
	depth_limit: usize,
}

impl<D: Dom> Reconciler<D> {
	#[must_use]
	pub fn new(dom: D) -> Self {
		Self::with_strategy(dom, Positional)
	}
}

impl<D: Dom, S: ChildReconciliation> Reconciler<D, S> {
	#[must_use]
	pub fn with_strategy(dom: D, strategy: S) -> Self {
		Self {
			dom,
			strategy,
			depth_limit: DEFAULT_DEPTH_LIMIT,
		}
	}

	/// Subtrees nested deeper than `depth_limit` are left as they are, with an error logged.
	#[must_use]
	pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
		self.depth_limit = depth_limit;
		self
	}

	pub fn dom(&self) -> &D {
		&self.dom
	}

	pub fn depth_limit(&self) -> usize {
		self.depth_limit
	}

	/// See [`render::render`].
	///
	/// # Errors
	///
	/// Iff a host DOM call fails.
	pub fn render(&self, node: &Node, container: &D::Node) -> Result<Option<D::Node>, DomError> {
		render::render(&self.dom, node, container)
	}

	/// Patches `live`, the DOM produced for `old`, to reflect `new`.
	///
	/// Returns the live node now representing `new`. It differs from `live` iff the subtree had to be
	/// replaced, and is [`None`] iff `new` is [`Node::Empty`] (in which case `live` was removed).
	///
	/// If `old` is absent or of a different kind (tag, or text versus element), the whole subtree is
	/// rendered anew and swapped in. Otherwise text and attributes are updated in place and children
	/// are reconciled by the [`ChildReconciliation`] strategy.
	///
	/// # Errors
	///
	/// Iff a host DOM call fails, including when a replacement is needed but `live` has no parent.
	#[instrument(skip(self, new, old))]
	pub fn patch(&self, new: &Node, old: Option<&Node>, live: &D::Node) -> Result<Option<D::Node>, DomError> {
		self.patch_within(new, old, live, self.depth_limit)
	}

	/// [`Reconciler::patch`] with an explicit remaining depth. For use by [`ChildReconciliation`] strategies.
	///
	/// # Errors
	///
	/// Iff a host DOM call fails.
	pub fn patch_within(&self, new: &Node, old: Option<&Node>, live: &D::Node, depth_limit: usize) -> Result<Option<D::Node>, DomError> {
		if depth_limit == 0 {
			error!("Depth limit reached");
			return Ok(Some(live.clone()));
		}

		let old = match old {
			Some(old) if old.dom_len() == 1 && old.same_kind(new) => old,
			old => return self.replace(new, old, live, depth_limit),
		};

		match (old, new) {
			(Node::Text(t_1), Node::Text(t_2)) => {
				let span = trace_span!("Diffing text node", t_1 = loggable(t_1), t_2 = loggable(t_2));
				let _enter = span.enter();
				if t_1 != t_2 {
					self.dom.set_text(live, t_2)?
				}
			}
			(Node::Element(e_1), Node::Element(e_2)) => {
				let span = trace_span!("Diffing element", tag = %e_1.tag);
				let _enter = span.enter();
				self.update_attributes(live, &e_1.attributes, &e_2.attributes)?;
				self.strategy.update_children(self, live, &e_1.children, &e_2.children, depth_limit - 1)?;
			}
			_ => unreachable!("`same_kind` admits only text and element pairs with a live node"),
		}
		Ok(Some(live.clone()))
	}

	/// Brings the attributes and event listeners of `element` from `old` to `new`.
	///
	/// Event listeners whose handler is unchanged stay bound. Style properties are reset and
	/// reapplied whenever a style is present. Other attributes are written only if their value changed.
	///
	/// # Errors
	///
	/// Iff a host DOM call fails.
	#[instrument(skip(self, old, new))]
	pub fn update_attributes(&self, element: &D::Node, old: &[Attribute], new: &[Attribute]) -> Result<(), DomError> {
		for removed in old.iter().filter(|o| !new.iter().any(|n| n.name == o.name)) {
			self.remove_attribute(element, removed)?
		}

		for attribute in new {
			let previous = old.iter().find(|o| o.name == attribute.name);
			let previous_value = previous.map(|p| &p.value);
			match &attribute.value {
				AttrValue::Handler(handler) => {
					let event = match attribute.event_name() {
						Some(event) => event,
						None => {
							warn!("Ignoring handler under non-event attribute {:?}.", attribute.name);
							continue;
						}
					};
					match previous_value {
						Some(AttrValue::Handler(previous_handler)) if previous_handler == handler => {
							trace!(%event, "Event handler unchanged.");
						}
						Some(AttrValue::Handler(previous_handler)) => {
							trace!(%event, "Rebinding event handler.");
							self.dom.remove_event_listener(element, &event, previous_handler)?;
							self.dom.add_event_listener(element, &event, handler)?
						}
						Some(_) => {
							self.dom.remove_attribute(element, dom_name(&attribute.name))?;
							self.dom.add_event_listener(element, &event, handler)?
						}
						None => self.dom.add_event_listener(element, &event, handler)?,
					}
				}
				AttrValue::Style(_) if attribute.name == "style" => {
					self.dom.remove_attribute(element, "style")?;
					apply_attribute(&self.dom, element, attribute)?
				}
				value => {
					if let Some(AttrValue::Handler(previous_handler)) = previous_value {
						if let Some(event) = previous.and_then(Attribute::event_name) {
							self.dom.remove_event_listener(element, &event, previous_handler)?
						}
					}
					if previous_value == Some(value) {
						continue;
					}
					match value {
						AttrValue::Bool(false) => self.dom.remove_attribute(element, dom_name(&attribute.name))?,
						AttrValue::Bool(true) => self.dom.set_attribute(element, dom_name(&attribute.name), "")?,
						AttrValue::Text(text) => {
							trace!(attribute = %attribute.name, value = loggable(text), "Updating attribute.");
							self.dom.set_attribute(element, dom_name(&attribute.name), text)?
						}
						AttrValue::Style(properties) => self.dom.set_attribute(element, dom_name(&attribute.name), &style_text(properties))?,
						AttrValue::Handler(_) => unreachable!(),
					}
				}
			}
		}
		Ok(())
	}

	fn remove_attribute(&self, element: &D::Node, removed: &Attribute) -> Result<(), DomError> {
		match &removed.value {
			AttrValue::Handler(handler) => match removed.event_name() {
				Some(event) => {
					trace!(%event, "Removing event listener.");
					self.dom.remove_event_listener(element, &event, handler)
				}
				None => Ok(()),
			},
			_ => {
				trace!(attribute = %removed.name, "Removing attribute.");
				self.dom.remove_attribute(element, dom_name(&removed.name))
			}
		}
	}

	/// Renders `new` detached and swaps it in for `live`.
	fn replace(&self, new: &Node, old: Option<&Node>, live: &D::Node, depth_limit: usize) -> Result<Option<D::Node>, DomError> {
		let span = trace_span!("Replacing mismatching", old_tag = ?old.and_then(Node::tag), new_tag = ?new.tag());
		let _enter = span.enter();

		if let (Some(Node::Element(e_1)), Node::Element(e_2)) = (old, new) {
			if e_1.tag.eq_ignore_ascii_case(&e_2.tag) {
				warn!("Recreating element due to different tag name casing: {:?} -> {:?}", e_1.tag, e_2.tag)
			}
		}

		let parent = self
			.dom
			.parent_node(live)
			.ok_or_else(|| DomError::new("replace_child", format!("Patched node {:?} has no parent", live)))?;

		if let Some(old) = old {
			self.unbind(old, live, depth_limit)?
		}

		let container = self.dom.create_container()?;
		match self.render(new, &container)? {
			Some(fresh) => {
				self.dom.replace_child(&parent, &fresh, live)?;
				Ok(Some(fresh))
			}
			None => {
				self.dom.remove_child(&parent, live)?;
				Ok(None)
			}
		}
	}

	/// Renders `new` and inserts it into `parent` before `reference` (or at the end).
	///
	/// # Errors
	///
	/// Iff a host DOM call fails.
	pub fn insert(&self, new: &Node, parent: &D::Node, reference: Option<&D::Node>) -> Result<Option<D::Node>, DomError> {
		let reference = match reference {
			Some(reference) => reference,
			None => return self.render(new, parent),
		};
		let created = match render::create(&self.dom, new)? {
			Some(created) => created,
			None => return Ok(None),
		};
		self.dom.insert_before(parent, &created, Some(reference))?;
		Ok(Some(created))
	}

	/// Unbinds and removes `live`, the DOM rendered for `old`, from `parent`.
	///
	/// # Errors
	///
	/// Iff a host DOM call fails.
	pub fn remove(&self, old: &Node, parent: &D::Node, live: &D::Node, depth_limit: usize) -> Result<(), DomError> {
		let span = trace_span!("Removing", tag = ?old.tag());
		let _enter = span.enter();
		self.unbind(old, live, depth_limit)?;
		self.dom.remove_child(parent, live)
	}

	/// Removes the event listeners `old` bound in the subtree of `live`, without detaching anything.
	///
	/// # Errors
	///
	/// Iff a host DOM call fails.
	pub fn unbind(&self, old: &Node, live: &D::Node, depth_limit: usize) -> Result<(), DomError> {
		if depth_limit == 0 {
			error!("Depth limit reached");
			return Ok(());
		}

		let element = match old {
			Node::Element(element) => element,
			Node::Text(_) | Node::Empty => return Ok(()),
		};
		if self.dom.tag_name(live).map_or(true, |tag| !tag.eq_ignore_ascii_case(&element.tag)) {
			error!("Expected to unbind <{}> but found {:?}; Ignoring bindings.", element.tag, live);
			return Ok(());
		}

		for attribute in &element.attributes {
			if let (AttrValue::Handler(handler), Some(event)) = (&attribute.value, attribute.event_name()) {
				self.dom.remove_event_listener(live, &event, handler)?
			}
		}

		let live_children = self.dom.child_nodes(live);
		let mut live_children = live_children.iter();
		for child in element.children.iter().filter(|c| c.dom_len() == 1) {
			match live_children.next() {
				Some(live_child) => self.unbind(child, live_child, depth_limit - 1)?,
				None => {
					error!("Expected to unbind child beyond end of child nodes. Ignoring further bindings.");
					break;
				}
			}
		}
		Ok(())
	}
}

/// How the children of two same-tag elements are matched up.
///
/// [`Positional`] is the default. A keyed strategy can be plugged in through
/// [`Reconciler::with_strategy`] without touching the rest of the [`Reconciler`].
pub trait ChildReconciliation: Sized {
	/// Reconciles the live children of `parent`, rendered from `old`, to reflect `new`.
	///
	/// # Errors
	///
	/// Iff a host DOM call fails.
	fn update_children<D: Dom>(&self, reconciler: &Reconciler<D, Self>, parent: &D::Node, old: &[Node], new: &[Node], depth_limit: usize) -> Result<(), DomError>;
}

/// Index-based child matching.
///
/// The `i`-th new child is patched against the `i`-th old child. Surplus new children are appended
/// and surplus old children removed. Inserting or removing in the middle of a list therefore
/// re-patches every later sibling rather than moving nodes.
///
/// [`Node::Empty`] children occupy an index but no live node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Positional;
impl ChildReconciliation for Positional {
	#[instrument(skip(self, reconciler, old, new))]
	fn update_children<D: Dom>(&self, reconciler: &Reconciler<D, Self>, parent: &D::Node, old: &[Node], new: &[Node], depth_limit: usize) -> Result<(), DomError> {
		let live = reconciler.dom().child_nodes(parent);
		let mut cursor = 0;
		for i in 0..old.len().max(new.len()) {
			match (old.get(i), new.get(i)) {
				(Some(o), Some(n)) if o.dom_len() == 0 => {
					reconciler.insert(n, parent, live.get(cursor))?;
				}
				(Some(o), Some(n)) => match live.get(cursor) {
					Some(live_child) => {
						cursor += 1;
						reconciler.patch_within(n, Some(o), live_child, depth_limit)?;
					}
					None => {
						error!("Expected child {} beyond end of child nodes. Switching to insertion.", i);
						reconciler.insert(n, parent, None)?;
					}
				},
				(None, Some(n)) => {
					reconciler.insert(n, parent, None)?;
				}
				(Some(o), None) => {
					if o.dom_len() == 0 {
						continue;
					}
					match live.get(cursor) {
						Some(live_child) => {
							cursor += 1;
							reconciler.remove(o, parent, live_child, depth_limit)?
						}
						None => error!("Expected to remove child {} beyond end of child nodes. Skipping.", i),
					}
				}
				(None, None) => (),
			}
		}
		Ok(())
	}
}
