//! Browser bindings: a [`Dom`] over a [`web_sys::Document`], a hash-based [`Location`] and Web Storage persistence.
//!
//! Only functional when targeting `wasm32` in a browser.

use crate::{
	dom::Dom,
	error::{DomError, PersistenceError},
	loggable,
	node::{Event, Handler},
	persist::StorageBackend,
	rc_hash_map::RcHashMap,
	router::{create_router, Location, Router, RouterOptions},
	subscription::{Subscribers, Subscription},
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use js_sys::Function;
use std::rc::Rc;
use tracing::{trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

type Callback = Closure<dyn Fn(web_sys::Event)>;

fn js_error(operation: &'static str) -> impl FnOnce(JsValue) -> DomError {
	move |error| DomError::new(operation, format!("{:?}", error))
}

fn element<'a>(node: &'a web_sys::Node, operation: &'static str) -> Result<&'a web_sys::Element, DomError> {
	node.dyn_ref::<web_sys::Element>()
		.ok_or_else(|| DomError::new(operation, format!("Expected an element but found {:?}", node.node_name())))
}

fn to_event(event: &web_sys::Event) -> Event {
	let value = event
		.target()
		.and_then(|target| target.dyn_into::<web_sys::HtmlInputElement>().ok())
		.map(|input| input.value());
	Event { name: event.type_(), value }
}

/// Drives a browser document.
///
/// Each distinct [`Handler`] is wrapped in one JavaScript closure, shared by all of its registrations
/// and dropped once the last of them is removed.
pub struct WebDom {
	document: web_sys::Document,
	callbacks: RefCell<RcHashMap<Handler, u16, Callback>>,
}
impl WebDom {
	/// # Errors
	///
	/// Iff there is no global `window.document`.
	pub fn new() -> Result<Self, DomError> {
		let document = web_sys::window()
			.and_then(|window| window.document())
			.ok_or_else(|| DomError::new("document", "No global document"))?;
		Ok(Self::with_document(document))
	}

	#[must_use]
	pub fn with_document(document: web_sys::Document) -> Self {
		Self {
			document,
			callbacks: RefCell::default(),
		}
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	#[must_use]
	pub fn body(&self) -> Option<web_sys::Node> {
		self.document.body().map(Into::into)
	}

	/// How many distinct handlers currently have a JavaScript closure.
	#[must_use]
	pub fn callback_count(&self) -> usize {
		self.callbacks.borrow().len()
	}
}
impl Debug for WebDom {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebDom").field("callbacks", &self.callback_count()).finish_non_exhaustive()
	}
}

impl Dom for WebDom {
	type Node = web_sys::Node;

	fn create_element(&self, tag: &str) -> Result<Self::Node, DomError> {
		self.document.create_element(tag).map(Into::into).map_err(js_error("create_element"))
	}

	fn create_text_node(&self, text: &str) -> Result<Self::Node, DomError> {
		Ok(self.document.create_text_node(text).into())
	}

	fn get_element_by_id(&self, id: &str) -> Option<Self::Node> {
		self.document.get_element_by_id(id).map(Into::into)
	}

	fn parent_node(&self, node: &Self::Node) -> Option<Self::Node> {
		node.parent_node()
	}

	fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node> {
		let list = node.child_nodes();
		(0..list.length()).filter_map(|i| list.get(i)).collect()
	}

	fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>) -> Result<(), DomError> {
		parent.insert_before(child, reference).map(drop).map_err(js_error("insert_before"))
	}

	fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError> {
		parent.remove_child(child).map(drop).map_err(js_error("remove_child"))
	}

	fn replace_child(&self, parent: &Self::Node, new: &Self::Node, old: &Self::Node) -> Result<(), DomError> {
		parent.replace_child(new, old).map(drop).map_err(js_error("replace_child"))
	}

	fn clear_children(&self, node: &Self::Node) -> Result<(), DomError> {
		node.set_text_content(None);
		Ok(())
	}

	fn tag_name(&self, node: &Self::Node) -> Option<String> {
		node.dyn_ref::<web_sys::Element>().map(|element| element.tag_name().to_lowercase())
	}

	fn text(&self, node: &Self::Node) -> Option<String> {
		node.dyn_ref::<web_sys::Text>().map(|text| text.data())
	}

	fn set_text(&self, node: &Self::Node, text: &str) -> Result<(), DomError> {
		let character_data = node
			.dyn_ref::<web_sys::CharacterData>()
			.ok_or_else(|| DomError::new("set_text", format!("Expected a text node but found {:?}", node.node_name())))?;
		trace!(text = loggable(text), "Setting text.");
		character_data.set_data(text);
		Ok(())
	}

	fn attributes(&self, node: &Self::Node) -> Vec<(String, String)> {
		let attributes = match node.dyn_ref::<web_sys::Element>() {
			Some(element) => element.attributes(),
			None => return Vec::new(),
		};
		(0..attributes.length())
			.filter_map(|i| attributes.item(i))
			.map(|attribute| (attribute.name(), attribute.value()))
			.collect()
	}

	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError> {
		element(node, "set_attribute")?.set_attribute(name, value).map_err(js_error("set_attribute"))
	}

	fn remove_attribute(&self, node: &Self::Node, name: &str) -> Result<(), DomError> {
		element(node, "remove_attribute")?.remove_attribute(name).map_err(js_error("remove_attribute"))
	}

	fn set_style_property(&self, node: &Self::Node, property: &str, value: &str) -> Result<(), DomError> {
		let html_element = node
			.dyn_ref::<web_sys::HtmlElement>()
			.ok_or_else(|| DomError::new("set_style_property", format!("Expected an HTML element but found {:?}", node.node_name())))?;
		html_element.style().set_property(property, value).map_err(js_error("set_style_property"))
	}

	fn add_event_listener(&self, node: &Self::Node, event: &str, handler: &Handler) -> Result<(), DomError> {
		let mut callbacks = self.callbacks.borrow_mut();
		let callback = callbacks
			.increment_or_insert_with(handler.clone(), |handler| {
				trace!(?handler, "Creating closure.");
				let handler = handler.clone();
				Closure::wrap(Box::new(move |event: web_sys::Event| handler.call(&to_event(&event))) as Box<dyn Fn(web_sys::Event)>)
			})
			.map_err(|_| DomError::new("add_event_listener", "Too many registrations of one handler"))?;
		node.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref::<Function>())
			.map_err(js_error("add_event_listener"))
	}

	fn remove_event_listener(&self, node: &Self::Node, event: &str, handler: &Handler) -> Result<(), DomError> {
		let mut callbacks = self.callbacks.borrow_mut();
		let result = match callbacks.weak_decrement(handler) {
			Ok(Some(callback)) => node
				.remove_event_listener_with_callback(event, callback.as_ref().unchecked_ref::<Function>())
				.map_err(js_error("remove_event_listener")),
			Ok(None) => {
				warn!(?handler, event, "Tried to remove a listener that was never added.");
				Ok(())
			}
			Err(_) => Err(DomError::new("remove_event_listener", "Handler registration count underflow")),
		};
		let released = callbacks.release_weak();
		if released > 0 {
			trace!(released, "Dropped closures.");
		}
		result
	}
}

/// A [`Location`] stored in the URL fragment, as `#/path`.
///
/// Pushing and replacing go through `history`, so they don't fire `hashchange`.
/// A single `hashchange` listener is registered on first observation and removed when the
/// [`HashLocation`] is dropped.
pub struct HashLocation {
	window: web_sys::Window,
	listeners: Subscribers<dyn Fn()>,
	hashchange: RefCell<Option<Closure<dyn Fn()>>>,
}
impl HashLocation {
	/// # Errors
	///
	/// Iff there is no global `window`.
	pub fn new() -> Result<Self, DomError> {
		let window = web_sys::window().ok_or_else(|| DomError::new("window", "No global window"))?;
		Ok(Self {
			window,
			listeners: Subscribers::new(),
			hashchange: RefCell::default(),
		})
	}

	fn observe(&self) {
		let mut hashchange = self.hashchange.borrow_mut();
		if hashchange.is_some() {
			return;
		}
		let listeners = self.listeners.clone();
		let closure = Closure::wrap(Box::new(move || {
			for listener in listeners.snapshot() {
				listener()
			}
		}) as Box<dyn Fn()>);
		if let Err(error) = self
			.window
			.add_event_listener_with_callback("hashchange", closure.as_ref().unchecked_ref::<Function>())
		{
			warn!(?error, "Failed to observe `hashchange`.");
		}
		*hashchange = Some(closure);
	}

	fn write(&self, path: &str, replace: bool) {
		let url = format!("#{}", path);
		let result = self.window.history().and_then(|history| {
			if replace {
				history.replace_state_with_url(&JsValue::NULL, "", Some(url.as_str()))
			} else {
				history.push_state_with_url(&JsValue::NULL, "", Some(url.as_str()))
			}
		});
		if let Err(error) = result {
			warn!(?error, replace, "Failed to write location.");
		}
	}
}
impl Location for HashLocation {
	fn path(&self) -> Option<String> {
		let hash = self.window.location().hash().ok()?;
		let path = hash.strip_prefix('#').unwrap_or(&hash);
		if path.is_empty() {
			None
		} else {
			Some(path.to_owned())
		}
	}

	fn push(&self, path: &str) {
		self.write(path, false)
	}

	fn replace(&self, path: &str) {
		self.write(path, true)
	}

	fn on_change(&self, callback: Rc<dyn Fn()>) -> Subscription {
		self.observe();
		self.listeners.subscribe(callback)
	}
}
impl Drop for HashLocation {
	fn drop(&mut self) {
		if let Some(closure) = self.hashchange.get_mut().take() {
			if let Err(error) = self
				.window
				.remove_event_listener_with_callback("hashchange", closure.as_ref().unchecked_ref::<Function>())
			{
				warn!(?error, "Failed to stop observing `hashchange`.");
			}
		}
	}
}
impl Debug for HashLocation {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("HashLocation").field("path", &self.path()).finish()
	}
}

/// Creates a [`Router`] following the URL fragment.
///
/// # Errors
///
/// Iff there is no global `window`.
pub fn hash_router(options: RouterOptions) -> Result<Router, DomError> {
	Ok(create_router(Rc::new(HashLocation::new()?), options))
}

/// `localStorage` or `sessionStorage`.
#[derive(Debug, Clone)]
pub struct WebStorage(web_sys::Storage);
impl WebStorage {
	/// # Errors
	///
	/// [`PersistenceError::Unavailable`] iff `name` is not a Web Storage area of the global `window`
	/// or access to it is denied.
	pub fn named(name: &'static str) -> Result<Self, PersistenceError> {
		let window = web_sys::window().ok_or(PersistenceError::Unavailable(name))?;
		let storage = match name {
			"localStorage" => window.local_storage(),
			"sessionStorage" => window.session_storage(),
			_ => return Err(PersistenceError::Unavailable(name)),
		};
		storage.ok().flatten().map(Self).ok_or(PersistenceError::Unavailable(name))
	}
}
impl StorageBackend for WebStorage {
	fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
		self.0.get_item(key).map_err(|error| PersistenceError::Read(format!("{:?}", error)))
	}

	fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
		self.0.set_item(key, value).map_err(|error| PersistenceError::Write(format!("{:?}", error)))
	}
}
