//! Path routing over an externally observed location.
//!
//! Patterns consist of literal segments, `:name` parameter segments matching exactly one segment,
//! and `**`, which matches the (possibly empty) remainder of the path and is captured as `*`.
//! Routes are tried in registration order and the first match wins.

use crate::{
	error::RouteError,
	store::Store,
	subscription::{Subscribers, Subscription},
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use futures::future::{FutureExt, LocalBoxFuture};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::{
	borrow::Cow,
	collections::{BTreeMap, VecDeque},
	rc::Rc,
};
use tracing::{debug, instrument, trace, warn};

pub type Params = BTreeMap<String, String>;
pub type Meta = Map<String, Value>;

/// The parameter name `**` captures are stored under.
pub const WILDCARD_PARAM: &str = "*";

/// The active match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentRoute {
	pub path: String,
	/// Percent-decoded parameter values.
	pub params: Params,
	pub meta: Meta,
}

pub type RouteHandler = Rc<dyn Fn(&Params, &CurrentRoute)>;
pub type NotFoundHandler = Rc<dyn Fn(&str)>;
/// Called with `(candidate, previous)`. Resolving to `false` vetoes the transition.
pub type BeforeHook = Rc<dyn Fn(Option<&CurrentRoute>, Option<&CurrentRoute>) -> LocalBoxFuture<'static, bool>>;
/// Called with `(current, previous)` after a committed transition.
pub type AfterHook = Rc<dyn Fn(Option<&CurrentRoute>, Option<&CurrentRoute>)>;
/// Drives route handling triggered by location changes.
pub type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

/// A compiled route pattern with its handler.
pub struct Route {
	pattern: String,
	matcher: Regex,
	param_names: Vec<String>,
	handler: RouteHandler,
	meta: Meta,
}
impl Route {
	/// # Errors
	///
	/// Iff the generated matcher fails to compile.
	pub fn compile(pattern: &str, handler: RouteHandler, meta: Meta) -> Result<Self, RouteError> {
		let mut source = String::from("^");
		let mut param_names = Vec::new();
		// Empty segments collapse, so `//` acts like `/`.
		for segment in pattern.split('/').filter(|segment| !segment.is_empty()) {
			if segment == "**" {
				source.push_str("(?:/(.*))?");
				param_names.push(WILDCARD_PARAM.to_owned());
				continue;
			}
			source.push('/');
			match segment.strip_prefix(':').filter(|name| !name.is_empty()) {
				Some(name) => {
					source.push_str("([^/]+)");
					param_names.push(name.to_owned());
				}
				None => source.push_str(&regex::escape(segment)),
			}
		}
		source.push_str("/?$");
		trace!(pattern, %source, "Compiled route.");

		let matcher = Regex::new(&source).map_err(|source| RouteError::Pattern {
			pattern: pattern.to_owned(),
			source,
		})?;
		Ok(Self {
			pattern: pattern.to_owned(),
			matcher,
			param_names,
			handler,
			meta,
		})
	}

	#[must_use]
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Parameter names in pattern order.
	#[must_use]
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	#[must_use]
	pub fn meta(&self) -> &Meta {
		&self.meta
	}

	/// Matches `path`, returning its decoded parameters.
	#[must_use]
	pub fn matches(&self, path: &str) -> Option<Params> {
		let captures = self.matcher.captures(path)?;
		Some(
			self.param_names
				.iter()
				.enumerate()
				.map(|(i, name)| {
					let raw = captures.get(i + 1).map_or("", |m| m.as_str());
					let value = urlencoding::decode(raw).map_or_else(|_| raw.to_owned(), Cow::into_owned);
					(name.clone(), value)
				})
				.collect(),
		)
	}
}
impl Debug for Route {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("pattern", &self.pattern)
			.field("param_names", &self.param_names)
			.field("meta", &self.meta)
			.finish_non_exhaustive()
	}
}

#[derive(Clone)]
pub struct RouterOptions {
	/// Used when neither an explicit path nor a location is available.
	pub default_route: String,
	pub not_found_handler: Option<NotFoundHandler>,
	pub before_each: Option<BeforeHook>,
	pub after_each: Option<AfterHook>,
	/// Defaults to `wasm_bindgen_futures::spawn_local` on `wasm32`.
	///
	/// Elsewhere, the default blocks on the task, unless the current thread is already driving an
	/// executor. The task is then deferred until the router's current handling pass completes.
	pub spawner: Option<Spawner>,
}
impl Default for RouterOptions {
	fn default() -> Self {
		Self {
			default_route: "/".to_owned(),
			not_found_handler: None,
			before_each: None,
			after_each: None,
			spawner: None,
		}
	}
}
impl RouterOptions {
	#[must_use]
	pub fn default_route(mut self, default_route: impl Into<String>) -> Self {
		self.default_route = default_route.into();
		self
	}

	#[must_use]
	pub fn not_found(mut self, handler: impl Fn(&str) + 'static) -> Self {
		self.not_found_handler = Some(Rc::new(handler));
		self
	}

	#[must_use]
	pub fn before_each(mut self, hook: impl Fn(Option<&CurrentRoute>, Option<&CurrentRoute>) -> LocalBoxFuture<'static, bool> + 'static) -> Self {
		self.before_each = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn after_each(mut self, hook: impl Fn(Option<&CurrentRoute>, Option<&CurrentRoute>) + 'static) -> Self {
		self.after_each = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn spawner(mut self, spawner: impl Fn(LocalBoxFuture<'static, ()>) + 'static) -> Self {
		self.spawner = Some(Rc::new(spawner));
		self
	}
}
impl Debug for RouterOptions {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouterOptions")
			.field("default_route", &self.default_route)
			.field("not_found_handler", &self.not_found_handler.is_some())
			.field("before_each", &self.before_each.is_some())
			.field("after_each", &self.after_each.is_some())
			.field("spawner", &self.spawner.is_some())
			.finish()
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
	/// Replace the current location entry instead of pushing a new one.
	pub replace: bool,
	/// Update the location without handling the route change.
	pub silent: bool,
}
impl NavigateOptions {
	#[must_use]
	pub fn replace() -> Self {
		Self {
			replace: true,
			silent: false,
		}
	}

	#[must_use]
	pub fn silent() -> Self {
		Self {
			replace: false,
			silent: true,
		}
	}
}

/// The navigation location a [`Router`] reads, writes and observes.
pub trait Location {
	/// The current path, if any.
	fn path(&self) -> Option<String>;

	/// Adds a new entry. Must not signal a change.
	fn push(&self, path: &str);

	/// Replaces the current entry. Must not signal a change.
	fn replace(&self, path: &str);

	/// Calls `callback` whenever the location changes externally (for example through the back button).
	fn on_change(&self, callback: Rc<dyn Fn()>) -> Subscription;
}

struct MemoryLocationInner {
	history: RefCell<Vec<String>>,
	index: Cell<usize>,
	listeners: Subscribers<dyn Fn()>,
}

/// An in-memory [`Location`] with a history stack. Clones share the same history.
#[derive(Clone)]
pub struct MemoryLocation(Rc<MemoryLocationInner>);
impl Default for MemoryLocation {
	fn default() -> Self {
		Self::new()
	}
}
impl MemoryLocation {
	#[must_use]
	pub fn new() -> Self {
		Self(Rc::new(MemoryLocationInner {
			history: RefCell::default(),
			index: Cell::new(0),
			listeners: Subscribers::new(),
		}))
	}

	#[must_use]
	pub fn with_path(path: &str) -> Self {
		let location = Self::new();
		location.push(path);
		location
	}

	/// All entries, oldest first.
	#[must_use]
	pub fn history(&self) -> Vec<String> {
		self.0.history.borrow().clone()
	}

	/// Moves to the previous entry and signals a change. Returns `false` at the start of the history.
	pub fn back(&self) -> bool {
		let index = self.0.index.get();
		if index == 0 {
			return false;
		}
		self.0.index.set(index - 1);
		self.signal();
		true
	}

	/// Moves to the next entry and signals a change. Returns `false` at the end of the history.
	pub fn forward(&self) -> bool {
		let index = self.0.index.get();
		if index + 1 >= self.0.history.borrow().len() {
			return false;
		}
		self.0.index.set(index + 1);
		self.signal();
		true
	}

	/// Pushes `path` and signals a change, as if the user had entered it.
	pub fn simulate_change(&self, path: &str) {
		self.push(path);
		self.signal()
	}

	/// How many change callbacks are registered.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.0.listeners.len()
	}

	fn signal(&self) {
		for listener in self.0.listeners.snapshot() {
			listener()
		}
	}
}
impl Location for MemoryLocation {
	fn path(&self) -> Option<String> {
		self.0.history.borrow().get(self.0.index.get()).cloned()
	}

	fn push(&self, path: &str) {
		let mut history = self.0.history.borrow_mut();
		if !history.is_empty() {
			history.truncate(self.0.index.get() + 1);
		}
		history.push(path.to_owned());
		self.0.index.set(history.len() - 1);
	}

	fn replace(&self, path: &str) {
		let mut history = self.0.history.borrow_mut();
		match history.get_mut(self.0.index.get()) {
			Some(entry) => *entry = path.to_owned(),
			None => history.push(path.to_owned()),
		}
	}

	fn on_change(&self, callback: Rc<dyn Fn()>) -> Subscription {
		self.0.listeners.subscribe(callback)
	}
}
impl Debug for MemoryLocation {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryLocation")
			.field("history", &self.0.history.borrow())
			.field("index", &self.0.index.get())
			.finish()
	}
}

struct RouterInner {
	routes: RefCell<Vec<Route>>,
	current: RefCell<Option<CurrentRoute>>,
	listeners: Subscribers<dyn Fn(Option<&CurrentRoute>)>,
	options: RouterOptions,
	location: Rc<dyn Location>,
	location_subscription: RefCell<Option<Subscription>>,
	/// Location-triggered passes waiting for the current one to complete.
	deferred: RefCell<VecDeque<LocalBoxFuture<'static, ()>>>,
}
impl Drop for RouterInner {
	fn drop(&mut self) {
		if let Some(subscription) = self.location_subscription.get_mut().take() {
			subscription.unsubscribe()
		}
	}
}

/// A handle to a router. Clones refer to the same router.
///
/// The only state is the current route, which is replaced as a whole on each committed transition.
#[derive(Clone)]
pub struct Router(Rc<RouterInner>);

/// Creates a [`Router`] over `location`.
#[must_use]
pub fn create_router(location: Rc<dyn Location>, options: RouterOptions) -> Router {
	Router::new(location, options)
}

fn normalize(path: &str) -> Cow<'_, str> {
	if path.starts_with('/') {
		Cow::Borrowed(path)
	} else {
		Cow::Owned(format!("/{}", path))
	}
}

impl Router {
	#[must_use]
	pub fn new(location: Rc<dyn Location>, options: RouterOptions) -> Self {
		Self(Rc::new(RouterInner {
			routes: RefCell::default(),
			current: RefCell::default(),
			listeners: Subscribers::new(),
			options,
			location,
			location_subscription: RefCell::default(),
			deferred: RefCell::default(),
		}))
	}

	/// Registers `handler` for paths matching `pattern`, after all earlier routes.
	///
	/// # Errors
	///
	/// Iff `pattern` can't be compiled.
	pub fn add(&self, pattern: &str, handler: impl Fn(&Params, &CurrentRoute) + 'static, meta: Option<Meta>) -> Result<(), RouteError> {
		let route = Route::compile(pattern, Rc::new(handler), meta.unwrap_or_default())?;
		debug!(pattern, params = ?route.param_names, "Added route.");
		self.0.routes.borrow_mut().push(route);
		Ok(())
	}

	/// Registered patterns, in matching order.
	#[must_use]
	pub fn routes(&self) -> Vec<String> {
		self.0.routes.borrow().iter().map(|route| route.pattern.clone()).collect()
	}

	/// Matches `path` without navigating.
	#[must_use]
	pub fn resolve(&self, path: &str) -> Option<CurrentRoute> {
		self.match_route(&normalize(path)).map(|(_, route)| route)
	}

	fn match_route(&self, path: &str) -> Option<(RouteHandler, CurrentRoute)> {
		self.0.routes.borrow().iter().find_map(|route| {
			route.matches(path).map(|params| {
				(
					Rc::clone(&route.handler),
					CurrentRoute {
						path: path.to_owned(),
						params,
						meta: route.meta.clone(),
					},
				)
			})
		})
	}

	#[must_use]
	pub fn get_current_route(&self) -> Option<CurrentRoute> {
		self.0.current.borrow().clone()
	}

	/// Writes `path` to the location and, unless `options.silent`, handles the route change right away.
	#[instrument(skip(self))]
	pub async fn navigate(&self, path: &str, options: NavigateOptions) {
		let path = normalize(path);
		if options.replace {
			self.0.location.replace(&path)
		} else {
			self.0.location.push(&path)
		}
		if !options.silent {
			self.handle_route_change(Some(&*path)).await
		}
	}

	/// Matches the effective path and, unless `before_each` vetoes, commits the result.
	///
	/// The effective path is `path`, else the location's path, else the default route.
	/// On commit the matched handler (or the not-found handler) runs, then `after_each`,
	/// then every route change listener in subscription order.
	///
	/// While `before_each` is pending, [`Router::get_current_route`] still returns the previous route.
	/// A veto leaves it in place.
	///
	/// Location changes signalled during the pass (for example a redirect from a listener) are
	/// handled once it completes.
	#[instrument(skip(self))]
	pub async fn handle_route_change(&self, path: Option<&str>) {
		self.handle_once(path).await;
		loop {
			let task = self.0.deferred.borrow_mut().pop_front();
			match task {
				Some(task) => task.await,
				None => break,
			}
		}
	}

	async fn handle_once(&self, path: Option<&str>) {
		let path = match path {
			Some(path) => path.to_owned(),
			None => self.0.location.path().filter(|path| !path.is_empty()).unwrap_or_else(|| self.0.options.default_route.clone()),
		};
		let path = normalize(&path).into_owned();

		let matched = self.match_route(&path);
		let candidate = matched.as_ref().map(|(_, route)| route.clone());
		let previous = self.get_current_route();

		if let Some(before_each) = &self.0.options.before_each {
			let before_each = Rc::clone(before_each);
			if !before_each(candidate.as_ref(), previous.as_ref()).await {
				debug!(%path, "Route change vetoed.");
				return;
			}
		}

		*self.0.current.borrow_mut() = candidate.clone();
		match &matched {
			Some((handler, route)) => {
				debug!(%path, "Route matched.");
				handler(&route.params, route)
			}
			None => {
				debug!(%path, "No route matched.");
				if let Some(not_found) = &self.0.options.not_found_handler {
					not_found(&path)
				}
			}
		}

		if let Some(after_each) = &self.0.options.after_each {
			after_each(candidate.as_ref(), previous.as_ref())
		}

		for listener in self.0.listeners.snapshot() {
			listener(candidate.as_ref())
		}
	}

	fn route_change_task(&self) -> LocalBoxFuture<'static, ()> {
		let router = Rc::downgrade(&self.0);
		async move {
			if let Some(inner) = router.upgrade() {
				Router(inner).handle_route_change(None).await
			}
		}
		.boxed_local()
	}

	fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
		match &self.0.options.spawner {
			Some(spawner) => spawner(task),
			None => self.default_spawn(task),
		}
	}

	#[cfg(target_arch = "wasm32")]
	fn default_spawn(&self, task: LocalBoxFuture<'static, ()>) {
		wasm_bindgen_futures::spawn_local(task)
	}

	#[cfg(not(target_arch = "wasm32"))]
	fn default_spawn(&self, task: LocalBoxFuture<'static, ()>) {
		match futures::executor::enter() {
			Ok(enter) => {
				drop(enter);
				futures::executor::block_on(task)
			}
			Err(_) => {
				trace!("Already inside an executor; Deferring route change.");
				self.0.deferred.borrow_mut().push_back(task)
			}
		}
	}

	/// Calls `listener` with the new current route after each committed transition.
	pub fn on_route_change(&self, listener: impl Fn(Option<&CurrentRoute>) + 'static) -> Subscription {
		self.0.listeners.subscribe(Rc::new(listener))
	}

	/// Writes each committed current route into `store` under `key` (`null` when nothing matched).
	pub fn bind_store(&self, store: &Store, key: impl Into<String>) -> Subscription {
		let store = store.clone();
		let key = key.into();
		self.on_route_change(move |route| {
			let value = match route.map(serde_json::to_value).transpose() {
				Ok(value) => value.unwrap_or(Value::Null),
				Err(error) => {
					warn!(%error, "Failed to serialise route.");
					Value::Null
				}
			};
			store.set(key.clone(), value);
		})
	}

	/// Starts following location changes, then handles the current location once.
	///
	/// Calling this again replaces the earlier location subscription.
	#[instrument(skip(self))]
	pub async fn init(&self) {
		let router = Rc::downgrade(&self.0);
		let subscription = self.0.location.on_change(Rc::new(move || {
			if let Some(inner) = router.upgrade() {
				let router = Router(inner);
				trace!("Location changed.");
				router.spawn(router.route_change_task())
			}
		}));
		if let Some(previous) = self.0.location_subscription.replace(Some(subscription)) {
			previous.unsubscribe()
		}
		self.handle_route_change(None).await
	}

	/// Stops following location changes.
	pub fn stop(&self) {
		if let Some(subscription) = self.0.location_subscription.take() {
			subscription.unsubscribe()
		}
	}
}
impl Debug for Router {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("routes", &self.0.routes.borrow())
			.field("current", &self.0.current.borrow())
			.field("options", &self.0.options)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn route(pattern: &str) -> Route {
		Route::compile(pattern, Rc::new(|_, _| ()), Meta::new()).unwrap()
	}

	fn params(pairs: &[(&str, &str)]) -> Params {
		pairs.iter().map(|&(k, v)| (k.to_owned(), v.to_owned())).collect()
	}

	#[test]
	fn literal_segments_are_escaped() {
		let route = route("/a.b/(c)");
		assert_eq!(route.matches("/a.b/(c)"), Some(Params::new()));
		assert_eq!(route.matches("/axb/(c)"), None);
	}

	#[test]
	fn parameters_capture_single_segments() {
		let route = route("/users/:id/:tab");
		assert_eq!(route.param_names(), ["id", "tab"]);
		assert_eq!(route.matches("/users/42/settings"), Some(params(&[("id", "42"), ("tab", "settings")])));
		assert_eq!(route.matches("/users/42"), None);
		assert_eq!(route.matches("/users/42/settings/more"), None);
	}

	#[test]
	fn wildcard_captures_the_rest() {
		let route = route("/files/**");
		assert_eq!(route.matches("/files/a/b.txt"), Some(params(&[("*", "a/b.txt")])));
		assert_eq!(route.matches("/files"), Some(params(&[("*", "")])));
		assert_eq!(route.matches("/filesystem"), None);
	}

	#[test]
	fn parameters_are_decoded() {
		assert_eq!(route("/tags/:tag").matches("/tags/caf%C3%A9%20au%20lait"), Some(params(&[("tag", "café au lait")])));
		assert_eq!(route("/tags/:tag").matches("/tags/%FF"), Some(params(&[("tag", "%FF")])));
	}

	#[test]
	fn duplicate_separators_collapse() {
		let route = route("//a//:b/");
		assert_eq!(route.pattern(), "//a//:b/");
		assert_eq!(route.matches("/a/1"), Some(params(&[("b", "1")])));
		assert_eq!(route.matches("/a/1/"), Some(params(&[("b", "1")])));
	}

	#[test]
	fn root_matches_only_root() {
		let route = route("/");
		assert!(route.matches("/").is_some());
		assert!(route.matches("/x").is_none());
	}

	#[test]
	fn memory_location_history() {
		let location = MemoryLocation::with_path("/a");
		location.push("/b");
		location.push("/c");
		assert!(location.back());
		location.push("/d");
		assert_eq!(location.history(), ["/a", "/b", "/d"]);
		location.replace("/e");
		assert_eq!(location.path().as_deref(), Some("/e"));
		assert!(!location.forward());
	}
}
