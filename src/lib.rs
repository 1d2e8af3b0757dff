#![doc(html_root_url = "https://docs.rs/xylem/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod diff;
pub mod dom;
pub mod error;
pub mod events;
pub mod load;
pub mod mount;
pub mod node;
pub mod persist;
pub mod rc_hash_map;
pub mod render;
pub mod router;
pub mod store;
pub mod subscription;
pub mod web;

pub use crate::{
	diff::{ChildReconciliation, Positional, Reconciler},
	dom::{memory::MemoryDom, Dom},
	error::{DomError, MountError, PersistenceError, RouteError},
	events::EventBus,
	mount::{mount, Container, Mounted},
	node::{h, AttrValue, Attribute, Child, Element, Event, Handler, Node},
	render::render,
	router::{create_router, CurrentRoute, MemoryLocation, NavigateOptions, Router, RouterOptions},
	store::{create_state, State, Store, StoreConfig},
	subscription::Subscription,
};

/// Redacts page content from log output unless the `"dangerous-logging"` feature is enabled.
pub(crate) fn loggable(value: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		value
	} else {
		"[redacted]"
	}
}
