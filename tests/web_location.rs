#![cfg(target_arch = "wasm32")]

use core::cell::Cell;
use serde_json::json;
use std::rc::Rc;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::window;
use xylem::{
	persist::{Persistence, StorageBackend},
	router::Location,
	store::to_state,
	web::{hash_router, HashLocation, WebStorage},
	create_state, RouterOptions, StoreConfig,
};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn hash_location_round_trip() {
	let location = HashLocation::new().unwrap();
	location.push("/pushed");
	assert_eq!(location.path().as_deref(), Some("/pushed"));
	location.replace("/replaced");
	assert_eq!(location.path().as_deref(), Some("/replaced"));
}

#[wasm_bindgen_test]
fn local_storage_persists_state() {
	let storage = WebStorage::named("localStorage").unwrap();
	storage.set_item("web_location_test", "{\"a\":2}").unwrap();

	let store = create_state(to_state(json!({ "a": 1, "b": 1 })), StoreConfig::persisted(Persistence::Local).with_key("web_location_test"));
	assert_eq!(store.get("a"), Some(json!(2)));
	store.set("b", 3);
	assert_eq!(storage.get_item("web_location_test").unwrap().as_deref(), Some(r#"{"a":2,"b":3}"#));
}

#[wasm_bindgen_test]
fn unknown_storage_is_unavailable() {
	assert!(WebStorage::named("cookieStorage").is_err());
}

fn fire_hashchange() {
	let event = web_sys::Event::new("hashchange").unwrap();
	window().unwrap().dispatch_event(&event).unwrap();
}

#[wasm_bindgen_test]
fn dropped_locations_stop_observing() {
	let hits = Rc::new(Cell::new(0));
	let location = HashLocation::new().unwrap();
	let _first = location.on_change(Rc::new({
		let hits = Rc::clone(&hits);
		move || hits.set(hits.get() + 1)
	}));
	let second = location.on_change(Rc::new({
		let hits = Rc::clone(&hits);
		move || hits.set(hits.get() + 10)
	}));

	fire_hashchange();
	assert_eq!(hits.get(), 11);

	second.unsubscribe();
	fire_hashchange();
	assert_eq!(hits.get(), 12);

	drop(location);
	fire_hashchange();
	assert_eq!(hits.get(), 12);
}

#[wasm_bindgen_test]
async fn dropped_routers_release_the_fragment() {
	let hits = Rc::new(Cell::new(0));
	let router = hash_router(RouterOptions::default().not_found({
		let hits = Rc::clone(&hits);
		move |_| hits.set(hits.get() + 1)
	}))
	.unwrap();
	router.init().await;
	assert_eq!(hits.get(), 1);

	drop(router);
	fire_hashchange();
	assert_eq!(hits.get(), 1);
}
