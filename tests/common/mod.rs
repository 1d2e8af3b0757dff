#![allow(dead_code)]

use xylem::{dom::memory::MemoryNode, Dom, MemoryDom};

/// Routes `tracing` output through the test harness. Safe to call from every test.
pub fn init_logging() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::TRACE).try_init();
}

/// A `<div id="app">` attached to the body of `dom`.
pub fn app(dom: &MemoryDom) -> MemoryNode {
	let app = dom.create_element("div").unwrap();
	dom.set_attribute(&app, "id", "app").unwrap();
	dom.append_child(&dom.body(), &app).unwrap();
	dom.clear_mutations();
	app
}
