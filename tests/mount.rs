mod common;

use core::cell::{Cell, RefCell};
use serde_json::{json, Value};
use std::rc::Rc;
use xylem::{
	attrs, children,
	mount::mount_with,
	store::to_state,
	create_state, h, mount, Container, Dom, Event, Handler, MemoryDom, MountError, Node, Reconciler, Store, StoreConfig,
};

#[test]
fn mounting_clears_the_container() {
	common::init_logging();
	let dom = MemoryDom::new();
	let app = common::app(&dom);
	let stale = dom.create_text_node("server-rendered").unwrap();
	dom.append_child(&app, &stale).unwrap();

	let mounted = mount(&dom, h("main", vec![], children!["hello"]), "app").unwrap();
	assert_eq!(dom.inner_html(&app), "<main>hello</main>");
	assert_eq!(mounted.container(), &app);
	assert_eq!(mounted.live().and_then(|live| dom.tag_name(live)).as_deref(), Some("main"));
}

#[test]
fn missing_containers_are_reported() {
	common::init_logging();
	let dom = MemoryDom::new();
	match mount(&dom, h("main", vec![], vec![]), "nowhere") {
		Err(MountError::ContainerNotFound(id)) => assert_eq!(id, "nowhere"),
		other => panic!("Expected ContainerNotFound but got {:?}", other.map(|_| ())),
	}
}

#[test]
fn containers_can_be_given_directly() {
	common::init_logging();
	let dom = MemoryDom::new();
	let detached = dom.create_element("div").unwrap();
	let mounted = mount(&dom, Node::text("x"), Container::Node(detached.clone())).unwrap();
	assert_eq!(dom.inner_html(&detached), "x");
	assert_eq!(mounted.root(), Some(&Node::text("x")));
}

#[test]
fn update_patches_and_retains_the_new_root() {
	common::init_logging();
	let dom = MemoryDom::new();
	let app = common::app(&dom);
	let mut mounted = mount(&dom, h("p", vec![], children!["1"]), "app").unwrap();
	let live = mounted.live().cloned();

	mounted.update(h("p", vec![], children!["2"])).unwrap();
	assert_eq!(mounted.live().cloned(), live);
	assert_eq!(dom.inner_html(&app), "<p>2</p>");

	mounted.update(h("div", vec![], vec![])).unwrap();
	assert_ne!(mounted.live().cloned(), live);
	assert_eq!(dom.inner_html(&app), "<div></div>");
	assert_eq!(mounted.root(), Some(&h("div", vec![], vec![])));
}

#[test]
fn empty_roots_render_from_scratch_on_update() {
	common::init_logging();
	let dom = MemoryDom::new();
	let app = common::app(&dom);
	let mut mounted = mount(&dom, Node::Empty, "app").unwrap();
	assert_eq!(mounted.live(), None);

	mounted.update(Node::text("now")).unwrap();
	assert_eq!(dom.inner_html(&app), "now");

	mounted.update(Node::Empty).unwrap();
	assert_eq!(dom.inner_html(&app), "");
	assert_eq!(mounted.live(), None);
}

#[test]
fn unmount_clears_and_unbinds() {
	common::init_logging();
	let dom = MemoryDom::new();
	let app = common::app(&dom);
	let clicks = Rc::new(Cell::new(0));
	let handler = Handler::new({
		let clicks = Rc::clone(&clicks);
		move |_| clicks.set(clicks.get() + 1)
	});
	let mut mounted = mount(&dom, h("button", attrs! { "onClick" => handler }, children!["+"]), "app").unwrap();
	let button = mounted.live().cloned().unwrap();

	mounted.unmount().unwrap();
	assert_eq!(dom.inner_html(&app), "");
	assert_eq!(mounted.root(), None);
	assert!(dom.listeners(&button).is_empty());
	assert_eq!(dom.dispatch(&button, &Event::new("click")), 0);
}

#[test]
fn depth_limit_is_configurable() {
	common::init_logging();
	let dom = MemoryDom::new();
	let app = common::app(&dom);
	let mounted = mount_with(Reconciler::new(&dom).with_depth_limit(3), Node::Empty, Container::Node(app)).unwrap();
	assert_eq!(mounted.reconciler().depth_limit(), 3);
}

fn todo_view(store: &Store, add: &Handler, toggle: &Handler) -> Node {
	let state = store.get_state();
	let todos = state["todos"].as_array().cloned().unwrap_or_default();
	let filter = state["filter"].as_str().unwrap_or("all").to_owned();
	let items: Vec<Node> = todos
		.iter()
		.filter(|todo| filter == "all" || (filter == "done") == (todo["completed"] == json!(true)))
		.map(|todo| {
			h(
				"li",
				attrs! {
					"className" => if todo["completed"] == json!(true) { "done" } else { "open" },
					"data-id" => todo["id"].to_string(),
					"onClick" => toggle.clone(),
				},
				children![todo["text"].as_str().unwrap_or_default()],
			)
		})
		.collect();
	h(
		"section",
		vec![],
		children![
			h("input", attrs! { "onChange" => add.clone() }, vec![]),
			h("ul", vec![], children![items]),
			format!("{} item(s)", todos.len()),
		],
	)
}

#[test]
fn todo_app() {
	common::init_logging();
	let dom = Rc::new(MemoryDom::new());
	let app = common::app(&dom);
	let store = create_state(to_state(json!({ "todos": [], "filter": "all" })), StoreConfig::default());

	let notifications = Rc::new(RefCell::new(Vec::new()));
	let _log = store.subscribe({
		let notifications = Rc::clone(&notifications);
		move |new, old, _| notifications.borrow_mut().push((new.clone(), old.clone()))
	});

	let add = Handler::new({
		let store = store.clone();
		move |event| {
			let text = event.value.clone().unwrap_or_default();
			store.update(move |state| {
				let mut todos = state["todos"].as_array().cloned().unwrap_or_default();
				todos.push(json!({ "id": todos.len() + 1, "text": text, "completed": false }));
				to_state(json!({ "todos": todos }))
			});
		}
	});
	let toggle = Handler::new({
		let store = store.clone();
		move |_| {
			store.update(|state| {
				let mut todos = state["todos"].as_array().cloned().unwrap_or_default();
				if let Some(Value::Object(first)) = todos.first_mut() {
					let completed = first.get("completed") == Some(&json!(true));
					first.insert("completed".to_owned(), json!(!completed));
				}
				to_state(json!({ "todos": todos }))
			});
		}
	});

	let mounted = Rc::new(RefCell::new(mount(Rc::clone(&dom), todo_view(&store, &add, &toggle), "app").unwrap()));
	let _render = store.subscribe({
		let store = store.clone();
		let mounted = Rc::clone(&mounted);
		let (add, toggle) = (add.clone(), toggle.clone());
		move |_, _, _| mounted.borrow_mut().update(todo_view(&store, &add, &toggle)).unwrap()
	});

	store.set_state(json!({ "todos": [{ "id": 1, "text": "a", "completed": false }] }));
	assert_eq!(store.get("todos").and_then(|todos| todos.as_array().map(Vec::len)), Some(1));
	{
		let notifications = notifications.borrow();
		assert_eq!(notifications.len(), 1);
		assert_eq!(notifications[0].1, to_state(json!({ "todos": [], "filter": "all" })));
		assert_eq!(notifications[0].0, store.get_state());
	}
	assert_eq!(
		dom.inner_html(&app),
		r#"<section><input></input><ul><li class="open" data-id="1">a</li></ul>1 item(s)</section>"#
	);

	let input = dom.child_nodes(&dom.child_nodes(&app)[0])[0].clone();
	assert_eq!(dom.dispatch(&input, &Event::with_value("change", "b")), 1);
	assert_eq!(
		dom.inner_html(&app),
		r#"<section><input></input><ul><li class="open" data-id="1">a</li><li class="open" data-id="2">b</li></ul>2 item(s)</section>"#
	);

	let first_item = dom.child_nodes(&dom.child_nodes(&dom.child_nodes(&app)[0])[1])[0].clone();
	assert_eq!(dom.dispatch(&first_item, &Event::new("click")), 1);
	assert!(dom.inner_html(&app).contains(r#"<li class="done" data-id="1">a</li>"#));

	store.set("filter", "done");
	assert_eq!(
		dom.inner_html(&app),
		r#"<section><input></input><ul><li class="done" data-id="1">a</li></ul>2 item(s)</section>"#
	);
	assert_eq!(notifications.borrow().len(), 4);
}
