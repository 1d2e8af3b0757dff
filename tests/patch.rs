mod common;

use core::cell::Cell;
use std::rc::Rc;
use xylem::{
	attrs, children,
	dom::memory::{MemoryNode, Mutation},
	h, Dom, Event, Handler, MemoryDom, Node, Reconciler,
};

fn rendered<'a>(dom: &'a MemoryDom, node: &Node) -> (Reconciler<&'a MemoryDom>, MemoryNode) {
	common::init_logging();
	let reconciler = Reconciler::new(dom);
	let live = reconciler.render(node, &dom.body()).unwrap().unwrap();
	dom.clear_mutations();
	(reconciler, live)
}

fn counter() -> (Rc<Cell<usize>>, Handler) {
	let count = Rc::new(Cell::new(0));
	let handler = Handler::new({
		let count = Rc::clone(&count);
		move |_| count.set(count.get() + 1)
	});
	(count, handler)
}

#[test]
fn render_sets_attributes_styles_and_children() {
	let dom = MemoryDom::new();
	let node = h(
		"section",
		attrs! {
			"className" => "card",
			"hidden" => false,
			"checked" => true,
			"style" => vec![("color", "red"), ("margin", "0")],
		},
		children![h("h1", vec![], children!["Title"]), "body & more"],
	);
	let (_, live) = rendered(&dom, &node);
	assert_eq!(
		dom.outer_html(&live),
		r#"<section class="card" checked="" style="color: red; margin: 0;"><h1>Title</h1>body &amp; more</section>"#
	);
}

#[test]
fn identical_trees_cause_no_mutations() {
	let dom = MemoryDom::new();
	let (_, handler) = counter();
	let node = h("div", attrs! { "id" => "x", "onClick" => handler }, children![h("span", vec![], children!["a"]), "b"]);
	let (reconciler, live) = rendered(&dom, &node);

	let patched = reconciler.patch(&node.clone(), Some(&node), &live).unwrap();
	assert_eq!(patched, Some(live));
	assert!(dom.take_mutations().is_empty());
}

#[test]
fn changed_text_is_updated_in_place() {
	let dom = MemoryDom::new();
	let (count, handler) = counter();
	let view = |text: &str| {
		h(
			"div",
			vec![],
			children![
				h("p", attrs! { "class" => "x" }, children![text]),
				h("button", attrs! { "title" => "t", "onClick" => handler.clone() }, children!["+"]),
			],
		)
	};
	let old = view("a");
	let (reconciler, live) = rendered(&dom, &old);
	let p = dom.child_nodes(&live)[0].clone();
	let text = dom.child_nodes(&p)[0].clone();
	let button = dom.child_nodes(&live)[1].clone();

	let new = view("b");
	assert_eq!(reconciler.patch(&new, Some(&old), &live).unwrap(), Some(live.clone()));
	assert_eq!(dom.take_mutations(), vec![Mutation::SetText(text.id())]);
	assert_eq!(dom.outer_html(&live), r#"<div><p class="x">b</p><button title="t">+</button></div>"#);
	assert_eq!(dom.listeners(&button), vec!["click".to_owned()]);
	assert_eq!(dom.dispatch(&button, &Event::new("click")), 1);
	assert_eq!(count.get(), 1);
}

#[test]
fn different_tag_replaces_the_subtree() {
	let dom = MemoryDom::new();
	let (count, handler) = counter();
	let old = h("button", attrs! { "onClick" => handler }, children!["go"]);
	let (reconciler, live) = rendered(&dom, &old);

	let new = h("a", attrs! { "href" => "/go" }, children!["go"]);
	let fresh = reconciler.patch(&new, Some(&old), &live).unwrap().unwrap();
	assert_ne!(fresh, live);
	assert_eq!(dom.parent_node(&live), None);
	assert_eq!(dom.inner_html(&dom.body()), r#"<a href="/go">go</a>"#);
	assert!(dom.listeners(&live).is_empty());
	assert_eq!(dom.dispatch(&live, &Event::new("click")), 0);
	assert_eq!(count.get(), 0);
}

#[test]
fn text_to_element_replaces() {
	let dom = MemoryDom::new();
	let (reconciler, live) = rendered(&dom, &Node::text("plain"));
	let fresh = reconciler.patch(&h("b", vec![], children!["bold"]), Some(&Node::text("plain")), &live).unwrap().unwrap();
	assert_eq!(dom.tag_name(&fresh).as_deref(), Some("b"));
	assert_eq!(dom.inner_html(&dom.body()), "<b>bold</b>");
}

#[test]
fn detached_replacement_fails() {
	let dom = MemoryDom::new();
	let reconciler = Reconciler::new(&dom);
	let live = dom.create_element("p").unwrap();
	let error = reconciler.patch(&h("div", vec![], vec![]), Some(&h("p", vec![], vec![])), &live).unwrap_err();
	assert_eq!(error.operation, "replace_child");
}

#[test]
fn attributes_are_added_changed_and_removed() {
	let dom = MemoryDom::new();
	let old = h("input", attrs! { "value" => "a", "disabled" => true, "title" => "t" }, vec![]);
	let (reconciler, live) = rendered(&dom, &old);

	let new = h("input", attrs! { "value" => "b", "disabled" => false, "title" => "t", "name" => "n" }, vec![]);
	reconciler.patch(&new, Some(&old), &live).unwrap();
	let id = live.id();
	assert_eq!(
		dom.take_mutations(),
		vec![
			Mutation::SetAttribute(id, "value".to_owned()),
			Mutation::RemoveAttribute(id, "disabled".to_owned()),
			Mutation::SetAttribute(id, "name".to_owned()),
		]
	);
	assert_eq!(dom.outer_html(&live), r#"<input value="b" title="t" name="n"></input>"#);

	reconciler.patch(&h("input", vec![], vec![]), Some(&new), &live).unwrap();
	assert_eq!(dom.outer_html(&live), "<input></input>");
}

#[test]
fn styles_are_reset_and_reapplied() {
	let dom = MemoryDom::new();
	let old = h("div", attrs! { "style" => vec![("color", "red"), ("margin", "0")] }, vec![]);
	let (reconciler, live) = rendered(&dom, &old);

	let new = h("div", attrs! { "style" => vec![("color", "blue")] }, vec![]);
	reconciler.patch(&new, Some(&old), &live).unwrap();
	assert_eq!(dom.style(&live), vec![("color".to_owned(), "blue".to_owned())]);
}

#[test]
fn unchanged_handlers_stay_bound() {
	let dom = MemoryDom::new();
	let (count, handler) = counter();
	let old = h("button", attrs! { "onClick" => handler.clone() }, vec![]);
	let (reconciler, live) = rendered(&dom, &old);

	let new = h("button", attrs! { "onClick" => handler }, vec![]);
	reconciler.patch(&new, Some(&old), &live).unwrap();
	assert!(dom.take_mutations().is_empty());
	assert_eq!(dom.dispatch(&live, &Event::new("click")), 1);
	assert_eq!(count.get(), 1);
}

#[test]
fn replaced_handlers_are_swapped() {
	let dom = MemoryDom::new();
	let (first_count, first) = counter();
	let (second_count, second) = counter();
	let old = h("button", attrs! { "onClick" => first }, vec![]);
	let (reconciler, live) = rendered(&dom, &old);

	let new = h("button", attrs! { "onClick" => second }, vec![]);
	reconciler.patch(&new, Some(&old), &live).unwrap();
	assert_eq!(dom.dispatch(&live, &Event::new("click")), 1);
	assert_eq!((first_count.get(), second_count.get()), (0, 1));

	reconciler.patch(&h("button", vec![], vec![]), Some(&new), &live).unwrap();
	assert_eq!(dom.dispatch(&live, &Event::new("click")), 0);
}

#[test]
fn children_are_matched_by_position() {
	let dom = MemoryDom::new();
	let item = |text: &str| h("li", vec![], children![text]);
	let old = h("ul", vec![], children![item("a"), item("b"), item("c")]);
	let (reconciler, live) = rendered(&dom, &old);
	let before = dom.child_nodes(&live);

	// Removing the first item re-patches the rest and drops the last node.
	let new = h("ul", vec![], children![item("b"), item("c")]);
	reconciler.patch(&new, Some(&old), &live).unwrap();
	let after = dom.child_nodes(&live);
	assert_eq!(after, before[..2].to_vec());
	assert_eq!(dom.inner_html(&live), "<li>b</li><li>c</li>");

	let grown = h("ul", vec![], children![item("b"), item("c"), item("d"), "e"]);
	reconciler.patch(&grown, Some(&new), &live).unwrap();
	assert_eq!(dom.inner_html(&live), "<li>b</li><li>c</li><li>d</li>e");
}

#[test]
fn empty_children_hold_their_position() {
	let dom = MemoryDom::new();
	let old = h("div", vec![], children![true, "b", false]);
	let (reconciler, live) = rendered(&dom, &old);
	assert_eq!(dom.inner_html(&live), "b");

	let new = h("div", vec![], children![h("span", vec![], children!["a"]), "b"]);
	reconciler.patch(&new, Some(&old), &live).unwrap();
	assert_eq!(dom.inner_html(&live), "<span>a</span>b");

	reconciler.patch(&old, Some(&new), &live).unwrap();
	assert_eq!(dom.inner_html(&live), "b");
}

#[test]
fn removed_subtrees_release_their_listeners() {
	let dom = MemoryDom::new();
	let (_, handler) = counter();
	let old = h("div", vec![], children![h("p", vec![], children![h("button", attrs! { "onClick" => handler }, vec![])])]);
	let (reconciler, live) = rendered(&dom, &old);
	let button = dom.child_nodes(&dom.child_nodes(&live)[0])[0].clone();
	assert_eq!(dom.listeners(&button), vec!["click".to_owned()]);

	reconciler.patch(&h("div", vec![], vec![]), Some(&old), &live).unwrap();
	assert!(dom.listeners(&button).is_empty());
	assert_eq!(dom.inner_html(&live), "");
}

#[test]
fn depth_limit_leaves_deep_subtrees_alone() {
	let dom = MemoryDom::new();
	let old = h("div", vec![], children![h("p", vec![], children!["deep"])]);
	let reconciler = Reconciler::new(&dom).with_depth_limit(1);
	let live = reconciler.render(&old, &dom.body()).unwrap().unwrap();

	let new = h("div", vec![], children![h("p", vec![], children!["changed"])]);
	reconciler.patch(&new, Some(&old), &live).unwrap();
	assert_eq!(dom.inner_html(&live), "<p>deep</p>");
}

#[test]
fn duplicate_handlers_bind_once() {
	let dom = MemoryDom::new();
	let (first_count, first) = counter();
	let (second_count, second) = counter();
	let (third_count, third) = counter();
	let old = h("button", attrs! { "onClick" => first, "onClick" => second }, vec![]);
	let (reconciler, live) = rendered(&dom, &old);
	assert_eq!(dom.listeners(&live), vec!["click".to_owned()]);

	reconciler.patch(&h("button", attrs! { "onClick" => third }, vec![]), Some(&old), &live).unwrap();
	assert_eq!(dom.listeners(&live), vec!["click".to_owned()]);
	assert_eq!(dom.dispatch(&live, &Event::new("click")), 1);
	assert_eq!((first_count.get(), second_count.get(), third_count.get()), (0, 0, 1));
}
