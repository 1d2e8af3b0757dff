use xylem::{
	attrs, children,
	node::{Child, EVENT_PREFIX},
	h, AttrValue, Element, Event, Handler, Node,
};

#[test]
fn children_are_flattened_one_level() {
	let node = h("ul", vec![], children!["a", vec!["b", "c"], 1, None::<&str>, false]);
	let element = node.as_element().unwrap();
	assert_eq!(element.children, vec![Node::text("a"), Node::text("b"), Node::text("c"), Node::text("1")]);
}

#[test]
fn deeper_lists_are_dropped() {
	let nested = Child::List(vec![Child::from("kept"), Child::List(vec![Child::from("dropped")])]);
	let node = h("div", vec![], vec![nested]);
	assert_eq!(node.as_element().unwrap().children, vec![Node::text("kept")]);
}

#[test]
fn true_occupies_a_position_but_renders_nothing() {
	let node = h("div", vec![], children![true, "x"]);
	assert_eq!(node.as_element().unwrap().children, vec![Node::Empty, Node::text("x")]);
	assert_eq!(Node::Empty.dom_len(), 0);
}

#[test]
fn empty_tag_is_empty() {
	assert_eq!(h("", attrs! { "id" => "x" }, children!["ignored"]), Node::Empty);
}

#[test]
fn attributes_keep_their_values() {
	let handler = Handler::new(|_: &Event| ());
	let node = h("input", attrs! { "value" => "v", "disabled" => true, "onInput" => handler.clone(), "maxlength" => 3 }, vec![]);
	let element = node.as_element().unwrap();
	assert_eq!(element.attribute("value"), Some(&AttrValue::Text("v".to_owned())));
	assert_eq!(element.attribute("disabled"), Some(&AttrValue::Bool(true)));
	assert_eq!(element.attribute("maxlength"), Some(&AttrValue::Text("3".to_owned())));
	assert_eq!(element.attribute("onInput"), Some(&AttrValue::Handler(handler)));
	assert!(element.attributes[2].name.starts_with(EVENT_PREFIX));
}

#[test]
fn builder_matches_constructor() {
	let built: Node = Element::new("p").attr("class", "lead").child("hi").child(vec!["a", "b"]).into();
	assert_eq!(built, h("p", attrs! { "class" => "lead" }, children!["hi", "a", "b"]));
}

#[test]
fn same_kind() {
	assert!(h("p", vec![], vec![]).same_kind(&h("p", attrs! { "id" => "x" }, children!["y"])));
	assert!(!h("p", vec![], vec![]).same_kind(&h("P", vec![], vec![])));
	assert!(!Node::text("p").same_kind(&h("p", vec![], vec![])));
	assert!(Node::text("a").same_kind(&Node::text("b")));
}

#[test]
fn later_attributes_replace_earlier_ones() {
	let first = Handler::new(|_: &Event| ());
	let second = Handler::new(|_: &Event| ());
	let node = h("button", attrs! { "onClick" => first, "title" => "a", "onClick" => second.clone(), "title" => "b" }, vec![]);
	let element = node.as_element().unwrap();
	assert_eq!(element.attributes.len(), 2);
	assert_eq!(element.attributes[0].name, "onClick");
	assert_eq!(element.attribute("onClick"), Some(&AttrValue::Handler(second)));
	assert_eq!(element.attribute("title"), Some(&AttrValue::Text("b".to_owned())));
}
