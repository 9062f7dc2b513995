//! BDD step definitions for hyperscript construction

use std::rc::Rc;

use cucumber::{given, then, when};

use racs_dashboard::cell::refresh;
use racs_dashboard::dom::{Dom, NodeId};
use racs_dashboard::hyperscript::{h, Child};

use crate::world::DashboardWorld;

fn build(world: &mut DashboardWorld, tag: &str, children: Vec<Child<NodeId>>) {
    match h(&world.dom, tag, children) {
        Ok(element) => {
            world.element = Some(element);
            world.build_error = None;
        }
        Err(e) => {
            world.element = None;
            world.build_error = Some(e.to_string());
        }
    }
}

fn element(world: &DashboardWorld) -> NodeId {
    world.element.expect("no element built")
}

#[given(expr = "a producer returning {string}")]
fn producer_returning(world: &mut DashboardWorld, value: String) {
    *world.producer_value.borrow_mut() = value;
}

#[given(expr = "an element {string} inside {string}")]
fn element_inside(world: &mut DashboardWorld, tag: String, parent_tag: String) {
    let child = h(&world.dom, &tag, vec![]).unwrap();
    let parent = h(&world.dom, &parent_tag, vec![Child::node(child)]).unwrap();
    world.element = Some(child);
    world.parent = Some(parent);
}

#[when(expr = "I build {string} with no children")]
fn build_empty(world: &mut DashboardWorld, tag: String) {
    build(world, &tag, vec![]);
}

#[when(expr = "I build {string} with children {string}, {string}, {string}")]
fn build_with_children(world: &mut DashboardWorld, tag: String, a: String, b: String, c: String) {
    let children = [a, b, c]
        .into_iter()
        .map(|text| {
            if text.is_empty() {
                Child::Empty
            } else {
                Child::Text(text)
            }
        })
        .collect();
    build(world, &tag, children);
}

#[when(expr = "I build {string} with the producer as its only child")]
fn build_with_producer(world: &mut DashboardWorld, tag: String) {
    let value = Rc::clone(&world.producer_value);
    build(world, &tag, vec![Child::producer(move || value.borrow().clone())]);
}

#[when(expr = "I build {string} containing that element")]
fn build_containing(world: &mut DashboardWorld, tag: String) {
    let child = element(world);
    build(world, &tag, vec![Child::node(child)]);
}

#[when(expr = "the producer now returns {string}")]
fn producer_now_returns(world: &mut DashboardWorld, value: String) {
    *world.producer_value.borrow_mut() = value;
}

#[when("bound text is refreshed")]
fn text_refreshed(world: &mut DashboardWorld) {
    refresh(&world.dom, &element(world)).unwrap();
}

#[then(expr = "the element is a {string}")]
fn element_is(world: &mut DashboardWorld, tag: String) {
    assert_eq!(world.dom.tag_name(&element(world)), Some(tag));
}

#[then(expr = "the element has classes {string}")]
fn element_has_classes(world: &mut DashboardWorld, classes: String) {
    let expected: Vec<String> = classes.split(',').map(str::to_string).collect();
    assert_eq!(world.dom.classes(&element(world)), expected);
}

#[then(expr = "the element has {int} child nodes")]
fn element_child_count(world: &mut DashboardWorld, count: usize) {
    assert_eq!(world.dom.child_nodes(&element(world)).len(), count);
}

#[then(expr = "the old parent has {int} child nodes")]
fn parent_child_count(world: &mut DashboardWorld, count: usize) {
    let parent = world.parent.expect("no parent element");
    assert_eq!(world.dom.child_nodes(&parent).len(), count);
}

#[then(expr = "the element text is {string}")]
fn element_text(world: &mut DashboardWorld, text: String) {
    assert_eq!(world.dom.text_content(&element(world)), text);
}

#[then(expr = "building fails with a {string}")]
fn building_fails(world: &mut DashboardWorld, kind: String) {
    let error = world.build_error.as_ref().expect("building succeeded");
    assert!(error.contains(&kind), "unexpected error: {}", error);
}
