//! BDD step definitions for node lifecycle helpers

use cucumber::{then, when};

use racs_dashboard::dom::{DomEvent, DomExt, TRANSITION_END_EVENTS};

use crate::world::DashboardWorld;

#[when("the element is set to be removed after its transition")]
fn remove_after_transition(world: &mut DashboardWorld) {
    let element = world.element.expect("no element built");
    world.dom.remove_after_transition(&element).unwrap();
}

#[when(expr = "the element receives {string}")]
fn element_receives(world: &mut DashboardWorld, event: String) {
    let element = world.element.expect("no element built");
    world.dom.dispatch(&element, &DomEvent::new(event));
}

#[then("the element has no transition listeners")]
fn no_transition_listeners(world: &mut DashboardWorld) {
    let element = world.element.expect("no element built");
    for event in TRANSITION_END_EVENTS {
        assert_eq!(world.dom.listener_count(&element, event), 0, "{}", event);
    }
}
