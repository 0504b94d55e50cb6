//! The todo list app: App → TodoList → Todo, toggled by clicks.

use std::cell::Cell;

use spark_vtree::children::class_set;
use spark_vtree::{
    Component, ContainerId, Context, Element, EventType, NativeEvent, NodeId, Runtime,
};

// =============================================================================
// Components
// =============================================================================

struct App;

#[derive(Clone, PartialEq, Default)]
struct AppProps {
    items: Vec<String>,
}

impl Component for App {
    const NAME: &'static str = "App";
    type Props = AppProps;
    type State = ();

    fn render(cx: &Context<'_, Self>) -> Element {
        Element::tag("div")
            .class("container")
            .child(Element::tag("h1").child("Todo App"))
            .child(Element::component::<TodoList>(TodoListProps {
                items: cx.props().items.clone(),
            }))
    }
}

struct TodoList;

#[derive(Clone, PartialEq, Default)]
struct TodoListProps {
    items: Vec<String>,
}

impl Component for TodoList {
    const NAME: &'static str = "TodoList";
    type Props = TodoListProps;
    type State = ();

    fn render(cx: &Context<'_, Self>) -> Element {
        Element::tag("ul").children(cx.props().items.iter().map(|title| {
            Element::component::<Todo>(TodoProps {
                title: title.clone(),
            })
        }))
    }
}

thread_local! {
    static TODO_RENDERS: Cell<usize> = const { Cell::new(0) };
}

struct Todo;

#[derive(Clone, PartialEq, Default)]
struct TodoProps {
    title: String,
}

#[derive(Clone, Default)]
struct TodoState {
    done: bool,
}

impl Component for Todo {
    const NAME: &'static str = "Todo";
    type Props = TodoProps;
    type State = TodoState;

    fn render(cx: &Context<'_, Self>) -> Element {
        TODO_RENDERS.with(|n| n.set(n.get() + 1));
        let handle = cx.handle();
        let done = cx.state().done;
        Element::tag("li")
            .class(class_set([("done", done)]))
            .on(EventType::Click, move |_| handle.set_state(move |s| s.done = !done))
            .child(cx.props().title.clone())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn setup(items: &[&str]) -> (Runtime, ContainerId) {
    let mut runtime = Runtime::new();
    runtime.define::<App>();
    runtime.define::<TodoList>();
    runtime.define::<Todo>();
    let container = runtime.create_container();
    let props = AppProps {
        items: items.iter().map(|s| s.to_string()).collect(),
    };
    runtime
        .render(Element::component::<App>(props), container)
        .unwrap();
    (runtime, container)
}

fn items(runtime: &Runtime, container: ContainerId) -> Vec<NodeId> {
    runtime.native().find_by_tag(container.node(), "li")
}

fn renders() -> usize {
    TODO_RENDERS.with(Cell::get)
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_initial_mount() {
    let (runtime, container) = setup(&["a", "b", "c"]);
    assert_eq!(
        runtime.native().outline(container.node()),
        "<div class=\"container\"><h1>Todo App</h1><ul>\
         <li class=\"\">a</li><li class=\"\">b</li><li class=\"\">c</li></ul></div>"
    );
    assert_eq!(runtime.instance_count(), 5);
}

#[test]
fn test_click_toggles_only_that_item() {
    let (mut runtime, container) = setup(&["a", "b", "c"]);
    let before = items(&runtime, container);

    let outcome = runtime.dispatch(NativeEvent::click(), before[1]).unwrap();
    assert_eq!(outcome.handled, 1);
    assert_eq!(outcome.passes, 1);

    let after = items(&runtime, container);
    assert_eq!(before, after);
    let classes: Vec<_> = after
        .iter()
        .map(|node| runtime.native().attribute(*node, "class").unwrap().to_string())
        .collect();
    assert_eq!(classes, vec!["", "done", ""]);

    runtime.dispatch(NativeEvent::click(), after[1]).unwrap();
    assert_eq!(
        runtime.native().attribute(after[1], "class").unwrap().as_str(),
        Some("")
    );
}

#[test]
fn test_click_on_text_bubbles_to_item() {
    let (mut runtime, container) = setup(&["a", "b"]);
    let li = items(&runtime, container)[0];
    let text = runtime.native().children(li)[0];

    runtime.dispatch(NativeEvent::click(), text).unwrap();
    assert_eq!(runtime.native().outline(li), "<li class=\"done\">a</li>");
}

#[test]
fn test_one_render_per_dispatch() {
    let (mut runtime, container) = setup(&["a", "b", "c"]);
    let li = items(&runtime, container)[2];
    let start = renders();

    runtime.dispatch(NativeEvent::click(), li).unwrap();
    assert_eq!(renders() - start, 1);
}

#[test]
fn test_listener_owner_is_the_todo() {
    let (mut runtime, container) = setup(&["a"]);
    let li = items(&runtime, container)[0];
    runtime.dispatch(NativeEvent::click(), li).unwrap();

    let event = runtime.last_event().unwrap();
    let owner = event.owner.unwrap();
    assert!(runtime.handle::<Todo>(owner).is_some());
    assert_eq!(runtime.find_native_node(owner), Some(li));
    assert!(runtime.state::<Todo>(owner).unwrap().done);
}

#[test]
fn test_appending_keeps_existing_state() {
    let (mut runtime, container) = setup(&["a", "b"]);
    let first = items(&runtime, container)[0];
    runtime.dispatch(NativeEvent::click(), first).unwrap();

    runtime
        .set_props::<App>(container, |p| p.items.push("c".into()))
        .unwrap();

    let now = items(&runtime, container);
    assert_eq!(now.len(), 3);
    assert_eq!(now[0], first);
    assert_eq!(runtime.native().text_content(now[0]), "a");
    assert_eq!(
        runtime.native().attribute(now[0], "class").unwrap().as_str(),
        Some("done")
    );
    assert_eq!(
        runtime.native().attribute(now[2], "class").unwrap().as_str(),
        Some("")
    );
}
