//! Child matching, attribute diffing and subtree replacement.

use std::cell::RefCell;

use spark_vtree::{
    AttrValue, Component, ContainerId, Context, Element, EventType, HookResult, InstanceId,
    NativeEvent, Runtime, RuntimeConfig,
};

thread_local! {
    static LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn take_log() -> Vec<String> {
    LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

// =============================================================================
// Components
// =============================================================================

struct Item;

#[derive(Clone, PartialEq, Default)]
struct ItemProps {
    label: String,
}

impl Component for Item {
    const NAME: &'static str = "Item";
    type Props = ItemProps;
    type State = u32;

    fn render(cx: &Context<'_, Self>) -> Element {
        let handle = cx.handle();
        Element::tag("li")
            .on(EventType::Click, move |_| handle.set_state(|n| *n += 1))
            .child(format!("{}{}", cx.props().label, cx.state()))
    }

    fn will_unmount(cx: &Context<'_, Self>) -> HookResult {
        LOG.with(|log| log.borrow_mut().push(format!("unmount:{}", cx.props().label)));
        Ok(())
    }
}

struct List;

#[derive(Clone, PartialEq, Default)]
struct ListProps {
    labels: Vec<&'static str>,
    keyed: bool,
}

impl Component for List {
    const NAME: &'static str = "List";
    type Props = ListProps;
    type State = ();

    fn render(cx: &Context<'_, Self>) -> Element {
        let keyed = cx.props().keyed;
        Element::tag("ul").children(cx.props().labels.iter().map(|label| {
            let item = Element::component::<Item>(ItemProps {
                label: label.to_string(),
            });
            if keyed { item.key(*label) } else { item }
        }))
    }
}

struct Badge;

impl Component for Badge {
    const NAME: &'static str = "Badge";
    type Props = ();
    type State = ();

    fn render(_cx: &Context<'_, Self>) -> Element {
        Element::tag("em").child("badge")
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn setup(labels: Vec<&'static str>, keyed: bool) -> (Runtime, ContainerId) {
    take_log();
    let mut runtime = Runtime::with_config(RuntimeConfig::default().warn_on_duplicate_keys(false));
    runtime.define::<List>();
    runtime.define::<Item>();
    let container = runtime.create_container();
    runtime
        .render(Element::component::<List>(ListProps { labels, keyed }), container)
        .unwrap();
    (runtime, container)
}

fn relist(runtime: &mut Runtime, container: ContainerId, labels: Vec<&'static str>) {
    runtime
        .set_props::<List>(container, move |p| p.labels = labels)
        .unwrap();
}

fn owners(runtime: &Runtime, container: ContainerId) -> Vec<InstanceId> {
    runtime
        .native()
        .find_by_tag(container.node(), "li")
        .into_iter()
        .map(|li| runtime.native().owner(li).unwrap())
        .collect()
}

fn texts(runtime: &Runtime, container: ContainerId) -> Vec<String> {
    runtime
        .native()
        .find_by_tag(container.node(), "li")
        .into_iter()
        .map(|li| runtime.native().text_content(li))
        .collect()
}

fn click(runtime: &mut Runtime, container: ContainerId, position: usize) {
    let li = runtime.native().find_by_tag(container.node(), "li")[position];
    runtime.dispatch(NativeEvent::click(), li).unwrap();
}

// =============================================================================
// Children
// =============================================================================

#[test]
fn test_keyed_reorder_moves_instances() {
    let (mut runtime, container) = setup(vec!["a", "b", "c"], true);
    click(&mut runtime, container, 0);
    let before = owners(&runtime, container);

    relist(&mut runtime, container, vec!["c", "b", "a"]);

    let after = owners(&runtime, container);
    assert_eq!(after, vec![before[2], before[1], before[0]]);
    assert_eq!(texts(&runtime, container), vec!["c0", "b0", "a1"]);
    assert!(take_log().is_empty());
}

#[test]
fn test_unkeyed_reorder_reuses_by_position() {
    let (mut runtime, container) = setup(vec!["a", "b", "c"], false);
    click(&mut runtime, container, 0);
    let before = owners(&runtime, container);

    relist(&mut runtime, container, vec!["c", "b", "a"]);

    assert_eq!(owners(&runtime, container), before);
    // State stays with the position, props follow the new order
    assert_eq!(texts(&runtime, container), vec!["c1", "b0", "a0"]);
}

#[test]
fn test_removed_keyed_child_is_unmounted() {
    let (mut runtime, container) = setup(vec!["a", "b", "c"], true);
    let before = owners(&runtime, container);

    relist(&mut runtime, container, vec!["a", "c"]);

    assert_eq!(take_log(), vec!["unmount:b"]);
    assert_eq!(owners(&runtime, container), vec![before[0], before[2]]);
    assert!(!runtime.is_mounted(before[1]));
}

#[test]
fn test_new_key_mounts_fresh_instance() {
    let (mut runtime, container) = setup(vec!["a"], true);
    click(&mut runtime, container, 0);
    let old = owners(&runtime, container)[0];

    relist(&mut runtime, container, vec!["z", "a"]);

    let now = owners(&runtime, container);
    assert_eq!(now[1], old);
    assert_ne!(now[0], old);
    assert_eq!(texts(&runtime, container), vec!["z0", "a1"]);
}

#[test]
fn test_duplicate_keys_mount_separately() {
    let (mut runtime, container) = setup(vec!["a", "a"], true);
    let before = owners(&runtime, container);
    assert_eq!(before.len(), 2);
    assert_ne!(before[0], before[1]);

    relist(&mut runtime, container, vec!["a", "a"]);

    let after = owners(&runtime, container);
    assert_eq!(after[0], before[0]);
    assert_ne!(after[1], before[1]);
    assert_eq!(runtime.instance_count(), 3);
}

#[test]
fn test_different_component_at_same_position_is_replaced() {
    take_log();
    let mut runtime = Runtime::new();
    runtime.define::<Item>();
    runtime.define::<Badge>();
    let container = runtime.create_container();
    let item = |label: &str| {
        Element::component::<Item>(ItemProps {
            label: label.to_string(),
        })
    };

    runtime
        .render(Element::tag("div").child(item("x")), container)
        .unwrap();
    let old = owners(&runtime, container)[0];

    runtime
        .render(Element::tag("div").child(Element::component::<Badge>(())), container)
        .unwrap();
    assert_eq!(take_log(), vec!["unmount:x"]);
    assert!(!runtime.is_mounted(old));
    assert_eq!(runtime.instance_count(), 1);
    assert_eq!(runtime.native().outline(container.node()), "<div><em>badge</em></div>");

    // Same key, different component
    runtime
        .render(Element::tag("div").child(item("y").key("k")), container)
        .unwrap();
    runtime
        .render(
            Element::tag("div").child(Element::component::<Badge>(()).key("k")),
            container,
        )
        .unwrap();
    assert_eq!(take_log(), vec!["unmount:y"]);
    assert_eq!(runtime.native().outline(container.node()), "<div><em>badge</em></div>");
}

// =============================================================================
// Host nodes
// =============================================================================

#[test]
fn test_attribute_diff_keeps_node() {
    let mut runtime = Runtime::new();
    let container = runtime.create_container();
    let first = runtime
        .render(
            Element::tag("div").class("a").attr("title", "t").attr("tabindex", 1),
            container,
        )
        .unwrap();

    let second = runtime
        .render(Element::tag("div").class("b").attr("tabindex", 1), container)
        .unwrap();

    assert_eq!(first.node, second.node);
    let native = runtime.native();
    assert_eq!(native.attribute(second.node, "class"), Some(&AttrValue::from("b")));
    assert_eq!(native.attribute(second.node, "title"), None);
    assert_eq!(native.attribute(second.node, "tabindex"), Some(&AttrValue::Int(1)));
}

#[test]
fn test_kind_change_replaces_node() {
    let mut runtime = Runtime::new();
    let container = runtime.create_container();
    runtime
        .render(
            Element::tag("div").child(Element::tag("span")).child("text"),
            container,
        )
        .unwrap();
    let span = runtime.native().find_by_tag(container.node(), "span")[0];

    runtime
        .render(
            Element::tag("div").child(Element::tag("p")).child("text"),
            container,
        )
        .unwrap();

    assert!(!runtime.native().contains(span));
    assert_eq!(runtime.native().outline(container.node()), "<div><p></p>text</div>");
}

#[test]
fn test_fragments_and_empties_flatten_into_children() {
    let mut runtime = Runtime::new();
    let container = runtime.create_container();
    runtime
        .render(
            Element::tag("ul").children([
                Element::tag("li").child("1"),
                Element::empty(),
                Element::fragment([Element::tag("li").child("2"), Element::tag("li").child("3")]),
                Option::<Element>::None.into(),
            ]),
            container,
        )
        .unwrap();
    assert_eq!(
        runtime.native().outline(container.node()),
        "<ul><li>1</li><li>2</li><li>3</li></ul>"
    );
}

#[test]
fn test_style_attribute_outline() {
    let mut runtime = Runtime::new();
    let container = runtime.create_container();
    runtime
        .render(
            Element::tag("p").attr("style", AttrValue::style([("margin", "0"), ("color", "red")])),
            container,
        )
        .unwrap();
    assert_eq!(
        runtime.native().outline(container.node()),
        "<p style=\"color: red; margin: 0;\"></p>"
    );
}
