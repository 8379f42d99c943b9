//! End-to-end reconciler behaviour against the in-memory host.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_fiber::*;

// =============================================================================
// Helpers
// =============================================================================

fn mount_app(element: Element) -> Root<MemoryHost> {
    let mut host = MemoryHost::new();
    let body = host.create_container("body");
    mount(host, body, element).unwrap()
}

fn markup(root: &Root<MemoryHost>) -> String {
    root.host().to_markup(*root.container())
}

fn first(root: &Root<MemoryHost>, tag: &str) -> NodeId {
    root.host().find_by_tag(*root.container(), tag)[0]
}

fn tagged(tag: &str, text: &str) -> Element {
    create_element(tag, Props::new(), children![text])
}

fn list(children: Vec<Element>) -> Element {
    create_element("ul", Props::new(), children![children])
}

fn shared<T: Any>(value: Rc<T>) -> PropValue {
    PropValue::Data(value)
}

// =============================================================================
// Components
// =============================================================================

const COUNTER: Component = Component::new("Counter", counter);
const FAULTY: Component = Component::new("Faulty", faulty);
const PLAYLIST: Component = Component::new("Playlist", playlist);
const FIELD: Component = Component::new("Field", field);
const RESTLESS: Component = Component::new("Restless", restless);
const PAIR: Component = Component::new("Pair", pair);

fn counter(cx: &mut Scope<'_>, _props: &Props) -> Rendered {
    let (count, set_count) = cx.use_state(0i32);
    Ok(create_element(
        "button",
        Props::new().on("onClick", move |_| set_count.update(|n| n + 1)),
        children![count],
    ))
}

fn faulty(_cx: &mut Scope<'_>, props: &Props) -> Rendered {
    if props.get("fail") == Some(&PropValue::Bool(true)) {
        return Err(Interrupt::fail("boom"));
    }
    Ok(tagged("p", "fine"))
}

type Pending = RefCell<Vec<Resolver<Vec<String>>>>;

fn playlist(cx: &mut Scope<'_>, props: &Props) -> Rendered {
    let pending = props
        .get_data::<Pending>("pending")
        .ok_or_else(|| Interrupt::fail("missing pending slot"))?;
    if let Some(renders) = props.get_data::<Cell<usize>>("renders") {
        renders.set(renders.get() + 1);
    }

    let tracks: Vec<String> = cx
        .resource("tracks", move |resolver| pending.borrow_mut().push(resolver))
        .ready()?;

    let items = tracks.iter().map(|t| tagged("li", t)).collect();
    Ok(list(items))
}

fn field(cx: &mut Scope<'_>, _props: &Props) -> Rendered {
    let (text, set_text) = cx.use_state(String::new());
    let input = create_element(
        "input",
        Props::new().with("value", text.clone()).on("onChange", move |event| {
            if let Some(value) = &event.value {
                set_text.set(value.clone());
            }
        }),
        children![],
    );
    Ok(create_element("div", Props::new(), children![input, create_element("p", Props::new(), children![text])]))
}

fn restless(cx: &mut Scope<'_>, _props: &Props) -> Rendered {
    cx.request_render();
    Ok(tagged("p", "again"))
}

fn pair(_cx: &mut Scope<'_>, _props: &Props) -> Rendered {
    Ok(list(vec![tagged("li", "one"), tagged("li", "two")]))
}

// =============================================================================
// Idempotence
// =============================================================================

fn page() -> Element {
    create_element(
        "main",
        Props::new().with("className", "page").with("data-id", 3),
        children![tagged("h1", "Title"), tagged("p", "body")],
    )
}

#[test]
fn test_identical_rerender_touches_nothing() {
    let mut root = mount_app(page());
    let before = markup(&root);
    root.host_mut().reset_stats();

    root.render(page());
    let report = root.flush().unwrap();

    assert!(!report.any_host_mutation());
    assert!(root.host().stats().is_empty());
    assert_eq!(markup(&root), before);
}

// =============================================================================
// Positional matching
// =============================================================================

#[test]
fn test_nan_prop_is_not_rewritten() {
    let gauge = || create_element("meter", Props::new().with("data-x", f64::NAN), children![]);
    let mut root = mount_app(gauge());
    root.host_mut().reset_stats();

    root.render(gauge());
    let report = root.flush().unwrap();

    assert_eq!(report.props_set, 0);
    assert!(root.host().stats().is_empty());
}

#[test]
fn test_removing_first_of_same_typed_siblings() {
    let mut root = mount_app(list(vec![tagged("li", "a"), tagged("li", "b"), tagged("li", "c")]));
    let first_li = first(&root, "li");
    root.host_mut().reset_stats();

    root.render(list(vec![tagged("li", "b"), tagged("li", "c")]));
    let report = root.flush().unwrap();

    assert_eq!(markup(&root), "<body><ul><li>b</li><li>c</li></ul></body>");
    assert_eq!(first(&root, "li"), first_li);
    assert_eq!(report.text_updates, 2);
    assert_eq!(report.nodes_removed, 1);
    assert_eq!(root.host().stats().nodes_created(), 0);
}

#[test]
fn test_type_change_deletes_and_places() {
    let mut root = mount_app(list(vec![tagged("div", "A"), tagged("span", "B"), tagged("p", "C")]));
    root.host_mut().reset_stats();

    root.render(list(vec![tagged("div", "A"), tagged("p", "C")]));
    let report = root.flush().unwrap();

    assert_eq!(markup(&root), "<body><ul><div>A</div><p>C</p></ul></body>");
    assert_eq!(report.fibers_deleted, 2);
    assert_eq!(report.nodes_removed, 2);
    assert_eq!(report.nodes_created, 2);
}

#[test]
fn test_placement_keeps_sibling_order() {
    let mut root = mount_app(list(vec![tagged("div", "A"), tagged("span", "B"), tagged("p", "C")]));
    let p = first(&root, "p");

    root.render(list(vec![tagged("div", "A"), tagged("em", "X"), tagged("p", "C")]));
    root.flush().unwrap();

    assert_eq!(markup(&root), "<body><ul><div>A</div><em>X</em><p>C</p></ul></body>");
    assert_eq!(first(&root, "p"), p);
}

// =============================================================================
// Deletion
// =============================================================================

#[test]
fn test_deleting_component_removes_its_host_subtree_once() {
    let app = |with_pair: bool| {
        create_element(
            "div",
            Props::new(),
            children![tagged("span", "s"), with_pair.then(|| component(PAIR, Props::new()))],
        )
    };
    let mut root = mount_app(app(true));
    assert_eq!(markup(&root), "<body><div><span>s</span><ul><li>one</li><li>two</li></ul></div></body>");
    root.host_mut().reset_stats();

    root.render(app(false));
    let report = root.flush().unwrap();

    assert_eq!(markup(&root), "<body><div><span>s</span></div></body>");
    assert_eq!(root.host().stats().removed, 1);
    assert_eq!(report.nodes_removed, 1);
}

// =============================================================================
// Props
// =============================================================================

#[test]
fn test_removed_props_are_cleared() {
    let full = create_element(
        "input",
        Props::new().with("value", "x").with("title", "t").with("data-k", "v"),
        children![],
    );
    let mut root = mount_app(full);
    let input = first(&root, "input");
    assert_eq!(root.host().attribute(input, "data-k"), Some("v"));

    root.render(create_element("input", Props::new(), children![]));
    let report = root.flush().unwrap();

    assert_eq!(root.host().property(input, "value"), None);
    assert_eq!(root.host().property(input, "title"), None);
    assert_eq!(root.host().attribute(input, "data-k"), None);
    assert_eq!(report.props_removed, 3);
    assert_eq!(markup(&root), "<body><input></input></body>");

    root.render(create_element("input", Props::new().with("value", "y"), children![]));
    root.flush().unwrap();
    assert_eq!(root.host().property(input, "value"), Some(&PropValue::from("y")));
}

// =============================================================================
// Hooks
// =============================================================================

#[test]
fn test_counter_click_updates_text_in_place() {
    let mut root = mount_app(component(COUNTER, Props::new()));
    let button = first(&root, "button");
    assert_eq!(markup(&root), "<body><button>0</button></body>");

    assert!(root.host().click(button));
    assert!(root.has_pending_work());
    let report = root.flush().unwrap();

    assert_eq!(markup(&root), "<body><button>1</button></body>");
    assert_eq!(first(&root, "button"), button);
    // root, Counter, button, text
    assert_eq!(report.units_of_work, 4);
    assert_eq!(report.nodes_created, 0);
    assert_eq!(report.text_updates, 1);
    assert!(!root.has_pending_work());
}

#[test]
fn test_updates_apply_in_order_within_one_pass() {
    let mut root = mount_app(component(COUNTER, Props::new()));
    let button = first(&root, "button");

    root.host().click(button);
    root.host().click(button);
    root.host().click(button);
    let report = root.flush().unwrap();

    assert_eq!(markup(&root), "<body><button>3</button></body>");
    assert_eq!(report.units_of_work, 4);
}

#[test]
fn test_state_survives_parent_rerender_and_resets_on_type_change() {
    let with_counter = || create_element("div", Props::new(), children![component(COUNTER, Props::new())]);
    let mut root = mount_app(with_counter());
    root.host().click(first(&root, "button"));
    root.host().click(first(&root, "button"));
    root.flush().unwrap();
    assert_eq!(root.host().text_content(first(&root, "button")), "2");

    root.render(with_counter());
    root.flush().unwrap();
    assert_eq!(root.host().text_content(first(&root, "button")), "2");

    root.render(create_element("div", Props::new(), children![tagged("span", "gone")]));
    root.flush().unwrap();
    root.render(with_counter());
    root.flush().unwrap();
    assert_eq!(root.host().text_content(first(&root, "button")), "0");
}

#[test]
fn test_discarded_pass_keeps_queued_updates() {
    let mut root = mount_app(component(COUNTER, Props::new()));
    root.host().click(first(&root, "button"));

    // Restart the pass after the component rendered once.
    assert_eq!(root.work_loop(&Exhausted).unwrap(), WorkStatus::Yielded);
    assert_eq!(root.work_loop(&Exhausted).unwrap(), WorkStatus::Yielded);
    root.render(component(COUNTER, Props::new()));
    root.flush().unwrap();
    assert_eq!(markup(&root), "<body><button>1</button></body>");

    root.host().click(first(&root, "button"));
    root.flush().unwrap();
    assert_eq!(markup(&root), "<body><button>2</button></body>");
}

#[test]
fn test_change_event_round_trip() {
    let mut root = mount_app(component(FIELD, Props::new()));
    let input = first(&root, "input");

    let event = Event::new("change").with_value("abc");
    assert!(root.host().dispatch(input, "onchange", &event));
    root.flush().unwrap();

    assert_eq!(root.host().property(input, "value"), Some(&PropValue::from("abc")));
    assert_eq!(root.host().text_content(first(&root, "p")), "abc");
}

// =============================================================================
// Resources
// =============================================================================

#[test]
fn test_resource_suspends_dedups_and_resumes() {
    let pending: Rc<Pending> = Rc::new(RefCell::new(Vec::new()));
    let renders = Rc::new(Cell::new(0usize));
    let element = component(
        PLAYLIST,
        Props::new()
            .with("pending", shared(pending.clone()))
            .with("renders", shared(renders.clone())),
    );

    let mut root = mount_app(element.clone());
    assert_eq!(markup(&root), "<body><h2>resource loading</h2></body>");
    assert_eq!(pending.borrow().len(), 1);

    root.render(element);
    let report = root.flush().unwrap();
    assert_eq!(report.suspended, 1);
    assert_eq!(pending.borrow().len(), 1);
    assert_eq!(renders.get(), 2);
    assert_eq!(root.resources().in_flight_count(), 1);

    let resolver = pending.borrow_mut().pop().unwrap();
    resolver.resolve(vec!["one".to_string(), "two".to_string()]);
    assert!(root.has_pending_work());
    root.flush().unwrap();

    assert_eq!(markup(&root), "<body><ul><li>one</li><li>two</li></ul></body>");
    assert_eq!(root.resources().in_flight_count(), 0);
    assert!(root.resources().is_settled::<Vec<String>>("tracks"));
}

#[test]
fn test_dropped_task_is_retried_on_next_pass() {
    let pending: Rc<Pending> = Rc::new(RefCell::new(Vec::new()));
    let element = component(PLAYLIST, Props::new().with("pending", shared(pending.clone())));
    let mut root = mount_app(element);
    assert_eq!(pending.borrow().len(), 1);

    let abandoned = pending.borrow_mut().pop();
    drop(abandoned);
    assert!(root.has_pending_work());

    root.flush().unwrap();
    assert_eq!(pending.borrow().len(), 1);
    assert_eq!(markup(&root), "<body><h2>resource loading</h2></body>");

    let resolver = pending.borrow_mut().pop().unwrap();
    resolver.resolve(vec!["retried".to_string()]);
    root.flush().unwrap();
    assert_eq!(markup(&root), "<body><ul><li>retried</li></ul></body>");
}

#[test]
fn test_suspended_rerenders_wait_once() {
    let pending: Rc<Pending> = Rc::new(RefCell::new(Vec::new()));
    let element = component(PLAYLIST, Props::new().with("pending", shared(pending.clone())));
    let mut root = mount_app(element);

    for _ in 0..5 {
        root.trigger().request();
        root.flush().unwrap();
    }

    let resolver = pending.borrow_mut().pop().unwrap();
    assert_eq!(resolver.handle().waiter_count(), 1);

    resolver.resolve(vec!["done".to_string()]);
    root.flush().unwrap();
    assert_eq!(markup(&root), "<body><ul><li>done</li></ul></body>");
}

#[test]
fn test_custom_fallback() {
    let pending: Rc<Pending> = Rc::new(RefCell::new(Vec::new()));
    let mut host = MemoryHost::new();
    let body = host.create_container("body");
    let config = RootConfig::default().with_fallback(tagged("em", "wait"));
    let mut root = Root::new(host, body).with_config(config);

    root.render(component(PLAYLIST, Props::new().with("pending", shared(pending))));
    root.flush().unwrap();
    assert_eq!(markup(&root), "<body><em>wait</em></body>");
}

// =============================================================================
// Work loop
// =============================================================================

#[test]
fn test_fallback_scheduler_does_one_unit_per_tick() {
    let mut host = MemoryHost::new();
    let body = host.create_container("body");
    let mut root = Root::new(host, body);
    root.render(create_element("div", Props::new(), children![tagged("p", "a"), tagged("p", "b")]));

    let mut scheduler = ImmediateFallback;
    let mut ticks = 0;
    loop {
        ticks += 1;
        match root.tick(&mut scheduler).unwrap() {
            WorkStatus::Yielded => assert_eq!(markup(&root), "<body></body>"),
            WorkStatus::Committed(report) => {
                assert_eq!(report.units_of_work, ticks);
                break;
            }
            WorkStatus::Idle => panic!("pass never committed"),
        }
    }

    // root, div, p, "a", p, "b"
    assert_eq!(ticks, 6);
    assert_eq!(markup(&root), "<body><div><p>a</p><p>b</p></div></body>");
}

#[test]
fn test_frame_budget_finishes_small_tree_in_one_tick() {
    let mut host = MemoryHost::new();
    let body = host.create_container("body");
    let mut root = Root::new(host, body);
    root.render(page());

    let mut scheduler = FrameBudget::new(std::time::Duration::from_secs(5));
    assert!(root.tick(&mut scheduler).unwrap().is_committed());
    assert_eq!(root.tick(&mut scheduler).unwrap(), WorkStatus::Idle);
}

#[test]
fn test_component_failure_commits_nothing() {
    let mut root = mount_app(component(FAULTY, Props::new()));
    assert_eq!(markup(&root), "<body><p>fine</p></body>");
    let committed = root.current_root();

    root.render(component(FAULTY, Props::new().with("fail", true)));
    let err = root.flush().unwrap_err();

    assert!(matches!(err, RenderError::Component { component: "Faulty", .. }));
    assert!(err.to_string().contains("boom"));
    assert_eq!(markup(&root), "<body><p>fine</p></body>");
    assert_eq!(root.current_root(), committed);
    assert!(!root.has_pending_work());
}

#[test]
fn test_failed_passes_release_their_fibers() {
    let mut root = mount_app(component(FAULTY, Props::new()));
    let committed = root.tree().len();

    for _ in 0..10 {
        root.render(component(FAULTY, Props::new().with("fail", true)));
        assert!(root.flush().is_err());
        assert_eq!(root.tree().len(), committed);
    }
}

#[test]
fn test_clicks_faster_than_commits_keep_arena_bounded() {
    let mut host = MemoryHost::new();
    let body = host.create_container("body");
    let mut root = Root::new(host, body);
    root.render(component(COUNTER, Props::new()));
    root.flush().unwrap();
    let committed = root.tree().len();

    let mut scheduler = ImmediateFallback;
    for _ in 0..200 {
        root.host().click(first(&root, "button"));
        root.tick(&mut scheduler).unwrap();
        root.tick(&mut scheduler).unwrap();
        assert!(root.tree().len() <= committed * 2);
    }

    root.flush().unwrap();
    assert_eq!(root.tree().len(), committed);
    assert_eq!(markup(&root), "<body><button>200</button></body>");
}

#[test]
fn test_flush_gives_up_when_state_never_settles() {
    let mut host = MemoryHost::new();
    let body = host.create_container("body");
    let mut root = Root::new(host, body).with_config(RootConfig::default().with_max_flush_passes(3));
    root.render(component(RESTLESS, Props::new()));

    let err = root.flush().unwrap_err();
    assert!(matches!(err, RenderError::Unsettled { passes: 3 }));
    assert_eq!(markup(&root), "<body><p>again</p></body>");
}

#[test]
fn test_two_sites_share_one_task() {
    let pending: Rc<Pending> = Rc::new(RefCell::new(Vec::new()));
    let site = || component(PLAYLIST, Props::new().with("pending", shared(pending.clone())));
    let mut root = mount_app(create_element("div", Props::new(), children![site(), site()]));

    assert_eq!(pending.borrow().len(), 1);
    assert_eq!(root.host().find_by_tag(*root.container(), "h2").len(), 2);

    let resolver = pending.borrow_mut().pop().unwrap();
    resolver.resolve(vec!["only".to_string()]);
    root.flush().unwrap();

    assert_eq!(
        markup(&root),
        "<body><div><ul><li>only</li></ul><ul><li>only</li></ul></div></body>"
    );
}

#[test]
fn test_shared_cache_wakes_every_root() {
    let pending: Rc<Pending> = Rc::new(RefCell::new(Vec::new()));
    let element = component(PLAYLIST, Props::new().with("pending", shared(pending.clone())));

    let mut first = mount_app(element.clone());
    let mut host = MemoryHost::new();
    let body = host.create_container("body");
    let mut second = Root::new(host, body).with_resources(first.resources().clone());
    second.render(element);
    second.flush().unwrap();
    assert_eq!(pending.borrow().len(), 1);

    let resolver = pending.borrow_mut().pop().unwrap();
    resolver.resolve(vec!["x".to_string()]);
    assert!(first.has_pending_work());
    assert!(second.has_pending_work());

    first.flush().unwrap();
    second.flush().unwrap();
    assert_eq!(markup(&first), markup(&second));
    assert_eq!(markup(&second), "<body><ul><li>x</li></ul></body>");
}
