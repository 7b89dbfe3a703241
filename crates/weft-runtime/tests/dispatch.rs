//! Event routing: handler resolution, delegation and nested dispatch.

mod common;

use common::{journal, node, panel, EmptyController, FormController, Panel};
use std::cell::RefCell;
use std::rc::Rc;
use tracing_test::traced_test;
use weft_core::config::Configurable;
use weft_core::{ConfigValue, DomEvent, Error, EventData};
use weft_runtime::{
    BindingStatus, Controller, CreateOptions, ListenerKind, ListenerScope, ListenerSpec, Runtime,
    RuntimeConfig,
};

fn click(path: Vec<weft_core::PathNode>) -> DomEvent {
    DomEvent::new("click", path, EventData::Pointer { x: 1.0, y: 2.0, button: 0 })
}

#[test]
fn named_handler_resolves_on_ancestor_controller() {
    let (rt, _renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let jc = Rc::clone(&j);
    let form = panel(
        &rt,
        "form",
        &j,
        CreateOptions::new().controller(move |core| FormController::new(core, &jc)),
    );
    let field = panel(
        &rt,
        "field",
        &j,
        CreateOptions::new()
            .parent(form)
            .dom_listener(ListenerSpec::named("click", "onSave")),
    );

    let report = rt
        .dispatch(click(vec![node(field, "input", ""), node(form, "div", "panel")]))
        .unwrap();
    assert_eq!(report.invoked, 1);
    assert!(report.is_clean());

    let cid = rt.controller_of(form).unwrap();
    assert_eq!(rt.with_controller(cid, |c: &FormController| c.saves).unwrap(), 1);
    assert_eq!(j.borrow().last().map(String::as_str), Some(format!("save:{field}").as_str()));
    assert_eq!(
        rt.binding_statuses(field, ListenerKind::Dom).unwrap(),
        vec![("click".to_owned(), BindingStatus::Bound)]
    );
}

#[test]
fn nearer_controller_without_handler_defers_to_parent_controller() {
    let (rt, _renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let jc = Rc::clone(&j);
    let outer = panel(
        &rt,
        "outer",
        &j,
        CreateOptions::new().controller(move |core| FormController::new(core, &jc)),
    );
    let inner = panel(
        &rt,
        "inner",
        &j,
        CreateOptions::new().parent(outer).controller(EmptyController::new),
    );
    let leaf = panel(
        &rt,
        "leaf",
        &j,
        CreateOptions::new()
            .parent(inner)
            .dom_listener(ListenerSpec::named("click", "onSave")),
    );

    let chain = rt.controller_chain(leaf).unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[1], rt.controller_of(outer).unwrap());

    rt.dispatch(click(vec![node(leaf, "button", "")])).unwrap();
    let outer_cid = rt.controller_of(outer).unwrap();
    assert_eq!(rt.with_controller(outer_cid, |c: &FormController| c.saves).unwrap(), 1);
}

#[test]
fn own_scope_runs_component_handler() {
    let (rt, _renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let id = panel(
        &rt,
        "p",
        &j,
        CreateOptions::new()
            .dom_listener(ListenerSpec::named("click", "onPanelClick").scope(ListenerScope::Own)),
    );
    rt.dispatch(click(vec![node(id, "div", "panel")])).unwrap();
    rt.dispatch(click(vec![node(id, "div", "panel")])).unwrap();
    assert_eq!(rt.with_component(id, |p: &Panel| p.clicks).unwrap(), 2);
}

#[traced_test]
#[test]
fn unresolved_handler_leaves_listener_inert() {
    let (rt, _renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let id = panel(
        &rt,
        "p",
        &j,
        CreateOptions::new().dom_listener(ListenerSpec::named("click", "onMissing")),
    );

    let report = rt.dispatch(click(vec![node(id, "div", "panel")])).unwrap();
    assert_eq!(report.inert, 1);
    assert_eq!(report.invoked, 0);
    assert!(logs_contain("handler not found, listener left inert"));
    assert_eq!(
        rt.binding_statuses(id, ListenerKind::Dom).unwrap(),
        vec![("click".to_owned(), BindingStatus::Failed)]
    );

    // Replacing the listeners gives them another chance.
    rt.replace_listeners(
        id,
        ListenerKind::Dom,
        vec![ListenerSpec::named("click", "onPanelClick").scope(ListenerScope::Own)],
    )
    .unwrap();
    assert_eq!(rt.resolve_listeners(id).unwrap(), 1);
    assert!(rt.dispatch(click(vec![node(id, "div", "panel")])).unwrap().is_clean());
}

#[test]
fn strict_handlers_fail_the_dispatch() {
    let (rt, _renderer) = Runtime::headless(RuntimeConfig::default().with_strict_handlers(true));
    let j = journal();
    let id = panel(
        &rt,
        "p",
        &j,
        CreateOptions::new().dom_listener(ListenerSpec::named("click", "onMissing")),
    );
    let err = rt.dispatch(click(vec![node(id, "div", "panel")])).unwrap_err();
    assert!(matches!(err, Error::HandlerResolution(ref f) if f.handler == "onMissing"));
}

#[test]
fn delegated_listener_sees_path_from_matched_node() {
    let (rt, _renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let seen: Rc<RefCell<Vec<(usize, Vec<String>)>>> = Rc::default();
    let sink = Rc::clone(&seen);
    let id = panel(
        &rt,
        "list",
        &j,
        CreateOptions::new().dom_listener(
            ListenerSpec::callback("click", move |cx, _event| {
                let matched = cx.matched_node().map(|n| n.cls.clone()).unwrap_or_default();
                sink.borrow_mut().push((cx.matched_path().len(), matched));
                Ok(())
            })
            .delegate("li.item")
            .unwrap(),
        ),
    );

    let path = vec![
        node(id, "span", "label"),
        node(id, "li", "item"),
        node(id, "ul", "items"),
        node(id, "div", "panel"),
    ];
    rt.dispatch(click(path)).unwrap();
    // No matching node: the listener is skipped.
    let report = rt.dispatch(click(vec![node(id, "div", "panel")])).unwrap();
    assert_eq!(report.invoked, 0);

    assert_eq!(&*seen.borrow(), &[(3, vec!["item".to_owned()])]);
}

#[test]
fn events_fired_while_dispatching_are_queued() {
    let (rt, _renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let log = Rc::clone(&j);
    let log_second = Rc::clone(&j);
    let id = panel(
        &rt,
        "p",
        &j,
        CreateOptions::new()
            .listener(ListenerSpec::callback("first", move |cx, _| {
                log.borrow_mut().push("first:start".to_owned());
                let queued = cx.runtime().fire(cx.component(), "second", EventData::None)?;
                assert_eq!(queued.queued, 1);
                assert_eq!(cx.runtime().queued_events(), 1);
                log.borrow_mut().push("first:end".to_owned());
                Ok(())
            }))
            .listener(ListenerSpec::callback("second", move |_, _| {
                log_second.borrow_mut().push("second".to_owned());
                Ok(())
            })),
    );
    j.borrow_mut().clear();

    let report = rt.fire(id, "first", EventData::None).unwrap();
    assert_eq!(report.invoked, 2);
    assert_eq!(rt.queued_events(), 0);
    assert_eq!(*j.borrow(), ["first:start", "first:end", "second"]);
}

#[test]
fn full_queue_is_reported_to_the_firing_handler() {
    let (rt, _renderer) = Runtime::headless(RuntimeConfig::default().with_event_queue_limit(1));
    let j = journal();
    let id = panel(
        &rt,
        "p",
        &j,
        CreateOptions::new().listener(ListenerSpec::callback("burst", |cx, _| {
            cx.runtime().fire(cx.component(), "echo", EventData::None)?;
            cx.runtime().fire(cx.component(), "echo", EventData::None)?;
            Ok(())
        })),
    );
    let report = rt.fire(id, "burst", EventData::None).unwrap();
    assert_eq!(report.errors, vec![Error::EventQueueFull(1)]);
}

#[test]
fn failing_handler_does_not_stop_later_listeners() {
    let (rt, _renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let id = panel(
        &rt,
        "p",
        &j,
        CreateOptions::new()
            .dom_listener(ListenerSpec::named("click", "onFail").scope(ListenerScope::Own))
            .dom_listener(ListenerSpec::named("click", "onPanelClick").scope(ListenerScope::Own)),
    );
    let report = rt.dispatch(click(vec![node(id, "div", "panel")])).unwrap();
    assert_eq!(report.invoked, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(rt.with_component(id, |p: &Panel| p.clicks).unwrap(), 1);
}

#[test]
fn inner_component_listeners_run_before_outer() {
    let (rt, _renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let outer = panel(
        &rt,
        "outer",
        &j,
        CreateOptions::new()
            .dom_listener(ListenerSpec::named("click", "onPanelClick").scope(ListenerScope::Own)),
    );
    let inner = panel(
        &rt,
        "inner",
        &j,
        CreateOptions::new()
            .parent(outer)
            .dom_listener(ListenerSpec::named("click", "onPanelClick").scope(ListenerScope::Own)),
    );
    j.borrow_mut().clear();

    rt.dispatch(click(vec![node(inner, "div", "panel"), node(outer, "div", "panel")]))
        .unwrap();
    assert_eq!(*j.borrow(), ["inner:click", "outer:click"]);
}

#[test]
fn parent_handler_scope_skips_controllers_without_the_handler() {
    let (rt, _renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let jc = Rc::clone(&j);
    let outer = panel(
        &rt,
        "outer",
        &j,
        CreateOptions::new().controller(move |core| FormController::new(core, &jc)),
    );
    let middle = panel(
        &rt,
        "middle",
        &j,
        CreateOptions::new().parent(outer).controller(EmptyController::new),
    );
    let inner = panel(
        &rt,
        "inner",
        &j,
        CreateOptions::new().parent(middle).controller(EmptyController::new),
    );
    let outer_cid = rt.controller_of(outer).unwrap();
    let inner_cid = rt.controller_of(inner).unwrap();

    let (found, missing) = rt
        .with_controller(inner_cid, |c: &EmptyController| {
            (
                c.core().parent_handler_scope("onSave").unwrap(),
                c.core().parent_handler_scope("onMissing").unwrap(),
            )
        })
        .unwrap();
    assert_eq!(found, Some(outer_cid));
    assert_eq!(missing, None);
}

#[test]
fn explicit_parent_controller_wins_over_ancestry() {
    let (rt, _renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let jc = Rc::clone(&j);
    let outer = panel(&rt, "outer", &j, CreateOptions::new().controller(EmptyController::new));
    let inner = panel(
        &rt,
        "inner",
        &j,
        CreateOptions::new().parent(outer).controller(EmptyController::new),
    );
    let side = panel(
        &rt,
        "side",
        &j,
        CreateOptions::new().controller(move |core| FormController::new(core, &jc)),
    );
    let outer_cid = rt.controller_of(outer).unwrap();
    let inner_cid = rt.controller_of(inner).unwrap();
    let side_cid = rt.controller_of(side).unwrap();
    assert_eq!(rt.controller_parent(inner_cid).unwrap(), Some(outer_cid));

    rt.with_controller_mut(inner_cid, |c: &mut EmptyController| {
        c.core_mut().set_config("parent", ConfigValue::Controller(side_cid))
    })
    .unwrap()
    .unwrap();
    assert_eq!(rt.controller_parent(inner_cid).unwrap(), Some(side_cid));
    assert_eq!(rt.controller_chain(inner).unwrap(), vec![inner_cid, side_cid]);
    let scope = rt
        .with_controller(inner_cid, |c: &EmptyController| c.core().parent_handler_scope("onSave"))
        .unwrap()
        .unwrap();
    assert_eq!(scope, Some(side_cid));

    // A dead explicit parent falls back to the ancestry.
    rt.destroy(side).unwrap();
    assert_eq!(rt.controller_parent(inner_cid).unwrap(), Some(outer_cid));
}
