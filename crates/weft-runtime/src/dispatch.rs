#![forbid(unsafe_code)]

//! Event dispatch.
//!
//! # Design
//!
//! An input event carries its propagation path, target first. Dispatch
//! walks the components on that path innermost first; for each, it runs
//! the component's DOM listeners for the event name in declaration order.
//! A listener with a delegation selector runs only when a node of the
//! component's part of the path matches, and its handler sees the path
//! from that node outwards.
//!
//! Application events (fired by a component, no path) run the source
//! component's plain listeners.
//!
//! Bindings are resolved on first delivery, not at declaration, so a
//! controller attached after its view's listeners were declared still
//! receives them.
//!
//! # Invariants
//!
//! 1. Dispatch is not reentrant. An event dispatched from inside a handler
//!    is queued and delivered after the current one, in order.
//! 2. A handler error never stops delivery to the remaining listeners.
//!    Errors are collected in the [`DispatchReport`].
//! 3. An unresolvable handler leaves its listener inert; with
//!    `strict_handlers` the dispatch fails instead.
//!
//! # Failure Modes
//!
//! | failure                    | best-effort                 | strict            |
//! |----------------------------|-----------------------------|-------------------|
//! | handler not found          | warn once, listener inert   | `Err` from dispatch |
//! | handler returns an error   | warn, collected in report   | same              |
//! | queue limit reached        | `Err(EventQueueFull)`       | same              |

use crate::handler::{HandlerContext, HandlerRef, HandlerScope, ListenerScope, ListenerSpec};
use crate::registry::ListenerKind;
use crate::resolver::{BindingState, BoundHandler, Resolution, search_chain};
use crate::runtime::{Runtime, busy};
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use weft_core::{
    ComponentId, DomEvent, Error, EventData, HandlerResolutionFailure, PathNode, Result, Selector,
};

static EVENTS_DISPATCHED_TOTAL: AtomicU64 = AtomicU64::new(0);
static HANDLER_ERRORS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Total events delivered, queued ones included (monotonic counter).
#[must_use]
pub fn events_dispatched_total() -> u64 {
    EVENTS_DISPATCHED_TOTAL.load(Ordering::Relaxed)
}

/// Total handler invocations that returned an error (monotonic counter).
#[must_use]
pub fn handler_errors_total() -> u64 {
    HANDLER_ERRORS_TOTAL.load(Ordering::Relaxed)
}

/// What a call to [`Runtime::dispatch`] did.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Handlers that ran, successfully or not.
    pub invoked: usize,
    /// Matching listeners skipped because their handler is unresolved.
    pub inert: usize,
    /// Events queued instead of delivered (nested dispatch).
    pub queued: usize,
    /// Errors returned by handlers.
    pub errors: Vec<Error>,
}

impl DispatchReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.inert == 0
    }
}

struct DispatchGuard<'a>(&'a Cell<bool>);

impl<'a> DispatchGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Runtime {
    /// Deliver `event`, then every event queued while delivering it.
    pub fn dispatch(&self, event: DomEvent) -> Result<DispatchReport> {
        if self.inner.dispatching.get() {
            return self.enqueue(event);
        }
        let _guard = DispatchGuard::enter(&self.inner.dispatching);
        let mut report = DispatchReport::default();
        let mut next = Some(event);
        while let Some(event) = next {
            if let Err(err) = self.deliver(&event, &mut report) {
                let dropped = self.inner.queue.borrow_mut().drain(..).count();
                if dropped > 0 {
                    tracing::warn!(target: "weft.dispatch", dropped, "dispatch failed, queued events dropped");
                }
                return Err(err);
            }
            next = self.inner.queue.borrow_mut().pop_front();
        }
        Ok(report)
    }

    /// Fire the application event `name` from `source`.
    pub fn fire(&self, source: ComponentId, name: &str, data: EventData) -> Result<DispatchReport> {
        self.ensure_alive(source, "fire")?;
        self.dispatch(DomEvent::app(name, source, data))
    }

    /// Events waiting behind the current dispatch.
    #[must_use]
    pub fn queued_events(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    fn enqueue(&self, event: DomEvent) -> Result<DispatchReport> {
        let mut queue = self.inner.queue.borrow_mut();
        let limit = self.inner.config.event_queue_limit;
        if queue.len() >= limit {
            tracing::warn!(target: "weft.dispatch", event = %event.name, limit, "event queue full");
            return Err(Error::EventQueueFull(limit));
        }
        tracing::trace!(target: "weft.dispatch", event = %event.name, depth = queue.len() + 1, "event queued");
        queue.push_back(event);
        Ok(DispatchReport {
            queued: 1,
            ..DispatchReport::default()
        })
    }

    fn deliver(&self, event: &DomEvent, report: &mut DispatchReport) -> Result<()> {
        let _span = tracing::debug_span!("weft.dispatch", event = %event.name).entered();
        EVENTS_DISPATCHED_TOTAL.fetch_add(1, Ordering::Relaxed);

        if event.path.is_empty() {
            let Some(source) = event.source else {
                return Ok(());
            };
            if !self.is_alive(source) {
                tracing::trace!(target: "weft.dispatch", component = %source, "source gone, event skipped");
                return Ok(());
            }
            return self.deliver_to(source, ListenerKind::Plain, event, &[], report);
        }

        for component in event.components() {
            if !self.is_alive(component) {
                continue;
            }
            let Some(end) = event
                .path
                .iter()
                .rposition(|n| n.component == Some(component))
            else {
                continue;
            };
            self.deliver_to(component, ListenerKind::Dom, event, &event.path[..=end], report)?;
        }
        Ok(())
    }

    fn deliver_to(
        &self,
        component: ComponentId,
        kind: ListenerKind,
        event: &DomEvent,
        scope: &[PathNode],
        report: &mut DispatchReport,
    ) -> Result<()> {
        let matching: Vec<(usize, Option<Selector>)> = {
            let reg = self.inner.registry.borrow();
            let Ok(entry) = reg.component(component, "dispatch") else {
                return Ok(());
            };
            entry
                .bindings(kind)
                .iter()
                .enumerate()
                .filter(|(_, b)| b.event() == event.name)
                .map(|(i, b)| (i, b.delegate().cloned()))
                .collect()
        };

        for (index, delegate) in matching {
            if !self.is_alive(component) {
                break;
            }
            let matched = match &delegate {
                Some(selector) => match selector.first_match(scope) {
                    Some(at) => &scope[at..],
                    None => continue,
                },
                None => scope,
            };
            let Some(handler) = self.ensure_bound(component, kind, index)? else {
                report.inert += 1;
                continue;
            };
            report.invoked += 1;
            if let Err(err) = self.invoke(&handler, component, matched, event) {
                HANDLER_ERRORS_TOTAL.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    target: "weft.handler",
                    component = %component,
                    event = %event.name,
                    handler = ?handler,
                    error = %err,
                    "handler failed"
                );
                report.errors.push(err);
            }
        }
        Ok(())
    }

    /// Bind listener `index` of `component` if it is still unbound.
    ///
    /// `Ok(None)` means the listener is inert (or no longer exists).
    pub(crate) fn ensure_bound(
        &self,
        component: ComponentId,
        kind: ListenerKind,
        index: usize,
    ) -> Result<Option<BoundHandler>> {
        let strict = self.inner.config.strict_handlers;
        let spec = {
            let mut reg = self.inner.registry.borrow_mut();
            let entry = reg.component_mut(component, "dispatch")?;
            let Some(binding) = entry.bindings_mut(kind).get_mut(index) else {
                return Ok(None);
            };
            match &binding.state {
                BindingState::Bound(handler) => return Ok(Some(handler.clone())),
                BindingState::Failed(failure) if strict => return Err(failure.clone().into()),
                BindingState::Failed(_) | BindingState::Resolving => return Ok(None),
                BindingState::Unbound => {}
            }
            binding.state = BindingState::Resolving;
            binding.spec.clone()
        };

        let resolution = match self.resolve(component, &spec) {
            Ok(resolution) => resolution,
            Err(err) => {
                self.set_binding_state(component, kind, index, BindingState::Unbound);
                return Err(err);
            }
        };

        let (state, out) = match resolution {
            Resolution::Resolved(handler) => {
                tracing::debug!(
                    target: "weft.handler",
                    component = %component,
                    event = %spec.event,
                    bound = ?handler,
                    "listener bound"
                );
                (BindingState::Bound(handler.clone()), Ok(Some(handler)))
            }
            Resolution::Unresolved(failure) => {
                if self.inner.config.log_inert_listeners {
                    tracing::warn!(
                        target: "weft.handler",
                        component = %component,
                        event = %failure.event,
                        handler = %failure.handler,
                        "handler not found, listener left inert"
                    );
                }
                let out = if strict {
                    Err(failure.clone().into())
                } else {
                    Ok(None)
                };
                (BindingState::Failed(failure), out)
            }
        };
        self.set_binding_state(component, kind, index, state);
        out
    }

    fn set_binding_state(&self, component: ComponentId, kind: ListenerKind, index: usize, state: BindingState) {
        let mut reg = self.inner.registry.borrow_mut();
        if let Ok(entry) = reg.component_mut(component, "dispatch")
            && let Some(binding) = entry.bindings_mut(kind).get_mut(index)
        {
            binding.state = state;
        }
    }

    /// Find the scope that owns `spec`'s handler.
    fn resolve(&self, component: ComponentId, spec: &ListenerSpec) -> Result<Resolution> {
        let handler = match &spec.handler {
            HandlerRef::Callback(callback) => {
                return Ok(Resolution::Resolved(BoundHandler::Callback(callback.clone())));
            }
            HandlerRef::Name(name) => name.as_str(),
        };
        let unresolved = || {
            Resolution::Unresolved(HandlerResolutionFailure {
                component,
                event: spec.event.clone(),
                handler: handler.to_owned(),
            })
        };

        match spec.scope {
            Some(scope @ (ListenerScope::Own | ListenerScope::Component(_))) => {
                let target = match scope {
                    ListenerScope::Component(target) => target,
                    _ => component,
                };
                Ok(if self.component_defines(target, handler)? {
                    Resolution::Resolved(BoundHandler::Component {
                        id: target,
                        handler: handler.to_owned(),
                    })
                } else {
                    unresolved()
                })
            }
            Some(ListenerScope::Controller(cid)) => {
                let defines = self.controller_is_alive(cid) && self.controller_defines(cid, handler)?;
                Ok(if defines {
                    Resolution::Resolved(BoundHandler::Controller {
                        id: cid,
                        handler: handler.to_owned(),
                    })
                } else {
                    unresolved()
                })
            }
            None => {
                if let Some(cached) = self.inner.resolver.borrow().cached(component, handler) {
                    return Ok(cached);
                }
                let chain = self.controller_chain(component)?;
                let found = search_chain(chain, |cid| self.controller_defines(cid, handler))?;
                let resolution = match found {
                    Some(id) => Resolution::Resolved(BoundHandler::Controller {
                        id,
                        handler: handler.to_owned(),
                    }),
                    None => unresolved(),
                };
                self.inner
                    .resolver
                    .borrow_mut()
                    .store(component, handler, resolution.clone());
                Ok(resolution)
            }
        }
    }

    fn invoke(
        &self,
        handler: &BoundHandler,
        declaring: ComponentId,
        matched: &[PathNode],
        event: &DomEvent,
    ) -> Result<()> {
        let mut cx = HandlerContext::new(self, declaring, matched);
        match handler {
            BoundHandler::Controller { id, handler } => {
                let cell = self.controller_cell(*id)?;
                let mut controller = cell.try_borrow_mut().map_err(|_| busy(id, handler))?;
                controller.invoke(handler, &mut cx, event)
            }
            BoundHandler::Component { id, handler } => {
                let cell = self.component_cell(*id, handler)?;
                let mut component = cell.try_borrow_mut().map_err(|_| busy(id, handler))?;
                component.invoke(handler, &mut cx, event)
            }
            BoundHandler::Callback(callback) => (callback.as_ref())(&mut cx, event),
        }
    }
}
