#![forbid(unsafe_code)]

//! Handler resolution along the controller chain.
//!
//! # Design
//!
//! A listener that names its handler without an explicit scope is bound
//! to the first controller in its component's chain that defines the name:
//!
//! 1. the component's own controller;
//! 2. then each controller reached through `parent`, which defaults to the
//!    nearest controller of an ancestor component.
//!
//! The search itself is [`search_chain`], a pure ordered walk over
//! capability checks that yields [`Resolution::Resolved`] or
//! [`Resolution::Unresolved`]. [`HandlerResolver`] memoizes results per
//! `(component, handler)` pair.
//!
//! Each declared listener becomes an [`EventBinding`] whose state moves
//!
//! ```text
//! unbound -> resolving -> bound | failed
//! ```
//!
//! exactly once. A failed binding stays inert until the component's
//! listeners are replaced wholesale.

use crate::handler::{Callback, ListenerSpec};
use ahash::AHashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use weft_core::{ComponentId, ControllerId, HandlerResolutionFailure, Result, Selector};

static RESOLUTIONS_TOTAL: AtomicU64 = AtomicU64::new(0);
static RESOLUTION_FAILURES_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Total handler resolutions performed, cache misses only (monotonic counter).
#[must_use]
pub fn resolutions_total() -> u64 {
    RESOLUTIONS_TOTAL.load(Ordering::Relaxed)
}

/// Total resolutions that left a listener inert (monotonic counter).
#[must_use]
pub fn resolution_failures_total() -> u64 {
    RESOLUTION_FAILURES_TOTAL.load(Ordering::Relaxed)
}

/// A handler fixed to a concrete scope.
#[derive(Clone)]
pub enum BoundHandler {
    Component { id: ComponentId, handler: String },
    Controller { id: ControllerId, handler: String },
    Callback(Callback),
}

impl fmt::Debug for BoundHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component { id, handler } => write!(f, "{id}::{handler}"),
            Self::Controller { id, handler } => write!(f, "{id}::{handler}"),
            Self::Callback(_) => f.write_str("<callback>"),
        }
    }
}

impl PartialEq for BoundHandler {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Component { id: a, handler: x },
                Self::Component { id: b, handler: y },
            ) => a == b && x == y,
            (
                Self::Controller { id: a, handler: x },
                Self::Controller { id: b, handler: y },
            ) => a == b && x == y,
            (Self::Callback(a), Self::Callback(b)) => std::rc::Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Outcome of a chain search.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(BoundHandler),
    Unresolved(HandlerResolutionFailure),
}

/// Walk `chain` in order and return the first controller for which
/// `defines` holds.
pub fn search_chain(
    chain: impl IntoIterator<Item = ControllerId>,
    mut defines: impl FnMut(ControllerId) -> Result<bool>,
) -> Result<Option<ControllerId>> {
    for candidate in chain {
        if defines(candidate)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Memo of chain-search results per `(component, handler)`.
#[derive(Debug, Default)]
pub struct HandlerResolver {
    cache: AHashMap<(ComponentId, String), Resolution>,
}

impl HandlerResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn cached(&self, component: ComponentId, handler: &str) -> Option<Resolution> {
        self.cache.get(&(component, handler.to_owned())).cloned()
    }

    pub fn store(&mut self, component: ComponentId, handler: &str, resolution: Resolution) {
        RESOLUTIONS_TOTAL.fetch_add(1, Ordering::Relaxed);
        if matches!(resolution, Resolution::Unresolved(_)) {
            RESOLUTION_FAILURES_TOTAL.fetch_add(1, Ordering::Relaxed);
        }
        self.cache.insert((component, handler.to_owned()), resolution);
    }

    /// Drop every entry for `component`.
    pub fn forget(&mut self, component: ComponentId) {
        self.cache.retain(|(c, _), _| *c != component);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// Where a binding is in its life.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingState {
    Unbound,
    Resolving,
    Bound(BoundHandler),
    Failed(HandlerResolutionFailure),
}

impl BindingState {
    #[must_use]
    pub fn status(&self) -> BindingStatus {
        match self {
            Self::Unbound => BindingStatus::Unbound,
            Self::Resolving => BindingStatus::Resolving,
            Self::Bound(_) => BindingStatus::Bound,
            Self::Failed(_) => BindingStatus::Failed,
        }
    }
}

/// Payload-free view of [`BindingState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStatus {
    Unbound,
    Resolving,
    Bound,
    Failed,
}

/// A declared listener plus its resolution state.
#[derive(Debug, Clone)]
pub struct EventBinding {
    pub spec: ListenerSpec,
    pub state: BindingState,
}

impl EventBinding {
    #[must_use]
    pub fn new(spec: ListenerSpec) -> Self {
        Self {
            spec,
            state: BindingState::Unbound,
        }
    }

    #[must_use]
    pub fn event(&self) -> &str {
        &self.spec.event
    }

    #[must_use]
    pub fn delegate(&self) -> Option<&Selector> {
        self.spec.delegate.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctl(n: u64) -> ControllerId {
        ControllerId::from_raw(n)
    }

    #[test]
    fn nearest_definer_wins() {
        let chain = [ctl(1), ctl(2), ctl(3)];
        let found = search_chain(chain, |c| Ok(c != ctl(1))).unwrap();
        assert_eq!(found, Some(ctl(2)));
    }

    #[test]
    fn empty_chain_is_unresolved() {
        let found = search_chain(Vec::new(), |_| Ok(true)).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn capability_errors_propagate() {
        let err = search_chain([ctl(1)], |_| Err(weft_core::Error::RuntimeGone)).unwrap_err();
        assert_eq!(err, weft_core::Error::RuntimeGone);
    }

    #[test]
    fn cache_is_per_component() {
        let mut r = HandlerResolver::new();
        let a = ComponentId::from_raw(1);
        let b = ComponentId::from_raw(2);
        let bound = Resolution::Resolved(BoundHandler::Controller {
            id: ctl(5),
            handler: "onClick".into(),
        });
        r.store(a, "onClick", bound.clone());
        r.store(b, "onClick", bound.clone());
        assert_eq!(r.cached(a, "onClick"), Some(bound));
        r.forget(a);
        assert!(r.cached(a, "onClick").is_none());
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn binding_starts_unbound() {
        let b = EventBinding::new(ListenerSpec::named("click", "onClick"));
        assert_eq!(b.state.status(), BindingStatus::Unbound);
        assert_eq!(b.event(), "click");
    }
}
