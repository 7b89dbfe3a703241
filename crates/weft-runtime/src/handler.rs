#![forbid(unsafe_code)]

//! Handler capabilities and listener declarations.
//!
//! A *scope* is anything that can own handlers: a component or a
//! controller. Instead of probing objects for methods by name, a scope
//! states which handler names it defines through [`HandlerScope`], usually
//! by delegating to a static [`HandlerTable`] of plain function pointers.
//!
//! Listeners are declared as ordered [`ListenerSpec`]s. A spec names its
//! handler (resolved later along the controller chain) or carries a
//! callback directly, and may pin the handler to an explicit scope or carry
//! a delegation selector.

use crate::runtime::Runtime;
use ahash::AHashMap;
use std::fmt;
use std::rc::Rc;
use weft_core::{ComponentId, ControllerId, DomEvent, Error, PathNode, Result, Selector};

/// Context handed to every handler invocation.
pub struct HandlerContext<'a> {
    runtime: &'a Runtime,
    /// Component whose listener fired.
    declaring: ComponentId,
    /// The part of the event path the handler is meant to see.
    matched: &'a [PathNode],
}

impl<'a> HandlerContext<'a> {
    pub(crate) fn new(runtime: &'a Runtime, declaring: ComponentId, matched: &'a [PathNode]) -> Self {
        Self {
            runtime,
            declaring,
            matched,
        }
    }

    #[must_use]
    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    /// Component that declared the listener.
    #[must_use]
    pub fn component(&self) -> ComponentId {
        self.declaring
    }

    /// Path from the delegate-matched node outwards to the declaring
    /// component's root. The whole in-component path when undelegated.
    #[must_use]
    pub fn matched_path(&self) -> &'a [PathNode] {
        self.matched
    }

    /// The node the delegation selector matched.
    #[must_use]
    pub fn matched_node(&self) -> Option<&'a PathNode> {
        self.matched.first()
    }
}

impl fmt::Debug for HandlerContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContext")
            .field("declaring", &self.declaring)
            .field("matched", &self.matched.len())
            .finish()
    }
}

/// Handler stored in a [`HandlerTable`].
pub type HandlerFn<T> = fn(&mut T, &mut HandlerContext<'_>, &DomEvent) -> Result<()>;

/// Closure handler carried by a listener declaration.
pub type Callback = Rc<dyn Fn(&mut HandlerContext<'_>, &DomEvent) -> Result<()>>;

/// Typed capability: which handler names a scope defines.
pub trait HandlerScope {
    /// True if this scope defines `handler`.
    fn defines(&self, _handler: &str) -> bool {
        false
    }

    /// Run `handler`.
    fn invoke(&mut self, handler: &str, _cx: &mut HandlerContext<'_>, _event: &DomEvent) -> Result<()> {
        Err(Error::UnknownHandler(handler.to_owned()))
    }
}

/// Static name to function table for one scope type.
pub struct HandlerTable<T> {
    entries: AHashMap<&'static str, HandlerFn<T>>,
}

impl<T> HandlerTable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, name: &'static str, handler: HandlerFn<T>) -> Self {
        self.entries.insert(name, handler);
        self
    }

    #[must_use]
    pub fn defines(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Run `name` on `target`.
    pub fn invoke(
        &self,
        target: &mut T,
        name: &str,
        cx: &mut HandlerContext<'_>,
        event: &DomEvent,
    ) -> Result<()> {
        let handler = self
            .entries
            .get(name)
            .ok_or_else(|| Error::UnknownHandler(name.to_owned()))?;
        handler(target, cx, event)
    }
}

impl<T> Default for HandlerTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for HandlerTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort_unstable();
        f.debug_struct("HandlerTable").field("names", &names).finish()
    }
}

// ---------------------------------------------------------------------------
// Listener declarations
// ---------------------------------------------------------------------------

/// How a listener names its handler.
#[derive(Clone)]
pub enum HandlerRef {
    /// Resolved along the controller chain, or in the explicit scope.
    Name(String),
    Callback(Callback),
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Explicit handler scope for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerScope {
    /// The declaring component itself.
    Own,
    Component(ComponentId),
    Controller(ControllerId),
}

/// One listener declaration.
#[derive(Debug, Clone)]
pub struct ListenerSpec {
    pub event: String,
    pub handler: HandlerRef,
    pub scope: Option<ListenerScope>,
    pub delegate: Option<Selector>,
}

impl ListenerSpec {
    /// Listener whose handler is found by name.
    pub fn named(event: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            handler: HandlerRef::Name(handler.into()),
            scope: None,
            delegate: None,
        }
    }

    /// Listener running `callback` directly.
    pub fn callback(
        event: impl Into<String>,
        callback: impl Fn(&mut HandlerContext<'_>, &DomEvent) -> Result<()> + 'static,
    ) -> Self {
        Self {
            event: event.into(),
            handler: HandlerRef::Callback(Rc::new(callback)),
            scope: None,
            delegate: None,
        }
    }

    #[must_use]
    pub fn scope(mut self, scope: ListenerScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Only run when a node on the event path matches `selector`.
    pub fn delegate(mut self, selector: &str) -> Result<Self> {
        self.delegate = Some(Selector::parse(selector)?);
        Ok(self)
    }

    /// Handler name, if the listener names one.
    #[must_use]
    pub fn handler_name(&self) -> Option<&str> {
        match &self.handler {
            HandlerRef::Name(name) => Some(name),
            HandlerRef::Callback(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        hits: u32,
    }

    fn bump(c: &mut Counter, _: &mut HandlerContext<'_>, _: &DomEvent) -> Result<()> {
        c.hits += 1;
        Ok(())
    }

    #[test]
    fn table_reports_capabilities() {
        let table = HandlerTable::<Counter>::new().with("onBump", bump);
        assert!(table.defines("onBump"));
        assert!(!table.defines("onOther"));
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["onBump"]);
    }

    #[test]
    fn delegate_parses_selector() {
        let spec = ListenerSpec::named("click", "onClick")
            .delegate(".event")
            .unwrap();
        assert!(spec.delegate.is_some());
        assert_eq!(spec.handler_name(), Some("onClick"));
        assert!(ListenerSpec::named("click", "x").delegate("a b").is_err());
    }
}
