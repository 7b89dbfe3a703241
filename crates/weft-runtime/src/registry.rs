#![forbid(unsafe_code)]

//! Instance registry.
//!
//! Components and controllers live here, behind `Rc<RefCell<..>>`, keyed by
//! id. Everything else (parents, controllers, the scheduler, handler
//! bindings) refers to instances by id and looks them up on use, so a
//! destroyed instance is simply absent. Destroyed component ids are kept as
//! tombstones to tell "destroyed" apart from "never existed".
//!
//! The registry is only ever borrowed for short, non-reentrant stretches:
//! callers clone the cell they need and drop the borrow before running
//! component or controller code.

use crate::component::Component;
use crate::controller::Controller;
use crate::lifecycle::Lifecycle;
use crate::resolver::EventBinding;
use ahash::{AHashMap, AHashSet};
use futures::channel::oneshot;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use weft_core::{ComponentId, ControllerId, DestroyedInstanceError, Error, Result};

/// Which listener list a binding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Delegated listeners for input events.
    Dom,
    /// Listeners for application events fired by the component.
    Plain,
}

pub(crate) struct ComponentEntry {
    pub(crate) cell: Rc<RefCell<dyn Component>>,
    pub(crate) type_name: &'static str,
    pub(crate) lifecycle: Rc<Cell<Lifecycle>>,
    pub(crate) parent: Option<ComponentId>,
    pub(crate) children: Vec<ComponentId>,
    pub(crate) owned: Vec<ComponentId>,
    pub(crate) reference: Option<String>,
    pub(crate) controller: Option<ControllerId>,
    pub(crate) pending_controller: Option<ControllerId>,
    pub(crate) dom_bindings: Vec<EventBinding>,
    pub(crate) bindings: Vec<EventBinding>,
    pub(crate) constructed_waiters: Vec<oneshot::Sender<()>>,
}

impl ComponentEntry {
    pub(crate) fn bindings(&self, kind: ListenerKind) -> &[EventBinding] {
        match kind {
            ListenerKind::Dom => &self.dom_bindings,
            ListenerKind::Plain => &self.bindings,
        }
    }

    pub(crate) fn bindings_mut(&mut self, kind: ListenerKind) -> &mut Vec<EventBinding> {
        match kind {
            ListenerKind::Dom => &mut self.dom_bindings,
            ListenerKind::Plain => &mut self.bindings,
        }
    }
}

pub(crate) struct ControllerEntry {
    pub(crate) cell: Rc<RefCell<dyn Controller>>,
    pub(crate) view: ComponentId,
}

#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) components: AHashMap<ComponentId, ComponentEntry>,
    pub(crate) controllers: AHashMap<ControllerId, ControllerEntry>,
    pub(crate) destroyed: AHashSet<ComponentId>,
}

impl Registry {
    pub(crate) fn component(&self, id: ComponentId, operation: &str) -> Result<&ComponentEntry> {
        if self.destroyed.contains(&id) {
            return Err(DestroyedInstanceError::new(id, operation).into());
        }
        self.components
            .get(&id)
            .ok_or_else(|| Error::UnknownInstance(id.to_string()))
    }

    pub(crate) fn component_mut(
        &mut self,
        id: ComponentId,
        operation: &str,
    ) -> Result<&mut ComponentEntry> {
        if self.destroyed.contains(&id) {
            return Err(DestroyedInstanceError::new(id, operation).into());
        }
        self.components
            .get_mut(&id)
            .ok_or_else(|| Error::UnknownInstance(id.to_string()))
    }

    pub(crate) fn controller(&self, id: ControllerId) -> Result<&ControllerEntry> {
        self.controllers
            .get(&id)
            .ok_or_else(|| crate::controller::unknown_controller(id))
    }

    /// `id` and its ancestors, nearest first.
    pub(crate) fn lineage(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let Some(entry) = self.components.get(&c) else {
                break;
            };
            if out.contains(&c) {
                break;
            }
            out.push(c);
            current = entry.parent;
        }
        out
    }

    /// Descendants of `root` in depth-first pre-order, `root` excluded.
    pub(crate) fn descendants(&self, root: ComponentId) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut stack: Vec<ComponentId> = self
            .components
            .get(&root)
            .map(|e| e.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            if let Some(entry) = self.components.get(&id) {
                out.push(id);
                stack.extend(entry.children.iter().rev().copied());
            }
        }
        out
    }
}
