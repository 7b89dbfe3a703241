#![forbid(unsafe_code)]

//! Components: nodes of the component tree.
//!
//! A concrete component is a plain struct that embeds a [`ComponentCore`]
//! and a [`ConfigStore`](weft_core::ConfigStore) over itself, implements
//! [`Component`] and [`Configurable`](weft_core::Configurable), and is
//! handed to [`Runtime::create`]. The runtime owns it from then on; code
//! reaches it by id through [`Runtime::with_component_mut`].
//!
//! # Invariants
//!
//! 1. The root node of the component's tree is fixed once construction
//!    ends. Later changes go through [`VirtualTree`] mutations.
//! 2. Tree mutations never schedule a commit. The component calls
//!    [`ComponentCore::request_update`] when it wants one.
//! 3. After destroy every mutating entry point fails with
//!    [`DestroyedInstanceError`](weft_core::DestroyedInstanceError).

use crate::controller::{Controller, ControllerCore};
use crate::handler::{HandlerScope, ListenerSpec};
use crate::lifecycle::Lifecycle;
use crate::runtime::{Runtime, RuntimeHandle};
use crate::scheduler::UpdateFuture;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use weft_core::{
    ComponentId, ConfigValue, DestroyedInstanceError, Error, EventData, Result,
};
use weft_render::{VNode, VirtualTree};

/// Downcasting support for trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A node of the component tree.
pub trait Component: HandlerScope + AsAny {
    fn core(&self) -> &ComponentCore;
    fn core_mut(&mut self) -> &mut ComponentCore;

    /// Drop every config value. Called once, during destroy.
    fn clear_config(&mut self);

    /// DOM listeners every instance of this type declares, ahead of the
    /// ones passed at creation.
    fn default_dom_listeners(&self) -> Vec<ListenerSpec> {
        Vec::new()
    }

    /// Plain-event listeners every instance of this type declares.
    fn default_listeners(&self) -> Vec<ListenerSpec> {
        Vec::new()
    }

    /// Runs once, after the initial config has been applied and the
    /// instance is registered. Sub-instances are usually created here.
    fn on_constructed(&mut self, _rt: &Runtime) -> Result<()> {
        Ok(())
    }

    /// Runs on every transition to mounted. `first` is true only once.
    fn on_mounted(&mut self, _rt: &Runtime, _first: bool) -> Result<()> {
        Ok(())
    }

    fn on_unmounted(&mut self, _rt: &Runtime) -> Result<()> {
        Ok(())
    }

    /// Runs at the start of destroy, before children are released.
    fn on_destroy(&mut self, _rt: &Runtime) {}
}

/// State shared by every component.
pub struct ComponentCore {
    id: ComponentId,
    parent: Option<ComponentId>,
    reference: Option<String>,
    lifecycle: Rc<Cell<Lifecycle>>,
    first_mount_done: bool,
    tree: VirtualTree,
    runtime: RuntimeHandle,
}

impl ComponentCore {
    pub(crate) fn new(
        id: ComponentId,
        parent: Option<ComponentId>,
        reference: Option<String>,
        lifecycle: Rc<Cell<Lifecycle>>,
        runtime: RuntimeHandle,
    ) -> Result<Self> {
        Ok(Self {
            id,
            parent,
            reference,
            lifecycle,
            first_mount_done: false,
            tree: VirtualTree::new(VNode::new("div").id(id.to_string()))?,
            runtime,
        })
    }

    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    #[must_use]
    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.lifecycle.get().is_mounted()
    }

    /// True once the first mount has run its side effects.
    #[must_use]
    pub fn first_mount_done(&self) -> bool {
        self.first_mount_done
    }

    pub(crate) fn mark_mounted(&mut self) -> bool {
        let first = !self.first_mount_done;
        self.first_mount_done = true;
        first
    }

    /// Fail with [`DestroyedInstanceError`] after destroy.
    pub fn ensure_alive(&self, operation: &str) -> Result<()> {
        if self.lifecycle.get().is_destroyed() {
            return Err(DestroyedInstanceError::new(self.id, operation).into());
        }
        Ok(())
    }

    /// Install the root node. Only allowed while constructing.
    pub fn set_root(&mut self, root: VNode) -> Result<()> {
        let state = self.lifecycle.get();
        if state != Lifecycle::Constructing {
            return Err(Error::Lifecycle {
                instance: self.id.to_string(),
                from: state.as_str(),
                to: "set_root",
            });
        }
        self.tree = VirtualTree::new(root)?;
        Ok(())
    }

    #[must_use]
    pub fn tree(&self) -> &VirtualTree {
        &self.tree
    }

    /// Mutable tree access; fails after destroy.
    pub fn tree_mut(&mut self) -> Result<&mut VirtualTree> {
        self.ensure_alive("tree_mut")?;
        Ok(&mut self.tree)
    }

    pub(crate) fn tree_for_checkpoint(&mut self) -> &mut VirtualTree {
        &mut self.tree
    }

    /// Renderer-facing id of a node owned by this component.
    #[must_use]
    pub fn node_id(&self, suffix: &str) -> String {
        format!("{}__{suffix}", self.id)
    }

    pub fn runtime(&self) -> Result<Runtime> {
        self.runtime.upgrade()
    }

    #[must_use]
    pub fn handle(&self) -> RuntimeHandle {
        self.runtime.clone()
    }

    /// Schedule a commit of the current tree ("touch" the instance).
    pub fn request_update(&self) -> Result<UpdateFuture> {
        self.ensure_alive("request_update")?;
        self.runtime.upgrade()?.request_update(self.id)
    }

    /// Fire a plain application event from this component.
    pub fn fire(&self, name: &str, data: EventData) -> Result<()> {
        self.ensure_alive("fire")?;
        self.runtime.upgrade()?.fire(self.id, name, data).map(drop)
    }
}

impl std::fmt::Debug for ComponentCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentCore")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("lifecycle", &self.lifecycle.get())
            .field("tree", &self.tree)
            .finish()
    }
}

pub(crate) type ControllerFactory =
    Box<dyn FnOnce(ControllerCore) -> Rc<RefCell<dyn Controller>>>;

/// Creation options for [`Runtime::create`].
#[derive(Default)]
pub struct CreateOptions {
    pub(crate) parent: Option<ComponentId>,
    pub(crate) reference: Option<String>,
    pub(crate) config: Vec<(String, ConfigValue)>,
    pub(crate) dom_listeners: Vec<ListenerSpec>,
    pub(crate) listeners: Vec<ListenerSpec>,
    pub(crate) controller: Option<ControllerFactory>,
}

impl CreateOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn parent(mut self, parent: ComponentId) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn reference(mut self, name: impl Into<String>) -> Self {
        self.reference = Some(name.into());
        self
    }

    /// Initial value for a declared property, overriding its default.
    #[must_use]
    pub fn config(mut self, name: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.config.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn dom_listener(mut self, spec: ListenerSpec) -> Self {
        self.dom_listeners.push(spec);
        self
    }

    #[must_use]
    pub fn listener(mut self, spec: ListenerSpec) -> Self {
        self.listeners.push(spec);
        self
    }

    /// Attach a controller built from its core once the view is constructed.
    #[must_use]
    pub fn controller<C, F>(mut self, build: F) -> Self
    where
        C: Controller + 'static,
        F: FnOnce(ControllerCore) -> C + 'static,
    {
        self.controller = Some(Box::new(move |core| {
            let controller: Rc<RefCell<dyn Controller>> = Rc::new(RefCell::new(build(core)));
            controller
        }));
        self
    }
}

impl std::fmt::Debug for CreateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateOptions")
            .field("parent", &self.parent)
            .field("reference", &self.reference)
            .field("config", &self.config)
            .field("dom_listeners", &self.dom_listeners.len())
            .field("listeners", &self.listeners.len())
            .field("controller", &self.controller.is_some())
            .finish()
    }
}
