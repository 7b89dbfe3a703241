#![forbid(unsafe_code)]

//! The runtime: instance registry, lifecycle driver and service hub.
//!
//! # Design
//!
//! [`Runtime`] is a cheap `Rc` handle. Components and controllers hold a
//! [`RuntimeHandle`] (a `Weak`) so the registry never forms a cycle with
//! the instances it owns.
//!
//! Creation runs in a fixed order:
//!
//! 1. allocate the id and register the instance as `constructing`;
//! 2. apply declared defaults overridden by the creation config;
//! 3. build the controller, if any, and hold it as pending;
//! 4. run `on_constructed` (sub-instances are created here);
//! 5. mark `constructed`, wire the pending controller, notify waiters;
//! 6. register the instance's reference with the nearest controller above.
//!
//! # Invariants
//!
//! 1. The registry borrow is never held while component or controller code
//!    runs. Instances are cloned out of the registry first.
//! 2. A controller is wired only after its view is constructed.
//! 3. After `destroy` the id is tombstoned; every entry point taking it
//!    fails with [`DestroyedInstanceError`].
//!
//! # Failure Modes
//!
//! - **Instance already borrowed** (e.g. destroying a component from its
//!   own handler): [`Error::Busy`].
//! - **Construction fails**: the half-built instance is destroyed and the
//!   error returned.

use crate::component::{AsAny, Component, ComponentCore, ControllerFactory, CreateOptions};
use crate::config::RuntimeConfig;
use crate::controller::{Controller, ControllerCore};
use crate::executor::{Executor, Task};
use crate::handler::{HandlerScope, ListenerSpec};
use crate::lifecycle::Lifecycle;
use crate::registry::{ComponentEntry, ControllerEntry, ListenerKind, Registry};
use crate::resolver::{BindingStatus, EventBinding, HandlerResolver};
use crate::scheduler::{PatchScheduler, PatchSource, Phase, UpdateFuture};
use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};
use weft_core::config::{self, Configurable};
use weft_core::{
    ComponentId, ControllerId, DestroyedInstanceError, DomEvent, Error, IdAllocator, Result,
};
use weft_render::{Axis, HeadlessRenderer, Measurement, PatchBatch, Renderer};

pub(crate) struct RuntimeInner {
    pub(crate) config: RuntimeConfig,
    ids: IdAllocator,
    executor: Executor,
    renderer: Rc<dyn Renderer>,
    scheduler: PatchScheduler,
    pub(crate) registry: RefCell<Registry>,
    pub(crate) resolver: RefCell<HandlerResolver>,
    pub(crate) queue: RefCell<VecDeque<DomEvent>>,
    pub(crate) dispatching: Cell<bool>,
}

impl PatchSource for RuntimeInner {
    fn checkpoint(&self, instance: ComponentId, sequence: u64) -> Result<PatchBatch> {
        let cell = self.registry.borrow().component(instance, "checkpoint")?.cell.clone();
        let mut component = cell
            .try_borrow_mut()
            .map_err(|_| busy(instance, "checkpoint"))?;
        Ok(PatchBatch::checkpoint(
            instance,
            sequence,
            component.core_mut().tree_for_checkpoint(),
        ))
    }
}

/// Owner of every component and controller.
#[derive(Clone)]
pub struct Runtime {
    pub(crate) inner: Rc<RuntimeInner>,
}

/// Non-owning reference to a [`Runtime`].
#[derive(Clone)]
pub struct RuntimeHandle {
    inner: Weak<RuntimeInner>,
}

impl RuntimeHandle {
    /// Fails with [`Error::RuntimeGone`] once the runtime is dropped.
    pub fn upgrade(&self) -> Result<Runtime> {
        self.try_upgrade().ok_or(Error::RuntimeGone)
    }

    #[must_use]
    pub fn try_upgrade(&self) -> Option<Runtime> {
        self.inner.upgrade().map(|inner| Runtime { inner })
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

pub(crate) fn busy(instance: impl fmt::Display, operation: &str) -> Error {
    Error::Busy {
        instance: instance.to_string(),
        operation: operation.to_owned(),
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

impl Runtime {
    /// A runtime committing to `renderer` with default settings.
    pub fn new(renderer: Rc<dyn Renderer>) -> Self {
        Self::with_config(renderer, RuntimeConfig::default())
    }

    pub fn with_config(renderer: Rc<dyn Renderer>, config: RuntimeConfig) -> Self {
        let executor = Executor::new();
        let inner = Rc::new_cyclic(|weak: &Weak<RuntimeInner>| {
            let source: Weak<dyn PatchSource> = weak.clone();
            let scheduler = PatchScheduler::new(
                executor.spawner(),
                source,
                Rc::clone(&renderer),
                config.slow_commit_ms,
            );
            RuntimeInner {
                config,
                ids: IdAllocator::new(),
                executor,
                renderer,
                scheduler,
                registry: RefCell::new(Registry::default()),
                resolver: RefCell::new(HandlerResolver::new()),
                queue: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
            }
        });
        tracing::debug!(target: "weft.lifecycle", config = ?inner.config, "runtime started");
        Self { inner }
    }

    /// A runtime over a fresh [`HeadlessRenderer`], which is returned too.
    #[must_use]
    pub fn headless(config: RuntimeConfig) -> (Self, HeadlessRenderer) {
        let renderer = HeadlessRenderer::new();
        let rt = Self::with_config(Rc::new(renderer.clone()), config);
        (rt, renderer)
    }

    #[must_use]
    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn executor(&self) -> &Executor {
        &self.inner.executor
    }

    #[must_use]
    pub fn renderer(&self) -> Rc<dyn Renderer> {
        Rc::clone(&self.inner.renderer)
    }

    #[must_use]
    pub fn scheduler(&self) -> &PatchScheduler {
        &self.inner.scheduler
    }

    // -----------------------------------------------------------------------
    // Executor and renderer passthroughs
    // -----------------------------------------------------------------------

    pub fn spawn<R: 'static>(&self, future: impl Future<Output = R> + 'static) -> Result<Task<R>> {
        self.inner.executor.spawn(future)
    }

    /// Give the executor a turn: run every task that can make progress.
    pub fn run_until_stalled(&self) -> Result<()> {
        self.inner.executor.run_until_stalled()
    }

    pub fn run_until<F: Future>(&self, future: F) -> Result<F::Output> {
        self.inner.executor.run_until(future)
    }

    /// Measure a rendered node.
    pub fn measure(&self, node_id: &str) -> LocalBoxFuture<'static, Result<Measurement>> {
        self.inner
            .renderer
            .measure(node_id)
            .map(|r| r.map_err(Error::from))
            .boxed_local()
    }

    /// Scroll a rendered node.
    pub fn scroll_by(
        &self,
        node_id: &str,
        axis: Axis,
        amount: f64,
    ) -> LocalBoxFuture<'static, Result<()>> {
        self.inner
            .renderer
            .scroll_by(node_id, axis, amount)
            .map(|r| r.map_err(Error::from))
            .boxed_local()
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub(crate) fn component_cell(
        &self,
        id: ComponentId,
        operation: &str,
    ) -> Result<Rc<RefCell<dyn Component>>> {
        Ok(self.inner.registry.borrow().component(id, operation)?.cell.clone())
    }

    pub(crate) fn controller_cell(&self, id: ControllerId) -> Result<Rc<RefCell<dyn Controller>>> {
        Ok(self.inner.registry.borrow().controller(id)?.cell.clone())
    }

    /// Fail unless `id` is registered and not destroyed.
    pub fn ensure_alive(&self, id: ComponentId, operation: &str) -> Result<()> {
        self.inner.registry.borrow().component(id, operation).map(drop)
    }

    #[must_use]
    pub fn is_alive(&self, id: ComponentId) -> bool {
        self.inner.registry.borrow().components.contains_key(&id)
    }

    #[must_use]
    pub fn is_destroyed(&self, id: ComponentId) -> bool {
        self.inner.registry.borrow().destroyed.contains(&id)
    }

    /// Lifecycle state; `Destroyed` for tombstoned ids, `None` if unknown.
    #[must_use]
    pub fn lifecycle(&self, id: ComponentId) -> Option<Lifecycle> {
        let reg = self.inner.registry.borrow();
        if reg.destroyed.contains(&id) {
            return Some(Lifecycle::Destroyed);
        }
        reg.components.get(&id).map(|e| e.lifecycle.get())
    }

    #[must_use]
    pub fn parent_of(&self, id: ComponentId) -> Option<ComponentId> {
        self.inner.registry.borrow().components.get(&id)?.parent
    }

    #[must_use]
    pub fn children_of(&self, id: ComponentId) -> Vec<ComponentId> {
        self.inner
            .registry
            .borrow()
            .components
            .get(&id)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn reference_of(&self, id: ComponentId) -> Option<String> {
        self.inner.registry.borrow().components.get(&id)?.reference.clone()
    }

    #[must_use]
    pub fn type_name_of(&self, id: ComponentId) -> Option<&'static str> {
        self.inner
            .registry
            .borrow()
            .components
            .get(&id)
            .map(|e| e.type_name)
    }

    /// Controller attached to `id` itself.
    #[must_use]
    pub fn controller_of(&self, id: ComponentId) -> Option<ControllerId> {
        self.inner.registry.borrow().components.get(&id)?.controller
    }

    /// Controller of `id` or of its nearest ancestor that has one.
    #[must_use]
    pub fn nearest_controller(&self, id: ComponentId) -> Option<ControllerId> {
        let reg = self.inner.registry.borrow();
        reg.lineage(id)
            .into_iter()
            .find_map(|c| reg.components.get(&c).and_then(|e| e.controller))
    }

    /// First descendant of `root` (depth-first, pre-order) whose reference
    /// is `name`.
    #[must_use]
    pub fn find_descendant_by_reference(&self, root: ComponentId, name: &str) -> Option<ComponentId> {
        let reg = self.inner.registry.borrow();
        reg.descendants(root).into_iter().find(|id| {
            reg.components
                .get(id)
                .is_some_and(|e| e.reference.as_deref() == Some(name))
        })
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.inner.registry.borrow().components.len()
    }

    #[must_use]
    pub fn controller_is_alive(&self, id: ControllerId) -> bool {
        self.inner.registry.borrow().controllers.contains_key(&id)
    }

    #[must_use]
    pub fn controller_view(&self, id: ControllerId) -> Option<ComponentId> {
        self.inner.registry.borrow().controllers.get(&id).map(|e| e.view)
    }

    /// True if controller `id` defines `handler`.
    pub fn controller_defines(&self, id: ControllerId, handler: &str) -> Result<bool> {
        let cell = self.controller_cell(id)?;
        let controller = cell.try_borrow().map_err(|_| busy(id, "controller_defines"))?;
        Ok(controller.defines(handler))
    }

    /// Effective parent of controller `id`.
    pub fn controller_parent(&self, id: ControllerId) -> Result<Option<ControllerId>> {
        let cell = self.controller_cell(id)?;
        let controller = cell.try_borrow().map_err(|_| busy(id, "controller_parent"))?;
        Ok(controller.core().parent())
    }

    /// True if component `id` itself defines `handler`.
    pub fn component_defines(&self, id: ComponentId, handler: &str) -> Result<bool> {
        let cell = self.component_cell(id, "component_defines")?;
        let component = cell.try_borrow().map_err(|_| busy(id, "component_defines"))?;
        Ok(component.defines(handler))
    }

    /// The controllers a named handler is searched in, nearest first.
    pub fn controller_chain(&self, id: ComponentId) -> Result<Vec<ControllerId>> {
        let mut chain = Vec::new();
        let mut current = self.nearest_controller(id);
        while let Some(cid) = current {
            if chain.contains(&cid) {
                break;
            }
            chain.push(cid);
            current = self.controller_parent(cid)?;
        }
        Ok(chain)
    }

    // -----------------------------------------------------------------------
    // Typed access
    // -----------------------------------------------------------------------

    /// Run `f` on component `id` downcast to `T`.
    pub fn with_component<T: Component, R>(&self, id: ComponentId, f: impl FnOnce(&T) -> R) -> Result<R> {
        let cell = self.component_cell(id, "with_component")?;
        let guard = cell.try_borrow().map_err(|_| busy(id, "with_component"))?;
        let typed = (*guard)
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| type_mismatch::<T>(id))?;
        Ok(f(typed))
    }

    pub fn with_component_mut<T: Component, R>(
        &self,
        id: ComponentId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        let cell = self.component_cell(id, "with_component_mut")?;
        let mut guard = cell.try_borrow_mut().map_err(|_| busy(id, "with_component_mut"))?;
        let typed = (*guard)
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| type_mismatch::<T>(id))?;
        Ok(f(typed))
    }

    pub fn with_controller<T: Controller, R>(&self, id: ControllerId, f: impl FnOnce(&T) -> R) -> Result<R> {
        let cell = self.controller_cell(id)?;
        let guard = cell.try_borrow().map_err(|_| busy(id, "with_controller"))?;
        let typed = (*guard)
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| type_mismatch::<T>(id))?;
        Ok(f(typed))
    }

    pub fn with_controller_mut<T: Controller, R>(
        &self,
        id: ControllerId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        let cell = self.controller_cell(id)?;
        let mut guard = cell.try_borrow_mut().map_err(|_| busy(id, "with_controller_mut"))?;
        let typed = (*guard)
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| type_mismatch::<T>(id))?;
        Ok(f(typed))
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create a component of type `T`.
    ///
    /// `build` receives the prepared [`ComponentCore`] and returns the
    /// instance with its config store still empty; declared defaults and
    /// the `options` config are applied afterwards through the normal hook
    /// pipeline.
    pub fn create<T, F>(&self, options: CreateOptions, build: F) -> Result<ComponentId>
    where
        T: Component + Configurable,
        F: FnOnce(ComponentCore) -> Result<T>,
    {
        let CreateOptions {
            parent,
            reference,
            config,
            dom_listeners,
            listeners,
            controller,
        } = options;
        if let Some(parent) = parent {
            self.ensure_alive(parent, "create")?;
        }

        let id = self.inner.ids.component();
        let type_name = short_type_name::<T>();
        let lifecycle = Rc::new(Cell::new(Lifecycle::Constructing));
        let core = ComponentCore::new(id, parent, reference.clone(), Rc::clone(&lifecycle), self.handle())?;
        let mut component = build(core)?;
        component
            .config_mut()
            .set_policy(self.inner.config.reject_policy());

        let mut dom = component.default_dom_listeners();
        dom.extend(dom_listeners);
        let mut plain = component.default_listeners();
        plain.extend(listeners);

        let typed = Rc::new(RefCell::new(component));
        let cell: Rc<RefCell<dyn Component>> = typed.clone();
        {
            let mut reg = self.inner.registry.borrow_mut();
            reg.components.insert(
                id,
                ComponentEntry {
                    cell,
                    type_name,
                    lifecycle,
                    parent,
                    children: Vec::new(),
                    owned: Vec::new(),
                    reference,
                    controller: None,
                    pending_controller: None,
                    dom_bindings: dom.into_iter().map(EventBinding::new).collect(),
                    bindings: plain.into_iter().map(EventBinding::new).collect(),
                    constructed_waiters: Vec::new(),
                },
            );
            if let Some(parent) = parent
                && let Some(entry) = reg.components.get_mut(&parent)
            {
                entry.children.push(id);
            }
        }
        tracing::debug!(target: "weft.lifecycle", component = %id, r#type = type_name, "component constructing");

        if let Err(err) = self.finish_construction(id, &typed, config, controller) {
            tracing::warn!(target: "weft.lifecycle", component = %id, error = %err, "construction failed");
            if self.is_alive(id) {
                let _ = self.destroy(id);
            }
            return Err(err);
        }
        Ok(id)
    }

    fn finish_construction<T: Component + Configurable>(
        &self,
        id: ComponentId,
        typed: &Rc<RefCell<T>>,
        overrides: Vec<(String, weft_core::ConfigValue)>,
        controller: Option<ControllerFactory>,
    ) -> Result<()> {
        {
            let mut component = typed.try_borrow_mut().map_err(|_| busy(id, "create"))?;
            config::initialize(&mut *component, overrides)?;
        }
        if let Some(factory) = controller {
            let cid = self.build_controller(id, factory)?;
            self.inner
                .registry
                .borrow_mut()
                .component_mut(id, "create")?
                .pending_controller = Some(cid);
        }
        {
            let mut component = typed.try_borrow_mut().map_err(|_| busy(id, "create"))?;
            component.on_constructed(self)?;
        }
        self.mark_constructed(id)
    }

    fn build_controller(&self, view: ComponentId, factory: ControllerFactory) -> Result<ControllerId> {
        let cid = self.inner.ids.controller();
        let core = ControllerCore::new(cid, view, self.handle(), self.inner.config.reject_policy())?;
        let cell = factory(core);
        self.inner
            .registry
            .borrow_mut()
            .controllers
            .insert(cid, ControllerEntry { cell, view });
        Ok(cid)
    }

    fn mark_constructed(&self, id: ComponentId) -> Result<()> {
        let (pending, waiters) = {
            let mut reg = self.inner.registry.borrow_mut();
            let entry = reg.component_mut(id, "create")?;
            entry
                .lifecycle
                .set(entry.lifecycle.get().transition(Lifecycle::Constructed, id)?);
            (
                entry.pending_controller.take(),
                std::mem::take(&mut entry.constructed_waiters),
            )
        };
        tracing::debug!(target: "weft.lifecycle", component = %id, "component constructed");
        for waiter in waiters {
            let _ = waiter.send(());
        }
        if let Some(cid) = pending {
            self.wire_controller(id, cid)?;
        }
        self.register_reference(id);
        Ok(())
    }

    /// Attach a controller to an existing view.
    ///
    /// While the view is still constructing the controller is held and
    /// wired once construction ends.
    pub fn attach_controller<C, F>(&self, view: ComponentId, build: F) -> Result<ControllerId>
    where
        C: Controller + 'static,
        F: FnOnce(ControllerCore) -> C + 'static,
    {
        self.ensure_alive(view, "attach_controller")?;
        let factory: ControllerFactory = Box::new(move |core| {
            let controller: Rc<RefCell<dyn Controller>> = Rc::new(RefCell::new(build(core)));
            controller
        });
        let cid = self.build_controller(view, factory)?;
        if self.lifecycle(view) == Some(Lifecycle::Constructing) {
            let previous = self
                .inner
                .registry
                .borrow_mut()
                .component_mut(view, "attach_controller")?
                .pending_controller
                .replace(cid);
            if let Some(previous) = previous {
                self.drop_controller(previous);
            }
            tracing::debug!(
                target: "weft.lifecycle",
                component = %view,
                controller = %cid,
                "controller wiring deferred until view is constructed"
            );
        } else {
            self.wire_controller(view, cid)?;
        }
        Ok(cid)
    }

    fn wire_controller(&self, view: ComponentId, cid: ControllerId) -> Result<()> {
        let previous = self
            .inner
            .registry
            .borrow_mut()
            .component_mut(view, "wire_controller")?
            .controller
            .replace(cid);
        if let Some(previous) = previous
            && previous != cid
        {
            self.drop_controller(previous);
        }
        let cell = self.controller_cell(cid)?;
        cell.try_borrow_mut()
            .map_err(|_| busy(cid, "on_view_constructed"))?
            .on_view_constructed(self, view)?;
        tracing::debug!(target: "weft.lifecycle", component = %view, controller = %cid, "controller wired");
        Ok(())
    }

    /// Record `id` under its reference in the nearest controller above it.
    fn register_reference(&self, id: ComponentId) {
        let Some(name) = self.reference_of(id) else {
            return;
        };
        let Some(cid) = self.parent_of(id).and_then(|p| self.nearest_controller(p)) else {
            return;
        };
        let Ok(cell) = self.controller_cell(cid) else {
            return;
        };
        match cell.try_borrow() {
            Ok(controller) => controller.core().register_reference(name, id),
            Err(_) => tracing::trace!(
                target: "weft.handler",
                component = %id,
                controller = %cid,
                "controller busy, reference left to lazy lookup"
            ),
        }
    }

    fn drop_controller(&self, cid: ControllerId) {
        let entry = self.inner.registry.borrow_mut().controllers.remove(&cid);
        let Some(entry) = entry else { return };
        match entry.cell.try_borrow_mut() {
            Ok(mut controller) => {
                controller.on_destroy();
                controller.core_mut().teardown();
            }
            Err(_) => tracing::warn!(target: "weft.lifecycle", controller = %cid, "controller busy during teardown"),
        }
        tracing::debug!(target: "weft.lifecycle", controller = %cid, "controller destroyed");
    }

    /// Make `owner` responsible for destroying `owned`.
    ///
    /// For instances that are not children in the tree (e.g. a shared store
    /// created by the owner).
    pub fn adopt(&self, owner: ComponentId, owned: ComponentId) -> Result<()> {
        self.ensure_alive(owned, "adopt")?;
        let mut reg = self.inner.registry.borrow_mut();
        let entry = reg.component_mut(owner, "adopt")?;
        if !entry.owned.contains(&owned) {
            entry.owned.push(owned);
        }
        Ok(())
    }

    /// Resolves once `id` has finished constructing.
    pub fn constructed(&self, id: ComponentId) -> Result<LocalBoxFuture<'static, Result<()>>> {
        let mut reg = self.inner.registry.borrow_mut();
        let entry = reg.component_mut(id, "constructed")?;
        if entry.lifecycle.get().is_constructed() {
            return Ok(future::ready(Ok(())).boxed_local());
        }
        let (tx, rx) = oneshot::channel();
        entry.constructed_waiters.push(tx);
        Ok(async move {
            rx.await
                .map_err(|_| Error::from(DestroyedInstanceError::new(id, "constructed")))
        }
        .boxed_local())
    }

    // -----------------------------------------------------------------------
    // Commits and mounting
    // -----------------------------------------------------------------------

    /// Schedule a commit of `id`'s tree.
    pub fn request_update(&self, id: ComponentId) -> Result<UpdateFuture> {
        self.ensure_alive(id, "request_update")?;
        self.inner.scheduler.request_update(id)
    }

    #[must_use]
    pub fn update_phase(&self, id: ComponentId) -> Phase {
        self.inner.scheduler.phase(id)
    }

    /// Mark `id` and its constructed descendants mounted or unmounted.
    ///
    /// `on_mounted` learns whether this is the instance's first mount.
    /// Setting the current state again is a no-op, as is unmounting an
    /// instance that was never mounted.
    pub fn set_mounted(&self, id: ComponentId, mounted: bool) -> Result<()> {
        let (cell, lifecycle, children) = {
            let reg = self.inner.registry.borrow();
            let entry = reg.component(id, "set_mounted")?;
            (entry.cell.clone(), Rc::clone(&entry.lifecycle), entry.children.clone())
        };
        let current = lifecycle.get();
        let target = if mounted {
            Lifecycle::Mounted
        } else {
            Lifecycle::Unmounted
        };
        if current == target || (!mounted && current == Lifecycle::Constructed) {
            return Ok(());
        }
        lifecycle.set(current.transition(target, id)?);
        {
            let mut component = cell.try_borrow_mut().map_err(|_| busy(id, "set_mounted"))?;
            if mounted {
                let first = component.core_mut().mark_mounted();
                component.on_mounted(self, first)?;
            } else {
                component.on_unmounted(self)?;
            }
        }
        tracing::debug!(target: "weft.lifecycle", component = %id, mounted, "mount state changed");

        for child in children {
            if self.lifecycle(child).is_some_and(Lifecycle::is_constructed) {
                self.set_mounted(child, mounted)?;
            }
        }
        Ok(())
    }

    /// Commit `id`'s tree, then mark it mounted.
    pub async fn mount(&self, id: ComponentId) -> Result<()> {
        self.request_update(id)?.await?;
        self.set_mounted(id, true)
    }

    // -----------------------------------------------------------------------
    // Destroy
    // -----------------------------------------------------------------------

    /// Destroy `id`, its children, owned instances and controller.
    ///
    /// Pending update futures fail with [`DestroyedInstanceError`]; queued
    /// events for `id` are skipped.
    pub fn destroy(&self, id: ComponentId) -> Result<()> {
        let (cell, children, controllers, parent) = {
            let reg = self.inner.registry.borrow();
            let entry = reg.component(id, "destroy")?;
            let mut children = entry.children.clone();
            children.extend(entry.owned.iter().copied());
            let controllers: Vec<ControllerId> = entry
                .controller
                .into_iter()
                .chain(entry.pending_controller)
                .collect();
            (entry.cell.clone(), children, controllers, entry.parent)
        };

        cell.try_borrow_mut()
            .map_err(|_| busy(id, "destroy"))?
            .on_destroy(self);

        for child in children {
            if self.is_alive(child) {
                self.destroy(child)?;
            }
        }
        for cid in controllers {
            self.drop_controller(cid);
        }

        if let Ok(mut component) = cell.try_borrow_mut() {
            component.clear_config();
        }
        self.inner.scheduler.cancel(id);
        self.inner.resolver.borrow_mut().forget(id);

        let entry = {
            let mut reg = self.inner.registry.borrow_mut();
            let entry = reg.components.remove(&id);
            reg.destroyed.insert(id);
            if let Some(parent) = parent
                && let Some(p) = reg.components.get_mut(&parent)
            {
                p.children.retain(|c| *c != id);
                p.owned.retain(|c| *c != id);
            }
            entry
        };
        if let Some(entry) = &entry {
            entry.lifecycle.set(Lifecycle::Destroyed);
        }
        drop(entry);
        tracing::debug!(target: "weft.lifecycle", component = %id, "component destroyed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    /// Replace `id`'s listeners of `kind` wholesale.
    ///
    /// Every new binding starts unbound, including ones that failed before.
    pub fn replace_listeners(
        &self,
        id: ComponentId,
        kind: ListenerKind,
        specs: Vec<ListenerSpec>,
    ) -> Result<()> {
        {
            let mut reg = self.inner.registry.borrow_mut();
            let entry = reg.component_mut(id, "replace_listeners")?;
            *entry.bindings_mut(kind) = specs.into_iter().map(EventBinding::new).collect();
        }
        self.inner.resolver.borrow_mut().forget(id);
        tracing::debug!(target: "weft.handler", component = %id, ?kind, "listeners replaced");
        Ok(())
    }

    /// Status of each of `id`'s listeners of `kind`, with its event name.
    pub fn binding_statuses(
        &self,
        id: ComponentId,
        kind: ListenerKind,
    ) -> Result<Vec<(String, BindingStatus)>> {
        let reg = self.inner.registry.borrow();
        let entry = reg.component(id, "binding_statuses")?;
        Ok(entry
            .bindings(kind)
            .iter()
            .map(|b| (b.event().to_owned(), b.state.status()))
            .collect())
    }

    /// Resolve every unbound listener of `id` now instead of on first event.
    /// Returns how many listeners are bound.
    pub fn resolve_listeners(&self, id: ComponentId) -> Result<usize> {
        let mut bound = 0;
        for kind in [ListenerKind::Dom, ListenerKind::Plain] {
            let count = self.inner.registry.borrow().component(id, "resolve_listeners")?.bindings(kind).len();
            for index in 0..count {
                if self.ensure_bound(id, kind, index)?.is_some() {
                    bound += 1;
                }
            }
        }
        Ok(bound)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reg = self.inner.registry.try_borrow();
        f.debug_struct("Runtime")
            .field("components", &reg.as_ref().map(|r| r.components.len()).ok())
            .field("controllers", &reg.as_ref().map(|r| r.controllers.len()).ok())
            .field("scheduler", &self.inner.scheduler)
            .finish()
    }
}

fn type_mismatch<T: ?Sized>(instance: impl fmt::Display) -> Error {
    Error::TypeMismatch {
        instance: instance.to_string(),
        expected: short_type_name::<T>(),
    }
}
