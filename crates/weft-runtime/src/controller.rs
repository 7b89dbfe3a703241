#![forbid(unsafe_code)]

//! Controllers: behavior attached to a view component.
//!
//! A controller owns handlers and a reference cache but no layout. Its
//! `view` and `parent` are ordinary config properties on the controller's
//! own [`ConfigStore`]:
//!
//! | property | before_set                      | before_get                           |
//! |----------|---------------------------------|--------------------------------------|
//! | `view`   | coerce to a component id        | `null` once the view is gone         |
//! | `parent` | accept a controller id or null  | nearest ancestor controller if null  |
//!
//! Changing `view` drops the reference cache.

use crate::component::AsAny;
use crate::handler::HandlerScope;
use crate::runtime::{Runtime, RuntimeHandle};
use ahash::AHashMap;
use std::cell::RefCell;
use std::sync::LazyLock;
use weft_core::config::{self, ConfigDescriptor, ConfigSchema, ConfigStore, Configurable};
use weft_core::{
    ComponentId, ConfigValue, ControllerId, Error, RejectPolicy, Result, ValidationRejected,
};

/// Behavior attached to one view component.
pub trait Controller: HandlerScope + AsAny {
    fn core(&self) -> &ControllerCore;
    fn core_mut(&mut self) -> &mut ControllerCore;

    /// Runs once the view has finished constructing and the controller is
    /// wired to it.
    fn on_view_constructed(&mut self, _rt: &Runtime, _view: ComponentId) -> Result<()> {
        Ok(())
    }

    /// Runs when the controller is dropped with its view.
    fn on_destroy(&mut self) {}
}

static CONTROLLER_SCHEMA: LazyLock<ConfigSchema<ControllerCore>> = LazyLock::new(|| {
    ConfigSchema::builder("Controller")
        .declare(
            ConfigDescriptor::new("view", ConfigValue::Null)
                .before_set(before_set_view)
                .after_set(after_set_view)
                .before_get(before_get_view),
        )
        .declare(
            ConfigDescriptor::new("parent", ConfigValue::Null)
                .before_set(before_set_parent)
                .before_get(before_get_parent),
        )
        .build()
});

fn before_set_view(
    _: &mut ControllerCore,
    value: ConfigValue,
    _: Option<&ConfigValue>,
) -> Result<ConfigValue> {
    match value {
        ConfigValue::Null | ConfigValue::Component(_) => Ok(value),
        ConfigValue::Int(raw) if raw > 0 => Ok(ConfigValue::Component(ComponentId::from_raw(
            raw.unsigned_abs(),
        ))),
        other => Err(ValidationRejected::new(
            "view",
            format!("expected a component id, got {}", other.kind()),
        )
        .into()),
    }
}

fn after_set_view(
    core: &mut ControllerCore,
    _: &ConfigValue,
    _: Option<&ConfigValue>,
) -> Result<()> {
    core.invalidate_references();
    Ok(())
}

fn before_get_view(core: &ControllerCore, value: ConfigValue) -> ConfigValue {
    match value.as_component() {
        Some(id) if core.runtime.try_upgrade().is_some_and(|rt| rt.is_alive(id)) => value,
        _ => ConfigValue::Null,
    }
}

fn before_set_parent(
    _: &mut ControllerCore,
    value: ConfigValue,
    _: Option<&ConfigValue>,
) -> Result<ConfigValue> {
    match value {
        ConfigValue::Null | ConfigValue::Controller(_) => Ok(value),
        other => Err(ValidationRejected::new(
            "parent",
            format!("expected a controller id, got {}", other.kind()),
        )
        .into()),
    }
}

fn before_get_parent(core: &ControllerCore, value: ConfigValue) -> ConfigValue {
    let Some(rt) = core.runtime.try_upgrade() else {
        return ConfigValue::Null;
    };
    if let Some(explicit) = value.as_controller()
        && rt.controller_is_alive(explicit)
    {
        return value;
    }
    core.view()
        .and_then(|view| rt.parent_of(view))
        .and_then(|p| rt.nearest_controller(p))
        .map_or(ConfigValue::Null, ConfigValue::Controller)
}

/// State shared by every controller.
pub struct ControllerCore {
    id: ControllerId,
    config: ConfigStore<ControllerCore>,
    references: RefCell<AHashMap<String, ComponentId>>,
    runtime: RuntimeHandle,
}

impl Configurable for ControllerCore {
    fn config(&self) -> &ConfigStore<Self> {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ConfigStore<Self> {
        &mut self.config
    }
}

impl ControllerCore {
    pub(crate) fn new(
        id: ControllerId,
        view: ComponentId,
        runtime: RuntimeHandle,
        policy: RejectPolicy,
    ) -> Result<Self> {
        let mut core = Self {
            id,
            config: ConfigStore::new(&CONTROLLER_SCHEMA, id.to_string()).with_policy(policy),
            references: RefCell::new(AHashMap::new()),
            runtime,
        };
        config::initialize(&mut core, [("view", ConfigValue::Component(view))])?;
        Ok(core)
    }

    #[must_use]
    pub fn id(&self) -> ControllerId {
        self.id
    }

    /// The live view component, if any.
    #[must_use]
    pub fn view(&self) -> Option<ComponentId> {
        self.get_config("view").ok().and_then(|v| v.as_component())
    }

    /// Explicit parent controller, or the nearest controller above the view.
    #[must_use]
    pub fn parent(&self) -> Option<ControllerId> {
        self.get_config("parent").ok().and_then(|v| v.as_controller())
    }

    pub fn runtime(&self) -> Result<Runtime> {
        self.runtime.upgrade()
    }

    /// Component below the view registered under `name`.
    ///
    /// Served from the cache when the cached component is still alive;
    /// otherwise the view's descendants are searched and a hit is cached.
    pub fn get_reference(&self, name: &str) -> Result<Option<ComponentId>> {
        self.config.ensure_live("get_reference")?;
        let rt = self.runtime.upgrade()?;

        let cached = self.references.borrow().get(name).copied();
        if let Some(id) = cached {
            if rt.is_alive(id) {
                return Ok(Some(id));
            }
            self.references.borrow_mut().remove(name);
        }

        let Some(view) = self.view() else {
            return Ok(None);
        };
        let found = rt.find_descendant_by_reference(view, name);
        if let Some(id) = found {
            self.references.borrow_mut().insert(name.to_owned(), id);
        }
        tracing::trace!(
            target: "weft.handler",
            controller = %self.id,
            reference = name,
            found = found.is_some(),
            "reference lookup"
        );
        Ok(found)
    }

    /// Record `id` under `name` without a search.
    pub fn register_reference(&self, name: impl Into<String>, id: ComponentId) {
        self.references.borrow_mut().insert(name.into(), id);
    }

    pub fn invalidate_references(&self) {
        self.references.borrow_mut().clear();
    }

    /// First controller above this one, following `parent`, that defines
    /// `handler`.
    pub fn parent_handler_scope(&self, handler: &str) -> Result<Option<ControllerId>> {
        self.config.ensure_live("parent_handler_scope")?;
        let rt = self.runtime.upgrade()?;
        let mut seen = vec![self.id];
        let mut current = self.parent();
        while let Some(candidate) = current {
            if seen.contains(&candidate) {
                break;
            }
            seen.push(candidate);
            if rt.controller_defines(candidate, handler)? {
                return Ok(Some(candidate));
            }
            current = rt.controller_parent(candidate)?;
        }
        Ok(None)
    }

    /// Fail with the destroyed-instance error after teardown.
    pub fn ensure_alive(&self, operation: &str) -> Result<()> {
        self.config.ensure_live(operation)
    }

    pub(crate) fn teardown(&mut self) {
        self.references.borrow_mut().clear();
        self.config.clear();
    }
}

impl std::fmt::Debug for ControllerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerCore")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("references", &self.references.borrow().len())
            .finish()
    }
}

/// Error for a controller id that is not registered.
pub(crate) fn unknown_controller(id: ControllerId) -> Error {
    Error::UnknownInstance(id.to_string())
}
