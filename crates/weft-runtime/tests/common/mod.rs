//! Shared fixtures for the runtime integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::LazyLock;
use weft_core::config::{ConfigDescriptor, ConfigSchema, ConfigStore, Configurable};
use weft_core::{ComponentId, ConfigValue, DomEvent, Error, PathNode, Result};
use weft_render::VNode;
use weft_runtime::{
    Component, ComponentCore, Controller, ControllerCore, CreateOptions, HandlerContext,
    HandlerScope, HandlerTable, Runtime,
};

/// Ordered record of lifecycle hooks and handler runs.
pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

// ---------------------------------------------------------------------------
// Panel
// ---------------------------------------------------------------------------

static PANEL_SCHEMA: LazyLock<ConfigSchema<Panel>> = LazyLock::new(|| {
    ConfigSchema::builder("Panel")
        .declare(ConfigDescriptor::new("title", "").after_set(after_set_title))
        .declare(ConfigDescriptor::new("size", "m").legal_values(["s", "m", "l"]))
        .build()
});

static PANEL_HANDLERS: LazyLock<HandlerTable<Panel>> = LazyLock::new(|| {
    HandlerTable::new()
        .with("onPanelClick", Panel::on_click)
        .with("onFail", Panel::on_fail)
});

fn after_set_title(p: &mut Panel, value: &ConfigValue, _: Option<&ConfigValue>) -> Result<()> {
    let title = value.as_str().unwrap_or_default().to_owned();
    p.core.tree_mut()?.update("title", |n| n.text = Some(title))?;
    Ok(())
}

/// Minimal component with a title node and a journal.
pub struct Panel {
    core: ComponentCore,
    config: ConfigStore<Panel>,
    journal: Journal,
    name: String,
    pub clicks: u32,
}

impl Panel {
    pub fn new(mut core: ComponentCore, name: &str, journal: &Journal) -> Result<Self> {
        core.set_root(
            VNode::new("div")
                .id(core.id().to_string())
                .class("panel")
                .child(VNode::new("h1").flag("title")),
        )?;
        let owner = core.id().to_string();
        Ok(Self {
            core,
            config: ConfigStore::new(&PANEL_SCHEMA, owner),
            journal: Rc::clone(journal),
            name: name.to_owned(),
            clicks: 0,
        })
    }

    fn on_click(&mut self, _cx: &mut HandlerContext<'_>, _event: &DomEvent) -> Result<()> {
        self.clicks += 1;
        self.journal.borrow_mut().push(format!("{}:click", self.name));
        Ok(())
    }

    fn on_fail(&mut self, _cx: &mut HandlerContext<'_>, _event: &DomEvent) -> Result<()> {
        Err(Error::UnknownInstance(format!("{} refused", self.name)))
    }
}

impl Configurable for Panel {
    fn config(&self) -> &ConfigStore<Self> {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ConfigStore<Self> {
        &mut self.config
    }
}

impl HandlerScope for Panel {
    fn defines(&self, handler: &str) -> bool {
        PANEL_HANDLERS.defines(handler)
    }

    fn invoke(&mut self, handler: &str, cx: &mut HandlerContext<'_>, event: &DomEvent) -> Result<()> {
        PANEL_HANDLERS.invoke(self, handler, cx, event)
    }
}

impl Component for Panel {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn clear_config(&mut self) {
        self.config.clear();
    }

    fn on_constructed(&mut self, _rt: &Runtime) -> Result<()> {
        self.journal.borrow_mut().push(format!("{}:constructed", self.name));
        Ok(())
    }

    fn on_mounted(&mut self, _rt: &Runtime, first: bool) -> Result<()> {
        self.journal.borrow_mut().push(format!("{}:mounted:{first}", self.name));
        Ok(())
    }

    fn on_unmounted(&mut self, _rt: &Runtime) -> Result<()> {
        self.journal.borrow_mut().push(format!("{}:unmounted", self.name));
        Ok(())
    }

    fn on_destroy(&mut self, _rt: &Runtime) {
        self.journal.borrow_mut().push(format!("{}:destroy", self.name));
    }
}

pub fn panel(rt: &Runtime, name: &str, journal: &Journal, options: CreateOptions) -> ComponentId {
    let journal = Rc::clone(journal);
    let name = name.to_owned();
    rt.create(options, move |core| Panel::new(core, &name, &journal))
        .unwrap()
}

/// Path node inside `component`.
pub fn node(component: ComponentId, tag: &str, cls: &str) -> PathNode {
    let node = PathNode::new(tag).in_component(component);
    if cls.is_empty() { node } else { node.with_class(cls) }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

static FORM_HANDLERS: LazyLock<HandlerTable<FormController>> = LazyLock::new(|| {
    HandlerTable::new().with("onSave", FormController::on_save)
});

/// Controller counting `onSave` calls.
pub struct FormController {
    core: ControllerCore,
    journal: Journal,
    pub saves: u32,
    pub wired_to: Option<ComponentId>,
}

impl FormController {
    pub fn new(core: ControllerCore, journal: &Journal) -> Self {
        Self {
            core,
            journal: Rc::clone(journal),
            saves: 0,
            wired_to: None,
        }
    }

    fn on_save(&mut self, cx: &mut HandlerContext<'_>, _event: &DomEvent) -> Result<()> {
        self.saves += 1;
        self.journal
            .borrow_mut()
            .push(format!("save:{}", cx.component()));
        Ok(())
    }
}

impl HandlerScope for FormController {
    fn defines(&self, handler: &str) -> bool {
        FORM_HANDLERS.defines(handler)
    }

    fn invoke(&mut self, handler: &str, cx: &mut HandlerContext<'_>, event: &DomEvent) -> Result<()> {
        FORM_HANDLERS.invoke(self, handler, cx, event)
    }
}

impl Controller for FormController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ControllerCore {
        &mut self.core
    }

    fn on_view_constructed(&mut self, _rt: &Runtime, view: ComponentId) -> Result<()> {
        self.wired_to = Some(view);
        Ok(())
    }

    fn on_destroy(&mut self) {
        self.journal.borrow_mut().push("controller:destroy".to_owned());
    }
}

/// Controller defining no handlers.
pub struct EmptyController {
    core: ControllerCore,
}

impl EmptyController {
    pub fn new(core: ControllerCore) -> Self {
        Self { core }
    }
}

impl HandlerScope for EmptyController {}

impl Controller for EmptyController {
    fn core(&self) -> &ControllerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ControllerCore {
        &mut self.core
    }
}
