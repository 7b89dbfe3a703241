#![forbid(unsafe_code)]

//! A plain container component.
//!
//! Renders a `div` whose children are placeholders for child components.
//! `cls` accepts a whitespace-separated string or a list of strings;
//! `hidden` toggles the `neo-hidden` class.

use std::sync::LazyLock;
use weft_core::config::{ConfigDescriptor, ConfigSchema, ConfigStore, Configurable};
use weft_core::{ComponentId, ConfigValue, Result, ValidationRejected};
use weft_render::{Target, VNode};
use weft_runtime::{Component, ComponentCore, HandlerScope};

const BASE_CLASS: &str = "neo-container";
const HIDDEN_CLASS: &str = "neo-hidden";

static CONTAINER_SCHEMA: LazyLock<ConfigSchema<Container>> = LazyLock::new(|| {
    ConfigSchema::builder("Container")
        .declare(
            ConfigDescriptor::new("cls", ConfigValue::List(Vec::new()))
                .before_set(before_set_cls)
                .after_set(after_set_cls)
                .after_on_init(),
        )
        .declare(
            ConfigDescriptor::new("hidden", false)
                .before_set(before_set_hidden)
                .after_set(after_set_hidden)
                .after_on_init(),
        )
        .build()
});

fn before_set_cls(_: &mut Container, value: ConfigValue, _: Option<&ConfigValue>) -> Result<ConfigValue> {
    match value {
        ConfigValue::Null => Ok(ConfigValue::List(Vec::new())),
        ConfigValue::Str(s) => Ok(ConfigValue::List(
            s.split_whitespace().map(ConfigValue::from).collect(),
        )),
        ConfigValue::List(items) if items.iter().all(|i| i.as_str().is_some()) => {
            Ok(ConfigValue::List(items))
        }
        other => Err(ValidationRejected::new(
            "cls",
            format!("expected a string or a list of strings, got {}", other.kind()),
        )
        .into()),
    }
}

fn class_names(value: Option<&ConfigValue>) -> Vec<String> {
    value
        .and_then(ConfigValue::as_list)
        .map(|items| items.iter().filter_map(|i| i.as_str().map(str::to_owned)).collect())
        .unwrap_or_default()
}

fn after_set_cls(c: &mut Container, value: &ConfigValue, old: Option<&ConfigValue>) -> Result<()> {
    let added = class_names(Some(value));
    let removed = class_names(old);
    c.core.tree_mut()?.update(Target::Root, |root| {
        for cls in &removed {
            if cls != BASE_CLASS {
                root.remove_class(cls);
            }
        }
        for cls in added {
            root.add_class(cls);
        }
    })?;
    c.touch()
}

fn before_set_hidden(_: &mut Container, value: ConfigValue, _: Option<&ConfigValue>) -> Result<ConfigValue> {
    match value {
        ConfigValue::Bool(_) => Ok(value),
        ConfigValue::Null => Ok(ConfigValue::Bool(false)),
        other => Err(ValidationRejected::new("hidden", format!("expected a bool, got {}", other.kind())).into()),
    }
}

fn after_set_hidden(c: &mut Container, value: &ConfigValue, _: Option<&ConfigValue>) -> Result<()> {
    let hidden = value.as_bool().unwrap_or(false);
    c.core
        .tree_mut()?
        .update(Target::Root, |root| root.set_class(HIDDEN_CLASS, hidden))?;
    c.touch()
}

/// Holds child components.
pub struct Container {
    core: ComponentCore,
    config: ConfigStore<Container>,
}

impl Container {
    pub fn new(mut core: ComponentCore) -> Result<Self> {
        let root = VNode::new("div").id(core.id().to_string()).class(BASE_CLASS);
        core.set_root(root)?;
        let owner = core.id().to_string();
        Ok(Self {
            core,
            config: ConfigStore::new(&CONTAINER_SCHEMA, owner),
        })
    }

    /// Embed `child`'s tree at the end of this container.
    pub fn append(&mut self, child: ComponentId) -> Result<()> {
        self.core
            .tree_mut()?
            .push_children(Target::Root, vec![VNode::placeholder(child)])?;
        self.touch()
    }

    /// Remove `child`'s placeholder. Returns whether it was present.
    pub fn detach(&mut self, child: ComponentId) -> Result<bool> {
        let at = self
            .core
            .tree()
            .root()
            .children
            .iter()
            .position(|n| n.component_ref == Some(child));
        let Some(at) = at else {
            return Ok(false);
        };
        self.core.tree_mut()?.splice_children(Target::Root, at, 1, Vec::new())?;
        self.touch()?;
        Ok(true)
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.get_config("hidden")
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Request a commit once construction is over.
    fn touch(&self) -> Result<()> {
        if self.core.lifecycle().is_constructed() {
            let _pending = self.core.request_update()?;
        }
        Ok(())
    }
}

impl Configurable for Container {
    fn config(&self) -> &ConfigStore<Self> {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ConfigStore<Self> {
        &mut self.config
    }
}

impl HandlerScope for Container {}

impl Component for Container {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn clear_config(&mut self) {
        self.config.clear();
    }
}
