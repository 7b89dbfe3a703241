#![forbid(unsafe_code)]

//! Event model shared by delegated DOM listeners and plain application
//! events.
//!
//! A [`DomEvent`] carries its propagation path from the target node outwards
//! to the root, the way a browser reports `event.path`. Each [`PathNode`]
//! records which component's tree it belongs to, so the dispatcher can hand
//! every listening component only the part of the path inside its own tree.
//!
//! Plain application events (fired by a component rather than by input)
//! reuse the same type with an empty path and a `source`.

use crate::id::ComponentId;
use crate::value::ConfigValue;
use std::collections::BTreeMap;

/// One node on an event's propagation path.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathNode {
    pub tag: String,
    pub id: Option<String>,
    pub cls: Vec<String>,
    pub flag: Option<String>,
    /// Component whose virtual tree holds this node.
    pub component: Option<ComponentId>,
}

impl PathNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_class(mut self, cls: impl Into<String>) -> Self {
        self.cls.push(cls.into());
        self
    }

    #[must_use]
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    #[must_use]
    pub fn in_component(mut self, component: ComponentId) -> Self {
        self.component = Some(component);
        self
    }

    #[must_use]
    pub fn has_class(&self, cls: &str) -> bool {
        self.cls.iter().any(|c| c == cls)
    }
}

/// Event-specific payload.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventData {
    #[default]
    None,
    Wheel {
        delta_x: f64,
        delta_y: f64,
        scroll_left: f64,
        client_width: f64,
    },
    Pointer {
        x: f64,
        y: f64,
        button: u8,
    },
    Key {
        key: String,
        ctrl: bool,
        shift: bool,
        alt: bool,
    },
    /// Free-form payload, used by application events.
    Values(BTreeMap<String, ConfigValue>),
}

impl EventData {
    /// Build a `Values` payload from `(name, value)` pairs.
    pub fn values<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        Self::Values(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Lookup in a `Values` payload.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&ConfigValue> {
        match self {
            Self::Values(map) => map.get(name),
            _ => None,
        }
    }
}

/// A dispatched event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DomEvent {
    pub name: String,
    /// Target first, root last. Empty for application events.
    pub path: Vec<PathNode>,
    pub data: EventData,
    /// Firing component, for application events.
    pub source: Option<ComponentId>,
}

impl DomEvent {
    /// An input event travelling along `path`.
    pub fn new(name: impl Into<String>, path: Vec<PathNode>, data: EventData) -> Self {
        Self {
            name: name.into(),
            path,
            data,
            source: None,
        }
    }

    /// An application event fired by `source`.
    pub fn app(name: impl Into<String>, source: ComponentId, data: EventData) -> Self {
        Self {
            name: name.into(),
            path: Vec::new(),
            data,
            source: Some(source),
        }
    }

    #[must_use]
    pub fn is_app_event(&self) -> bool {
        self.path.is_empty() && self.source.is_some()
    }

    /// The event target, if any.
    #[must_use]
    pub fn target(&self) -> Option<&PathNode> {
        self.path.first()
    }

    /// Components touched by the path, innermost first, without repeats.
    #[must_use]
    pub fn components(&self) -> Vec<ComponentId> {
        let mut out: Vec<ComponentId> = Vec::new();
        for id in self.path.iter().filter_map(|n| n.component) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_are_innermost_first() {
        let a = ComponentId::from_raw(1);
        let b = ComponentId::from_raw(2);
        let ev = DomEvent::new(
            "click",
            vec![
                PathNode::new("span").in_component(a),
                PathNode::new("div").in_component(a),
                PathNode::new("div").in_component(b),
            ],
            EventData::None,
        );
        assert_eq!(ev.components(), vec![a, b]);
        assert_eq!(ev.target().map(|n| n.tag.as_str()), Some("span"));
    }

    #[test]
    fn app_event_values() {
        let ev = DomEvent::app(
            "change",
            ComponentId::from_raw(4),
            EventData::values([("rowHeight", 20)]),
        );
        assert!(ev.is_app_event());
        assert_eq!(ev.data.value("rowHeight"), Some(&ConfigValue::Int(20)));
    }
}
