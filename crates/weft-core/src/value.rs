#![forbid(unsafe_code)]

//! Dynamically typed configuration values.
//!
//! Config properties are declared per type but stored uniformly, so the
//! store and its hooks exchange [`ConfigValue`]s. Accessors return `None`
//! on a variant mismatch; hooks decide whether that is a rejection.

use crate::id::{ComponentId, ControllerId};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

/// A single configuration value.
///
/// `Null` is an explicit "no value", distinct from a property that has
/// never been set (which the store reports as `None`).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    List(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
    Component(ComponentId),
    Controller(ControllerId),
}

impl ConfigValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value as `f64`; integers are widened.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_component(&self) -> Option<ComponentId> {
        match self {
            Self::Component(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_controller(&self) -> Option<ControllerId> {
        match self {
            Self::Controller(v) => Some(*v),
            _ => None,
        }
    }

    /// Short variant name for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Date(_) => "date",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Component(_) => "component",
            Self::Controller(_) => "controller",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Component(id) => write!(f, "{id}"),
            Self::Controller(id) => write!(f, "{id}"),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for ConfigValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<NaiveDate> for ConfigValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<ComponentId> for ConfigValue {
    fn from(v: ComponentId) -> Self {
        Self::Component(v)
    }
}

impl From<ControllerId> for ConfigValue {
    fn from(v: ControllerId) -> Self {
        Self::Controller(v)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ConfigValue>> From<Option<T>> for ConfigValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variants() {
        assert_eq!(ConfigValue::from(3).as_int(), Some(3));
        assert_eq!(ConfigValue::from(3).as_float(), Some(3.0));
        assert_eq!(ConfigValue::from("short").as_str(), Some("short"));
        assert_eq!(ConfigValue::from("short").as_int(), None);
        assert!(ConfigValue::from(None::<i64>).is_null());
    }

    #[test]
    fn list_conversion_and_display() {
        let v = ConfigValue::from(vec!["a", "b"]);
        assert_eq!(v.as_list().map(<[ConfigValue]>::len), Some(2));
        assert_eq!(v.to_string(), "[\"a\", \"b\"]");
    }
}
