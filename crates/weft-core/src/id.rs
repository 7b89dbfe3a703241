#![forbid(unsafe_code)]

//! Instance identifiers.
//!
//! Components and controllers are addressed by small copyable ids rather
//! than by pointer. Holding an id never keeps an instance alive; lookups go
//! through the owning registry and fail once the instance is gone.

use std::cell::Cell;
use std::fmt;

/// Identifier of a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentId(u64);

impl ComponentId {
    /// Create an id from its raw value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "weft-component-{}", self.0)
    }
}

/// Identifier of a controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerId(u64);

impl ControllerId {
    /// Create an id from its raw value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "weft-controller-{}", self.0)
    }
}

/// Monotonic id source, one per runtime.
///
/// Ids start at 1 and are never reused within a runtime.
#[derive(Debug)]
pub struct IdAllocator {
    next: Cell<u64>,
}

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self { next: Cell::new(1) }
    }

    fn bump(&self) -> u64 {
        let raw = self.next.get();
        self.next.set(raw + 1);
        raw
    }

    /// Allocate a fresh component id.
    pub fn component(&self) -> ComponentId {
        ComponentId(self.bump())
    }

    /// Allocate a fresh controller id.
    pub fn controller(&self) -> ControllerId {
        ControllerId(self.bump())
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_across_kinds() {
        let ids = IdAllocator::new();
        let a = ids.component();
        let b = ids.controller();
        let c = ids.component();
        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert_eq!(c.raw(), 3);
    }

    #[test]
    fn display_is_prefixed() {
        assert_eq!(ComponentId::from_raw(7).to_string(), "weft-component-7");
        assert_eq!(ControllerId::from_raw(3).to_string(), "weft-controller-3");
    }
}
