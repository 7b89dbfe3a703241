#![forbid(unsafe_code)]

//! Component lifecycle states.
//!
//! ```text
//! constructing -> constructed -> mounted <-> unmounted
//!        \              \           \          /
//!         +--------------+-----------+--> destroyed
//! ```
//!
//! `destroyed` is terminal. `mounted` implies the instance was constructed.

use std::fmt;
use weft_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Constructing,
    Constructed,
    Mounted,
    Unmounted,
    Destroyed,
}

impl Lifecycle {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Constructing => "constructing",
            Self::Constructed => "constructed",
            Self::Mounted => "mounted",
            Self::Unmounted => "unmounted",
            Self::Destroyed => "destroyed",
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use Lifecycle::*;
        matches!(
            (self, next),
            (Constructing, Constructed)
                | (Constructed, Mounted)
                | (Mounted, Unmounted)
                | (Unmounted, Mounted)
                | (Constructing | Constructed | Mounted | Unmounted, Destroyed)
        )
    }

    /// Validate `self -> next`, naming `instance` on failure.
    pub fn transition(self, next: Self, instance: impl fmt::Display) -> Result<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::Lifecycle {
                instance: instance.to_string(),
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }

    #[must_use]
    pub fn is_constructed(self) -> bool {
        !matches!(self, Self::Constructing | Self::Destroyed)
    }

    #[must_use]
    pub fn is_mounted(self) -> bool {
        self == Self::Mounted
    }

    #[must_use]
    pub fn is_destroyed(self) -> bool {
        self == Self::Destroyed
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_toggles_after_construction() {
        assert!(Lifecycle::Constructed.can_transition_to(Lifecycle::Mounted));
        assert!(Lifecycle::Mounted.can_transition_to(Lifecycle::Unmounted));
        assert!(Lifecycle::Unmounted.can_transition_to(Lifecycle::Mounted));
        assert!(!Lifecycle::Constructing.can_transition_to(Lifecycle::Mounted));
    }

    #[test]
    fn destroyed_is_terminal() {
        for next in [
            Lifecycle::Constructing,
            Lifecycle::Constructed,
            Lifecycle::Mounted,
            Lifecycle::Unmounted,
            Lifecycle::Destroyed,
        ] {
            assert!(!Lifecycle::Destroyed.can_transition_to(next));
        }
        let err = Lifecycle::Destroyed
            .transition(Lifecycle::Mounted, "c1")
            .unwrap_err();
        assert!(matches!(err, Error::Lifecycle { from: "destroyed", .. }));
    }
}
