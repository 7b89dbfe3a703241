#![forbid(unsafe_code)]

//! Core: identifiers, reactive configuration, events and errors.
//!
//! # Role in weft
//! `weft-core` is the leaf layer. It owns the declared-property machinery
//! every component and controller is built on, the event model the
//! dispatcher consumes, and the error taxonomy shared by all crates.
//!
//! # Primary responsibilities
//! - **ConfigStore**: per-instance property values behind a static
//!   descriptor table with before/after interception.
//! - **DomEvent**: propagation path plus payload for delegated listeners.
//! - **Selector**: the small selector language used for delegation.
//! - **Error**: `thiserror` types for each failure kind and a `Result` alias.
//!
//! # How it fits in the system
//! `weft-render` builds virtual trees on top of these ids and errors;
//! `weft-runtime` drives the config pipeline from component lifecycles and
//! routes [`DomEvent`]s through handler resolution.

pub mod config;
pub mod error;
pub mod event;
pub mod id;
pub mod selector;
pub mod value;

pub use config::{
    AfterSet, BeforeGet, BeforeSet, ConfigDescriptor, ConfigSchema, ConfigStore, Configurable,
    RejectPolicy, SetOutcome,
};
pub use error::{
    DestroyedInstanceError, Error, HandlerResolutionFailure, PatchCommitError,
    ReentrantMutationError, RendererError, Result, ValidationRejected,
};
pub use event::{DomEvent, EventData, PathNode};
pub use id::{ComponentId, ControllerId, IdAllocator};
pub use selector::Selector;
pub use value::ConfigValue;
