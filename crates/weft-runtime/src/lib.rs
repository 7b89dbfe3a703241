#![forbid(unsafe_code)]

//! Runtime: component lifecycle, patch scheduling and event routing.
//!
//! # Role in weft
//! `weft-runtime` owns every live component and controller. It drives the
//! configuration pipeline from `weft-core` through creation, batches tree
//! mutations from `weft-render` into ordered commits, and routes events to
//! handlers resolved along the controller chain.
//!
//! # Primary responsibilities
//! - **Runtime**: registry, creation order, mount state, destroy.
//! - **PatchScheduler**: one in-flight commit per instance, coalesced
//!   requests, every waiter sees its batch's result.
//! - **Dispatch**: delegated DOM listeners, application events, a queue
//!   for events raised while dispatching.
//! - **Resolution**: lazy, cached binding of named handlers to the nearest
//!   controller that defines them.
//!
//! # Example
//!
//! ```rust,ignore
//! let (rt, renderer) = Runtime::headless(RuntimeConfig::default());
//! let id = rt.create(CreateOptions::new().config("cls", "panel"), Panel::new)?;
//! let mounted = rt.spawn({
//!     let rt = rt.clone();
//!     async move { rt.mount(id).await }
//! })?;
//! rt.run_until_stalled()?;
//! ```

pub mod component;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod executor;
pub mod handler;
pub mod lifecycle;
mod registry;
pub mod resolver;
pub mod runtime;
pub mod scheduler;

pub use component::{AsAny, Component, ComponentCore, CreateOptions};
#[cfg(feature = "config-files")]
pub use config::ConfigFileError;
pub use config::RuntimeConfig;
pub use controller::{Controller, ControllerCore};
pub use dispatch::DispatchReport;
pub use executor::{Executor, Task};
pub use handler::{
    Callback, HandlerContext, HandlerFn, HandlerRef, HandlerScope, HandlerTable, ListenerScope,
    ListenerSpec,
};
pub use lifecycle::Lifecycle;
pub use registry::ListenerKind;
pub use resolver::{BindingState, BindingStatus, BoundHandler, HandlerResolver, Resolution};
pub use runtime::{Runtime, RuntimeHandle};
pub use scheduler::{PatchScheduler, PatchSource, Phase, UpdateFuture};
