#![forbid(unsafe_code)]

//! weft public facade crate.
//!
//! Re-exports the types an application needs from the internal crates and
//! offers a prelude for day-to-day use.
//!
//! ```rust,ignore
//! use weft::prelude::*;
//!
//! weft::logging::init();
//! let (rt, renderer) = Runtime::headless(RuntimeConfig::default());
//! let view = rt.create(
//!     CreateOptions::new().config("weekStartDay", 1),
//!     WeekView::new,
//! )?;
//! rt.run_until(rt.mount(view))??;
//! ```

pub mod logging;

// --- Core re-exports -------------------------------------------------------

pub use weft_core::{
    ComponentId, ConfigDescriptor, ConfigSchema, ConfigStore, ConfigValue, Configurable,
    ControllerId, DestroyedInstanceError, DomEvent, Error, EventData, PathNode, RejectPolicy,
    Result, Selector, SetOutcome, ValidationRejected,
};

// --- Render re-exports -----------------------------------------------------

pub use weft_render::{
    Axis, CommitAck, HeadlessRenderer, Measurement, PatchBatch, Renderer, Target, VNode,
    VirtualTree,
};

// --- Runtime re-exports ----------------------------------------------------

pub use weft_runtime::{
    Component, ComponentCore, Controller, ControllerCore, CreateOptions, DispatchReport,
    HandlerContext, HandlerScope, HandlerTable, Lifecycle, ListenerKind, ListenerScope,
    ListenerSpec, Runtime, RuntimeConfig, RuntimeHandle, UpdateFuture,
};

// --- Widget re-exports -----------------------------------------------------

#[cfg(feature = "widgets")]
pub use weft_widgets::{
    CalendarEvent, Container, DayNameFormat, DayNameFormatter, EnglishDayNames, EventStore,
    TimeAxis, TimeAxisMetrics, WeekView,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Component, ComponentCore, ComponentId, ConfigValue, Configurable, Controller,
        ControllerCore, CreateOptions, DomEvent, Error, EventData, HandlerContext, HandlerScope,
        HandlerTable, ListenerScope, ListenerSpec, Result, Runtime, RuntimeConfig, VNode,
    };

    #[cfg(feature = "widgets")]
    pub use crate::{CalendarEvent, Container, EventStore, WeekView};

    pub use crate::{core, render, runtime};

    #[cfg(feature = "widgets")]
    pub use crate::widgets;
}

pub use weft_core as core;
pub use weft_render as render;
pub use weft_runtime as runtime;
#[cfg(feature = "widgets")]
pub use weft_widgets as widgets;
