#![forbid(unsafe_code)]

//! Widgets: components built on the weft runtime.
//!
//! # Role in weft
//! `weft-widgets` is the first consumer of `weft-runtime`. Its components
//! exercise the declared-config pipeline, owned sub-components, application
//! events between them and asynchronous renderer round-trips.
//!
//! # Primary responsibilities
//! - **Container**: a `div` of child component placeholders.
//! - **TimeAxis**: hour rows between a start and end time; fires `change`.
//! - **WeekView**: a 21-day sliding window of day columns with a header
//!   row, wheel-driven paging and event layout.
//! - **EventStore** and **DayNameFormatter**: the data and formatting
//!   boundaries the week view renders through.

pub mod container;
pub mod event_store;
pub mod formatter;
pub mod time_axis;
pub mod week_view;

pub use container::Container;
pub use event_store::{CalendarEvent, EventStore};
pub use formatter::{DayNameFormat, DayNameFormatter, EnglishDayNames};
pub use time_axis::{TimeAxis, TimeAxisMetrics};
pub use week_view::WeekView;
