#![forbid(unsafe_code)]

//! Render layer: virtual trees, patch batches and the renderer boundary.
//!
//! # Role in weft
//! `weft-render` owns the in-memory markup model. Components mutate a
//! [`VirtualTree`]; the runtime's scheduler turns the accumulated
//! [`TreeMutation`] log into a [`PatchBatch`] and hands it to a
//! [`Renderer`].
//!
//! # Primary responsibilities
//! - **VNode**: owned node with a stable [`NodeKey`].
//! - **VirtualTree**: flag-addressed mutation with a lazily rebuilt index.
//! - **Renderer**: commit / measure / scroll boundary, plus
//!   [`HeadlessRenderer`] for tests and embedding.

pub mod batch;
pub mod headless;
pub mod renderer;
pub mod tree;
pub mod vnode;

pub use batch::{CommitAck, PatchBatch};
pub use headless::HeadlessRenderer;
pub use renderer::{Axis, Measurement, Renderer};
pub use tree::{Target, TreeMutation, VirtualTree};
pub use vnode::{NodeKey, VNode, find_by_flag, find_by_flag_mut, find_by_key};
