#![forbid(unsafe_code)]

//! The renderer boundary.
//!
//! The real display renderer lives outside weft. Everything the runtime
//! needs from it is here: apply a batch, measure a node, scroll a node.
//! All three are asynchronous and single-threaded, so the futures are
//! [`LocalBoxFuture`]s and own everything they need.

use crate::batch::{CommitAck, PatchBatch};
use futures::future::LocalBoxFuture;
use weft_core::RendererError;

/// Geometry of a rendered node, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurement {
    pub width: f64,
    pub height: f64,
    pub scroll_left: f64,
    pub scroll_top: f64,
    pub client_width: f64,
    pub client_height: f64,
}

impl Measurement {
    /// A node whose client box equals its outer box and is not scrolled.
    #[must_use]
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            client_width: width,
            client_height: height,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

/// Collaborator that reconciles patch batches with the real tree.
pub trait Renderer {
    /// Apply `batch`. Resolves once the renderer has acknowledged it.
    fn commit(&self, batch: PatchBatch) -> LocalBoxFuture<'static, Result<CommitAck, RendererError>>;

    /// Measure the node whose id is `node_id`.
    fn measure(&self, node_id: &str) -> LocalBoxFuture<'static, Result<Measurement, RendererError>>;

    /// Scroll the node whose id is `node_id` by `amount` along `axis`.
    fn scroll_by(
        &self,
        node_id: &str,
        axis: Axis,
        amount: f64,
    ) -> LocalBoxFuture<'static, Result<(), RendererError>>;
}
