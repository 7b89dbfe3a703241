#![forbid(unsafe_code)]

//! Error taxonomy.
//!
//! | Error                        | Recovery                                   |
//! |------------------------------|--------------------------------------------|
//! | [`ValidationRejected`]       | local: previous value kept                 |
//! | [`ReentrantMutationError`]   | none: the offending call path stops        |
//! | [`PatchCommitError`]         | delivered to every waiter of the batch     |
//! | [`DestroyedInstanceError`]   | none: use-after-destroy is a caller bug    |
//! | [`HandlerResolutionFailure`] | logged, listener left inert                |
//!
//! [`Error`] wraps the non-recoverable kinds plus structural failures of the
//! tree and registry so call sites can propagate with `?`.

use crate::id::ComponentId;
use thiserror::Error;

/// A before-hook or legal-value check declined a candidate value.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("value rejected for `{property}`: {reason}")]
pub struct ValidationRejected {
    pub property: String,
    pub reason: String,
}

impl ValidationRejected {
    pub fn new(property: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            reason: reason.into(),
        }
    }
}

/// A before-hook tried to set the property it is intercepting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("reentrant mutation of `{property}` on {owner}")]
pub struct ReentrantMutationError {
    pub owner: String,
    pub property: String,
}

/// An operation reached an instance after `destroy()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{operation}` called on destroyed instance {instance}")]
pub struct DestroyedInstanceError {
    pub instance: String,
    pub operation: String,
}

impl DestroyedInstanceError {
    pub fn new(instance: impl ToString, operation: impl Into<String>) -> Self {
        Self {
            instance: instance.to_string(),
            operation: operation.into(),
        }
    }
}

/// The renderer failed to apply a batch, or the batch could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("patch commit #{sequence} for {instance} failed: {message}")]
pub struct PatchCommitError {
    pub instance: ComponentId,
    pub sequence: u64,
    pub message: String,
}

/// No scope in the ancestry defines the referenced handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown handler `{handler}` for `{event}` on {component}")]
pub struct HandlerResolutionFailure {
    pub component: ComponentId,
    pub event: String,
    pub handler: String,
}

/// Failure reported by the renderer collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("renderer: {message}")]
pub struct RendererError {
    pub message: String,
}

impl RendererError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Umbrella error for fallible weft operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationRejected),

    #[error(transparent)]
    Reentrant(#[from] ReentrantMutationError),

    #[error(transparent)]
    Destroyed(#[from] DestroyedInstanceError),

    #[error(transparent)]
    PatchCommit(#[from] PatchCommitError),

    #[error(transparent)]
    HandlerResolution(#[from] HandlerResolutionFailure),

    #[error(transparent)]
    Renderer(#[from] RendererError),

    #[error("unknown config property `{property}` on {owner}")]
    UnknownProperty { owner: String, property: String },

    #[error("unknown instance {0}")]
    UnknownInstance(String),

    #[error("{instance} is not a `{expected}`")]
    TypeMismatch {
        instance: String,
        expected: &'static str,
    },

    #[error("{instance} is busy: {operation} re-entered while it is running")]
    Busy { instance: String, operation: String },

    #[error("invalid lifecycle transition for {instance}: {from} -> {to}")]
    Lifecycle {
        instance: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("no node flagged `{0}`")]
    MissingFlag(String),

    #[error("flag `{0}` is already used in this tree")]
    DuplicateFlag(String),

    #[error("splice range {start}..{end} out of bounds for {len} children")]
    SpliceOutOfRange { start: usize, end: usize, len: usize },

    #[error("scope does not define handler `{0}`")]
    UnknownHandler(String),

    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    #[error("event queue is full ({0} pending)")]
    EventQueueFull(usize),

    #[error("executor is shut down")]
    ExecutorShutdown,

    #[error("runtime has been dropped")]
    RuntimeGone,
}

impl Error {
    /// True for errors raised by touching a destroyed instance.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        matches!(self, Self::Destroyed(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
