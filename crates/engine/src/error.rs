//! Engine error types.

use crate::host::HostError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("behavior '{name}' failed: {source}")]
    Behavior {
        name: String,
        #[source]
        source: HostError,
    },

    #[error("message kind space exhausted (32 kinds including system kinds)")]
    KindSpaceExhausted,

    #[error("unknown behavior '{0}'")]
    UnknownBehavior(String),

    #[error("the default type cannot declare fields or behaviors")]
    DefaultTypeNotEmpty,

    #[error("no types registered")]
    NoTypes,
}
