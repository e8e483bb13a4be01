//! The voxide simulation engine: typed nodes, message passing and the
//! per-tick fixpoint scheduler.
//!
//! The engine is single threaded and owns the world exclusively. Behaviors
//! are opaque callables evaluated through the [`BehaviorHost`] trait; the
//! engine hands each one a [`Context`] and never looks inside.

mod error;
pub mod format;
mod host;
mod printer;
mod queue;
mod registry;
mod tick;
mod world;

#[cfg(test)]
mod tests;

pub use error::EngineError;
pub use host::{BehaviorHost, Context, HostError, Peer};
pub use printer::{BufferPrinter, Printer, StdoutPrinter};
pub use queue::{Queue, QueueItem};
pub use registry::{Behavior, Field, HostRef, MessageKind, NodeType, TypeRegistry};
pub use tick::LogLevel;
pub use world::{World, WorldStats};
