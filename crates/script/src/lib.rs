//! The native behavior host and its TOML configuration.
//!
//! A configuration file declares message kinds, behaviors and node types;
//! behaviors are bound to functions from the built-in [`Library`]. The
//! engine only ever sees the resulting [`TypeRegistry`](voxide_engine::TypeRegistry)
//! and a [`NativeHost`] it can call back into.

mod config;
mod library;

pub use config::{load_path, load_str, ConfigError};
pub use library::{BehaviorFn, Library, NativeHost, MAX_POWER};
