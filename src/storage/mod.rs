//! # Storage Layer
//!
//! Persistence for lanes.
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Clients | SQLite | `.lanes/lanes.db` |
//! | Config | TOML | `.lanes/config.toml` |
//!
//! ## Concurrency Safety
//!
//! Each command opens its own [`ClientStore`] session. Moves run inside a
//! [`StoreTx`], an immediate SQLite transaction, so two processes moving
//! clients at once never compute from the same stale snapshot.

mod config;
mod project;
mod store;

pub use config::{BoardConfig, Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig};
pub use project::{Project, ProjectError};
pub use store::{ClientStore, StoreError, StoreTx};
