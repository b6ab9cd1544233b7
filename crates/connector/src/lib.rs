//! # finderbridge connector
//!
//! Builds the storage roots an external file-manager runtime exposes for one
//! learning-platform request.
//!
//! ## Overview
//!
//! - **Request context**: identities, path table and collaborator traits
//! - **Drivers**: pluggable root producers and the registry naming them
//! - **Connector**: per-request orchestration, merging every driver's
//!   configuration over the default policy
//! - **Hooks**: the seam fired after upload, rm and mkdir
//! - **Configuration**: TOML settings for the standalone binary
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Connector                         │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌────────────────┐   ┌──────────────┐   ┌────────────┐  │
//! │  │ DriverRegistry │──▶│ ConfigMerger │──▶│ Operations │  │
//! │  └────────────────┘   └──────────────┘   └────────────┘  │
//! │          │                   ▲                           │
//! │          ▼                   │                           │
//! │  ┌────────────────┐   ┌──────────────┐                   │
//! │  │    Drivers     │   │DefaultPolicy │                   │
//! │  └────────────────┘   └──────────────┘                   │
//! │          │ Weak                                          │
//! │          ▼                                               │
//! │  ┌────────────────┐                                      │
//! │  │ RequestContext │                                      │
//! │  └────────────────┘                                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use connector::context::{
//!     IdentityTranslator, NoEntities, PathTable, RequestContext, RoleSet, StaticUrlGenerator,
//!     User, PATH_TEMP, PATH_USERS,
//! };
//! use connector::{Connector, ConnectorSettings};
//!
//! let paths = PathTable::new()
//!     .with(PATH_TEMP, "/tmp/lms")
//!     .with(PATH_USERS, "/srv/lms/users");
//! let context = RequestContext::builder(paths)
//!     .user(Some(User { id: 1, username: "admin".to_string() }))
//!     .url_generator(Arc::new(StaticUrlGenerator::new("https://lms.example")))
//!     .translator(Arc::new(IdentityTranslator))
//!     .security(Arc::new(RoleSet::default()))
//!     .entities(Arc::new(NoEntities))
//!     .build()?;
//!
//! let mut connector = Connector::new(Arc::new(context), ConnectorSettings::default())?;
//! let operations = connector.get_operations();
//!
//! // Without a course only the user roots survive.
//! assert_eq!(operations.roots.len(), 2);
//! # Ok::<(), connector::ConnectorError>(())
//! ```
//!
//! ## Modules
//!
//! - [`context`]: request context and collaborator traits
//! - [`drivers`]: driver interface, built-in drivers and registry
//! - [`connector`](mod@connector): the per-request orchestrator
//! - [`hooks`]: command hooks and the bind table
//! - [`access`]: the dot-file access predicate
//! - [`config`]: TOML configuration
//! - [`error`]: error types

pub mod access;
pub mod config;
pub mod connector;
pub mod context;
pub mod drivers;
pub mod error;
pub mod hooks;

// Re-export the root model for convenience
pub use roots;

pub use config::{Config, ConfigError};
pub use connector::{Connector, ConnectorSettings, Operations, RootAssembly, RootFailure};
pub use context::{PathTable, RequestContext};
pub use drivers::{Driver, DriverKind, DriverRegistry};
pub use error::{ConnectorError, DriverError, Result};
pub use hooks::{BindTable, CommandEvent, CommandHook, NoopCommandHook};
