//! # finderbridge root model
//!
//! Pure configuration model for the storage roots exposed to an external
//! file-manager runtime.
//!
//! ## Overview
//!
//! - **Attribute rules**: pattern-matched read/write/hidden/locked flags
//! - **Default policy**: the baseline every root is merged against
//! - **Merge**: field-by-field combination of policy and driver configuration
//! - **Namespace**: qualification of driver names into instantiable references
//!
//! Nothing in this crate performs I/O.
//!
//! ## Example Usage
//!
//! ```rust
//! use roots::{AttributeRule, ConfigMerger, DefaultPolicy, PartialConfiguration};
//!
//! let policy = DefaultPolicy::builtin();
//! let mut home = PartialConfiguration::for_driver("HomeDriver");
//! home.push_attribute(AttributeRule::hidden("/^secret/"));
//!
//! let root = ConfigMerger::default()
//!     .merge(&policy.defaults(), &home)
//!     .unwrap();
//! assert_eq!(root.attributes.len(), 6);
//! assert_eq!(root.driver, "finderbridge::drivers::HomeDriver");
//! ```
//!
//! ## Modules
//!
//! - [`attributes`]: attribute rules and compiled pattern sets
//! - [`command`]: file manager command names
//! - [`root`]: partial, template and final root configurations
//! - [`policy`]: the default policy
//! - [`merge`]: the configuration merger
//! - [`namespace`]: driver reference qualification
//! - [`error`]: error types

pub mod attributes;
pub mod command;
pub mod error;
pub mod merge;
pub mod namespace;
pub mod policy;
pub mod root;

pub use attributes::{Attribute, AttributeRule, AttributeSet, CompiledRule, PathPattern};
pub use command::Command;
pub use error::{Result, RootError};
pub use merge::ConfigMerger;
pub use namespace::{DriverNamespace, DEFAULT_DRIVER_NAMESPACE};
pub use policy::DefaultPolicy;
pub use root::{
    ConnectorRef, PartialConfiguration, PluginContext, RootConfiguration, RootTemplate,
    UploadOrder, UploadPolicy,
};
