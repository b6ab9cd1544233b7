//! Root configuration types.
//!
//! A driver declares a [`PartialConfiguration`]; the default policy supplies
//! a [`RootTemplate`]; merging the two yields a [`RootConfiguration`], which
//! is what the external runtime receives. Serialized keys follow the
//! runtime's camelCase option names.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::AttributeRule;
use crate::command::Command;

/// Which upload list the runtime consults, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadOrder {
    Allow,
    Deny,
}

/// Upload rules for one root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    /// Replace existing files instead of renaming the upload.
    #[serde(rename = "uploadOverwrite")]
    pub overwrite: bool,
    /// MIME types or top-level categories accepted.
    #[serde(rename = "uploadAllow")]
    pub allow: Vec<String>,
    /// MIME types or top-level categories rejected.
    #[serde(rename = "uploadDeny")]
    pub deny: Vec<String>,
    #[serde(rename = "uploadOrder")]
    pub order: Vec<UploadOrder>,
}

/// Opaque, non-owning handle back to the connector that produced a root.
///
/// The handle never keeps its target alive; drivers upgrade it while the
/// request is being assembled.
#[derive(Clone)]
pub struct ConnectorRef(Weak<dyn Any + Send + Sync>);

impl ConnectorRef {
    /// Create a handle pointing at `target`.
    pub fn new<T: Any + Send + Sync>(target: &Arc<T>) -> Self {
        let weak: Weak<T> = Arc::downgrade(target);
        Self(weak)
    }

    /// A handle that points at nothing.
    pub fn detached() -> Self {
        let weak: Weak<()> = Weak::new();
        Self(weak)
    }

    /// Borrow the target as `T`, if it is still alive and of that type.
    pub fn upgrade<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.0.upgrade()?.downcast::<T>().ok()
    }

    /// Whether the target has been dropped.
    pub fn is_detached(&self) -> bool {
        self.0.strong_count() == 0
    }
}

impl Default for ConnectorRef {
    fn default() -> Self {
        Self::detached()
    }
}

impl PartialEq for ConnectorRef {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ConnectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorRef")
            .field("detached", &self.is_detached())
            .finish()
    }
}

/// Metadata identifying the driver that produced a root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginContext {
    #[serde(rename = "driverName")]
    pub driver_name: String,
    #[serde(skip)]
    pub connector: ConnectorRef,
}

impl PluginContext {
    pub fn new(driver_name: impl Into<String>, connector: ConnectorRef) -> Self {
        Self {
            driver_name: driver_name.into(),
            connector,
        }
    }
}

/// Configuration declared by a driver. Absent fields inherit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialConfiguration {
    /// Driver type name. A configuration without one is unusable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(rename = "URL", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_overwrite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_allow: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_deny: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_order: Option<Vec<UploadOrder>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Vec<Command>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<AttributeRule>>,
    #[serde(skip)]
    pub plugin: Option<PluginContext>,
    /// Extra runtime options passed through as-is.
    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

impl PartialConfiguration {
    /// A configuration declaring only its driver type.
    pub fn for_driver(driver: impl Into<String>) -> Self {
        Self {
            driver: Some(driver.into()),
            ..Self::default()
        }
    }

    /// Append an attribute rule.
    pub fn push_attribute(&mut self, rule: AttributeRule) {
        self.attributes.get_or_insert_with(Vec::new).push(rule);
    }
}

/// Baseline settings every root is merged against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootTemplate {
    #[serde(flatten)]
    pub upload: UploadPolicy,
    pub disabled: Vec<Command>,
    pub attributes: Vec<AttributeRule>,
}

/// The fully merged configuration of one storage root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootConfiguration {
    /// Qualified driver reference.
    pub driver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(rename = "URL", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(flatten)]
    pub upload: UploadPolicy,
    pub disabled: Vec<Command>,
    pub attributes: Vec<AttributeRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<PluginContext>,
    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

impl RootConfiguration {
    /// The name of the driver that produced this root.
    pub fn driver_name(&self) -> Option<&str> {
        self.plugin.as_ref().map(|p| p.driver_name.as_str())
    }
}

/// Top-level keys of a serialized root. Extra options may not shadow them.
pub const RESERVED_KEYS: &[&str] = &[
    "driver",
    "path",
    "URL",
    "alias",
    "uploadOverwrite",
    "uploadAllow",
    "uploadDeny",
    "uploadOrder",
    "disabled",
    "attributes",
    "plugin",
];
