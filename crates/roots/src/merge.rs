//! Field-by-field merge of driver configuration with the default policy.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::attributes::AttributeSet;
use crate::error::{Result, RootError};
use crate::namespace::DriverNamespace;
use crate::root::{
    PartialConfiguration, RootConfiguration, RootTemplate, UploadPolicy, RESERVED_KEYS,
};

/// Merges driver-declared configuration into root configurations.
///
/// Merging is pure: inputs are borrowed and never modified.
#[derive(Debug, Clone, Default)]
pub struct ConfigMerger {
    namespace: DriverNamespace,
}

impl ConfigMerger {
    pub fn new(namespace: DriverNamespace) -> Self {
        Self { namespace }
    }

    /// The namespace driver names are qualified with.
    pub fn namespace(&self) -> &DriverNamespace {
        &self.namespace
    }

    /// Merge `overrides` over `defaults`.
    ///
    /// Declared fields of `overrides` win. Attribute rules are concatenated,
    /// defaults first. Fails with [`RootError::InvalidConfiguration`] when
    /// `overrides` declares no driver, and with
    /// [`RootError::MalformedAttributePattern`] when any resulting rule does
    /// not compile.
    pub fn merge(
        &self,
        defaults: &RootTemplate,
        overrides: &PartialConfiguration,
    ) -> Result<RootConfiguration> {
        let driver = self.qualified_driver(overrides)?;

        let mut attributes = defaults.attributes.clone();
        if let Some(extra) = &overrides.attributes {
            attributes.extend(extra.iter().cloned());
        }
        AttributeSet::compile(&attributes)?;

        let upload = UploadPolicy {
            overwrite: overrides.upload_overwrite.unwrap_or(defaults.upload.overwrite),
            allow: overrides
                .upload_allow
                .clone()
                .unwrap_or_else(|| defaults.upload.allow.clone()),
            deny: overrides
                .upload_deny
                .clone()
                .unwrap_or_else(|| defaults.upload.deny.clone()),
            order: overrides
                .upload_order
                .clone()
                .unwrap_or_else(|| defaults.upload.order.clone()),
        };

        Ok(RootConfiguration {
            driver,
            path: overrides.path.clone(),
            url: overrides.url.clone(),
            alias: overrides.alias.clone(),
            upload,
            disabled: overrides
                .disabled
                .clone()
                .unwrap_or_else(|| defaults.disabled.clone()),
            attributes,
            plugin: overrides.plugin.clone(),
            options: passthrough_options(&overrides.options),
        })
    }

    /// Turn a raw driver configuration into a root without applying any
    /// defaults.
    ///
    /// The driver is still required and qualified, and its rules must still
    /// compile; unset fields take empty values.
    pub fn pass_through(&self, raw: &PartialConfiguration) -> Result<RootConfiguration> {
        let driver = self.qualified_driver(raw)?;

        let attributes = raw.attributes.clone().unwrap_or_default();
        AttributeSet::compile(&attributes)?;

        Ok(RootConfiguration {
            driver,
            path: raw.path.clone(),
            url: raw.url.clone(),
            alias: raw.alias.clone(),
            upload: UploadPolicy {
                overwrite: raw.upload_overwrite.unwrap_or(false),
                allow: raw.upload_allow.clone().unwrap_or_default(),
                deny: raw.upload_deny.clone().unwrap_or_default(),
                order: raw.upload_order.clone().unwrap_or_default(),
            },
            disabled: raw.disabled.clone().unwrap_or_default(),
            attributes,
            plugin: raw.plugin.clone(),
            options: passthrough_options(&raw.options),
        })
    }

    fn qualified_driver(&self, cfg: &PartialConfiguration) -> Result<String> {
        match cfg.driver.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(self.namespace.qualify(name)),
            _ => Err(RootError::InvalidConfiguration),
        }
    }
}

fn passthrough_options(options: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    options
        .iter()
        .filter(|(key, _)| {
            let reserved = RESERVED_KEYS.contains(&key.as_str());
            if reserved {
                tracing::debug!(key = %key, "Dropping option that shadows a root field");
            }
            !reserved
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
