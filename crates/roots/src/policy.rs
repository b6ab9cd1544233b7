//! Default policy every root is merged against.

use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeRule, AttributeSet};
use crate::command::Command;
use crate::error::Result;
use crate::root::{RootTemplate, UploadOrder, UploadPolicy};

/// MIME categories accepted for upload by default.
pub const DEFAULT_UPLOAD_ALLOW: &[&str] = &[
    "image",
    "audio",
    "video",
    "text/html",
    "text/csv",
    "application/pdf",
    "application/postscript",
    "application/vnd.oasis.opendocument.text",
];

/// Commands disabled by default.
pub const DEFAULT_DISABLED: &[Command] = &[
    Command::Duplicate,
    Command::Rename,
    Command::Mkdir,
    Command::Mkfile,
    Command::Copy,
    Command::Cut,
    Command::Paste,
    Command::Edit,
    Command::Extract,
    Command::Archive,
    Command::Help,
    Command::Resize,
    Command::Netmount,
];

/// Patterns hidden by default: server-side scripts, soft-deleted entries,
/// thumbnail caches and quarantine folders.
pub const DEFAULT_HIDDEN_PATTERNS: &[&str] = &[
    r"/\.(php|py|pl|sh|xml)$/i",
    "/_DELETED_/",
    "/.tmb/",
    "/.thumbs/",
    "/.quarantine/",
];

/// Baseline upload rules, disabled commands and attribute rules.
///
/// The policy is a plain value handed to the connector at construction, so
/// callers can substitute their own without touching shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultPolicy {
    pub upload_overwrite: bool,
    pub upload_allow: Vec<String>,
    pub upload_deny: Vec<String>,
    pub upload_order: Vec<UploadOrder>,
    pub disabled: Vec<Command>,
    pub attributes: Vec<AttributeRule>,
}

impl DefaultPolicy {
    /// The built-in baseline.
    pub fn builtin() -> Self {
        Self {
            upload_overwrite: false,
            upload_allow: DEFAULT_UPLOAD_ALLOW.iter().map(|s| s.to_string()).collect(),
            upload_deny: Vec::new(),
            upload_order: vec![UploadOrder::Allow],
            disabled: DEFAULT_DISABLED.to_vec(),
            attributes: DEFAULT_HIDDEN_PATTERNS
                .iter()
                .map(|pattern| AttributeRule::hidden(*pattern))
                .collect(),
        }
    }

    /// A policy that imposes nothing.
    pub fn permissive() -> Self {
        Self {
            upload_overwrite: false,
            upload_allow: Vec::new(),
            upload_deny: Vec::new(),
            upload_order: Vec::new(),
            disabled: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// A fresh template. Every call returns an independent copy.
    pub fn defaults(&self) -> RootTemplate {
        RootTemplate {
            upload: UploadPolicy {
                overwrite: self.upload_overwrite,
                allow: self.upload_allow.clone(),
                deny: self.upload_deny.clone(),
                order: self.upload_order.clone(),
            },
            disabled: self.disabled.clone(),
            attributes: self.attributes.clone(),
        }
    }

    /// Check that every attribute pattern compiles.
    pub fn validate(&self) -> Result<()> {
        AttributeSet::compile(&self.attributes).map(|_| ())
    }
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attribute;

    #[test]
    fn test_builtin_baseline() {
        let template = DefaultPolicy::builtin().defaults();

        assert!(!template.upload.overwrite);
        assert_eq!(template.upload.allow.len(), 8);
        assert!(template.upload.deny.is_empty());
        assert_eq!(template.upload.order, vec![UploadOrder::Allow]);
        assert_eq!(template.disabled.len(), 13);
        assert_eq!(template.attributes.len(), 5);
        assert!(template
            .attributes
            .iter()
            .all(|rule| rule.hidden == Some(true) && rule.read == Some(false)));
    }

    #[test]
    fn test_builtin_commands_are_unique() {
        let mut disabled = DEFAULT_DISABLED.to_vec();
        disabled.sort();
        disabled.dedup();
        assert_eq!(disabled.len(), DEFAULT_DISABLED.len());
        assert!(!disabled.contains(&Command::Upload));
        assert!(!disabled.contains(&Command::Rm));
    }

    #[test]
    fn test_defaults_are_independent() {
        let policy = DefaultPolicy::builtin();
        let mut first = policy.defaults();
        let second = policy.defaults();

        first.upload.overwrite = true;
        first.upload.allow.clear();
        first.disabled.push(Command::Upload);
        first.attributes[0].hidden = Some(false);
        first.attributes.push(AttributeRule::hidden("/x/"));

        assert_ne!(first, second);
        assert_eq!(second, policy.defaults());
        assert_eq!(second.attributes.len(), 5);
        assert_eq!(second.attributes[0].get(Attribute::Hidden), Some(true));
    }

    #[test]
    fn test_builtin_validates() {
        assert!(DefaultPolicy::builtin().validate().is_ok());
    }

    #[test]
    fn test_builtin_hides_scripts_and_trash() {
        let policy = DefaultPolicy::builtin();
        let set = AttributeSet::compile(&policy.attributes).unwrap();

        assert_eq!(set.resolve(Attribute::Hidden, "/exploit.PHP"), Some(true));
        assert_eq!(set.resolve(Attribute::Hidden, "/old_DELETED_12.doc"), Some(true));
        assert_eq!(set.resolve(Attribute::Hidden, "/images/.tmb/a.png"), Some(true));
        assert_eq!(set.resolve(Attribute::Hidden, "/syllabus.pdf"), None);
    }

    #[test]
    fn test_bad_policy_pattern() {
        let mut policy = DefaultPolicy::builtin();
        policy.attributes.push(AttributeRule::hidden("no-delimiters"));
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_policy() {
        let policy: DefaultPolicy =
            serde_json::from_value(serde_json::json!({ "upload_overwrite": true })).unwrap();
        assert!(policy.upload_overwrite);
        assert_eq!(policy.disabled.len(), 13);
    }
}
