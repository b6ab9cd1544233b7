//! Attribute rules controlling read, write, hidden and locked flags per path.
//!
//! Patterns use the file manager's delimited form, `/body/flags`, so the
//! same string can be handed to the external runtime unchanged. Rules are
//! compiled into an [`AttributeSet`] when a root is assembled; a pattern that
//! fails to compile rejects the root there instead of at first use.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RootError};

/// A per-path permission attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    /// The entry can be read.
    Read,
    /// The entry can be written.
    Write,
    /// The entry is not listed.
    Hidden,
    /// The entry cannot be removed or renamed.
    Locked,
}

impl Attribute {
    /// All attributes, in the order the runtime queries them.
    pub const ALL: [Attribute; 4] = [
        Attribute::Read,
        Attribute::Write,
        Attribute::Hidden,
        Attribute::Locked,
    ];

    /// The attribute's wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Read => "read",
            Attribute::Write => "write",
            Attribute::Hidden => "hidden",
            Attribute::Locked => "locked",
        }
    }

    /// Whether this is one of the access attributes (read or write).
    pub fn is_access(&self) -> bool {
        matches!(self, Attribute::Read | Attribute::Write)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = RootError;

    fn from_str(s: &str) -> Result<Self> {
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.as_str() == s)
            .ok_or_else(|| RootError::UnknownAttribute(s.to_string()))
    }
}

/// A pattern-matched policy entry.
///
/// Unset flags carry no constraint; they are not the same as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributeRule {
    /// Delimited regular expression matched against the root-relative path.
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl AttributeRule {
    /// Create a rule with no flags set.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    /// Create a rule that hides matching entries and denies access to them.
    pub fn hidden(pattern: impl Into<String>) -> Self {
        Self::new(pattern)
            .with(Attribute::Read, false)
            .with(Attribute::Write, false)
            .with(Attribute::Hidden, true)
            .with(Attribute::Locked, false)
    }

    /// Set one flag, builder style.
    pub fn with(mut self, attribute: Attribute, value: bool) -> Self {
        *self.slot(attribute) = Some(value);
        self
    }

    /// The value this rule declares for `attribute`, if any.
    pub fn get(&self, attribute: Attribute) -> Option<bool> {
        match attribute {
            Attribute::Read => self.read,
            Attribute::Write => self.write,
            Attribute::Hidden => self.hidden,
            Attribute::Locked => self.locked,
        }
    }

    fn slot(&mut self, attribute: Attribute) -> &mut Option<bool> {
        match attribute {
            Attribute::Read => &mut self.read,
            Attribute::Write => &mut self.write,
            Attribute::Hidden => &mut self.hidden,
            Attribute::Locked => &mut self.locked,
        }
    }

    /// Compile the rule's pattern.
    pub fn compile(&self) -> Result<CompiledRule> {
        Ok(CompiledRule {
            pattern: PathPattern::parse(&self.pattern)?,
            rule: self.clone(),
        })
    }
}

/// A compiled delimited regular expression.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
}

impl PathPattern {
    /// Parse a `/body/flags` pattern.
    ///
    /// The delimiter is the first character and may be any punctuation other
    /// than a backslash; bracket delimiters close with their counterpart.
    /// Supported flags are `i`, `m`, `s`, `x`, `u` and `U`.
    pub fn parse(source: &str) -> Result<Self> {
        let delimiter = source
            .chars()
            .next()
            .ok_or_else(|| RootError::malformed(source, "empty pattern"))?;
        if delimiter.is_alphanumeric() || delimiter.is_whitespace() || delimiter == '\\' {
            return Err(RootError::malformed(
                source,
                format!("{delimiter:?} is not a valid delimiter"),
            ));
        }

        let closing = match delimiter {
            '(' => ')',
            '[' => ']',
            '{' => '}',
            '<' => '>',
            other => other,
        };

        let body_start = delimiter.len_utf8();
        let body_end = source
            .rfind(closing)
            .filter(|&end| end >= body_start)
            .ok_or_else(|| RootError::malformed(source, "missing closing delimiter"))?;

        let body = &source[body_start..body_end];
        let flags = &source[body_end + closing.len_utf8()..];

        let mut builder = RegexBuilder::new(body);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                'U' => builder.swap_greed(true),
                'u' => builder.unicode(true),
                other => {
                    return Err(RootError::malformed(
                        source,
                        format!("unsupported flag {other:?}"),
                    ))
                }
            };
        }

        let regex = builder
            .build()
            .map_err(|e| RootError::malformed(source, e.to_string()))?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether `path` matches.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// An attribute rule whose pattern has been compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pattern: PathPattern,
    rule: AttributeRule,
}

impl CompiledRule {
    /// The source rule.
    pub fn rule(&self) -> &AttributeRule {
        &self.rule
    }

    /// The value this rule gives `attribute` for `path`, if it matches and
    /// declares one.
    pub fn evaluate(&self, attribute: Attribute, path: &str) -> Option<bool> {
        let value = self.rule.get(attribute)?;
        self.pattern.is_match(path).then_some(value)
    }
}

/// An ordered, compiled list of attribute rules.
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    rules: Vec<CompiledRule>,
}

impl AttributeSet {
    /// Compile every rule, failing on the first malformed pattern.
    pub fn compile(rules: &[AttributeRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(AttributeRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve `attribute` for `path`.
    ///
    /// Rules are evaluated in order and the last matching rule that declares
    /// the attribute wins. `None` means no rule constrains it.
    pub fn resolve(&self, attribute: Attribute, path: &str) -> Option<bool> {
        self.rules
            .iter()
            .filter_map(|rule| rule.evaluate(attribute, path))
            .last()
    }
}
