//! Versioned output templates and generation-metadata placeholders.
//!
//! Every template body carries four metadata tokens plus a body slot:
//!
//! | Token                          | Replaced with                      |
//! |--------------------------------|------------------------------------|
//! | `{{sprocket:name}}`            | tool name                          |
//! | `{{sprocket:version}}`         | `major.minor.patch`                |
//! | `{{sprocket:last_modified}}`   | render time, RFC 3339              |
//! | `{{sprocket:locked}}`          | `true` / `false`                   |
//! | `{{sprocket:body}}`            | strategy output                    |

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{EmitError, EmitResult};

pub const NAME_TOKEN: &str = "{{sprocket:name}}";
pub const VERSION_TOKEN: &str = "{{sprocket:version}}";
pub const LAST_MODIFIED_TOKEN: &str = "{{sprocket:last_modified}}";
pub const LOCKED_TOKEN: &str = "{{sprocket:locked}}";
pub const BODY_TOKEN: &str = "{{sprocket:body}}";

/// Output conventions, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateVariant {
    /// Free functions with positional arguments returning JSON rows.
    V1,
    /// Parameter and model structs.
    V2,
    /// Models plus a `StoredProcedure` impl with typed outputs.
    #[default]
    V3,
}

impl TemplateVariant {
    pub const ALL: [TemplateVariant; 3] = [TemplateVariant::V1, TemplateVariant::V2, TemplateVariant::V3];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateVariant::V1 => "v1",
            TemplateVariant::V2 => "v2",
            TemplateVariant::V3 => "v3",
        }
    }
}

impl fmt::Display for TemplateVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateVariant {
    type Err = EmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "flat" => Ok(TemplateVariant::V1),
            "v2" | "models" => Ok(TemplateVariant::V2),
            "v3" | "typed" => Ok(TemplateVariant::V3),
            _ => Err(EmitError::UnknownTemplate(s.to_string())),
        }
    }
}

/// A semantic version rendered as `major.minor.patch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// This crate's own version.
    pub fn current() -> Self {
        let part = |s: &str| s.parse().unwrap_or(0);
        Self::new(
            part(env!("CARGO_PKG_VERSION_MAJOR")),
            part(env!("CARGO_PKG_VERSION_MINOR")),
            part(env!("CARGO_PKG_VERSION_PATCH")),
        )
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Values substituted into the metadata tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationMetadata {
    pub tool_name: String,
    pub version: Version,
    pub last_modified: DateTime<Utc>,
    pub locked: bool,
}

impl GenerationMetadata {
    fn pairs(&self) -> [(&'static str, String); 4] {
        [
            (NAME_TOKEN, self.tool_name.clone()),
            (VERSION_TOKEN, self.version.to_string()),
            (
                LAST_MODIFIED_TOKEN,
                self.last_modified.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            (LOCKED_TOKEN, self.locked.to_string()),
        ]
    }
}

/// A named template body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: Cow<'static, str>,
    pub body: Cow<'static, str>,
}

impl Template {
    pub fn new(name: impl Into<Cow<'static, str>>, body: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }

    /// The built-in template for a variant.
    pub fn builtin(variant: TemplateVariant) -> Self {
        let body = match variant {
            TemplateVariant::V1 => V1_TEMPLATE,
            TemplateVariant::V2 => V2_TEMPLATE,
            TemplateVariant::V3 => V3_TEMPLATE,
        };
        Self::new(variant.as_str(), body)
    }

    /// Look up a built-in template by variant name.
    pub fn named(name: &str) -> EmitResult<Self> {
        name.parse().map(Self::builtin)
    }

    /// Substitute metadata and body into this template.
    ///
    /// Every metadata token and the body slot must appear at least once;
    /// a missing one is a template defect.
    pub fn render(&self, metadata: &GenerationMetadata, body: &str) -> EmitResult<String> {
        let mut out = self.body.to_string();
        for (token, value) in metadata.pairs() {
            out = replace_required(&self.name, out, token, &value)?;
        }
        replace_required(&self.name, out, BODY_TOKEN, body)
    }
}

fn replace_required(template: &str, text: String, token: &str, value: &str) -> EmitResult<String> {
    if !text.contains(token) {
        return Err(EmitError::MissingPlaceholder {
            template: template.to_string(),
            token: token.to_string(),
        });
    }
    Ok(text.replace(token, value))
}

/// Read the `locked` marker from a generated file's header comments.
pub fn header_locked(contents: &str) -> bool {
    contents
        .lines()
        .take_while(|line| line.starts_with("//"))
        .filter_map(|line| LOCKED_MARKER.captures(line))
        .any(|caps| caps[1].eq_ignore_ascii_case("true"))
}

static LOCKED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^//\s*locked:\s*(\w+)\s*$").unwrap());

const V1_TEMPLATE: &str = "\
// @generated by {{sprocket:name}} {{sprocket:version}} (flat)
// last_modified: {{sprocket:last_modified}}
// locked: {{sprocket:locked}}
//
// Set `locked: true` to keep hand edits; locked files are not regenerated.

{{sprocket:body}}";

const V2_TEMPLATE: &str = "\
// @generated by {{sprocket:name}} {{sprocket:version}} (models)
// last_modified: {{sprocket:last_modified}}
// locked: {{sprocket:locked}}
//
// Set `locked: true` to keep hand edits; locked files are not regenerated.

{{sprocket:body}}";

const V3_TEMPLATE: &str = "\
// @generated by {{sprocket:name}} {{sprocket:version}}
// last_modified: {{sprocket:last_modified}}
// locked: {{sprocket:locked}}
//
// Set `locked: true` to keep hand edits; locked files are not regenerated.

#![allow(clippy::all)]

{{sprocket:body}}";
