//! Module identifier normalization
//!
//! Ids are case-insensitive. An id may carry a single namespace prefix
//! (`lib::serde`, `global::HOME`); the rest is split into path segments on
//! `.` and `/`. Every registry and cache lookup goes through the canonical key.

use std::fmt;
use std::path::{Component, Path};

use crate::module::traits::ModuleError;

/// Separator between a namespace prefix and the rest of an id
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Separator between the segments of a module id
pub const ID_SEPARATOR: char = '.';

/// File extensions dropped when deriving an id from a source location
pub const DEFAULT_SOURCE_EXTENSIONS: [&str; 2] = ["rs", "toml"];

/// Namespace an id is looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Registered modules (no prefix)
    Local,
    /// Values from the host's external resolver (`lib::`)
    External,
    /// Values from the host's global resolver (`global::`)
    Global,
}

impl Namespace {
    /// Prefixes that may appear in front of `::`
    pub const PREFIXES: [&'static str; 2] = ["lib", "global"];

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "" => Some(Namespace::Local),
            "lib" => Some(Namespace::External),
            "global" => Some(Namespace::Global),
            _ => None,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Local => "",
            Namespace::External => "lib",
            Namespace::Global => "global",
        }
    }
}

/// A parsed, case-folded module reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedId {
    raw: String,
    prefix: String,
    name: String,
    canonical: String,
    segments: Vec<String>,
}

impl NormalizedId {
    /// Normalize a raw id
    ///
    /// Fails with `MalformedId` when the id is empty or contains more than one
    /// namespace separator.
    pub fn parse(raw: &str) -> Result<Self, ModuleError> {
        let parts: Vec<&str> = raw.split(NAMESPACE_SEPARATOR).collect();
        let (prefix, name) = match parts.as_slice() {
            [name] => ("", *name),
            [prefix, name] => (*prefix, *name),
            _ => {
                return Err(ModuleError::MalformedId {
                    id: raw.to_string(),
                    reason: format!("more than one '{}' separator", NAMESPACE_SEPARATOR),
                })
            }
        };

        if name.trim().is_empty() {
            return Err(ModuleError::MalformedId {
                id: raw.to_string(),
                reason: "id is empty".to_string(),
            });
        }

        let prefix = prefix.to_lowercase();
        let lowered = name.to_lowercase();
        let segments = lowered
            .split(|c| c == ID_SEPARATOR || c == '/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let canonical = if prefix.is_empty() {
            lowered
        } else {
            format!("{}{}{}", prefix, NAMESPACE_SEPARATOR, lowered)
        };

        Ok(Self {
            raw: raw.to_string(),
            prefix,
            name: name.to_string(),
            canonical,
            segments,
        })
    }

    /// The id exactly as written
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Lower-cased namespace prefix, empty for local ids
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The part after the prefix, case preserved
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key used for every registry and cache lookup
    pub fn canonical_key(&self) -> &str {
        &self.canonical
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Namespace named by the prefix, if it is a recognized one
    pub fn namespace(&self) -> Option<Namespace> {
        Namespace::from_prefix(&self.prefix)
    }
}

impl fmt::Display for NormalizedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Derive a module id from a source location
///
/// `services/mailer.rs` becomes `services.mailer`; with prefix `app` it becomes
/// `app.services.mailer`. Only an extension listed in `extensions` is dropped,
/// so `api/handler.v1` becomes `api.handler.v1`.
pub fn id_from_source_location<S: AsRef<str>>(
    location: &str,
    id_prefix: Option<&str>,
    extensions: &[S],
) -> Result<String, ModuleError> {
    let path = Path::new(location);
    let recognized = path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| {
        extensions
            .iter()
            .any(|known| known.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext))
    });
    let stripped = if recognized {
        path.with_extension("")
    } else {
        path.to_path_buf()
    };

    let mut parts: Vec<String> = Vec::new();
    if let Some(prefix) = id_prefix.filter(|p| !p.is_empty()) {
        parts.push(prefix.to_string());
    }
    for component in stripped.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_string_lossy().into_owned());
        }
    }

    if parts.is_empty() {
        return Err(ModuleError::MalformedId {
            id: location.to_string(),
            reason: "source location has no path components".to_string(),
        });
    }
    Ok(parts.join(&ID_SEPARATOR.to_string()))
}
