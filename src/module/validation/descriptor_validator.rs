//! Descriptor schema validation
//!
//! Descriptor tables may only use the recognized keys; anything else is almost
//! always a typo and is rejected with suggestions.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::module::registry::descriptor::{Dependency, Scope};
use crate::module::suggest::{Suggestions, DEFAULT_SUGGESTION_THRESHOLD};
use crate::module::traits::ModuleError;

/// Keys a descriptor table may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKey {
    Id,
    Dependencies,
    Externals,
    Globals,
    Scope,
    IsMain,
}

impl DescriptorKey {
    pub const ALL: [DescriptorKey; 6] = [
        DescriptorKey::Id,
        DescriptorKey::Dependencies,
        DescriptorKey::Externals,
        DescriptorKey::Globals,
        DescriptorKey::Scope,
        DescriptorKey::IsMain,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DescriptorKey::Id => "id",
            DescriptorKey::Dependencies => "dependencies",
            DescriptorKey::Externals => "externals",
            DescriptorKey::Globals => "globals",
            DescriptorKey::Scope => "scope",
            DescriptorKey::IsMain => "is_main",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::ALL.into_iter().map(|k| k.name())
    }
}

/// Validated descriptor fields, everything but the initializer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorFields {
    pub id: Option<String>,
    pub dependencies: Vec<Dependency>,
    pub externals: Vec<String>,
    pub globals: Vec<String>,
    pub scope: Option<Scope>,
    pub is_main: bool,
}

/// Dependency entry as written: a bare id or `{ id, alias }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependencyEntry {
    Plain(String),
    Aliased(AliasedEntry),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AliasedEntry {
    id: String,
    #[serde(default)]
    alias: Option<String>,
}

impl From<DependencyEntry> for Dependency {
    fn from(entry: DependencyEntry) -> Self {
        match entry {
            DependencyEntry::Plain(id) => Dependency::new(id),
            DependencyEntry::Aliased(AliasedEntry { id, alias }) => Dependency { id, alias },
        }
    }
}

/// Descriptor validator
pub struct DescriptorValidator {
    /// Edit-distance threshold for key and scope suggestions
    threshold: usize,
}

impl DescriptorValidator {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_SUGGESTION_THRESHOLD)
    }

    pub fn with_threshold(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Check every key against the schema, returning them in input order
    pub fn validate_keys<'a, I>(&self, keys: I) -> Result<Vec<DescriptorKey>, ModuleError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter()
            .map(|key| {
                DescriptorKey::from_name(key).ok_or_else(|| ModuleError::Schema {
                    key: key.to_string(),
                    detail: "unrecognized key".to_string(),
                    suggestions: Suggestions::find(key, DescriptorKey::names(), self.threshold),
                })
            })
            .collect()
    }

    /// Validate a descriptor table and extract its fields
    pub fn parse_table(&self, table: &toml::Table) -> Result<DescriptorFields, ModuleError> {
        self.validate_keys(table.keys().map(String::as_str))?;

        let mut fields = DescriptorFields::default();
        let mut scope_name: Option<String> = None;
        for (key, value) in table {
            // Keys were validated above
            let Some(descriptor_key) = DescriptorKey::from_name(key) else {
                continue;
            };
            match descriptor_key {
                DescriptorKey::Id => fields.id = Some(field_value(descriptor_key, value)?),
                DescriptorKey::Dependencies => {
                    let entries: Vec<DependencyEntry> = field_value(descriptor_key, value)?;
                    fields.dependencies = entries.into_iter().map(Dependency::from).collect();
                }
                DescriptorKey::Externals => fields.externals = field_value(descriptor_key, value)?,
                DescriptorKey::Globals => fields.globals = field_value(descriptor_key, value)?,
                DescriptorKey::Scope => scope_name = Some(field_value(descriptor_key, value)?),
                DescriptorKey::IsMain => fields.is_main = field_value(descriptor_key, value)?,
            }
        }

        // Parsed last so the error can name the module
        if let Some(name) = scope_name {
            let scope = Scope::parse(&name, self.threshold).map_err(|e| match e {
                ModuleError::InvalidScope {
                    scope, suggestions, ..
                } => ModuleError::InvalidScope {
                    scope,
                    id: fields.id.clone(),
                    suggestions,
                },
                other => other,
            })?;
            fields.scope = Some(scope);
        }

        debug!("Descriptor table validated for {:?}", fields.id);
        Ok(fields)
    }
}

impl Default for DescriptorValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn field_value<T: DeserializeOwned>(
    key: DescriptorKey,
    value: &toml::Value,
) -> Result<T, ModuleError> {
    value.clone().try_into().map_err(|e: toml::de::Error| ModuleError::Schema {
        key: key.name().to_string(),
        detail: e.to_string(),
        suggestions: Suggestions::none(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(text: &str) -> toml::Table {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_valid_keys() {
        let validator = DescriptorValidator::new();
        let keys = validator.validate_keys(["id", "scope", "is_main"]).unwrap();
        assert_eq!(keys, vec![DescriptorKey::Id, DescriptorKey::Scope, DescriptorKey::IsMain]);
    }

    #[test]
    fn test_invalid_key_suggestions() {
        let validator = DescriptorValidator::new();
        let err = validator.validate_keys(["id", "extrenals"]).unwrap_err();
        assert!(matches!(err, ModuleError::Schema { ref key, .. } if key == "extrenals"));
        assert_eq!(err.suggestions(), &["externals".to_string()]);
    }

    #[test]
    fn test_parse_full_table() {
        let fields = DescriptorValidator::new()
            .parse_table(&table(
                r#"
                id = "svc.db"
                dependencies = ["svc.config"]
                externals = ["postgres"]
                globals = ["DATABASE_URL"]
                scope = "instance"
                "#,
            ))
            .unwrap();
        assert_eq!(fields.id.as_deref(), Some("svc.db"));
        assert_eq!(fields.dependencies, vec![Dependency::new("svc.config")]);
        assert_eq!(fields.externals, vec!["postgres".to_string()]);
        assert_eq!(fields.globals, vec!["DATABASE_URL".to_string()]);
        assert_eq!(fields.scope, Some(Scope::Instance));
        assert!(!fields.is_main);
    }

    #[test]
    fn test_wrong_value_type() {
        let err = DescriptorValidator::new()
            .parse_table(&table("is_main = \"yes\""))
            .unwrap_err();
        assert!(matches!(err, ModuleError::Schema { ref key, .. } if key == "is_main"));
    }

    #[test]
    fn test_bad_scope() {
        let err = DescriptorValidator::new()
            .parse_table(&table("scope = \"singletn\""))
            .unwrap_err();
        assert!(matches!(err, ModuleError::InvalidScope { .. }));
        assert_eq!(err.suggestions(), &["singleton".to_string()]);
    }

    #[test]
    fn test_aliased_entry_rejects_unknown_fields() {
        let err = DescriptorValidator::new()
            .parse_table(&table("dependencies = [{ id = \"a\", alais = \"b\" }]"))
            .unwrap_err();
        assert!(matches!(err, ModuleError::Schema { ref key, .. } if key == "dependencies"));
    }
}
