//! Built-in resource types
//!
//! Each type is a [`ResourceSchema`] backed by a driver doing the real I/O:
//!
//! - `path`: identity `path`, optional `mode` (octal permission bits)
//! - `file`: a `path` with `content`
//! - `secret_file`: a `file` whose content never shows in change output
//! - `directory`: a `path` that is a directory
//! - `symlink`: identity `target`, pointing at `source`

use anyhow::{Result, bail};
use declarative::{Resource, ResourceInput, ResourceSchema, TypeContract, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::Entry;

pub mod directory;
pub mod file;
pub mod path;
pub mod symlink;

/// Schemas by resource type name
#[derive(Debug, Default)]
pub struct Registry {
    schemas: BTreeMap<String, Arc<ResourceSchema>>,
}

impl Registry {
    /// Registry with every built-in type
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::default();

        let base = path::schema()?;
        let file = file::schema(&base)?;
        registry.register(file::secret_schema(&file)?);
        registry.register(file);
        registry.register(directory::schema(&base)?);
        registry.register(symlink::schema()?);
        registry.register(base);

        Ok(registry)
    }

    pub fn register(&mut self, schema: Arc<ResourceSchema>) {
        self.schemas.insert(schema.name().to_string(), schema);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ResourceSchema>> {
        self.schemas.get(name)
    }

    /// Schemas in name order
    pub fn schemas(&self) -> impl Iterator<Item = &Arc<ResourceSchema>> {
        self.schemas.values()
    }

    /// Open a manifest entry as a fully defined resource
    pub fn open(&self, entry: &Entry) -> Result<Resource> {
        let Some(schema) = self.get(&entry.kind) else {
            let known: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
            bail!(
                "Unknown resource type `{}` (known: {})",
                entry.kind,
                known.join(", ")
            );
        };

        match schema.coerce_to_instance(ResourceInput::from(entry.values.clone()))? {
            Some(resource) => Ok(resource),
            None => bail!("Empty `{}` entry", entry.kind),
        }
    }
}

/// Path contract with `~` and `$VAR` expansion
pub fn path_contract() -> TypeContract {
    TypeContract::path().with_coercion(|value| match value {
        Value::Text(s) => Some(Value::Path(crate::paths::expand(s))),
        Value::Path(p) => Some(Value::Path(crate::paths::expand(&p.to_string_lossy()))),
        _ => None,
    })
}

/// Permission bits; text is read as octal (`"644"`), integers as given
pub fn mode_contract() -> TypeContract {
    TypeContract::integer()
        .with_coercion(|value| match value {
            Value::Text(s) => {
                let digits = s.trim().trim_start_matches("0o");
                i64::from_str_radix(digits, 8).ok().map(Value::Integer)
            }
            _ => None,
        })
        .must_be_between(0.0, f64::from(0o7777))
}

/// Path of a resource as stored on its identity
pub(crate) fn resource_path(resource: &Resource, name: &str) -> Result<std::path::PathBuf> {
    match resource.get(name)? {
        Value::Path(p) => Ok(p),
        other => bail!("`{name}` is not a path: {other}"),
    }
}

/// Read permission bits, if the platform has them
#[cfg(unix)]
pub(crate) fn read_mode(path: &Path) -> Result<Option<i64>> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = std::fs::symlink_metadata(path)?;
    Ok(Some(i64::from(metadata.permissions().mode() & 0o7777)))
}

#[cfg(not(unix))]
pub(crate) fn read_mode(_path: &Path) -> Result<Option<i64>> {
    Ok(None)
}

/// Apply permission bits when the platform has them
#[cfg(unix)]
pub(crate) fn write_mode(path: &Path, mode: i64) -> Result<()> {
    use anyhow::Context;
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode as u32))
        .with_context(|| format!("Failed to set mode {mode:o} on {}", path.display()))
}

#[cfg(not(unix))]
pub(crate) fn write_mode(path: &Path, _mode: i64) -> Result<()> {
    log::warn!("Ignoring mode for {}: not supported on this platform", path.display());
    Ok(())
}

/// Apply `mode` if it is part of the change set
pub(crate) fn apply_mode(desired: &Resource, changes: &declarative::ChangeSet) -> Result<()> {
    if let Some(change) = changes.get("mode")
        && let Some(mode) = change.desired.as_i64()
    {
        write_mode(&resource_path(desired, "path")?, mode)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: &str, values: &[(&str, Value)]) -> Entry {
        Entry {
            kind: kind.to_string(),
            values: values
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_builtin_types() {
        let registry = Registry::builtin().unwrap();
        let names: Vec<&str> = registry.schemas().map(|s| s.name()).collect();
        assert_eq!(names, vec!["directory", "file", "path", "secret_file", "symlink"]);

        let path = registry.get("path").unwrap();
        assert!(registry.get("file").unwrap().is_a(path));
        assert!(registry.get("secret_file").unwrap().is_a(path));
        assert!(!registry.get("symlink").unwrap().is_a(path));
    }

    #[test]
    fn test_mode_contract() {
        let mode = mode_contract();
        assert_eq!(mode.coerce(Value::from("644")).unwrap(), Value::from(0o644));
        assert_eq!(mode.coerce(Value::from("0o600")).unwrap(), Value::from(0o600));
        assert_eq!(mode.coerce(Value::from(0o755)).unwrap(), Value::from(0o755));
        assert!(mode.coerce(Value::from("rwx")).is_err());
        assert!(mode.coerce(Value::from(0o17777)).is_err());
    }

    #[test]
    fn test_path_contract_expands_home() {
        let home = dirs::home_dir().unwrap();
        let value = path_contract().coerce(Value::from("~/notes.txt")).unwrap();
        assert_eq!(value, Value::from(home.join("notes.txt")));
    }

    #[test]
    fn test_open_entry() {
        let registry = Registry::builtin().unwrap();
        let resource = registry
            .open(&entry(
                "file",
                &[
                    ("path", Value::from("/tmp/converge-test")),
                    ("mode", Value::from("600")),
                ],
            ))
            .unwrap();
        assert_eq!(resource.to_string(), "file[/tmp/converge-test]");
        assert_eq!(resource.get("mode").unwrap(), Value::from(0o600));
    }

    #[test]
    fn test_open_unknown_type() {
        let registry = Registry::builtin().unwrap();
        let err = registry
            .open(&entry("package", &[("name", Value::from("ripgrep"))]))
            .unwrap_err();
        assert!(err.to_string().contains("Unknown resource type `package`"));
    }

    #[test]
    fn test_open_rejects_unknown_property() {
        let registry = Registry::builtin().unwrap();
        let err = registry
            .open(&entry(
                "directory",
                &[("path", Value::from("/tmp/d")), ("owner", Value::from("ann"))],
            ))
            .unwrap_err();
        assert!(err.to_string().contains("unknown property `owner`"));
    }
}
