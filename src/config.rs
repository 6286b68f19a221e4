//! Manifest loading
//!
//! The manifest is TOML with one array of tables per resource type:
//!
//! ```toml
//! [[file]]
//! path = "~/.gitconfig"
//! content = "[user]\n  name = Ann\n"
//! mode = "644"
//!
//! [[symlink]]
//! target = "~/.vimrc"
//! source = "~/dotfiles/vimrc"
//! ```
//!
//! Each table maps property names to values; schemas decide how they are
//! coerced.

use anyhow::{Context, Result, bail};
use declarative::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One declared resource: its type and raw property values
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub kind: String,
    pub values: BTreeMap<String, Value>,
}

/// Every resource declared in a manifest
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub entries: Vec<Entry>,
}

impl Manifest {
    /// Load a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid manifest {}", path.display()))
    }

    /// Parse manifest text
    pub fn parse(content: &str) -> Result<Self> {
        let tables: BTreeMap<String, toml::Value> = toml::from_str(content)?;

        let mut entries = Vec::new();
        for (kind, value) in tables {
            let toml::Value::Array(items) = value else {
                bail!("`{kind}` must be an array of tables, e.g. [[{kind}]]");
            };
            for item in items {
                let toml::Value::Table(table) = item else {
                    bail!("every `{kind}` entry must be a table");
                };
                let values = table
                    .into_iter()
                    .map(|(name, value)| (name, to_value(value)))
                    .collect();
                entries.push(Entry {
                    kind: kind.clone(),
                    values,
                });
            }
        }

        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Convert a TOML value into a property value
///
/// Datetimes become text; the timestamp contract parses them.
pub fn to_value(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::Text(s),
        toml::Value::Integer(n) => Value::Integer(n),
        toml::Value::Float(n) => Value::Float(n),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::Text(dt.to_string()),
        toml::Value::Array(items) => Value::List(items.into_iter().map(to_value).collect()),
        toml::Value::Table(table) => Value::Map(
            table
                .into_iter()
                .map(|(k, v)| (k, to_value(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_entries() {
        let manifest = Manifest::parse(
            r#"
[[file]]
path = "/tmp/a"
content = "hello"
mode = "600"

[[file]]
path = "/tmp/b"

[[directory]]
path = "/tmp/d"
"#,
        )
        .unwrap();

        assert_eq!(manifest.entries.len(), 3);
        let kinds: Vec<&str> = manifest.entries.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["directory", "file", "file"]);

        let first_file = &manifest.entries[1];
        assert_eq!(first_file.values["path"], Value::from("/tmp/a"));
        assert_eq!(first_file.values["mode"], Value::from("600"));
    }

    #[test]
    fn test_nested_values() {
        let manifest = Manifest::parse(
            r#"
[[file]]
path = "/tmp/a"
tags = ["x", 1]
meta = { owner = "ann", pinned = true }
"#,
        )
        .unwrap();
        let values = &manifest.entries[0].values;
        assert_eq!(
            values["tags"],
            Value::List(vec![Value::from("x"), Value::from(1)])
        );
        assert_eq!(values["meta"].as_map().unwrap()["pinned"], Value::from(true));
    }

    #[test]
    fn test_rejects_plain_tables() {
        let err = Manifest::parse("[file]\npath = \"/tmp/a\"\n").unwrap_err();
        assert!(err.to_string().contains("array of tables"));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[symlink]]\ntarget = \"/tmp/l\"\nsource = \"/tmp/s\"").unwrap();

        let manifest = Manifest::load(file.path()).unwrap();
        assert_eq!(manifest.entries[0].kind, "symlink");
        assert!(Manifest::load(Path::new("/nonexistent/manifest.toml")).is_err());
    }
}
