//! `file` - a regular file with content

use anyhow::{Context, Result, bail};
use declarative::{
    ChangeSet, LazyValue, PropertyOptions, Resource, ResourceDriver, ResourceSchema, TypeContract,
    Value,
};
use std::fs;
use std::sync::Arc;

use super::path::load_metadata;
use super::{apply_mode, resource_path};

/// `file` extends `path` with `content`, read lazily from disk
pub fn schema(base: &Arc<ResourceSchema>) -> Result<Arc<ResourceSchema>> {
    Ok(base
        .extend("file")
        .property(
            "content",
            TypeContract::text(),
            PropertyOptions::new()
                .load_value(LazyValue::receiver(read_content))
                .description("full text of the file"),
        )?
        .driver(Arc::new(FileDriver))
        .build())
}

/// `secret_file`: a `file` whose content is suppressed in change output
pub fn secret_schema(file: &Arc<ResourceSchema>) -> Result<Arc<ResourceSchema>> {
    Ok(file
        .extend("secret_file")
        .override_property(
            "content",
            PropertyOptions::new().sensitive().description("full text of the file, never printed"),
        )?
        .build())
}

fn read_content(current: &Resource) -> declarative::Result<Value> {
    let path = resource_path(current, "path")?;
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Value::Text(content))
}

/// Writes content and mode; creates parent directories as needed
#[derive(Debug)]
pub struct FileDriver;

impl ResourceDriver for FileDriver {
    fn load(&self, current: &mut Resource) -> Result<()> {
        load_metadata(current, |metadata| {
            if !metadata.is_file() {
                bail!("Not a regular file");
            }
            Ok(())
        })
    }

    fn apply(&self, desired: &Resource, changes: &ChangeSet) -> Result<()> {
        let path = resource_path(desired, "path")?;

        if changes.is_create() || changes.contains("content") {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create parent directory: {}", parent.display())
                })?;
            }
            let content = match desired.get("content")? {
                Value::Null => String::new(),
                other => other.to_string(),
            };
            fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        apply_mode(desired, changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::path;

    fn file_schema() -> Arc<ResourceSchema> {
        schema(&path::schema().unwrap()).unwrap()
    }

    #[test]
    fn test_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("a.txt");

        let schema = file_schema();
        let mut r = schema.open_positional(vec![target.clone().into()]).unwrap();
        r.set("content", "hello\n").unwrap();

        let changes = r.update().unwrap().unwrap();
        assert!(changes.is_create());
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello\n");
    }

    #[test]
    fn test_content_loaded_lazily_and_compared() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.txt");
        fs::write(&target, "old").unwrap();

        let schema = file_schema();
        let mut r = schema.open_positional(vec![target.clone().into()]).unwrap();
        assert_eq!(r.get("content").unwrap(), Value::from("old"));

        r.set("content", "new").unwrap();
        let changes = r.update().unwrap().unwrap();
        assert_eq!(
            changes.description(),
            vec!["update content", "set content to \"new\" (was \"old\")"]
        );
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn test_matching_content_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.txt");
        fs::write(&target, "same").unwrap();

        let schema = file_schema();
        let mut r = schema.open_positional(vec![target.into()]).unwrap();
        r.set("content", "same").unwrap();
        assert!(r.update().unwrap().is_none());
    }

    #[test]
    fn test_directory_in_the_way_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let schema = file_schema();
        let r = schema
            .open_positional(vec![dir.path().to_path_buf().into()])
            .unwrap();
        let err = r.resource_exists().unwrap_err();
        assert!(err.to_string().contains("Not a regular file"));
    }

    #[test]
    fn test_secret_content_is_suppressed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("token");
        fs::write(&target, "old-token").unwrap();

        let schema = secret_schema(&file_schema()).unwrap();
        let mut r = schema.open_positional(vec![target.clone().into()]).unwrap();
        r.set("content", "new-token").unwrap();

        let changes = r.update().unwrap().unwrap();
        let text = changes.description().join("\n");
        assert!(!text.contains("token"));
        assert!(text.contains(declarative::SUPPRESSED));
        assert_eq!(fs::read_to_string(&target).unwrap(), "new-token");
    }
}
