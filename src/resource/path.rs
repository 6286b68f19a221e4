//! `path` - anything on the filesystem with permission bits

use anyhow::{Context, Result, bail};
use declarative::{ChangeSet, PropertyOptions, Resource, ResourceDriver, ResourceSchema};
use std::io::ErrorKind;
use std::sync::Arc;

use super::{apply_mode, mode_contract, path_contract, read_mode, resource_path};

/// Base schema shared by files and directories
pub fn schema() -> Result<Arc<ResourceSchema>> {
    Ok(ResourceSchema::builder("path")
        .property(
            "path",
            path_contract(),
            PropertyOptions::new()
                .identity()
                .description("location on disk; ~ and $VARS are expanded"),
        )?
        .property(
            "mode",
            mode_contract(),
            PropertyOptions::new().description("permission bits, octal (e.g. \"644\")"),
        )?
        .driver(Arc::new(PathDriver))
        .build())
}

/// Loads existence and mode; only adjusts the mode of an existing path
#[derive(Debug)]
pub struct PathDriver;

impl ResourceDriver for PathDriver {
    fn load(&self, current: &mut Resource) -> Result<()> {
        load_metadata(current, |_| Ok(()))
    }

    fn apply(&self, desired: &Resource, changes: &ChangeSet) -> Result<()> {
        if changes.is_create() {
            let path = resource_path(desired, "path")?;
            bail!("Nothing at {}; declare it as a file or directory to create it", path.display());
        }
        apply_mode(desired, changes)
    }
}

/// Shared load step: mark absent, or record `mode` after `check` accepts the metadata
pub(crate) fn load_metadata<F>(current: &mut Resource, check: F) -> Result<()>
where
    F: FnOnce(&std::fs::Metadata) -> Result<()>,
{
    let path = resource_path(current, "path")?;
    let metadata = match std::fs::symlink_metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("{} does not exist", path.display());
            current.set_exists(false)?;
            return Ok(());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to inspect {}", path.display()));
        }
    };

    check(&metadata)?;

    if let Some(mode) = read_mode(&path)? {
        current.set("mode", mode)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::Value;

    #[test]
    fn test_missing_path_does_not_exist() {
        let dir = tempfile::tempdir().unwrap();
        let schema = schema().unwrap();
        let r = schema
            .open_positional(vec![dir.path().join("missing").into()])
            .unwrap();
        assert!(!r.resource_exists().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_mode_is_loaded_and_converged() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.txt");
        std::fs::write(&target, "x").unwrap();
        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o644)).unwrap();

        let schema = schema().unwrap();
        let mut r = schema.open_positional(vec![target.clone().into()]).unwrap();
        assert_eq!(r.current_value("mode").unwrap(), Value::from(0o644));

        r.set("mode", "600").unwrap();
        let changes = r.update().unwrap().unwrap();
        assert_eq!(changes.names(), vec!["mode"]);

        let mode = std::fs::metadata(&target).unwrap().permissions().mode() & 0o7777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_cannot_create_bare_path() {
        let dir = tempfile::tempdir().unwrap();
        let schema = schema().unwrap();
        let mut r = schema
            .open_positional(vec![dir.path().join("nothing").into()])
            .unwrap();
        let err = r.update().unwrap_err();
        assert!(err.to_string().contains("declare it as a file or directory"));
    }
}
