//! `symlink` - a link at `target` pointing to `source`

use anyhow::{Context, Result, bail};
use declarative::{
    ChangeSet, PropertyOptions, Resource, ResourceDriver, ResourceSchema, TypeContract, Value,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{path_contract, resource_path};
use crate::paths::expand;

pub fn schema() -> Result<Arc<ResourceSchema>> {
    Ok(ResourceSchema::builder("symlink")
        .property(
            "target",
            path_contract(),
            PropertyOptions::new()
                .identity()
                .description("where the link is created"),
        )?
        .property(
            "source",
            source_contract(),
            PropertyOptions::new()
                .required(true)
                .description("what the link points to"),
        )?
        .driver(Arc::new(SymlinkDriver))
        .build())
}

/// Like the path contract, but canonical when the source exists
fn source_contract() -> TypeContract {
    TypeContract::path().with_coercion(|value| {
        let path = match value {
            Value::Text(s) => expand(s),
            Value::Path(p) => expand(&p.to_string_lossy()),
            _ => return None,
        };
        Some(Value::Path(path.canonicalize().unwrap_or(path)))
    })
}

#[derive(Debug)]
pub struct SymlinkDriver;

impl SymlinkDriver {
    /// Resolve a link's destination the way it is compared against `source`
    fn resolve(target: &Path, link: PathBuf) -> PathBuf {
        let joined = if link.is_absolute() {
            link
        } else {
            target.parent().map_or(link.clone(), |p| p.join(&link))
        };
        joined.canonicalize().unwrap_or(joined)
    }

    fn create_symlink(source: &Path, target: &Path) -> Result<()> {
        if !source.exists() {
            bail!("Source does not exist: {}", source.display());
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create parent directory: {}", parent.display())
            })?;
        }

        // Replace a link pointing elsewhere
        if target.is_symlink() {
            fs::remove_file(target).with_context(|| {
                format!("Failed to remove existing symlink: {}", target.display())
            })?;
        }

        #[cfg(unix)]
        std::os::unix::fs::symlink(source, target).with_context(|| {
            format!(
                "Failed to create symlink: {} -> {}",
                target.display(),
                source.display()
            )
        })?;

        #[cfg(windows)]
        {
            use std::os::windows::fs::{symlink_dir, symlink_file};

            let created = if source.is_dir() {
                symlink_dir(source, target)
            } else {
                symlink_file(source, target)
            };
            created.with_context(|| {
                format!(
                    "Failed to create symlink: {} -> {}",
                    target.display(),
                    source.display()
                )
            })?;
        }

        #[cfg(not(any(unix, windows)))]
        bail!("Symlinks not supported on this platform");

        Ok(())
    }
}

impl ResourceDriver for SymlinkDriver {
    fn load(&self, current: &mut Resource) -> Result<()> {
        let target = resource_path(current, "target")?;

        if !target.is_symlink() {
            if target.exists() {
                // Never overwrite real files
                bail!("File exists at {}", target.display());
            }
            current.set_exists(false)?;
            return Ok(());
        }

        let link = fs::read_link(&target).context("Failed to read symlink")?;
        current.set("source", Self::resolve(&target, link))?;
        Ok(())
    }

    fn apply(&self, desired: &Resource, _changes: &ChangeSet) -> Result<()> {
        let target = resource_path(desired, "target")?;
        let source = resource_path(desired, "source")?;
        Self::create_symlink(&source, &target)
    }
}
