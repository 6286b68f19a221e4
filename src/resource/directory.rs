//! `directory` - a directory, created with its parents

use anyhow::{Context, Result, bail};
use declarative::{ChangeSet, Resource, ResourceDriver, ResourceSchema};
use std::fs;
use std::sync::Arc;

use super::path::load_metadata;
use super::{apply_mode, resource_path};

pub fn schema(base: &Arc<ResourceSchema>) -> Result<Arc<ResourceSchema>> {
    Ok(base.extend("directory").driver(Arc::new(DirectoryDriver)).build())
}

#[derive(Debug)]
pub struct DirectoryDriver;

impl ResourceDriver for DirectoryDriver {
    fn load(&self, current: &mut Resource) -> Result<()> {
        load_metadata(current, |metadata| {
            if !metadata.is_dir() {
                bail!("Not a directory");
            }
            Ok(())
        })
    }

    fn apply(&self, desired: &Resource, changes: &ChangeSet) -> Result<()> {
        if changes.is_create() {
            let path = resource_path(desired, "path")?;
            fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        apply_mode(desired, changes)
    }
}
