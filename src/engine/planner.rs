//! Planning - open manifest entries as resources and filter them

use anyhow::{Context, Result};
use declarative::Resource;

use crate::config::Manifest;
use crate::resource::Registry;

/// A `type` or `type.name` filter given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub resource_type: Option<String>,
    pub name: Option<String>,
}

/// Parse a target string like "file.gitconfig" into (resource_type, name)
///
/// Only the first `.` separates, so names may contain dots.
pub fn parse_target(target: &str) -> Target {
    match target.split_once('.') {
        None => Target {
            resource_type: Some(target.to_string()),
            name: None,
        },
        Some((resource_type, name)) => Target {
            resource_type: (!resource_type.is_empty()).then(|| resource_type.to_string()),
            name: (!name.is_empty()).then(|| name.to_string()),
        },
    }
}

/// Check if a resource matches the filter
///
/// The type matches the schema or any schema it extends; the name is a
/// substring of the identity.
pub fn matches_filter(resource: &Resource, target: &Target) -> bool {
    if let Some(rt) = &target.resource_type {
        let mut schema = Some(resource.schema());
        let mut matches_type = false;
        while let Some(s) = schema {
            if s.name() == rt {
                matches_type = true;
                break;
            }
            schema = s.parent();
        }
        if !matches_type {
            return false;
        }
    }

    if let Some(n) = &target.name
        && !resource.identity_string().contains(n.as_str())
    {
        return false;
    }

    true
}

/// Open every manifest entry, grouped by type, keeping those matching `target`
pub fn plan(manifest: &Manifest, registry: &Registry, target: Option<&Target>) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();
    for (index, entry) in manifest.entries.iter().enumerate() {
        let resource = registry
            .open(entry)
            .with_context(|| format!("Invalid `{}` entry #{}", entry.kind, index + 1))?;
        if target.is_none_or(|t| matches_filter(&resource, t)) {
            resources.push(resource);
        }
    }
    log::debug!("Planned {} of {} resources", resources.len(), manifest.entries.len());
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        Manifest::parse(
            r#"
[[file]]
path = "/tmp/converge/a.conf"

[[secret_file]]
path = "/tmp/converge/token"

[[directory]]
path = "/tmp/converge/d"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(
            parse_target("file"),
            Target {
                resource_type: Some("file".into()),
                name: None
            }
        );
        assert_eq!(
            parse_target("file.a.conf"),
            Target {
                resource_type: Some("file".into()),
                name: Some("a.conf".into())
            }
        );
        assert_eq!(
            parse_target(".token"),
            Target {
                resource_type: None,
                name: Some("token".into())
            }
        );
    }

    #[test]
    fn test_plan_without_filter() {
        let registry = Registry::builtin().unwrap();
        let resources = plan(&manifest(), &registry, None).unwrap();
        assert_eq!(resources.len(), 3);
    }

    #[test]
    fn test_type_filter_includes_descendants() {
        let registry = Registry::builtin().unwrap();
        let files = plan(&manifest(), &registry, Some(&parse_target("file"))).unwrap();
        let names: Vec<String> = files.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec!["file[/tmp/converge/a.conf]", "secret_file[/tmp/converge/token]"]
        );

        let paths = plan(&manifest(), &registry, Some(&parse_target("path"))).unwrap();
        assert_eq!(paths.len(), 3);
    }

    #[test]
    fn test_name_filter() {
        let registry = Registry::builtin().unwrap();
        let found = plan(&manifest(), &registry, Some(&parse_target("path.token"))).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].schema().name(), "secret_file");
    }

    #[test]
    fn test_invalid_entry_is_reported_with_position() {
        let registry = Registry::builtin().unwrap();
        let manifest = Manifest::parse("[[symlink]]\ntarget = \"/tmp/l\"\n").unwrap();
        let err = plan(&manifest, &registry, None).unwrap_err();
        assert!(err.to_string().contains("Invalid `symlink` entry #1"));
    }
}
