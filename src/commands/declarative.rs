//! Declarative commands
//!
//! - `status` - Show which declared values differ from the current state
//! - `diff` - Preview what apply would change
//! - `apply` - Make the current state match the manifest
//! - `show` - Every property of each declared resource
//! - `schemas` - The resource types a manifest can use

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use declarative::{Property, Resource, SnapshotMode};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::Context;
use crate::config::Manifest;
use crate::engine::differ::{compute_diffs, display_diff};
use crate::engine::{ExecuteOptions, execute, parse_target, plan};
use crate::paths;
use crate::resource::Registry;
use crate::ui;

/// Read the manifest and open the resources matching `target`
fn load_resources(ctx: &Context, target: Option<&str>) -> Result<Vec<Resource>> {
    let path = paths::manifest_path(ctx.file.as_deref())?;
    log::info!("Reading manifest {}", path.display());

    let manifest = Manifest::load(&path)?;
    if manifest.is_empty() && !ctx.quiet {
        ui::warn(&format!("No resources declared in {}", path.display()));
    }

    let registry = Registry::builtin()?;
    let target = target.map(parse_target);
    plan(&manifest, &registry, target.as_ref())
}

// ============================================================================
// status
// ============================================================================

pub fn status(ctx: &Context, target: Option<&str>) -> Result<()> {
    let resources = load_resources(ctx, target)?;

    ui::header("Converge Status");

    let mut drifted = 0;
    for resource in &resources {
        match resource.to_map(SnapshotMode::OnlyChanged) {
            Ok(changed) if changed.is_empty() => {
                println!("  {} {}", "✓".green(), resource);
            }
            Ok(changed) => {
                drifted += 1;
                let names: Vec<&str> = changed.keys().map(String::as_str).collect();
                let label = if resource.resource_exists()? {
                    "differs"
                } else {
                    "missing"
                };
                println!(
                    "  {} {} {} {}",
                    "~".yellow(),
                    resource,
                    label.yellow(),
                    names.join(", ").dimmed()
                );
            }
            Err(e) => {
                drifted += 1;
                println!("  {} {} - {}", "✗".red(), resource, e.to_string().red());
            }
        }
    }

    println!();
    if drifted == 0 {
        ui::success(&format!(
            "{} in sync",
            ui::plural(resources.len(), "resource")
        ));
    } else {
        ui::info(&format!(
            "{} of {} out of sync. Run 'converge diff' to see details.",
            drifted,
            ui::plural(resources.len(), "resource")
        ));
    }

    Ok(())
}

// ============================================================================
// diff
// ============================================================================

pub fn diff(ctx: &Context, target: Option<&str>) -> Result<()> {
    let resources = load_resources(ctx, target)?;
    let diffs = compute_diffs(&resources);
    display_diff(&diffs);
    Ok(())
}

// ============================================================================
// apply
// ============================================================================

pub fn apply(ctx: &Context, target: Option<&str>, dry_run: bool, yes: bool) -> Result<()> {
    let mut resources = load_resources(ctx, target)?;

    let opts = ExecuteOptions {
        dry_run,
        yes,
        verbose: ctx.verbose > 0,
    };
    let summary = execute(&mut resources, &opts)?;

    if !summary.is_success() {
        bail!(
            "{} failed to converge",
            ui::plural(summary.failed, "resource")
        );
    }
    Ok(())
}

// ============================================================================
// show
// ============================================================================

/// Every property of `resource`, rendered for display
fn rendered(resource: &Resource) -> Result<BTreeMap<String, String>> {
    let values = resource.to_map(SnapshotMode::All)?;
    let schema = resource.schema();
    Ok(values
        .iter()
        .map(|(name, value)| {
            let shown = match schema.property(name) {
                Some(property) => property.display_value(value),
                None => value.inspect(),
            };
            (name.clone(), shown)
        })
        .collect())
}

/// Every property of `resource` as JSON, with sensitive values suppressed
fn to_json(resource: &Resource) -> Result<serde_json::Value> {
    let values = resource.to_map(SnapshotMode::All)?;
    let schema = resource.schema();
    let mut out = serde_json::Map::new();
    for (name, value) in values {
        let sensitive = schema.property(&name).is_some_and(|p| p.is_sensitive());
        let json = if sensitive {
            serde_json::Value::String(declarative::SUPPRESSED.to_string())
        } else {
            serde_json::to_value(&value)
                .with_context(|| format!("Cannot serialize `{name}` of {resource}"))?
        };
        out.insert(name, json);
    }
    Ok(serde_json::Value::Object(out))
}

/// One resource in `show --json` output
#[derive(Debug, Serialize)]
struct ShownResource {
    #[serde(rename = "type")]
    kind: String,
    identity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ShownResource {
    fn new(resource: &Resource) -> Self {
        let mut shown = Self {
            kind: resource.schema().name().to_string(),
            identity: resource.identity_string(),
            exists: None,
            properties: None,
            error: None,
        };
        match to_json(resource).and_then(|p| Ok((p, resource.resource_exists()?))) {
            Ok((properties, exists)) => {
                shown.exists = Some(exists);
                shown.properties = Some(properties);
            }
            Err(e) => shown.error = Some(format!("{e:#}")),
        }
        shown
    }
}

pub fn show(ctx: &Context, target: Option<&str>, as_json: bool) -> Result<()> {
    let resources = load_resources(ctx, target)?;

    if as_json {
        let items: Vec<ShownResource> = resources.iter().map(ShownResource::new).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    for resource in &resources {
        ui::section(&resource.to_string());
        match rendered(resource) {
            Ok(values) => {
                let exists = resource.resource_exists()?;
                ui::kv("exists", &exists.to_string());
                for (name, shown) in &values {
                    ui::kv(name, shown);
                }
            }
            Err(e) => ui::error(&e.to_string()),
        }
    }
    Ok(())
}

// ============================================================================
// schemas
// ============================================================================

/// Flags shown next to a property name
fn flags(property: &Property) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if property.is_identity() {
        flags.push("identity");
    }
    if property.is_required() {
        flags.push("required");
    }
    if property.is_sensitive() {
        flags.push("sensitive");
    }
    if property.default_value_spec().is_some() {
        flags.push("default");
    }
    if property.loader().is_some() {
        flags.push("loaded");
    }
    flags
}

pub fn schemas(_ctx: &Context) -> Result<()> {
    let registry = Registry::builtin()?;

    for schema in registry.schemas() {
        let title = match schema.parent() {
            Some(parent) => format!("{} (extends {})", schema.name(), parent.name()),
            None => schema.name().to_string(),
        };
        ui::section(&title);

        for property in schema.properties() {
            let flags = flags(property);
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!("[{}]", flags.join(", "))
            };
            let kinds: Vec<String> = property
                .contract()
                .kinds()
                .iter()
                .map(ToString::to_string)
                .collect();
            let kinds = if kinds.is_empty() {
                "any".to_string()
            } else {
                kinds.join("|")
            };
            println!(
                "  {} {:<14} {} {}",
                format!("{:<10}", property.name()).bold(),
                kinds,
                format!("{flags:<28}").dimmed(),
                property.description().unwrap_or_default()
            );
        }
    }
    Ok(())
}
