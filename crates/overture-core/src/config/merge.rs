//! Configuration layer merging logic
//!
//! Implements the 2-layer merge strategy: User -> Project.

use super::schema::OvertureConfig;

/// Merge the user and project configuration layers.
///
/// Project MCP definitions replace user definitions with the same name as a
/// whole. Client, discovery and sync settings merge field by field, so a
/// project layer only overrides the fields it sets.
pub fn merge_configs(user: Option<OvertureConfig>, project: Option<OvertureConfig>) -> OvertureConfig {
    let mut merged = user.unwrap_or_default();

    if let Some(project) = project {
        merge_layer(&mut merged, project);
    }

    merged.assign_names();
    merged
}

fn merge_layer(base: &mut OvertureConfig, layer: OvertureConfig) {
    let defaults = OvertureConfig::default();

    if layer.version != defaults.version {
        base.version = layer.version;
    }

    for (name, definition) in layer.mcp {
        if base.mcp.contains_key(&name) {
            tracing::debug!(server = %name, "Project definition overrides user definition");
        }
        base.mcp.insert(name, definition);
    }

    for (name, settings) in layer.clients {
        base.clients
            .entry(name)
            .and_modify(|existing| existing.merge(settings.clone()))
            .or_insert(settings);
    }

    base.discovery.merge(layer.discovery);
    base.sync.merge(layer.sync);
}
