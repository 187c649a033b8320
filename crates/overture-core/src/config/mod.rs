//! Configuration management for the user and project layers.
//!
//! - User: `~/.config/overture.yml`
//! - Project: `./.overture/config.yaml`, overriding the user layer
//!
//! Also hosts the client-side document helpers and the structural diff used
//! when rewriting client config files.

pub mod client_config;
pub mod diff;
pub mod merge;
pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use diff::{ConfigDiff, FieldChange, ModifiedEntry, generate_diff};
pub use merge::merge_configs;
pub use parser::{parse_config, parse_config_str, to_yaml};
pub use schema::{
    ClientRules, ClientSettings, DiscoverySettings, OvertureConfig, PlatformRules,
    ServerDefinition, SyncSettings, Wsl2Settings,
};
pub use store::ConfigStore;
