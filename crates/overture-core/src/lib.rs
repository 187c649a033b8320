//! Overture Core Library
//!
//! Discovers installed AI coding assistants and synchronizes MCP server
//! definitions from one YAML config into each client's native config file.

pub mod audit;
pub mod backup;
pub mod client;
pub mod config;
pub mod context;
pub mod discovery;
pub mod error;
pub mod fs;
pub mod mcp;
pub mod process;
pub mod sync;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigStore, OvertureConfig, ServerDefinition};

    // Clients
    pub use crate::client::{ClientAdapter, ClientContext, ClientKind, ClientRegistry};

    // Discovery
    pub use crate::discovery::{
        DiscoveryReport, DiscoveryResult, DiscoveryService, DiscoverySource, DiscoveryStatus,
    };

    // Sync
    pub use crate::backup::{BackupRecord, BackupService};
    pub use crate::error::SyncError;
    pub use crate::sync::{ClientSyncResult, SyncAction, SyncEngine, SyncOptions, SyncReport};

    // Ports
    pub use crate::fs::{FileSystem, RealFs};
    pub use crate::process::{ProcessPort, SystemProcess};

    pub use crate::context::AppContext;
    pub use crate::types::{Platform, SyncScope, Transport};
}
