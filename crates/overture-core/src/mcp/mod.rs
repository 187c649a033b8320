//! MCP server handling per client: filtering, variable expansion and
//! managed/unmanaged detection.

pub mod detector;
pub mod env;
pub mod filter;

pub use detector::{McpComparison, compare_mcp_configs, get_unmanaged_mcps, server_from_client_entry};
pub use env::{
    expand_env_vars, expand_server_env, should_expand_env_vars, unresolved_server_vars,
    unresolved_vars,
};
pub use filter::{
    ExclusionReason, FilterDecision, FilterSummary, FilteredServers, filter_mcps_for_client,
    filter_summary, should_include_mcp,
};
