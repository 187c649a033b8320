//! Exclusion rules deciding which servers a client receives.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::client::ClientAdapter;
use crate::config::ServerDefinition;
use crate::types::{Platform, Transport};

/// Why a server was kept out of a client's config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "category", rename_all = "kebab-case")]
pub enum ExclusionReason {
    Platform { platform: Platform },
    ClientExcluded { client: String },
    NotInIncludeList { client: String },
    UnsupportedTransport { client: String, transport: Transport },
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::Platform { platform } => {
                write!(f, "Platform {} is excluded", platform)
            }
            ExclusionReason::ClientExcluded { client } => {
                write!(f, "Client {} is in the exclude list", client)
            }
            ExclusionReason::NotInIncludeList { client } => {
                write!(f, "Client {} is not in the include list", client)
            }
            ExclusionReason::UnsupportedTransport { client, transport } => {
                write!(f, "Transport {} is not supported by {}", transport, client)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Include,
    Exclude(ExclusionReason),
}

impl FilterDecision {
    pub fn is_included(&self) -> bool {
        matches!(self, FilterDecision::Include)
    }

    pub fn reason(&self) -> Option<&ExclusionReason> {
        match self {
            FilterDecision::Include => None,
            FilterDecision::Exclude(reason) => Some(reason),
        }
    }
}

/// Decide whether `definition` applies to `client` on `platform`.
///
/// Rules are checked in order and the first failing one is reported:
/// platform exclusion, client exclusion, client include list, transport.
pub fn should_include_mcp(
    definition: &ServerDefinition,
    client: &dyn ClientAdapter,
    platform: Platform,
) -> FilterDecision {
    let name = client.name();

    if definition.excluded_platforms().contains(&platform) {
        return FilterDecision::Exclude(ExclusionReason::Platform { platform });
    }
    if let Some(exclude) = definition.client_exclude()
        && exclude.iter().any(|c| c == name)
    {
        return FilterDecision::Exclude(ExclusionReason::ClientExcluded {
            client: name.to_string(),
        });
    }
    if let Some(include) = definition.client_include()
        && !include.iter().any(|c| c == name)
    {
        return FilterDecision::Exclude(ExclusionReason::NotInIncludeList {
            client: name.to_string(),
        });
    }
    if !client.supports_transport(definition.transport) {
        return FilterDecision::Exclude(ExclusionReason::UnsupportedTransport {
            client: name.to_string(),
            transport: definition.transport,
        });
    }
    FilterDecision::Include
}

/// Servers that apply to `client`, and the reasons for the ones that don't.
#[derive(Debug, Clone, Default)]
pub struct FilteredServers {
    pub included: BTreeMap<String, ServerDefinition>,
    pub excluded: Vec<(String, ExclusionReason)>,
}

pub fn filter_mcps_for_client(
    servers: &BTreeMap<String, ServerDefinition>,
    client: &dyn ClientAdapter,
    platform: Platform,
) -> FilteredServers {
    let mut filtered = FilteredServers::default();
    for (name, definition) in servers {
        match should_include_mcp(definition, client, platform) {
            FilterDecision::Include => {
                filtered.included.insert(name.clone(), definition.clone());
            }
            FilterDecision::Exclude(reason) => {
                tracing::debug!(server = %name, client = client.name(), %reason, "Server excluded");
                filtered.excluded.push((name.clone(), reason));
            }
        }
    }
    filtered
}

/// Tally of exclusions by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSummary {
    pub total: usize,
    pub included: usize,
    pub excluded_by_platform: usize,
    pub excluded_by_client: usize,
    pub excluded_by_transport: usize,
}

pub fn filter_summary(
    servers: &BTreeMap<String, ServerDefinition>,
    client: &dyn ClientAdapter,
    platform: Platform,
) -> FilterSummary {
    let mut summary = FilterSummary {
        total: servers.len(),
        ..Default::default()
    };
    for definition in servers.values() {
        match should_include_mcp(definition, client, platform) {
            FilterDecision::Include => summary.included += 1,
            FilterDecision::Exclude(ExclusionReason::Platform { .. }) => {
                summary.excluded_by_platform += 1
            }
            FilterDecision::Exclude(
                ExclusionReason::ClientExcluded { .. } | ExclusionReason::NotInIncludeList { .. },
            ) => summary.excluded_by_client += 1,
            FilterDecision::Exclude(ExclusionReason::UnsupportedTransport { .. }) => {
                summary.excluded_by_transport += 1
            }
        }
    }
    summary
}
