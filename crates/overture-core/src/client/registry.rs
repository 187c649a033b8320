//! Client registry for managing available client adapters.

use super::{ClientAdapter, ClientKind, adapter_for};

/// Registry of available client adapters, in registration order.
#[derive(Debug)]
pub struct ClientRegistry {
    clients: Vec<Box<dyn ClientAdapter>>,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::with_default_clients()
    }
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            clients: Vec::new(),
        }
    }

    /// Create a registry with every built-in client.
    pub fn with_default_clients() -> Self {
        Self {
            clients: ClientKind::ALL.into_iter().map(adapter_for).collect(),
        }
    }

    /// Register a client adapter.
    pub fn register(&mut self, client: Box<dyn ClientAdapter>) {
        self.clients.push(client);
    }

    /// Get all registered clients.
    pub fn all(&self) -> &[Box<dyn ClientAdapter>] {
        &self.clients
    }

    /// Get a client by name.
    pub fn get(&self, name: &str) -> Option<&dyn ClientAdapter> {
        self.clients
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    /// Clients named in `names`, or every client when `names` is empty.
    pub fn filter_by_names<'a>(&'a self, names: &[String]) -> Vec<&'a dyn ClientAdapter> {
        self.clients
            .iter()
            .filter(|c| names.is_empty() || names.iter().any(|n| n == c.name()))
            .map(|c| c.as_ref())
            .collect()
    }

    /// List all client names.
    pub fn client_names(&self) -> Vec<&'static str> {
        self.clients.iter().map(|c| c.name()).collect()
    }
}
