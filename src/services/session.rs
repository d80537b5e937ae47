use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::package::PackageCatalog;

/// Per-client session context: the bearer credential and the package
/// catalog cache.
///
/// Created at client startup, optionally seeded with a credential, and
/// cleared on logout. Locks are never held across an `.await`.
#[derive(Debug, Default)]
pub struct Session {
    credential: RwLock<Option<String>>,
    catalog: RwLock<Option<Arc<PackageCatalog>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.set_credential(token);
        session
    }

    pub fn credential(&self) -> Option<String> {
        self.credential.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.read().is_some()
    }

    /// Store a bearer token. Blank tokens clear the credential.
    pub fn set_credential(&self, token: impl Into<String>) {
        let token = token.into();
        *self.credential.write() = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
    }

    pub fn catalog(&self) -> Option<Arc<PackageCatalog>> {
        self.catalog.read().clone()
    }

    pub fn cache_catalog(&self, catalog: PackageCatalog) -> Arc<PackageCatalog> {
        let catalog = Arc::new(catalog);
        *self.catalog.write() = Some(catalog.clone());
        catalog
    }

    /// Drop the credential. The catalog is public data and survives logout.
    pub fn clear(&self) {
        *self.credential.write() = None;
    }
}
