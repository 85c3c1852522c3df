//! Plugin-based lookup service registry
//!
//! The registry allows lookup services to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plz_core::LookupServiceRegistry;
//! use plz_core::config::LookupServiceConfig;
//!
//! let registry = LookupServiceRegistry::new();
//! plz_lookup_openplz::register(&registry);
//!
//! let service = registry.create_lookup_service(&LookupServiceConfig::default())?;
//! ```

use crate::config::LookupServiceConfig;
use crate::error::{Error, Result};
use crate::traits::{LookupService, LookupServiceFactory};
use std::collections::HashMap;
use std::sync::RwLock;

/// Registry of lookup service factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct LookupServiceRegistry {
    services: RwLock<HashMap<String, Box<dyn LookupServiceFactory>>>,
}

impl LookupServiceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lookup service factory
    ///
    /// # Parameters
    ///
    /// - `name`: Service type name (e.g., "openplz")
    /// - `factory`: Factory object for creating service instances
    pub fn register_lookup_service(
        &self,
        name: impl Into<String>,
        factory: Box<dyn LookupServiceFactory>,
    ) {
        let name = name.into();
        let mut services = self
            .services
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        services.insert(name, factory);
    }

    /// Create a lookup service from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn LookupService>)`: Created service instance
    /// - `Err(Error)`: If the service type is not registered or creation fails
    pub fn create_lookup_service(
        &self,
        config: &LookupServiceConfig,
    ) -> Result<Box<dyn LookupService>> {
        config.validate()?;

        let service_type = config.type_name();
        let services = self
            .services
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = services.get(service_type).ok_or_else(|| {
            Error::config(format!("Unknown lookup service type: {}", service_type))
        })?;

        factory.create(config)
    }

    /// List all registered lookup service types
    pub fn list_lookup_services(&self) -> Vec<String> {
        let services = self
            .services
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        services.keys().cloned().collect()
    }

    /// Check if a lookup service type is registered
    pub fn has_lookup_service(&self, name: &str) -> bool {
        let services = self
            .services
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        services.contains_key(name)
    }
}
