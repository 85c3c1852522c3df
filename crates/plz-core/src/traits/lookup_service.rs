// # Lookup Service Trait
//
// Defines the interface for resolving German localities and postal codes.
//
// ## Implementations
//
// - OpenPLZ REST API: `plz-lookup-openplz` crate
//
// ## Usage
//
// ```rust,ignore
// use plz_core::LookupService;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let service = /* LookupService implementation */;
//
//     // Postal codes for a locality name
//     let localities = service.localities_by_name("Berlin").await?;
//
//     // Locality for a postal code
//     let localities = service.localities_by_postal_code("10115").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A locality record as returned by the lookup service
///
/// The same shape serves as a disambiguation candidate when a locality name
/// maps to several postal codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locality {
    /// Postal code (PLZ), e.g. "10115"
    pub postal_code: String,
    /// Locality name, e.g. "Berlin"
    pub name: String,
}

impl Locality {
    /// Create a new locality record
    pub fn new(postal_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            postal_code: postal_code.into(),
            name: name.into(),
        }
    }
}

/// Trait for lookup service implementations
///
/// # Trust Level: Untrusted
///
/// Lookup services are external integrations:
///
/// - Perform one request per call against their own endpoint
/// - Return results in the order the backend delivered them
/// - Report every transport, status or decoding problem as `Err`
/// - Never retry, cache or debounce (owned by `SyncEngine`)
/// - Never touch field state (owned by `FieldStateStore`)
#[async_trait]
pub trait LookupService: Send + Sync {
    /// Find localities matching a name
    ///
    /// # Parameters
    ///
    /// - `name`: Non-empty locality name
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Locality>)`: Zero or more matches, in service order
    /// - `Err(Error)`: If the request failed
    async fn localities_by_name(&self, name: &str) -> Result<Vec<Locality>, crate::Error>;

    /// Find localities for a postal code
    ///
    /// Only the first result is authoritative for the engine.
    ///
    /// # Parameters
    ///
    /// - `postal_code`: Non-empty postal code
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Locality>)`: Zero or more matches, in service order
    /// - `Err(Error)`: If the request failed
    async fn localities_by_postal_code(
        &self,
        postal_code: &str,
    ) -> Result<Vec<Locality>, crate::Error>;

    /// Get the service name (for logging/debugging)
    fn service_name(&self) -> &'static str;
}

/// Helper trait for constructing lookup services from configuration
pub trait LookupServiceFactory: Send + Sync {
    /// Create a LookupService instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this service
    ///
    /// # Returns
    ///
    /// A boxed LookupService trait object
    fn create(
        &self,
        config: &crate::config::LookupServiceConfig,
    ) -> Result<Box<dyn LookupService>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locality_wire_format() {
        let json = r#"{"postalCode":"80331","name":"München","municipality":{"key":"09162000"}}"#;
        let locality: Locality = serde_json::from_str(json).unwrap();
        assert_eq!(locality, Locality::new("80331", "München"));

        let encoded = serde_json::to_value(&locality).unwrap();
        assert_eq!(encoded["postalCode"], "80331");
    }
}
