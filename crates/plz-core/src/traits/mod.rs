//! Core traits for the PLZ sync system
//!
//! - [`LookupService`]: Resolve localities by name or postal code

pub mod lookup_service;

pub use lookup_service::{Locality, LookupService, LookupServiceFactory};
