// # plz-core
//
// Core library for keeping a German locality and postal code (PLZ) consistent.
//
// ## Architecture Overview
//
// - **LookupService**: Trait for resolving localities by name or postal code
// - **FieldStateStore**: Single source of truth for both fields, merged by patches
// - **SyncEngine**: Debounces edits, deduplicates lookups, applies outcomes
// - **LookupServiceRegistry**: Plugin-based registry for lookup services
//
// ## Design Principles
//
// 1. **Single Mutator**: Only the engine loop writes the field state
// 2. **Pure Transitions**: Every state change is a closed `Transition` mapped to a patch
// 3. **Plugin-Based**: Lookup services are registered by name, no hard-coded if-else
// 4. **Library-First**: Any front end can drive the engine through an `EngineHandle`
// 5. **Local Recovery**: Lookup failures become field messages, never fatal errors

pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, LookupServiceConfig, SyncConfig};
pub use engine::gate::SkipReason;
pub use engine::transition::{Direction, LookupOutcome, Transition};
pub use engine::{EngineCommand, EngineEvent, EngineHandle, SyncEngine};
pub use error::{Error, Result};
pub use registry::LookupServiceRegistry;
pub use state::{FieldPatch, FieldState, FieldStateStore};
pub use traits::{Locality, LookupService};
