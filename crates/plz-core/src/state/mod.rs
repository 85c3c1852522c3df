// # Field State
//
// The shared record behind both address inputs and the store that owns it.

pub mod field;
pub mod memory;

pub use field::{FieldPatch, FieldState};
pub use memory::FieldStateStore;
