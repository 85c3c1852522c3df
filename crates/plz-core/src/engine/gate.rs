//! Dedup and mutual-exclusion decisions for settled values
//!
//! The gate remembers, per direction, the last value a lookup ran for (or
//! that a reciprocal lookup wrote into the field). A settled value equal to
//! that reference needs no new call. Values are compared with surrounding
//! whitespace trimmed, the same form the lookup is issued with.

use serde::{Deserialize, Serialize};

use crate::engine::transition::Direction;
use crate::state::FieldState;

/// Why a settled value did not produce a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The value was empty or whitespace
    Blank,
    /// A lookup already ran for this exact value
    Duplicate,
    /// The reciprocal lookup is still in flight
    OppositeInFlight,
}

/// What to do with a settled value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleDecision {
    /// Issue a lookup
    Issue,
    /// Do nothing
    Skip(SkipReason),
}

/// Last value each direction resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupGate {
    locality: String,
    postal_code: String,
}

impl LookupGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide what a settled value for `direction` should trigger
    ///
    /// Order matters: blank values short-circuit before dedup, and dedup
    /// before the in-flight check.
    pub fn evaluate(&self, direction: Direction, value: &str, state: &FieldState) -> SettleDecision {
        let value = value.trim();
        if value.is_empty() {
            return SettleDecision::Skip(SkipReason::Blank);
        }
        if self.last(direction) == value {
            return SettleDecision::Skip(SkipReason::Duplicate);
        }
        if direction.opposite().is_loading(state) {
            return SettleDecision::Skip(SkipReason::OppositeInFlight);
        }
        SettleDecision::Issue
    }

    /// The dedup reference for `direction`
    pub fn last(&self, direction: Direction) -> &str {
        match direction {
            Direction::Locality => &self.locality,
            Direction::PostalCode => &self.postal_code,
        }
    }

    /// Record `value` as resolved for `direction`
    pub fn record(&mut self, direction: Direction, value: impl Into<String>) {
        let mut value = value.into();
        let trimmed = value.trim();
        if trimmed.len() != value.len() {
            value = trimmed.to_string();
        }
        match direction {
            Direction::Locality => self.locality = value,
            Direction::PostalCode => self.postal_code = value,
        }
    }

    /// Clear the dedup reference for `direction`
    pub fn forget(&mut self, direction: Direction) {
        self.record(direction, String::new());
    }

    /// Clear both references
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
