//! State transitions of the sync engine
//!
//! Every change to the field record is expressed as a [`Transition`]. The
//! mapping from transition to [`FieldPatch`] is pure: it does not look at the
//! clock, the network or the dedup bookkeeping, which keeps the whole
//! state machine testable without a runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::state::{FieldPatch, FieldState};
use crate::traits::Locality;

/// Shown when a locality name matches no postal code
pub const NO_POSTAL_CODES_FOUND: &str = "No postal codes found for this locality";

/// Shown when the locality → postal code lookup fails
pub const POSTAL_CODE_FETCH_FAILED: &str = "Error fetching postal codes. Please try again.";

/// Shown when a postal code matches no locality
pub const INVALID_POSTAL_CODE: &str = "Invalid postal code";

/// Shown when the postal code → locality lookup fails
pub const POSTAL_CODE_VALIDATION_FAILED: &str = "Error validating postal code. Please try again.";

/// Lookup direction, named after the field whose value is the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Locality name → postal code(s)
    Locality,
    /// Postal code → locality name
    PostalCode,
}

impl Direction {
    /// The reciprocal direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Locality => Direction::PostalCode,
            Direction::PostalCode => Direction::Locality,
        }
    }

    /// Whether this direction's lookup is in flight in `state`
    pub fn is_loading(self, state: &FieldState) -> bool {
        match self {
            Direction::Locality => state.locality_loading,
            Direction::PostalCode => state.postal_code_loading,
        }
    }

    /// The field value this direction queries with
    pub fn value(self, state: &FieldState) -> &str {
        match self {
            Direction::Locality => &state.locality,
            Direction::PostalCode => &state.postal_code,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Locality => f.write_str("locality"),
            Direction::PostalCode => f.write_str("postal_code"),
        }
    }
}

/// Interpreted result of one lookup call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// At least one record came back
    Found(Vec<Locality>),
    /// The service answered with zero records
    NotFound,
    /// Transport, status or decoding failure
    Failed(String),
}

impl LookupOutcome {
    /// Fold a raw service result into an outcome
    ///
    /// An empty result list is `NotFound`, so `Found` is never empty.
    pub fn from_result(result: Result<Vec<Locality>, Error>) -> Self {
        match result {
            Ok(localities) if localities.is_empty() => LookupOutcome::NotFound,
            Ok(localities) => LookupOutcome::Found(localities),
            Err(e) => LookupOutcome::Failed(e.to_string()),
        }
    }
}

/// Closed set of state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The user typed into the locality field
    LocalityEdited(String),
    /// The user typed into the postal code field
    PostalCodeEdited(String),
    /// The user picked a postal code from the candidate chooser
    CandidateSelected(String),
    /// A lookup was issued
    LookupStarted(Direction),
    /// A blank value settled; drop that direction's transient lookup state
    LookupCleared(Direction),
    /// The locality → postal code lookup returned
    LocalityResolved(LookupOutcome),
    /// The postal code → locality lookup returned
    PostalCodeResolved(LookupOutcome),
    /// Back to the initial empty form
    Reset,
}

impl Transition {
    /// The partial update this transition applies
    pub fn patch(&self) -> FieldPatch {
        match self {
            Transition::LocalityEdited(value) => {
                FieldPatch::new().locality(value.clone()).locality_error("")
            }
            Transition::PostalCodeEdited(value) => FieldPatch::new()
                .postal_code(value.clone())
                .postal_code_error("")
                .clear_candidates(),
            Transition::CandidateSelected(postal_code) => FieldPatch::new()
                .postal_code(postal_code.clone())
                .clear_candidates(),
            Transition::LookupStarted(Direction::Locality) => {
                FieldPatch::new().locality_loading(true).locality_error("")
            }
            Transition::LookupStarted(Direction::PostalCode) => FieldPatch::new()
                .postal_code_loading(true)
                .postal_code_error(""),
            Transition::LookupCleared(Direction::Locality) => {
                FieldPatch::new().clear_candidates().locality_error("")
            }
            Transition::LookupCleared(Direction::PostalCode) => {
                FieldPatch::new().postal_code_error("")
            }
            Transition::LocalityResolved(outcome) => locality_resolved(outcome),
            Transition::PostalCodeResolved(outcome) => postal_code_resolved(outcome),
            Transition::Reset => FieldPatch::reset(),
        }
    }
}

fn locality_resolved(outcome: &LookupOutcome) -> FieldPatch {
    let patch = FieldPatch::new().locality_loading(false);
    match outcome {
        LookupOutcome::NotFound => patch
            .locality_error(NO_POSTAL_CODES_FOUND)
            .clear_candidates(),
        LookupOutcome::Failed(_) => patch
            .locality_error(POSTAL_CODE_FETCH_FAILED)
            .clear_candidates(),
        LookupOutcome::Found(localities) => match localities.as_slice() {
            [only] => patch
                .postal_code(only.postal_code.clone())
                .clear_candidates()
                .locality_error(""),
            _ => patch.candidates(localities.clone()).locality_error(""),
        },
    }
}

fn postal_code_resolved(outcome: &LookupOutcome) -> FieldPatch {
    let patch = FieldPatch::new().postal_code_loading(false);
    match outcome {
        LookupOutcome::NotFound => patch.postal_code_error(INVALID_POSTAL_CODE).locality(""),
        LookupOutcome::Failed(_) => patch.postal_code_error(POSTAL_CODE_VALIDATION_FAILED),
        // Only the first record is authoritative for a postal code
        LookupOutcome::Found(localities) => match localities.first() {
            Some(first) => patch
                .locality(first.name.clone())
                .postal_code_error("")
                .clear_candidates(),
            None => patch.postal_code_error(INVALID_POSTAL_CODE).locality(""),
        },
    }
}

/// Apply a transition to a state, producing the next state
pub fn reduce(state: &FieldState, transition: &Transition) -> FieldState {
    transition.patch().apply_to(state)
}
