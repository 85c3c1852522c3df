// # Field State
//
// The single record shared by the locality and postal-code inputs.
//
// Every write goes through a [`FieldPatch`]: a partial update that is merged
// over the previous snapshot. Fields not named in the patch keep their value,
// so two independent flows touching different fields never clobber each other.

use serde::{Deserialize, Serialize};

use crate::traits::Locality;

/// Snapshot of both address fields and their lookup status
///
/// Empty strings mean "no value" / "no error".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldState {
    /// Free-text locality input
    pub locality: String,
    /// Free-text postal code input, or a chosen candidate
    pub postal_code: String,
    /// Postal codes offered for an ambiguous locality, in service order
    pub candidates: Vec<Locality>,
    /// A locality → postal code lookup is in flight
    pub locality_loading: bool,
    /// A postal code → locality lookup is in flight
    pub postal_code_loading: bool,
    /// Message for the locality field
    pub locality_error: String,
    /// Message for the postal code field
    pub postal_code_error: String,
    /// The candidate chooser is visible
    pub show_candidates: bool,
}

/// Partial update of a [`FieldState`]
///
/// `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPatch {
    pub locality: Option<String>,
    pub postal_code: Option<String>,
    pub candidates: Option<Vec<Locality>>,
    pub locality_loading: Option<bool>,
    pub postal_code_loading: Option<bool>,
    pub locality_error: Option<String>,
    pub postal_code_error: Option<String>,
    pub show_candidates: Option<bool>,
}

impl FieldPatch {
    /// Create an empty patch (a no-op when applied)
    pub fn new() -> Self {
        Self::default()
    }

    /// A patch that restores every field to its initial value
    pub fn reset() -> Self {
        let initial = FieldState::default();
        Self {
            locality: Some(initial.locality),
            postal_code: Some(initial.postal_code),
            candidates: Some(initial.candidates),
            locality_loading: Some(initial.locality_loading),
            postal_code_loading: Some(initial.postal_code_loading),
            locality_error: Some(initial.locality_error),
            postal_code_error: Some(initial.postal_code_error),
            show_candidates: Some(initial.show_candidates),
        }
    }

    pub fn locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    pub fn postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    /// Set the candidate list
    ///
    /// Also sets `show_candidates`, which is only ever true for more than one
    /// candidate.
    pub fn candidates(mut self, candidates: Vec<Locality>) -> Self {
        self.show_candidates = Some(candidates.len() > 1);
        self.candidates = Some(candidates);
        self
    }

    /// Clear the candidate list and hide the chooser
    pub fn clear_candidates(self) -> Self {
        self.candidates(Vec::new())
    }

    pub fn locality_loading(mut self, loading: bool) -> Self {
        self.locality_loading = Some(loading);
        self
    }

    pub fn postal_code_loading(mut self, loading: bool) -> Self {
        self.postal_code_loading = Some(loading);
        self
    }

    pub fn locality_error(mut self, error: impl Into<String>) -> Self {
        self.locality_error = Some(error.into());
        self
    }

    pub fn postal_code_error(mut self, error: impl Into<String>) -> Self {
        self.postal_code_error = Some(error.into());
        self
    }

    /// Check whether the patch names no field at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge this patch over `previous`, producing the next snapshot
    pub fn apply_to(self, previous: &FieldState) -> FieldState {
        FieldState {
            locality: self.locality.unwrap_or_else(|| previous.locality.clone()),
            postal_code: self
                .postal_code
                .unwrap_or_else(|| previous.postal_code.clone()),
            candidates: self
                .candidates
                .unwrap_or_else(|| previous.candidates.clone()),
            locality_loading: self.locality_loading.unwrap_or(previous.locality_loading),
            postal_code_loading: self
                .postal_code_loading
                .unwrap_or(previous.postal_code_loading),
            locality_error: self
                .locality_error
                .unwrap_or_else(|| previous.locality_error.clone()),
            postal_code_error: self
                .postal_code_error
                .unwrap_or_else(|| previous.postal_code_error.clone()),
            show_candidates: self.show_candidates.unwrap_or(previous.show_candidates),
        }
    }
}
