//! Error taxonomy for the catalog controllers.
//!
//! Nothing in this layer is fatal: every failure is recoverable by a
//! subsequent user action (new search, page change, revisit, or re-submit),
//! and there is no automatic retry anywhere.

use thiserror::Error;

pub use folio_sync::fetch::FetchError;

/// Local input validation failure. Blocks submission; never reaches the
/// fetch/save layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
	#[error("required field is blank: {0}")]
	BlankField(String),
}

/// Persistence failure. The baseline and form values are left untouched and
/// the session stays dirty.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SaveError {
	/// The store rejected the submitted values.
	#[error("store rejected save: {0}")]
	Rejected(String),
	/// The transport call failed before the store answered.
	#[error("transport failure: {0}")]
	Transport(String),
}

/// Any failure surfaced by the form controller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error(transparent)]
	Save(#[from] SaveError),
	#[error("entity load failed: {0}")]
	Load(#[from] FetchError),
	#[error("no entity loaded")]
	NotInitialized,
}
