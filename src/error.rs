//! Error taxonomy for the form engine
//!
//! Errors split along the boundaries they may cross: schema-load and
//! submission errors surface to the host view, option-fetch errors stay
//! field-local inside [`OptionState`](crate::options::OptionState), and
//! validation errors live in the runtime's per-field error map.

/// Errors raised by schema loading, navigation, and submission.
#[derive(Debug, thiserror::Error)]
pub enum FormEngineError {
	/// The form definition failed to fetch or decode. Fatal to this form
	/// instance; the host renders a full-view error state.
	#[error("failed to load form definition: {reason}")]
	SchemaLoad { reason: String },

	/// The final submission failed in transport or was rejected by the
	/// backend envelope. Recoverable: all entered values are preserved.
	#[error("submission failed: {reason}")]
	Submission { reason: String },

	/// One or more fields failed validation, blocking the attempted
	/// transition. Details live in the runtime's error map.
	#[error("form validation failed")]
	Validation,

	/// A navigation or lifecycle transition that is not permitted from
	/// the current state.
	#[error("invalid transition: {0}")]
	InvalidTransition(String),

	/// The HTTP client could not be constructed or configured.
	#[error("http client error: {0}")]
	Client(String),

	#[error(transparent)]
	Schema(#[from] SchemaError),
}

/// Field-local failures while resolving a remote option list.
///
/// These never propagate past the option resolver; they are captured
/// into the field's option state and the rest of the form stays usable.
#[derive(Debug, thiserror::Error)]
pub enum OptionFetchError {
	#[error("option request failed: {0}")]
	Http(String),

	#[error("option request returned HTTP {0}")]
	Status(u16),

	#[error("option payload has unexpected shape: {0}")]
	BadShape(String),
}

/// Structural problems in a form definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
	/// `fieldName` must be unique across all pages of a form because
	/// values and errors are keyed globally, not per-page.
	#[error("duplicate field name '{0}' across form pages")]
	DuplicateField(String),
}
