//! Schema-driven form engine for event registration flows
//!
//! This crate turns a JSON form definition fetched from a backend into a
//! runnable multi-page wizard:
//! - Field schemas with per-field validation rules compiled up front
//! - Remote and static choice options, including dependent dropdowns
//! - A headless render model that any UI toolkit can project
//! - A page-by-page state machine with touch-gated error display
//! - Multipart serialization of nested values for submission

pub mod client;
pub mod error;
pub mod options;
pub mod render;
pub mod schema;
pub mod serialize;
pub mod state;
pub mod validation;
pub mod value;

pub use client::{ClientConfig, Envelope, FormApi, RestClient};
pub use error::{FormEngineError, OptionFetchError, SchemaError};
pub use options::{ChoiceOption, OptionCache, OptionState, normalize_static, resolve_options};
pub use render::{Control, InputKind, RenderedField, render_field, render_page};
pub use schema::{
	FieldSchema, FieldType, FieldValidator, FormDefinition, FormPage, OptionRequestType,
};
pub use serialize::{MultipartField, PartValue, into_multipart_form, serialize};
pub use state::{FormPhase, FormRuntime};
pub use validation::{
	DEFAULT_REQUIRED_MESSAGE, FieldRule, FormValidator, PageValidator, default_value,
	initial_values, parse_file_size,
};
pub use value::{FieldValue, FileUpload};
