//! Field schema model
//!
//! Declarative descriptions of form fields, pages, and whole forms as
//! the backend serves them. Key spelling follows the backend JSON
//! (`fieldName`, `optionUrl`, ...) via serde renames; the Rust side
//! stays snake_case.

use crate::error::SchemaError;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;

/// The kind of control a field renders as and the base validation rule
/// it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
	#[default]
	Text,
	Email,
	Number,
	Url,
	Tel,
	Password,
	Date,
	Hidden,
	Textarea,
	Html,
	Select,
	Radio,
	Checkbox,
	File,
}

impl FieldType {
	/// Parse a backend type string. Unknown strings fall back to `Text`
	/// so a misspelled type in the schema editor does not brick a
	/// published form.
	pub fn parse(raw: &str) -> Self {
		match raw.to_lowercase().as_str() {
			"text" => Self::Text,
			"email" => Self::Email,
			"number" => Self::Number,
			"url" => Self::Url,
			"tel" => Self::Tel,
			"password" => Self::Password,
			"date" => Self::Date,
			"hidden" => Self::Hidden,
			"textarea" => Self::Textarea,
			"html" => Self::Html,
			"select" => Self::Select,
			"radio" => Self::Radio,
			"checkbox" => Self::Checkbox,
			"file" => Self::File,
			other => {
				tracing::warn!(field_type = other, "unknown field type, treating as text");
				Self::Text
			}
		}
	}
}

impl<'de> Deserialize<'de> for FieldType {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;
		Ok(Self::parse(&raw))
	}
}

/// HTTP method used to fetch a remote option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionRequestType {
	#[default]
	Get,
	Post,
}

impl<'de> Deserialize<'de> for OptionRequestType {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;
		match raw.to_uppercase().as_str() {
			"POST" => Ok(Self::Post),
			_ => Ok(Self::Get),
		}
	}
}

/// An additional pattern constraint configured by the form author.
///
/// Only `type == "custom"` entries are honored; anything else is
/// ignored by the validation builder.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldValidator {
	#[serde(rename = "type", default)]
	pub kind: String,
	#[serde(default)]
	pub regex: String,
	#[serde(default)]
	pub text: Option<String>,
}

/// Declarative description of one form field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSchema {
	/// Unique key across the whole form; values, errors, and
	/// serialization entries are keyed by it.
	#[serde(rename = "fieldName")]
	pub field_name: String,
	#[serde(rename = "fieldType", default)]
	pub field_type: FieldType,
	#[serde(rename = "fieldTitle", default)]
	pub field_title: String,
	#[serde(rename = "placeHolder", default)]
	pub place_holder: String,
	#[serde(rename = "fieldDescription", default)]
	pub field_description: String,
	#[serde(rename = "isRequired", default)]
	pub is_required: bool,
	#[serde(rename = "requiredErrorText", default)]
	pub required_error_text: Option<String>,
	/// Length bounds; ignored for `number` fields.
	#[serde(rename = "fieldminLimit", default)]
	pub field_min_limit: Option<u32>,
	#[serde(rename = "fieldmaxLimit", default)]
	pub field_max_limit: Option<u32>,
	#[serde(default)]
	pub validators: Vec<FieldValidator>,
	/// Inline static options: objects, JSON-encoded strings, or bare
	/// strings. Normalization lives in the option resolver.
	#[serde(rename = "fieldOptions", default)]
	pub field_options: Vec<serde_json::Value>,
	#[serde(rename = "optionUrl", default)]
	pub option_url: Option<String>,
	/// Key inside the response payload holding the option rows.
	#[serde(rename = "optionPath", default)]
	pub option_path: Option<String>,
	#[serde(rename = "optionRequestType", default)]
	pub option_request_type: OptionRequestType,
	/// When set, remote options are refetched whenever the named
	/// field's value changes, and the request URL is suffixed with it.
	#[serde(rename = "optionDepending", default)]
	pub option_depending: Option<String>,
	#[serde(rename = "optionValue", default)]
	pub option_value: Option<String>,
	#[serde(rename = "optionName", default)]
	pub option_name: Option<String>,
	#[serde(rename = "fileType", default)]
	pub file_type: Vec<String>,
	/// Human-entered size limit such as `"5MB"`.
	#[serde(rename = "fileSize", default)]
	pub file_size: Option<String>,
}

impl FieldSchema {
	/// Create a bare field with the given name and type.
	///
	/// # Examples
	///
	/// ```
	/// use eventform::{FieldSchema, FieldType};
	///
	/// let field = FieldSchema::new("email", FieldType::Email).required();
	/// assert!(field.is_required);
	/// ```
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			field_name: name.into(),
			field_type,
			field_title: String::new(),
			place_holder: String::new(),
			field_description: String::new(),
			is_required: false,
			required_error_text: None,
			field_min_limit: None,
			field_max_limit: None,
			validators: vec![],
			field_options: vec![],
			option_url: None,
			option_path: None,
			option_request_type: OptionRequestType::Get,
			option_depending: None,
			option_value: None,
			option_name: None,
			file_type: vec![],
			file_size: None,
		}
	}

	pub fn required(mut self) -> Self {
		self.is_required = true;
		self
	}

	pub fn required_text(mut self, text: impl Into<String>) -> Self {
		self.required_error_text = Some(text.into());
		self
	}

	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.field_title = title.into();
		self
	}

	pub fn with_limits(mut self, min: Option<u32>, max: Option<u32>) -> Self {
		self.field_min_limit = min;
		self.field_max_limit = max;
		self
	}

	pub fn with_options(mut self, options: Vec<serde_json::Value>) -> Self {
		self.field_options = options;
		self
	}

	pub fn with_remote(mut self, url: impl Into<String>, path: impl Into<String>) -> Self {
		self.option_url = Some(url.into());
		self.option_path = Some(path.into());
		self
	}

	pub fn depending_on(mut self, parent: impl Into<String>) -> Self {
		self.option_depending = Some(parent.into());
		self
	}

	pub fn with_validator(mut self, regex: impl Into<String>, text: Option<String>) -> Self {
		self.validators.push(FieldValidator {
			kind: "custom".to_string(),
			regex: regex.into(),
			text,
		});
		self
	}

	pub fn with_file_constraints(mut self, types: Vec<String>, size: Option<String>) -> Self {
		self.file_type = types;
		self.file_size = size;
		self
	}

	/// Whether options are sourced from a remote endpoint. Both
	/// `optionUrl` and `optionPath` must be present.
	pub fn is_remote(&self) -> bool {
		self.option_url.is_some() && self.option_path.is_some()
	}

	/// Whether a checkbox field toggles membership in an array value
	/// rather than a single boolean.
	pub fn checkbox_is_multi(&self) -> bool {
		self.field_options.len() > 1 || self.is_remote()
	}
}

/// A logical grouping of fields presented together in one wizard step.
#[derive(Debug, Clone, Deserialize)]
pub struct FormPage {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub elements: Vec<FieldSchema>,
}

impl FormPage {
	pub fn new(name: impl Into<String>, elements: Vec<FieldSchema>) -> Self {
		Self {
			name: name.into(),
			description: None,
			elements,
		}
	}
}

/// A whole administrator-defined form.
#[derive(Debug, Clone, Deserialize)]
pub struct FormDefinition {
	#[serde(rename = "formName", default)]
	pub form_name: String,
	#[serde(default)]
	pub pages: Vec<FormPage>,
}

impl FormDefinition {
	pub fn new(form_name: impl Into<String>, pages: Vec<FormPage>) -> Self {
		Self {
			form_name: form_name.into(),
			pages,
		}
	}

	/// Enforce the global field-name uniqueness invariant.
	///
	/// # Examples
	///
	/// ```
	/// use eventform::{FieldSchema, FieldType, FormDefinition, FormPage, SchemaError};
	///
	/// let def = FormDefinition::new(
	/// 	"reg",
	/// 	vec![
	/// 		FormPage::new("a", vec![FieldSchema::new("name", FieldType::Text)]),
	/// 		FormPage::new("b", vec![FieldSchema::new("name", FieldType::Text)]),
	/// 	],
	/// );
	/// assert_eq!(
	/// 	def.validate(),
	/// 	Err(SchemaError::DuplicateField("name".to_string()))
	/// );
	/// ```
	pub fn validate(&self) -> Result<(), SchemaError> {
		let mut seen = HashSet::new();
		for field in self.fields() {
			if !seen.insert(field.field_name.as_str()) {
				return Err(SchemaError::DuplicateField(field.field_name.clone()));
			}
		}
		Ok(())
	}

	/// All fields across all pages, in page order.
	pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
		self.pages.iter().flat_map(|page| page.elements.iter())
	}

	pub fn field(&self, name: &str) -> Option<&FieldSchema> {
		self.fields().find(|f| f.field_name == name)
	}

	pub fn page_fields(&self, index: usize) -> Option<&[FieldSchema]> {
		self.pages.get(index).map(|page| page.elements.as_slice())
	}

	pub fn page_count(&self) -> usize {
		self.pages.len()
	}
}
