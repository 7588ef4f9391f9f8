//! Validation schema builder
//!
//! Translates field schemas into compiled per-field rules, grouped into
//! one validator per page so the wizard can validate step-wise. Fixed
//! patterns live in `LazyLock` statics; admin-supplied custom patterns
//! are compiled at build time and skipped (with a log) when invalid.

use crate::schema::{FieldSchema, FieldType, FormDefinition};
use crate::value::FieldValue;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Default message for a missing required value.
pub const DEFAULT_REQUIRED_MESSAGE: &str = "This field is required";

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("EMAIL_REGEX: invalid regex pattern")
});

// HTTP/HTTPS URL pattern: scheme, domain labels without leading or
// trailing hyphens, optional port, path, query string, and fragment.
static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"^https?://[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9\-]*[a-zA-Z0-9])?)*(:[0-9]{1,5})?(/[^\s?#]*)?(\?[^\s#]*)?(#[^\s]*)?$",
	)
	.expect("URL_REGEX: invalid regex pattern")
});

static TEL_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[0-9+\-\s()]*$").expect("TEL_REGEX: invalid regex pattern"));

/// Parse a human-entered size limit such as `"5MB"` into bytes.
///
/// Supports `KB`/`MB`/`GB` suffixes (case-insensitive); a bare number
/// defaults to megabytes. Unparsable strings mean "no limit".
///
/// # Examples
///
/// ```
/// use eventform::parse_file_size;
///
/// assert_eq!(parse_file_size("5MB"), Some(5 * 1024 * 1024));
/// assert_eq!(parse_file_size("200kb"), Some(200 * 1024));
/// assert_eq!(parse_file_size("2"), Some(2 * 1024 * 1024));
/// assert_eq!(parse_file_size("huge"), None);
/// ```
pub fn parse_file_size(raw: &str) -> Option<u64> {
	let cleaned = raw.trim().to_uppercase();
	let (number, multiplier) = if let Some(n) = cleaned.strip_suffix("KB") {
		(n, 1024u64)
	} else if let Some(n) = cleaned.strip_suffix("MB") {
		(n, 1024 * 1024)
	} else if let Some(n) = cleaned.strip_suffix("GB") {
		(n, 1024 * 1024 * 1024)
	} else {
		(cleaned.as_str(), 1024 * 1024)
	};

	let number: f64 = number.trim().parse().ok()?;
	if number < 0.0 {
		return None;
	}
	Some((number * multiplier as f64) as u64)
}

/// The compiled validation rule for one field.
pub struct FieldRule {
	name: String,
	field_type: FieldType,
	multi_checkbox: bool,
	required: bool,
	required_message: String,
	min_limit: Option<u32>,
	max_limit: Option<u32>,
	patterns: Vec<(Regex, String)>,
	file_types: Vec<String>,
	file_size_limit: Option<u64>,
	file_size_label: Option<String>,
}

impl FieldRule {
	pub fn compile(field: &FieldSchema) -> Self {
		let required_message = field
			.required_error_text
			.clone()
			.filter(|text| !text.is_empty())
			.unwrap_or_else(|| DEFAULT_REQUIRED_MESSAGE.to_string());

		// Length bounds are meaningless for numeric input.
		let (min_limit, max_limit) = if field.field_type == FieldType::Number {
			(None, None)
		} else {
			(field.field_min_limit, field.field_max_limit)
		};

		let mut patterns = Vec::new();
		for validator in &field.validators {
			if validator.kind != "custom" {
				continue;
			}
			match Regex::new(&validator.regex) {
				Ok(regex) => {
					let message = validator
						.text
						.clone()
						.filter(|text| !text.is_empty())
						.unwrap_or_else(|| "Invalid format".to_string());
					patterns.push((regex, message));
				}
				Err(err) => {
					tracing::warn!(
						field = field.field_name,
						pattern = validator.regex,
						%err,
						"skipping invalid custom validator pattern"
					);
				}
			}
		}

		Self {
			name: field.field_name.clone(),
			field_type: field.field_type,
			multi_checkbox: field.checkbox_is_multi(),
			required: field.is_required,
			required_message,
			min_limit,
			max_limit,
			patterns,
			file_types: field.file_type.iter().map(|t| t.to_lowercase()).collect(),
			file_size_limit: field.file_size.as_deref().and_then(parse_file_size),
			file_size_label: field.file_size.clone(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Validate a single value against this rule, returning the first
	/// failing message.
	pub fn validate(&self, value: &FieldValue) -> Result<(), String> {
		if value.is_empty() {
			if self.required {
				return Err(self.required_message.clone());
			}
			return Ok(());
		}

		self.check_base_type(value)?;
		self.check_length(value)?;
		self.check_patterns(value)?;
		Ok(())
	}

	fn check_base_type(&self, value: &FieldValue) -> Result<(), String> {
		match self.field_type {
			FieldType::Email => match value.as_text() {
				Some(text) if EMAIL_REGEX.is_match(text) => Ok(()),
				_ => Err("Enter a valid email address".to_string()),
			},
			FieldType::Number => match value.as_text() {
				Some(text) if text.trim().parse::<f64>().is_ok() => Ok(()),
				_ => Err("Enter a valid number".to_string()),
			},
			FieldType::Url => match value.as_text() {
				Some(text) if URL_REGEX.is_match(text) => Ok(()),
				_ => Err("Enter a valid URL".to_string()),
			},
			FieldType::Tel => match value.as_text() {
				Some(text) if TEL_REGEX.is_match(text) => Ok(()),
				_ => Err("Enter a valid phone number".to_string()),
			},
			FieldType::Checkbox if self.multi_checkbox => match value {
				FieldValue::List(_) => Ok(()),
				_ => Err("Enter a list of values".to_string()),
			},
			FieldType::Checkbox => match value {
				FieldValue::Bool(_) => Ok(()),
				_ => Err("Enter a valid value".to_string()),
			},
			FieldType::File => self.check_file(value),
			_ => Ok(()),
		}
	}

	fn check_file(&self, value: &FieldValue) -> Result<(), String> {
		let file = value
			.as_file()
			.ok_or_else(|| "Upload a valid file".to_string())?;

		if !self.file_types.is_empty() {
			let allowed = match file.extension() {
				Some(ext) => self.file_types.contains(&ext),
				None => false,
			};
			if !allowed {
				return Err(format!(
					"Only {} files are allowed",
					self.file_types.join(", ")
				));
			}
		}

		if let Some(limit) = self.file_size_limit
			&& file.size() > limit
		{
			let label = self.file_size_label.as_deref().unwrap_or_default();
			return Err(format!("File size must be less than {}", label));
		}

		Ok(())
	}

	fn check_length(&self, value: &FieldValue) -> Result<(), String> {
		let FieldValue::Text(text) = value else {
			return Ok(());
		};
		let length = text.chars().count();

		if let Some(min) = self.min_limit
			&& length < min as usize
		{
			return Err(format!("Minimum {} characters required", min));
		}
		if let Some(max) = self.max_limit
			&& length > max as usize
		{
			return Err(format!("Maximum {} characters allowed", max));
		}
		Ok(())
	}

	fn check_patterns(&self, value: &FieldValue) -> Result<(), String> {
		let Some(text) = value.to_text() else {
			return Ok(());
		};
		for (regex, message) in &self.patterns {
			if !regex.is_match(&text) {
				return Err(message.clone());
			}
		}
		Ok(())
	}
}

/// Compiled rules for the fields of one page.
pub struct PageValidator {
	rules: Vec<FieldRule>,
}

impl PageValidator {
	pub fn compile(fields: &[FieldSchema]) -> Self {
		Self {
			rules: fields.iter().map(FieldRule::compile).collect(),
		}
	}

	pub fn field_names(&self) -> impl Iterator<Item = &str> {
		self.rules.iter().map(|rule| rule.name())
	}

	pub fn rule(&self, name: &str) -> Option<&FieldRule> {
		self.rules.iter().find(|rule| rule.name() == name)
	}

	/// Validate every field of this page, returning the first failing
	/// message per field.
	pub fn validate(&self, values: &HashMap<String, FieldValue>) -> HashMap<String, String> {
		let mut errors = HashMap::new();
		for rule in &self.rules {
			let value = values.get(rule.name()).cloned().unwrap_or_default();
			if let Err(message) = rule.validate(&value) {
				errors.insert(rule.name().to_string(), message);
			}
		}
		errors
	}
}

/// One validator per page, supporting step-wise validation. A
/// single-page form compiles to a single page validator.
pub struct FormValidator {
	pages: Vec<PageValidator>,
}

impl FormValidator {
	pub fn compile(definition: &FormDefinition) -> Self {
		Self {
			pages: definition
				.pages
				.iter()
				.map(|page| PageValidator::compile(&page.elements))
				.collect(),
		}
	}

	pub fn page(&self, index: usize) -> Option<&PageValidator> {
		self.pages.get(index)
	}

	pub fn rule(&self, name: &str) -> Option<&FieldRule> {
		self.pages.iter().find_map(|page| page.rule(name))
	}

	pub fn validate_page(
		&self,
		index: usize,
		values: &HashMap<String, FieldValue>,
	) -> HashMap<String, String> {
		self.pages
			.get(index)
			.map(|page| page.validate(values))
			.unwrap_or_default()
	}

	pub fn validate_all(&self, values: &HashMap<String, FieldValue>) -> HashMap<String, String> {
		let mut errors = HashMap::new();
		for page in &self.pages {
			errors.extend(page.validate(values));
		}
		errors
	}
}

/// The seeded default value for one field.
pub fn default_value(field: &FieldSchema) -> FieldValue {
	match field.field_type {
		FieldType::Checkbox if field.checkbox_is_multi() => FieldValue::List(vec![]),
		FieldType::Checkbox => FieldValue::Bool(false),
		_ => FieldValue::Text(String::new()),
	}
}

/// Seed the initial value map for a whole form.
pub fn initial_values(definition: &FormDefinition) -> HashMap<String, FieldValue> {
	definition
		.fields()
		.map(|field| (field.field_name.clone(), default_value(field)))
		.collect()
}
